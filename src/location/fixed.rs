use super::{Coordinates, LocationSource};
use crate::error::LocationError;
use async_trait::async_trait;
use tracing::debug;

/// Location source that always reports the same coordinates
///
/// Used when the position comes from configuration or the command line.
/// With no coordinates configured every request fails with
/// [`LocationError::Unavailable`].
#[derive(Clone, Debug, Default)]
pub struct FixedLocationSource {
    coordinates: Option<Coordinates>,
}

impl FixedLocationSource {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Coordinates::new(latitude, longitude)))
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn request_one_shot_location(&self) -> Result<Coordinates, LocationError> {
        match self.coordinates {
            Some(coordinates) if coordinates.is_valid() => {
                debug!("Fixed location: {:?}", coordinates);
                Ok(coordinates)
            }
            Some(coordinates) => Err(LocationError::Failed(format!(
                "invalid coordinates {}, {}",
                coordinates.latitude, coordinates.longitude
            ))),
            None => Err(LocationError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_location() {
        let source = FixedLocationSource::at(48.8584, 2.2945);
        let coords = source.request_one_shot_location().await.unwrap();
        assert_eq!(coords, Coordinates::new(48.8584, 2.2945));
    }

    #[tokio::test]
    async fn test_unconfigured_location_is_unavailable() {
        let source = FixedLocationSource::default();
        let result = source.request_one_shot_location().await;
        assert_eq!(result, Err(LocationError::Unavailable));
    }

    #[tokio::test]
    async fn test_invalid_location_fails() {
        let source = FixedLocationSource::at(123.0, 0.0);
        assert!(matches!(
            source.request_one_shot_location().await,
            Err(LocationError::Failed(_))
        ));
    }
}
