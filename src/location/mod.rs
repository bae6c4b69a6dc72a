//! Where are we?
//!
//! Two collaborator contracts feed the narration cycle:
//! - [`LocationSource`] delivers one coordinate fix per request
//! - [`Geocoder`] turns coordinates into a [`PlaceDescriptor`]
//!
//! Implementations here are a fixed-coordinate source and a
//! Nominatim-compatible HTTP geocoder.

mod fixed;
mod nominatim;
mod place;

pub use fixed::FixedLocationSource;
pub use nominatim::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use place::{Place, PlaceDescriptor, PLACE_SEPARATOR};

use crate::error::{GeocodeError, LocationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// WGS84 coordinates in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and in range
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One-shot location provider
///
/// Each call delivers exactly one success or one failure.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn request_one_shot_location(&self) -> Result<Coordinates, LocationError>;
}

/// Reverse geocoder
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<PlaceDescriptor, GeocodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(48.8584, 2.2945).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
