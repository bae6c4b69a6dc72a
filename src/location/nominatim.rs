//! Reverse geocoding against a Nominatim-compatible endpoint

use super::{Coordinates, Geocoder, PlaceDescriptor};
use crate::error::GeocodeError;
use crate::http::{ensure_success, join_url};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Public OpenStreetMap instance
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// `GET {base}/reverse?format=jsonv2&lat=..&lon=..`
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    tourism: Option<String>,
    attraction: Option<String>,
    amenity: Option<String>,
    leisure: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city_district: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl ReverseResponse {
    fn into_descriptor(self) -> Result<PlaceDescriptor, GeocodeError> {
        if let Some(error) = self.error {
            // Nominatim answers 200 with {"error": "Unable to geocode"} for open ocean etc.
            debug!("Nominatim returned error: {}", error);
            return Err(GeocodeError::NoResult);
        }

        let address = self.address.unwrap_or_default();
        let descriptor = PlaceDescriptor {
            area_of_interest: address
                .tourism
                .or(address.attraction)
                .or(address.amenity)
                .or(address.leisure),
            locality: address
                .city
                .or(address.town)
                .or(address.village)
                .or(address.hamlet),
            sub_locality: address
                .suburb
                .or(address.neighbourhood)
                .or(address.city_district),
            administrative_area: address.state.or(address.region),
            country: address.country,
            name: self.name.filter(|n| !n.is_empty()),
        };

        if descriptor.joined().is_empty() {
            Err(GeocodeError::NoResult)
        } else {
            Ok(descriptor)
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<PlaceDescriptor, GeocodeError> {
        let url = join_url(&self.base_url, "reverse");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "16".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Lookup(e.to_string()))?;

        let response = ensure_success(response)
            .await
            .map_err(|e| GeocodeError::Lookup(e.to_string()))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Lookup(e.to_string()))?;

        body.into_descriptor()
    }
}
