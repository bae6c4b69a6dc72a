//! Places: the human-readable identity of a geocoded location

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when joining descriptor fields into a [`Place`]
pub const PLACE_SEPARATOR: &str = ", ";

/// Raw reverse-geocode result, every field optional
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescriptor {
    /// Landmark or point of interest (e.g. "Eiffel Tower")
    pub area_of_interest: Option<String>,
    /// City or town
    pub locality: Option<String>,
    /// Neighbourhood or district
    pub sub_locality: Option<String>,
    /// State, province or region
    pub administrative_area: Option<String>,
    pub country: Option<String>,
    /// Name of the feature itself; not part of the joined place
    pub name: Option<String>,
}

impl PlaceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_area_of_interest(mut self, value: impl Into<String>) -> Self {
        self.area_of_interest = Some(value.into());
        self
    }

    pub fn with_locality(mut self, value: impl Into<String>) -> Self {
        self.locality = Some(value.into());
        self
    }

    pub fn with_sub_locality(mut self, value: impl Into<String>) -> Self {
        self.sub_locality = Some(value.into());
        self
    }

    pub fn with_administrative_area(mut self, value: impl Into<String>) -> Self {
        self.administrative_area = Some(value.into());
        self
    }

    pub fn with_country(mut self, value: impl Into<String>) -> Self {
        self.country = Some(value.into());
        self
    }

    pub fn with_name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Join the present fields in display order, skipping absent or blank ones
    pub fn joined(&self) -> String {
        [
            &self.area_of_interest,
            &self.locality,
            &self.sub_locality,
            &self.administrative_area,
            &self.country,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref().map(str::trim))
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>()
        .join(PLACE_SEPARATOR)
    }
}

/// Identifier for a geographic location, e.g. "Paris, Île-de-France, France"
///
/// Two places are equal iff their joined strings are equal. A place is
/// never mutated; every successful reverse-geocode produces a fresh one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Place(String);

impl Place {
    /// Wrap an already-joined place string
    pub fn new(joined: impl Into<String>) -> Self {
        Self(joined.into())
    }

    /// Build a place from a descriptor; `None` if no field is usable
    pub fn from_descriptor(descriptor: &PlaceDescriptor) -> Option<Self> {
        let joined = descriptor.joined();
        if joined.is_empty() {
            None
        } else {
            Some(Self(joined))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
