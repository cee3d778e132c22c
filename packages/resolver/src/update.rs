//! Location updates published by a tracked source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snow_removal_street_models::Coordinate;

/// Source states meaning the location is not currently known.
const UNAVAILABLE_STATES: &[&str] = &["unavailable", "unknown"];

pub const LATITUDE_ATTRIBUTE: &str = "latitude";
pub const LONGITUDE_ATTRIBUTE: &str = "longitude";

/// One state report of a tracked source (a vehicle's tracker or
/// location sensor): its availability and its attributes, which may hold
/// a textual address, GPS coordinates, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Source state; `"unavailable"` and `"unknown"` mean no location.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl LocationUpdate {
    /// An available update with no attributes yet.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// An update reporting that the source has no location.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new("unavailable")
    }

    /// An available update carrying GPS coordinates.
    #[must_use]
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new("home")
            .with_attribute(LATITUDE_ATTRIBUTE, latitude)
            .with_attribute(LONGITUDE_ATTRIBUTE, longitude)
    }

    /// Adds or replaces an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns `false` when the source reports no location.
    #[must_use]
    pub fn is_available(&self) -> bool {
        let state = self.state.trim();
        !UNAVAILABLE_STATES
            .iter()
            .any(|s| s.eq_ignore_ascii_case(state))
    }

    /// The first non-blank string among `attribute_names`, trimmed.
    #[must_use]
    pub fn address<S: AsRef<str>>(&self, attribute_names: &[S]) -> Option<&str> {
        attribute_names.iter().find_map(|name| {
            let name = name.as_ref();
            let value = self.attributes.get(name)?.as_str()?.trim();
            if value.is_empty() {
                return None;
            }
            log::debug!("Found address in attribute '{name}': {value}");
            Some(value)
        })
    }

    /// GPS coordinates from the `latitude` and `longitude` attributes,
    /// published either as numbers or as numeric strings.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinate> {
        let latitude = self.number(LATITUDE_ATTRIBUTE)?;
        let longitude = self.number(LONGITUDE_ATTRIBUTE)?;
        Some(Coordinate::new(latitude, longitude))
    }

    fn number(&self, name: &str) -> Option<f64> {
        let value = match self.attributes.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRIBUTES: &[&str] = &["address", "full_address"];

    #[test]
    fn unavailable_states() {
        assert!(!LocationUpdate::unavailable().is_available());
        assert!(!LocationUpdate::new("unknown").is_available());
        assert!(!LocationUpdate::new("Unavailable").is_available());
        assert!(LocationUpdate::new("not_home").is_available());
        assert!(LocationUpdate::new("").is_available());
    }

    #[test]
    fn picks_first_non_blank_address() {
        let update = LocationUpdate::new("home")
            .with_attribute("address", "   ")
            .with_attribute("full_address", " 1234 rue Saint-Denis ");
        assert_eq!(update.address(ATTRIBUTES), Some("1234 rue Saint-Denis"));
    }

    #[test]
    fn ignores_non_string_address() {
        let update = LocationUpdate::new("home").with_attribute("address", 42);
        assert_eq!(update.address(ATTRIBUTES), None);
    }

    #[test]
    fn ignores_unlisted_attributes() {
        let update = LocationUpdate::new("home").with_attribute("street", "rue Saint-Denis");
        assert_eq!(update.address(ATTRIBUTES), None);
    }

    #[test]
    fn reads_numeric_and_string_coordinates() {
        let update = LocationUpdate::new("home")
            .with_attribute("latitude", "45.5")
            .with_attribute("longitude", -73.6);
        assert_eq!(update.coordinates(), Some(Coordinate::new(45.5, -73.6)));
    }

    #[test]
    fn needs_both_coordinates() {
        let update = LocationUpdate::new("home").with_attribute("latitude", 45.5);
        assert_eq!(update.coordinates(), None);

        let update = LocationUpdate::new("home")
            .with_attribute("latitude", "north")
            .with_attribute("longitude", -73.6);
        assert_eq!(update.coordinates(), None);
    }

    #[test]
    fn deserializes_from_json() {
        let update: LocationUpdate = serde_json::from_str(
            r#"{"state": "home", "attributes": {"latitude": 45.5, "longitude": -73.6}}"#,
        )
        .unwrap();
        assert!(update.is_available());
        assert_eq!(update.coordinates(), Some(Coordinate::new(45.5, -73.6)));

        let bare: LocationUpdate = serde_json::from_str("{}").unwrap();
        assert!(bare.is_available());
        assert!(bare.attributes.is_empty());
    }
}
