//! Resolver settings.
//!
//! The shipped defaults live in `resolver.toml`, embedded at compile time.
//! A user file only needs the keys it overrides.

use std::path::Path;

use serde::Deserialize;
use snow_removal_street_models::BoundingBox;

/// The embedded default configuration document.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../resolver.toml");

/// Approximate bounding box of the island of Montreal.
pub const MONTREAL_BOUNDS: BoundingBox = BoundingBox {
    min_lat: 45.40,
    max_lat: 45.70,
    min_lon: -73.98,
    max_lon: -73.47,
};

pub const DEFAULT_DEBOUNCE_METERS: f64 = 5.0;

pub const DEFAULT_MATCH_THRESHOLD_METERS: f64 = snow_removal_spatial::DEFAULT_MATCH_THRESHOLD_METERS;

pub const DEFAULT_ADDRESS_ATTRIBUTES: &[&str] = &[
    "address",
    "full_address",
    "street_address",
    "formatted_address",
    "location_address",
];

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of a [`crate::LocationResolver`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResolverConfig {
    /// Coordinates outside this box are never matched.
    #[serde(default = "default_bounds")]
    pub bounds: BoundingBox,
    /// Minimum movement, in meters, before a GPS fix is resolved again.
    #[serde(default = "default_debounce")]
    pub debounce_meters: f64,
    /// Maximum distance, in meters, from a GPS fix to its street.
    #[serde(default = "default_match_threshold")]
    pub match_threshold_meters: f64,
    /// Attributes checked for a textual address, in priority order.
    #[serde(default = "default_address_attributes")]
    pub address_attributes: Vec<String>,
}

const fn default_bounds() -> BoundingBox {
    MONTREAL_BOUNDS
}

const fn default_debounce() -> f64 {
    DEFAULT_DEBOUNCE_METERS
}

const fn default_match_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD_METERS
}

fn default_address_attributes() -> Vec<String> {
    DEFAULT_ADDRESS_ATTRIBUTES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for ResolverConfig {
    /// The embedded `resolver.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee,
    /// covered by tests).
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resolver config: {e}"))
    }
}

impl ResolverConfig {
    /// Parses and validates a TOML configuration. Missing keys take their
    /// default value.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML of the expected shape
    /// or fails [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`Self::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Loading resolver config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that the settings can drive a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty or inverted bounding
    /// box, a negative debounce distance, a non-positive match threshold,
    /// or an empty or blank address attribute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bounds.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "bounding box is empty or inverted: {:?}",
                self.bounds
            )));
        }
        if !self.debounce_meters.is_finite() || self.debounce_meters < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "debounce_meters must be a non-negative distance, got {}",
                self.debounce_meters
            )));
        }
        if !self.match_threshold_meters.is_finite() || self.match_threshold_meters <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "match_threshold_meters must be positive, got {}",
                self.match_threshold_meters
            )));
        }
        if self.address_attributes.is_empty() {
            return Err(ConfigError::Invalid(
                "address_attributes must list at least one attribute".to_string(),
            ));
        }
        if self.address_attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "address_attributes contains a blank name".to_string(),
            ));
        }
        Ok(())
    }
}
