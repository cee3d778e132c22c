#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory street-side catalog.
//!
//! Indexes every street side published in the city's geobase by its id and
//! keeps a normalized copy of each name for fuzzy searching (see
//! [`search`]). A catalog is built once from a geobase document and never
//! mutated; a refresh builds a new catalog and swaps it in through a
//! [`Snapshot`].
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use snow_removal_catalog::StreetCatalog;
//!
//! let catalog = StreetCatalog::load("data/geobase-map.json")?;
//! for hit in catalog.search(Some(1234), "saint-denis") {
//!     println!("{} {}", hit.id, catalog.full_street_name(hit.id));
//! }
//! # Ok(())
//! # }
//! ```

pub mod search;
pub mod snapshot;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use snow_removal_address::normalize;
use snow_removal_street_models::{StreetSide, StreetSideId};

pub use search::{MAX_SEARCH_RESULTS, MatchKind};
pub use snapshot::Snapshot;

/// Errors from loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but contained no usable street sides.
    #[error("Invalid catalog document: {0}")]
    InvalidDocument(String),
}

/// A catalog entry paired with its precomputed normalized name.
#[derive(Debug, Clone)]
pub(crate) struct CatalogEntry {
    pub(crate) street: StreetSide,
    pub(crate) normalized_name: String,
}

/// Street-side catalog keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StreetCatalog {
    entries: BTreeMap<StreetSideId, CatalogEntry>,
    loaded: bool,
}

/// One record of the published geobase map, keyed by id in the document.
#[derive(Debug, Deserialize)]
struct GeobaseRecord {
    #[serde(default)]
    nom_voie: Option<String>,
    #[serde(default)]
    type_voie: Option<String>,
    #[serde(default)]
    debut_adresse: Option<serde_json::Value>,
    #[serde(default)]
    fin_adresse: Option<serde_json::Value>,
    #[serde(default)]
    cote: Option<String>,
    #[serde(default)]
    nom_ville: Option<String>,
}

impl StreetCatalog {
    /// Builds a loaded catalog from already-decoded street sides.
    ///
    /// A later entry with a duplicate id replaces the earlier one.
    #[must_use]
    pub fn from_streets(streets: impl IntoIterator<Item = StreetSide>) -> Self {
        let entries = streets
            .into_iter()
            .map(|street| {
                let normalized_name = normalize(&street.name);
                (
                    street.id,
                    CatalogEntry {
                        street,
                        normalized_name,
                    },
                )
            })
            .collect();

        Self {
            entries,
            loaded: true,
        }
    }

    /// Loads a catalog from a geobase map JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// geobase map document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        log::info!("Loading street catalog from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Decodes a geobase map document: a JSON object keyed by street-side
    /// id whose values carry the street name, type, address range, side
    /// and municipality.
    ///
    /// Records with a non-numeric id are skipped. Address bounds that are
    /// neither integers nor numeric strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON of that shape,
    /// or if it is non-empty but yields no usable record.
    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let records: BTreeMap<String, GeobaseRecord> = serde_json::from_reader(reader)?;
        let total = records.len();

        let streets: Vec<StreetSide> = records
            .into_iter()
            .filter_map(|(key, record)| {
                let Ok(id) = key.trim().parse::<StreetSideId>() else {
                    log::debug!("Skipping geobase record with invalid id {key:?}");
                    return None;
                };
                Some(StreetSide {
                    id,
                    name: record.nom_voie.unwrap_or_default(),
                    street_type: record.type_voie.unwrap_or_default(),
                    range_start: record.debut_adresse.as_ref().and_then(civic_number),
                    range_end: record.fin_adresse.as_ref().and_then(civic_number),
                    side: record.cote.unwrap_or_default(),
                    city: record.nom_ville.unwrap_or_default(),
                })
            })
            .collect();

        if total > 0 && streets.is_empty() {
            return Err(CatalogError::InvalidDocument(format!(
                "none of the {total} records has a numeric id"
            )));
        }

        let catalog = Self::from_streets(streets);
        log::info!("Loaded {} street sides into catalog", catalog.len());
        Ok(catalog)
    }

    /// Returns `true` once the catalog has been built from data.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of street sides in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog holds no street sides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a street side by id.
    #[must_use]
    pub fn get(&self, id: StreetSideId) -> Option<&StreetSide> {
        if !self.loaded {
            log::warn!("Street catalog not loaded yet");
            return None;
        }
        self.entries.get(&id).map(|entry| &entry.street)
    }

    /// Full descriptive name of a street side, e.g.
    /// `"Rue Saint-Denis (1000-1098) - Pair"`.
    ///
    /// The range is omitted when either bound is missing or zero. Unknown
    /// ids produce `"Unknown street (ID: n)"`.
    #[must_use]
    pub fn full_street_name(&self, id: StreetSideId) -> String {
        let Some(street) = self.get(id) else {
            return format!("Unknown street (ID: {id})");
        };

        let mut name = if street.street_type.trim().is_empty() && street.name.trim().is_empty() {
            format!("ID {id}")
        } else {
            street.display_name()
        };

        if let Some((start, end)) = street
            .address_range()
            .filter(|(start, end)| *start != 0 && *end != 0)
        {
            name.push_str(&format!(" ({start}-{end})"));
        }
        if !street.side.trim().is_empty() {
            name.push_str(&format!(" - {}", street.side.trim()));
        }

        name
    }

    /// Iterates entries in ascending id order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

/// Reads an address bound that may be published as a number or as text.
#[allow(clippy::cast_possible_truncation)]
fn civic_number(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
