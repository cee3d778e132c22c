#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Snow removal planifications and parking bans.
//!
//! Decodes the city's planification feed, derives whether parking is banned
//! on a street side at a given time ([`ban`]), and keeps the records of the
//! street sides a host is watching ([`book`]).

pub mod ban;
pub mod book;

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use snow_removal_planification_models::{PlanificationRecord, Timestamp};
use snow_removal_street_models::StreetSideId;

pub use ban::{
    BanWindow, NextOperation, ban_window, derive, derive_record, hours_until, is_parking_banned,
    next_operation,
};
pub use book::{PlanificationBook, StreetStatus, status_of};

/// Errors from loading a planification feed.
#[derive(Debug, thiserror::Error)]
pub enum PlanificationError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A decoded planification feed.
#[derive(Debug, Clone, Default)]
pub struct PlanificationFeed {
    /// One record per street side, in feed order.
    pub records: Vec<PlanificationRecord>,
    /// When the feed was generated, if stated.
    pub generated_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct PlanificationDocument {
    #[serde(default)]
    planifications: Vec<RawPlanification>,
    #[serde(default)]
    generated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlanification {
    #[serde(default)]
    cote_rue_id: Option<StreetSideId>,
    #[serde(default)]
    etat_deneig: Option<i64>,
    #[serde(default)]
    date_deb_planif: Option<String>,
    #[serde(default)]
    date_fin_planif: Option<String>,
    #[serde(default)]
    date_deb_replanif: Option<String>,
    #[serde(default)]
    date_fin_replanif: Option<String>,
    #[serde(default)]
    date_maj: Option<String>,
}

impl PlanificationFeed {
    /// Loads a feed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// planification document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanificationError> {
        let path = path.as_ref();
        log::info!("Loading planifications from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Decodes a feed document:
    /// `{ "planifications": [ { "cote_rue_id", "etat_deneig", ... } ], "generated_at" }`.
    ///
    /// Entries without a street-side id are skipped; a missing state code
    /// reads as 0 (snowy); datetimes that match no accepted format are
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON of that shape.
    pub fn from_reader(reader: impl Read) -> Result<Self, PlanificationError> {
        let document: PlanificationDocument = serde_json::from_reader(reader)?;
        let total = document.planifications.len();

        let records: Vec<PlanificationRecord> = document
            .planifications
            .into_iter()
            .filter_map(|raw| {
                let Some(street_id) = raw.cote_rue_id else {
                    log::debug!("Skipping planification without a street side id");
                    return None;
                };
                Some(PlanificationRecord {
                    street_id,
                    state_code: raw.etat_deneig.unwrap_or(0),
                    planned_start: parse_datetime(raw.date_deb_planif.as_deref()),
                    planned_end: parse_datetime(raw.date_fin_planif.as_deref()),
                    rescheduled_start: parse_datetime(raw.date_deb_replanif.as_deref()),
                    rescheduled_end: parse_datetime(raw.date_fin_replanif.as_deref()),
                    updated_at: parse_datetime(raw.date_maj.as_deref()),
                })
            })
            .collect();

        log::info!("Loaded {} of {total} planifications", records.len());

        Ok(Self {
            records,
            generated_at: parse_datetime(document.generated_at.as_deref()),
        })
    }
}

/// Parses an optional feed datetime, logging values in an unknown format.
fn parse_datetime(value: Option<&str>) -> Option<Timestamp> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(ts) => Some(ts),
        Err(e) => {
            log::warn!("Unable to parse datetime: {e}");
            None
        }
    }
}
