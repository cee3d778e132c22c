#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tracks which street side a vehicle is on.
//!
//! A [`LocationResolver`] follows one source (a vehicle's tracker or
//! location sensor). Each [`LocationUpdate`] is resolved to a street side,
//! first from a textual address attribute when one is present, then from
//! GPS coordinates. GPS fixes that barely moved are ignored, and a
//! registered [`StreetChangeListener`] hears about every change of street.
//!
//! Street data is shared read-only between resolvers through a
//! [`Snapshot`]; each resolver owns its own state.

pub mod config;
pub mod data;
pub mod listener;
pub mod update;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use snow_removal_catalog::Snapshot;
use snow_removal_spatial::haversine_meters;
use snow_removal_street_models::{Coordinate, StreetSide, StreetSideId};
use strum_macros::{AsRefStr, Display, EnumString};

pub use config::{ConfigError, ResolverConfig};
pub use data::{NearbyStreet, StreetData};
pub use listener::{StreetChange, StreetChangeListener};
pub use update::LocationUpdate;

/// How the current street was found.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionMethod {
    /// From a textual address attribute.
    AddressAttribute,
    /// From GPS coordinates.
    Gps,
}

/// Whether the source has reported a location.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    /// No update received yet.
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// Outcome of the latest resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "street_id", rename_all = "snake_case")]
pub enum ResolutionState {
    /// The source reports no location. The last street is kept.
    SourceUnavailable,
    /// No street could be determined.
    #[default]
    Unresolved,
    /// The location lies outside the covered area or far from any street.
    OutsideCoverage,
    /// The vehicle is on this street side.
    Resolved(StreetSideId),
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable => f.write_str("source_unavailable"),
            Self::Unresolved => f.write_str("unresolved"),
            Self::OutsideCoverage => f.write_str("outside_coverage"),
            Self::Resolved(id) => write!(f, "resolved({id})"),
        }
    }
}

/// Everything a resolver knows about its source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolverState {
    pub street_id: Option<StreetSideId>,
    pub street_name: Option<String>,
    pub street_side: Option<String>,
    pub last_resolution: Option<DateTime<Utc>>,
    pub method: Option<ResolutionMethod>,
    pub availability: Availability,
    /// Outcome of the latest recorded resolution, regardless of availability.
    pub outcome: ResolutionState,
    /// Last GPS fix that was resolved; only used to skip small moves.
    #[serde(skip)]
    pub last_coordinate: Option<Coordinate>,
}

/// Result of one resolution attempt, before it is recorded.
struct Resolution {
    street: Option<(StreetSideId, String, Option<String>)>,
    method: ResolutionMethod,
    outcome: ResolutionState,
}

impl Resolution {
    fn resolved(street: &StreetSide, side: Option<String>, method: ResolutionMethod) -> Self {
        Self {
            street: Some((street.id, street.display_name(), side)),
            method,
            outcome: ResolutionState::Resolved(street.id),
        }
    }

    const fn none(method: ResolutionMethod, outcome: ResolutionState) -> Self {
        Self {
            street: None,
            method,
            outcome,
        }
    }
}

/// Resolves the location updates of one source to a street side.
pub struct LocationResolver {
    source: String,
    data: Arc<Snapshot<StreetData>>,
    config: ResolverConfig,
    state: ResolverState,
    listener: Option<Box<dyn StreetChangeListener>>,
}

impl fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationResolver")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl LocationResolver {
    /// Creates a resolver for the source named `source` (used in logs).
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        data: Arc<Snapshot<StreetData>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source: source.into(),
            data,
            config,
            state: ResolverState::default(),
            listener: None,
        }
    }

    /// Registers the listener told about street changes, replacing any
    /// previous one.
    #[must_use]
    pub fn with_listener(mut self, listener: impl StreetChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Resolves an update at the current time.
    pub fn resolve(&mut self, update: &LocationUpdate) -> ResolutionState {
        self.resolve_at(update, Utc::now())
    }

    /// Resolves an update, recording `now` as the resolution time.
    ///
    /// Never fails: every update ends in one of the [`ResolutionState`]s.
    /// The listener is called at most once, and only if the street side id
    /// changed.
    pub fn resolve_at(&mut self, update: &LocationUpdate, now: DateTime<Utc>) -> ResolutionState {
        if !update.is_available() {
            self.state.availability = Availability::Unavailable;
            log::debug!("Source {} is {}", self.source, update.state.trim());
            return self.state();
        }
        self.state.availability = Availability::Available;

        let data = self.data.load();

        let address = update.address(&self.config.address_attributes);
        if let Some(address) = address {
            if let Some((parsed, street)) = data.resolve_address(address) {
                log::debug!(
                    "Parsed {:?} as number={:?} name={:?} type={:?}",
                    parsed.original,
                    parsed.number,
                    parsed.name,
                    parsed.street_type
                );
                let side = non_blank(&street.side);
                self.record(
                    Resolution::resolved(street, side, ResolutionMethod::AddressAttribute),
                    now,
                );
                return self.state();
            }
            log::debug!("Address {address:?} did not resolve, trying coordinates");
        }

        let Some(coordinate) = update.coordinates() else {
            if address.is_some() {
                self.record(
                    Resolution::none(ResolutionMethod::AddressAttribute, ResolutionState::Unresolved),
                    now,
                );
            } else {
                log::warn!(
                    "Cannot resolve location for {}: no address attributes or GPS coordinates",
                    self.source
                );
            }
            return self.state();
        };

        if !self.config.bounds.contains(coordinate) {
            log::debug!(
                "Coordinates ({:.4}, {:.4}) outside coverage bounds",
                coordinate.latitude,
                coordinate.longitude
            );
            self.record(
                Resolution::none(ResolutionMethod::Gps, ResolutionState::OutsideCoverage),
                now,
            );
            return self.state();
        }

        if let Some(last) = self.state.last_coordinate {
            let moved = haversine_meters(last, coordinate);
            if moved < self.config.debounce_meters {
                log::debug!("Moved only {moved:.1}m, skipping re-resolution");
                return self.state();
            }
        }
        self.state.last_coordinate = Some(coordinate);

        if !data.geometry().is_loaded() {
            log::warn!("Street geometry not available for GPS resolution");
        }

        let nearby = data.nearest_within(
            coordinate.latitude,
            coordinate.longitude,
            self.config.match_threshold_meters,
        );
        let resolution = match nearby {
            Some(hit) => {
                let Some(street) = data.catalog().get(hit.id) else {
                    log::debug!("Street side {} has geometry but no catalog entry", hit.id);
                    self.record(
                        Resolution {
                            street: Some((hit.id, format!("Street {}", hit.id), None)),
                            method: ResolutionMethod::Gps,
                            outcome: ResolutionState::Resolved(hit.id),
                        },
                        now,
                    );
                    return self.state();
                };
                log::debug!(
                    "GPS ({:.4}, {:.4}) is {:.0}m from street side {} ({:.0}% along)",
                    coordinate.latitude,
                    coordinate.longitude,
                    hit.distance_m,
                    hit.id,
                    hit.position_ratio * 100.0
                );
                Resolution::resolved(street, hit.side, ResolutionMethod::Gps)
            }
            None => {
                log::debug!(
                    "No street found near ({:.4}, {:.4})",
                    coordinate.latitude,
                    coordinate.longitude
                );
                Resolution::none(ResolutionMethod::Gps, ResolutionState::OutsideCoverage)
            }
        };
        self.record(resolution, now);
        self.state()
    }

    /// Stores a resolution and notifies the listener if the street changed.
    fn record(&mut self, resolution: Resolution, now: DateTime<Utc>) {
        let old = self.state.street_id;
        let (id, name, side) = match resolution.street {
            Some((id, name, side)) => (Some(id), Some(name), side),
            None => (None, None, None),
        };

        self.state.street_id = id;
        self.state.street_name = name;
        self.state.street_side = side;
        self.state.last_resolution = Some(now);
        self.state.method = Some(resolution.method);
        self.state.outcome = resolution.outcome;

        if old == id {
            return;
        }

        match (id, self.state.street_name.as_deref()) {
            (Some(id), Some(name)) => log::info!(
                "{} resolved to {name} (street side {id}, via {})",
                self.source,
                resolution.method
            ),
            _ => log::info!("{} is no longer on a known street", self.source),
        }

        if let Some(listener) = self.listener.as_mut() {
            listener.on_street_change(StreetChange { old, new: id });
        }
    }

    /// Current state: `SourceUnavailable` while the source reports no
    /// location, otherwise the outcome of the latest resolution.
    #[must_use]
    pub const fn state(&self) -> ResolutionState {
        match self.state.availability {
            Availability::Unavailable => ResolutionState::SourceUnavailable,
            Availability::Unknown | Availability::Available => self.state.outcome,
        }
    }

    /// Full resolver state, including the last GPS fix used for debouncing.
    #[must_use]
    pub const fn details(&self) -> &ResolverState {
        &self.state
    }

    /// Name of the followed source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Id of the current street side, kept while the source is unavailable.
    #[must_use]
    pub const fn current_street_id(&self) -> Option<StreetSideId> {
        self.state.street_id
    }

    /// Display name of the current street, e.g. `"Rue Saint-Denis"`.
    #[must_use]
    pub fn current_street_name(&self) -> Option<&str> {
        self.state.street_name.as_deref()
    }

    /// Side designator of the current street side, when the catalog has one.
    #[must_use]
    pub fn current_street_side(&self) -> Option<&str> {
        self.state.street_side.as_deref()
    }

    /// When the last resolution was recorded. Debounced fixes leave it unchanged.
    #[must_use]
    pub const fn last_resolution(&self) -> Option<DateTime<Utc>> {
        self.state.last_resolution
    }

    /// How the last resolution was made.
    #[must_use]
    pub const fn resolution_method(&self) -> Option<ResolutionMethod> {
        self.state.method
    }

    /// `true` once the source has reported a location and until it
    /// reports none.
    #[must_use]
    pub const fn source_available(&self) -> bool {
        matches!(self.state.availability, Availability::Available)
    }

    /// `true` while a street side id is held.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.state.street_id.is_some()
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
