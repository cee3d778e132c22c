#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the street catalog and street geometry index.
//!
//! This crate contains only data types and simple conversions. It has no
//! heavyweight dependencies (no geometry engine, no I/O).

use serde::{Deserialize, Serialize};

/// Identifier of one side of one block of a street, as assigned by the
/// city's geobase.
pub type StreetSideId = i64;

/// One catalog entry: a single side of a single street block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetSide {
    /// Unique street-side identifier.
    pub id: StreetSideId,
    /// Street name without its type (e.g. `"Saint-Denis"`).
    pub name: String,
    /// Street type as published (e.g. `"rue"`, `"avenue"`).
    pub street_type: String,
    /// First civic number of the block, if known.
    pub range_start: Option<i64>,
    /// Last civic number of the block, if known.
    pub range_end: Option<i64>,
    /// Side designator (e.g. `"Impair"`, `"Pair"`, `"Gauche"`).
    pub side: String,
    /// Owning municipality or borough.
    pub city: String,
}

impl StreetSide {
    /// Returns the `[start, end]` address range when both bounds are known.
    #[must_use]
    pub const fn address_range(&self) -> Option<(i64, i64)> {
        match (self.range_start, self.range_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Returns `true` if `number` falls inside the recorded address range.
    ///
    /// Always `false` when either bound is missing.
    #[must_use]
    pub fn contains_number(&self, number: u32) -> bool {
        self.address_range()
            .is_some_and(|(start, end)| (start..=end).contains(&i64::from(number)))
    }

    /// Human-readable street name: capitalized type followed by the name
    /// (e.g. `"Rue Saint-Denis"`).
    ///
    /// Returns `"Unknown"` when both the type and the name are empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        let street_type = self.street_type.trim();
        if !street_type.is_empty() {
            parts.push(capitalize(street_type));
        }
        let name = self.name.trim();
        if !name.is_empty() {
            parts.push(name.to_string());
        }

        if parts.is_empty() {
            "Unknown".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude/longitude pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Inclusive latitude/longitude rectangle describing the service area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Returns `true` if the coordinate lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coordinate.latitude)
            && (self.min_lon..=self.max_lon).contains(&coordinate.longitude)
    }

    /// Returns `true` if every edge is finite and each minimum does not
    /// exceed its maximum.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lon <= self.max_lon
    }
}

/// Polyline approximating the shape of one street side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetGeometry {
    /// Street side this geometry belongs to. Not guaranteed to exist in
    /// the catalog.
    pub id: StreetSideId,
    /// Ordered vertices.
    pub vertices: Vec<Coordinate>,
    /// Arithmetic mean of the vertices.
    pub centroid: Coordinate,
}

impl StreetGeometry {
    /// Builds a geometry and precomputes its centroid.
    ///
    /// Returns `None` when `vertices` is empty.
    #[must_use]
    pub fn new(id: StreetSideId, vertices: Vec<Coordinate>) -> Option<Self> {
        let centroid = vertex_mean(&vertices)?;
        Some(Self {
            id,
            vertices,
            centroid,
        })
    }

    /// Polylines need at least one segment to be matched against a point.
    #[must_use]
    pub fn is_matchable(&self) -> bool {
        self.vertices.len() >= 2
    }
}

/// Unweighted mean of the vertices (every vertex counts once, regardless
/// of segment length).
#[allow(clippy::cast_precision_loss)]
fn vertex_mean(vertices: &[Coordinate]) -> Option<Coordinate> {
    if vertices.is_empty() {
        return None;
    }
    let count = vertices.len() as f64;
    let (lat_sum, lon_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(lat, lon), v| (lat + v.latitude, lon + v.longitude));
    Some(Coordinate::new(lat_sum / count, lon_sum / count))
}

/// A free-text address broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
    /// Leading civic number, if one was present.
    pub number: Option<u32>,
    /// Normalized street name tokens joined by single spaces. Never empty.
    pub name: String,
    /// Canonical street type, if a known type token was found.
    pub street_type: Option<String>,
    /// The trimmed input.
    pub original: String,
}

/// One hit from a catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch<'a> {
    /// Matched street side.
    pub id: StreetSideId,
    /// Match quality from 0 to 100.
    pub score: u8,
    /// Whether the queried civic number lies in the street's range.
    pub in_range: bool,
    /// The matched catalog entry.
    pub street: &'a StreetSide,
}
