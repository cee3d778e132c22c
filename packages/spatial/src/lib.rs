#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory street geometry index.
//!
//! Loads the street-side polylines published by the city (one `LineString`
//! per street side, keyed by `COTE_RUE_ID`), precomputes their centroids,
//! and builds an R-tree over the matchable ones so that a GPS fix can be
//! resolved to the closest street side (see [`nearest`]).

pub mod distance;
pub mod nearest;

use std::collections::BTreeMap;
use std::path::Path;

use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};
use snow_removal_street_models::{Coordinate, StreetGeometry, StreetSideId};

pub use distance::{PolylineDistance, haversine_meters, point_to_polyline, point_to_segment};
pub use nearest::{DEFAULT_MATCH_THRESHOLD_METERS, NearestStreet};

/// Feature property holding the street-side id.
pub const STREET_SIDE_ID_PROPERTY: &str = "COTE_RUE_ID";

/// Errors from loading a geometry document.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but not a usable feature collection.
    #[error("Invalid geometry document: {0}")]
    InvalidDocument(String),
}

/// A matchable polyline stored in the R-tree by id and bounding box.
struct IndexedLine {
    id: StreetSideId,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Street-side geometries keyed by id, with an R-tree over every
/// polyline that has at least one segment.
///
/// Built once and shared read-only by every resolver.
pub struct StreetGeometryIndex {
    geometries: BTreeMap<StreetSideId, StreetGeometry>,
    lines: RTree<IndexedLine>,
    loaded: bool,
}

impl Default for StreetGeometryIndex {
    fn default() -> Self {
        Self {
            geometries: BTreeMap::new(),
            lines: RTree::new(),
            loaded: false,
        }
    }
}

impl std::fmt::Debug for StreetGeometryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreetGeometryIndex")
            .field("geometries", &self.geometries.len())
            .field("matchable", &self.lines.size())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl StreetGeometryIndex {
    /// Builds a loaded index from already-decoded geometries.
    ///
    /// A later geometry with a duplicate id replaces the earlier one.
    #[must_use]
    pub fn from_geometries(geometries: impl IntoIterator<Item = StreetGeometry>) -> Self {
        let geometries: BTreeMap<StreetSideId, StreetGeometry> =
            geometries.into_iter().map(|g| (g.id, g)).collect();

        let lines = geometries
            .values()
            .filter(|g| g.is_matchable())
            .map(|g| IndexedLine {
                id: g.id,
                envelope: compute_envelope(&g.vertices),
            })
            .collect();

        Self {
            geometries,
            lines: RTree::bulk_load(lines),
            loaded: true,
        }
    }

    /// Loads the index from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a `GeoJSON`
    /// feature collection.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        log::info!("Loading street geometry from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text)
    }

    /// Parses a `GeoJSON` `FeatureCollection` of street-side polylines.
    ///
    /// Features without a numeric `COTE_RUE_ID` or without a usable
    /// geometry are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid `GeoJSON` or is not a
    /// feature collection.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, GeometryError> {
        let GeoJson::FeatureCollection(collection) = geojson_str.parse::<GeoJson>()? else {
            return Err(GeometryError::InvalidDocument(
                "expected a FeatureCollection".to_string(),
            ));
        };

        let total = collection.features.len();
        let geometries: Vec<StreetGeometry> = collection
            .features
            .into_iter()
            .filter_map(parse_feature)
            .collect();

        let index = Self::from_geometries(geometries);
        log::info!(
            "Loaded {} street geometries ({} matchable) from {total} features",
            index.len(),
            index.lines.size()
        );
        Ok(index)
    }

    /// Returns `true` once the index has been built from data.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of geometries in the index, matchable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Returns `true` if the index holds no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Looks up the geometry of a street side.
    #[must_use]
    pub fn get(&self, id: StreetSideId) -> Option<&StreetGeometry> {
        self.geometries.get(&id)
    }

    /// Centroid of a street side, for placing it on a map.
    #[must_use]
    pub fn center(&self, id: StreetSideId) -> Option<Coordinate> {
        self.get(id).map(|g| g.centroid)
    }
}

/// Extracts a street geometry from one `GeoJSON` feature.
fn parse_feature(feature: geojson::Feature) -> Option<StreetGeometry> {
    let Some(id) = feature
        .property(STREET_SIDE_ID_PROPERTY)
        .and_then(street_side_id)
    else {
        log::debug!("Skipping feature without a numeric {STREET_SIDE_ID_PROPERTY}");
        return None;
    };

    let geometry = feature.geometry?;
    let geo_geom: geo::Geometry<f64> = match geometry.try_into() {
        Ok(g) => g,
        Err(e) => {
            log::debug!("Failed to convert geometry for street side {id}: {e}");
            return None;
        }
    };

    let vertices: Vec<Coordinate> = match geo_geom {
        geo::Geometry::LineString(line) => line
            .coords()
            .map(|c| Coordinate::new(c.y, c.x))
            .collect(),
        geo::Geometry::MultiLineString(multi) if multi.0.len() == 1 => multi.0[0]
            .coords()
            .map(|c| Coordinate::new(c.y, c.x))
            .collect(),
        geo::Geometry::Point(point) => vec![Coordinate::new(point.y(), point.x())],
        _ => {
            log::debug!("Unsupported geometry type for street side {id}");
            return None;
        }
    };

    StreetGeometry::new(id, vertices)
}

/// Reads a street-side id published either as a number or as text.
///
/// Integral floats (`13811.0`, as ArcGIS exports write them) are accepted.
#[allow(clippy::cast_possible_truncation)]
fn street_side_id(value: &serde_json::Value) -> Option<StreetSideId> {
    let id = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

/// Bounding box of a vertex list as `[lon, lat]` corners.
fn compute_envelope(vertices: &[Coordinate]) -> AABB<[f64; 2]> {
    let points: Vec<[f64; 2]> = vertices
        .iter()
        .map(|v| [v.longitude, v.latitude])
        .collect();
    AABB::from_points(points.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "COTE_RUE_ID": 100 },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-73.61, 45.50], [-73.59, 45.50]]
                }
            },
            {
                "type": "Feature",
                "properties": { "COTE_RUE_ID": "200" },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[-73.60, 45.51], [-73.60, 45.52]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "COTE_RUE_ID": 300 },
                "geometry": { "type": "Point", "coordinates": [-73.58, 45.53] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "no id" },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-73.61, 45.50], [-73.59, 45.50]]
                }
            },
            {
                "type": "Feature",
                "properties": { "COTE_RUE_ID": 400 },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn loads_feature_collection() {
        let index = StreetGeometryIndex::from_geojson_str(DOCUMENT).unwrap();
        assert!(index.is_loaded());
        assert_eq!(index.len(), 3);
        assert_eq!(index.lines.size(), 2);
    }

    #[test]
    fn accepts_string_ids_and_single_part_multilines() {
        let index = StreetGeometryIndex::from_geojson_str(DOCUMENT).unwrap();
        let geometry = index.get(200).unwrap();
        assert_eq!(geometry.vertices.len(), 2);
        assert!((geometry.vertices[0].latitude - 45.51).abs() < 1e-9);
        assert!((geometry.vertices[0].longitude + 73.60).abs() < 1e-9);
    }

    #[test]
    fn computes_centers() {
        let index = StreetGeometryIndex::from_geojson_str(DOCUMENT).unwrap();
        let center = index.center(100).unwrap();
        assert!((center.latitude - 45.50).abs() < 1e-9);
        assert!((center.longitude + 73.60).abs() < 1e-9);
        assert!(index.center(999).is_none());
    }

    #[test]
    fn accepts_integral_float_ids() {
        let index = StreetGeometryIndex::from_geojson_str(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": { "COTE_RUE_ID": 13811.0 },
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-73.61, 45.50], [-73.59, 45.50]]
                    }
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get(13811).is_some());
    }

    #[test]
    fn fractional_ids_are_skipped() {
        assert_eq!(street_side_id(&serde_json::json!(13811.5)), None);
        assert_eq!(street_side_id(&serde_json::json!(13811.0)), Some(13811));
    }

    #[test]
    fn keeps_point_geometry_unmatchable() {
        let index = StreetGeometryIndex::from_geojson_str(DOCUMENT).unwrap();
        assert!(!index.get(300).unwrap().is_matchable());
    }

    #[test]
    fn rejects_non_collection() {
        let result = StreetGeometryIndex::from_geojson_str(
            r#"{"type": "Point", "coordinates": [-73.6, 45.5]}"#,
        );
        assert!(matches!(result, Err(GeometryError::InvalidDocument(_))));
    }

    #[test]
    fn rejects_invalid_json() {
        let result = StreetGeometryIndex::from_geojson_str("{not json");
        assert!(matches!(result, Err(GeometryError::GeoJson(_))));
    }

    #[test]
    fn default_index_is_not_loaded() {
        let index = StreetGeometryIndex::default();
        assert!(!index.is_loaded());
        assert!(index.is_empty());
    }
}
