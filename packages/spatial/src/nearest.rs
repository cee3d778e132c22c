//! Nearest street-side lookup for a GPS fix.

use rstar::AABB;
use snow_removal_street_models::{Coordinate, StreetSideId};

use crate::StreetGeometryIndex;
use crate::distance::{METERS_PER_DEGREE, point_to_polyline};

/// A fix farther than this from every street is not matched.
pub const DEFAULT_MATCH_THRESHOLD_METERS: f64 = 100.0;

/// Search window padding relative to the threshold; covers the difference
/// between the query latitude and each segment's projection origin.
const ENVELOPE_PADDING_FACTOR: f64 = 1.5;

/// Smallest longitude scale used when sizing the search window, so the
/// window stays finite near the poles.
const MIN_COS_LAT: f64 = 0.01;

/// The street side closest to a coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestStreet {
    /// Closest street side.
    pub id: StreetSideId,
    /// Distance in meters from the coordinate to its polyline.
    pub distance_m: f64,
    /// Position of the closest point along the polyline (0.0 to 1.0).
    pub position_ratio: f64,
}

impl StreetGeometryIndex {
    /// Finds the street side whose polyline passes closest to
    /// `(latitude, longitude)`.
    ///
    /// Only polylines with at least two vertices are considered. Returns
    /// `None` when the index is empty, or when the closest polyline is
    /// `max_distance_m` or more away. Equal distances resolve to the
    /// lowest id.
    #[must_use]
    pub fn nearest(&self, latitude: f64, longitude: f64, max_distance_m: f64) -> Option<NearestStreet> {
        if !latitude.is_finite() || !longitude.is_finite() || max_distance_m <= 0.0 {
            return None;
        }

        let point = Coordinate::new(latitude, longitude);
        let window = search_window(point, max_distance_m);

        let mut best: Option<NearestStreet> = None;
        for line in self.lines.locate_in_envelope_intersecting(&window) {
            let Some(geometry) = self.geometries.get(&line.id) else {
                continue;
            };
            let Some(result) = point_to_polyline(point, &geometry.vertices) else {
                continue;
            };

            let closer = best.is_none_or(|b| {
                result.distance_m < b.distance_m
                    || (result.distance_m == b.distance_m && line.id < b.id)
            });
            if closer {
                best = Some(NearestStreet {
                    id: line.id,
                    distance_m: result.distance_m,
                    position_ratio: result.position_ratio,
                });
            }
        }

        match best {
            Some(hit) if hit.distance_m < max_distance_m => Some(hit),
            Some(hit) => {
                log::debug!(
                    "Closest street {} is {:.0}m from ({latitude:.5}, {longitude:.5}), beyond {max_distance_m:.0}m",
                    hit.id,
                    hit.distance_m
                );
                None
            }
            None => None,
        }
    }
}

/// Degree-space box around `point` that contains every location within
/// `radius_m` meters.
fn search_window(point: Coordinate, radius_m: f64) -> AABB<[f64; 2]> {
    let padded = radius_m * ENVELOPE_PADDING_FACTOR;
    let lat_delta = padded / METERS_PER_DEGREE;
    let cos_lat = point.latitude.to_radians().cos().abs().max(MIN_COS_LAT);
    let lon_delta = padded / (METERS_PER_DEGREE * cos_lat);

    AABB::from_corners(
        [point.longitude - lon_delta, point.latitude - lat_delta],
        [point.longitude + lon_delta, point.latitude + lat_delta],
    )
}
