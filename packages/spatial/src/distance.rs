//! Point-to-segment and point-to-polyline distances.
//!
//! Distances to street geometry use a local equirectangular projection
//! anchored on each segment's first vertex. At city scale (segments of a
//! few hundred meters, matching tolerance of 100 m) the error against a
//! great-circle computation is well under a meter.

use geo::{Distance, Haversine, Point};
use snow_removal_street_models::Coordinate;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A plane in meters centered on an origin coordinate.
#[derive(Debug, Clone, Copy)]
pub struct PlanarFrame {
    origin: Coordinate,
    cos_lat: f64,
}

impl PlanarFrame {
    /// Creates a frame centered on `origin`.
    #[must_use]
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            cos_lat: origin.latitude.to_radians().cos(),
        }
    }

    /// Projects a coordinate to `(x, y)` meters east/north of the origin.
    #[must_use]
    pub fn project(&self, coordinate: Coordinate) -> (f64, f64) {
        let x = (coordinate.longitude - self.origin.longitude) * self.cos_lat * METERS_PER_DEGREE;
        let y = (coordinate.latitude - self.origin.latitude) * METERS_PER_DEGREE;
        (x, y)
    }
}

/// Distance from a point to one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDistance {
    /// Distance in meters to the closest point of the segment.
    pub distance_m: f64,
    /// Position of that closest point along the segment, clamped to
    /// `[0, 1]` (0 = start, 1 = end).
    pub t: f64,
}

/// Distance from `point` to the segment `start`→`end`.
///
/// The projection parameter is clamped, so a point beyond either end is
/// measured to that endpoint. A zero-length segment is treated as a point.
#[must_use]
pub fn point_to_segment(point: Coordinate, start: Coordinate, end: Coordinate) -> SegmentDistance {
    let frame = PlanarFrame::new(start);
    let (px, py) = frame.project(point);
    let (ex, ey) = frame.project(end);

    let length_sq = ex.mul_add(ex, ey * ey);
    if length_sq == 0.0 {
        return SegmentDistance {
            distance_m: px.hypot(py),
            t: 0.0,
        };
    }

    let t = (px.mul_add(ex, py * ey) / length_sq).clamp(0.0, 1.0);
    let dx = t.mul_add(-ex, px);
    let dy = t.mul_add(-ey, py);

    SegmentDistance {
        distance_m: dx.hypot(dy),
        t,
    }
}

/// Distance from a point to a whole polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineDistance {
    /// Minimum distance in meters over all segments.
    pub distance_m: f64,
    /// Index of the closest segment (between vertex `i` and `i + 1`).
    pub segment_index: usize,
    /// Clamped position along the closest segment.
    pub t: f64,
    /// Position of the closest point along the whole polyline, from 0.0
    /// (first vertex) to 1.0 (last vertex), by great-circle length.
    pub position_ratio: f64,
}

/// Minimum distance from `point` to any segment of `vertices`.
///
/// Returns `None` for fewer than two vertices or when every vertex is the
/// same point (a polyline with no length).
#[must_use]
pub fn point_to_polyline(point: Coordinate, vertices: &[Coordinate]) -> Option<PolylineDistance> {
    if vertices.len() < 2 {
        return None;
    }

    let segment_lengths: Vec<f64> = vertices
        .windows(2)
        .map(|pair| haversine_meters(pair[0], pair[1]))
        .collect();
    let total_length: f64 = segment_lengths.iter().sum();
    if total_length <= 0.0 {
        return None;
    }

    let mut best: Option<PolylineDistance> = None;
    let mut walked = 0.0;

    for (segment_index, (pair, length)) in vertices.windows(2).zip(&segment_lengths).enumerate() {
        let segment = point_to_segment(point, pair[0], pair[1]);

        if best.is_none_or(|b| segment.distance_m < b.distance_m) {
            best = Some(PolylineDistance {
                distance_m: segment.distance_m,
                segment_index,
                t: segment.t,
                position_ratio: segment.t.mul_add(*length, walked) / total_length,
            });
        }

        walked += length;
    }

    best
}

/// Great-circle distance in meters between two coordinates.
#[must_use]
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_M: f64 = 0.01;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn point_on_segment_midpoint() {
        let result = point_to_segment(
            coord(45.50, -73.60),
            coord(45.50, -73.61),
            coord(45.50, -73.59),
        );
        assert!(result.distance_m < TOLERANCE_M);
        assert!((result.t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn perpendicular_offset_is_measured_north() {
        // 0.001 degree north of a west-east segment.
        let result = point_to_segment(
            coord(45.501, -73.60),
            coord(45.50, -73.61),
            coord(45.50, -73.59),
        );
        assert!((result.distance_m - 111.32).abs() < TOLERANCE_M);
        assert!((result.t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clamps_before_start() {
        let start = coord(45.50, -73.61);
        let end = coord(45.50, -73.59);
        let point = coord(45.50, -73.65);

        let result = point_to_segment(point, start, end);

        assert!(result.t.abs() < f64::EPSILON);
        let endpoint = point_to_segment(point, start, start);
        assert!((result.distance_m - endpoint.distance_m).abs() < TOLERANCE_M);
        assert!(result.distance_m > 3000.0);
    }

    #[test]
    fn clamps_after_end() {
        let result = point_to_segment(
            coord(45.52, -73.55),
            coord(45.50, -73.61),
            coord(45.50, -73.59),
        );
        assert!((result.t - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_length_segment_is_point_distance() {
        let origin = coord(45.50, -73.60);
        let result = point_to_segment(coord(45.501, -73.60), origin, origin);
        assert!((result.distance_m - 111.32).abs() < TOLERANCE_M);
        assert!(result.t.abs() < f64::EPSILON);
    }

    #[test]
    fn polyline_picks_closest_segment() {
        let vertices = [
            coord(45.50, -73.62),
            coord(45.50, -73.61),
            coord(45.51, -73.61),
        ];
        let result = point_to_polyline(coord(45.505, -73.6101), &vertices).unwrap();
        assert_eq!(result.segment_index, 1);
        assert!(result.distance_m < 10.0);
        assert!(result.position_ratio > 0.5 && result.position_ratio < 1.0);
    }

    #[test]
    fn polyline_position_ratio_at_ends() {
        let vertices = [coord(45.50, -73.61), coord(45.50, -73.59)];
        let before = point_to_polyline(coord(45.50, -73.62), &vertices).unwrap();
        let after = point_to_polyline(coord(45.50, -73.58), &vertices).unwrap();
        assert!(before.position_ratio.abs() < 1e-9);
        assert!((after.position_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn polyline_needs_two_vertices() {
        assert!(point_to_polyline(coord(45.5, -73.6), &[coord(45.5, -73.6)]).is_none());
        assert!(point_to_polyline(coord(45.5, -73.6), &[]).is_none());
    }

    #[test]
    fn polyline_without_length_is_skipped() {
        let p = coord(45.5, -73.6);
        assert!(point_to_polyline(coord(45.51, -73.6), &[p, p, p]).is_none());
    }

    #[test]
    fn haversine_of_small_offset() {
        // ~1.11 m north.
        let d = haversine_meters(coord(45.5, -73.6), coord(45.50001, -73.6));
        assert!(d > 1.0 && d < 1.2);
    }
}
