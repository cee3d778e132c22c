//! Street catalog and geometry shared by every resolver.

use snow_removal_address::parse;
use snow_removal_catalog::StreetCatalog;
use snow_removal_spatial::{DEFAULT_MATCH_THRESHOLD_METERS, StreetGeometryIndex};
use snow_removal_street_models::{ParsedAddress, SearchMatch, StreetSide, StreetSideId};

/// A street side found from GPS coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStreet {
    /// Street side whose polyline is closest.
    pub id: StreetSideId,
    /// Distance in meters from the fix to the street's polyline.
    pub distance_m: f64,
    /// Side designator from the catalog, when published.
    pub side: Option<String>,
    /// Position along the street, from 0.0 (first vertex) to 1.0.
    pub position_ratio: f64,
}

/// One version of the city's street data.
///
/// Never mutated once built; a refresh builds a new value and swaps it
/// into the shared [`snow_removal_catalog::Snapshot`].
#[derive(Debug, Default)]
pub struct StreetData {
    catalog: StreetCatalog,
    geometry: StreetGeometryIndex,
}

impl StreetData {
    /// Bundles a catalog with the geometry of the same city data.
    #[must_use]
    pub const fn new(catalog: StreetCatalog, geometry: StreetGeometryIndex) -> Self {
        Self { catalog, geometry }
    }

    /// The street-side catalog used for address resolution and names.
    #[must_use]
    pub const fn catalog(&self) -> &StreetCatalog {
        &self.catalog
    }

    /// The polyline index used for GPS resolution.
    #[must_use]
    pub const fn geometry(&self) -> &StreetGeometryIndex {
        &self.geometry
    }

    /// Ranked catalog matches for a street name (see
    /// [`StreetCatalog::search`]).
    #[must_use]
    pub fn search(&self, number: Option<u32>, name: &str) -> Vec<SearchMatch<'_>> {
        self.catalog.search(number, name)
    }

    /// Parses a free-text address and returns its best catalog match.
    #[must_use]
    pub fn resolve_address(&self, address: &str) -> Option<(ParsedAddress, &StreetSide)> {
        let Some(parsed) = parse(address) else {
            log::debug!("Could not parse address: {address}");
            return None;
        };

        let best = self.catalog.search(parsed.number, &parsed.name).into_iter().next();
        let Some(best) = best else {
            log::debug!("No catalog matches for: {address}");
            return None;
        };

        Some((parsed, best.street))
    }

    /// Closest street side within the default 100 m threshold.
    #[must_use]
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<NearbyStreet> {
        self.nearest_within(latitude, longitude, DEFAULT_MATCH_THRESHOLD_METERS)
    }

    /// Closest street side within `max_distance_m`, with its side taken
    /// from the catalog.
    #[must_use]
    pub fn nearest_within(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
    ) -> Option<NearbyStreet> {
        let hit = self.geometry.nearest(latitude, longitude, max_distance_m)?;
        let side = self
            .catalog
            .get(hit.id)
            .map(|street| street.side.trim())
            .filter(|side| !side.is_empty())
            .map(ToString::to_string);

        Some(NearbyStreet {
            id: hit.id,
            distance_m: hit.distance_m,
            side,
            position_ratio: hit.position_ratio,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use snow_removal_street_models::{Coordinate, StreetGeometry};

    use super::*;

    pub(crate) fn street(id: StreetSideId, name: &str, range: (i64, i64), side: &str) -> StreetSide {
        StreetSide {
            id,
            name: name.to_string(),
            street_type: "rue".to_string(),
            range_start: Some(range.0),
            range_end: Some(range.1),
            side: side.to_string(),
            city: "Montréal".to_string(),
        }
    }

    pub(crate) fn line(id: StreetSideId, points: &[(f64, f64)]) -> StreetGeometry {
        StreetGeometry::new(
            id,
            points
                .iter()
                .map(|(lat, lon)| Coordinate::new(*lat, *lon))
                .collect(),
        )
        .unwrap()
    }

    /// Two parallel west-east streets ~111 m apart and one north-south
    /// street without a side, all inside Montreal.
    pub(crate) fn sample() -> StreetData {
        let catalog = StreetCatalog::from_streets([
            street(100, "Saint-Denis", (1000, 1098), "Pair"),
            street(101, "Saint-Denis", (1001, 1099), "Impair"),
            street(200, "Rachel", (100, 200), ""),
            street(300, "Saint-Denis Sud", (0, 0), "Pair"),
        ]);
        let geometry = StreetGeometryIndex::from_geometries([
            line(100, &[(45.50, -73.61), (45.50, -73.59)]),
            line(101, &[(45.501, -73.61), (45.501, -73.59)]),
            line(200, &[(45.52, -73.58), (45.53, -73.58)]),
        ]);
        StreetData::new(catalog, geometry)
    }

    #[test]
    fn resolves_address_to_in_range_side() {
        let data = sample();
        let (parsed, street) = data.resolve_address("1099 rue Saint-Denis").unwrap();
        assert_eq!(parsed.number, Some(1099));
        assert_eq!(street.id, 101);
    }

    #[test]
    fn unknown_street_does_not_resolve() {
        assert!(sample().resolve_address("12 avenue du Parc").is_none());
        assert!(sample().resolve_address("   ").is_none());
    }

    #[test]
    fn nearest_reports_catalog_side() {
        let data = sample();
        let hit = data.nearest(45.5001, -73.60).unwrap();
        assert_eq!(hit.id, 100);
        assert_eq!(hit.side.as_deref(), Some("Pair"));
        assert!(hit.distance_m < 12.0);
    }

    #[test]
    fn nearest_without_side() {
        let hit = sample().nearest(45.525, -73.5801).unwrap();
        assert_eq!(hit.id, 200);
        assert_eq!(hit.side, None);
    }

    #[test]
    fn nearest_respects_threshold() {
        let data = sample();
        assert!(data.nearest(45.51, -73.60).is_none());
        assert_eq!(data.nearest_within(45.50105, -73.60, 10.0).unwrap().id, 101);
    }
}
