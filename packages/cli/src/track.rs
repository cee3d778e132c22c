//! Replays a stream of location updates through a resolver.
//!
//! Input is one JSON [`LocationUpdate`] per line (`null` meaning the source
//! became unavailable). Each line produces one JSON line of output with the
//! resulting state, the street change if any, and, when a planification
//! feed is available, the snow removal status of the newly resolved street.

use std::io::{BufRead, Write};
use std::sync::{Arc, mpsc};

use serde_json::json;
use snow_removal_catalog::Snapshot;
use snow_removal_planification::{PlanificationBook, PlanificationFeed};
use snow_removal_planification_models::Timestamp;
use snow_removal_resolver::{LocationResolver, LocationUpdate, ResolverConfig, StreetData};

/// Resolves every update read from `input`, writing one result per line
/// to `output`. Malformed lines are logged and skipped.
///
/// # Errors
///
/// Returns an error if reading `input` or writing `output` fails.
pub fn run(
    source: &str,
    data: Arc<Snapshot<StreetData>>,
    config: ResolverConfig,
    feed: Option<&PlanificationFeed>,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel();
    let mut resolver = LocationResolver::new(source, data, config).with_listener(tx);
    let mut book = PlanificationBook::new();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let update = match serde_json::from_str::<Option<LocationUpdate>>(&line) {
            Ok(update) => update.unwrap_or_else(LocationUpdate::unavailable),
            Err(e) => {
                log::warn!("Skipping line {line_number}: {e}");
                continue;
            }
        };

        let state = resolver.resolve(&update);

        let mut status = None;
        let change = rx.try_iter().last();
        if let Some(change) = change {
            if let Some(old) = change.old {
                book.untrack(old);
            }
            if let (Some(new), Some(feed)) = (change.new, feed) {
                book.track(new);
                book.apply(feed.records.iter().filter(|r| r.street_id == new).cloned());
                let now = Timestamp::from(chrono::Local::now());
                status = book.status(new, &now);
            }
        }

        let result = json!({
            "line": line_number,
            "source": resolver.source(),
            "state": state,
            "street_id": resolver.current_street_id(),
            "street_name": resolver.current_street_name(),
            "street_side": resolver.current_street_side(),
            "method": resolver.resolution_method(),
            "change": change,
            "status": status,
        });
        writeln!(output, "{result}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use snow_removal_catalog::StreetCatalog;
    use snow_removal_planification_models::PlanificationRecord;
    use snow_removal_spatial::StreetGeometryIndex;
    use snow_removal_street_models::{Coordinate, StreetGeometry, StreetSide};

    use super::*;

    fn data() -> Arc<Snapshot<StreetData>> {
        let catalog = StreetCatalog::from_streets([StreetSide {
            id: 100,
            name: "Saint-Denis".to_string(),
            street_type: "rue".to_string(),
            range_start: Some(1000),
            range_end: Some(1098),
            side: "Pair".to_string(),
            city: "Montréal".to_string(),
        }]);
        let geometry = StreetGeometryIndex::from_geometries(StreetGeometry::new(
            100,
            vec![
                Coordinate::new(45.50, -73.61),
                Coordinate::new(45.50, -73.59),
            ],
        ));
        Arc::new(Snapshot::new(StreetData::new(catalog, geometry)))
    }

    fn run_lines(input: &str, feed: Option<&PlanificationFeed>) -> Vec<serde_json::Value> {
        let mut output = Vec::new();
        run(
            "test",
            data(),
            ResolverConfig::default(),
            feed,
            input.as_bytes(),
            &mut output,
        )
        .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn reports_each_update() {
        let input = concat!(
            r#"{"state": "home", "attributes": {"latitude": 45.5001, "longitude": -73.60}}"#,
            "\n",
            "not json\n",
            "\n",
            "null\n",
            r#"{"state": "home", "attributes": {"latitude": 0.0, "longitude": 0.0}}"#,
            "\n",
        );

        let results = run_lines(input, None);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["source"], "test");
        assert_eq!(results[0]["state"]["street_id"], 100);
        assert_eq!(results[0]["street_name"], "Rue Saint-Denis");
        assert_eq!(results[0]["change"]["new"], 100);
        assert_eq!(results[1]["line"], 4);
        assert_eq!(results[1]["state"]["state"], "source_unavailable");
        assert!(results[1]["change"].is_null());
        assert_eq!(results[2]["state"]["state"], "outside_coverage");
        assert_eq!(results[2]["change"]["old"], 100);
    }

    #[test]
    fn reports_status_of_new_street() {
        let feed = PlanificationFeed {
            records: vec![PlanificationRecord {
                street_id: 100,
                state_code: 5,
                planned_start: None,
                planned_end: None,
                rescheduled_start: None,
                rescheduled_end: None,
                updated_at: None,
            }],
            generated_at: None,
        };
        let input = r#"{"state": "home", "attributes": {"address": "1000 rue Saint-Denis"}}"#;

        let results = run_lines(input, Some(&feed));

        assert_eq!(results[0]["method"], "address_attribute");
        assert_eq!(results[0]["status"]["state"], "in_progress");
        assert_eq!(results[0]["status"]["parking_banned"], true);
    }
}
