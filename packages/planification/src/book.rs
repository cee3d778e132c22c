//! Planifications of the street sides currently being watched.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use snow_removal_planification_models::{PlanificationRecord, SnowState, Timestamp};
use snow_removal_street_models::StreetSideId;

use crate::ban::{
    BanWindow, NextOperation, ban_window, derive_record, hours_until, is_parking_banned,
    next_operation,
};

/// Everything a consumer shows for one tracked street side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetStatus {
    pub street_id: StreetSideId,
    /// State mapped from the published code.
    pub base_state: SnowState,
    /// State after checking the ban intervals against now.
    pub state: SnowState,
    pub parking_banned: bool,
    pub ban_window: BanWindow,
    pub next_operation: Option<NextOperation>,
    /// Hours until the announced start, while it is still ahead.
    pub hours_until_start: Option<f64>,
    pub updated_at: Option<Timestamp>,
}

/// Keeps the latest planification of each tracked street side.
///
/// A feed covers the whole city; only records for tracked ids are kept.
/// Hosts track the street a vehicle is parked on and untrack the one it
/// left, typically from a resolver change listener.
#[derive(Debug, Clone, Default)]
pub struct PlanificationBook {
    tracked: BTreeSet<StreetSideId>,
    records: BTreeMap<StreetSideId, PlanificationRecord>,
}

impl PlanificationBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a street side. Returns `false` if already tracked.
    pub fn track(&mut self, id: StreetSideId) -> bool {
        let added = self.tracked.insert(id);
        if added {
            log::debug!("Tracking street side {id}");
        }
        added
    }

    /// Stops tracking a street side and forgets its record. Returns `false`
    /// if it was not tracked.
    pub fn untrack(&mut self, id: StreetSideId) -> bool {
        self.records.remove(&id);
        let removed = self.tracked.remove(&id);
        if removed {
            log::debug!("No longer tracking street side {id}");
        }
        removed
    }

    #[must_use]
    pub fn is_tracked(&self, id: StreetSideId) -> bool {
        self.tracked.contains(&id)
    }

    /// Tracked ids in ascending order.
    pub fn tracked(&self) -> impl Iterator<Item = StreetSideId> + '_ {
        self.tracked.iter().copied()
    }

    /// Stores the records of tracked street sides, replacing any previous
    /// record for the same id. Returns the number of records kept.
    pub fn apply(&mut self, records: impl IntoIterator<Item = PlanificationRecord>) -> usize {
        let mut kept = 0;
        for record in records {
            if !self.tracked.contains(&record.street_id) {
                continue;
            }
            log::debug!(
                "Updated street side {}: state={}",
                record.street_id,
                record.base_state()
            );
            self.records.insert(record.street_id, record);
            kept += 1;
        }
        kept
    }

    /// Latest record of a tracked street side.
    #[must_use]
    pub fn get(&self, id: StreetSideId) -> Option<&PlanificationRecord> {
        self.records.get(&id)
    }

    /// Status of a tracked street side at `now`, or `None` when no record
    /// has been received for it.
    #[must_use]
    pub fn status(&self, id: StreetSideId, now: &Timestamp) -> Option<StreetStatus> {
        self.get(id).map(|record| status_of(record, now))
    }
}

/// Builds the status of a single record at `now`.
#[must_use]
pub fn status_of(record: &PlanificationRecord, now: &Timestamp) -> StreetStatus {
    let window = ban_window(record);

    StreetStatus {
        street_id: record.street_id,
        base_state: record.base_state(),
        state: derive_record(record, now),
        parking_banned: is_parking_banned(record, now),
        ban_window: window,
        next_operation: next_operation(record, now),
        hours_until_start: window.start.and_then(|start| hours_until(&start, now)),
        updated_at: record.updated_at,
    }
}
