//! Parking ban derivation.
//!
//! The published state code alone does not say whether parking is banned
//! right now: a street in the `Planned` or `Rescheduled` state is only
//! banned while the current time falls inside its interval. These helpers
//! combine the code with the intervals and the current time.

use std::fmt;

use chrono::TimeDelta;
use serde::{Serialize, Serializer};
use snow_removal_planification_models::{BanInterval, PlanificationRecord, SnowState, Timestamp};

/// Derives the state to display for a street side at `now`.
///
/// Only `Planned` and `Rescheduled` are refined: a rescheduled street checks
/// its rescheduled interval first, then the planned one; a planned street
/// checks only the planned one. A hit yields [`SnowState::ParkingBanned`].
/// Every other code maps straight to its base state.
#[must_use]
pub fn derive(
    code: i64,
    planned: Option<&BanInterval>,
    rescheduled: Option<&BanInterval>,
    now: &Timestamp,
) -> SnowState {
    let base = SnowState::from_code(code);

    let banned = match base {
        SnowState::Rescheduled => {
            rescheduled.is_some_and(|i| i.contains(now)) || planned.is_some_and(|i| i.contains(now))
        }
        SnowState::Planned => planned.is_some_and(|i| i.contains(now)),
        _ => false,
    };

    if banned {
        SnowState::ParkingBanned
    } else {
        base
    }
}

/// [`derive`] applied to a record.
#[must_use]
pub fn derive_record(record: &PlanificationRecord, now: &Timestamp) -> SnowState {
    derive(
        record.state_code,
        record.planned().as_ref(),
        record.rescheduled().as_ref(),
        now,
    )
}

/// Returns `true` while parking is forbidden on the street side: inside an
/// applicable ban interval, or at any time while clearing is in progress.
#[must_use]
pub fn is_parking_banned(record: &PlanificationRecord, now: &Timestamp) -> bool {
    matches!(
        derive_record(record, now),
        SnowState::ParkingBanned | SnowState::InProgress
    )
}

/// Bounds of the ban to announce for a street side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BanWindow {
    /// Start of the ban, if known.
    pub start: Option<Timestamp>,
    /// End of the ban, if known.
    pub end: Option<Timestamp>,
}

/// The ban window of a record: the rescheduled bounds for a rescheduled
/// street (each falling back to the planned bound), the planned bounds
/// otherwise.
#[must_use]
pub fn ban_window(record: &PlanificationRecord) -> BanWindow {
    if record.base_state() == SnowState::Rescheduled {
        BanWindow {
            start: record.rescheduled_start.or(record.planned_start),
            end: record.rescheduled_end.or(record.planned_end),
        }
    } else {
        BanWindow {
            start: record.planned_start,
            end: record.planned_end,
        }
    }
}

/// When the next clearing operation happens on a street side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOperation {
    /// Clearing is underway, or now lies within a ban interval.
    InProgress,
    /// Clearing starts after this much time.
    StartsIn(TimeDelta),
}

impl fmt::Display for NextOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("in progress"),
            Self::StartsIn(delta) => {
                let hours = delta.num_hours();
                if hours < 24 {
                    return write!(f, "{hours}h");
                }
                let (days, remaining) = (hours / 24, hours % 24);
                if remaining > 0 {
                    write!(f, "{days}d {remaining}h")
                } else {
                    write!(f, "{days}d")
                }
            }
        }
    }
}

impl Serialize for NextOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hours from `now` until `target`, or `None` if `target` is not in the
/// future.
#[must_use]
pub fn hours_until(target: &Timestamp, now: &Timestamp) -> Option<f64> {
    let hours = target.signed_duration_since(now).as_seconds_f64() / 3600.0;
    (hours > 0.0).then_some(hours)
}

/// Timing of the next operation on a street side at `now`.
///
/// In progress when the state says so or when now lies in the rescheduled
/// or planned interval. Otherwise counts down to the planned start, or to
/// the rescheduled start when no planned start is published. `None` when
/// nothing is upcoming.
#[must_use]
pub fn next_operation(record: &PlanificationRecord, now: &Timestamp) -> Option<NextOperation> {
    if record.base_state() == SnowState::InProgress {
        return Some(NextOperation::InProgress);
    }

    let ongoing = record.rescheduled().is_some_and(|i| i.contains(now))
        || record.planned().is_some_and(|i| i.contains(now));
    if ongoing {
        return Some(NextOperation::InProgress);
    }

    let start = record.planned_start.or(record.rescheduled_start)?;
    let remaining = start.signed_duration_since(now);
    (remaining > TimeDelta::zero()).then_some(NextOperation::StartsIn(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn interval(start: &str, end: &str) -> BanInterval {
        BanInterval {
            start: ts(start),
            end: ts(end),
        }
    }

    fn record(code: i64) -> PlanificationRecord {
        PlanificationRecord {
            street_id: 13811,
            state_code: code,
            planned_start: Some(ts("2024-01-15T19:00:00")),
            planned_end: Some(ts("2024-01-16T07:00:00")),
            rescheduled_start: None,
            rescheduled_end: None,
            updated_at: None,
        }
    }

    #[test]
    fn planned_inside_interval_is_banned() {
        let planned = interval("2024-01-15T19:00:00", "2024-01-16T07:00:00");
        let now = ts("2024-01-15T23:00:00");
        assert_eq!(derive(2, Some(&planned), None, &now), SnowState::ParkingBanned);
    }

    #[test]
    fn planned_outside_interval_keeps_base_state() {
        let planned = interval("2024-01-15T19:00:00", "2024-01-16T07:00:00");
        let now = ts("2024-01-15T18:59:59");
        assert_eq!(derive(2, Some(&planned), None, &now), SnowState::Planned);
        assert_eq!(derive(2, None, None, &now), SnowState::Planned);
    }

    #[test]
    fn planned_ignores_rescheduled_interval() {
        let rescheduled = interval("2024-01-17T19:00:00", "2024-01-18T07:00:00");
        let now = ts("2024-01-17T23:00:00");
        assert_eq!(derive(2, None, Some(&rescheduled), &now), SnowState::Planned);
    }

    #[test]
    fn rescheduled_hit_wins_over_planned_miss() {
        let planned = interval("2024-01-15T19:00:00", "2024-01-16T07:00:00");
        let rescheduled = interval("2024-01-17T19:00:00", "2024-01-18T07:00:00");
        let now = ts("2024-01-17T23:00:00");
        assert_eq!(
            derive(3, Some(&planned), Some(&rescheduled), &now),
            SnowState::ParkingBanned
        );
    }

    #[test]
    fn rescheduled_falls_back_to_planned_interval() {
        let planned = interval("2024-01-15T19:00:00", "2024-01-16T07:00:00");
        let rescheduled = interval("2024-01-17T19:00:00", "2024-01-18T07:00:00");
        let now = ts("2024-01-15T20:00:00");
        assert_eq!(
            derive(3, Some(&planned), Some(&rescheduled), &now),
            SnowState::ParkingBanned
        );
        assert_eq!(
            derive(3, Some(&planned), Some(&rescheduled), &ts("2024-01-19T00:00:00")),
            SnowState::Rescheduled
        );
    }

    #[test]
    fn other_codes_are_never_refined() {
        let planned = interval("2024-01-15T19:00:00", "2024-01-16T07:00:00");
        let now = ts("2024-01-15T23:00:00");
        assert_eq!(derive(10, Some(&planned), None, &now), SnowState::Clear);
        assert_eq!(derive(5, Some(&planned), None, &now), SnowState::InProgress);
        assert_eq!(derive(4, Some(&planned), None, &now), SnowState::WillBeRescheduled);
        assert_eq!(derive(42, Some(&planned), None, &now), SnowState::Snowy);
    }

    #[test]
    fn mixes_naive_and_zoned_bounds() {
        let planned = BanInterval {
            start: ts("2024-01-15T19:00:00-05:00"),
            end: ts("2024-01-16T07:00:00"),
        };
        assert_eq!(
            derive(2, Some(&planned), None, &ts("2024-01-15T23:00:00")),
            SnowState::ParkingBanned
        );
        assert_eq!(
            derive(2, Some(&planned), None, &ts("2024-01-16T13:00:00+00:00")),
            SnowState::Planned
        );
    }

    #[test]
    fn in_progress_is_always_banned() {
        let now = ts("2030-06-01T12:00:00");
        assert!(is_parking_banned(&record(5), &now));
    }

    #[test]
    fn clear_is_never_banned() {
        let now = ts("2024-01-15T23:00:00");
        assert!(!is_parking_banned(&record(10), &now));
        assert!(is_parking_banned(&record(2), &now));
    }

    #[test]
    fn ban_window_prefers_rescheduled_bounds() {
        let mut rescheduled = record(3);
        rescheduled.rescheduled_start = Some(ts("2024-01-17T19:00:00"));

        let window = ban_window(&rescheduled);
        assert_eq!(window.start, Some(ts("2024-01-17T19:00:00")));
        assert_eq!(window.end, Some(ts("2024-01-16T07:00:00")));

        let window = ban_window(&record(2));
        assert_eq!(window.start, Some(ts("2024-01-15T19:00:00")));
    }

    #[test]
    fn counts_down_to_planned_start() {
        let now = ts("2024-01-13T16:30:00");
        let next = next_operation(&record(2), &now).unwrap();
        assert_eq!(next, NextOperation::StartsIn(TimeDelta::minutes(2 * 24 * 60 + 150)));
        assert_eq!(next.to_string(), "2d 2h");
    }

    #[test]
    fn formats_countdowns() {
        assert_eq!(NextOperation::StartsIn(TimeDelta::minutes(330)).to_string(), "5h");
        assert_eq!(NextOperation::StartsIn(TimeDelta::hours(48)).to_string(), "2d");
        assert_eq!(NextOperation::StartsIn(TimeDelta::hours(51)).to_string(), "2d 3h");
        assert_eq!(NextOperation::StartsIn(TimeDelta::minutes(20)).to_string(), "0h");
    }

    #[test]
    fn next_operation_in_progress_inside_interval() {
        let now = ts("2024-01-15T23:00:00");
        assert_eq!(next_operation(&record(2), &now), Some(NextOperation::InProgress));
        assert_eq!(
            next_operation(&record(5), &ts("2030-01-01T00:00:00")),
            Some(NextOperation::InProgress)
        );
    }

    #[test]
    fn nothing_upcoming_after_interval() {
        assert_eq!(next_operation(&record(2), &ts("2024-01-17T00:00:00")), None);

        let mut empty = record(0);
        empty.planned_start = None;
        empty.planned_end = None;
        assert_eq!(next_operation(&empty, &ts("2024-01-01T00:00:00")), None);
    }

    #[test]
    fn next_operation_falls_back_to_rescheduled_start() {
        let mut record = record(3);
        record.planned_start = None;
        record.rescheduled_start = Some(ts("2024-01-17T19:00:00"));
        let next = next_operation(&record, &ts("2024-01-17T14:00:00")).unwrap();
        assert_eq!(next.to_string(), "5h");
    }

    #[test]
    fn hours_until_is_positive_only() {
        let now = ts("2024-01-15T18:00:00");
        let hours = hours_until(&ts("2024-01-15T19:30:00"), &now).unwrap();
        assert!((hours - 1.5).abs() < 1e-9);
        assert!(hours_until(&ts("2024-01-15T18:00:00"), &now).is_none());
    }
}
