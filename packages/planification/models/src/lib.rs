#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Snow removal planification types.
//!
//! The city publishes, for each street side, a numeric snow removal state
//! and up to two ban intervals: the planned one and, when the operation was
//! pushed back, a rescheduled one. Interval bounds are published either with
//! or without a UTC offset, so they are kept as a [`Timestamp`] that
//! remembers which form it came in.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snow_removal_street_models::StreetSideId;
use strum_macros::{AsRefStr, Display, EnumString};

/// Snow removal state of a street side.
///
/// The first seven variants map the published state codes; `ParkingBanned`
/// is only ever derived, when the current time falls inside a ban interval.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SnowState {
    /// Code 0: not cleared yet, nothing planned.
    Snowy,
    /// Code 1: clearing completed.
    Cleared,
    /// Code 2: clearing planned with dates.
    Planned,
    /// Code 3: clearing rescheduled to new dates.
    Rescheduled,
    /// Code 4: will be rescheduled, no dates yet.
    WillBeRescheduled,
    /// Code 5: snowplows are on the street.
    InProgress,
    /// Code 10: clear between operations.
    Clear,
    /// Derived: now lies within the planned or rescheduled interval.
    ParkingBanned,
}

impl SnowState {
    /// Maps a published state code. Unknown codes are treated as `Snowy`.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Cleared,
            2 => Self::Planned,
            3 => Self::Rescheduled,
            4 => Self::WillBeRescheduled,
            5 => Self::InProgress,
            10 => Self::Clear,
            _ => Self::Snowy,
        }
    }
}

/// Error returned when a datetime string matches none of the accepted
/// formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized datetime: {input:?}")]
pub struct TimestampParseError {
    /// The rejected input.
    pub input: String,
}

/// A point in time that may or may not carry a UTC offset.
///
/// Accepted text forms, tried in order:
///
/// - `2024-01-15T14:30:00-0500`
/// - RFC 3339 (`2024-01-15T14:30:00-05:00`, `2024-01-15T19:30:00.5Z`)
/// - `2024-01-15T14:30:00`
/// - `2024-01-15 14:30:00`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Wall-clock time without an offset.
    Naive(NaiveDateTime),
    /// Time with a known UTC offset.
    Zoned(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Orders two timestamps.
    ///
    /// When exactly one side is naive it is read in the other side's
    /// offset; two zoned values compare as instants.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        let (a, b) = self.reconcile(other);
        a.cmp(&b)
    }

    /// Time elapsed from `other` to `self`, reconciled like [`Self::compare`].
    #[must_use]
    pub fn signed_duration_since(&self, other: &Self) -> TimeDelta {
        let (a, b) = self.reconcile(other);
        a - b
    }

    /// Returns `true` if `self` lies in `[start, end]`.
    #[must_use]
    pub fn is_within(&self, start: &Self, end: &Self) -> bool {
        start.compare(self).is_le() && self.compare(end).is_le()
    }

    /// Brings both values onto a common wall clock.
    fn reconcile(&self, other: &Self) -> (NaiveDateTime, NaiveDateTime) {
        match (self, other) {
            (Self::Naive(a), Self::Naive(b)) => (*a, *b),
            (Self::Zoned(a), Self::Zoned(b)) => (a.naive_utc(), b.naive_utc()),
            (Self::Naive(a), Self::Zoned(b)) => (*a, b.naive_local()),
            (Self::Zoned(a), Self::Naive(b)) => (a.naive_local(), *b),
        }
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl<Tz: chrono::TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
            return Ok(Self::Zoned(dt));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Zoned(dt));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::Naive(naive));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Self::Naive(naive));
        }

        Err(TimestampParseError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S")),
            Self::Zoned(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An inclusive `[start, end]` ban interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanInterval {
    /// First instant of the ban.
    pub start: Timestamp,
    /// Last instant of the ban.
    pub end: Timestamp,
}

impl BanInterval {
    /// Returns `true` if `instant` lies within the interval, bounds included.
    #[must_use]
    pub fn contains(&self, instant: &Timestamp) -> bool {
        instant.is_within(&self.start, &self.end)
    }
}

/// Current planification of one street side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanificationRecord {
    /// Street side this record applies to.
    pub street_id: StreetSideId,
    /// Published state code (see [`SnowState::from_code`]).
    pub state_code: i64,
    /// Start of the planned ban.
    pub planned_start: Option<Timestamp>,
    /// End of the planned ban.
    pub planned_end: Option<Timestamp>,
    /// Start of the rescheduled ban.
    pub rescheduled_start: Option<Timestamp>,
    /// End of the rescheduled ban.
    pub rescheduled_end: Option<Timestamp>,
    /// When the city last updated this record.
    pub updated_at: Option<Timestamp>,
}

impl PlanificationRecord {
    /// State mapped from the published code, before any interval check.
    #[must_use]
    pub const fn base_state(&self) -> SnowState {
        SnowState::from_code(self.state_code)
    }

    /// The planned interval, when both bounds are known.
    #[must_use]
    pub fn planned(&self) -> Option<BanInterval> {
        Some(BanInterval {
            start: self.planned_start?,
            end: self.planned_end?,
        })
    }

    /// The rescheduled interval, when both bounds are known.
    #[must_use]
    pub fn rescheduled(&self) -> Option<BanInterval> {
        Some(BanInterval {
            start: self.rescheduled_start?,
            end: self.rescheduled_end?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn maps_state_codes() {
        assert_eq!(SnowState::from_code(0), SnowState::Snowy);
        assert_eq!(SnowState::from_code(2), SnowState::Planned);
        assert_eq!(SnowState::from_code(5), SnowState::InProgress);
        assert_eq!(SnowState::from_code(10), SnowState::Clear);
        assert_eq!(SnowState::from_code(7), SnowState::Snowy);
        assert_eq!(SnowState::from_code(-1), SnowState::Snowy);
    }

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(SnowState::WillBeRescheduled.to_string(), "will_be_rescheduled");
        assert_eq!(
            "parking_banned".parse::<SnowState>().unwrap(),
            SnowState::ParkingBanned
        );
    }

    #[test]
    fn parses_offset_without_colon() {
        let Timestamp::Zoned(dt) = ts("2024-01-15T14:30:00-0500") else {
            panic!("expected zoned timestamp");
        };
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn parses_rfc3339() {
        assert!(matches!(ts("2024-01-15T14:30:00-05:00"), Timestamp::Zoned(_)));
        assert!(matches!(ts("2024-01-15T19:30:00.250Z"), Timestamp::Zoned(_)));
    }

    #[test]
    fn parses_naive_forms() {
        assert_eq!(ts("2024-01-15T14:30:00"), ts("2024-01-15 14:30:00"));
        assert!(matches!(ts("2024-01-15 14:30:00"), Timestamp::Naive(_)));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "15/01/2024".parse::<Timestamp>().unwrap_err();
        assert_eq!(err.input, "15/01/2024");
    }

    #[test]
    fn zoned_values_compare_as_instants() {
        let montreal = ts("2024-01-15T14:30:00-05:00");
        let utc = ts("2024-01-15T19:30:00+00:00");
        assert_eq!(montreal.compare(&utc), Ordering::Equal);
    }

    #[test]
    fn naive_side_adopts_other_offset() {
        let naive = ts("2024-01-15 14:30:00");
        let zoned = ts("2024-01-15T14:30:00-05:00");
        assert_eq!(naive.compare(&zoned), Ordering::Equal);
        assert_eq!(zoned.compare(&naive), Ordering::Equal);

        let later = ts("2024-01-15T15:00:00-05:00");
        assert_eq!(naive.compare(&later), Ordering::Less);
        assert_eq!(later.signed_duration_since(&naive), TimeDelta::minutes(30));
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let interval = BanInterval {
            start: ts("2024-01-15T19:00:00"),
            end: ts("2024-01-16T07:00:00"),
        };
        assert!(interval.contains(&ts("2024-01-15T19:00:00")));
        assert!(interval.contains(&ts("2024-01-16T07:00:00")));
        assert!(interval.contains(&ts("2024-01-16T01:00:00-05:00")));
        assert!(!interval.contains(&ts("2024-01-16T07:00:01")));
    }

    #[test]
    fn displays_in_source_form() {
        assert_eq!(ts("2024-01-15 14:30:00").to_string(), "2024-01-15T14:30:00");
        assert_eq!(
            ts("2024-01-15T14:30:00-0500").to_string(),
            "2024-01-15T14:30:00-05:00"
        );
    }

    #[test]
    fn intervals_need_both_bounds() {
        let record = PlanificationRecord {
            street_id: 13811,
            state_code: 3,
            planned_start: Some(ts("2024-01-15T19:00:00")),
            planned_end: Some(ts("2024-01-16T07:00:00")),
            rescheduled_start: Some(ts("2024-01-17T19:00:00")),
            rescheduled_end: None,
            updated_at: None,
        };
        assert_eq!(record.base_state(), SnowState::Rescheduled);
        assert!(record.planned().is_some());
        assert!(record.rescheduled().is_none());
    }
}
