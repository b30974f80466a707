//! Observation and submission record types.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

/// Combine a calendar date with an hour-of-day offset into a timestamp.
pub fn slot_timestamp(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour))
}

/// One hourly training observation for one zone.
///
/// `(zone, timestamp)` is unique within a dataset. After backfilling, the
/// timestamps of a zone form a contiguous hourly sequence with no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRecord {
    /// Zone identifier (categorical code, e.g. "ZONE01").
    pub zone: String,
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Hour of day, 0..=23.
    pub hour: u32,
    /// Total bandwidth for the hour (non-negative).
    pub bandwidth: f64,
    /// Peak concurrent users for the hour (non-negative).
    pub max_user: f64,
}

impl TrainRecord {
    /// Timestamp of the slot (date at midnight plus the hour offset).
    pub fn timestamp(&self) -> NaiveDateTime {
        slot_timestamp(self.date, self.hour)
    }

    /// Rebuild a record from a timestamp, splitting it back into date + hour.
    pub fn from_timestamp(zone: String, ts: NaiveDateTime, bandwidth: f64, max_user: f64) -> Self {
        Self {
            zone,
            date: ts.date(),
            hour: ts.time().hour(),
            bandwidth,
            max_user,
        }
    }
}

/// One test row to score: an identifier and a future (zone, date, hour) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    /// Row identifier carried through to the submission.
    pub id: u64,
    /// Zone identifier.
    pub zone: String,
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Hour of day, 0..=23.
    pub hour: u32,
}

impl TestRecord {
    /// Timestamp of the slot.
    pub fn timestamp(&self) -> NaiveDateTime {
        slot_timestamp(self.date, self.hour)
    }
}

/// One submission row: identifier plus the formatted label string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRecord {
    /// Test row identifier.
    pub id: u64,
    /// Space-separated label: `"<bandwidth> <max_users>"`.
    pub label: String,
}
