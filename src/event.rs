//! Tap events for CSV parsing and internal representation.

use crate::error::{BillingError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Naive timestamp layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Whether a tap enters or leaves the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            other => Err(format!("direction '{}' is neither IN nor OUT", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("IN"),
            Direction::Out => f.write_str("OUT"),
        }
    }
}

/// Raw event record as read from CSV.
///
/// Every field is kept as a string so that a bad direction or timestamp is
/// reported as an invalid event with its row, not as a generic CSV error.
#[derive(Debug, Deserialize)]
pub struct EventRecord {
    pub user_id: String,
    pub direction: String,
    pub station: String,
    pub timestamp: String,
}

impl EventRecord {
    /// Parses the raw CSV record into a typed event.
    pub fn parse(&self, row: usize) -> Result<Event> {
        let invalid = |message: String| BillingError::InvalidEvent { row, message };

        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(invalid("empty user_id".to_string()));
        }

        let station = self.station.trim();
        if station.is_empty() {
            return Err(invalid("empty station".to_string()));
        }

        let direction = Direction::from_str(&self.direction).map_err(invalid)?;
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            invalid(format!("unparseable timestamp '{}'", self.timestamp.trim()))
        })?;

        Ok(Event {
            user_id: user_id.to_string(),
            direction,
            station: station.to_string(),
            timestamp,
        })
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
///
/// Timestamps have second precision: a fractional second is rejected.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| Utc.from_utc_datetime(&naive))
        })?;
    (parsed.nanosecond() == 0).then_some(parsed)
}

/// A parsed and validated tap, ready for journey reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub user_id: String,
    pub direction: Direction,
    pub station: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        user_id: impl Into<String>,
        direction: Direction,
        station: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Event {
            user_id: user_id.into(),
            direction,
            station: station.into(),
            timestamp,
        }
    }
}
