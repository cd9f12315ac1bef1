//! Journey reconstruction from a time-ordered tap stream.
//!
//! Users are interleaved in the input, so each user carries its own two-state
//! machine: either idle or in transit with exactly one open entry tap.

use crate::zone::Station;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::mem;

/// A tap at a resolved station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tap {
    pub station: Station,
    pub at: DateTime<Utc>,
}

impl Tap {
    pub fn new(station: Station, at: DateTime<Utc>) -> Self {
        Tap { station, at }
    }

    /// UTC calendar day of the tap.
    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }
}

/// Shape of a reconstructed journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JourneyKind {
    /// Entry matched with an exit.
    Complete { entry: Tap, exit: Tap },

    /// Entry never closed: superseded by a later entry or still open at the end.
    MissingExit { entry: Tap },

    /// Exit with no open entry before it.
    MissingEntry { exit: Tap },
}

/// One complete or erroneous journey of a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub user_id: String,
    pub kind: JourneyKind,
}

impl Journey {
    pub fn complete(user_id: impl Into<String>, entry: Tap, exit: Tap) -> Self {
        Journey {
            user_id: user_id.into(),
            kind: JourneyKind::Complete { entry, exit },
        }
    }

    pub fn missing_exit(user_id: impl Into<String>, entry: Tap) -> Self {
        Journey {
            user_id: user_id.into(),
            kind: JourneyKind::MissingExit { entry },
        }
    }

    pub fn missing_entry(user_id: impl Into<String>, exit: Tap) -> Self {
        Journey {
            user_id: user_id.into(),
            kind: JourneyKind::MissingEntry { exit },
        }
    }

    /// Returns `true` if either tap is missing.
    pub fn is_erroneous(&self) -> bool {
        !matches!(self.kind, JourneyKind::Complete { .. })
    }

    /// The tap that dates the journey: the entry when there is one,
    /// otherwise the lone exit.
    pub fn anchor(&self) -> &Tap {
        match &self.kind {
            JourneyKind::Complete { entry, .. } | JourneyKind::MissingExit { entry } => entry,
            JourneyKind::MissingEntry { exit } => exit,
        }
    }

    /// Calendar day the journey is billed against.
    pub fn date(&self) -> NaiveDate {
        self.anchor().date()
    }

    /// Number of input events this journey consumed.
    pub fn event_count(&self) -> usize {
        match self.kind {
            JourneyKind::Complete { .. } => 2,
            JourneyKind::MissingExit { .. } | JourneyKind::MissingEntry { .. } => 1,
        }
    }
}

/// Per-user reconstruction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TravelState {
    #[default]
    Idle,
    InTransit(Tap),
}

/// Pairs IN and OUT taps into journeys, one state machine per user.
///
/// Journeys are emitted in the order they complete or are found to be
/// erroneous, which for any single user is chronological.
#[derive(Debug, Default)]
pub struct JourneyReconstructor {
    states: BTreeMap<String, TravelState>,
}

impl JourneyReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds an entry tap.
    ///
    /// Returns the user's previous open entry as a `MissingExit` journey if
    /// there was one.
    pub fn tap_in(&mut self, user_id: &str, tap: Tap) -> Option<Journey> {
        let state = self.state_mut(user_id);
        match mem::replace(state, TravelState::InTransit(tap)) {
            TravelState::Idle => None,
            TravelState::InTransit(previous) => {
                debug!(
                    "User {}: entry at {} superseded without exit",
                    user_id, previous.station.id
                );
                Some(Journey::missing_exit(user_id, previous))
            }
        }
    }

    /// Feeds an exit tap. Always produces exactly one journey.
    pub fn tap_out(&mut self, user_id: &str, tap: Tap) -> Journey {
        let state = self.state_mut(user_id);
        match mem::take(state) {
            TravelState::Idle => {
                debug!("User {}: exit at {} without entry", user_id, tap.station.id);
                Journey::missing_entry(user_id, tap)
            }
            TravelState::InTransit(entry) => {
                if tap.date() != entry.date() {
                    warn!(
                        "User {}: journey {} -> {} crosses midnight, billed on {}",
                        user_id,
                        entry.station.id,
                        tap.station.id,
                        entry.date()
                    );
                }
                Journey::complete(user_id, entry, tap)
            }
        }
    }

    /// Closes the stream and returns every still-open entry as a
    /// `MissingExit` journey, in ascending user id order.
    pub fn finish(&mut self) -> Vec<Journey> {
        mem::take(&mut self.states)
            .into_iter()
            .filter_map(|(user_id, state)| match state {
                TravelState::Idle => None,
                TravelState::InTransit(entry) => Some(Journey::missing_exit(user_id, entry)),
            })
            .collect()
    }

    /// Current state of a user, `Idle` if the user was never seen.
    pub fn state(&self, user_id: &str) -> &TravelState {
        const IDLE: &TravelState = &TravelState::Idle;
        self.states.get(user_id).unwrap_or(IDLE)
    }

    fn state_mut(&mut self, user_id: &str) -> &mut TravelState {
        self.states.entry(user_id.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_timestamp;
    use crate::zone::Zone;

    fn tap(station: &str, zone: u32, at: &str) -> Tap {
        Tap::new(
            Station::new(station, Zone::new(zone).unwrap()),
            parse_timestamp(at).unwrap(),
        )
    }

    #[test]
    fn test_in_then_out_completes_journey() {
        let mut rec = JourneyReconstructor::new();
        assert!(rec.tap_in("u1", tap("Paddington", 1, "2024-01-15T08:00:00")).is_none());
        assert!(matches!(rec.state("u1"), TravelState::InTransit(_)));

        let journey = rec.tap_out("u1", tap("Bank", 1, "2024-01-15T08:30:00"));
        assert!(!journey.is_erroneous());
        assert_eq!(journey.event_count(), 2);
        assert_eq!(rec.state("u1"), &TravelState::Idle);
        assert!(rec.finish().is_empty());
    }

    #[test]
    fn test_second_in_flags_previous_entry() {
        let mut rec = JourneyReconstructor::new();
        rec.tap_in("u1", tap("Paddington", 1, "2024-01-15T08:00:00"));

        let flagged = rec
            .tap_in("u1", tap("Victoria", 1, "2024-01-15T09:00:00"))
            .unwrap();
        assert!(flagged.is_erroneous());
        assert_eq!(flagged.anchor().station.id, "Paddington");

        let journey = rec.tap_out("u1", tap("Bank", 1, "2024-01-15T09:30:00"));
        match journey.kind {
            JourneyKind::Complete { entry, exit } => {
                assert_eq!(entry.station.id, "Victoria");
                assert_eq!(exit.station.id, "Bank");
            }
            other => panic!("Expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_out_without_in_is_dated_by_exit() {
        let mut rec = JourneyReconstructor::new();
        let journey = rec.tap_out("u2", tap("Bank", 1, "2024-01-16T09:00:00"));
        assert!(matches!(journey.kind, JourneyKind::MissingEntry { .. }));
        assert_eq!(journey.date().to_string(), "2024-01-16");
        assert_eq!(rec.state("u2"), &TravelState::Idle);
    }

    #[test]
    fn test_finish_flushes_open_entries_in_user_order() {
        let mut rec = JourneyReconstructor::new();
        rec.tap_in("zed", tap("Paddington", 1, "2024-01-15T08:00:00"));
        rec.tap_in("amy", tap("Bank", 1, "2024-01-15T08:05:00"));
        rec.tap_in("bob", tap("Bank", 1, "2024-01-15T08:10:00"));
        rec.tap_out("bob", tap("Victoria", 1, "2024-01-15T08:20:00"));

        let flushed = rec.finish();
        let users: Vec<_> = flushed.iter().map(|j| j.user_id.as_str()).collect();
        assert_eq!(users, vec!["amy", "zed"]);
        assert!(flushed.iter().all(Journey::is_erroneous));
        assert!(rec.finish().is_empty());
    }

    #[test]
    fn test_interleaved_users_do_not_interfere() {
        let mut rec = JourneyReconstructor::new();
        rec.tap_in("u1", tap("Paddington", 1, "2024-01-15T08:00:00"));
        rec.tap_in("u2", tap("Woolwich", 6, "2024-01-15T08:01:00"));
        let j1 = rec.tap_out("u1", tap("Bank", 1, "2024-01-15T08:10:00"));
        let j2 = rec.tap_out("u2", tap("Heathrow Terminal 5", 4, "2024-01-15T08:11:00"));

        assert!(!j1.is_erroneous());
        assert!(!j2.is_erroneous());
        assert_eq!(j2.anchor().station.id, "Woolwich");
    }

    #[test]
    fn test_midnight_crossing_uses_entry_date() {
        let mut rec = JourneyReconstructor::new();
        rec.tap_in("u1", tap("Paddington", 1, "2024-01-31T23:50:00"));
        let journey = rec.tap_out("u1", tap("Bank", 1, "2024-02-01T00:10:00"));
        assert!(!journey.is_erroneous());
        assert_eq!(journey.date().to_string(), "2024-01-31");
    }
}
