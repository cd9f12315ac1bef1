//! Core billing engine.
//!
//! Consumes tap events in global timestamp order, reconstructs journeys per
//! user, prices them and applies caps. Any structural error aborts the run:
//! a statement built from half the events would carry wrong caps.

use crate::billing::{BillingAggregator, Statement};
use crate::error::{BillingError, Result};
use crate::event::{Direction, Event, EventRecord};
use crate::journey::{Journey, JourneyReconstructor, Tap};
use crate::ledger::CapAccumulator;
use crate::pricing::Tariff;
use crate::zone::ZoneDirectory;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::io::Read;

/// The transit billing engine.
///
/// Holds the zone map and tariff plus all per-user state for one batch.
/// Events must be fed in non-decreasing timestamp order; events sharing a
/// timestamp are processed in input order.
///
/// # Output Ordering
///
/// [`BillingEngine::finish`] yields records sorted by user id in ascending
/// order for deterministic, reproducible output.
pub struct BillingEngine {
    zones: ZoneDirectory,
    tariff: Tariff,
    reconstructor: JourneyReconstructor,
    caps: CapAccumulator,
    aggregator: BillingAggregator,

    /// Timestamp of the last accepted event, for the ordering check.
    last_timestamp: Option<DateTime<Utc>>,

    events_consumed: usize,
    events_journeyed: usize,

    /// First fatal error. Once set, the engine refuses further input and
    /// never yields a statement.
    failure: Option<String>,
}

impl BillingEngine {
    /// Creates an engine with the default tariff.
    pub fn new(zones: ZoneDirectory) -> Self {
        Self::with_tariff(zones, Tariff::default())
    }

    pub fn with_tariff(zones: ZoneDirectory, tariff: Tariff) -> Self {
        let caps = CapAccumulator::new(tariff.daily_cap, tariff.monthly_cap);
        BillingEngine {
            zones,
            tariff,
            reconstructor: JourneyReconstructor::new(),
            caps,
            aggregator: BillingAggregator::new(),
            last_timestamp: None,
            events_consumed: 0,
            events_journeyed: 0,
            failure: None,
        }
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    /// Processes events from a `user_id,direction,station,timestamp` CSV
    /// reader in streaming fashion.
    ///
    /// Records are read one at a time. The first invalid record aborts
    /// the whole batch with its row number.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        self.ensure_healthy()?;
        let outcome = self.consume_csv(reader);
        self.record_failure(outcome)
    }

    /// Processes already-parsed events. Error rows are 1-based positions in
    /// the sequence.
    pub fn process_events<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event>,
    {
        self.ensure_healthy()?;
        let outcome = events
            .into_iter()
            .enumerate()
            .try_for_each(|(idx, event)| self.process_event(event, idx + 1));
        self.record_failure(outcome)
    }

    fn consume_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<EventRecord>().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row
            let event = result?.parse(row)?;
            self.process_event(event, row)?;
        }

        Ok(())
    }

    fn ensure_healthy(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(BillingError::Aborted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Latches the first error so that a partially billed batch can never
    /// produce a statement.
    fn record_failure(&mut self, outcome: Result<()>) -> Result<()> {
        if let Err(e) = &outcome {
            warn!("Billing aborted: {}", e);
            self.failure = Some(e.to_string());
        }
        outcome
    }

    /// Processes a single event.
    fn process_event(&mut self, event: Event, row: usize) -> Result<()> {
        if let Some(last) = self.last_timestamp {
            if event.timestamp < last {
                return Err(BillingError::InvalidEvent {
                    row,
                    message: format!(
                        "timestamp {} is earlier than previous event at {}",
                        event.timestamp.to_rfc3339(),
                        last.to_rfc3339()
                    ),
                });
            }
        }

        let station = self.zones.station(&event.station, row)?;
        let tap = Tap::new(station, event.timestamp);

        self.last_timestamp = Some(event.timestamp);
        self.events_consumed += 1;

        match event.direction {
            Direction::In => {
                if let Some(journey) = self.reconstructor.tap_in(&event.user_id, tap) {
                    self.bill(journey, row);
                }
            }
            Direction::Out => {
                let journey = self.reconstructor.tap_out(&event.user_id, tap);
                self.bill(journey, row);
            }
        }

        Ok(())
    }

    /// Prices a journey and charges it against the user's caps.
    fn bill(&mut self, journey: Journey, row: usize) {
        let nominal = self.tariff.price(&journey);
        let charged = self.caps.charge(&journey.user_id, journey.date(), nominal);
        self.aggregator.add(&journey.user_id, charged);
        self.events_journeyed += journey.event_count();

        debug!(
            "Row {}: {} journey for user {} on {}: fare {}, charged {}",
            row,
            if journey.is_erroneous() { "erroneous" } else { "complete" },
            journey.user_id,
            journey.date(),
            nominal,
            charged
        );
    }

    /// Ends the batch.
    ///
    /// Still-open entries are billed as erroneous journeys, then the per-user
    /// totals and ledgers are handed back as a [`Statement`]. Fails with
    /// [`BillingError::Aborted`] if any earlier call hit a fatal error.
    pub fn finish(mut self) -> Result<Statement> {
        self.ensure_healthy()?;

        for journey in self.reconstructor.finish() {
            self.bill(journey, self.events_consumed);
        }

        debug_assert_eq!(self.events_consumed, self.events_journeyed);

        let records = self.aggregator.into_records();
        info!(
            "Billed {} events into statements for {} users",
            self.events_consumed,
            records.len()
        );

        Ok(Statement::new(records, self.caps.into_ledgers()))
    }

    /// Total input events accepted so far.
    pub fn events_consumed(&self) -> usize {
        self.events_consumed
    }
}
