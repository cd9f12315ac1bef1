//! Per-user billing totals and the final statement.

use crate::error::Result;
use crate::ledger::UserLedger;
use crate::money::Pence;
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// One line of the statement: what a user owes for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingRecord {
    pub user_id: String,

    /// Serialized with exactly two decimal places.
    #[serde(rename = "total_cost")]
    pub total: Pence,
}

/// Folds charged amounts into per-user totals.
#[derive(Debug, Default)]
pub struct BillingAggregator {
    totals: BTreeMap<String, Pence>,
}

impl BillingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one journey's charged amount. A zero charge still registers the
    /// user so that fully capped users appear on the statement.
    pub fn add(&mut self, user_id: &str, charged: Pence) {
        match self.totals.get_mut(user_id) {
            Some(total) => *total += charged,
            None => {
                self.totals.insert(user_id.to_string(), charged);
            }
        }
    }

    pub fn total(&self, user_id: &str) -> Option<Pence> {
        self.totals.get(user_id).copied()
    }

    /// Returns one record per user, sorted by user id.
    pub fn into_records(self) -> Vec<BillingRecord> {
        self.totals
            .into_iter()
            .map(|(user_id, total)| BillingRecord { user_id, total })
            .collect()
    }
}

/// Outcome of a billing run.
#[derive(Debug, Clone)]
pub struct Statement {
    records: Vec<BillingRecord>,
    ledgers: BTreeMap<String, UserLedger>,
}

impl Statement {
    /// Builds a statement. Records are sorted by user id here, since lookups
    /// and output both rely on that order.
    pub fn new(mut records: Vec<BillingRecord>, ledgers: BTreeMap<String, UserLedger>) -> Self {
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Statement { records, ledgers }
    }

    /// Billing records sorted by user id.
    pub fn records(&self) -> &[BillingRecord] {
        &self.records
    }

    /// Total charged to a user, if the user had any event.
    pub fn total_for(&self, user_id: &str) -> Option<Pence> {
        self.records
            .binary_search_by(|r| r.user_id.as_str().cmp(user_id))
            .ok()
            .map(|idx| self.records[idx].total)
    }

    /// Daily and monthly spend of a user.
    pub fn ledger(&self, user_id: &str) -> Option<&UserLedger> {
        self.ledgers.get(user_id)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = &UserLedger> {
        self.ledgers.values()
    }

    /// Writes the statement as `user_id,total_cost` CSV.
    ///
    /// Rows are sorted by user id and amounts carry exactly 2 decimal places.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

        // Written by hand so an empty statement still has a header
        csv_writer.write_record(["user_id", "total_cost"])?;
        for record in &self.records {
            csv_writer.serialize(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
