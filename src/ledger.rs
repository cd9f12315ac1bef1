//! Per-user spend ledgers and cap enforcement.
//!
//! Maintains, for every user, `sum(daily) == sum(monthly) == total` and keeps
//! every daily and monthly bucket at or under its cap.

use crate::money::Pence;
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A calendar month, the key of the monthly cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Running spend of one user.
///
/// # Invariants
///
/// - Every bucket only grows, and only by amounts the accumulator allowed
/// - `total` equals the sum of `daily` and the sum of `monthly`
#[derive(Debug, Clone)]
pub struct UserLedger {
    pub user_id: String,

    /// Amount charged per UTC day.
    pub daily: BTreeMap<NaiveDate, Pence>,

    /// Amount charged per calendar month.
    pub monthly: BTreeMap<YearMonth, Pence>,

    /// Amount charged over the whole run.
    pub total: Pence,
}

impl UserLedger {
    pub fn new(user_id: impl Into<String>) -> Self {
        UserLedger {
            user_id: user_id.into(),
            daily: BTreeMap::new(),
            monthly: BTreeMap::new(),
            total: Pence::ZERO,
        }
    }

    /// Amount already charged on `date`.
    pub fn spent_on(&self, date: NaiveDate) -> Pence {
        self.daily.get(&date).copied().unwrap_or_default()
    }

    /// Amount already charged in `month`.
    pub fn spent_in(&self, month: YearMonth) -> Pence {
        self.monthly.get(&month).copied().unwrap_or_default()
    }

    fn record(&mut self, date: NaiveDate, amount: Pence) {
        *self.daily.entry(date).or_default() += amount;
        *self.monthly.entry(YearMonth::of(date)).or_default() += amount;
        self.total += amount;
    }

    /// Verifies the accounting identity between daily, monthly and total spend.
    pub fn check_invariant(&self) -> bool {
        let daily: Pence = self.daily.values().sum();
        let monthly: Pence = self.monthly.values().sum();
        daily == self.total && monthly == self.total
    }
}

/// Applies daily and monthly caps to nominal fares.
///
/// Both caps are independent ceilings on cumulative spend: a fare is cut
/// down to the smaller of the two remaining headrooms. Fares must be fed in
/// chronological order per user.
#[derive(Debug)]
pub struct CapAccumulator {
    daily_cap: Pence,
    monthly_cap: Pence,
    ledgers: HashMap<String, UserLedger>,
}

impl CapAccumulator {
    pub fn new(daily_cap: Pence, monthly_cap: Pence) -> Self {
        CapAccumulator {
            daily_cap,
            monthly_cap,
            ledgers: HashMap::new(),
        }
    }

    /// Charges `nominal` to `user_id` on `date` and returns what was actually
    /// charged after clipping to the remaining headroom.
    pub fn charge(&mut self, user_id: &str, date: NaiveDate, nominal: Pence) -> Pence {
        let ledger = self
            .ledgers
            .entry(user_id.to_string())
            .or_insert_with(|| UserLedger::new(user_id));

        let daily_headroom = self.daily_cap.saturating_headroom(ledger.spent_on(date));
        let monthly_headroom = self
            .monthly_cap
            .saturating_headroom(ledger.spent_in(YearMonth::of(date)));
        let charged = nominal.min(daily_headroom).min(monthly_headroom).max(Pence::ZERO);

        ledger.record(date, charged);
        debug_assert!(ledger.check_invariant());

        if charged != nominal {
            debug!(
                "User {}: fare {} capped to {} on {} (day headroom {}, month headroom {})",
                user_id, nominal, charged, date, daily_headroom, monthly_headroom
            );
        }

        charged
    }

    pub fn ledger(&self, user_id: &str) -> Option<&UserLedger> {
        self.ledgers.get(user_id)
    }

    /// Consumes the accumulator, returning ledgers keyed by user id.
    pub fn into_ledgers(self) -> BTreeMap<String, UserLedger> {
        self.ledgers.into_iter().collect()
    }
}
