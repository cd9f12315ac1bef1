//! # Transit Billing
//!
//! A batch fare engine that turns station tap events into per-user charges,
//! applying zone pricing, error fares and daily/monthly spending caps.
//!
//! ## Design Principles
//!
//! - **Integer money**: all amounts are whole pence; two decimals only on output
//! - **Per-user state machines**: each user is idle or in transit with one open entry
//! - **Strict invariants**: `sum(daily) == sum(monthly) == total` per user,
//!   and no daily or monthly bucket ever exceeds its cap
//! - **All-or-nothing**: an unknown station or malformed event aborts the batch
//! - **Deterministic output**: records sorted by user id
//!
//! ## Example
//!
//! ```no_run
//! use transit_billing::{BillingEngine, ZoneDirectory};
//! use std::io::Cursor;
//!
//! let zones = ZoneDirectory::from_csv(Cursor::new("station,zone\nBank,1\n")).unwrap();
//! let mut engine = BillingEngine::new(zones);
//! engine
//!     .process_csv(Cursor::new(
//!         "user_id,direction,station,timestamp\nu1,IN,Bank,2024-01-15T08:00:00\n",
//!     ))
//!     .unwrap();
//! engine.finish().unwrap().write_csv(std::io::stdout()).unwrap();
//! ```

pub mod billing;
pub mod engine;
pub mod error;
pub mod event;
pub mod journey;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod zone;

pub use billing::{BillingAggregator, BillingRecord, Statement};
pub use engine::BillingEngine;
pub use error::{BillingError, Result};
pub use event::{Direction, Event, EventRecord};
pub use journey::{Journey, JourneyKind, JourneyReconstructor, Tap, TravelState};
pub use ledger::{CapAccumulator, UserLedger, YearMonth};
pub use money::Pence;
pub use pricing::Tariff;
pub use zone::{Station, Zone, ZoneDirectory};
