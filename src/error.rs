//! Error types for the billing engine.

use thiserror::Error;

/// Positional arguments of the CLI
pub const USAGE: &str = "<zone_map.csv> <journey_data.csv> [output.csv]";

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that abort a billing run.
///
/// Unmatched taps are not errors: they become erroneous journeys and are
/// billed at the error fare.
#[derive(Error, Debug)]
pub enum BillingError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Event references a station missing from the zone map
    #[error("Unknown station '{station}' at row {row}")]
    UnknownStation { station: String, row: usize },

    /// Malformed direction, timestamp or ordering of an event
    #[error("Invalid event at row {row}: {message}")]
    InvalidEvent { row: usize, message: String },

    /// Malformed or conflicting zone map entry
    #[error("Invalid zone map entry at row {row}: {message}")]
    InvalidZoneMap { row: usize, message: String },

    /// Engine was used after an earlier fatal error
    #[error("Billing aborted by earlier error: {reason}")]
    Aborted { reason: String },

    /// Missing input file arguments
    #[error("Missing input file argument. Usage: transit-billing {}", USAGE)]
    MissingArgument,
}
