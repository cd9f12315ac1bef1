//! Transit Billing CLI
//!
//! Reads a station zone map and a timestamp-ordered journey CSV, and writes
//! the total charged per user.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- zone_map.csv journey_data.csv > output.csv
//! cargo run -- zone_map.csv journey_data.csv output.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process;
use transit_billing::{BillingEngine, BillingError, Result, ZoneDirectory};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(BillingError::MissingArgument);
    }

    let zones = ZoneDirectory::from_csv(BufReader::new(File::open(&args[1])?))?;

    let mut engine = BillingEngine::new(zones);
    engine.process_csv(BufReader::new(File::open(&args[2])?))?;
    let statement = engine.finish()?;

    // Nothing is created on disk until the whole batch has succeeded
    match args.get(3) {
        Some(output_path) => {
            let file = File::create(output_path)?;
            statement.write_csv(BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            statement.write_csv(stdout.lock())?;
        }
    }

    Ok(())
}
