//! Station to zone mapping.
//!
//! The directory is built once before billing starts and is read-only after
//! that.

use crate::error::{BillingError, Result};
use csv::{ReaderBuilder, Trim};
use log::info;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

/// A pricing zone. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zone(u32);

impl Zone {
    /// Creates a zone, returning `None` for zone 0.
    pub fn new(zone: u32) -> Option<Self> {
        (zone > 0).then_some(Zone(zone))
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A station and the zone it is priced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub zone: Zone,
}

impl Station {
    pub fn new(id: impl Into<String>, zone: Zone) -> Self {
        Station {
            id: id.into(),
            zone,
        }
    }
}

/// Raw zone map row as read from CSV.
#[derive(Debug, Deserialize)]
struct ZoneRecord {
    station: String,
    zone: String,
}

/// Immutable lookup from station identifier to zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    zones: HashMap<String, Zone>,
}

impl ZoneDirectory {
    /// Builds a directory from `(station, zone)` pairs.
    ///
    /// Fails if a station appears twice; `row` in the error is the 1-based
    /// position of the duplicate.
    pub fn from_stations<I>(stations: I) -> Result<Self>
    where
        I: IntoIterator<Item = Station>,
    {
        let mut directory = ZoneDirectory::default();
        for (idx, station) in stations.into_iter().enumerate() {
            directory.insert(station, idx + 1)?;
        }
        Ok(directory)
    }

    /// Loads a `station,zone` CSV table.
    ///
    /// Any malformed row aborts loading: billing cannot price a journey
    /// through a station whose zone is wrong.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let mut directory = ZoneDirectory::default();
        for (row_idx, result) in csv_reader.deserialize::<ZoneRecord>().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row
            let record = result?;

            if record.station.is_empty() {
                return Err(BillingError::InvalidZoneMap {
                    row,
                    message: "empty station name".to_string(),
                });
            }

            let zone = record
                .zone
                .parse::<u32>()
                .ok()
                .and_then(Zone::new)
                .ok_or_else(|| BillingError::InvalidZoneMap {
                    row,
                    message: format!(
                        "zone '{}' for station '{}' is not a positive integer",
                        record.zone, record.station
                    ),
                })?;

            directory.insert(Station::new(record.station, zone), row)?;
        }

        info!("Loaded {} stations into zone directory", directory.len());
        Ok(directory)
    }

    fn insert(&mut self, station: Station, row: usize) -> Result<()> {
        match self.zones.entry(station.id) {
            Entry::Occupied(existing) => Err(BillingError::InvalidZoneMap {
                row,
                message: format!("station '{}' listed more than once", existing.key()),
            }),
            Entry::Vacant(slot) => {
                slot.insert(station.zone);
                Ok(())
            }
        }
    }

    /// Returns the zone of a station.
    ///
    /// `row` is carried into the `UnknownStation` error so the caller can
    /// point at the offending input line.
    pub fn zone_of(&self, station_id: &str, row: usize) -> Result<Zone> {
        self.zones
            .get(station_id)
            .copied()
            .ok_or_else(|| BillingError::UnknownStation {
                station: station_id.to_string(),
                row,
            })
    }

    /// Resolves a station identifier into a [`Station`].
    pub fn station(&self, station_id: &str, row: usize) -> Result<Station> {
        let zone = self.zone_of(station_id, row)?;
        Ok(Station::new(station_id, zone))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
