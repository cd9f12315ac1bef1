//! Fare table and journey pricing.

use crate::journey::{Journey, JourneyKind};
use crate::money::Pence;
use crate::zone::Zone;

/// Fares and caps applied to every journey.
///
/// The default carries the network's published tariff. All amounts are in
/// pence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tariff {
    /// Charged on every complete journey before zone surcharges.
    pub base_fare: Pence,

    /// Flat fare for a journey missing its entry or exit.
    pub error_fare: Pence,

    /// Surcharge for zone 1.
    pub zone1_surcharge: Pence,

    /// Surcharge for zones 2 and 3.
    pub zone2_3_surcharge: Pence,

    /// Surcharge for zones 4 and 5.
    pub zone4_5_surcharge: Pence,

    /// Surcharge for zone 6 and beyond.
    pub outer_zone_surcharge: Pence,

    /// Ceiling on a user's charges per UTC day.
    pub daily_cap: Pence,

    /// Ceiling on a user's charges per calendar month.
    pub monthly_cap: Pence,
}

impl Default for Tariff {
    fn default() -> Self {
        Tariff {
            base_fare: Pence::new(200),
            error_fare: Pence::new(500),
            zone1_surcharge: Pence::new(80),
            zone2_3_surcharge: Pence::new(50),
            zone4_5_surcharge: Pence::new(30),
            outer_zone_surcharge: Pence::new(10),
            daily_cap: Pence::new(1500),
            monthly_cap: Pence::new(10000),
        }
    }
}

impl Tariff {
    /// Surcharge for entering or leaving through `zone`.
    pub fn surcharge(&self, zone: Zone) -> Pence {
        match zone.number() {
            1 => self.zone1_surcharge,
            2 | 3 => self.zone2_3_surcharge,
            4 | 5 => self.zone4_5_surcharge,
            _ => self.outer_zone_surcharge,
        }
    }

    /// Nominal fare of a journey, before caps.
    ///
    /// Complete journeys pay the base fare plus one surcharge each for the
    /// entry and exit zones. Erroneous journeys pay the error fare
    /// regardless of zones.
    pub fn price(&self, journey: &Journey) -> Pence {
        match &journey.kind {
            JourneyKind::Complete { entry, exit } => {
                self.base_fare
                    + self.surcharge(entry.station.zone)
                    + self.surcharge(exit.station.zone)
            }
            JourneyKind::MissingExit { .. } | JourneyKind::MissingEntry { .. } => self.error_fare,
        }
    }
}
