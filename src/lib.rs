//! Busiest pickup zones and (zone, hour) slots from a trip-record file.
//!
//! ```
//! use trip_hotspots::{Aggregator, ZoneCount};
//!
//! let mut aggregator = Aggregator::new();
//! aggregator.ingest_lines([
//!     "TripID,PickupZoneID,DropoffZoneID,PickupDateTime,DistanceKm,FareAmount",
//!     "1,Z1,Z2,2024-01-01 08:15,5.0,12.0",
//! ]);
//! assert_eq!(aggregator.top_zones(10), vec![ZoneCount::new("Z1", 1)]);
//! ```

pub mod aggregate;
pub mod rank;
pub mod record;
pub mod report;
pub mod scan;

pub use aggregate::{Aggregator, IngestStats};
pub use rank::{SlotCount, ZoneCount};
pub use record::{PickupSlot, Rejection};
pub use report::Report;
