//! Domain types for bike-share station data.
//!
//! Everything here is pure: station records, coordinates and the helpers
//! presentation code uses to rank and colour stations. Types enforce their
//! invariants at construction, so a `StationRecord` always has a name and a
//! position.

mod availability;
mod geo;
mod station;
mod time;

pub use availability::Availability;
pub use geo::{Coordinate, EARTH_RADIUS_KM, GeoBounds, InvalidCoordinate, haversine_km};
pub use station::{StationId, StationRecord};
pub use time::{COMPACT_TIMESTAMP_FORMAT, parse_compact_timestamp};
