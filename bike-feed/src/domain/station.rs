//! Normalized station records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Availability, Coordinate};

/// Identity of a station within one fetch.
///
/// Feeds that publish a station number (`sno`) are keyed by it. Feeds that
/// don't are keyed by the row's position in the upstream list, which is only
/// meaningful within a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum StationId {
    /// Station number published by the upstream feed.
    Source(String),
    /// Zero-based row index in the upstream list.
    Position(usize),
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationId::Source(id) => f.write_str(id),
            StationId::Position(index) => write!(f, "#{index}"),
        }
    }
}

/// One row of the normalized station table.
///
/// `name` and `position` are always present; rows lacking either are
/// dropped during normalization. Counts that could not be read are `None`.
/// `bikes_available` may exceed `total_docks` when upstream says so.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    pub station_id: StationId,
    pub name: String,
    pub area: String,
    pub address: String,
    #[serde(flatten)]
    pub position: Coordinate,
    pub total_docks: Option<u32>,
    pub bikes_available: Option<u32>,
    pub docks_empty: Option<u32>,
    pub last_updated: Option<NaiveDateTime>,
}

impl StationRecord {
    /// Availability class, if the bike count is known.
    pub fn availability(&self) -> Option<Availability> {
        Availability::of(self.bikes_available)
    }

    /// Distance from `origin` to this station in kilometres.
    pub fn distance_km(&self, origin: &Coordinate) -> f64 {
        origin.distance_km(&self.position)
    }
}
