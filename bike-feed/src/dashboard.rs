//! Derived metrics over a normalized station table.
//!
//! These are what a dashboard shows next to its map: which districts have
//! stations, the station closest to the user, and headline totals. All
//! functions are pure over a slice of records.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Coordinate, StationRecord};

/// Number of stations in one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaCount {
    pub area: String,
    pub stations: usize,
}

/// A station paired with its distance from some origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestStation<'a> {
    pub record: &'a StationRecord,
    pub distance_km: f64,
}

/// Headline totals for a set of stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub station_count: usize,
    /// Sum of known bike counts.
    pub bikes_available: u64,
    /// Sum of known empty-dock counts.
    pub docks_empty: u64,
    /// Most recent upstream update among the stations.
    pub latest_update: Option<NaiveDateTime>,
}

/// Stations in `area`, or all stations when `area` is `None`.
pub fn filter_area<'a>(records: &'a [StationRecord], area: Option<&str>) -> Vec<&'a StationRecord> {
    records
        .iter()
        .filter(|r| area.is_none_or(|a| r.area == a))
        .collect()
}

/// Distinct non-empty areas in name order, with station counts.
pub fn areas(records: &[StationRecord]) -> Vec<AreaCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.area.is_empty()) {
        *counts.entry(record.area.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(area, stations)| AreaCount {
            area: area.to_string(),
            stations,
        })
        .collect()
}

/// All stations ordered by distance from `origin`, closest first.
///
/// Ties keep input order.
pub fn by_distance<'a, I>(records: I, origin: &Coordinate) -> Vec<NearestStation<'a>>
where
    I: IntoIterator<Item = &'a StationRecord>,
{
    let mut nearby: Vec<NearestStation<'a>> = records
        .into_iter()
        .map(|record| NearestStation {
            record,
            distance_km: record.distance_km(origin),
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

/// The station closest to `origin`; the first one wins a tie.
pub fn nearest<'a, I>(records: I, origin: &Coordinate) -> Option<NearestStation<'a>>
where
    I: IntoIterator<Item = &'a StationRecord>,
{
    records
        .into_iter()
        .map(|record| NearestStation {
            record,
            distance_km: record.distance_km(origin),
        })
        .reduce(|best, candidate| {
            if candidate.distance_km < best.distance_km {
                candidate
            } else {
                best
            }
        })
}

/// Totals over a set of stations. Unknown counts contribute nothing.
pub fn summary<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a StationRecord>,
{
    records.into_iter().fold(
        Summary {
            station_count: 0,
            bikes_available: 0,
            docks_empty: 0,
            latest_update: None,
        },
        |mut acc, record| {
            acc.station_count += 1;
            acc.bikes_available += u64::from(record.bikes_available.unwrap_or(0));
            acc.docks_empty += u64::from(record.docks_empty.unwrap_or(0));
            acc.latest_update = acc.latest_update.max(record.last_updated);
            acc
        },
    )
}
