//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::{AreaCount, NearestStation, Summary};
use crate::domain::{Availability, Coordinate, StationRecord};

/// Optional district filter.
#[derive(Debug, Default, Deserialize)]
pub struct AreaQuery {
    /// Only stations whose `area` equals this
    pub area: Option<String>,
}

impl AreaQuery {
    /// The filter, treating a blank value as no filter.
    pub fn area(&self) -> Option<&str> {
        area_filter(&self.area)
    }
}

/// Station list request: an optional district, and an optional origin to
/// order stations by distance from.
#[derive(Debug, Default, Deserialize)]
pub struct StationsQuery {
    pub area: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl StationsQuery {
    /// The filter, treating a blank value as no filter.
    pub fn area(&self) -> Option<&str> {
        area_filter(&self.area)
    }
}

fn area_filter(area: &Option<String>) -> Option<&str> {
    area.as_deref().map(str::trim).filter(|a| !a.is_empty())
}

/// Request for the station closest to a point.
#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lng: f64,
    pub area: Option<String>,
}

/// A station as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct StationView {
    #[serde(flatten)]
    pub record: StationRecord,

    /// `empty`, `low` or `sufficient`; absent when the bike count is unknown
    pub availability: Option<Availability>,

    /// Kilometres from the query origin, for distance queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<&StationRecord> for StationView {
    fn from(record: &StationRecord) -> Self {
        Self {
            availability: record.availability(),
            record: record.clone(),
            distance_km: None,
        }
    }
}

impl From<NearestStation<'_>> for StationView {
    fn from(nearby: NearestStation<'_>) -> Self {
        Self {
            distance_km: Some(nearby.distance_km),
            ..Self::from(nearby.record)
        }
    }
}

/// Response for the station list.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationView>,

    /// When the snapshot was fetched; absent on failure
    pub fetched_at: Option<DateTime<Utc>>,

    /// The origin stations are ordered from, when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Coordinate>,

    /// Why the list is empty, when the feed failed
    pub error: Option<String>,
}

/// Response for the district list.
#[derive(Debug, Serialize)]
pub struct AreasResponse {
    pub areas: Vec<AreaCount>,
    pub error: Option<String>,
}

/// Response for a nearest-station query.
#[derive(Debug, Serialize)]
pub struct NearestResponse {
    pub origin: Coordinate,
    pub station: StationView,
    pub fetched_at: DateTime<Utc>,
}

/// Response for the headline totals.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub area: Option<String>,

    #[serde(flatten)]
    pub summary: Summary,

    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
