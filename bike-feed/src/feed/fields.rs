//! Upstream field names and value coercion.
//!
//! The upstream schema is not contractually fixed. The YouBike 1.0 feed
//! uses terse keys (`sna`, `sbi`, `bemp`, ...) while the 2.0 feed spells
//! some of them out (`latitude`, `available_rent_bikes`, ...). Each
//! canonical field accepts every spelling seen in the wild.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::domain::parse_compact_timestamp;

/// A canonical station field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    StationId,
    Name,
    Area,
    Address,
    Latitude,
    Longitude,
    TotalDocks,
    BikesAvailable,
    DocksEmpty,
    LastUpdated,
}

impl Field {
    /// Fields that must appear in at least one row for the feed to be usable.
    pub const REQUIRED: [Field; 9] = [
        Field::Latitude,
        Field::Longitude,
        Field::TotalDocks,
        Field::BikesAvailable,
        Field::DocksEmpty,
        Field::LastUpdated,
        Field::Name,
        Field::Area,
        Field::Address,
    ];

    /// Canonical name, as reported in schema diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Field::StationId => "station_id",
            Field::Name => "name",
            Field::Area => "area",
            Field::Address => "address",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::TotalDocks => "total_docks",
            Field::BikesAvailable => "bikes_available",
            Field::DocksEmpty => "docks_empty",
            Field::LastUpdated => "last_updated",
        }
    }

    /// Upstream keys that carry this field, in order of preference.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::StationId => &["sno"],
            Field::Name => &["sna"],
            Field::Area => &["sarea"],
            Field::Address => &["ar"],
            Field::Latitude => &["lat", "latitude"],
            Field::Longitude => &["lng", "longitude"],
            Field::TotalDocks => &["tot", "total"],
            Field::BikesAvailable => &["sbi", "available_rent_bikes"],
            Field::DocksEmpty => &["bemp", "available_return_bikes"],
            Field::LastUpdated => &["mday"],
        }
    }

    /// Whether any alias of this field is a key of `row`.
    pub fn is_present_in(self, row: &Map<String, Value>) -> bool {
        self.aliases().iter().any(|key| row.contains_key(*key))
    }

    /// The first non-null value stored under one of this field's aliases.
    pub fn lookup(self, row: &Map<String, Value>) -> Option<&Value> {
        self.aliases()
            .iter()
            .filter_map(|key| row.get(*key))
            .find(|value| !value.is_null())
    }
}

/// Read a number from a JSON number or a numeric string.
///
/// Non-finite values (`"NaN"`, `"inf"`) count as unreadable.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a non-negative whole count, e.g. `10`, `"10"` or `"10.0"`.
pub fn as_count(value: &Value) -> Option<u32> {
    let n = as_number(value)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

/// Read a trimmed, non-empty string. Numbers are rendered as text.
pub fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Read a fixed-width `YYYYMMDDHHMMSS` timestamp from a string or integer.
pub fn as_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_compact_timestamp(s),
        Value::Number(n) => {
            let whole = match n.as_u64() {
                Some(whole) => whole,
                // Spreadsheet exports write `20250101120000.0`
                None => {
                    let f = n.as_f64()?;
                    if !(0.0..=u64::MAX as f64).contains(&f) || f.fract() != 0.0 {
                        return None;
                    }
                    f as u64
                }
            };
            parse_compact_timestamp(&whole.to_string())
        }
        _ => None,
    }
}
