//! Validation and coercion of candidate rows into station records.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::domain::{GeoBounds, StationId, StationRecord};

use super::envelope::Envelope;
use super::error::FeedError;
use super::fields::{Field, as_count, as_number, as_text, as_timestamp};
use super::source::RawResponse;

/// Knobs for normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Box that station positions must fall inside.
    pub bounds: GeoBounds,
}

impl NormalizeOptions {
    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Turn a raw upstream response into station records.
///
/// Either every required field is recognized and at least one usable
/// record comes out, or the whole feed fails; there is no partial table.
pub fn normalize(
    raw: &RawResponse,
    options: &NormalizeOptions,
) -> Result<Vec<StationRecord>, FeedError> {
    let envelope = Envelope::detect(raw)?;
    debug!(shape = envelope.kind(), "detected feed envelope");

    let rows = envelope.into_rows()?;
    normalize_rows(&rows, options)
}

/// Normalize an already-unwrapped list of station objects.
pub fn normalize_rows(
    rows: &[Value],
    options: &NormalizeOptions,
) -> Result<Vec<StationRecord>, FeedError> {
    if rows.is_empty() {
        return Err(FeedError::EmptyFeed);
    }

    check_schema(rows)?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for (position, row) in rows.iter().enumerate() {
        let Some(object) = row.as_object() else {
            trace!(position, "skipping non-object row");
            dropped += 1;
            continue;
        };

        let Some(record) = coerce_row(position, object, options) else {
            dropped += 1;
            continue;
        };

        if let StationId::Source(id) = &record.station_id
            && !seen.insert(id.clone())
        {
            debug!(station_id = %id, "dropping duplicate station");
            dropped += 1;
            continue;
        }

        records.push(record);
    }

    debug!(kept = records.len(), dropped, "normalized station rows");

    if records.is_empty() {
        return Err(FeedError::EmptyFeed);
    }
    Ok(records)
}

/// Fail if a required field appears in no row at all.
fn check_schema(rows: &[Value]) -> Result<(), FeedError> {
    let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();

    let missing: BTreeSet<String> = Field::REQUIRED
        .iter()
        .filter(|field| !objects.iter().any(|row| field.is_present_in(row)))
        .map(|field| field.name().to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let observed: BTreeSet<String> = objects
        .iter()
        .flat_map(|row| row.keys().cloned())
        .collect();

    Err(FeedError::SchemaMismatch { missing, observed })
}

/// Build a record from one row, or `None` if it lacks a name or position.
fn coerce_row(
    position: usize,
    row: &Map<String, Value>,
    options: &NormalizeOptions,
) -> Option<StationRecord> {
    let text = |field: Field| field.lookup(row).and_then(as_text);
    let count = |field: Field| field.lookup(row).and_then(as_count);

    let Some(name) = text(Field::Name) else {
        trace!(position, "dropping row without a name");
        return None;
    };

    let latitude = Field::Latitude.lookup(row).and_then(as_number);
    let longitude = Field::Longitude.lookup(row).and_then(as_number);
    let Some(coordinate) = latitude
        .zip(longitude)
        .and_then(|(lat, lng)| options.bounds.locate(lat, lng))
    else {
        trace!(position, name = %name, ?latitude, ?longitude, "dropping row without a usable position");
        return None;
    };

    let station_id = text(Field::StationId)
        .map(StationId::Source)
        .unwrap_or(StationId::Position(position));

    Some(StationRecord {
        station_id,
        name,
        area: text(Field::Area).unwrap_or_default(),
        address: text(Field::Address).unwrap_or_default(),
        position: coordinate,
        total_docks: count(Field::TotalDocks),
        bikes_available: count(Field::BikesAvailable),
        docks_empty: count(Field::DocksEmpty),
        last_updated: Field::LastUpdated.lookup(row).and_then(as_timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, Coordinate};
    use chrono::NaiveDate;
    use serde_json::json;

    fn station(name: &str, lat: &str, lng: &str, sbi: &str) -> Value {
        json!({
            "sna": name,
            "lat": lat,
            "lng": lng,
            "tot": "10",
            "sbi": sbi,
            "bemp": "6",
            "mday": "20250101120000",
            "sarea": "北區",
            "ar": "三民路三段129號"
        })
    }

    fn opts() -> NormalizeOptions {
        NormalizeOptions::default()
    }

    fn norm_json(value: &Value) -> Result<Vec<StationRecord>, FeedError> {
        normalize(&RawResponse::json(value.to_string()), &opts())
    }

    #[test]
    fn end_to_end_example() {
        let body = r#"[{"sna":"Station A","lat":"24.15","lng":"120.68","tot":"10","sbi":"0","bemp":"10","mday":"20250101120000","sarea":"North","ar":"123 Rd"}]"#;
        let records = normalize(&RawResponse::json(body), &opts()).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.station_id, StationId::Position(0));
        assert_eq!(r.name, "Station A");
        assert_eq!(r.area, "North");
        assert_eq!(r.address, "123 Rd");
        assert_eq!(r.position, Coordinate::new(24.15, 120.68).unwrap());
        assert_eq!(r.total_docks, Some(10));
        assert_eq!(r.bikes_available, Some(0));
        assert_eq!(r.docks_empty, Some(10));
        assert_eq!(r.availability(), Some(Availability::Empty));
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(r.last_updated, Some(expected));
    }

    #[test]
    fn flat_array_one_record_per_object() {
        let list = json!([
            station("A", "24.15", "120.68", "1"),
            station("B", "24.16", "120.69", "2"),
            station("C", "24.17", "120.70", "3"),
        ]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 3);
        let bikes: Vec<_> = records.iter().map(|r| r.bikes_available).collect();
        assert_eq!(bikes, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(records[2].station_id, StationId::Position(2));
    }

    #[test]
    fn enveloped_string_matches_flat() {
        let list = json!([
            station("A", "24.15", "120.68", "1"),
            station("B", "24.16", "120.69", "5"),
        ]);
        let flat = norm_json(&list).unwrap();
        let wrapped = norm_json(&json!({"retCode": 1, "retVal": list.to_string()})).unwrap();
        assert_eq!(flat, wrapped);
    }

    #[test]
    fn csv_wrapped_matches_flat() {
        let list = json!([
            station("A", "24.15", "120.68", "1"),
            station("B", "24.16", "120.69", "5"),
        ]);
        let doubled = list.to_string().replace('"', "\"\"");
        let body = format!("retVal\n\"{doubled}\"\n");

        let flat = norm_json(&list).unwrap();
        let from_csv = normalize(&RawResponse::csv(body), &opts()).unwrap();
        assert_eq!(flat, from_csv);
    }

    #[test]
    fn records_and_retval_list_match_flat() {
        let list = json!([station("A", "24.15", "120.68", "1")]);
        let flat = norm_json(&list).unwrap();
        assert_eq!(norm_json(&json!({"records": list})).unwrap(), flat);
        assert_eq!(norm_json(&json!({"retVal": list})).unwrap(), flat);
    }

    #[test]
    fn missing_fields_is_schema_mismatch() {
        let list = json!([{"sna": "A", "lat": "24.15", "lng": "120.68"}]);
        let err = norm_json(&list).unwrap_err();
        let FeedError::SchemaMismatch { missing, observed } = err else {
            panic!("expected schema mismatch, got {err:?}");
        };
        let missing: Vec<_> = missing.into_iter().collect();
        assert_eq!(
            missing,
            vec![
                "address",
                "area",
                "bikes_available",
                "docks_empty",
                "last_updated",
                "total_docks"
            ]
        );
        let observed: Vec<_> = observed.into_iter().collect();
        assert_eq!(observed, vec!["lat", "lng", "sna"]);
    }

    #[test]
    fn field_present_in_any_row_satisfies_schema() {
        let mut first = station("A", "24.15", "120.68", "1");
        first.as_object_mut().unwrap().remove("ar");
        let second = station("B", "24.16", "120.69", "2");
        let records = norm_json(&json!([first, second])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, "");
    }

    #[test]
    fn degraded_envelope_is_schema_mismatch() {
        let err = norm_json(&json!({"retCode": 0, "retVal": {"msg": "maintenance"}})).unwrap_err();
        let FeedError::SchemaMismatch { observed, .. } = err else {
            panic!("expected schema mismatch");
        };
        assert!(observed.contains("retVal"));
    }

    #[test]
    fn non_numeric_latitude_drops_record() {
        let list = json!([
            station("A", "n/a", "120.68", "1"),
            station("B", "24.16", "120.69", "2"),
        ]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "B");
        assert_eq!(records[0].station_id, StationId::Position(1));
    }

    #[test]
    fn non_numeric_bikes_is_kept_as_null() {
        let list = json!([station("A", "24.15", "120.68", "unknown")]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bikes_available, None);
        assert_eq!(records[0].availability(), None);
        assert_eq!(records[0].total_docks, Some(10));
    }

    #[test]
    fn blank_name_drops_record() {
        let list = json!([
            station("  ", "24.15", "120.68", "1"),
            station("B", "24.16", "120.69", "2"),
        ]);
        assert_eq!(norm_json(&list).unwrap().len(), 1);
    }

    #[test]
    fn out_of_bounds_position_drops_record() {
        let list = json!([
            station("Null island", "0", "0", "1"),
            station("Swapped", "120.68", "24.15", "1"),
            station("B", "24.16", "120.69", "2"),
        ]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "B");

        let world = NormalizeOptions::default().with_bounds(GeoBounds::WORLD);
        let records = normalize(&RawResponse::json(list.to_string()), &world).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn all_rows_unusable_is_empty_feed() {
        let list = json!([station("A", "", "", "1")]);
        assert_eq!(norm_json(&list).unwrap_err(), FeedError::EmptyFeed);
    }

    #[test]
    fn empty_list_is_empty_feed() {
        assert_eq!(norm_json(&json!([])).unwrap_err(), FeedError::EmptyFeed);
        assert_eq!(
            norm_json(&json!({"retVal": "[]"})).unwrap_err(),
            FeedError::EmptyFeed
        );
    }

    #[test]
    fn unparseable_timestamp_is_null() {
        let mut row = station("A", "24.15", "120.68", "1");
        row["mday"] = json!("2025-01-01 12:00:00");
        let records = norm_json(&json!([row])).unwrap();
        assert_eq!(records[0].last_updated, None);
    }

    #[test]
    fn upstream_station_ids_are_deduplicated() {
        let mut a = station("A", "24.15", "120.68", "1");
        a["sno"] = json!("500601001");
        let mut a_again = station("A (stale)", "24.15", "120.68", "9");
        a_again["sno"] = json!("500601001");
        let mut b = station("B", "24.16", "120.69", "2");
        b["sno"] = json!(500601002);

        let records = norm_json(&json!([a, a_again, b])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "A");
        assert_eq!(records[0].station_id, StationId::Source("500601001".into()));
        assert_eq!(records[1].station_id, StationId::Source("500601002".into()));
    }

    #[test]
    fn youbike_two_field_names() {
        let list = json!([{
            "sno": "500601001",
            "sna": "YouBike2.0_臺中車站",
            "sarea": "中區",
            "ar": "台灣大道一段1號",
            "latitude": 24.13726,
            "longitude": 120.68617,
            "total": 30,
            "available_rent_bikes": 12,
            "available_return_bikes": 18,
            "mday": "20240920083015"
        }]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_docks, Some(30));
        assert_eq!(records[0].bikes_available, Some(12));
        assert_eq!(records[0].docks_empty, Some(18));
        assert_eq!(records[0].area, "中區");
    }

    #[test]
    fn more_bikes_than_docks_is_preserved() {
        let mut row = station("A", "24.15", "120.68", "15");
        row["tot"] = json!("10");
        let records = norm_json(&json!([row])).unwrap();
        assert_eq!(records[0].bikes_available, Some(15));
        assert_eq!(records[0].total_docks, Some(10));
    }

    #[test]
    fn plain_csv_table() {
        let body = "sna,lat,lng,tot,sbi,bemp,mday,sarea,ar\n\
                    A,24.15,120.68,10,4,6,20250101120000,北區,Road 1\n\
                    B,oops,120.69,10,4,6,20250101120000,北區,Road 2\n";
        let records = normalize(&RawResponse::csv(body), &opts()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].availability(), Some(Availability::Sufficient));
    }

    #[test]
    fn non_object_rows_are_skipped() {
        let list = json!([42, station("A", "24.15", "120.68", "1")]);
        let records = norm_json(&list).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station_id, StationId::Position(1));
    }
}
