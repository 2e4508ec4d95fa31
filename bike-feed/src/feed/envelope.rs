//! Recognized upstream response shapes.
//!
//! The open-data platform has wrapped the same station list in several
//! different envelopes over time. Detection looks at the content kind first
//! and then at which envelope keys are present; it never tries one shape,
//! fails, and falls through to the next.

use serde_json::{Map, Value};

use super::error::{FeedError, snippet};
use super::source::{ContentKind, RawResponse};

/// Envelope key holding the station payload in most API versions.
const RET_VAL: &str = "retVal";

/// Envelope key used by the CKAN-style datastore API.
const RECORDS: &str = "records";

/// A recognized response shape, before its rows are extracted.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Top-level JSON array of station objects.
    Flat(Vec<Value>),
    /// `{"retVal": "<json text>"}`.
    RetValString(String),
    /// `{"retVal": [...]}`.
    RetValList(Vec<Value>),
    /// `{"retVal": {...}}`; the whole envelope is kept.
    RetValObject(Map<String, Value>),
    /// `{"records": [...]}`.
    Records(Vec<Value>),
    /// Any other JSON object, treated as a single row.
    Bare(Map<String, Value>),
    /// CSV with a `retVal` column; holds the first row's cell.
    CsvWrapped(String),
    /// Plain CSV table; one object per row, keyed by header.
    CsvTable(Vec<Value>),
}

impl Envelope {
    /// Identify the shape of a raw response.
    pub fn detect(raw: &RawResponse) -> Result<Self, FeedError> {
        match raw.content_kind() {
            ContentKind::Json => {
                let value: Value = serde_json::from_str(&raw.body).map_err(|e| {
                    FeedError::decode(format!("body is not valid JSON: {e}"), &raw.body)
                })?;
                Self::from_json(value, &raw.body)
            }
            ContentKind::Csv => Self::from_csv(&raw.body),
        }
    }

    fn from_json(value: Value, body: &str) -> Result<Self, FeedError> {
        let mut object = match value {
            Value::Array(list) => return Ok(Envelope::Flat(list)),
            Value::Object(object) => object,
            other => {
                return Err(FeedError::decode(
                    format!("expected a JSON array or object, found {}", type_name(&other)),
                    body,
                ));
            }
        };

        if object.contains_key(RET_VAL) {
            return match object.remove(RET_VAL) {
                Some(Value::String(text)) => Ok(Envelope::RetValString(text)),
                Some(Value::Array(list)) => Ok(Envelope::RetValList(list)),
                Some(Value::Object(inner)) => {
                    object.insert(RET_VAL.to_string(), Value::Object(inner));
                    Ok(Envelope::RetValObject(object))
                }
                other => Err(FeedError::decode(
                    format!(
                        "unexpected retVal type: {}",
                        other.as_ref().map_or("missing", type_name)
                    ),
                    body,
                )),
            };
        }

        if object.contains_key(RECORDS) {
            return match object.remove(RECORDS) {
                Some(Value::Array(list)) => Ok(Envelope::Records(list)),
                other => Err(FeedError::decode(
                    format!(
                        "unexpected records type: {}",
                        other.as_ref().map_or("missing", type_name)
                    ),
                    body,
                )),
            };
        }

        Ok(Envelope::Bare(object))
    }

    fn from_csv(body: &str) -> Result<Self, FeedError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| FeedError::decode(format!("body is not valid CSV: {e}"), body))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| FeedError::decode(format!("body is not valid CSV: {e}"), body))?;
            rows.push(record);
        }

        let Some(first) = rows.first() else {
            return Err(FeedError::EmptyFeed);
        };

        if let Some(column) = headers.iter().position(|h| header_name(h) == RET_VAL) {
            let cell = first.get(column).unwrap_or_default();
            return Ok(Envelope::CsvWrapped(cell.to_string()));
        }

        let table = rows
            .iter()
            .map(|record| {
                let object: Map<String, Value> = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, cell)| (header_name(h).to_string(), Value::String(cell.to_string())))
                    .collect();
                Value::Object(object)
            })
            .collect();

        Ok(Envelope::CsvTable(table))
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Flat(_) => "flat",
            Envelope::RetValString(_) => "retval_string",
            Envelope::RetValList(_) => "retval_list",
            Envelope::RetValObject(_) => "retval_object",
            Envelope::Records(_) => "records",
            Envelope::Bare(_) => "bare_object",
            Envelope::CsvWrapped(_) => "csv_wrapped",
            Envelope::CsvTable(_) => "csv_table",
        }
    }

    /// Extract the candidate station rows.
    pub fn into_rows(self) -> Result<Vec<Value>, FeedError> {
        match self {
            Envelope::Flat(list)
            | Envelope::RetValList(list)
            | Envelope::Records(list)
            | Envelope::CsvTable(list) => Ok(list),
            Envelope::RetValString(text) => {
                let value: Value = serde_json::from_str(&text).map_err(|e| {
                    FeedError::decode(format!("retVal string is not valid JSON: {e}"), &text)
                })?;
                station_list(value, &text)
            }
            Envelope::RetValObject(envelope) => Ok(unwrap_keyed(envelope)),
            Envelope::Bare(object) => Ok(vec![Value::Object(object)]),
            Envelope::CsvWrapped(cell) => decode_csv_cell(&cell),
        }
    }
}

/// Decode a `retVal` CSV cell.
///
/// Some exports double-escape the payload, leaving `""` where JSON expects
/// `"` even after CSV unquoting. The cell is read as-is first and with the
/// doubled quotes collapsed second.
fn decode_csv_cell(cell: &str) -> Result<Vec<Value>, FeedError> {
    let value = match serde_json::from_str::<Value>(cell) {
        Ok(value) => value,
        Err(_) => {
            let unescaped = cell.replace("\"\"", "\"");
            serde_json::from_str::<Value>(&unescaped).map_err(|e| FeedError::DecodeFailure {
                message: format!(
                    "retVal cell is not valid JSON even after quote un-escaping: {e} (un-escaped starts: {})",
                    snippet(&unescaped)
                ),
                snippet: snippet(cell),
            })?
        }
    };
    station_list(value, cell)
}

/// Interpret a decoded `retVal` payload as a list of stations.
fn station_list(value: Value, text: &str) -> Result<Vec<Value>, FeedError> {
    match value {
        Value::Array(list) => Ok(list),
        Value::Object(map) if map.values().all(Value::is_object) => {
            Ok(map.into_iter().map(|(_, v)| v).collect())
        }
        other => Err(FeedError::decode(
            format!("retVal payload is a {}, not a station list", type_name(&other)),
            text,
        )),
    }
}

/// Legacy feeds key stations by number: `{"retVal": {"0001": {...}, ...}}`.
/// Anything else under an object `retVal` leaves the envelope as one row.
fn unwrap_keyed(mut envelope: Map<String, Value>) -> Vec<Value> {
    let keyed = matches!(
        envelope.get(RET_VAL),
        Some(Value::Object(inner)) if inner.values().all(Value::is_object)
    );
    if keyed && let Some(Value::Object(inner)) = envelope.remove(RET_VAL) {
        return inner.into_iter().map(|(_, v)| v).collect();
    }
    vec![Value::Object(envelope)]
}

/// Header cell without surrounding blanks or a UTF-8 byte order mark.
fn header_name(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
