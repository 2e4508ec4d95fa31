//! Station feed fetching and normalization.
//!
//! The upstream open-data feed has no fixed contract. Over time it has
//! returned:
//! - a bare JSON array of stations
//! - `{"retVal": ...}` where `retVal` is a JSON string, a list, or a map
//!   keyed by station number
//! - `{"records": [...]}`
//! - CSV whose single `retVal` cell holds the JSON list, sometimes with
//!   doubled quotes
//!
//! [`normalize`] turns any of these into a uniform `Vec<StationRecord>` or
//! a typed [`FeedError`]. Fetching is separate ([`FeedClient`],
//! [`FileSource`]) so normalization stays pure over its input bytes.

mod client;
mod envelope;
mod error;
mod fields;
mod file;
mod normalize;
mod outcome;
mod source;

pub use client::{
    DEFAULT_TIMEOUT_SECS, FeedClient, FeedConfig, TAICHUNG_OPEN_DATA_URL,
    TAICHUNG_YOUBIKE_RESOURCE_ID, YOUBIKE_TAICHUNG_URL,
};
pub use envelope::Envelope;
pub use error::{DIAGNOSTIC_CHARS, FeedError};
pub use fields::Field;
pub use file::FileSource;
pub use normalize::{NormalizeOptions, normalize, normalize_rows};
pub use outcome::FeedOutcome;
pub use source::{ContentKind, FeedSource, RawResponse, StationSource};
