//! Lead record model
//!
//! One row of the user's external table, normalised at ingestion: every
//! flag collapses to a plain `bool` (only a JSON `true` counts) and the
//! creation timestamp is required. Rows that cannot provide a creation
//! timestamp are rejected here so the aggregator never sees them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Column holding the row identifier
pub const COL_ID: &str = "id";
/// Column holding the client identifier (usually a phone number)
pub const COL_CLIENT_ID: &str = "cliente_id";
/// Column holding the client display name
pub const COL_CLIENT_NAME: &str = "cliente_nome";
/// Column holding the creation timestamp
pub const COL_CREATED_AT: &str = "created_at";
/// Column holding the qualified flag
pub const COL_QUALIFIED: &str = "qualified";
/// Column holding the disqualified flag
pub const COL_DISQUALIFIED: &str = "disqualified";
/// Column holding the converted flag
pub const COL_CONVERTED: &str = "converted";
/// Column holding the conversion timestamp
pub const COL_CONVERTED_AT: &str = "data_conversao";

/// A normalised lead / conversation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Opaque identifier, rendered as text whatever its source type
    pub id: String,

    #[serde(rename = "cliente_id")]
    pub client_id: Option<String>,

    #[serde(rename = "cliente_nome")]
    pub client_name: Option<String>,

    pub created_at: DateTime<Utc>,

    pub qualified: bool,

    pub disqualified: bool,

    pub converted: bool,

    #[serde(rename = "data_conversao")]
    pub converted_at: Option<DateTime<Utc>>,
}

/// Why a row was rejected at ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRow {
    /// The row is not a JSON object
    NotAnObject,
    /// `created_at` is absent or null
    MissingCreatedAt,
    /// `created_at` is present but not a recognised timestamp
    UnparsableCreatedAt(String),
}

impl fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRow::NotAnObject => write!(f, "row is not an object"),
            MalformedRow::MissingCreatedAt => write!(f, "missing {}", COL_CREATED_AT),
            MalformedRow::UnparsableCreatedAt(raw) => {
                write!(f, "unparsable {}: {}", COL_CREATED_AT, raw)
            }
        }
    }
}

impl LeadRecord {
    /// Build a record from a raw JSON row
    pub fn from_row(row: &Value) -> Result<Self, MalformedRow> {
        let obj = row.as_object().ok_or(MalformedRow::NotAnObject)?;

        let created_at = match obj.get(COL_CREATED_AT) {
            None | Some(Value::Null) => return Err(MalformedRow::MissingCreatedAt),
            Some(Value::String(raw)) => parse_timestamp(raw)
                .ok_or_else(|| MalformedRow::UnparsableCreatedAt(raw.clone()))?,
            Some(other) => return Err(MalformedRow::UnparsableCreatedAt(other.to_string())),
        };

        Ok(Self {
            id: text_field(obj, COL_ID).unwrap_or_default(),
            client_id: text_field(obj, COL_CLIENT_ID),
            client_name: text_field(obj, COL_CLIENT_NAME),
            created_at,
            qualified: flag(obj, COL_QUALIFIED),
            disqualified: flag(obj, COL_DISQUALIFIED),
            converted: flag(obj, COL_CONVERTED),
            converted_at: obj
                .get(COL_CONVERTED_AT)
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
        })
    }

    /// Milliseconds from creation to conversion, when the row qualifies for
    /// the average conversion time
    pub fn conversion_time_ms(&self) -> Option<i64> {
        if !self.converted {
            return None;
        }
        let converted_at = self.converted_at?;
        let elapsed = (converted_at - self.created_at).num_milliseconds();
        (elapsed > 0).then_some(elapsed)
    }
}

/// Rows accepted at ingestion plus the count of rejected ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadBatch {
    pub records: Vec<LeadRecord>,
    pub skipped: usize,
}

impl LeadBatch {
    /// Normalise raw rows, preserving input order
    pub fn from_rows(rows: &[Value]) -> Self {
        let mut batch = Self {
            records: Vec::with_capacity(rows.len()),
            skipped: 0,
        };

        for row in rows {
            match LeadRecord::from_row(row) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    tracing::debug!(%reason, "Skipping malformed lead row");
                    batch.skipped += 1;
                }
            }
        }

        batch
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    matches!(obj.get(key), Some(Value::Bool(true)))
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse the timestamp shapes PostgREST and hand-written rows produce
///
/// Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Postgres text output: "2024-01-15 14:30:00.123+00"
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
