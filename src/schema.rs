//! Schema detection for raw export records.
//!
//! Shapes are tested in the order of [`DETECTION_ORDER`]; the first matching
//! predicate wins. The order is part of the public contract: a new shape can
//! only shadow an existing one by being inserted before it.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::event::RawRecord;
use crate::field::{get_key, has_key};
use crate::flatten::has_nested_values;

/// Identifier for a recognized raw-record structural pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShapeTag {
    /// PSTN usage / Direct Routing export rows (`Final SIP code` column).
    #[serde(rename = "teams-pstn-call")]
    TeamsPstnCall,
    /// Nested JSON events with an `eventType` discriminator.
    #[serde(rename = "teams-json-v1")]
    TeamsJsonV1,
    /// Microsoft 365 unified audit log entries.
    #[serde(rename = "teams-audit-flat")]
    TeamsAuditFlat,
    /// Flat key/value events (CSV rows or flat JSON objects).
    #[serde(rename = "teams-csv-flat")]
    TeamsCsvFlat,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ShapeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeTag::TeamsPstnCall => "teams-pstn-call",
            ShapeTag::TeamsJsonV1 => "teams-json-v1",
            ShapeTag::TeamsAuditFlat => "teams-audit-flat",
            ShapeTag::TeamsCsvFlat => "teams-csv-flat",
            ShapeTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const TYPE_KEYS: &[&str] = &[
    "type",
    "eventType",
    "event_type",
    "Event Type",
    "event",
    "activityType",
    "activity",
    "operation",
];

pub const TIME_KEYS: &[&str] = &[
    "time",
    "timestamp",
    "Timestamp",
    "eventDateTime",
    "createdDateTime",
    "Date",
    "datetime",
    "@timestamp",
    "ts",
];

const DISCRIMINATOR_KEYS: &[&str] = &["eventType", "activityType"];
const NESTED_KEYS: &[&str] = &["actor", "target", "properties", "device"];

type ShapePredicate = fn(&RawRecord) -> bool;

/// Structural predicates in priority order. Detection walks this list.
pub const DETECTION_ORDER: &[(ShapeTag, ShapePredicate)] = &[
    (ShapeTag::TeamsPstnCall, is_pstn_call),
    (ShapeTag::TeamsJsonV1, is_json_v1),
    (ShapeTag::TeamsAuditFlat, is_audit_flat),
    (ShapeTag::TeamsCsvFlat, is_csv_flat),
];

/// Decide which known raw shape a record matches. Never fails.
pub fn detect(record: &RawRecord) -> ShapeTag {
    DETECTION_ORDER
        .iter()
        .find(|(_, predicate)| predicate(record))
        .map(|(tag, _)| *tag)
        .unwrap_or(ShapeTag::Unknown)
}

fn is_pstn_call(record: &RawRecord) -> bool {
    has_key(record, "Final SIP code")
}

fn is_json_v1(record: &RawRecord) -> bool {
    let has_discriminator = DISCRIMINATOR_KEYS
        .iter()
        .any(|k| matches!(get_key(record, k), Some(Value::String(s)) if !s.trim().is_empty()));
    has_discriminator
        && NESTED_KEYS
            .iter()
            .any(|k| matches!(get_key(record, k), Some(Value::Object(_))))
}

fn is_audit_flat(record: &RawRecord) -> bool {
    has_key(record, "Operation") && has_key(record, "CreationTime")
}

fn is_csv_flat(record: &RawRecord) -> bool {
    TYPE_KEYS.iter().any(|k| has_key(record, k))
        && TIME_KEYS.iter().any(|k| has_key(record, k))
        && !has_nested_values(record)
}
