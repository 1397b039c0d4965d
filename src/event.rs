//! Canonical event model shared by every stage after normalization.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::ShapeTag;

/// One decoded export entry, exactly as the reader produced it.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Canonical event type names produced by the built-in alias table.
pub mod event_types {
    pub const CALL: &str = "Call";
    pub const SIGN_IN: &str = "SignIn";
    pub const POLICY_CHANGE: &str = "PolicyChange";
    pub const DEVICE_REGISTRATION: &str = "DeviceRegistration";
    pub const UNKNOWN: &str = "Unknown";
}

/// Ordered urgency level attached to an Event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        })
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A data-quality problem found while normalizing one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationWarning {
    pub field: String,
    pub message: String,
}

impl NormalizationWarning {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The promoted attributes of an event, as translators see them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanonicalFields {
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: String,
    /// Literal type string from the export, before alias mapping.
    pub source_type: Option<String>,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub severity: Severity,
    pub duration_secs: Option<f64>,
}

impl CanonicalFields {
    pub fn is_unknown(&self) -> bool {
        self.event_type == event_types::UNKNOWN
    }

    /// Type name to show a reader: the literal source type stands in for
    /// `Unknown` when the export had one.
    pub fn display_type(&self) -> &str {
        match (&self.source_type, self.is_unknown()) {
            (Some(source), true) if !source.is_empty() => source,
            _ => &self.event_type,
        }
    }

    pub fn timestamp_string(&self) -> Option<String> {
        self.timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Canonical, normalized representation of one log entry.
///
/// There are no setters: once the pipeline has built an event the query
/// engine and renderers can only select and reorder it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    fields: CanonicalFields,
    shape: ShapeTag,
    raw_fields: RawRecord,
    description: String,
    diagnostics: Vec<NormalizationWarning>,
}

impl Event {
    pub fn new(
        fields: CanonicalFields,
        shape: ShapeTag,
        raw_fields: RawRecord,
        description: String,
        diagnostics: Vec<NormalizationWarning>,
    ) -> Self {
        Self {
            fields,
            shape,
            raw_fields,
            description,
            diagnostics,
        }
    }

    pub fn fields(&self) -> &CanonicalFields {
        &self.fields
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.fields.timestamp
    }

    pub fn event_type(&self) -> &str {
        &self.fields.event_type
    }

    pub fn source_type(&self) -> Option<&str> {
        self.fields.source_type.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.fields.user_id.as_deref()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.fields.device_id.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.fields.severity
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.fields.duration_secs
    }

    pub fn shape(&self) -> ShapeTag {
        self.shape
    }

    pub fn raw_fields(&self) -> &RawRecord {
        &self.raw_fields
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn diagnostics(&self) -> &[NormalizationWarning] {
        &self.diagnostics
    }
}
