//! Field normalization: raw record + shape tag → partial canonical fields.
//!
//! Each shape has an extraction table of fallback key lists (try the first
//! key, else the next, else leave the field absent). Nothing in here fails;
//! data-quality problems become [`NormalizationWarning`]s.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::event::{event_types, NormalizationWarning, RawRecord, Severity};
use crate::field::{as_number, first_string, first_value, scalar_string};
use crate::input_format::PARSE_ERROR_KEY;
use crate::schema::{ShapeTag, TIME_KEYS, TYPE_KEYS};
use crate::severity::{sip_severity, SeverityMap};
use crate::timestamp;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Fallback key lists for one shape.
struct ExtractionRules {
    time: &'static [&'static str],
    event_type: &'static [&'static str],
    user: &'static [&'static str],
    device: &'static [&'static str],
    severity: &'static [&'static str],
    duration: &'static [&'static str],
    /// (date, time of day) column pairs tried before `time`.
    split_time: &'static [(&'static str, &'static str)],
}

const SPLIT_DATE_TIME: &[(&str, &str)] = &[("Date", "Time"), ("Start date", "Start time")];

const PSTN_RULES: ExtractionRules = ExtractionRules {
    time: &["Start time", "Start Time (UTC)", "Start time (UTC)", "Date"],
    event_type: &["Call type", "Call Type"],
    user: &[
        "UPN",
        "User principal name",
        "User Principal Name",
        "User",
        "Display Name",
    ],
    device: &["Device", "Device name", "Client", "User agent"],
    severity: &[],
    duration: &["Duration (seconds)", "Duration", "Duration (s)"],
    split_time: &[("Date", "Time")],
};

const JSON_V1_RULES: ExtractionRules = ExtractionRules {
    time: &["eventDateTime", "timestamp", "createdDateTime", "time"],
    event_type: &["eventType", "activityType"],
    user: &[
        "actor.userPrincipalName",
        "actor.email",
        "actor.upn",
        "actor.id",
        "userId",
        "user",
    ],
    device: &[
        "device.displayName",
        "device.name",
        "device.model",
        "device.id",
        "properties.deviceName",
        "properties.device",
        "deviceId",
    ],
    severity: &["severity", "properties.severity", "level"],
    duration: &[
        "properties.durationSeconds",
        "properties.duration",
        "durationSeconds",
        "duration",
    ],
    split_time: &[],
};

const AUDIT_RULES: ExtractionRules = ExtractionRules {
    time: &["CreationTime"],
    event_type: &["Operation"],
    user: &["UserId", "UserKey"],
    device: &["DeviceName", "DeviceId", "DeviceProperties.Name"],
    severity: &["Severity", "ResultStatus"],
    duration: &[],
    split_time: &[],
};

const FLAT_RULES: ExtractionRules = ExtractionRules {
    time: TIME_KEYS,
    event_type: TYPE_KEYS,
    user: &[
        "user",
        "userId",
        "user_id",
        "upn",
        "userPrincipalName",
        "email",
        "actor",
    ],
    device: &["device", "deviceId", "device_id", "deviceName", "device_name"],
    severity: &["severity", "level", "status", "result"],
    duration: &["duration", "durationSeconds", "duration_secs", "Duration (seconds)"],
    split_time: SPLIT_DATE_TIME,
};

/// Generic aliases scanned when no shape matched.
const GENERIC_RULES: ExtractionRules = ExtractionRules {
    time: &[
        "time",
        "timestamp",
        "eventDateTime",
        "createdDateTime",
        "CreationTime",
        "Start time",
        "date",
        "datetime",
        "@timestamp",
        "ts",
    ],
    event_type: TYPE_KEYS,
    user: &[
        "user",
        "userId",
        "email",
        "actor",
        "upn",
        "userPrincipalName",
        "user_id",
        "actor.userPrincipalName",
        "actor.email",
    ],
    device: &["device", "deviceId", "deviceName", "device_id"],
    severity: &["severity", "level", "status"],
    duration: &["duration", "durationSeconds"],
    split_time: SPLIT_DATE_TIME,
};

fn rules_for(shape: ShapeTag) -> &'static ExtractionRules {
    match shape {
        ShapeTag::TeamsPstnCall => &PSTN_RULES,
        ShapeTag::TeamsJsonV1 => &JSON_V1_RULES,
        ShapeTag::TeamsAuditFlat => &AUDIT_RULES,
        ShapeTag::TeamsCsvFlat => &FLAT_RULES,
        ShapeTag::Unknown => &GENERIC_RULES,
    }
}

/// Partial canonical record produced by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFields {
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub source_type: Option<String>,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub severity: Option<Severity>,
    pub duration_secs: Option<f64>,
    pub warnings: Vec<NormalizationWarning>,
}

/// Extract canonical fields from a raw record of a known (or unknown) shape.
pub fn normalize(record: &RawRecord, shape: ShapeTag, severity_map: &SeverityMap) -> NormalizedFields {
    let rules = rules_for(shape);
    let mut out = NormalizedFields::default();

    if let Some(Value::String(message)) = record.get(PARSE_ERROR_KEY) {
        out.warnings.push(NormalizationWarning::new(
            "input",
            format!("line could not be parsed: {}", message),
        ));
    }

    extract_timestamp(record, rules, &mut out);

    out.user_id = first_string(record, rules.user);
    if out.user_id.is_none() && shape == ShapeTag::Unknown {
        out.user_id = find_email_value(record);
    }
    out.device_id = first_string(record, rules.device);

    let implied_severity = if shape == ShapeTag::TeamsPstnCall {
        out.event_type = Some(event_types::CALL.to_string());
        out.source_type = first_string(record, rules.event_type);
        sip_code_severity(record, &mut out.warnings)
    } else {
        match first_string(record, rules.event_type) {
            // No shape matched: keep the literal but never map it
            Some(raw_type) if shape == ShapeTag::Unknown => {
                out.event_type = Some(event_types::UNKNOWN.to_string());
                out.source_type = Some(raw_type);
                None
            }
            Some(raw_type) => {
                let (canonical, implied) = canonical_type(&raw_type);
                out.event_type = Some(canonical.to_string());
                out.source_type = Some(raw_type);
                implied
            }
            None => None,
        }
    };

    out.severity = explicit_severity(record, rules, severity_map, &mut out.warnings)
        .or(implied_severity);

    if let Some(value) = first_value(record, rules.duration) {
        match as_number(value) {
            Some(secs) if secs >= 0.0 => out.duration_secs = Some(secs),
            _ => out.warnings.push(NormalizationWarning::new(
                "duration",
                format!("could not parse duration '{}'", display_value(value)),
            )),
        }
    }

    out
}

fn extract_timestamp(record: &RawRecord, rules: &ExtractionRules, out: &mut NormalizedFields) {
    for (date_key, time_key) in rules.split_time {
        let date = first_string(record, &[*date_key]);
        let time = first_string(record, &[*time_key]);
        if let (Some(date), Some(time)) = (date, time) {
            if let Some(ts) = timestamp::combine_date_time(&date, &time) {
                out.timestamp = Some(ts);
                return;
            }
        }
    }

    match first_value(record, rules.time) {
        Some(value) => match timestamp::parse_value(value) {
            Some(ts) => out.timestamp = Some(ts),
            None => out.warnings.push(NormalizationWarning::new(
                "timestamp",
                format!("could not parse timestamp '{}'", display_value(value)),
            )),
        },
        None => out
            .warnings
            .push(NormalizationWarning::new("timestamp", "no timestamp field found")),
    }
}

fn explicit_severity(
    record: &RawRecord,
    rules: &ExtractionRules,
    severity_map: &SeverityMap,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<Severity> {
    let label = first_string(record, rules.severity)?;
    let resolved = severity_map.resolve(&label);
    if resolved.is_none() {
        warnings.push(NormalizationWarning::new(
            "severity",
            format!("unrecognized severity label '{}'", label),
        ));
    }
    resolved
}

fn sip_code_severity(record: &RawRecord, warnings: &mut Vec<NormalizationWarning>) -> Option<Severity> {
    let value = first_value(record, &["Final SIP code"])?;
    match as_number(value) {
        Some(code) if (100.0..700.0).contains(&code) => Some(sip_severity(code as u16)),
        _ => {
            warnings.push(NormalizationWarning::new(
                "sip_code",
                format!("could not parse SIP code '{}'", display_value(value)),
            ));
            None
        }
    }
}

fn find_email_value(record: &RawRecord) -> Option<String> {
    record.values().find_map(|v| match v {
        Value::String(s) if EMAIL_REGEX.is_match(s.trim()) => Some(s.trim().to_string()),
        _ => None,
    })
}

fn display_value(value: &Value) -> String {
    scalar_string(value).unwrap_or_else(|| value.to_string())
}

/// Map a raw export type onto the canonical taxonomy.
///
/// Returns the canonical type and, for types that encode an outcome
/// (`CallFailed`), the severity they imply. Unrecognized types map to
/// `Unknown`.
pub fn canonical_type(raw_type: &str) -> (&'static str, Option<Severity>) {
    let key: String = raw_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    match key.as_str() {
        "call" | "callstarted" | "callended" | "callsucceeded" | "callcompleted"
        | "callconnected" | "pstncall" => (event_types::CALL, None),
        "callfailed" | "calldropped" | "callrejected" => {
            (event_types::CALL, Some(Severity::Error))
        }
        "callqualitypoor" | "poorcallquality" | "callqualitywarning" => {
            (event_types::CALL, Some(Severity::Warning))
        }
        "signin" | "signinsucceeded" | "userloggedin" | "login" | "userlogin" => {
            (event_types::SIGN_IN, None)
        }
        "signinfailed" | "userloginfailed" | "loginfailed" => {
            (event_types::SIGN_IN, Some(Severity::Error))
        }
        "policychange" | "policychanged" | "policyupdate" | "policyupdated"
        | "policyassigned" | "updatepolicy" => (event_types::POLICY_CHANGE, None),
        "deviceregistration" | "deviceregistered" | "registerdevice" | "adddevice"
        | "deviceenrolled" => (event_types::DEVICE_REGISTRATION, None),
        // Teams PowerShell cmdlets as they appear in the audit log
        k if is_policy_cmdlet(k) => (event_types::POLICY_CHANGE, Some(Severity::Warning)),
        _ => (event_types::UNKNOWN, None),
    }
}

fn is_policy_cmdlet(key: &str) -> bool {
    ["setcs", "grantcs", "newcs", "removecs"]
        .iter()
        .any(|prefix| key.starts_with(prefix))
        && key.contains("policy")
}
