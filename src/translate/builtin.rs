//! Built-in translators for the canonical event types.
//!
//! Each one is a plain function so it can be registered, replaced, or called
//! directly. They read type-specific detail from the raw record and never
//! touch the event itself.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::sip;
use crate::event::{CanonicalFields, RawRecord, Severity};
use crate::field::{as_number, first_string, first_value};

static AADSTS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:AADSTS)?(\d{5,6})$").unwrap());

/// Reason code → (plain explanation, suggestion).
static CALL_REASONS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    let mut reasons = HashMap::new();
    reasons.insert(
        "ICE_TIMEOUT",
        (
            "ICE negotiation timeout",
            "check that UDP 3478-3481 is open towards the Teams media relays and that no proxy inspects media traffic",
        ),
    );
    reasons.insert(
        "MEDIA_TIMEOUT",
        (
            "media stopped flowing during the call",
            "check the user's network for packet loss or a VPN that drops UDP",
        ),
    );
    reasons.insert(
        "NETWORK_UNREACHABLE",
        (
            "the Teams service could not be reached",
            "verify DNS resolution and outbound HTTPS connectivity from the device",
        ),
    );
    reasons.insert(
        "NO_ANSWER",
        (
            "the callee did not answer",
            "no action needed unless this repeats for the same callee",
        ),
    );
    reasons.insert(
        "BUSY",
        ("the callee was busy", "retry the call later"),
    );
    reasons.insert(
        "DECLINED",
        (
            "the callee declined the call",
            "no action needed",
        ),
    );
    reasons.insert(
        "CODEC_MISMATCH",
        (
            "no common audio codec could be negotiated",
            "update the device firmware or the SBC codec configuration",
        ),
    );
    reasons.insert(
        "DEVICE_ERROR",
        (
            "the audio device reported an error",
            "reconnect or replace the headset/handset and update its firmware",
        ),
    );
    reasons.insert(
        "AUTH_EXPIRED",
        (
            "the device's sign-in token expired",
            "sign the device out and back in",
        ),
    );
    reasons.insert(
        "POOR_NETWORK",
        (
            "network quality was too poor to sustain the call",
            "review jitter and packet loss for the user's site in Call Quality Dashboard",
        ),
    );
    reasons
});

/// Entra ID sign-in error codes → (reason, suggestion).
static SIGN_IN_REASONS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    let mut reasons = HashMap::new();
    reasons.insert(
        "50126",
        (
            "invalid username or password",
            "confirm the user is typing the right credentials; reset the password if needed",
        ),
    );
    reasons.insert(
        "50053",
        (
            "account locked after too many failed attempts",
            "wait for the lockout to expire or check for a password-spray attempt",
        ),
    );
    reasons.insert(
        "50057",
        ("user account is disabled", "re-enable the account if the user should have access"),
    );
    reasons.insert(
        "50055",
        ("password has expired", "have the user change their password"),
    );
    reasons.insert(
        "50076",
        (
            "multi-factor authentication required",
            "make sure the user has registered an MFA method",
        ),
    );
    reasons.insert(
        "50079",
        (
            "MFA registration required",
            "ask the user to complete MFA registration",
        ),
    );
    reasons.insert(
        "53003",
        (
            "blocked by Conditional Access",
            "review which Conditional Access policy applied in the sign-in log",
        ),
    );
    reasons.insert(
        "INVALID_PASSWORD",
        (
            "invalid username or password",
            "confirm the user is typing the right credentials; reset the password if needed",
        ),
    );
    reasons.insert(
        "MFA_REQUIRED",
        (
            "multi-factor authentication required",
            "make sure the user has registered an MFA method",
        ),
    );
    reasons.insert(
        "ACCOUNT_LOCKED",
        (
            "account locked after too many failed attempts",
            "wait for the lockout to expire or check for a password-spray attempt",
        ),
    );
    reasons
});

const CALL_REASON_KEYS: &[&str] = &[
    "reason",
    "reasonCode",
    "failureReason",
    "callEndReason",
    "properties.reason",
    "properties.reasonCode",
    "properties.failureReason",
];

const SIGN_IN_REASON_KEYS: &[&str] = &[
    "reason",
    "failureReason",
    "errorCode",
    "status.errorCode",
    "properties.errorCode",
    "properties.reason",
    "LogonError",
    "ErrorNumber",
];

fn user_of(fields: &CanonicalFields) -> &str {
    fields.user_id.as_deref().unwrap_or("unknown user")
}

fn on_device(fields: &CanonicalFields) -> String {
    fields
        .device_id
        .as_deref()
        .map(|d| format!(" on {}", d))
        .unwrap_or_default()
}

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    if total >= 60 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}s", total)
    }
}

/// Call outcome with a diagnostic suggestion.
pub fn call(fields: &CanonicalFields, raw: &RawRecord) -> String {
    if first_value(raw, &["Final SIP code"]).is_some() {
        return pstn_call(fields, raw);
    }

    let user = user_of(fields);
    let device = on_device(fields);
    let reason = first_string(raw, CALL_REASON_KEYS);
    let explained = reason
        .as_deref()
        .and_then(|code| CALL_REASONS.get(code.trim().to_uppercase().as_str()));

    match fields.severity {
        Severity::Error | Severity::Critical => match (explained, reason.as_deref()) {
            (Some((text, suggestion)), _) => format!(
                "Call failed for {}{}: {}. Suggestion: {}.",
                user, device, text, suggestion
            ),
            (None, Some(code)) => format!("Call failed for {}{}: reason {}.", user, device, code),
            (None, None) => format!("Call failed for {}{}.", user, device),
        },
        Severity::Warning => match (explained, reason.as_deref()) {
            (Some((text, suggestion)), _) => format!(
                "Call quality degraded for {}{}: {}. Suggestion: {}.",
                user, device, text, suggestion
            ),
            (None, Some(code)) => {
                format!("Call quality degraded for {}{}: {}.", user, device, code)
            }
            (None, None) => format!("Call quality degraded for {}{}.", user, device),
        },
        Severity::Info => match fields.duration_secs {
            Some(secs) => format!(
                "Call by {}{} completed after {}.",
                user,
                device,
                format_duration(secs)
            ),
            None => format!("Call by {}{} completed.", user, device),
        },
    }
}

fn pstn_call(fields: &CanonicalFields, raw: &RawRecord) -> String {
    let user = user_of(fields);
    let code = first_value(raw, &["Final SIP code"])
        .and_then(as_number)
        .map(|c| c as u16);
    let subcode = first_value(raw, &["Final Microsoft subcode"])
        .and_then(as_number)
        .map(|c| c as u32)
        .unwrap_or(0);
    let phrase = first_string(raw, &["Final SIP Phrase"]).unwrap_or_default();

    let Some(code) = code else {
        return format!("PSTN call by {} with an unreadable SIP code.", user);
    };

    let explanation = sip::explain_code(code);
    let simple = explanation.map(|e| e.simple).unwrap_or("Unknown SIP code.");

    if fields.severity == Severity::Info {
        let duration = fields
            .duration_secs
            .map(|secs| format!(", {}", format_duration(secs)))
            .unwrap_or_default();
        return format!(
            "PSTN call by {}{}: {} (SIP {} {}{})",
            user,
            on_device(fields),
            simple,
            code,
            phrase,
            duration
        );
    }

    let detailed = explanation
        .map(|e| e.detailed)
        .unwrap_or("No detailed explanation available");
    let sub = sip::explain_subcode(subcode);
    format!(
        "PSTN call by {}{}: {} SIP {} {} - {}. Microsoft subcode {} - {}. Cause: {}. Suggestion: {}",
        user,
        on_device(fields),
        simple,
        code,
        phrase,
        detailed,
        subcode,
        sub.description,
        sub.cause,
        sub.resolution
    )
}

/// Policy change with actor and target.
pub fn policy_change(fields: &CanonicalFields, raw: &RawRecord) -> String {
    let actor = fields.user_id.as_deref().unwrap_or("An administrator");
    let policy = first_string(
        raw,
        &[
            "policyName",
            "policy",
            "properties.policyName",
            "properties.policy",
            "PolicyName",
        ],
    )
    .or_else(|| {
        fields
            .source_type
            .clone()
            .filter(|source| source != &fields.event_type)
    });
    let target = first_string(
        raw,
        &[
            "target.userPrincipalName",
            "target.displayName",
            "target.id",
            "targetUser",
            "target",
            "properties.target",
            "ObjectId",
        ],
    );
    let old_value = first_string(raw, &["oldValue", "properties.oldValue"]);
    let new_value = first_string(raw, &["newValue", "properties.newValue"]);

    let mut text = match policy {
        Some(policy) => format!("{} changed policy '{}'", actor, policy),
        None => format!("{} changed a policy", actor),
    };
    if let Some(target) = target {
        text.push_str(&format!(" for {}", target));
    }
    match (old_value, new_value) {
        (Some(old), Some(new)) => text.push_str(&format!(" from '{}' to '{}'", old, new)),
        (None, Some(new)) => text.push_str(&format!(" to '{}'", new)),
        _ => {}
    }
    text.push('.');
    text
}

/// Sign-in success or failure with reason and suggestion.
pub fn sign_in(fields: &CanonicalFields, raw: &RawRecord) -> String {
    let user = user_of(fields);
    let reason = first_string(raw, SIGN_IN_REASON_KEYS);

    if fields.severity < Severity::Error {
        let origin = first_string(raw, &["ipAddress", "ClientIP", "clientIp", "ip"])
            .map(|ip| format!(" from {}", ip))
            .unwrap_or_default();
        return format!("{} signed in{}{}.", user, on_device(fields), origin);
    }

    let explained = reason.as_deref().and_then(|code| {
        let code = code.trim();
        let key = AADSTS_REGEX
            .captures(code)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| code.to_uppercase());
        SIGN_IN_REASONS.get(key.as_str())
    });

    match (explained, reason) {
        (Some((text, suggestion)), _) => format!(
            "Sign-in failed for {}: {}. Suggestion: {}.",
            user, text, suggestion
        ),
        (None, Some(code)) => format!("Sign-in failed for {}: {}.", user, code),
        (None, None) => format!("Sign-in failed for {}.", user),
    }
}

/// Device registration with device, user and platform.
pub fn device_registration(fields: &CanonicalFields, raw: &RawRecord) -> String {
    let device = fields.device_id.as_deref().unwrap_or("Unknown device");
    let platform = first_string(
        raw,
        &[
            "platform",
            "os",
            "operatingSystem",
            "device.operatingSystem",
            "properties.os",
        ],
    );
    let mut text = format!("Device {} registered", device);
    if let Some(user) = fields.user_id.as_deref() {
        text.push_str(&format!(" for {}", user));
    }
    if let Some(platform) = platform {
        text.push_str(&format!(" ({})", platform));
    }
    text.push('.');
    text
}
