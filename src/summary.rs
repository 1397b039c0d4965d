//! Report-level statistics: totals by severity and type plus call outcome
//! figures.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::event::{event_types, Event, Severity};
use crate::field::{as_number, first_value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallStats {
    /// Calls that were actually placed: duration unknown or above zero
    pub attempted: usize,
    pub successful: usize,
    /// Provisional outcomes (SIP 1xx), neither success nor failure
    pub info: usize,
    pub warnings: usize,
    pub failed: usize,
    /// Over every call with a known duration, zero-length ones included
    pub average_duration_secs: Option<f64>,
    pub max_duration_secs: Option<f64>,
    /// Percentage of attempted calls that succeeded, two decimals
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallOutcome {
    Success,
    Info,
    Warning,
    Failed,
}

/// Classify by the SIP response class when the row has one, else by severity.
fn call_outcome(event: &Event) -> CallOutcome {
    let sip_class = first_value(event.raw_fields(), &["Final SIP code"])
        .and_then(as_number)
        .filter(|code| (100.0..700.0).contains(code))
        .map(|code| code as u16 / 100);
    match sip_class {
        Some(1) => CallOutcome::Info,
        Some(2) => CallOutcome::Success,
        Some(3) => CallOutcome::Warning,
        Some(_) => CallOutcome::Failed,
        None => match event.severity() {
            Severity::Info => CallOutcome::Success,
            Severity::Warning => CallOutcome::Warning,
            Severity::Error | Severity::Critical => CallOutcome::Failed,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_events: usize,
    pub by_severity: IndexMap<String, usize>,
    pub by_type: IndexMap<String, usize>,
    pub diagnostics: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<CallStats>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ReportSummary {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut summary = ReportSummary::default();
        for severity in Severity::ALL.iter().rev() {
            summary.by_severity.insert(severity.as_str().to_string(), 0);
        }

        let mut call_events: Vec<&Event> = Vec::new();
        for event in events {
            summary.total_events += 1;
            *summary
                .by_severity
                .entry(event.severity().as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .by_type
                .entry(event.fields().display_type().to_string())
                .or_insert(0) += 1;
            summary.diagnostics += event.diagnostics().len();

            if let Some(ts) = event.timestamp() {
                summary.earliest = Some(summary.earliest.map_or(ts, |e| e.min(ts)));
                summary.latest = Some(summary.latest.map_or(ts, |l| l.max(ts)));
            }

            if event.event_type() == event_types::CALL {
                call_events.push(event);
            }
        }

        if !call_events.is_empty() {
            summary.calls = Some(CallStats::from_calls(&call_events));
        }
        summary
    }
}

impl CallStats {
    fn from_calls(calls: &[&Event]) -> Self {
        let attempted: Vec<&&Event> = calls
            .iter()
            .filter(|e| e.duration_secs().map_or(true, |d| d > 0.0))
            .collect();

        let mut stats = CallStats {
            attempted: attempted.len(),
            ..Default::default()
        };
        for event in &attempted {
            match call_outcome(event) {
                CallOutcome::Success => stats.successful += 1,
                CallOutcome::Info => stats.info += 1,
                CallOutcome::Warning => stats.warnings += 1,
                CallOutcome::Failed => stats.failed += 1,
            }
        }

        let durations: Vec<f64> = calls.iter().filter_map(|e| e.duration_secs()).collect();
        if !durations.is_empty() {
            let total: f64 = durations.iter().sum();
            stats.average_duration_secs = Some(round2(total / durations.len() as f64));
            stats.max_duration_secs = durations.iter().copied().reduce(f64::max);
        }

        if stats.attempted > 0 {
            stats.success_rate =
                round2(stats.successful as f64 / stats.attempted as f64 * 100.0);
        }
        stats
    }
}
