//! Renderer dispatch: one finalized [`Report`] in, formatted output out.

pub mod csv;
pub mod json;
pub mod markdown;
pub mod text;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::ReportError;
use crate::event::{Event, NormalizationWarning, RawRecord, Severity};
use crate::query::{GroupKey, QueryResult};
use crate::summary::ReportSummary;

pub use self::csv::CsvRenderer;
pub use self::json::JsonRenderer;
pub use self::markdown::MarkdownRenderer;
pub use self::text::TextRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[value(name = "markdown", alias = "md", help = "Markdown report with summary tables")]
    Markdown,
    #[value(name = "text", help = "One line per event, colored on a terminal")]
    Text,
    #[value(name = "json", help = "Pretty-printed JSON document")]
    Json,
    #[value(name = "csv", help = "Comma-separated values, one row per event")]
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Trait for writing a whole report in one format
pub trait Renderer {
    fn render(
        &self,
        report: &Report<'_>,
        verbose: bool,
        out: &mut dyn Write,
    ) -> Result<(), ReportError>;
}

/// A query result plus its summary, ready to render.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub title: String,
    pub summary: ReportSummary,
    pub group_key: Option<GroupKey>,
    pub groups: IndexMap<String, Vec<&'a Event>>,
}

impl<'a> Report<'a> {
    pub fn new(title: impl Into<String>, result: QueryResult<'a>) -> Self {
        let summary = ReportSummary::from_events(result.events());
        Report {
            title: title.into(),
            summary,
            group_key: result.group_key,
            groups: result.groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_events == 0
    }

    pub fn events(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.groups.values().flat_map(|group| group.iter().copied())
    }

    /// Heading for a group, or `None` when the report is ungrouped.
    pub fn group_heading(&self, label: &str) -> Option<String> {
        self.group_key.map(|key| format!("{}: {}", key, label))
    }
}

/// What a renderer may show of one event. Raw fields and diagnostics are
/// only filled in for verbose output.
#[derive(Debug, Clone, Serialize)]
pub struct EventView<'a> {
    pub timestamp: Option<String>,
    pub event_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub device_id: Option<&'a str>,
    pub severity: Severity,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<&'a RawRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<&'a [NormalizationWarning]>,
}

impl<'a> EventView<'a> {
    pub fn new(event: &'a Event, verbose: bool) -> Self {
        EventView {
            timestamp: event.fields().timestamp_string(),
            event_type: event.event_type(),
            source_type: event
                .source_type()
                .filter(|source| *source != event.event_type()),
            user_id: event.user_id(),
            device_id: event.device_id(),
            severity: event.severity(),
            description: event.description(),
            shape: verbose.then(|| event.shape().as_str()),
            raw: verbose.then(|| event.raw_fields()),
            diagnostics: verbose.then(|| event.diagnostics()),
        }
    }

    pub fn timestamp_or_dash(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("-")
    }
}

/// Renderer for `format`. Only the text renderer uses `colors`.
pub fn renderer_for(format: OutputFormat, colors: bool) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Markdown => Box::new(MarkdownRenderer),
        OutputFormat::Text => Box::new(TextRenderer::new(colors)),
        OutputFormat::Json => Box::new(JsonRenderer),
        OutputFormat::Csv => Box::new(CsvRenderer),
    }
}

/// Render `report` in `format` without colors.
pub fn render(
    report: &Report<'_>,
    format: OutputFormat,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    renderer_for(format, false).render(report, verbose, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EventPipeline;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn test_event_view_hides_raw_unless_verbose() {
        let pipeline = EventPipeline::default();
        let event = pipeline.process(
            json!({"type": "CallFailed", "time": "2026-01-10T14:32:00Z", "secret": "x"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let quiet = serde_json::to_value(EventView::new(&event, false)).unwrap();
        assert!(quiet.get("raw").is_none());
        assert!(quiet.get("diagnostics").is_none());
        assert_eq!(quiet["source_type"], "CallFailed");

        let verbose = serde_json::to_value(EventView::new(&event, true)).unwrap();
        assert_eq!(verbose["raw"]["secret"], "x");
        assert_eq!(verbose["shape"], "teams-csv-flat");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("MD".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_report_from_query() {
        let pipeline = EventPipeline::default();
        let events: Vec<Event> = (0..3)
            .map(|i| {
                pipeline.process(
                    json!({"type": "SignIn", "user": format!("u{}@x.com", i % 2), "time": "2026-01-10T10:00:00Z"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
            })
            .collect();
        let query = Query {
            group_by: Some(GroupKey::User),
            ..Default::default()
        };
        let report = Report::new("Test", query.run(&events).unwrap());
        assert_eq!(report.summary.total_events, 3);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.group_heading("u0@x.com").unwrap(), "user: u0@x.com");
    }
}
