use serde::Serialize;
use std::io::Write;

use super::{EventView, Renderer, Report};
use crate::error::ReportError;
use crate::summary::ReportSummary;

/// Pretty-printed `{title, summary, groups: [{key, events}]}` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_by: Option<&'static str>,
    summary: &'a ReportSummary,
    groups: Vec<JsonGroup<'a>>,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    key: Option<&'a str>,
    count: usize,
    events: Vec<EventView<'a>>,
}

impl Renderer for JsonRenderer {
    fn render(
        &self,
        report: &Report<'_>,
        verbose: bool,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let groups = report
            .groups
            .iter()
            .map(|(label, events)| JsonGroup {
                key: report.group_key.map(|_| label.as_str()),
                count: events.len(),
                events: events.iter().map(|e| EventView::new(e, verbose)).collect(),
            })
            .collect();

        let document = JsonReport {
            title: &report.title,
            group_by: report.group_key.map(|key| key.as_str()),
            summary: &report.summary,
            groups,
        };

        serde_json::to_writer_pretty(&mut *out, &document)
            .map_err(|e| ReportError::RenderError(format!("JSON encoding error: {}", e)))?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::pipeline::EventPipeline;
    use crate::query::{GroupKey, Query};
    use serde_json::{json, Value};

    #[test]
    fn test_json_document() {
        let pipeline = EventPipeline::default();
        let events: Vec<Event> = vec![
            json!({"type": "DeviceRegistered", "user": "carol@contoso.com", "device": "Poly CCX 500", "time": "2026-01-10T08:00:00Z"}),
            json!({"type": "SignIn", "user": "carol@contoso.com", "time": "2026-01-10T09:00:00Z"}),
        ]
        .into_iter()
        .map(|v| pipeline.process(v.as_object().cloned().unwrap()))
        .collect();
        let query = Query {
            group_by: Some(GroupKey::Type),
            ..Default::default()
        };
        let report = Report::new("Devices", query.run(&events).unwrap());

        let mut out = Vec::new();
        JsonRenderer.render(&report, false, &mut out).unwrap();
        let doc: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(doc["title"], "Devices");
        assert_eq!(doc["group_by"], "type");
        assert_eq!(doc["summary"]["total_events"], 2);
        assert_eq!(doc["groups"][0]["key"], "DeviceRegistration");
        assert_eq!(doc["groups"][0]["events"][0]["severity"], "info");
        assert_eq!(
            doc["groups"][0]["events"][0]["description"],
            "Device Poly CCX 500 registered for carol@contoso.com."
        );
        assert!(doc["groups"][0]["events"][0].get("raw").is_none());
    }
}
