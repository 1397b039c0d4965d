use std::io::Write;
use terminal_size::{terminal_size, Width};

use super::{EventView, Renderer, Report};
use crate::colors::ColorScheme;
use crate::error::ReportError;

/// Plain text: one line per event, group headers ruled to terminal width.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    colors: ColorScheme,
    width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TextRenderer {
    pub fn new(use_colors: bool) -> Self {
        // Get terminal width, default to 80 if not available
        let width = if let Some((Width(w), _)) = terminal_size() {
            w as usize
        } else {
            80
        };
        Self {
            colors: ColorScheme::new(use_colors),
            width,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(20);
        self
    }

    fn rule(&self, heading: &str) -> String {
        let used = heading.chars().count() + 4;
        let fill = self.width.saturating_sub(used).max(3);
        format!("── {} {}", heading, "─".repeat(fill))
    }

    fn write_event(&self, view: &EventView<'_>, out: &mut dyn Write) -> Result<(), ReportError> {
        let c = &self.colors;
        let severity = format!("{:<8}", view.severity);
        writeln!(
            out,
            "{}{:<20}{} {}{}{} {}{:<18}{} {}{}{} {}",
            c.timestamp,
            view.timestamp_or_dash(),
            c.reset,
            c.severity(view.severity),
            severity,
            c.reset,
            c.event_type,
            view.source_type.unwrap_or(view.event_type),
            c.reset,
            c.user,
            view.user_id.unwrap_or("-"),
            c.reset,
            view.description
        )?;

        if let Some(diagnostics) = view.diagnostics {
            for warning in diagnostics {
                writeln!(out, "    {}! {}{}", c.severity_warning, warning, c.reset)?;
            }
        }
        if let Some(raw) = view.raw {
            let text = serde_json::to_string(raw)
                .map_err(|e| ReportError::RenderError(format!("JSON encoding error: {}", e)))?;
            writeln!(out, "    {}{}{}", c.dim, text, c.reset)?;
        }
        Ok(())
    }
}

impl Renderer for TextRenderer {
    fn render(
        &self,
        report: &Report<'_>,
        verbose: bool,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let c = &self.colors;
        for (label, events) in &report.groups {
            if let Some(heading) = report.group_heading(label) {
                writeln!(
                    out,
                    "{}{}{}",
                    c.header,
                    self.rule(&format!("{} ({})", heading, events.len())),
                    c.reset
                )?;
            }
            for event in events {
                self.write_event(&EventView::new(event, verbose), out)?;
            }
        }

        let summary = &report.summary;
        let counts: Vec<String> = summary
            .by_severity
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(severity, count)| format!("{} {}", count, severity))
            .collect();
        if counts.is_empty() {
            writeln!(out, "{}0 events{}", c.dim, c.reset)?;
        } else {
            writeln!(
                out,
                "{}{} events ({}){}",
                c.dim,
                summary.total_events,
                counts.join(", "),
                c.reset
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::pipeline::EventPipeline;
    use crate::query::{GroupKey, Query};
    use serde_json::json;

    fn events() -> Vec<Event> {
        let pipeline = EventPipeline::default();
        vec![
            json!({"type": "CallFailed", "user": "alice@example.com", "time": "2026-01-10T14:32:00Z"}),
            json!({"type": "SignIn", "user": "bob@example.com", "time": "2026-01-10T09:00:00Z"}),
        ]
        .into_iter()
        .map(|v| pipeline.process(v.as_object().cloned().unwrap()))
        .collect()
    }

    #[test]
    fn test_one_line_per_event() {
        let events = events();
        let report = Report::new("t", Query::default().run(&events).unwrap());
        let mut out = Vec::new();
        TextRenderer::new(false)
            .render(&report, false, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("2026-01-10T09:00:00Z"));
        assert!(lines[1].contains("ERROR"));
        assert!(lines[1].contains("CallFailed"));
        assert_eq!(lines[2], "2 events (1 error, 1 info)");
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_group_rules() {
        let events = events();
        let query = Query {
            group_by: Some(GroupKey::User),
            ..Default::default()
        };
        let report = Report::new("t", query.run(&events).unwrap());
        let mut out = Vec::new();
        TextRenderer::new(false)
            .with_width(40)
            .render(&report, false, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("── user: bob@example.com (1) ─"));
        assert!(text.contains("── user: alice@example.com (1) ─"));
    }

    #[test]
    fn test_colors() {
        let events = events();
        let report = Report::new("t", Query::default().run(&events).unwrap());
        let mut out = Vec::new();
        TextRenderer::new(true)
            .render(&report, false, &mut out)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\x1b[31m"));
    }
}
