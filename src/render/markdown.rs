use std::io::Write;

use super::{EventView, Renderer, Report};
use crate::error::ReportError;
use crate::summary::ReportSummary;

/// Markdown report: summary tables, then one event table per group.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

/// Escape a value for a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

fn format_secs(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{:.0}s", secs)
    } else {
        format!("{:.2}s", secs)
    }
}

impl MarkdownRenderer {
    fn write_summary(
        &self,
        summary: &ReportSummary,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(out, "| Metric | Value |")?;
        writeln!(out, "|---|---|")?;
        writeln!(out, "| Total events | {} |", summary.total_events)?;
        if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
            writeln!(
                out,
                "| Time span | {} to {} |",
                earliest.format("%Y-%m-%d %H:%M:%S UTC"),
                latest.format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        }
        writeln!(out, "| Diagnostics | {} |", summary.diagnostics)?;
        writeln!(out)?;

        writeln!(out, "| Severity | Count |")?;
        writeln!(out, "|---|---|")?;
        for (severity, count) in &summary.by_severity {
            writeln!(out, "| {} | {} |", severity, count)?;
        }
        writeln!(out)?;

        writeln!(out, "| Event type | Count |")?;
        writeln!(out, "|---|---|")?;
        for (event_type, count) in &summary.by_type {
            writeln!(out, "| {} | {} |", cell(event_type), count)?;
        }
        writeln!(out)?;

        if let Some(calls) = &summary.calls {
            writeln!(out, "### Call statistics")?;
            writeln!(out)?;
            writeln!(out, "| Metric | Value |")?;
            writeln!(out, "|---|---|")?;
            writeln!(out, "| Attempted calls | {} |", calls.attempted)?;
            writeln!(out, "| Successful | {} |", calls.successful)?;
            writeln!(out, "| Info (1xx) | {} |", calls.info)?;
            writeln!(out, "| With warnings | {} |", calls.warnings)?;
            writeln!(out, "| Failed | {} |", calls.failed)?;
            writeln!(out, "| Success rate | {:.2}% |", calls.success_rate)?;
            if let Some(avg) = calls.average_duration_secs {
                writeln!(out, "| Average duration | {} |", format_secs(avg))?;
            }
            if let Some(max) = calls.max_duration_secs {
                writeln!(out, "| Longest call | {} |", format_secs(max))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_details(&self, views: &[EventView<'_>], out: &mut dyn Write) -> Result<(), ReportError> {
        writeln!(out, "<details><summary>Raw fields</summary>")?;
        writeln!(out)?;
        for view in views {
            let detail = serde_json::json!({
                "timestamp": view.timestamp,
                "event_type": view.event_type,
                "shape": view.shape,
                "raw": view.raw,
                "diagnostics": view.diagnostics,
            });
            let text = serde_json::to_string_pretty(&detail)
                .map_err(|e| ReportError::RenderError(format!("JSON encoding error: {}", e)))?;
            writeln!(out, "```json")?;
            writeln!(out, "{}", text)?;
            writeln!(out, "```")?;
            writeln!(out)?;
        }
        writeln!(out, "</details>")?;
        writeln!(out)?;
        Ok(())
    }
}

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        report: &Report<'_>,
        verbose: bool,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        writeln!(out, "# {}", report.title)?;
        writeln!(out)?;
        self.write_summary(&report.summary, out)?;

        if report.is_empty() {
            writeln!(out, "_No events matched._")?;
            return Ok(());
        }

        for (label, events) in &report.groups {
            match report.group_heading(label) {
                Some(heading) => writeln!(out, "## {} ({})", cell(&heading), events.len())?,
                None => writeln!(out, "## Events")?,
            }
            writeln!(out)?;
            writeln!(out, "| Time | Severity | Type | User | Device | Description |")?;
            writeln!(out, "|---|---|---|---|---|---|")?;

            let views: Vec<EventView<'_>> =
                events.iter().map(|e| EventView::new(e, verbose)).collect();
            for view in &views {
                let event_type = match view.source_type {
                    Some(source) => format!("{} ({})", view.event_type, source),
                    None => view.event_type.to_string(),
                };
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    view.timestamp_or_dash(),
                    view.severity,
                    cell(&event_type),
                    cell(view.user_id.unwrap_or("-")),
                    cell(view.device_id.unwrap_or("-")),
                    cell(view.description)
                )?;
            }
            writeln!(out)?;

            if verbose {
                self.write_details(&views, out)?;
            }
        }
        Ok(())
    }
}
