use indexmap::IndexSet;
use serde_json::Value;
use std::io::Write;

use super::{EventView, Renderer, Report};
use crate::error::ReportError;
use crate::flatten::flatten_record;

const BASE_COLUMNS: &[&str] = &[
    "timestamp",
    "severity",
    "event_type",
    "source_type",
    "user_id",
    "device_id",
    "description",
];

/// One row per event. Verbose output appends a `diagnostics` column and the
/// flattened raw fields as `raw.*` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Renderer for CsvRenderer {
    fn render(
        &self,
        report: &Report<'_>,
        verbose: bool,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let grouped = report.group_key.is_some();

        // Flattened raw columns: union over all events, first-seen order
        let flattened: Vec<serde_json::Map<String, Value>> = if verbose {
            report.events().map(|e| flatten_record(e.raw_fields())).collect()
        } else {
            Vec::new()
        };
        let raw_columns: IndexSet<&str> = flattened
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        let mut writer = ::csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(&mut *out);

        let mut header: Vec<String> = Vec::new();
        if grouped {
            header.push("group".to_string());
        }
        header.extend(BASE_COLUMNS.iter().map(|c| c.to_string()));
        if verbose {
            header.push("diagnostics".to_string());
            header.extend(raw_columns.iter().map(|c| format!("raw.{}", c)));
        }
        writer.write_record(&header)?;

        let mut flat_rows = flattened.iter();
        for (label, events) in &report.groups {
            for event in events {
                let view = EventView::new(event, verbose);
                let mut row: Vec<String> = Vec::with_capacity(header.len());
                if grouped {
                    row.push(label.clone());
                }
                row.push(view.timestamp.clone().unwrap_or_default());
                row.push(view.severity.to_string());
                row.push(view.event_type.to_string());
                row.push(view.source_type.unwrap_or_default().to_string());
                row.push(view.user_id.unwrap_or_default().to_string());
                row.push(view.device_id.unwrap_or_default().to_string());
                row.push(view.description.to_string());

                if verbose {
                    let diagnostics: Vec<String> = view
                        .diagnostics
                        .unwrap_or_default()
                        .iter()
                        .map(|w| w.to_string())
                        .collect();
                    row.push(diagnostics.join("; "));

                    let flat = flat_rows.next();
                    for column in &raw_columns {
                        row.push(
                            flat.and_then(|f| f.get(*column))
                                .map(value_to_cell)
                                .unwrap_or_default(),
                        );
                    }
                }
                writer.write_record(&row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
