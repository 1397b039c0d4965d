// src/input_format.rs - raw record readers for the supported export formats

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::ReportError;
use crate::event::RawRecord;
use crate::pipeline::config::ErrorStrategy;

/// Key holding the original text of an input line that could not be parsed.
pub const RAW_LINE_KEY: &str = "_raw";
/// Key holding the parser's message for such a line.
pub const PARSE_ERROR_KEY: &str = "_parse_error";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    #[value(name = "auto", help = "Guess from file extension and content")]
    Auto,
    #[value(name = "jsonl", alias = "ndjson", help = "One JSON object per line")]
    Jsonl,
    #[value(name = "json", help = "JSON array or Graph {\"value\": [...]} envelope")]
    Json,
    #[value(name = "csv", help = "Comma-separated export with a header row")]
    Csv,
}

impl InputFormat {
    /// Pick a concrete format for `content`, optionally read from `path`.
    pub fn detect(path: Option<&Path>, content: &str) -> InputFormat {
        let extension = path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") | Some("tsv") => return InputFormat::Csv,
            Some("jsonl") | Some("ndjson") => return InputFormat::Jsonl,
            _ => {}
        }

        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            InputFormat::Json
        } else if trimmed.starts_with('{') {
            // A single document spanning lines is an array envelope; JSONL
            // keeps each object on its own line.
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) if matches!(map.get("value"), Some(Value::Array(_))) => {
                    InputFormat::Json
                }
                Ok(Value::Object(_)) if trimmed.trim_end().lines().count() > 1 => {
                    InputFormat::Json
                }
                _ => InputFormat::Jsonl,
            }
        } else if trimmed.is_empty() {
            InputFormat::Jsonl
        } else {
            InputFormat::Csv
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Auto => "auto",
            InputFormat::Jsonl => "JSONL",
            InputFormat::Json => "JSON",
            InputFormat::Csv => "CSV",
        }
    }
}

pub trait LineParser {
    fn parse_line(&self, line: &str) -> Result<RawRecord, String>;
}

pub struct JsonlParser;

impl LineParser for JsonlParser {
    fn parse_line(&self, line: &str) -> Result<RawRecord, String> {
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(format!("expected a JSON object, found {}", type_name(&other))),
            Err(e) => Err(format!("Failed to parse JSONL: {}", e)),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Result of reading one input
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub records: Vec<RawRecord>,
    pub format: Option<InputFormat>,
    pub parse_errors: usize,
}

/// Reads raw records, turning malformed entries into `_parse_error` records
/// or failing, depending on the error strategy.
#[derive(Debug, Clone)]
pub struct RecordReader {
    format: InputFormat,
    error_strategy: ErrorStrategy,
}

impl RecordReader {
    pub fn new(format: InputFormat, error_strategy: ErrorStrategy) -> Self {
        Self {
            format,
            error_strategy,
        }
    }

    pub fn read<R: Read>(
        &self,
        mut reader: R,
        path: Option<&Path>,
    ) -> Result<ReadOutcome, ReportError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.read_str(&content, path)
    }

    pub fn read_str(&self, content: &str, path: Option<&Path>) -> Result<ReadOutcome, ReportError> {
        // Excel and the admin center write CSV with a byte order mark
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let format = match self.format {
            InputFormat::Auto => InputFormat::detect(path, content),
            other => other,
        };
        log::debug!(
            "reading {} as {}",
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| "<stdin>".to_string()),
            format.name()
        );

        let mut outcome = ReadOutcome {
            format: Some(format),
            ..Default::default()
        };
        match format {
            InputFormat::Jsonl | InputFormat::Auto => self.read_jsonl(content, &mut outcome)?,
            InputFormat::Json => self.read_json(content, &mut outcome)?,
            InputFormat::Csv => self.read_csv(content, &mut outcome)?,
        }
        Ok(outcome)
    }

    fn malformed(
        &self,
        format: InputFormat,
        line: usize,
        raw: &str,
        message: String,
        outcome: &mut ReadOutcome,
    ) -> Result<(), ReportError> {
        match self.error_strategy {
            ErrorStrategy::FailFast => Err(ReportError::ParseError {
                format: format.name().to_string(),
                line,
                message,
            }),
            ErrorStrategy::Skip => {
                log::warn!("{} parse error on line {}: {}", format.name(), line, message);
                let mut record = RawRecord::new();
                record.insert(RAW_LINE_KEY.to_string(), Value::String(raw.to_string()));
                record.insert(PARSE_ERROR_KEY.to_string(), Value::String(message));
                outcome.records.push(record);
                outcome.parse_errors += 1;
                Ok(())
            }
        }
    }

    fn read_jsonl(&self, content: &str, outcome: &mut ReadOutcome) -> Result<(), ReportError> {
        let parser = JsonlParser;
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parser.parse_line(line) {
                Ok(record) => outcome.records.push(record),
                Err(message) => {
                    self.malformed(InputFormat::Jsonl, index + 1, line, message, outcome)?
                }
            }
        }
        Ok(())
    }

    fn read_json(&self, content: &str, outcome: &mut ReadOutcome) -> Result<(), ReportError> {
        let document: Value = match serde_json::from_str(content) {
            Ok(document) => document,
            Err(e) => {
                return self.malformed(
                    InputFormat::Json,
                    e.line(),
                    content.trim(),
                    format!("Failed to parse JSON: {}", e),
                    outcome,
                );
            }
        };

        let items = match document {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    map.insert("value".to_string(), other);
                    vec![Value::Object(map)]
                }
                None => vec![Value::Object(map)],
            },
            other => {
                return self.malformed(
                    InputFormat::Json,
                    1,
                    &other.to_string(),
                    format!("expected an array or object, found {}", type_name(&other)),
                    outcome,
                );
            }
        };

        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => outcome.records.push(record),
                other => self.malformed(
                    InputFormat::Json,
                    index + 1,
                    &other.to_string(),
                    format!("array element {} is {}, not an object", index, type_name(&other)),
                    outcome,
                )?,
            }
        }
        Ok(())
    }

    fn read_csv(&self, content: &str, outcome: &mut ReadOutcome) -> Result<(), ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = match reader.headers() {
            Ok(headers) => headers.iter().map(|h| h.trim().to_string()).collect(),
            Err(e) => {
                return Err(ReportError::ParseError {
                    format: InputFormat::Csv.name().to_string(),
                    line: 1,
                    message: e.to_string(),
                })
            }
        };
        if headers.iter().all(|h| h.is_empty()) {
            return Ok(());
        }

        for (index, row) in reader.records().enumerate() {
            let line = index + 2;
            match row {
                Ok(row) => {
                    if row.iter().all(|field| field.trim().is_empty()) {
                        continue;
                    }
                    let mut record = RawRecord::new();
                    for (header, value) in headers.iter().zip(row.iter()) {
                        if header.is_empty() {
                            continue;
                        }
                        record.insert(header.clone(), Value::String(value.to_string()));
                    }
                    if row.len() > headers.len() {
                        log::debug!(
                            "CSV line {} has {} fields but {} headers; extra fields ignored",
                            line,
                            row.len(),
                            headers.len()
                        );
                    }
                    outcome.records.push(record);
                }
                Err(e) => {
                    let raw = content.lines().nth(line - 1).unwrap_or_default();
                    self.malformed(InputFormat::Csv, line, raw, e.to_string(), outcome)?
                }
            }
        }
        Ok(())
    }
}
