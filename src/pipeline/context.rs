use std::collections::BTreeMap;
use std::time::Duration;

use crate::event::Event;
use crate::schema::ShapeTag;

/// Runtime statistics for one pipeline run
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub records_processed: usize,
    pub unknown_shapes: usize,
    pub unknown_types: usize,
    pub warnings: usize,
    pub processing_time: Duration,
    pub shapes_seen: BTreeMap<&'static str, usize>,
}

impl ProcessingStats {
    /// Account for one finished event
    pub fn record(&mut self, event: &Event) {
        self.records_processed += 1;
        *self.shapes_seen.entry(event.shape().as_str()).or_insert(0) += 1;
        if event.shape() == ShapeTag::Unknown {
            self.unknown_shapes += 1;
        }
        if event.fields().is_unknown() {
            self.unknown_types += 1;
        }
        self.warnings += event.diagnostics().len();
    }

    /// One-line stats summary for `--debug`
    pub fn summary_line(&self) -> String {
        let shapes: Vec<String> = self
            .shapes_seen
            .iter()
            .map(|(shape, count)| format!("{}={}", shape, count))
            .collect();
        format!(
            "{} records in {:.1}ms ({}), {} unknown type, {} warnings",
            self.records_processed,
            self.processing_time.as_secs_f64() * 1000.0,
            if shapes.is_empty() {
                "no shapes".to_string()
            } else {
                shapes.join(", ")
            },
            self.unknown_types,
            self.warnings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EventPipeline;
    use serde_json::json;

    #[test]
    fn test_stats_count_shapes_and_unknowns() {
        let pipeline = EventPipeline::default();
        let mut stats = ProcessingStats::default();
        for value in [
            json!({"type": "SignIn", "user": "a@b.com", "time": "2026-01-10T00:00:00Z"}),
            json!({"type": "Mystery", "user": "a@b.com", "time": "2026-01-10T00:00:00Z"}),
            json!({}),
        ] {
            let event = pipeline.process(value.as_object().cloned().unwrap());
            stats.record(&event);
        }

        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.unknown_shapes, 1);
        assert_eq!(stats.unknown_types, 2);
        assert_eq!(stats.shapes_seen["teams-csv-flat"], 2);
        assert!(stats.warnings >= 1);
        assert!(stats
            .summary_line()
            .starts_with("3 records in"));
    }
}
