// src/pipeline/stream.rs
use std::sync::Arc;
use std::time::Instant;

use crate::event::{event_types, CanonicalFields, Event, RawRecord};
use crate::normalize::normalize;
use crate::pipeline::context::ProcessingStats;
use crate::schema::detect;
use crate::severity::SeverityMap;
use crate::translate::TranslatorRegistry;

/// Detector + normalizer + translator registry: one raw record in, one
/// event out.
#[derive(Debug, Clone)]
pub struct EventPipeline {
    registry: Arc<TranslatorRegistry>,
    severity_map: SeverityMap,
}

impl Default for EventPipeline {
    fn default() -> Self {
        Self::new(Arc::new(TranslatorRegistry::with_builtins()))
    }
}

impl EventPipeline {
    pub fn new(registry: Arc<TranslatorRegistry>) -> Self {
        EventPipeline {
            registry,
            severity_map: SeverityMap::default(),
        }
    }

    pub fn with_severity_map(mut self, severity_map: SeverityMap) -> Self {
        self.severity_map = severity_map;
        self
    }

    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    /// Turn one raw record into an event. Total: every input, including an
    /// empty object, produces an event.
    pub fn process(&self, record: RawRecord) -> Event {
        let shape = detect(&record);
        let normalized = normalize(&record, shape, &self.severity_map);

        for warning in &normalized.warnings {
            log::debug!("{} record: {}", shape, warning);
        }

        let fields = CanonicalFields {
            timestamp: normalized.timestamp,
            event_type: normalized
                .event_type
                .unwrap_or_else(|| event_types::UNKNOWN.to_string()),
            source_type: normalized.source_type,
            user_id: normalized.user_id,
            device_id: normalized.device_id,
            severity: normalized.severity.unwrap_or_default(),
            duration_secs: normalized.duration_secs,
        };

        let description = self.registry.describe_record(shape, &fields, &record);
        Event::new(fields, shape, record, description, normalized.warnings)
    }

    /// Process a batch, keeping input order.
    pub fn process_all<I>(&self, records: I) -> (Vec<Event>, ProcessingStats)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();
        let events: Vec<Event> = records
            .into_iter()
            .map(|record| {
                let event = self.process(record);
                stats.record(&event);
                event
            })
            .collect();
        stats.processing_time = start_time.elapsed();
        (events, stats)
    }

    /// Lazily process records one at a time.
    pub fn events<'a, I>(&'a self, records: I) -> impl Iterator<Item = Event> + 'a
    where
        I: IntoIterator<Item = RawRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().map(move |record| self.process(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Severity;
    use crate::schema::ShapeTag;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRecord {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_record_yields_unknown_event() {
        let pipeline = EventPipeline::default();
        let event = pipeline.process(RawRecord::new());
        assert_eq!(event.event_type(), "Unknown");
        assert_eq!(event.shape(), ShapeTag::Unknown);
        assert_eq!(event.severity(), Severity::Info);
        assert_eq!(
            event.description(),
            "Unknown event for unknown user at unknown time"
        );
        assert_eq!(event.diagnostics().len(), 1);
    }

    #[test]
    fn test_undetected_shape_gets_generic_description() {
        let pipeline = EventPipeline::default();
        let event = pipeline.process(raw(json!({
            "type": "CallFailed",
            "user": "alice@example.com",
            "time": "2026-01-10T14:32:00Z",
            "extra": {"a": 1},
        })));
        assert_eq!(event.shape(), ShapeTag::Unknown);
        assert_eq!(event.event_type(), "Unknown");
        assert_eq!(event.source_type(), Some("CallFailed"));
        assert_eq!(
            event.description(),
            "CallFailed event for alice@example.com at 2026-01-10T14:32:00Z"
        );
        assert_eq!(pipeline.registry().translate(&event), event.description());
    }

    #[test]
    fn test_raw_fields_are_kept_verbatim() {
        let pipeline = EventPipeline::default();
        let record = raw(json!({"type": "SignIn", "time": "2026-01-10T10:00:00Z", "extra": [1, 2]}));
        let event = pipeline.process(record.clone());
        assert_eq!(event.raw_fields(), &record);
    }

    #[test]
    fn test_process_all_counts() {
        let pipeline = EventPipeline::default();
        let (events, stats) = pipeline.process_all(vec![
            raw(json!({"type": "SignIn", "time": "2026-01-10T10:00:00Z", "user": "a@x.com"})),
            raw(json!({"type": "Mystery", "time": "2026-01-10T10:00:00Z"})),
            raw(json!({})),
        ]);
        assert_eq!(events.len(), 3);
        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.unknown_types, 2);
        assert_eq!(stats.unknown_shapes, 1);
        assert_eq!(stats.warnings, 1);
    }

    #[test]
    fn test_events_is_lazy_and_ordered() {
        let pipeline = EventPipeline::default();
        let records = vec![
            raw(json!({"type": "SignIn", "time": "2026-01-10T10:00:00Z"})),
            raw(json!({"type": "PolicyChange", "time": "2026-01-10T09:00:00Z"})),
        ];
        let mut events = pipeline.events(records);
        assert_eq!(events.next().map(|e| e.event_type().to_string()).as_deref(), Some("SignIn"));
        assert_eq!(
            events.next().map(|e| e.event_type().to_string()).as_deref(),
            Some("PolicyChange")
        );
        assert!(events.next().is_none());
    }

    #[test]
    fn test_custom_severity_map() {
        let mut map = SeverityMap::default();
        map.insert("medium", Severity::Critical);
        let pipeline = EventPipeline::default().with_severity_map(map);
        let event = pipeline.process(raw(json!({
            "type": "SignIn",
            "time": "2026-01-10T10:00:00Z",
            "severity": "Medium",
        })));
        assert_eq!(event.severity(), Severity::Critical);
    }
}
