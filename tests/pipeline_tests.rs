// tests/pipeline_tests.rs
use serde_json::{json, Value};
use teamslog::{
    ErrorStrategy, EventPipeline, InputFormat, RawRecord, RecordReader, Severity, ShapeTag,
};

fn raw(v: Value) -> RawRecord {
    v.as_object().cloned().unwrap()
}

#[test]
fn test_call_failed_end_to_end() {
    let pipeline = EventPipeline::default();
    let reader = RecordReader::new(InputFormat::Json, ErrorStrategy::Skip);
    let outcome = reader
        .read_str(
            r#"[{"type":"CallFailed","user":"alice@example.com","device":"Yealink T46S","reason":"ICE_TIMEOUT","time":"2026-01-10T14:32:00Z"}]"#,
            None,
        )
        .unwrap();

    let (events, stats) = pipeline.process_all(outcome.records);
    assert_eq!(events.len(), 1);
    assert_eq!(stats.records_processed, 1);

    let event = &events[0];
    assert_eq!(event.event_type(), "Call");
    assert_eq!(event.source_type(), Some("CallFailed"));
    assert_eq!(event.severity(), Severity::Error);
    assert_eq!(
        event.timestamp().unwrap().to_rfc3339(),
        "2026-01-10T14:32:00+00:00"
    );
    let description = event.description();
    assert!(description.contains("alice@example.com"), "{}", description);
    assert!(description.contains("ICE negotiation timeout"), "{}", description);
    assert!(description.contains("Yealink T46S"), "{}", description);
}

#[test]
fn test_every_record_produces_an_event() {
    let pipeline = EventPipeline::default();
    let records = vec![
        raw(json!({})),
        raw(json!({"foo": [1, 2, 3]})),
        raw(json!({"type": 42, "time": {"nested": true}})),
        raw(json!({"eventType": "SignIn", "actor": null})),
        raw(json!({"Final SIP code": "abc"})),
        raw(json!({"CreationTime": "not a date", "Operation": "", "UserId": ""})),
    ];
    let count = records.len();

    let (events, stats) = pipeline.process_all(records);
    assert_eq!(events.len(), count);
    assert_eq!(stats.records_processed, count);
    for event in &events {
        assert!(!event.description().is_empty());
        assert!(!event.event_type().is_empty());
    }

    let empty = &events[0];
    assert_eq!(empty.event_type(), "Unknown");
    assert_eq!(empty.shape(), ShapeTag::Unknown);
    assert_eq!(empty.severity(), Severity::Info);
    assert!(empty.timestamp().is_none());
    assert!(empty
        .diagnostics()
        .iter()
        .any(|w| w.field == "timestamp"));
}

#[test]
fn test_unregistered_type_falls_back() {
    let pipeline = EventPipeline::default();
    let event = pipeline.process(raw(json!({
        "eventType": "TotallyNovelThing",
        "userId": "dave@contoso.com",
        "timestamp": "2026-01-11T10:00:00Z",
    })));

    assert_eq!(event.event_type(), "Unknown");
    assert_eq!(event.source_type(), Some("TotallyNovelThing"));
    assert!(event.description().contains("TotallyNovelThing"));
    assert!(event.description().contains("dave@contoso.com"));
}

#[test]
fn test_shapes_are_detected_and_counted() {
    let pipeline = EventPipeline::default();
    let records = vec![
        raw(json!({
            "Start time": "2026-01-10T09:00:00Z",
            "UPN": "erin@contoso.com",
            "Call type": "user_out",
            "Final SIP code": 200,
            "Final Microsoft subcode": 0,
            "Final SIP Phrase": "OK",
            "Duration (seconds)": 95,
        })),
        raw(json!({
            "eventType": "PolicyChange",
            "eventDateTime": "2026-01-10T09:05:00Z",
            "actor": {"userPrincipalName": "admin@contoso.com"},
            "properties": {"policyName": "AllowCalling", "oldValue": "Off", "newValue": "On"},
        })),
        raw(json!({
            "CreationTime": "2026-01-10T09:10:00",
            "Operation": "Set-CsTeamsMeetingPolicy",
            "UserId": "admin@contoso.com",
            "Workload": "MicrosoftTeams",
            "RecordType": 25,
        })),
        raw(json!({"type": "SignIn", "user": "frank@contoso.com", "time": "2026-01-10T09:15:00Z"})),
    ];

    let (events, stats) = pipeline.process_all(records);
    let shapes: Vec<ShapeTag> = events.iter().map(|e| e.shape()).collect();
    assert_eq!(
        shapes,
        vec![
            ShapeTag::TeamsPstnCall,
            ShapeTag::TeamsJsonV1,
            ShapeTag::TeamsAuditFlat,
            ShapeTag::TeamsCsvFlat,
        ]
    );
    assert_eq!(stats.unknown_shapes, 0);

    assert_eq!(events[0].event_type(), "Call");
    assert_eq!(events[0].severity(), Severity::Info);
    assert_eq!(events[0].duration_secs(), Some(95.0));
    assert!(events[0].description().contains("erin@contoso.com"));

    assert_eq!(events[1].event_type(), "PolicyChange");
    assert_eq!(events[1].user_id(), Some("admin@contoso.com"));
    assert!(events[1].description().contains("AllowCalling"));

    assert_eq!(events[2].event_type(), "PolicyChange");
    assert_eq!(events[2].severity(), Severity::Warning);

    assert_eq!(events[3].event_type(), "SignIn");
}

#[test]
fn test_malformed_jsonl_line_becomes_unknown_event() {
    let reader = RecordReader::new(InputFormat::Jsonl, ErrorStrategy::Skip);
    let outcome = reader
        .read_str(
            "{\"type\":\"SignIn\",\"user\":\"a@b.com\",\"time\":\"2026-01-10T00:00:00Z\"}\n{not json\n",
            None,
        )
        .unwrap();
    assert_eq!(outcome.parse_errors, 1);

    let (events, _) = EventPipeline::default().process_all(outcome.records);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type(), "Unknown");
    assert!(events[1].diagnostics().iter().any(|w| w.field == "input"));
}

#[test]
fn test_fail_fast_rejects_malformed_line() {
    let reader = RecordReader::new(InputFormat::Jsonl, ErrorStrategy::FailFast);
    let result = reader.read_str("{\"type\":\"SignIn\"}\n{not json\n", None);
    assert!(matches!(
        result,
        Err(teamslog::ReportError::ParseError { line: 2, .. })
    ));
}
