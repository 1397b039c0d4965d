// tests/query_tests.rs
use chrono::{TimeZone, Utc};
use serde_json::json;
use teamslog::{
    filter, group_by, Event, EventPipeline, GroupKey, Predicate, Query, ReportError, Severity,
    SortKey,
};

fn events() -> Vec<Event> {
    let pipeline = EventPipeline::default();
    vec![
        json!({"type": "SignIn", "user": "alice@example.com", "time": "2026-01-10T10:00:00Z"}),
        json!({"type": "CallFailed", "user": "bob@example.com", "device": "Poly CCX 500", "reason": "BUSY", "time": "2026-01-10T09:00:00Z"}),
        json!({"type": "SignInFailed", "user": "Alice@Example.com", "reason": "50126", "time": "2026-01-10T11:00:00Z"}),
        json!({"type": "Call", "user": "alice@example.com", "time": "2026-01-10T10:00:00Z", "duration": 61}),
        json!({"type": "PolicyChange", "user": "admin@example.com", "policy": "AllowCalling", "time": "2026-01-11T08:00:00Z"}),
        json!({"type": "Call", "user": "carol@example.com"}),
    ]
    .into_iter()
    .map(|v| pipeline.process(v.as_object().cloned().unwrap()))
    .collect()
}

#[test]
fn test_time_bounds_are_inclusive() {
    let events = events();
    let at = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();

    let exact = Predicate::new().from_time(at).to_time(at);
    let matched = filter(&events, &exact);
    assert_eq!(matched.len(), 2);
    assert!(matched.iter().all(|e| e.timestamp() == Some(at)));
}

#[test]
fn test_single_bound_is_half_open() {
    let events = events();
    let at = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();

    // Events without a timestamp never match a time bound
    assert_eq!(filter(&events, &Predicate::new().from_time(at)).len(), 4);
    assert_eq!(filter(&events, &Predicate::new().to_time(at)).len(), 3);
}

#[test]
fn test_empty_predicate_matches_everything() {
    let events = events();
    let predicate = Predicate::new();
    assert!(predicate.is_empty());
    assert_eq!(filter(&events, &predicate).len(), events.len());
}

#[test]
fn test_conjunction_of_fields() {
    let events = events();
    let predicate = Predicate::new()
        .user("ALICE@example.com")
        .event_type("SignIn")
        .min_severity(Severity::Error);
    let matched = filter(&events, &predicate);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].source_type(), Some("SignInFailed"));
}

#[test]
fn test_inverted_range_is_rejected() {
    let events = events();
    let query = Query {
        predicate: Predicate::new()
            .from_time(Utc.with_ymd_and_hms(2026, 1, 11, 0, 0, 0).unwrap())
            .to_time(Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    assert!(matches!(
        query.run(&events),
        Err(ReportError::InvalidArgument(_))
    ));
}

#[test]
fn test_default_sort_is_time_then_input_order() {
    let events = events();
    let result = Query::default().run(&events).unwrap();
    let order: Vec<&str> = result
        .events()
        .map(|e| e.source_type().unwrap_or(""))
        .collect();
    // Equal timestamps keep input order; the untimed event sorts last
    assert_eq!(
        order,
        vec!["CallFailed", "SignIn", "Call", "SignInFailed", "PolicyChange", "Call"]
    );
    assert_eq!(result.events().last().and_then(|e| e.user_id()), Some("carol@example.com"));
}

#[test]
fn test_grouping_is_stable() {
    let events = events();
    let refs: Vec<&Event> = events.iter().collect();
    let groups = group_by(refs, GroupKey::Type);

    // Without a timestamp the last record matches no shape and stays Unknown
    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["SignIn", "Call", "PolicyChange", "Unknown"]);

    let calls: Vec<Option<&str>> = groups["Call"].iter().map(|e| e.user_id()).collect();
    assert_eq!(
        calls,
        vec![Some("bob@example.com"), Some("alice@example.com")]
    );
}

#[test]
fn test_type_filter_is_exact_subsequence() {
    let events = events();
    let matched = filter(&events, &Predicate::new().event_type("Call"));

    let expected: Vec<&Event> = vec![&events[1], &events[3]];
    assert_eq!(matched.len(), expected.len());
    for (got, want) in matched.iter().zip(&expected) {
        assert!(std::ptr::eq(*got, *want));
    }
}

#[test]
fn test_event_just_outside_bounds_is_excluded() {
    let pipeline = EventPipeline::default();
    let events: Vec<Event> = [
        "2026-01-10T09:59:59Z",
        "2026-01-10T10:00:00Z",
        "2026-01-10T11:00:00Z",
        "2026-01-10T11:00:01Z",
    ]
    .iter()
    .map(|ts| {
        pipeline.process(
            json!({"type": "SignIn", "user": "alice@example.com", "time": ts})
                .as_object()
                .cloned()
                .unwrap(),
        )
    })
    .collect();

    let from = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 1, 10, 11, 0, 0).unwrap();
    let matched = filter(&events, &Predicate::new().from_time(from).to_time(to));
    let times: Vec<_> = matched.iter().filter_map(|e| e.timestamp()).collect();
    assert_eq!(times, vec![from, to]);

    assert_eq!(
        filter(&events, &Predicate::new().from_time(from)).len(),
        3
    );
}

#[test]
fn test_group_by_device_collects_missing_values() {
    let events = events();
    let result = Query {
        group_by: Some(GroupKey::Device),
        sort: SortKey::None,
        ..Default::default()
    }
    .run(&events)
    .unwrap();

    assert_eq!(result.groups["Poly CCX 500"].len(), 1);
    assert_eq!(result.groups["(none)"].len(), 5);
    assert_eq!(result.len(), events.len());
}

#[test]
fn test_group_by_date_bucket() {
    let events = events();
    let result = Query {
        group_by: Some(GroupKey::Date),
        ..Default::default()
    }
    .run(&events)
    .unwrap();

    let keys: Vec<&str> = result.groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["2026-01-10", "2026-01-11", "(none)"]);
    assert_eq!(result.groups["2026-01-10"].len(), 4);
}

#[test]
fn test_sort_by_severity_puts_worst_first() {
    let events = events();
    let result = Query {
        sort: SortKey::Severity,
        ..Default::default()
    }
    .run(&events)
    .unwrap();
    let first: Vec<Severity> = result.events().take(2).map(|e| e.severity()).collect();
    assert_eq!(first, vec![Severity::Error, Severity::Error]);
}
