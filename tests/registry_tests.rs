// tests/registry_tests.rs
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use teamslog::{
    CanonicalFields, EventPipeline, RawRecord, ReportError, StarlarkTranslator, TranslatorRegistry,
};

fn raw(v: Value) -> RawRecord {
    v.as_object().cloned().unwrap()
}

fn policy_record() -> RawRecord {
    raw(json!({
        "type": "PolicyChange",
        "user": "admin@contoso.com",
        "policy": "AllowCalling",
        "time": "2026-01-12T09:00:00Z",
    }))
}

#[test]
fn test_custom_translator_replaces_builtin() {
    let mut registry = TranslatorRegistry::with_builtins();
    registry
        .register(
            "PolicyChange",
            |fields: &CanonicalFields, raw: &RawRecord| {
                format!(
                    "POLICY {} by {}",
                    raw.get("policy").and_then(Value::as_str).unwrap_or("?"),
                    fields.user_id.as_deref().unwrap_or("?")
                )
            },
        )
        .unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(policy_record());
    assert_eq!(event.description(), "POLICY AllowCalling by admin@contoso.com");
}

#[test]
fn test_translate_is_idempotent() {
    let pipeline = EventPipeline::default();
    let event = pipeline.process(raw(json!({
        "type": "CallFailed",
        "user": "alice@example.com",
        "device": "Yealink T46S",
        "reason": "ICE_TIMEOUT",
        "time": "2026-01-10T14:32:00Z",
    })));

    let first = pipeline.registry().translate(&event);
    let second = pipeline.registry().translate(&event);
    assert_eq!(first, second);
    assert_eq!(first, event.description());
}

#[test]
fn test_register_rejects_empty_type() {
    let mut registry = TranslatorRegistry::new();
    let result = registry.register("  ", |_: &CanonicalFields, _: &RawRecord| String::new());
    assert!(matches!(result, Err(ReportError::InvalidArgument(_))));
}

#[test]
fn test_translator_for_raw_unknown_type() {
    let mut registry = TranslatorRegistry::with_builtins();
    registry
        .register("MeetingCreated", |fields: &CanonicalFields, _: &RawRecord| {
            format!(
                "{} scheduled a meeting",
                fields.user_id.as_deref().unwrap_or("someone")
            )
        })
        .unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(raw(json!({
        "type": "MeetingCreated",
        "user": "gina@contoso.com",
        "time": "2026-01-12T09:00:00Z",
    })));
    assert_eq!(event.event_type(), "Unknown");
    assert_eq!(event.description(), "gina@contoso.com scheduled a meeting");
}

#[test]
fn test_empty_output_falls_back_to_generic() {
    let mut registry = TranslatorRegistry::new();
    registry
        .register("PolicyChange", |_: &CanonicalFields, _: &RawRecord| {
            "   ".to_string()
        })
        .unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(policy_record());
    assert_eq!(
        event.description(),
        "PolicyChange event for admin@contoso.com at 2026-01-12T09:00:00Z"
    );
}

#[test]
fn test_starlark_plugin_from_file() {
    let mut script = NamedTempFile::new().unwrap();
    writeln!(script, "user = event[\"user_id\"]").unwrap();
    writeln!(script, "policy = raw.get(\"policy\", \"a policy\")").unwrap();
    writeln!(script, "f\"{{user}} touched {{policy}}\"").unwrap();

    let translator = StarlarkTranslator::from_file(script.path()).unwrap();
    let mut registry = TranslatorRegistry::with_builtins();
    registry.register("PolicyChange", translator).unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(policy_record());
    assert_eq!(
        event.description(),
        "admin@contoso.com touched AllowCalling"
    );
}

#[test]
fn test_failing_plugin_falls_back() {
    let translator = StarlarkTranslator::from_script("broken", "undefined_name + 1").unwrap();
    let mut registry = TranslatorRegistry::new();
    registry.register("PolicyChange", translator).unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(policy_record());
    assert!(event.description().starts_with("PolicyChange event for admin@contoso.com"));
}

#[test]
fn test_plugin_syntax_error_at_load() {
    assert!(StarlarkTranslator::from_script("bad", "def (:").is_err());
}

#[test]
fn test_starlark_sip_helpers() {
    let translator = StarlarkTranslator::from_script(
        "pstn",
        r#"
code = raw["Final SIP code"]
reason = sip_reason(code)
"SIP " + str(code) + ": " + reason
"#,
    )
    .unwrap();
    let mut registry = TranslatorRegistry::new();
    registry.register("Call", translator).unwrap();

    let pipeline = EventPipeline::new(Arc::new(registry));
    let event = pipeline.process(raw(json!({
        "Start time": "2026-01-10T09:00:00Z",
        "UPN": "erin@contoso.com",
        "Final SIP code": 486,
    })));
    assert!(event.description().starts_with("SIP 486: "));
    assert!(event.description().len() > "SIP 486: ".len());
}
