//! Translator registry: event type → human-readable description.
//!
//! Lookup goes through the canonical event type first. Events whose type was
//! not recognized are looked up again by their literal source type, so a
//! plugin can be registered for a type the alias table does not know about.
//! Anything still unmatched, and every record no shape matched, gets
//! [`generic_description`].

pub mod builtin;
pub mod plugin;
pub mod sip;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ReportError;
use crate::event::{event_types, CanonicalFields, Event, RawRecord};
use crate::schema::ShapeTag;

pub use plugin::StarlarkTranslator;

/// Produces a description for one event from its canonical fields and the
/// raw record it came from.
///
/// Implementations must not fail; an empty string means "no opinion" and the
/// registry falls back to the generic description.
pub trait Translator: Send + Sync {
    fn describe(&self, fields: &CanonicalFields, raw: &RawRecord) -> String;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Translator for F
where
    F: Fn(&CanonicalFields, &RawRecord) -> String + Send + Sync,
{
    fn describe(&self, fields: &CanonicalFields, raw: &RawRecord) -> String {
        self(fields, raw)
    }
}

#[derive(Default, Clone)]
pub struct TranslatorRegistry {
    entries: HashMap<String, Arc<dyn Translator>>,
}

impl std::fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatorRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}

impl TranslatorRegistry {
    /// An empty registry; every event gets the generic description.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the four built-in translators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(event_types::CALL, Arc::new(builtin::call));
        registry.insert(event_types::POLICY_CHANGE, Arc::new(builtin::policy_change));
        registry.insert(event_types::SIGN_IN, Arc::new(builtin::sign_in));
        registry.insert(
            event_types::DEVICE_REGISTRATION,
            Arc::new(builtin::device_registration),
        );
        registry
    }

    /// Register a translator for `event_type`, replacing any earlier one.
    pub fn register<T>(&mut self, event_type: &str, translator: T) -> Result<(), ReportError>
    where
        T: Translator + 'static,
    {
        self.register_boxed(event_type, Arc::new(translator))
    }

    pub fn register_boxed(
        &mut self,
        event_type: &str,
        translator: Arc<dyn Translator>,
    ) -> Result<(), ReportError> {
        let event_type = event_type.trim();
        if event_type.is_empty() {
            return Err(ReportError::InvalidArgument(
                "translator event type must not be empty".to_string(),
            ));
        }
        if self.contains(event_type) {
            log::debug!("replacing translator for event type '{}'", event_type);
        }
        self.insert(event_type, translator);
        Ok(())
    }

    fn insert(&mut self, event_type: &str, translator: Arc<dyn Translator>) {
        self.entries.insert(event_type.to_string(), translator);
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.entries.contains_key(event_type)
    }

    /// Registered event types, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.keys().cloned().collect();
        types.sort();
        types
    }

    fn lookup(&self, fields: &CanonicalFields) -> Option<(&str, &Arc<dyn Translator>)> {
        if let Some((key, translator)) = self.entries.get_key_value(&fields.event_type) {
            return Some((key.as_str(), translator));
        }
        if fields.is_unknown() {
            if let Some(source) = &fields.source_type {
                return self
                    .entries
                    .get_key_value(source)
                    .map(|(key, translator)| (key.as_str(), translator));
            }
        }
        None
    }

    /// Description for the given fields. Never empty.
    pub fn describe(&self, fields: &CanonicalFields, raw: &RawRecord) -> String {
        match self.lookup(fields) {
            Some((event_type, translator)) => {
                let text = translator.describe(fields, raw);
                if text.trim().is_empty() {
                    log::debug!(
                        "translator '{}' for '{}' returned nothing, using generic description",
                        translator.name(),
                        event_type
                    );
                    generic_description(fields)
                } else {
                    text
                }
            }
            None => generic_description(fields),
        }
    }

    /// Description for a record of `shape`. Records no shape matched always
    /// get the generic description, whatever their literal type says.
    pub fn describe_record(
        &self,
        shape: ShapeTag,
        fields: &CanonicalFields,
        raw: &RawRecord,
    ) -> String {
        if shape == ShapeTag::Unknown {
            return generic_description(fields);
        }
        self.describe(fields, raw)
    }

    /// Description for an already-built event.
    pub fn translate(&self, event: &Event) -> String {
        self.describe_record(event.shape(), event.fields(), event.raw_fields())
    }
}

/// Fallback description from the canonical fields alone.
pub fn generic_description(fields: &CanonicalFields) -> String {
    format!(
        "{} event for {} at {}",
        fields.display_type(),
        fields.user_id.as_deref().unwrap_or("unknown user"),
        fields
            .timestamp_string()
            .unwrap_or_else(|| "unknown time".to_string())
    )
}
