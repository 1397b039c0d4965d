//! Mapping from source severity labels to the four-level [`Severity`].
//!
//! No export documents an authoritative table, so the defaults below are an
//! assumption and every entry can be overridden from the config file.

use std::collections::HashMap;

use crate::event::Severity;

const DEFAULT_LABELS: &[(&str, Severity)] = &[
    ("info", Severity::Info),
    ("information", Severity::Info),
    ("informational", Severity::Info),
    ("verbose", Severity::Info),
    ("debug", Severity::Info),
    ("low", Severity::Info),
    ("success", Severity::Info),
    ("succeeded", Severity::Info),
    ("notice", Severity::Info),
    ("warning", Severity::Warning),
    ("warn", Severity::Warning),
    ("medium", Severity::Warning),
    ("moderate", Severity::Warning),
    ("error", Severity::Error),
    ("err", Severity::Error),
    ("high", Severity::Error),
    ("failed", Severity::Error),
    ("failure", Severity::Error),
    ("critical", Severity::Critical),
    ("fatal", Severity::Critical),
    ("severe", Severity::Critical),
    ("emergency", Severity::Critical),
];

#[derive(Debug, Clone)]
pub struct SeverityMap {
    labels: HashMap<String, Severity>,
}

impl Default for SeverityMap {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS
                .iter()
                .map(|(label, severity)| (label.to_string(), *severity))
                .collect(),
        }
    }
}

impl SeverityMap {
    /// Add or replace a label mapping. Labels are case-insensitive.
    pub fn insert(&mut self, label: &str, severity: Severity) {
        self.labels
            .insert(label.trim().to_lowercase(), severity);
    }

    pub fn extend<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a String, &'a Severity)>,
    {
        for (label, severity) in entries {
            self.insert(label, *severity);
        }
    }

    /// Resolve a textual or numeric severity label.
    pub fn resolve(&self, label: &str) -> Option<Severity> {
        let key = label.trim().to_lowercase();
        if let Some(severity) = self.labels.get(&key) {
            return Some(*severity);
        }
        // Syslog-style numeric levels 0-7
        match key.parse::<u8>() {
            Ok(0..=2) => Some(Severity::Critical),
            Ok(3) => Some(Severity::Error),
            Ok(4) => Some(Severity::Warning),
            Ok(5..=7) => Some(Severity::Info),
            _ => None,
        }
    }
}

/// Severity class of a SIP final response code.
pub fn sip_severity(code: u16) -> Severity {
    match code / 100 {
        1 | 2 => Severity::Info,
        3 => Severity::Warning,
        4..=6 => Severity::Error,
        _ => Severity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let map = SeverityMap::default();
        assert_eq!(map.resolve("Informational"), Some(Severity::Info));
        assert_eq!(map.resolve(" HIGH "), Some(Severity::Error));
        assert_eq!(map.resolve("fatal"), Some(Severity::Critical));
        assert_eq!(map.resolve("purple"), None);
    }

    #[test]
    fn test_numeric_levels() {
        let map = SeverityMap::default();
        assert_eq!(map.resolve("2"), Some(Severity::Critical));
        assert_eq!(map.resolve("4"), Some(Severity::Warning));
        assert_eq!(map.resolve("6"), Some(Severity::Info));
        assert_eq!(map.resolve("200"), None);
    }

    #[test]
    fn test_override() {
        let mut map = SeverityMap::default();
        map.insert("High", Severity::Critical);
        assert_eq!(map.resolve("high"), Some(Severity::Critical));
    }

    #[test]
    fn test_sip_classes() {
        assert_eq!(sip_severity(180), Severity::Info);
        assert_eq!(sip_severity(200), Severity::Info);
        assert_eq!(sip_severity(302), Severity::Warning);
        assert_eq!(sip_severity(486), Severity::Error);
        assert_eq!(sip_severity(603), Severity::Error);
    }
}
