//! Filtering, sorting and grouping over normalized events.
//!
//! Nothing here changes an event; the engine only selects and reorders.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReportError;
use crate::event::{Event, Severity};

/// Label used for events that lack the grouping attribute.
pub const MISSING_GROUP: &str = "(none)";

/// Conjunction of optional constraints. A `None` field imposes nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    /// Matched ASCII case-insensitively.
    pub user_id: Option<String>,
    /// Exact match on the canonical type or on the literal type the export
    /// carried, so `CallFailed` selects only failed calls and `Call` all of them.
    pub event_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_severity: Option<Severity>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn from_time(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to_time(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Reject a time range whose start is after its end.
    pub fn validate(&self) -> Result<(), ReportError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ReportError::InvalidArgument(format!(
                    "time range start {} is after end {}",
                    from.to_rfc3339_opts(SecondsFormat::Secs, true),
                    to.to_rfc3339_opts(SecondsFormat::Secs, true)
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Predicate::default()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(user) = &self.user_id {
            match event.user_id() {
                Some(actual) if actual.eq_ignore_ascii_case(user) => {}
                _ => return false,
            }
        }

        if let Some(event_type) = &self.event_type {
            // The literal source type matches too, so `--event-type CallFailed`
            // and `--event-type Call` both work.
            let literal = event.source_type() == Some(event_type.as_str());
            if event.event_type() != event_type && !literal {
                return false;
            }
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(ts) = event.timestamp() else {
                return false;
            };
            if self.from.is_some_and(|from| ts < from) {
                return false;
            }
            if self.to.is_some_and(|to| ts > to) {
                return false;
            }
        }

        if let Some(min) = self.min_severity {
            if event.severity() < min {
                return false;
            }
        }

        true
    }
}

/// Events satisfying `predicate`, in input order.
pub fn filter<'a>(events: &'a [Event], predicate: &Predicate) -> Vec<&'a Event> {
    events.iter().filter(|e| predicate.matches(e)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    #[value(name = "user")]
    User,
    #[value(name = "type")]
    Type,
    #[value(name = "device")]
    Device,
    #[value(name = "severity")]
    Severity,
    #[value(name = "date")]
    Date,
}

impl GroupKey {
    pub fn label_for(&self, event: &Event) -> String {
        let label = match self {
            GroupKey::User => event.user_id().map(str::to_string),
            GroupKey::Type => Some(event.event_type().to_string()),
            GroupKey::Device => event.device_id().map(str::to_string),
            GroupKey::Severity => Some(event.severity().to_string()),
            GroupKey::Date => event
                .timestamp()
                .map(|ts| ts.date_naive().format("%Y-%m-%d").to_string()),
        };
        label.unwrap_or_else(|| MISSING_GROUP.to_string())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::User => "user",
            GroupKey::Type => "type",
            GroupKey::Device => "device",
            GroupKey::Severity => "severity",
            GroupKey::Date => "date",
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition events by `key`. Groups appear in first-seen order and keep
/// the relative order of their events.
pub fn group_by<'a, I>(events: I, key: GroupKey) -> IndexMap<String, Vec<&'a Event>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut groups: IndexMap<String, Vec<&'a Event>> = IndexMap::new();
    for event in events {
        groups.entry(key.label_for(event)).or_default().push(event);
    }
    groups
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Oldest first; events without a timestamp go last
    #[default]
    #[value(name = "time")]
    Time,
    /// Most severe first
    #[value(name = "severity")]
    Severity,
    #[value(name = "user")]
    User,
    #[value(name = "type")]
    Type,
    /// Keep input order
    #[value(name = "none")]
    None,
}

/// Stable sort; ties keep input order.
pub fn sort_events(events: &mut [&Event], key: SortKey) {
    match key {
        SortKey::Time => events.sort_by_key(|e| (e.timestamp().is_none(), e.timestamp())),
        SortKey::Severity => events.sort_by_key(|e| std::cmp::Reverse(e.severity())),
        SortKey::User => events.sort_by(|a, b| {
            (a.user_id().is_none(), a.user_id().map(str::to_lowercase))
                .cmp(&(b.user_id().is_none(), b.user_id().map(str::to_lowercase)))
        }),
        SortKey::Type => events.sort_by(|a, b| a.event_type().cmp(b.event_type())),
        SortKey::None => {}
    }
}

/// A full query: predicate, ordering and optional grouping.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub predicate: Predicate,
    pub sort: SortKey,
    pub group_by: Option<GroupKey>,
}

/// Result of a query run. Without grouping there is one group keyed by
/// the empty string.
#[derive(Debug, Clone)]
pub struct QueryResult<'a> {
    pub group_key: Option<GroupKey>,
    pub groups: IndexMap<String, Vec<&'a Event>>,
}

impl<'a> QueryResult<'a> {
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All selected events in output order.
    pub fn events(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.groups.values().flat_map(|group| group.iter().copied())
    }
}

impl Query {
    pub fn run<'a>(&self, events: &'a [Event]) -> Result<QueryResult<'a>, ReportError> {
        self.predicate.validate()?;

        let mut selected = filter(events, &self.predicate);
        sort_events(&mut selected, self.sort);

        let groups = match self.group_by {
            Some(key) => group_by(selected, key),
            None => {
                let mut single = IndexMap::new();
                if !selected.is_empty() {
                    single.insert(String::new(), selected);
                }
                single
            }
        };

        Ok(QueryResult {
            group_key: self.group_by,
            groups,
        })
    }
}
