// src/lib.rs
pub mod colors;
pub mod config;
pub mod error;
pub mod event;
pub mod field;
pub mod flatten;
pub mod input_format;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod schema;
pub mod severity;
pub mod summary;
pub mod timestamp;
pub mod translate;

pub use error::*;

pub use config::ReportConfig;
pub use event::{event_types, CanonicalFields, Event, NormalizationWarning, RawRecord, Severity};
pub use input_format::{InputFormat, RecordReader};
pub use pipeline::{ErrorStrategy, EventPipeline, PipelineConfig, ProcessingStats};
pub use query::{filter, group_by, sort_events, GroupKey, Predicate, Query, QueryResult, SortKey};
pub use render::{render, OutputFormat, Renderer, Report};
pub use schema::{detect, ShapeTag};
pub use severity::SeverityMap;
pub use summary::ReportSummary;
pub use translate::{generic_description, StarlarkTranslator, Translator, TranslatorRegistry};
