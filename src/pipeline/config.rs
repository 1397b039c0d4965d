use crate::input_format::InputFormat;
use crate::query::{GroupKey, SortKey};
use crate::render::OutputFormat;

/// Configuration for one report run, resolved from the CLI and config file
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub verbose: bool,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub group_by: Option<GroupKey>,
    pub sort_by: SortKey,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            verbose: false,
            input_format: InputFormat::Auto,
            output_format: OutputFormat::default(), // markdown
            group_by: None,
            sort_by: SortKey::default(),
        }
    }
}

/// Simple error handling strategy for malformed input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Keep malformed lines as `_parse_error` records and continue
    Skip,
    /// Stop processing on first error
    FailFast,
}
