//! Event normalization pipeline and its run configuration.

pub mod config;
pub mod context;
pub mod stream;

pub use config::{ErrorStrategy, PipelineConfig};
pub use context::ProcessingStats;
pub use stream::EventPipeline;
