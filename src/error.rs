#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Caller handed the engine something it can never accept (empty event
    /// type, inverted time range). The only error class that aborts a run.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{format} parse error on line {line}: {message}")]
    ParseError {
        format: String,
        line: usize,
        message: String,
    },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::RenderError(format!("CSV error: {}", err))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    #[error("Starlark syntax error: {0}")]
    SyntaxError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl From<starlark::Error> for CompilationError {
    fn from(err: starlark::Error) -> Self {
        CompilationError::SyntaxError(format!("{}", err))
    }
}

impl From<std::io::Error> for CompilationError {
    fn from(err: std::io::Error) -> Self {
        CompilationError::FileNotFound(err.to_string())
    }
}

impl From<CompilationError> for ReportError {
    fn from(err: CompilationError) -> Self {
        ReportError::ConfigError(err.to_string())
    }
}
