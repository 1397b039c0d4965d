use is_terminal::IsTerminal;

use crate::event::Severity;

/// ANSI color codes for the text report
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub timestamp: &'static str,         // Blue for timestamps
    pub event_type: &'static str,        // Cyan for event types
    pub user: &'static str,              // Green for user ids
    pub header: &'static str,            // Bold for group headers
    pub dim: &'static str,               // Gray for raw fields and rules
    pub severity_critical: &'static str, // Bold red
    pub severity_error: &'static str,    // Red
    pub severity_warning: &'static str,  // Yellow
    pub severity_info: &'static str,     // White
    pub reset: &'static str,             // Reset to default color
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                timestamp: "\x1b[34m",
                event_type: "\x1b[36m",
                user: "\x1b[32m",
                header: "\x1b[1m",
                dim: "\x1b[90m",
                severity_critical: "\x1b[1;31m",
                severity_error: "\x1b[31m",
                severity_warning: "\x1b[33m",
                severity_info: "\x1b[37m",
                reset: "\x1b[0m",
            }
        } else {
            // All empty strings for no-color mode
            Self {
                timestamp: "",
                event_type: "",
                user: "",
                header: "",
                dim: "",
                severity_critical: "",
                severity_error: "",
                severity_warning: "",
                severity_info: "",
                reset: "",
            }
        }
    }

    pub fn severity(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => self.severity_critical,
            Severity::Error => self.severity_error,
            Severity::Warning => self.severity_warning,
            Severity::Info => self.severity_info,
        }
    }
}

/// Colors only for an interactive stdout, and never when `NO_COLOR` is set.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}
