//! Diagnostics
//!
//! Problems found while cleaning never stop the run. They are attached to the
//! line they concern, which is still emitted, and collected into a `Report`
//! once the output has been written.

use std::fmt;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A flag raised against one line
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based line number in the input file
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn info(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Info,
        }
    }
}

/// A diagnostic located in the output file
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// 1-based line number in the output file
    pub output_line: usize,
    pub diagnostic: Diagnostic,
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "output line {} (input line {}): {}: {}",
            self.output_line, self.diagnostic.line, self.diagnostic.severity, self.diagnostic.message
        )
    }
}

/// Summary of a cleaning run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub lines_read: usize,
    pub lines_written: usize,
    pub diagnostics: Vec<Located>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, output_line: usize, diagnostic: Diagnostic) {
        self.diagnostics.push(Located {
            output_line,
            diagnostic,
        });
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.diagnostic.severity == severity)
            .count()
    }

    /// True when no line was flagged as an error
    pub fn is_clean(&self) -> bool {
        self.count(Severity::Error) == 0
    }
}
