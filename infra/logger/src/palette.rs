//! Severity labels and their terminal colours.

use std::fmt;
use tracing::Level;

/// Escape sequence that restores the terminal's default colour.
pub const RESET: &str = "\x1b[0m";

/// The severity a record is rendered with.
///
/// Mirrors [`tracing::Level`] plus [`Severity::Critical`], which is an `ERROR`
/// event carrying `critical = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Maps a tracing level, promoting `ERROR` to `CRITICAL` when flagged.
    #[must_use]
    pub fn from_level(level: Level, critical: bool) -> Self {
        match level {
            Level::TRACE => Self::Trace,
            Level::DEBUG => Self::Debug,
            Level::INFO => Self::Info,
            Level::WARN => Self::Warning,
            _ if critical => Self::Critical,
            _ => Self::Error,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// ANSI foreground colour for this severity.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Trace => "\x1b[90m",
            Self::Debug => "\x1b[96m",
            Self::Info => "\x1b[92m",
            Self::Warning => "\x1b[93m",
            Self::Error => "\x1b[33m",
            Self::Critical => "\x1b[91m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
