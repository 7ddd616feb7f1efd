//! Logging system for shader variant harvesting and stripping
//!
//! Diagnostics are logged, never raised to a dialog. This module provides:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to create custom loggers (file logging, network logging, etc.)
///
/// # Example
///
/// ```no_run
/// use shader_stripping::stripping::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "stripping::Harvester", "stripping::Preprocessor")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-candidate strip decisions
    Trace,

    /// Polling progress, skipped settings assets
    Debug,

    /// Harvest milestones and batch summaries
    Info,

    /// Best-effort cleanup failures
    Warn,

    /// Format incompatibility, invalid variants, failed harvests (with file:line)
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Format an entry without colors
///
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Detailed: `[timestamp] [SEVERITY] [source] message (file:line)`
pub fn format_entry(entry: &LogEntry) -> String {
    let datetime: DateTime<Local> = entry.timestamp.into();
    let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

    match (entry.file, entry.line) {
        (Some(file), Some(line)) => format!(
            "[{}] [{}] [{}] {} ({}:{})",
            timestamp, entry.severity.label(), entry.source, entry.message, file, line
        ),
        _ => format!(
            "[{}] [{}] [{}] {}",
            timestamp, entry.severity.label(), entry.source, entry.message
        ),
    }
}

/// Default logger implementation using colored console output
///
/// Trace/Debug/Info go to stdout, Warn/Error go to stderr so build logs
/// keep stripping problems visible.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity = match entry.severity {
            LogSeverity::Trace => entry.severity.label().bright_black(),
            LogSeverity::Debug => entry.severity.label().cyan(),
            LogSeverity::Info => entry.severity.label().green(),
            LogSeverity::Warn => entry.severity.label().yellow(),
            LogSeverity::Error => entry.severity.label().red().bold(),
        };
        let source = entry.source.bright_blue();

        let location = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        };

        if entry.severity >= LogSeverity::Warn {
            eprintln!("[{}] [{}] [{}] {}{}", timestamp, severity, source, entry.message, location);
        } else {
            println!("[{}] [{}] [{}] {}{}", timestamp, severity, source, entry.message, location);
        }
    }
}

/// Logger wrapper dropping entries below a minimum severity
///
/// The preprocessor traces every candidate variant; wrap the real logger
/// with `LogSeverity::Info` to keep large builds readable.
pub struct FilteredLogger<L: Logger> {
    min_severity: LogSeverity,
    inner: L,
}

impl<L: Logger> FilteredLogger<L> {
    pub fn new(min_severity: LogSeverity, inner: L) -> Self {
        Self { min_severity, inner }
    }
}

impl<L: Logger> Logger for FilteredLogger<L> {
    fn log(&self, entry: &LogEntry) {
        if entry.severity >= self.min_severity {
            self.inner.log(entry);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (per-candidate decisions)
///
/// # Example
///
/// ```ignore
/// strip_trace!("stripping::Preprocessor", "Evaluating {} candidates", count);
/// ```
#[macro_export]
macro_rules! strip_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::stripping::Diagnostics::log(
            $crate::stripping::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (polling progress, skipped settings)
///
/// # Example
///
/// ```ignore
/// strip_debug!("stripping::Harvester", "Registry count {} after poll {}", count, poll);
/// ```
#[macro_export]
macro_rules! strip_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::stripping::Diagnostics::log(
            $crate::stripping::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (protocol milestones)
///
/// # Example
///
/// ```ignore
/// strip_info!("stripping::Harvester", "Collection rebuilt with {} variants", count);
/// ```
#[macro_export]
macro_rules! strip_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::stripping::Diagnostics::log(
            $crate::stripping::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (best-effort cleanup failures)
///
/// # Example
///
/// ```ignore
/// strip_warn!("stripping::Harvester", "Could not delete scratch asset {}", path);
/// ```
#[macro_export]
macro_rules! strip_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::stripping::Diagnostics::log(
            $crate::stripping::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```ignore
/// strip_error!("stripping::Extract", "Parsing failed: {}", error);
/// ```
#[macro_export]
macro_rules! strip_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::stripping::Diagnostics::log_detailed(
            $crate::stripping::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
