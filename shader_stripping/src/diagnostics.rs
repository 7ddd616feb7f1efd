/// Process-wide diagnostics sink
///
/// Harvesting and stripping never surface failures to a dialog; everything
/// is reported through the logger installed here. The slot is a global
/// `OnceLock<RwLock<..>>` initialized with `DefaultLogger` on first use.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Entry point for installing loggers and emitting log entries
///
/// # Example
///
/// ```no_run
/// use shader_stripping::stripping::Diagnostics;
/// use shader_stripping::stripping::log::{DefaultLogger, FilteredLogger, LogSeverity};
///
/// Diagnostics::set_logger(FilteredLogger::new(LogSeverity::Info, DefaultLogger));
/// ```
pub struct Diagnostics;

impl Diagnostics {
    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (build log
    /// collector, file logger, test capture, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_slot().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_slot().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without source location
    ///
    /// Used by `strip_trace!`, `strip_debug!`, `strip_info!`, `strip_warn!`.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_slot().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line information
    ///
    /// Used by `strip_error!` so operators can find the failing step.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_slot().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}
