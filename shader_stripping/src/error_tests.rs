//! Unit tests for error.rs
//!
//! Tests Error variants, Display output, and the strip_err!/strip_bail! macros.

use crate::error::{Error, Result};
use crate::stripping::Diagnostics;
use crate::stripping::log::{Logger, LogEntry, LogSeverity};
use serial_test::serial;
use std::sync::{Arc, Mutex};

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests may log concurrently; keep only this module's source.
        if entry.source == "test::error" {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_format_incompatible_display() {
    let err = Error::FormatIncompatible("missing 'shaders' array".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Format incompatible"));
    assert!(display.contains("missing 'shaders' array"));
}

#[test]
fn test_invalid_variant_display() {
    let err = Error::InvalidVariant("Lit/ForwardLit [_FOG]".to_string());
    assert_eq!(format!("{}", err), "Invalid variant: Lit/ForwardLit [_FOG]");
}

#[test]
fn test_harvest_errors_display() {
    let failed = Error::HarvestFailed("registry never saved".to_string());
    assert!(format!("{}", failed).contains("Harvest failed"));

    let busy = Error::HarvestInProgress("Temp".to_string());
    assert!(format!("{}", busy).contains("already in progress"));
    assert!(format!("{}", busy).contains("Temp"));
}

#[test]
fn test_host_errors_display() {
    assert!(format!("{}", Error::AssetError("x".into())).starts_with("Asset error"));
    assert!(format!("{}", Error::StagingError("x".into())).starts_with("Staging error"));
    assert!(format!("{}", Error::RegistryError("x".into())).starts_with("Registry error"));
    assert!(format!("{}", Error::InvalidSettings("x".into())).starts_with("Invalid settings"));
    assert!(format!("{}", Error::BackendError("x".into())).starts_with("Backend error"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::RegistryError("clear failed".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::AssetError("Temp/a.prefab".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::StagingError("Temp/a.prefab".to_string()));
}

// ============================================================================
// PROPAGATION
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::RegistryError("count unavailable".to_string()))
    }

    fn outer() -> Result<i32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::RegistryError("count unavailable".to_string())));
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
#[serial]
fn test_strip_err_logs_and_builds_error() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    let err = crate::strip_err!("test::error", AssetError, "cannot load '{}'", "a.json");

    Diagnostics::reset_logger();

    assert_eq!(err, Error::AssetError("cannot load 'a.json'".to_string()));
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].source, "test::error");
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());
}

#[test]
#[serial]
fn test_strip_bail_returns_early() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    fn check(value: u32) -> Result<u32> {
        if value == 0 {
            crate::strip_bail!("test::error", InvalidSettings, "value must be non-zero");
        }
        Ok(value)
    }

    let ok = check(3);
    let err = check(0);

    Diagnostics::reset_logger();

    assert_eq!(ok, Ok(3));
    assert_eq!(err, Err(Error::InvalidSettings("value must be non-zero".to_string())));
    assert_eq!(entries.lock().unwrap().len(), 1);
}
