//! Error types for shader variant harvesting and stripping
//!
//! This module defines the error types used throughout the crate,
//! including collection parsing, variant construction, and harvesting.

use std::fmt;

/// Result type for shader stripping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shader stripping errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Persisted collection layout does not match the expected shape
    FormatIncompatible(String),

    /// Keyword combination rejected by the host for a shader/pass
    InvalidVariant(String),

    /// A harvest protocol step failed
    HarvestFailed(String),

    /// Another harvest is already using the same scratch directory
    HarvestInProgress(String),

    /// Asset database operation failed (load, save, delete, enumerate)
    AssetError(String),

    /// Isolated staging context could not be opened, populated or closed
    StagingError(String),

    /// Live variant registry operation failed
    RegistryError(String),

    /// Stripping settings could not be built from their descriptor
    InvalidSettings(String),

    /// Host adapter failure (poisoned lock, unreachable backend)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FormatIncompatible(msg) => write!(f, "Format incompatible: {}", msg),
            Error::InvalidVariant(msg) => write!(f, "Invalid variant: {}", msg),
            Error::HarvestFailed(msg) => write!(f, "Harvest failed: {}", msg),
            Error::HarvestInProgress(msg) => write!(f, "Harvest already in progress: {}", msg),
            Error::AssetError(msg) => write!(f, "Asset error: {}", msg),
            Error::StagingError(msg) => write!(f, "Staging error: {}", msg),
            Error::RegistryError(msg) => write!(f, "Registry error: {}", msg),
            Error::InvalidSettings(msg) => write!(f, "Invalid settings: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error` value
///
/// The error is reported through `strip_error!` (with file:line) before
/// being returned, so every constructed error leaves a trace in the log.
///
/// # Example
///
/// ```ignore
/// return Err(strip_err!("stripping::Harvester", AssetError, "missing '{}'", path));
/// ```
#[macro_export]
macro_rules! strip_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::strip_error!($source, "{}", message);
        $crate::stripping::Error::$kind(message)
    }};
}

/// Log an error and return it from the current function
///
/// # Example
///
/// ```ignore
/// strip_bail!("stripping::Settings", InvalidSettings, "duplicate pass '{}'", name);
/// ```
#[macro_export]
macro_rules! strip_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::strip_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
