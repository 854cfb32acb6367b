//! Error module for the Perfect Cuckoo crate.
//!
//! Each component defines its own error enum; [`PcfError`] unifies them for
//! code that crosses component boundaries (loading, benchmarking, the CLI).
//! Key-not-found is never an error: lookups return `None` and deletes `false`.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

use crate::data_structures::perfect_cuckoo_filter::FilterError;
use crate::utxo::RecordError;

pub mod config;

/// Result type alias used throughout the crate.
pub type PcfResult<T> = Result<T, PcfError>;

/// Core error enum for the Perfect Cuckoo crate.
#[derive(Error, Debug)]
pub enum PcfError {
    /// Errors occurring during configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Errors raised by the filter itself.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// A dataset record could not be parsed.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// IO errors that may occur during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/Deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases where specific error types are not defined.
    #[error("{0}")]
    Custom(String),
}

/// Error reporting structure to provide context and debugging information.
#[derive(Debug)]
pub struct ErrorContext {
    /// The original error that occurred.
    pub error: PcfError,

    /// The component where the error occurred.
    pub component: String,

    /// Additional context information to help with debugging.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context with the given error and component.
    pub fn new<S: Into<String>>(error: PcfError, component: S) -> Self {
        Self {
            error,
            component: component.into(),
            details: None,
        }
    }

    /// Adds detail information to the error context.
    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in {}: {}", self.component, self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        Ok(())
    }
}

/// Error reporter trait for reporting errors to various sinks.
pub trait ErrorReporter: Send + Sync + std::fmt::Debug {
    /// Report an error with context.
    fn report(&self, context: ErrorContext);
}

/// An error reporter that logs errors using the tracing framework.
#[derive(Default, Debug)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: ErrorContext) {
        tracing::error!(
            error = %context.error,
            component = %context.component,
            details = context.details.as_deref().unwrap_or("None"),
            "Error reported"
        );
    }
}

static ERROR_REPORTER: Lazy<RwLock<Option<Arc<dyn ErrorReporter>>>> =
    Lazy::new(|| RwLock::new(None));

/// Set the global error reporter.
pub fn set_error_reporter(reporter: Arc<dyn ErrorReporter>) {
    *ERROR_REPORTER.write() = Some(reporter);
}

/// Report an error through the global reporter, falling back to stderr when
/// none is installed.
pub fn report_error(context: ErrorContext) {
    let reporter = ERROR_REPORTER.read().clone();
    match reporter {
        Some(reporter) => reporter.report(context),
        None => eprintln!("Error: {context}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_error_context_display() {
        let error = PcfError::Custom("test error".to_string());
        let context = ErrorContext::new(error, "loader").with_details("line 42");

        let display_string = format!("{context}");
        assert!(display_string.contains("test error"));
        assert!(display_string.contains("loader"));
        assert!(display_string.contains("line 42"));
    }

    #[test]
    fn test_nested_errors() {
        let filter_error = FilterError::RelocationLimitExceeded { max_relocations: 5 };
        let error: PcfError = filter_error.into();
        assert!(error.to_string().contains("Relocation limit of 5 exceeded"));

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = PcfError::from(io_error);
        assert!(error.to_string().contains("file not found"));
    }

    #[derive(Debug, Default)]
    struct CountingReporter {
        reported: AtomicUsize,
    }

    impl ErrorReporter for CountingReporter {
        fn report(&self, _context: ErrorContext) {
            self.reported.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_global_error_reporter() {
        let reporter = Arc::new(CountingReporter::default());
        set_error_reporter(reporter.clone());

        report_error(ErrorContext::new(PcfError::Custom("boom".to_string()), "test"));

        assert_eq!(reporter.reported.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracing_error_reporter() {
        let reporter = TracingErrorReporter;
        let context = ErrorContext::new(PcfError::Custom("test".to_string()), "test");
        reporter.report(context);
    }
}
