//! Tracing subscriber initialization.
//!
//! The engine logs through `tracing` under the `textdisp::*` targets
//! (`textdisp::layout`, `textdisp::metrics`, `textdisp::scheduler`,
//! `textdisp::view`). The binary sends those events to a log file, or to
//! stderr when asked to.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives; `RUST_LOG` is used
/// when it is unset.
pub const LOG_ENV: &str = "TEXTDISP_LOG";

/// Filter used when neither environment variable is set.
pub const DEFAULT_FILTER: &str = "warn,textdisp=info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Log path without a file name, or without a parent directory
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Filter directives could not be parsed
    #[error("Invalid log filter {directives:?}: {reason}")]
    InvalidFilter {
        /// The rejected directives
        directives: String,
        /// Parser message
        reason: String,
    },

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file, creating its directory.
    File(PathBuf),
    /// Write to standard error.
    Stderr,
}

/// Builds the event filter from [`LOG_ENV`], then `RUST_LOG`, then
/// [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] if the chosen directives do not
/// parse.
pub fn env_filter() -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_owned());
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        directives,
        reason: e.to_string(),
    })
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Fails if the log directory cannot be created, the filter is invalid, or
/// a subscriber is already installed.
pub fn init(target: &LogTarget) -> Result<(), LoggingError> {
    let filter = env_filter()?;
    match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|_| LoggingError::SubscriberAlreadySet),
        LogTarget::File(path) => {
            let (directory, file_name) = prepare_log_file(path)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(appender)
                .with_ansi(false)
                .try_init()
                .map_err(|_| LoggingError::SubscriberAlreadySet)
        }
    }
}

/// Splits a log path into its directory and file name, creating the
/// directory.
fn prepare_log_file(path: &Path) -> Result<(&Path, &str), LoggingError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let directory = path
        .parent()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
            path: directory.to_path_buf(),
            source,
        })?;
    }
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial(tracing_init)]
    fn file_target_creates_log_directory() {
        let test_dir = std::env::temp_dir().join("textdisp_test_logs_create");
        let log_file = test_dir.join("test.log");
        let _ = fs::remove_dir_all(&test_dir);

        // The subscriber may already be installed by another test.
        let _ = init(&LogTarget::File(log_file));

        assert!(test_dir.exists(), "log directory should be created: {test_dir:?}");
        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let err = prepare_log_file(Path::new("/")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }

    #[test]
    #[serial(log_env)]
    fn filter_prefers_textdisp_variable() {
        std::env::set_var(LOG_ENV, "textdisp::layout=trace");
        let filter = env_filter().expect("valid directives");
        std::env::remove_var(LOG_ENV);
        assert!(filter.to_string().contains("textdisp::layout=trace"));
    }

    #[test]
    #[serial(log_env)]
    fn invalid_filter_is_reported() {
        std::env::set_var(LOG_ENV, "textdisp=notalevel");
        let result = env_filter();
        std::env::remove_var(LOG_ENV);
        assert!(matches!(result, Err(LoggingError::InvalidFilter { .. })));
    }
}
