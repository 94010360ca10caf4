//! Error types for the pw-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while registering paths, running the poll loop, or translating events.

use std::time::Duration;

use camino::Utf8PathBuf;
use pw_core::ConfigError;

/// Errors that can occur during path watching.
///
/// # Where each error surfaces
///
/// - **Registration** ([`WatchError::Register`]): returned synchronously from
///   [`PathWatcher::start`](crate::PathWatcher::start)
/// - **Poll loop** ([`WatchError::InvalidInterval`], [`WatchError::AlreadyRunning`],
///   [`WatchError::Closed`], [`WatchError::Task`]): handed to the
///   [`ErrorReporter`](crate::ErrorReporter)
/// - **Mechanism** ([`WatchError::Notify`], [`WatchError::NonUtf8Path`]): sent
///   on [`Signals::errors`](crate::Signals::errors) and logged by the dispatch
///   loop, never fatal
///
/// # Examples
///
/// ```
/// use pw_watcher::WatchError;
///
/// let err = WatchError::register(
///     "/nonexistent/path",
///     std::io::Error::from(std::io::ErrorKind::NotFound),
/// );
/// assert!(err.to_string().contains("/nonexistent/path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The path could not be added to the watch mechanism.
    #[error("failed to add watcher to {path}: {source}")]
    Register {
        /// The path that failed to register.
        path: Utf8PathBuf,
        /// Why registration failed.
        #[source]
        source: std::io::Error,
    },

    /// The poll interval is zero.
    #[error("poll interval must be positive, got {0:?}")]
    InvalidInterval(Duration),

    /// The poll loop was started twice on the same mechanism.
    #[error("watcher is already running")]
    AlreadyRunning,

    /// The mechanism has already been terminated.
    #[error("watcher is closed")]
    Closed,

    /// The underlying notify watcher failed.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The poller reported a path that is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A blocking registration or poller setup task panicked or was cancelled.
    #[error("watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The supplied configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WatchError {
    /// Creates a new [`WatchError::Register`] error.
    #[inline]
    pub fn register(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Register {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }
}
