//! Reporting of errors that cannot be returned to the caller.
//!
//! The poll loop runs on a detached task, so a failure to start it has
//! nowhere to go but an [`ErrorReporter`]. The default reporter logs the
//! error; tests and embedding applications can supply their own.

use std::fmt;
use std::sync::Arc;

use crate::error::WatchError;

type ReportFn = dyn Fn(&WatchError) + Send + Sync;

/// A cloneable sink for asynchronous watcher failures.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use pw_watcher::{ErrorReporter, WatchError};
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let seen = Arc::clone(&count);
/// let reporter = ErrorReporter::new(move |_err| {
///     seen.fetch_add(1, Ordering::SeqCst);
/// });
///
/// reporter.report(&WatchError::AlreadyRunning);
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct ErrorReporter {
    report: Arc<ReportFn>,
}

impl ErrorReporter {
    /// Creates a reporter that calls `report` for every error.
    pub fn new(report: impl Fn(&WatchError) + Send + Sync + 'static) -> Self {
        Self {
            report: Arc::new(report),
        }
    }

    /// Hands `error` to the reporter.
    #[inline]
    pub fn report(&self, error: &WatchError) {
        (self.report)(error);
    }
}

impl Default for ErrorReporter {
    /// Logs the error at `error` level.
    fn default() -> Self {
        Self::new(|error| {
            tracing::error!(error = %error, "Unhandled watcher error");
        })
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_custom_reporter_receives_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ErrorReporter::new(move |err| sink.lock().push(err.to_string()));

        reporter.report(&WatchError::Closed);

        assert_eq!(seen.lock().as_slice(), ["watcher is closed"]);
    }

    #[test]
    fn test_clones_share_sink() {
        let seen = Arc::new(Mutex::new(0_usize));
        let sink = Arc::clone(&seen);
        let reporter = ErrorReporter::new(move |_| *sink.lock() += 1);
        let clone = reporter.clone();

        reporter.report(&WatchError::AlreadyRunning);
        clone.report(&WatchError::AlreadyRunning);

        assert_eq!(*seen.lock(), 2);
    }

    #[test]
    fn test_default_reporter_does_not_panic() {
        ErrorReporter::default().report(&WatchError::Closed);
    }
}
