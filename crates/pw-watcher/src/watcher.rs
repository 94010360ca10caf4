//! Watching a single path and dispatching its changes to a handler.
//!
//! This module provides [`PathWatcher`] and the [`watch_file`] shorthand.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────┐      ┌──────────────────────────────────┐
//! │ poll task                   │      │ dispatch task                    │
//! │ Watcher::start(interval)    │      │ select! {                        │
//! │   └─ notify::PollWatcher ───┼─────►│   closed  => exit                │
//! │ failure -> ErrorReporter    │      │   event   => handler(path) if == │
//! └─────────────────────────────┘      │   error   => log                 │
//!                                      │ }                                │
//!                                      └──────────────────────────────────┘
//! ```
//!
//! Starting a watch never waits for either task to be ready. It pauses for
//! the configured readiness delay and returns.

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use pw_core::{OpSet, WatchConfig};
use tokio::task::JoinHandle;

use crate::error::WatchError;
use crate::handler::PathHandler;
use crate::mechanism::{Signals, WatchedFile, Watcher, WatcherOptions};
use crate::reporter::ErrorReporter;

/// Watches one path and calls a handler whenever an event names exactly that path.
///
/// # Lifecycle
///
/// 1. **Start**: [`PathWatcher::start`] spawns the dispatch task, registers the
///    path, logs every tracked path, spawns the poll task and sleeps for the
///    readiness delay.
///
/// 2. **Dispatch**: create, move, write and remove events whose path equals
///    the watched path invoke the handler, one call per event.
///
/// 3. **Termination**: the background tasks run until the underlying
///    mechanism is closed. Dropping a `PathWatcher` detaches them; it does
///    not stop them.
///
/// # Examples
///
/// ```no_run
/// use pw_watcher::{ErrorReporter, PathWatcher};
/// use pw_core::WatchConfig;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), pw_watcher::WatchError> {
/// let watcher = PathWatcher::start(
///     "/etc/app/config.json",
///     |path: &Utf8Path| println!("reloading {path}"),
///     &WatchConfig::default(),
///     ErrorReporter::default(),
/// )
/// .await?;
///
/// assert_eq!(watcher.watch_path().as_str(), "/etc/app/config.json");
/// # Ok(())
/// # }
/// ```
pub struct PathWatcher {
    /// The path the handler is bound to.
    watch_path: Utf8PathBuf,

    /// The mechanism shared with both background tasks.
    watcher: Arc<Watcher>,

    /// Handle to the dispatch task.
    dispatch_handle: JoinHandle<()>,

    /// Handle to the poll task.
    poll_handle: JoinHandle<()>,
}

impl std::fmt::Debug for PathWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_dispatching", &self.is_dispatching())
            .field("is_polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

impl PathWatcher {
    /// Starts watching `path`.
    ///
    /// The mechanism queues at most `config.max_events` unconsumed events and
    /// only reports create, move, write and remove operations.
    ///
    /// If registration fails the error is returned, but the dispatch task that
    /// was already spawned keeps running with nothing registered.
    ///
    /// A poll loop that fails to start (for instance with a zero poll
    /// interval) is handed to `reporter`; this call still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if `config` is invalid and
    /// [`WatchError::Register`] if `path` cannot be registered.
    pub async fn start<H: PathHandler>(
        path: impl Into<Utf8PathBuf>,
        handler: H,
        config: &WatchConfig,
        reporter: ErrorReporter,
    ) -> Result<Self, WatchError> {
        config.validate()?;

        let options = WatcherOptions {
            ops: OpSet::FILE_CHANGES,
            ..WatcherOptions::from(config)
        };
        let (watcher, signals) = Watcher::new(options);

        Self::start_with(path.into(), handler, Arc::new(watcher), signals, config, reporter).await
    }

    async fn start_with<H: PathHandler>(
        watch_path: Utf8PathBuf,
        handler: H,
        watcher: Arc<Watcher>,
        signals: Signals,
        config: &WatchConfig,
        reporter: ErrorReporter,
    ) -> Result<Self, WatchError> {
        let dispatch_handle = tokio::spawn(run_dispatch_loop(
            watch_path.clone(),
            handler,
            signals,
            Arc::clone(&watcher),
        ));

        tokio::task::spawn_blocking({
            let watcher = Arc::clone(&watcher);
            let path = watch_path.clone();
            move || watcher.add(&path)
        })
        .await??;

        for file in watcher.watched_files() {
            tracing::info!(path = %file.path, name = file.name(), "Watching path");
        }

        let poll_handle = tokio::spawn(run_poll_loop(
            Arc::clone(&watcher),
            config.poll_interval,
            reporter,
        ));

        tokio::time::sleep(config.readiness_delay).await;

        Ok(Self {
            watch_path,
            watcher,
            dispatch_handle,
            poll_handle,
        })
    }

    /// Returns the path the handler is bound to.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns every path the mechanism tracks for this watch.
    #[must_use]
    pub fn watched_files(&self) -> Vec<WatchedFile> {
        self.watcher.watched_files()
    }

    /// Returns `true` while the dispatch task is alive.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        !self.dispatch_handle.is_finished()
    }

    /// Returns `true` while the poll task is alive.
    ///
    /// This turns `false` shortly after a failed poll-loop start.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        !self.poll_handle.is_finished()
    }
}

/// Watches `path` with default settings and a poll interval of `sync_frequency`.
///
/// Returns once the readiness delay has elapsed. The watch keeps running in
/// the background for the rest of the process.
///
/// # Errors
///
/// Returns [`WatchError::Register`] if `path` cannot be registered.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), pw_watcher::WatchError> {
/// pw_watcher::watch_file(
///     "/tmp/f.txt",
///     |path: &Utf8Path| println!("{path} changed"),
///     Duration::from_millis(500),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn watch_file<H: PathHandler>(
    path: impl Into<Utf8PathBuf>,
    handler: H,
    sync_frequency: Duration,
) -> Result<(), WatchError> {
    let config = WatchConfig::default().with_poll_interval(sync_frequency);
    PathWatcher::start(path, handler, &config, ErrorReporter::default()).await?;
    Ok(())
}

/// Consumes events, errors and the termination signal until termination.
///
/// `_watcher` keeps the mechanism alive for as long as this loop runs, even
/// when registration failed.
async fn run_dispatch_loop<H: PathHandler>(
    path: Utf8PathBuf,
    mut handler: H,
    mut signals: Signals,
    _watcher: Arc<Watcher>,
) {
    loop {
        tokio::select! {
            biased;

            () = signals.closed.cancelled() => {
                tracing::info!(path = %path, "Watcher terminated");
                return;
            }
            Some(event) = signals.events.recv() => {
                tracing::debug!(
                    op = %event.op,
                    path = %event.path,
                    queued_for = ?event.timestamp.elapsed(),
                    "Watcher received new event"
                );
                if event.path == path {
                    handler.handle(&event.path);
                }
            }
            Some(error) = signals.errors.recv() => {
                tracing::warn!(error = %error, "Watcher encountered error");
            }
        }
    }
}

async fn run_poll_loop(watcher: Arc<Watcher>, interval: Duration, reporter: ErrorReporter) {
    if let Err(error) = watcher.start(interval).await {
        reporter.report(&error);
    }
}
