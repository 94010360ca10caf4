//! The poll-based watch mechanism.
//!
//! [`Watcher`] wraps a `notify` [`PollWatcher`] and exposes what a path
//! watcher needs from it:
//!
//! - a bounded event queue capped at `max_events` unconsumed events
//! - an [`OpSet`] filter applied before events are queued
//! - three consumable signal sources bundled as [`Signals`]
//! - path registration and enumeration of every tracked path
//! - a poll loop ([`Watcher::start`]) that runs until [`Watcher::close`]
//!
//! Registration and poller setup walk the file system. [`Watcher::add`] is
//! synchronous and meant for blocking contexts; [`Watcher::start`] moves its
//! setup onto the blocking pool itself.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────┐
//! │ notify::PollWatcher thread   │        │ Watcher::trigger_event   │
//! └──────────────┬───────────────┘        └────────────┬─────────────┘
//!                │ op_from_kind                        │
//!                ▼                                     ▼
//!        ┌────────────────────────────────────────────────────┐
//!        │ Emitter: OpSet filter -> try_send (cap max_events) │
//!        └───────────────┬─────────────────────┬──────────────┘
//!                        ▼                     ▼
//!                 Signals::events       Signals::errors      Signals::closed
//! ```

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{PollWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use pw_core::{Op, OpSet, WatchConfig};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::error::WatchError;
use crate::events::{Event, op_from_kind};

/// Options fixed when a [`Watcher`] is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Maximum number of queued, unconsumed events. Zero is treated as one.
    pub max_events: usize,

    /// Operations that are queued. Everything else is dropped.
    pub ops: OpSet,

    /// Whether directories are tracked recursively.
    pub recursive: bool,

    /// Whether the poller hashes file contents.
    pub compare_contents: bool,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            max_events: 1,
            ops: OpSet::all(),
            recursive: false,
            compare_contents: true,
        }
    }
}

impl From<&WatchConfig> for WatcherOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            max_events: config.max_events,
            recursive: config.recursive,
            compare_contents: config.compare_contents,
            ..Self::default()
        }
    }
}

/// The consuming side of a [`Watcher`].
///
/// Returned once from [`Watcher::new`]; whoever owns it is the only reader.
#[derive(Debug)]
pub struct Signals {
    /// Filtered change events.
    pub events: mpsc::Receiver<Event>,

    /// Non-fatal errors raised by the poller.
    pub errors: mpsc::UnboundedReceiver<WatchError>,

    /// Cancelled when the watcher is closed.
    pub closed: CancellationToken,
}

/// A path tracked by a [`Watcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    /// The tracked path.
    pub path: Utf8PathBuf,

    /// Whether the path was a directory when it was registered.
    pub is_dir: bool,

    /// Size in bytes at registration time.
    pub len: u64,
}

impl WatchedFile {
    fn from_metadata(path: Utf8PathBuf, metadata: &std::fs::Metadata) -> Self {
        Self {
            path,
            is_dir: metadata.is_dir(),
            len: metadata.len(),
        }
    }

    /// The final path component, or the whole path for roots like `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

/// Filters and queues events. Shared by the poller callback and
/// [`Watcher::trigger_event`].
#[derive(Debug, Clone)]
struct Emitter {
    ops: OpSet,
    events: mpsc::Sender<Event>,
    errors: mpsc::UnboundedSender<WatchError>,
}

impl Emitter {
    fn emit(&self, op: Op, path: Utf8PathBuf) -> bool {
        if !self.ops.contains_op(op) {
            tracing::trace!(op = %op, path = %path, "Filtered out event");
            return false;
        }

        match self.events.try_send(Event::new(op, path)) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::trace!(op = %event.op, path = %event.path, "Event queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Event channel closed, dropping event");
                false
            }
        }
    }

    fn error(&self, error: WatchError) {
        if self.errors.send(error).is_err() {
            tracing::debug!("Error channel closed, dropping error");
        }
    }

    fn handle_notify(&self, result: notify::Result<notify::Event>) {
        let event = match result {
            Ok(event) => event,
            Err(error) => {
                self.error(WatchError::Notify(error));
                return;
            }
        };

        let Some(op) = op_from_kind(&event.kind) else {
            tracing::trace!(kind = ?event.kind, "Ignoring non-change event");
            return;
        };

        for path in event.paths {
            match Utf8PathBuf::try_from(path) {
                Ok(path) => {
                    self.emit(op, path);
                }
                Err(e) => self.error(WatchError::non_utf8_path(e.into_path_buf())),
            }
        }
    }
}

/// A poll-based file-system watcher.
///
/// # Examples
///
/// ```
/// use pw_watcher::{Watcher, WatcherOptions};
/// use pw_core::{Op, OpSet};
///
/// let (watcher, mut signals) = Watcher::new(WatcherOptions {
///     ops: OpSet::FILE_CHANGES,
///     ..WatcherOptions::default()
/// });
///
/// assert!(watcher.trigger_event(Op::Write, "/tmp/f.txt"));
/// assert!(!watcher.trigger_event(Op::Chmod, "/tmp/f.txt"));
/// assert_eq!(watcher.pending_events(), 1);
///
/// let event = signals.events.try_recv().unwrap();
/// assert_eq!(event.op, Op::Write);
/// ```
pub struct Watcher {
    emitter: Emitter,
    recursive: bool,
    compare_contents: bool,
    roots: Mutex<Vec<Utf8PathBuf>>,
    watched: Mutex<BTreeMap<Utf8PathBuf, WatchedFile>>,
    poller: Mutex<Option<PollWatcher>>,
    running: AtomicBool,
    closed: CancellationToken,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("ops", &self.emitter.ops)
            .field("roots", &self.roots.lock())
            .field("is_running", &self.is_running())
            .field("is_closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a watcher and the signals it writes to.
    #[must_use]
    pub fn new(options: WatcherOptions) -> (Self, Signals) {
        let (event_tx, event_rx) = mpsc::channel(options.max_events.max(1));
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();

        let watcher = Self {
            emitter: Emitter {
                ops: options.ops,
                events: event_tx,
                errors: error_tx,
            },
            recursive: options.recursive,
            compare_contents: options.compare_contents,
            roots: Mutex::new(Vec::new()),
            watched: Mutex::new(BTreeMap::new()),
            poller: Mutex::new(None),
            running: AtomicBool::new(false),
            closed: closed.clone(),
        };

        let signals = Signals {
            events: event_rx,
            errors: error_rx,
            closed,
        };

        (watcher, signals)
    }

    const fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }

    /// Registers `path` for watching.
    ///
    /// A directory is tracked together with its direct children, or its whole
    /// tree when the watcher is recursive. Paths added while the poll loop is
    /// running are polled from the next cycle.
    ///
    /// This reads metadata and walks directories, so async callers should run
    /// it on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Register`] if the path cannot be read.
    pub fn add(&self, path: impl AsRef<Utf8Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| WatchError::register(path, e))?;

        let mut files = vec![WatchedFile::from_metadata(path.to_owned(), &metadata)];
        if metadata.is_dir() {
            files.extend(list_dir(path, self.recursive).map_err(|e| WatchError::register(path, e))?);
        }

        let mut poller = self.poller.lock();
        if let Some(poller) = poller.as_mut() {
            poller
                .watch(path.as_std_path(), self.mode())
                .map_err(|e| WatchError::register(path, io::Error::other(e)))?;
        }
        self.roots.lock().push(path.to_owned());
        drop(poller);

        let mut watched = self.watched.lock();
        for file in files {
            watched.insert(file.path.clone(), file);
        }

        Ok(())
    }

    /// Returns every tracked path, sorted.
    ///
    /// The list is recorded by [`add`](Self::add) and not refreshed
    /// afterwards: children created later are missing and removed ones stay.
    #[must_use]
    pub fn watched_files(&self) -> Vec<WatchedFile> {
        self.watched.lock().values().cloned().collect()
    }

    /// Runs the poll loop until the watcher is closed.
    ///
    /// # Errors
    ///
    /// - [`WatchError::InvalidInterval`] if `interval` is zero
    /// - [`WatchError::Closed`] if the watcher was already closed
    /// - [`WatchError::AlreadyRunning`] if another call is still polling
    /// - [`WatchError::Notify`] if the poller cannot be created or a root cannot be watched
    /// - [`WatchError::Task`] if the blocking setup task fails
    pub async fn start(&self, interval: Duration) -> Result<(), WatchError> {
        if interval.is_zero() {
            return Err(WatchError::InvalidInterval(interval));
        }
        if self.closed.is_cancelled() {
            return Err(WatchError::Closed);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(WatchError::AlreadyRunning);
        }

        if let Err(error) = self.spawn_poller(interval).await {
            self.running.store(false, Ordering::SeqCst);
            return Err(error);
        }

        self.closed.cancelled().await;

        self.poller.lock().take();
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Poll loop stopped");

        Ok(())
    }

    async fn spawn_poller(&self, interval: Duration) -> Result<(), WatchError> {
        let config = notify::Config::default()
            .with_poll_interval(interval)
            .with_compare_contents(self.compare_contents);
        let emitter = self.emitter.clone();
        let mode = self.mode();
        let seeded = self.roots.lock().clone();

        // Blocking: the initial scan reads and hashes every tracked file.
        let (mut poller, seeded) = tokio::task::spawn_blocking(move || {
            let mut poller = PollWatcher::new(
                move |result: notify::Result<notify::Event>| emitter.handle_notify(result),
                config,
            )?;
            for root in &seeded {
                poller.watch(root.as_std_path(), mode)?;
            }
            Ok::<_, WatchError>((poller, seeded.len()))
        })
        .await??;

        // Roots only grow; catch up on any added while the poller was built.
        let mut slot = self.poller.lock();
        let roots = self.roots.lock();
        for root in &roots[seeded..] {
            poller.watch(root.as_std_path(), mode)?;
        }
        *slot = Some(poller);

        tracing::info!(interval = ?interval, roots = roots.len(), "Poll loop started");

        Ok(())
    }

    /// Sends the termination signal.
    ///
    /// The poll loop stops and the dispatch side observes [`Signals::closed`].
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Returns `true` while [`start`](Self::start) is polling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of queued events not yet received from [`Signals::events`].
    #[must_use]
    pub fn pending_events(&self) -> usize {
        let tx = &self.emitter.events;
        tx.max_capacity() - tx.capacity()
    }

    /// Injects a synthetic event as if the poller had produced it.
    ///
    /// The event passes through the same filter and queue cap. Returns `true`
    /// if it was queued.
    pub fn trigger_event(&self, op: Op, path: impl Into<Utf8PathBuf>) -> bool {
        self.emitter.emit(op, path.into())
    }

    #[cfg(test)]
    pub(crate) fn trigger_error(&self, error: WatchError) {
        self.emitter.error(error);
    }
}

fn list_dir(root: &Utf8Path, recursive: bool) -> io::Result<Vec<WatchedFile>> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .max_depth(if recursive { None } else { Some(1) })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if entry.depth() == 0 {
            continue;
        }

        let Ok(path) = Utf8PathBuf::try_from(entry.path().to_path_buf()) else {
            tracing::warn!(path = %entry.path().display(), "Skipping non-UTF-8 path");
            continue;
        };
        let metadata = entry.metadata().map_err(io::Error::other)?;
        files.push(WatchedFile::from_metadata(path, &metadata));
    }

    Ok(files)
}
