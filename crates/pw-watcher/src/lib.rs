//! Single-path file watcher that dispatches changes to a handler.
//!
//! This crate watches one file or directory with a poll-based `notify`
//! watcher and calls a handler whenever a create, move, write or remove
//! event names exactly the watched path.
//!
//! # Overview
//!
//! - [`watch_file`] starts a watch with default settings and returns after a
//!   short readiness delay; the watch then runs for the rest of the process
//! - [`PathWatcher`] does the same but hands back a handle for introspection
//! - [`Watcher`] is the underlying mechanism: bounded event queue, operation
//!   filter, path registration and the blocking poll loop
//! - [`ErrorReporter`] receives failures that happen after the call returned
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pw_watcher::WatchError> {
//!     pw_watcher::watch_file(
//!         "/etc/app/config.json",
//!         |path: &Utf8Path| println!("{path} changed, reloading"),
//!         Duration::from_secs(1),
//!     )
//!     .await?;
//!
//!     // The watch keeps running in the background.
//!     tokio::signal::ctrl_c().await.ok();
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Only registration failures are returned to the caller. A poll loop that
//! cannot start is passed to the [`ErrorReporter`], and errors raised while
//! polling are logged by the dispatch loop and otherwise ignored.
//!
//! ```
//! use pw_watcher::{ErrorReporter, WatchError};
//!
//! let reporter = ErrorReporter::new(|err: &WatchError| {
//!     eprintln!("watcher failed in the background: {err}");
//! });
//! # let _ = reporter;
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod handler;
pub mod mechanism;
pub mod reporter;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export event types
pub use events::Event;

// Re-export handler and reporter types
pub use handler::PathHandler;
pub use reporter::ErrorReporter;

// Re-export mechanism types
pub use mechanism::{Signals, WatchedFile, Watcher, WatcherOptions};

// Re-export watcher types
pub use watcher::{PathWatcher, watch_file};
