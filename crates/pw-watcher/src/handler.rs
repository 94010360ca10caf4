//! Handlers invoked when the watched path changes.
//!
//! A [`PathHandler`] runs synchronously inside the dispatch loop, so a slow
//! handler delays every event queued behind it.
//!
//! # Examples
//!
//! ```
//! use pw_watcher::PathHandler;
//! use camino::Utf8Path;
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! let mut handler = move |path: &Utf8Path| {
//!     let _ = tx.send(path.to_owned());
//! };
//! handler.handle(Utf8Path::new("/tmp/f.txt"));
//! assert_eq!(rx.try_recv().unwrap().as_str(), "/tmp/f.txt");
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::mpsc;

/// Receives the path of every event that matches the watched path.
///
/// Implemented for closures taking a `&Utf8Path` and for unbounded tokio
/// senders, which forward the path to an async consumer.
pub trait PathHandler: Send + 'static {
    /// Handles a change to `path`.
    fn handle(&mut self, path: &Utf8Path);
}

impl<F> PathHandler for F
where
    F: FnMut(&Utf8Path) + Send + 'static,
{
    #[inline]
    fn handle(&mut self, path: &Utf8Path) {
        (self)(path);
    }
}

impl PathHandler for mpsc::UnboundedSender<Utf8PathBuf> {
    fn handle(&mut self, path: &Utf8Path) {
        if self.send(path.to_owned()).is_err() {
            tracing::debug!(path = %path, "Handler channel closed, dropping path");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_handler() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut handler = move |path: &Utf8Path| {
            let _ = tx.send(path.to_owned());
        };
        handler.handle(Utf8Path::new("a"));
        handler.handle(Utf8Path::new("b"));
        drop(handler);

        let paths: Vec<Utf8PathBuf> = rx.iter().collect();
        assert_eq!(paths, vec![Utf8PathBuf::from("a"), Utf8PathBuf::from("b")]);
    }

    #[test]
    fn test_sender_handler_forwards_path() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.handle(Utf8Path::new("/tmp/f.txt"));
        assert_eq!(rx.try_recv().ok(), Some(Utf8PathBuf::from("/tmp/f.txt")));
    }

    #[test]
    fn test_sender_handler_ignores_closed_channel() {
        let (mut tx, rx) = mpsc::unbounded_channel::<Utf8PathBuf>();
        drop(rx);
        tx.handle(Utf8Path::new("/tmp/f.txt"));
    }
}
