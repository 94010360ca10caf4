//! Event types for path change notifications.
//!
//! This module provides the [`Event`] emitted by the watch mechanism and the
//! translation from `notify` event kinds to [`Op`].
//!
//! # Event Flow
//!
//! ```text
//! notify::PollWatcher (poll interval)
//!        │
//!        ▼
//!   op_from_kind ── None ──► dropped
//!        │
//!        ▼
//!   OpSet filter ── miss ──► dropped
//!        │
//!        ▼
//!   bounded queue (max_events) ── full ──► dropped
//!        │
//!        ▼
//!   dispatch loop
//! ```

use std::time::Instant;

use camino::Utf8PathBuf;
use notify::EventKind;
use notify::event::{MetadataKind, ModifyKind, RenameMode};
use pw_core::Op;

/// A single change to a watched path.
///
/// # Examples
///
/// ```
/// use pw_watcher::Event;
/// use pw_core::Op;
/// use camino::Utf8PathBuf;
///
/// let event = Event::new(Op::Write, Utf8PathBuf::from("/tmp/f.txt"));
/// assert_eq!(event.op, Op::Write);
/// assert_eq!(event.file_name(), Some("f.txt"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub op: Op,

    /// The path the change was observed on.
    pub path: Utf8PathBuf,

    /// When the mechanism produced this event.
    pub timestamp: Instant,
}

impl Event {
    /// Creates a new event stamped with the current instant.
    #[inline]
    #[must_use]
    pub fn new(op: Op, path: Utf8PathBuf) -> Self {
        Self {
            op,
            path,
            timestamp: Instant::now(),
        }
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

/// Maps a `notify` event kind onto an [`Op`].
///
/// Returns `None` for kinds that are not changes (access events and
/// unclassified events).
///
/// # Examples
///
/// ```
/// use notify::EventKind;
/// use notify::event::{CreateKind, RemoveKind};
/// use pw_core::Op;
/// use pw_watcher::events::op_from_kind;
///
/// assert_eq!(op_from_kind(&EventKind::Create(CreateKind::File)), Some(Op::Create));
/// assert_eq!(op_from_kind(&EventKind::Remove(RemoveKind::Any)), Some(Op::Remove));
/// assert_eq!(op_from_kind(&EventKind::Any), None);
/// ```
#[must_use]
pub fn op_from_kind(kind: &EventKind) -> Option<Op> {
    match kind {
        EventKind::Create(_) => Some(Op::Create),
        EventKind::Remove(_) => Some(Op::Remove),
        // The poll backend reports a bare mtime bump as a metadata change.
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => Some(Op::Write),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Op::Chmod),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(Op::Move),
        EventKind::Modify(ModifyKind::Name(_)) => Some(Op::Rename),
        EventKind::Modify(_) => Some(Op::Write),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    #[test]
    fn test_event_new() {
        let event = Event::new(Op::Create, Utf8PathBuf::from("src/app.txt"));
        assert_eq!(event.path.as_str(), "src/app.txt");
        assert_eq!(event.op, Op::Create);
    }

    #[test]
    fn test_event_file_name() {
        let event = Event::new(Op::Remove, Utf8PathBuf::from("/var/data/config.json"));
        assert_eq!(event.file_name(), Some("config.json"));
    }

    #[test]
    fn test_content_changes_are_writes() {
        let data = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        let mtime = EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime));
        let any = EventKind::Modify(ModifyKind::Any);
        assert_eq!(op_from_kind(&data), Some(Op::Write));
        assert_eq!(op_from_kind(&mtime), Some(Op::Write));
        assert_eq!(op_from_kind(&any), Some(Op::Write));
    }

    #[test]
    fn test_metadata_changes_are_chmod() {
        let perms = EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions));
        assert_eq!(op_from_kind(&perms), Some(Op::Chmod));
    }

    #[test]
    fn test_rename_modes() {
        let both = EventKind::Modify(ModifyKind::Name(RenameMode::Both));
        let from = EventKind::Modify(ModifyKind::Name(RenameMode::From));
        let to = EventKind::Modify(ModifyKind::Name(RenameMode::To));
        assert_eq!(op_from_kind(&both), Some(Op::Move));
        assert_eq!(op_from_kind(&from), Some(Op::Rename));
        assert_eq!(op_from_kind(&to), Some(Op::Rename));
    }

    #[test]
    fn test_non_changes_are_ignored() {
        assert_eq!(op_from_kind(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(op_from_kind(&EventKind::Other), None);
        assert_eq!(op_from_kind(&EventKind::Any), None);
    }

    #[test]
    fn test_create_and_remove() {
        assert_eq!(
            op_from_kind(&EventKind::Create(CreateKind::Folder)),
            Some(Op::Create)
        );
        assert_eq!(
            op_from_kind(&EventKind::Remove(RemoveKind::File)),
            Some(Op::Remove)
        );
    }
}
