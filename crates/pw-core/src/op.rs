//! File-system operation kinds.
//!
//! [`Op`] names a single kind of change reported by the watch mechanism, and
//! [`OpSet`] is the filter a watcher applies before an event is queued.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A kind of file-system change.
///
/// # Examples
///
/// ```
/// use pw_core::Op;
///
/// assert_eq!(Op::Write.to_string(), "WRITE");
/// assert_eq!(Op::Move.as_str(), "MOVE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// A file or directory was created.
    Create,
    /// File contents (or its modification time) changed.
    Write,
    /// A file or directory was removed.
    Remove,
    /// A path was renamed, but only one side of the rename was observed.
    Rename,
    /// Permissions or other metadata changed.
    Chmod,
    /// A path was moved, with both source and destination observed.
    Move,
}

impl Op {
    /// All operation kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Create,
        Self::Write,
        Self::Remove,
        Self::Rename,
        Self::Chmod,
        Self::Move,
    ];

    /// Returns the upper-case name of this operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Write => "WRITE",
            Self::Remove => "REMOVE",
            Self::Rename => "RENAME",
            Self::Chmod => "CHMOD",
            Self::Move => "MOVE",
        }
    }

    /// Returns the single-bit [`OpSet`] for this operation.
    #[inline]
    #[must_use]
    pub const fn as_set(self) -> OpSet {
        match self {
            Self::Create => OpSet::CREATE,
            Self::Write => OpSet::WRITE,
            Self::Remove => OpSet::REMOVE,
            Self::Rename => OpSet::RENAME,
            Self::Chmod => OpSet::CHMOD,
            Self::Move => OpSet::MOVE,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// A set of [`Op`] kinds used to filter events.
    ///
    /// # Examples
    ///
    /// ```
    /// use pw_core::{Op, OpSet};
    ///
    /// let ops = OpSet::FILE_CHANGES;
    /// assert!(ops.contains_op(Op::Write));
    /// assert!(!ops.contains_op(Op::Chmod));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OpSet: u8 {
        /// See [`Op::Create`].
        const CREATE = 1 << 0;
        /// See [`Op::Write`].
        const WRITE = 1 << 1;
        /// See [`Op::Remove`].
        const REMOVE = 1 << 2;
        /// See [`Op::Rename`].
        const RENAME = 1 << 3;
        /// See [`Op::Chmod`].
        const CHMOD = 1 << 4;
        /// See [`Op::Move`].
        const MOVE = 1 << 5;

        /// The operations a path watcher reacts to.
        const FILE_CHANGES = Self::CREATE.bits()
            | Self::MOVE.bits()
            | Self::WRITE.bits()
            | Self::REMOVE.bits();
    }
}

impl OpSet {
    /// Builds a set from individual operations.
    #[must_use]
    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        ops.into_iter().fold(Self::empty(), |set, op| set | op.as_set())
    }

    /// Returns `true` if `op` is a member of this set.
    #[inline]
    #[must_use]
    pub const fn contains_op(self, op: Op) -> bool {
        self.contains(op.as_set())
    }
}

impl Default for OpSet {
    /// The default filter lets every operation through.
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Op> for OpSet {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self::from_ops(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_changes_membership() {
        let ops = OpSet::FILE_CHANGES;
        assert!(ops.contains_op(Op::Create));
        assert!(ops.contains_op(Op::Move));
        assert!(ops.contains_op(Op::Write));
        assert!(ops.contains_op(Op::Remove));
        assert!(!ops.contains_op(Op::Rename));
        assert!(!ops.contains_op(Op::Chmod));
    }

    #[test]
    fn test_from_ops_matches_constant() {
        let ops: OpSet = [Op::Create, Op::Move, Op::Write, Op::Remove]
            .into_iter()
            .collect();
        assert_eq!(ops, OpSet::FILE_CHANGES);
    }

    #[test]
    fn test_default_accepts_everything() {
        let ops = OpSet::default();
        assert_eq!(ops, OpSet::all());
        assert!(!ops.is_empty());
        for op in Op::ALL {
            assert!(ops.contains_op(op), "{op} should pass the default filter");
        }
    }

    #[test]
    fn test_op_display() {
        let names: Vec<_> = Op::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["CREATE", "WRITE", "REMOVE", "RENAME", "CHMOD", "MOVE"]
        );
    }

    #[test]
    fn test_op_serialization() {
        assert_eq!(serde_json::to_string(&Op::Chmod).unwrap(), r#""chmod""#);
        let op: Op = serde_json::from_str(r#""move""#).unwrap();
        assert_eq!(op, Op::Move);
    }
}
