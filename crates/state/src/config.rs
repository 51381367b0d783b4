// Path: crates/state/src/config.rs
//! Tunables the tree state machine needs but spec-level contracts leave
//! implicit: the expiration policy for `ExpiredLeaf`, the node width, and
//! whether bulk `InsertOrdered` construction flushes finished subtrees.

use serde::{Deserialize, Serialize};

/// Number of children per internal node and the length of every node's
/// commitment polynomial (fan-out 256, one slot per possible key byte).
pub const NODE_WIDTH: usize = 256;

/// Number of suffixes committed to by each of a leaf's two sub-commitments.
pub const SUFFIX_HALF_WIDTH: usize = NODE_WIDTH / 2;

/// A monotonically increasing epoch counter used to decide whether a leaf's
/// retention window has elapsed.
///
/// Earlier source variants disagreed between a `u64` epoch and a `u16`
/// period, and between an exclusive and inclusive comparator. This
/// implementation picks `StateEpoch(u64)` with the inclusive comparator
/// spelled out in its own suggested phrasing: `cur >= prev + ACTIVE_WINDOW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateEpoch(pub u64);

impl StateEpoch {
    /// The genesis epoch.
    pub const ZERO: StateEpoch = StateEpoch(0);

    /// Whether a leaf activated at `self` is expired as of `current`, given
    /// the configured active window.
    pub fn is_expired_at(self, current: StateEpoch, active_window: u64) -> bool {
        current.0 >= self.0.saturating_add(active_window)
    }
}

/// Tunables for a [`crate::tree::VerkleTree`].
#[derive(Debug, Clone, Copy)]
pub struct VerkleTreeConfig {
    /// Number of epochs a leaf remains active after it is created, before
    /// reads/writes against it fail with `Expired`. `None` disables
    /// expiration entirely (every leaf is permanently active).
    pub active_window: Option<u64>,
    /// Whether `InsertOrdered` replaces a finished sibling subtree with a
    /// `HashedNode` as soon as descent moves past it, bounding peak memory
    /// during bulk construction.
    pub flush_during_bulk_insert: bool,
}

impl Default for VerkleTreeConfig {
    fn default() -> Self {
        Self {
            active_window: None,
            flush_during_bulk_insert: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_is_inclusive_at_the_boundary() {
        let activated = StateEpoch(10);
        assert!(!activated.is_expired_at(StateEpoch(19), 10));
        assert!(activated.is_expired_at(StateEpoch(20), 10));
    }
}
