// Path: crates/api/src/storage/mod.rs

//! API for resolving `HashedNode` placeholders and flushing newly touched
//! nodes, narrowed from a full durable node store down to the two seams the
//! tree state machine actually calls through.

use thiserror::Error;
use verkle_types::root::RootHash;

/// A 32-byte content-addressed hash of a node's canonical serialized form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHash(pub [u8; 32]);

impl std::fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeHash({})", hex::encode(self.0))
    }
}

/// Errors surfaced by a [`NodeResolver`] or [`FlushSink`] implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying backend reported a failure.
    #[error("backend error: {0}")]
    Backend(String),
    /// The requested node hash was not found.
    #[error("node not found: {0:?}")]
    NotFound(NodeHash),
}

/// Resolves a `HashedNode` placeholder to its canonical serialized bytes.
///
/// The tree calls through this trait whenever a traversal reaches a node
/// that has been replaced with its commitment-only placeholder; it never
/// assumes any particular persistence mechanism behind it.
pub trait NodeResolver: Send + Sync {
    /// Returns the canonical encoded bytes for `hash`, if known.
    fn resolve(&self, hash: NodeHash) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Receives nodes that became reachable (or newly rooted) after a `Commit`,
/// so a caller can persist them without the tree knowing how.
pub trait FlushSink: Send + Sync {
    /// Called once per node touched since the last flush, in no particular
    /// order, with its canonical encoding.
    fn flush_node(&self, hash: NodeHash, bytes: &[u8]) -> Result<(), StorageError>;

    /// Called once per `Commit`, recording the resulting root.
    fn flush_root(&self, root: RootHash) -> Result<(), StorageError>;
}

/// A resolver with no backing store: every lookup is a miss. Useful for a
/// fully in-memory tree that never expects a `HashedNode` placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl NodeResolver for NullResolver {
    fn resolve(&self, _hash: NodeHash) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }
}

/// A sink that discards every flush. Useful for tests that don't care about
/// persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FlushSink for NullSink {
    fn flush_node(&self, _hash: NodeHash, _bytes: &[u8]) -> Result<(), StorageError> {
        Ok(())
    }

    fn flush_root(&self, _root: RootHash) -> Result<(), StorageError> {
        Ok(())
    }
}
