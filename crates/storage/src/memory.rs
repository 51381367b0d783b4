// Path: crates/storage/src/memory.rs

//! A minimal in-memory node store, useful for tests and for embedding the
//! tree without a durable backend.

use ahash::AHashMap;
use std::sync::RwLock;
use verkle_api::storage::{FlushSink, NodeHash, NodeResolver, StorageError};
use verkle_types::root::RootHash;

/// Keeps every flushed node in memory, keyed by its content hash.
#[derive(Default)]
pub struct InMemoryNodeStore {
    nodes: RwLock<AHashMap<[u8; 32], Vec<u8>>>,
    last_root: RwLock<Option<RootHash>>,
}

impl InMemoryNodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently flushed root, if any.
    pub fn last_root(&self) -> Option<RootHash> {
        *self.last_root.read().expect("lock poisoned")
    }

    /// Number of distinct nodes currently held.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().expect("lock poisoned").is_empty()
    }
}

impl NodeResolver for InMemoryNodeStore {
    fn resolve(&self, hash: NodeHash) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.nodes.read().expect("lock poisoned").get(&hash.0).cloned())
    }
}

impl FlushSink for InMemoryNodeStore {
    fn flush_node(&self, hash: NodeHash, bytes: &[u8]) -> Result<(), StorageError> {
        self.nodes
            .write()
            .expect("lock poisoned")
            .insert(hash.0, bytes.to_vec());
        Ok(())
    }

    fn flush_root(&self, root: RootHash) -> Result<(), StorageError> {
        *self.last_root.write().expect("lock poisoned") = Some(root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_returns_none_for_unknown_hash() {
        let store = InMemoryNodeStore::new();
        assert_eq!(store.resolve(NodeHash([7u8; 32])).expect("resolve ok"), None);
    }

    #[test]
    fn flushed_nodes_round_trip() {
        let store = InMemoryNodeStore::new();
        store.flush_node(NodeHash([1u8; 32]), &[1, 2, 3]).expect("flush ok");
        store.flush_root([9u8; 32]).expect("flush ok");

        assert_eq!(
            store.resolve(NodeHash([1u8; 32])).expect("resolve ok"),
            Some(vec![1, 2, 3])
        );
        assert_eq!(store.last_root(), Some([9u8; 32]));
        assert_eq!(store.len(), 1);
    }
}
