// Path: crates/storage/src/adapter.rs

//! Bookkeeping glue between the tree's in-memory mutations and a
//! [`FlushSink`]: a `DeltaAccumulator` collects every node touched since the
//! last `Commit`, and `flush` drains it through the sink in one pass.

use ahash::{AHashMap, AHashSet};
use verkle_api::storage::{FlushSink, NodeHash, StorageError};
use verkle_types::root::RootHash;

/// Accumulates the nodes touched by a batch of tree mutations so they can be
/// flushed to a [`FlushSink`] in one pass, instead of writing through on
/// every single insert/delete.
#[derive(Default, Debug, Clone)]
pub struct DeltaAccumulator {
    touched: AHashSet<[u8; 32]>,
    new_nodes: AHashMap<[u8; 32], Vec<u8>>,
}

impl DeltaAccumulator {
    /// Records that `node_hash` is reachable from the tree as of this delta,
    /// without necessarily being new.
    #[inline]
    pub fn record_touch(&mut self, node_hash: [u8; 32]) {
        self.touched.insert(node_hash);
    }

    /// Records a node's canonical bytes as newly introduced in this delta.
    #[inline]
    pub fn record_new(&mut self, node_hash: [u8; 32], bytes: Vec<u8>) {
        self.touched.insert(node_hash);
        self.new_nodes.entry(node_hash).or_insert(bytes);
    }

    /// The number of distinct nodes touched since the last [`Self::clear`].
    pub fn len(&self) -> usize {
        self.touched.len()
    }

    /// Whether any node has been touched since the last [`Self::clear`].
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Drops every recorded touch and new-node entry.
    pub fn clear(&mut self) {
        self.touched.clear();
        self.new_nodes.clear();
    }
}

/// Drains `delta` through `sink`, then records `root` and clears `delta`.
///
/// Call this once per `Commit`, after the in-memory tree has its final root.
pub fn flush_delta<S: FlushSink + ?Sized>(
    sink: &S,
    root: RootHash,
    delta: &mut DeltaAccumulator,
) -> Result<(), StorageError> {
    for (hash, bytes) in &delta.new_nodes {
        sink.flush_node(NodeHash(*hash), bytes)?;
    }
    sink.flush_root(root)?;
    delta.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        nodes: Mutex<Vec<([u8; 32], Vec<u8>)>>,
        roots: Mutex<Vec<RootHash>>,
    }

    impl FlushSink for RecordingSink {
        fn flush_node(&self, hash: NodeHash, bytes: &[u8]) -> Result<(), StorageError> {
            self.nodes.lock().expect("lock poisoned").push((hash.0, bytes.to_vec()));
            Ok(())
        }

        fn flush_root(&self, root: RootHash) -> Result<(), StorageError> {
            self.roots.lock().expect("lock poisoned").push(root);
            Ok(())
        }
    }

    #[test]
    fn flush_drains_and_clears_the_accumulator() {
        let mut delta = DeltaAccumulator::default();
        delta.record_new([1u8; 32], vec![0xAA]);
        delta.record_touch([2u8; 32]);
        assert_eq!(delta.len(), 2);

        let sink = RecordingSink::default();
        flush_delta(&sink, [9u8; 32], &mut delta).expect("flush succeeds");

        assert!(delta.is_empty());
        assert_eq!(sink.nodes.lock().expect("lock poisoned").len(), 1);
        assert_eq!(sink.roots.lock().expect("lock poisoned").as_slice(), &[[9u8; 32]]);
    }
}
