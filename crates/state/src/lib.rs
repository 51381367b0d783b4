// Path: crates/state/src/lib.rs
//! # Verkle Core State Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
//! # Verkle Trie Core
//!
//! The tree state machine, commitment engine, and proof system that make up
//! a Verkle trie: insertion/deletion/lookup over a polymorphic node tree,
//! delta-based commitment maintenance, and aggregated multi-point proofs.
//! Curve and field arithmetic are supplied by a [`verkle_api::commitment::CommitmentBackend`];
//! this crate never constructs a scalar or group element except through it.

/// Node width, active-window policy, and other tunables.
pub mod config;
/// The polymorphic node tree and its mutation/lookup operations.
pub mod node;
/// Canonical bit-exact node/proof serialization.
pub mod codec;
/// Per-node polynomial layout and commitment helpers.
pub mod commitment;
/// The mutable tree state machine built on top of `node`.
pub mod tree;
/// Parallel batch leaf construction and bulk ordered insertion.
pub mod batch;
/// Proof path collection, aggregation, wire format, and stateless reconstruction.
pub mod proof;

/// A curated set of the most commonly used types.
pub mod prelude {
    pub use crate::config::{StateEpoch, VerkleTreeConfig};
    pub use crate::node::VerkleNode;
    pub use crate::proof::{Proof, ProofElements, StateDiff, StemStateDiff};
    pub use crate::tree::VerkleTree;
}
