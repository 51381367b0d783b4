// Path: crates/api/src/lib.rs

//! # Verkle Core API Crate Lints
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
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Verkle Core API
//!
//! The trait seams between the tree state machine and its two pluggable
//! dependencies: a vector-commitment backend and a node store.

/// Defines the `CommitmentBackend` trait for pluggable vector commitments.
pub mod commitment;
/// API for resolving hashed node placeholders and flushing touched nodes.
pub mod storage;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::commitment::{CommitmentBackend, Opening};
    pub use crate::storage::{FlushSink, NodeHash, NodeResolver, NullResolver, NullSink, StorageError};
}
