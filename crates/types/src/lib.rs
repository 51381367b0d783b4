// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Verkle Core Types
//!
//! Foundational data structures shared by every other crate in the workspace:
//! the key/stem addressing scheme, the unified error taxonomy, and the
//! root-hash anchoring helper.
//!
//! ## Architectural Role
//!
//! As the base crate, `verkle-types` has minimal dependencies and is a
//! dependency of almost every other crate in the workspace. This keeps the
//! dependency graph acyclic and gives every higher-level crate a single,
//! stable definition of the tree's addressing and error types.

/// The maximum size in bytes for a single leaf value.
pub const MAX_VALUE_BYTES: usize = 256 * 1024; // 256 KiB
/// The maximum size in bytes for a serialized proof.
pub const MAX_PROOF_BYTES: usize = 512 * 1024; // 512 KiB

/// A crate-wide `Result` alias defaulting to [`error::VerkleError`].
pub type Result<T, E = crate::error::VerkleError> = std::result::Result<T, E>;

/// The unified error taxonomy used across the workspace.
pub mod error;
/// The 32-byte key addressing scheme: a 31-byte stem plus a 1-byte suffix.
pub mod key;
/// The root-hash anchoring helper.
pub mod root;
