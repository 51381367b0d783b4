// Path: crates/crypto/src/error.rs
//! Local error alias for the `verkle-crypto` crate.

// Re-export the canonical error type from the base types crate.
pub use verkle_types::error::VerkleError as CryptoError;
