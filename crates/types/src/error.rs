//! The core's error taxonomy (spec.md §7), realized as one `thiserror`-derived
//! enum grouped into the five families the spec names. Every variant also
//! carries a stable machine-readable code via `ErrorCode`, matching this
//! workspace's established pairing of human `Display` text with a code
//! suitable for log correlation.

use thiserror::Error;

/// Assigns a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// The unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// The unified error type for every operation the core exposes.
#[derive(Debug, Error)]
pub enum VerkleError {
    // --- Structural: an operation attempted on a node variant that
    // cannot honor it (spec.md §7 "Structural"). ---
    /// `Insert`/`InsertStem` reached a `HashedNode` with no resolver supplied.
    #[error("cannot insert into a hashed node without a resolver")]
    InsertIntoHashed,
    /// `Insert`/`InsertStem` reached an `UnknownNode` (stateless placeholder).
    #[error("cannot insert into an unresolved node in a stateless tree")]
    InsertIntoUnknown,
    /// `Delete` reached a `HashedNode` with no resolver supplied.
    #[error("cannot delete from a hashed node without a resolver")]
    DeleteFromHashed,
    /// A read was attempted against a node variant that cannot answer it.
    #[error("cannot read from an invalid node in this context")]
    ReadFromInvalid,

    // --- Missing data ---
    /// The tree is stateless and the needed sub-tree was never proven.
    #[error("missing node in stateless tree at path {0}")]
    MissingNodeInStateless(String),
    /// The caller-supplied resolver failed to produce node bytes.
    #[error("resolver failed: {0}")]
    Resolver(String),

    // --- Policy ---
    /// The node's retention window has elapsed; all reads/writes are rejected.
    #[error("node expired (epoch policy)")]
    Expired,

    // --- Encoding ---
    /// A serialized node did not match any known tag/shape.
    #[error("invalid node encoding: {0}")]
    InvalidNodeEncoding(String),
    /// A serialized payload was shorter than its fixed-size header requires.
    #[error("serialized payload too short: need at least {need} bytes, got {got}")]
    SerializedPayloadTooShort {
        /// Minimum required length.
        need: usize,
        /// Actual length supplied.
        got: usize,
    },
    /// A `HashedNode` cannot be serialized (it carries no content to encode).
    #[error("cannot serialize a hashed node placeholder")]
    SerializeHashedNode,
    /// An `Empty` node cannot be serialized (it has no wire representation).
    #[error("cannot serialize an empty node")]
    SerializeEmpty,

    // --- Proof ---
    /// Proof construction was asked to prove zero keys.
    #[error("no key provided to prove")]
    NoKeyProvided,
    /// A commitment's byte representation could not be parsed by the backend.
    #[error("invalid commitment bytes")]
    InvalidCommitmentBytes,
    /// A `MultiProof` failed to verify against the supplied openings.
    #[error("multi-proof verification failed")]
    ProofVerificationFailed,
    /// A `VerkleProof` could not be decoded from its wire format.
    #[error("proof deserialization failed: {0}")]
    ProofDeserialization(String),

    // --- Backend / configuration ---
    /// The pluggable `CommitmentBackend` reported a failure.
    #[error("commitment backend error: {0}")]
    Crypto(String),
    /// A value exceeded the configured size limit.
    #[error("value too large: {len} bytes exceeds the {max} byte limit")]
    ValueTooLarge {
        /// The offending value's length.
        len: usize,
        /// The configured maximum.
        max: usize,
    },
}

impl ErrorCode for VerkleError {
    fn code(&self) -> &'static str {
        match self {
            Self::InsertIntoHashed => "VERKLE_INSERT_INTO_HASHED",
            Self::InsertIntoUnknown => "VERKLE_INSERT_INTO_UNKNOWN",
            Self::DeleteFromHashed => "VERKLE_DELETE_FROM_HASHED",
            Self::ReadFromInvalid => "VERKLE_READ_FROM_INVALID",
            Self::MissingNodeInStateless(_) => "VERKLE_MISSING_NODE_STATELESS",
            Self::Resolver(_) => "VERKLE_RESOLVER_ERROR",
            Self::Expired => "VERKLE_EXPIRED",
            Self::InvalidNodeEncoding(_) => "VERKLE_INVALID_NODE_ENCODING",
            Self::SerializedPayloadTooShort { .. } => "VERKLE_PAYLOAD_TOO_SHORT",
            Self::SerializeHashedNode => "VERKLE_SERIALIZE_HASHED",
            Self::SerializeEmpty => "VERKLE_SERIALIZE_EMPTY",
            Self::NoKeyProvided => "VERKLE_NO_KEY_PROVIDED",
            Self::InvalidCommitmentBytes => "VERKLE_INVALID_COMMITMENT_BYTES",
            Self::ProofVerificationFailed => "VERKLE_PROOF_VERIFICATION_FAILED",
            Self::ProofDeserialization(_) => "VERKLE_PROOF_DESERIALIZATION",
            Self::Crypto(_) => "VERKLE_CRYPTO_ERROR",
            Self::ValueTooLarge { .. } => "VERKLE_VALUE_TOO_LARGE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_stable_code() {
        let err = VerkleError::Expired;
        assert_eq!(err.code(), "VERKLE_EXPIRED");
    }
}
