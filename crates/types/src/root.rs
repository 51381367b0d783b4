//! Helpers for anchoring a 32-byte root hash to a (possibly wider)
//! commitment representation.

use dcrypt::algorithms::hash::{HashFunction, Sha256};
use dcrypt::algorithms::ByteSerializable;

/// A 32-byte anchor hash of a tree's root commitment.
///
/// Commitment group elements may be wider than 32 bytes (see
/// `CommitmentBackend::POINT_BYTES`); `RootHash` is the fixed-size digest
/// used wherever a block header or proof needs a constant-size anchor.
pub type RootHash = [u8; 32];

/// Hashes arbitrary commitment bytes down to a fixed 32-byte anchor.
///
/// If `bytes` is already 32 bytes it is used verbatim (the common case for a
/// backend whose native point encoding happens to be 32 bytes); otherwise it
/// is SHA-256 hashed.
pub fn to_root_hash<C: AsRef<[u8]>>(bytes: C) -> RootHash {
    let s = bytes.as_ref();
    if let Ok(fixed) = <[u8; 32]>::try_from(s) {
        fixed
    } else {
        let digest = Sha256::digest(s).expect("sha256 digest is infallible").to_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..32]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_root_hash_passes_through_32_bytes() {
        let bytes = [9u8; 32];
        assert_eq!(to_root_hash(bytes), bytes);
    }

    #[test]
    fn to_root_hash_hashes_other_lengths() {
        let bytes = [9u8; 48];
        let hash = to_root_hash(bytes);
        assert_ne!(hash.to_vec(), bytes[..32].to_vec());
    }
}
