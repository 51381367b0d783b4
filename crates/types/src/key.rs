//! The 32-byte key addressing scheme: a 31-byte stem plus a 1-byte suffix.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Number of children per internal node and the length of every node's
/// commitment polynomial (fan-out 256, one slot per possible key byte).
pub const NODE_WIDTH: usize = 256;

/// Number of suffixes committed to by each of a leaf's two sub-commitments.
pub const SUFFIX_HALF_WIDTH: usize = NODE_WIDTH / 2;

/// A full 32-byte tree key: `stem || suffix`.
pub type Key = [u8; 32];

/// The 31-byte prefix of a key that identifies a leaf.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct Stem(pub [u8; 31]);

impl Stem {
    /// Extracts the stem from a full 32-byte key.
    pub fn from_key(key: &Key) -> Self {
        let mut out = [0u8; 31];
        out.copy_from_slice(&key[..31]);
        Stem(out)
    }

    /// The suffix byte that, together with this stem, re-forms `key`.
    pub fn suffix_of(key: &Key) -> u8 {
        key[31]
    }

    /// Re-forms the full 32-byte key from this stem and a suffix byte.
    pub fn with_suffix(&self, suffix: u8) -> Key {
        let mut out = [0u8; 32];
        out[..31].copy_from_slice(&self.0);
        out[31] = suffix;
        out
    }

    /// Truncates an arbitrary byte slice (e.g. a wire-format 32-byte key) to
    /// a stem, per spec.md §6.1's "truncated to 31 bytes on entry" rule.
    pub fn truncate_from(bytes: &[u8]) -> Self {
        let mut out = [0u8; 31];
        let n = bytes.len().min(31);
        out[..n].copy_from_slice(&bytes[..n]);
        Stem(out)
    }

    /// The first byte index at which `self` and `other` diverge, if any.
    pub fn first_divergence(&self, other: &Stem) -> Option<usize> {
        self.0.iter().zip(other.0.iter()).position(|(a, b)| a != b)
    }
}

impl std::fmt::Debug for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stem({})", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Stem {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_suffix_roundtrip() {
        let mut key = [0u8; 32];
        key[..31].copy_from_slice(&[7u8; 31]);
        key[31] = 0x80;
        let stem = Stem::from_key(&key);
        assert_eq!(Stem::suffix_of(&key), 0x80);
        assert_eq!(stem.with_suffix(0x80), key);
    }

    #[test]
    fn divergence_detects_first_differing_byte() {
        let mut a = [1u8; 31];
        let mut b = a;
        b[5] = 9;
        let (sa, sb) = (Stem(a), Stem(b));
        assert_eq!(sa.first_divergence(&sb), Some(5));
        a[5] = 9;
        assert_eq!(Stem(a).first_divergence(&sb), None);
    }
}
