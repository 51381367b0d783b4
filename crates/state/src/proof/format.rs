// Path: crates/state/src/proof/format.rs
//! JSON-friendly wire types for a proof's state diff: `StateDiff` is an
//! ordered list of per-stem `StemStateDiff`, each carrying one `SuffixDiff`
//! per queried suffix, hex-encoded per spec.md §6.2.

use super::Proof;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::key::Stem;

/// One suffix's current/new value pair within a [`StemStateDiff`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuffixDiff {
    /// The suffix byte within the stem.
    pub suffix: u8,
    /// The value under the pre-state root, hex-encoded; `None` if absent.
    #[serde(rename = "currentValue", skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    /// The value under the post-state root, hex-encoded; `None` if unchanged
    /// or this proof carries no post-state.
    #[serde(rename = "newValue", skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// One stem's worth of suffix diffs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StemStateDiff {
    /// The 31-byte stem, hex-encoded.
    pub stem: String,
    /// Suffix diffs for this stem, in ascending suffix order.
    #[serde(rename = "suffixDiffs")]
    pub suffix_diffs: Vec<SuffixDiff>,
}

/// An ordered list of per-stem diffs, the shape a verifier needs alongside a
/// [`Proof`] to reconstruct pre- and post-state trees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StateDiff(pub Vec<StemStateDiff>);

fn hex_value(value: &Option<Vec<u8>>) -> Option<String> {
    value.as_ref().map(hex::encode)
}

/// Builds a [`StateDiff`] from a [`Proof`]'s aligned `keys`/`pre_values`/
/// `post_values`, grouping by stem in the order stems first appear.
pub fn diff_from_proof<B: CommitmentBackend>(proof: &Proof<B>) -> StateDiff {
    let mut by_stem: BTreeMap<Stem, Vec<SuffixDiff>> = BTreeMap::new();
    for (i, key) in proof.keys.iter().enumerate() {
        let stem = Stem::from_key(key);
        let suffix = Stem::suffix_of(key);
        let current_value = proof.pre_values.get(i).and_then(hex_value);
        let new_value = proof
            .post_values
            .as_ref()
            .and_then(|post| post.get(i))
            .and_then(hex_value);
        by_stem.entry(stem).or_default().push(SuffixDiff {
            suffix,
            current_value,
            new_value,
        });
    }
    StateDiff(
        by_stem
            .into_iter()
            .map(|(stem, mut diffs)| {
                diffs.sort_by_key(|d| d.suffix);
                StemStateDiff {
                    stem: hex::encode(stem.as_ref()),
                    suffix_diffs: diffs,
                }
            })
            .collect(),
    )
}

/// A proof serialized for the wire: the aggregated multiproof and bookkeeping
/// are backend-specific, so this carries only the backend-independent parts
/// plus the backend's own byte encodings for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerkleProof {
    /// Hex-encoded opaque multiproof bytes.
    pub multi_proof: String,
    /// One status byte per stem, hex-encoded, in stem order.
    pub ext_status: Vec<u8>,
    /// Commitments by path: `(hex path, hex commitment)`, lexicographic by path.
    pub cs: Vec<(String, String)>,
    /// Hex-encoded stems proving absence-by-different-stem.
    pub poa_stems: Vec<String>,
    /// Hex-encoded 32-byte keys, aligned with the state diff.
    pub keys: Vec<String>,
}

/// Serializes a [`Proof`] to its wire form.
pub fn to_wire<B: CommitmentBackend>(backend: &B, proof: &Proof<B>) -> VerkleProof {
    VerkleProof {
        multi_proof: hex::encode(backend.proof_to_bytes(&proof.multi_proof)),
        ext_status: proof.ext_status.values().map(|s| s.to_byte()).collect(),
        cs: proof
            .cs
            .iter()
            .map(|(path, point)| (hex::encode(path), hex::encode(backend.point_to_bytes(point))))
            .collect(),
        poa_stems: proof.poa_stems.iter().map(|s| hex::encode(s.as_ref())).collect(),
        keys: proof.keys.iter().map(hex::encode).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_diff_omits_absent_values_from_json() {
        let diff = SuffixDiff { suffix: 1, current_value: None, new_value: None };
        let json = serde_json::to_string(&diff).expect("serialize");
        assert!(!json.contains("currentValue"));
        assert!(!json.contains("newValue"));
    }
}
