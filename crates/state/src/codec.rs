// Path: crates/state/src/codec.rs
//! Canonical node encoding: a bit-exact wire format for `InternalNode`,
//! `LeafNode`, and `ExpiredLeaf`, generalized from the 32-byte-point layout
//! to the backend's actual `POINT_BYTES` width (see `DESIGN.md`'s resolved
//! Open Question on the default commitment backend).
//!
//! `HashedNode`/`Empty`/`Unknown` have no wire representation: a node's own
//! commitment travels separately (the parent already holds it), so encoding
//! either of these placeholder-only variants is a programming error.

use crate::config::NODE_WIDTH;
use crate::node::{InternalNode, LeafNode, VerkleNode};
use std::collections::BTreeMap;
use std::sync::Arc;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::error::VerkleError;
use verkle_types::key::Stem;

const TAG_INTERNAL: u8 = 1;
const TAG_LEAF: u8 = 2;
const TAG_EXPIRED_LEAF: u8 = 3;

const BITLIST_BYTES: usize = NODE_WIDTH / 8;

fn bitlist_from_slots(occupied: impl Iterator<Item = u8>) -> [u8; BITLIST_BYTES] {
    let mut bits = [0u8; BITLIST_BYTES];
    for slot in occupied {
        let byte = (slot as usize) / 8;
        let bit = (slot as usize) % 8;
        // MSB-first within a byte: bit 0 of the bitlist is 0x80.
        if let Some(b) = bits.get_mut(byte) {
            *b |= 0x80 >> bit;
        }
    }
    bits
}

fn slots_from_bitlist(bits: &[u8; BITLIST_BYTES]) -> Vec<u8> {
    let mut out = Vec::new();
    for (byte_index, byte) in bits.iter().enumerate() {
        for bit in 0..8u8 {
            if byte & (0x80 >> bit) != 0 {
                #[allow(clippy::cast_possible_truncation)]
                out.push((byte_index * 8) as u8 + bit);
            }
        }
    }
    out
}

/// Encodes an `InternalNode`: `[1][bitlist:32][child_commitments...]`.
pub fn encode_internal<B: CommitmentBackend>(backend: &B, node: &InternalNode<B>) -> Vec<u8> {
    let bits = bitlist_from_slots(node.children.keys().copied());
    let mut out = Vec::with_capacity(1 + BITLIST_BYTES + node.children.len() * B::POINT_BYTES);
    out.push(TAG_INTERNAL);
    out.extend_from_slice(&bits);
    for child in node.children.values() {
        out.extend_from_slice(&backend.point_to_bytes(&child.commitment_with(backend)));
    }
    out
}

/// Encodes a `LeafNode`: `[2][stem:31][bitlist:32][c1][c2][values...]`.
pub fn encode_leaf<B: CommitmentBackend>(backend: &B, leaf: &LeafNode<B>) -> Vec<u8> {
    let bits = bitlist_from_slots(leaf.values.keys().copied());
    let mut out = Vec::with_capacity(
        1 + 31 + BITLIST_BYTES + 2 * B::POINT_BYTES + leaf.values.len() * 32,
    );
    out.push(TAG_LEAF);
    out.extend_from_slice(leaf.stem.as_ref());
    out.extend_from_slice(&bits);
    out.extend_from_slice(&backend.point_to_bytes(&leaf.c1));
    out.extend_from_slice(&backend.point_to_bytes(&leaf.c2));
    for value in leaf.values.values() {
        let mut padded = [0u8; 32];
        let n = value.len().min(32);
        padded[..n].copy_from_slice(&value[..n]);
        out.extend_from_slice(&padded);
    }
    out
}

/// Encodes an `ExpiredLeaf`: `[3][stem:31][commitment]` (uncompressed width
/// is backend-defined; this crate uses the backend's standard encoding).
pub fn encode_expired_leaf<B: CommitmentBackend>(backend: &B, stem: &Stem, commitment: &B::Point) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 31 + B::POINT_BYTES);
    out.push(TAG_EXPIRED_LEAF);
    out.extend_from_slice(stem.as_ref());
    out.extend_from_slice(&backend.point_to_bytes(commitment));
    out
}

/// Encodes any occupied [`VerkleNode`] variant. Fails for `Empty`/`Hashed`/`Unknown`.
pub fn encode_node<B: CommitmentBackend>(backend: &B, node: &VerkleNode<B>) -> Result<Vec<u8>, VerkleError> {
    match node {
        VerkleNode::Internal(internal) => Ok(encode_internal(backend, internal)),
        VerkleNode::Leaf(leaf) => Ok(encode_leaf(backend, leaf)),
        VerkleNode::ExpiredLeaf { stem, commitment } => Ok(encode_expired_leaf(backend, stem, commitment)),
        VerkleNode::Empty => Err(VerkleError::SerializeEmpty),
        VerkleNode::Hashed { .. } => Err(VerkleError::SerializeHashedNode),
        VerkleNode::Unknown => Err(VerkleError::SerializeEmpty),
    }
}

/// Parses an encoded node at `depth`, given its own commitment bytes (the
/// parent already holds the commitment; it is not part of the encoding).
pub fn decode_node<B: CommitmentBackend>(
    backend: &B,
    bytes: &[u8],
    depth: u8,
    commitment_bytes: &[u8],
) -> Result<VerkleNode<B>, VerkleError> {
    let tag = *bytes
        .first()
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: 1, got: 0 })?;
    let rest = bytes.get(1..).unwrap_or(&[]);
    match tag {
        TAG_INTERNAL => decode_internal(backend, rest, depth, commitment_bytes),
        TAG_LEAF => decode_leaf(backend, rest, depth),
        TAG_EXPIRED_LEAF => decode_expired_leaf(backend, rest),
        other => Err(VerkleError::InvalidNodeEncoding(format!("unknown node tag {other}"))),
    }
}

fn decode_internal<B: CommitmentBackend>(
    backend: &B,
    bytes: &[u8],
    depth: u8,
    commitment_bytes: &[u8],
) -> Result<VerkleNode<B>, VerkleError> {
    let bits: [u8; BITLIST_BYTES] = bytes
        .get(..BITLIST_BYTES)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort {
            need: BITLIST_BYTES,
            got: bytes.len(),
        })?;
    let slots = slots_from_bitlist(&bits);
    let mut cursor = BITLIST_BYTES;
    let mut children = BTreeMap::new();
    for slot in slots {
        let point_bytes = bytes
            .get(cursor..cursor + B::POINT_BYTES)
            .ok_or_else(|| VerkleError::SerializedPayloadTooShort {
                need: cursor + B::POINT_BYTES,
                got: bytes.len(),
            })?;
        let commitment = backend.point_from_bytes(point_bytes)?;
        children.insert(slot, Arc::new(VerkleNode::Hashed { commitment }));
        cursor += B::POINT_BYTES;
    }
    let commitment = backend.point_from_bytes(commitment_bytes)?;
    Ok(VerkleNode::Internal(InternalNode { depth, children, commitment }))
}

fn decode_leaf<B: CommitmentBackend>(backend: &B, bytes: &[u8], depth: u8) -> Result<VerkleNode<B>, VerkleError> {
    let stem_bytes = bytes
        .get(..31)
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: 31, got: bytes.len() })?;
    let stem = Stem::truncate_from(stem_bytes);
    let mut cursor = 31;
    let bits: [u8; BITLIST_BYTES] = bytes
        .get(cursor..cursor + BITLIST_BYTES)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort {
            need: cursor + BITLIST_BYTES,
            got: bytes.len(),
        })?;
    cursor += BITLIST_BYTES;
    let slots = slots_from_bitlist(&bits);

    let c1_bytes = bytes
        .get(cursor..cursor + B::POINT_BYTES)
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: cursor + B::POINT_BYTES, got: bytes.len() })?;
    let c1 = backend.point_from_bytes(c1_bytes)?;
    cursor += B::POINT_BYTES;
    let c2_bytes = bytes
        .get(cursor..cursor + B::POINT_BYTES)
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: cursor + B::POINT_BYTES, got: bytes.len() })?;
    let c2 = backend.point_from_bytes(c2_bytes)?;
    cursor += B::POINT_BYTES;

    let mut values = BTreeMap::new();
    for slot in slots {
        let value_bytes = bytes
            .get(cursor..cursor + 32)
            .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: cursor + 32, got: bytes.len() })?;
        values.insert(slot, value_bytes.to_vec());
        cursor += 32;
    }

    let commitment = crate::commitment::leaf_commitment_from_halves(backend, &stem, &c1, &c2)?;
    Ok(VerkleNode::Leaf(LeafNode {
        stem,
        depth,
        epoch: crate::config::StateEpoch::ZERO,
        values,
        c1,
        c2,
        commitment,
    }))
}

fn decode_expired_leaf<B: CommitmentBackend>(backend: &B, bytes: &[u8]) -> Result<VerkleNode<B>, VerkleError> {
    let stem_bytes = bytes
        .get(..31)
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: 31, got: bytes.len() })?;
    let stem = Stem::truncate_from(stem_bytes);
    let point_bytes = bytes
        .get(31..31 + B::POINT_BYTES)
        .ok_or_else(|| VerkleError::SerializedPayloadTooShort { need: 31 + B::POINT_BYTES, got: bytes.len() })?;
    let commitment = backend.point_from_bytes(point_bytes)?;
    Ok(VerkleNode::ExpiredLeaf { stem, commitment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::build_leaf_commitments;
    use verkle_crypto::bls_commitment::Bls12DegreeCommitment;

    fn backend() -> Bls12DegreeCommitment {
        Bls12DegreeCommitment::new_for_testing(11, NODE_WIDTH)
    }

    #[test]
    fn leaf_round_trips_through_encode_decode() {
        let backend = backend();
        let stem = Stem([4u8; 31]);
        let mut values = BTreeMap::new();
        values.insert(1u8, vec![0xAAu8; 32]);
        values.insert(200u8, vec![0xBBu8; 32]);
        let commits = build_leaf_commitments(&backend, &stem, &values).expect("commits");
        let leaf = LeafNode {
            stem,
            depth: 1,
            epoch: crate::config::StateEpoch::ZERO,
            values,
            c1: commits.c1,
            c2: commits.c2,
            commitment: commits.commitment,
        };
        let bytes = encode_leaf(&backend, &leaf);
        let decoded = decode_node(&backend, &bytes, 1, &backend.point_to_bytes(&leaf.commitment))
            .expect("decode");
        match decoded {
            VerkleNode::Leaf(decoded_leaf) => {
                assert_eq!(decoded_leaf.stem, leaf.stem);
                assert_eq!(decoded_leaf.values, leaf.values);
                assert_eq!(decoded_leaf.commitment, leaf.commitment);
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn internal_bitlist_round_trips_slot_positions() {
        let bits = bitlist_from_slots([0u8, 7, 8, 255].into_iter());
        let slots = slots_from_bitlist(&bits);
        assert_eq!(slots, vec![0, 7, 8, 255]);
    }
}
