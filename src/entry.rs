//! The canonical wire form a transaction or issuance commits to the chain
//! as: a chain ID, an ordered list of external-ID byte strings, and a
//! content payload.

use sha2::{Digest, Sha256, Sha512};

use crate::chain_id::ChainId;

/// Redeem-Condition Datastructure tag for "authorized by a single Ed25519
/// signature".
pub const RCD_TYPE_1: u8 = 0x01;

/// One RCD: `RCD_TYPE_1 ‖ 32-byte Ed25519 public key`.
pub fn rcd(public_key: &[u8; 32]) -> [u8; 33] {
    let mut out = [0u8; 33];
    out[0] = RCD_TYPE_1;
    out[1..].copy_from_slice(public_key);
    out
}

/// A chain entry: what a [`crate::transaction`] or [`crate::issuance`]
/// value actually submits to the underlying ledger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub chain_id: ChainId,
    pub ext_ids: Vec<Vec<u8>>,
    pub content: Vec<u8>,
}

impl Entry {
    pub fn new(chain_id: ChainId, ext_ids: Vec<Vec<u8>>, content: Vec<u8>) -> Entry {
        Entry {
            chain_id,
            ext_ids,
            content,
        }
    }
}

/// The content-addressed hash of an entry: `SHA256(SHA512(chain_id ‖
/// length-prefixed ext_ids ‖ content))`, the underlying chain system's own
/// commitment scheme (out of scope to reimplement in full — this mirrors
/// its two-round digest shape).
pub fn entry_hash(entry: &Entry) -> [u8; 32] {
    let mut buf = Vec::new();
    buf.extend_from_slice(entry.chain_id.as_bytes());
    for ext_id in &entry.ext_ids {
        buf.extend_from_slice(&(ext_id.len() as u16).to_be_bytes());
        buf.extend_from_slice(ext_id);
    }
    buf.extend_from_slice(&entry.content);

    let inner = Sha512::digest(&buf);
    let outer = Sha256::digest(&inner);
    let mut out = [0u8; 32];
    out.copy_from_slice(&outer);
    out
}
