//! Token chain ID derivation.
//!
//! A chain ID is the double-SHA256 of the concatenation of the SHA256 of
//! each of the chain's external IDs, applied here to
//! `(token_id, "0", issuer_chain_id)`.

use sha2::{Digest, Sha256};

use crate::error::Error;

/// A 32-byte chain ID, always rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct ChainId([u8; 32]);

impl ChainId {
    pub fn parse(hex_str: &str) -> Result<ChainId, Error> {
        if hex_str.len() != 64 {
            return Err(Error::InvalidChainId(hex_str.to_string()));
        }
        let bytes = hex::decode(hex_str).map_err(|_| Error::InvalidChainId(hex_str.to_string()))?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(ChainId(out))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> ChainId {
        ChainId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChainId").field(&self.to_hex()).finish()
    }
}

/// `H(a, b, c)` — the chain-ID function of the underlying chain system,
/// applied to three external IDs.
fn chain_id_of(ext_ids: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for ext_id in ext_ids {
        hasher.update(Sha256::digest(ext_id));
    }
    let first = hasher.finalize();
    let second = Sha256::digest(&first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

/// `compute_token_chain_id` — derives the chain ID a FAT token's
/// transactions are written to, from its token ID and its issuer's
/// identity chain ID.
pub fn compute_token_chain_id(token_id: &str, issuer_chain_id: &ChainId) -> ChainId {
    let bytes = chain_id_of(&[token_id.as_bytes(), b"0", issuer_chain_id.as_bytes()]);
    ChainId::from_bytes(bytes)
}
