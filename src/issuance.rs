//! The issuance record: the entry a token issuer writes once to declare a
//! token's type, symbol, supply and metadata.
//!
//! Unlike [`crate::transaction`], an `Issuance` carries no inputs or
//! outputs and exactly one signature slot (the issuer identity key), so it
//! is modeled directly rather than through `TxCore`.

use ed25519_dalek::{Keypair, PublicKey as Ed25519PublicKey, SecretKey as Ed25519SecretKey, Signature, Signer, Verifier};
use sha2::{Digest, Sha512};

use crate::address::{IssuerPublicKey, IssuerSecretKey};
use crate::cached::Cached;
use crate::chain_id::ChainId;
use crate::entry::{self, Entry};
use crate::error::Error;

/// Which FAT standard an issuance declares.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenType {
    Fat0,
    Fat1,
}

impl TokenType {
    fn as_str(&self) -> &'static str {
        match self {
            TokenType::Fat0 => "FAT-0",
            TokenType::Fat1 => "FAT-1",
        }
    }

    fn parse(s: &str) -> Result<TokenType, Error> {
        match s {
            "FAT-0" => Ok(TokenType::Fat0),
            "FAT-1" => Ok(TokenType::Fat1),
            other => Err(Error::InvalidIssuanceEntry(format!("unknown type {:?}", other))),
        }
    }
}

/// `-1` denotes an unlimited supply; any other negative value is invalid.
fn validate_supply(supply: i64) -> Result<(), Error> {
    if supply < -1 {
        return Err(Error::InvalidSupply);
    }
    Ok(())
}

fn build_content(
    token_type: TokenType,
    token_id: &str,
    issuer_chain_id: &ChainId,
    supply: i64,
    symbol: Option<&str>,
    metadata: Option<&serde_json::Value>,
) -> Vec<u8> {
    let mut out = String::from("{\"type\":");
    out.push_str(&serde_json::to_string(token_type.as_str()).expect("a &str always serializes"));
    out.push_str(",\"tokenid\":");
    out.push_str(&serde_json::to_string(token_id).expect("a &str always serializes"));
    out.push_str(",\"issuerchainid\":");
    out.push_str(&serde_json::to_string(&issuer_chain_id.to_hex()).expect("a String always serializes"));
    out.push_str(",\"supply\":");
    out.push_str(&supply.to_string());
    if let Some(symbol) = symbol {
        out.push_str(",\"symbol\":");
        out.push_str(&serde_json::to_string(symbol).expect("a &str always serializes"));
    }
    if let Some(metadata) = metadata {
        out.push_str(",\"metadata\":");
        out.push_str(&serde_json::to_string(metadata).expect("a parsed Value always serializes"));
    }
    out.push('}');
    out.into_bytes()
}

fn marshal_data_sig(timestamp: i64, chain_id: &ChainId, content: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"0");
    buf.extend_from_slice(timestamp.to_string().as_bytes());
    buf.extend_from_slice(chain_id.as_bytes());
    buf.extend_from_slice(content);
    buf
}

fn signing_digest(timestamp: i64, chain_id: &ChainId, content: &[u8]) -> [u8; 64] {
    let digest = Sha512::digest(&marshal_data_sig(timestamp, chain_id, content));
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// An immutable, parsed-or-freshly-issued token issuance record.
#[derive(Clone, Debug)]
pub struct Issuance {
    token_type: TokenType,
    symbol: Option<String>,
    supply: i64,
    token_id: String,
    issuer_chain_id: ChainId,
    metadata: Option<serde_json::Value>,
    entry: Entry,
    timestamp: i64,
    entryhash: Cached<[u8; 32]>,
}

impl Issuance {
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// `-1` denotes unlimited supply.
    pub fn supply(&self) -> i64 {
        self.supply
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn issuer_chain_id(&self) -> &ChainId {
        &self.issuer_chain_id
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.entry.chain_id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn entry(&self) -> Entry {
        self.entry.clone()
    }

    pub fn entryhash(&self) -> [u8; 32] {
        self.entryhash.value().unwrap_or_else(|| entry::entry_hash(&self.entry))
    }

    /// Parses a previously-written issuance entry into a read-only accessor
    /// bag — the "parsed entry" construction path of §4.4. Does not
    /// re-verify the entry's signature; callers that need that must
    /// extract the RCD/signature from `entry.ext_ids` themselves.
    pub fn from_entry(entry: &Entry) -> Result<Issuance, Error> {
        let timestamp_bytes = entry
            .ext_ids
            .get(0)
            .ok_or_else(|| Error::InvalidIssuanceEntry("missing timestamp ext-id".to_string()))?;
        let timestamp_str = std::str::from_utf8(timestamp_bytes)
            .map_err(|_| Error::InvalidIssuanceEntry("timestamp ext-id is not UTF-8".to_string()))?;
        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| Error::InvalidIssuanceEntry("timestamp ext-id is not an integer".to_string()))?;

        let content: serde_json::Value = serde_json::from_slice(&entry.content)
            .map_err(|e| Error::InvalidIssuanceEntry(e.to_string()))?;
        let field = |key: &str| -> Result<&serde_json::Value, Error> {
            content
                .get(key)
                .ok_or_else(|| Error::InvalidIssuanceEntry(format!("missing field {:?}", key)))
        };

        let token_type = TokenType::parse(field("type")?.as_str().ok_or_else(|| {
            Error::InvalidIssuanceEntry("type is not a string".to_string())
        })?)?;
        let token_id = field("tokenid")?
            .as_str()
            .ok_or_else(|| Error::InvalidIssuanceEntry("tokenid is not a string".to_string()))?
            .to_string();
        let issuer_chain_id_hex = field("issuerchainid")?
            .as_str()
            .ok_or_else(|| Error::InvalidIssuanceEntry("issuerchainid is not a string".to_string()))?;
        let issuer_chain_id = ChainId::parse(issuer_chain_id_hex)?;
        let supply = field("supply")?
            .as_i64()
            .ok_or_else(|| Error::InvalidIssuanceEntry("supply is not an integer".to_string()))?;
        validate_supply(supply)?;
        let symbol = content
            .get("symbol")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let metadata = content.get("metadata").cloned();

        Ok(Issuance {
            token_type,
            symbol,
            supply,
            token_id,
            issuer_chain_id,
            metadata,
            entry: entry.clone(),
            timestamp,
            entryhash: Cached::new(),
        })
    }
}

/// Assembles a signed issuance entry. Exactly one of [`Self::sk1`]/
/// [`Self::id1`] determines the issuer identity key; `sk1` signs
/// immediately, `id1` alone leaves the slot empty (for an external signer).
pub struct IssuanceBuilder {
    chain_id: ChainId,
    token_type: TokenType,
    token_id: String,
    issuer_chain_id: ChainId,
    symbol: Option<String>,
    supply: i64,
    metadata: Option<serde_json::Value>,
    sk1: Option<IssuerSecretKey>,
    id1: Option<IssuerPublicKey>,
}

impl IssuanceBuilder {
    pub fn new(chain_id: ChainId, token_type: TokenType, token_id: impl Into<String>, issuer_chain_id: ChainId) -> Self {
        IssuanceBuilder {
            chain_id,
            token_type,
            token_id: token_id.into(),
            issuer_chain_id,
            symbol: None,
            supply: -1,
            metadata: None,
            sk1: None,
            id1: None,
        }
    }

    pub fn symbol(&mut self, symbol: impl Into<String>) -> &mut Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn supply(&mut self, supply: i64) -> Result<&mut Self, Error> {
        validate_supply(supply)?;
        self.supply = supply;
        Ok(self)
    }

    pub fn metadata(&mut self, value: impl serde::Serialize) -> Result<&mut Self, Error> {
        self.metadata = Some(serde_json::to_value(value).map_err(|e| Error::MetadataNotSerializable(e.to_string()))?);
        Ok(self)
    }

    pub fn sk1(&mut self, sk1: &str) -> Result<&mut Self, Error> {
        self.sk1 = Some(IssuerSecretKey::parse(sk1)?);
        Ok(self)
    }

    pub fn id1(&mut self, id1: &str) -> Result<&mut Self, Error> {
        self.id1 = Some(IssuerPublicKey::parse(id1)?);
        Ok(self)
    }

    pub fn build(self, timestamp: i64) -> Result<Issuance, Error> {
        let issuer_public = self
            .sk1
            .as_ref()
            .map(|sk1| sk1.public_key().to_bytes())
            .or_else(|| self.id1.as_ref().map(|id1| id1.to_bytes()))
            .ok_or(Error::MissingIssuerKey)?;

        let content = build_content(
            self.token_type,
            &self.token_id,
            &self.issuer_chain_id,
            self.supply,
            self.symbol.as_deref(),
            self.metadata.as_ref(),
        );

        let mut signature = None;
        if let Some(sk1) = &self.sk1 {
            let seed = sk1.to_seed();
            let secret = Ed25519SecretKey::from_bytes(&seed).expect("32-byte seed is always valid");
            let public: Ed25519PublicKey = (&secret).into();
            let keypair = Keypair { secret, public };
            let digest = signing_digest(timestamp, &self.chain_id, &content);
            signature = Some(keypair.sign(&digest).to_bytes());
        }

        let mut ext_ids = vec![timestamp.to_string().into_bytes()];
        ext_ids.push(entry::rcd(&issuer_public).to_vec());
        ext_ids.push(signature.map(|s| s.to_vec()).unwrap_or_default());

        let entry = Entry::new(self.chain_id, ext_ids, content);
        let hash = entry::entry_hash(&entry);

        Ok(Issuance {
            token_type: self.token_type,
            symbol: self.symbol,
            supply: self.supply,
            token_id: self.token_id,
            issuer_chain_id: self.issuer_chain_id,
            metadata: self.metadata,
            entry,
            timestamp,
            entryhash: Cached::from(hash),
        })
    }

    /// Convenience over [`Self::build`] that stamps the issuance with the
    /// current Unix time.
    pub fn build_now(self) -> Result<Issuance, Error> {
        self.build(chrono::Utc::now().timestamp())
    }
}

/// Recomputes the issuer signature's digest and verifies it against the
/// entry's stored RCD and signature ext-ids. Mirrors
/// [`crate::transaction::Fat0Transaction::validate_signatures`] but for the
/// single issuer slot; not part of the consumer-facing accessor set in
/// §6.4 but useful to callers that hold the private key and want to
/// self-check before submission.
pub fn validate_signature(issuance: &Issuance) -> bool {
    let rcd = match issuance.entry.ext_ids.get(1) {
        Some(rcd) if rcd.len() == 33 => rcd,
        _ => return false,
    };
    let signature = match issuance.entry.ext_ids.get(2) {
        Some(sig) if sig.len() == 64 => sig,
        _ => return false,
    };

    let mut public_key_bytes = [0u8; 32];
    public_key_bytes.copy_from_slice(&rcd[1..]);
    let public_key = match Ed25519PublicKey::from_bytes(&public_key_bytes) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    let signature = match Signature::from_bytes(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let digest = signing_digest(issuance.timestamp, &issuance.entry.chain_id, &issuance.entry.content);
    public_key.verify(&digest, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::test_encode;
    use crate::error::AddressRole;

    fn chain_id() -> ChainId {
        ChainId::from_bytes([0x31; 32])
    }

    fn issuer_chain_id() -> ChainId {
        ChainId::from_bytes([0x32; 32])
    }

    #[test]
    fn builder_signs_with_sk1() {
        let sk1 = test_encode(AddressRole::Sk1, [9; 32]);
        let mut builder = IssuanceBuilder::new(chain_id(), TokenType::Fat0, "mytoken", issuer_chain_id());
        builder.symbol("MYT").supply(1_000_000).unwrap().sk1(&sk1).unwrap();
        let issuance = builder.build(1_700_000_200).unwrap();

        assert_eq!(issuance.token_type(), TokenType::Fat0);
        assert_eq!(issuance.symbol(), Some("MYT"));
        assert_eq!(issuance.supply(), 1_000_000);
        assert_eq!(issuance.token_id(), "mytoken");
        assert!(validate_signature(&issuance));
    }

    #[test]
    fn unlimited_supply_is_allowed() {
        let sk1 = test_encode(AddressRole::Sk1, [10; 32]);
        let mut builder = IssuanceBuilder::new(chain_id(), TokenType::Fat1, "collectible", issuer_chain_id());
        builder.sk1(&sk1).unwrap();
        let issuance = builder.build(1_700_000_300).unwrap();
        assert_eq!(issuance.supply(), -1);
    }

    #[test]
    fn supply_below_unlimited_sentinel_is_rejected() {
        let mut builder = IssuanceBuilder::new(chain_id(), TokenType::Fat0, "mytoken", issuer_chain_id());
        assert!(matches!(builder.supply(-2), Err(Error::InvalidSupply)));
    }

    #[test]
    fn missing_issuer_key_is_rejected() {
        let builder = IssuanceBuilder::new(chain_id(), TokenType::Fat0, "mytoken", issuer_chain_id());
        assert!(matches!(builder.build(1_700_000_400), Err(Error::MissingIssuerKey)));
    }

    #[test]
    fn round_trips_through_entry() {
        let sk1 = test_encode(AddressRole::Sk1, [11; 32]);
        let mut builder = IssuanceBuilder::new(chain_id(), TokenType::Fat0, "mytoken", issuer_chain_id());
        builder
            .symbol("MYT")
            .supply(42)
            .unwrap()
            .metadata(serde_json::json!({"decimals": 8}))
            .unwrap()
            .sk1(&sk1)
            .unwrap();
        let issuance = builder.build(1_700_000_500).unwrap();
        let entry = issuance.entry();

        let parsed = Issuance::from_entry(&entry).unwrap();
        assert_eq!(parsed.token_type(), issuance.token_type());
        assert_eq!(parsed.symbol(), issuance.symbol());
        assert_eq!(parsed.supply(), issuance.supply());
        assert_eq!(parsed.token_id(), issuance.token_id());
        assert_eq!(parsed.issuer_chain_id(), issuance.issuer_chain_id());
        assert_eq!(parsed.metadata(), issuance.metadata());
        assert!(validate_signature(&parsed));
    }
}
