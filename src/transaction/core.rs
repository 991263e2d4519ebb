//! The signing/ext-id/content machinery shared by FAT-0 and FAT-1
//! transactions; each standard specializes only `validate_balance` and
//! `token_metadata` handling on top of this.

use ed25519_dalek::{Keypair, PublicKey as Ed25519PublicKey, SecretKey as Ed25519SecretKey, Signature, Signer, Verifier};
use serde::Serialize;
use sha2::{Digest, Sha512};
use std::fmt;

use crate::address::PublicAddress;
use crate::cached::Cached;
use crate::chain_id::ChainId;
use crate::entry::{self, Entry};
use crate::error::{Error, Slot};
use crate::idset::NFTokenIdSet;

/// An amount type usable as either side of a transaction: a FAT-0 [`crate::amount::Amount`]
/// or a FAT-1 [`NFTokenIdSet`].
pub trait AmountLike: Clone + fmt::Debug + Sized {
    /// Appends this value's canonical, whitespace-free JSON form to `out`.
    fn write_json(&self, out: &mut String);

    /// The inverse of [`Self::write_json`]: reconstructs a value from a
    /// parsed JSON value taken from a transaction's `inputs`/`outputs`
    /// object. Used by [`from_entry`] to re-parse a previously built
    /// transaction's content.
    fn from_json(value: &serde_json::Value) -> Result<Self, Error>;
}

impl AmountLike for crate::amount::Amount {
    fn write_json(&self, out: &mut String) {
        out.push_str(&self.value().to_string());
    }

    fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        let n = value.as_u64().ok_or(Error::InvalidAmount)?;
        crate::amount::Amount::new(n)
    }
}

impl AmountLike for NFTokenIdSet {
    fn write_json(&self, out: &mut String) {
        out.push_str(&serde_json::to_string(self.elements()).expect("elements always serialize"));
    }

    fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        let elements: Vec<crate::idset::Element> = serde_json::from_value(value.clone())
            .map_err(|_| Error::InvalidIdSet(crate::error::InvalidIdSetReason::NonInteger))?;
        Ok(NFTokenIdSet::new(elements))
    }
}

/// A transaction input: a spend authorized by a normal address's RCD, or
/// the reserved coinbase marker authorized by the issuer's identity key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input<A> {
    Normal { address: PublicAddress, amount: A },
    Coinbase { amount: A },
}

impl<A> Input<A> {
    pub fn amount(&self) -> &A {
        match self {
            Input::Normal { amount, .. } => amount,
            Input::Coinbase { amount } => amount,
        }
    }

    pub(crate) fn address_str(&self) -> &str {
        match self {
            Input::Normal { address, .. } => address.as_str(),
            Input::Coinbase { .. } => crate::address::COINBASE_PUBLIC,
        }
    }
}

/// A transaction output: a credit to a normal address, or the reserved
/// coinbase marker that burns the credited amount.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Output<A> {
    Normal { address: PublicAddress, amount: A },
    Burn { amount: A },
}

impl<A> Output<A> {
    pub fn amount(&self) -> &A {
        match self {
            Output::Normal { amount, .. } => amount,
            Output::Burn { amount } => amount,
        }
    }

    pub(crate) fn address_str(&self) -> &str {
        match self {
            Output::Normal { address, .. } => address.as_str(),
            Output::Burn { .. } => crate::address::COINBASE_PUBLIC,
        }
    }
}

/// One `{ids, metadata}` entry of a coinbase FAT-1 transaction's
/// `tokenmetadata` field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TokenMetadataEntry {
    pub ids: NFTokenIdSet,
    pub metadata: serde_json::Value,
}

/// The RCD and (once signed) signature for one input slot.
#[derive(Clone, Debug)]
pub(crate) struct SignedSlot {
    pub public_key: [u8; 32],
    pub signature: Option<[u8; 64]>,
}

/// Fields and logic shared by [`crate::transaction::fat0::Fat0Transaction`]
/// and [`crate::transaction::fat1::Fat1Transaction`].
#[derive(Clone, Debug)]
pub(crate) struct TxCore<A> {
    pub chain_id: ChainId,
    pub inputs: Vec<Input<A>>,
    pub outputs: Vec<Output<A>>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
    pub content: Vec<u8>,
    pub slots: Vec<SignedSlot>,
    entryhash: Cached<[u8; 32]>,
}

impl<A: AmountLike> TxCore<A> {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && matches!(self.inputs[0], Input::Coinbase { .. })
    }

    /// `getMarshalDataSig(i)` — the pre-hash preimage for input `i`.
    pub fn marshal_data_sig(&self, position: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(position.to_string().as_bytes());
        buf.extend_from_slice(self.timestamp.to_string().as_bytes());
        buf.extend_from_slice(self.chain_id.as_bytes());
        buf.extend_from_slice(&self.content);
        buf
    }

    /// `SHA-512(marshal_data_sig(i))` — the 64-byte message actually signed.
    pub fn signing_digest(&self, position: usize) -> [u8; 64] {
        let digest = Sha512::digest(&self.marshal_data_sig(position));
        let mut out = [0u8; 64];
        out.copy_from_slice(&digest);
        out
    }

    pub fn ext_ids(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::with_capacity(1 + 2 * self.slots.len());
        out.push(self.timestamp.to_string().into_bytes());
        for slot in &self.slots {
            out.push(entry::rcd(&slot.public_key).to_vec());
            out.push(slot.signature.map(|s| s.to_vec()).unwrap_or_default());
        }
        out
    }

    pub fn entry(&self) -> Entry {
        Entry::new(self.chain_id, self.ext_ids(), self.content.clone())
    }

    pub fn entryhash(&self) -> [u8; 32] {
        self.entryhash
            .value()
            .unwrap_or_else(|| entry::entry_hash(&self.entry()))
    }

    /// Recomputes every slot's digest and verifies it against the stored
    /// signature and public key. Never raises on a crypto mismatch — only
    /// a structurally corrupt public key or signature would do that, and
    /// both are fixed-size byte arrays here, so this simply returns
    /// `false` for any unsigned or mismatched slot.
    pub fn validate_signatures(&self) -> bool {
        self.slots.iter().enumerate().all(|(i, slot)| {
            let signature = match slot.signature {
                Some(sig) => sig,
                None => return false,
            };
            let public_key = match Ed25519PublicKey::from_bytes(&slot.public_key) {
                Ok(pk) => pk,
                Err(_) => return false,
            };
            let signature = match Signature::from_bytes(&signature) {
                Ok(sig) => sig,
                Err(_) => return false,
            };
            public_key.verify(&self.signing_digest(i), &signature).is_ok()
        })
    }
}

fn derive_keypair(seed: &[u8; 32]) -> Keypair {
    let secret = Ed25519SecretKey::from_bytes(seed).expect("32-byte seed is always valid");
    let public: Ed25519PublicKey = (&secret).into();
    Keypair { secret, public }
}

pub(crate) fn derive_public_key(seed: &[u8; 32]) -> [u8; 32] {
    derive_keypair(seed).public.to_bytes()
}

fn sign_digest(seed: &[u8; 32], digest: &[u8; 64]) -> [u8; 64] {
    derive_keypair(seed).sign(digest).to_bytes()
}

/// Writes the canonical `{"inputs": {...}, "outputs": {...}, ...}` content
/// payload. Keys are written in builder insertion order; this hand-rolled
/// writer sidesteps relying on a particular JSON library's map ordering
/// behavior to get that order.
pub(crate) fn build_content<A: AmountLike>(
    inputs: &[Input<A>],
    outputs: &[Output<A>],
    metadata: Option<&serde_json::Value>,
    token_metadata: Option<&[TokenMetadataEntry]>,
) -> Vec<u8> {
    let mut out = String::from("{\"inputs\":{");
    write_side(&mut out, inputs.iter().map(|i| (i.address_str(), i.amount())));
    out.push_str("},\"outputs\":{");
    write_side(&mut out, outputs.iter().map(|o| (o.address_str(), o.amount())));
    out.push('}');

    if let Some(metadata) = metadata {
        out.push_str(",\"metadata\":");
        out.push_str(&serde_json::to_string(metadata).expect("a parsed Value always serializes"));
    }

    if let Some(entries) = token_metadata {
        out.push_str(",\"tokenmetadata\":[");
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str("{\"ids\":");
            out.push_str(
                &serde_json::to_string(entry.ids.elements()).expect("elements always serialize"),
            );
            out.push_str(",\"metadata\":");
            out.push_str(
                &serde_json::to_string(&entry.metadata).expect("a parsed Value always serializes"),
            );
            out.push('}');
        }
        out.push(']');
    }

    out.push('}');
    out.into_bytes()
}

fn write_side<'a, A: AmountLike + 'a>(out: &mut String, entries: impl Iterator<Item = (&'a str, &'a A)>) {
    for (i, (address, amount)) in entries.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&serde_json::to_string(address).expect("an address string always serializes"));
        out.push(':');
        amount.write_json(out);
    }
}

/// Resolves the RCD public key and, when known, the signing seed for every
/// input, signs every slot whose seed is known, and assembles the frozen
/// [`TxCore`]. Slots without a known seed (phase-1 external-signing inputs)
/// are left with an empty signature, to be filled by
/// [`crate::transaction::builder::SignatureBuilderCore`].
pub(crate) fn finish<A: AmountLike>(
    chain_id: ChainId,
    inputs: Vec<Input<A>>,
    outputs: Vec<Output<A>>,
    metadata: Option<serde_json::Value>,
    token_metadata: Option<&[TokenMetadataEntry]>,
    private_seeds: Vec<Option<[u8; 32]>>,
    issuer_seed: Option<[u8; 32]>,
    issuer_public: Option<[u8; 32]>,
    timestamp: i64,
) -> Result<TxCore<A>, Error> {
    let content = build_content(&inputs, &outputs, metadata.as_ref(), token_metadata);

    let mut slots = Vec::with_capacity(inputs.len());
    for input in inputs.iter() {
        let public_key = match input {
            Input::Normal { address, .. } => address.to_public_key(),
            Input::Coinbase { .. } => issuer_public
                .or_else(|| issuer_seed.map(|seed| derive_public_key(&seed)))
                .ok_or(Error::MissingIssuerKey)?,
        };
        slots.push(SignedSlot {
            public_key,
            signature: None,
        });
    }

    let mut core = TxCore {
        chain_id,
        inputs,
        outputs,
        metadata,
        timestamp,
        content,
        slots,
        entryhash: Cached::new(),
    };

    for i in 0..core.slots.len() {
        let seed = match &core.inputs[i] {
            Input::Normal { .. } => private_seeds[i],
            Input::Coinbase { .. } => issuer_seed,
        };
        if let Some(seed) = seed {
            let digest = core.signing_digest(i);
            core.slots[i].signature = Some(sign_digest(&seed, &digest));
        }
    }

    let hash = entry::entry_hash(&core.entry());
    core.entryhash = Cached::from(hash);

    Ok(core)
}

/// Fills remaining signature slots on a [`TxCore`] produced by phase 1 of a
/// two-phase (externally-signed) build, then re-freezes it with an
/// up-to-date entry hash.
pub(crate) fn refreeze<A: AmountLike>(mut core: TxCore<A>, slots: Vec<SignedSlot>) -> Result<TxCore<A>, Error> {
    for (i, slot) in slots.iter().enumerate() {
        if slot.signature.is_none() {
            return Err(Error::MissingSignature(Slot(i)));
        }
    }
    core.slots = slots;
    let hash = entry::entry_hash(&core.entry());
    core.entryhash = Cached::from(hash);
    Ok(core)
}

fn parse_ext_ids(ext_ids: &[Vec<u8>]) -> Result<(i64, Vec<SignedSlot>), Error> {
    let timestamp_bytes = ext_ids
        .get(0)
        .ok_or_else(|| Error::InvalidTransactionEntry("missing timestamp ext-id".to_string()))?;
    let timestamp_str = std::str::from_utf8(timestamp_bytes)
        .map_err(|_| Error::InvalidTransactionEntry("timestamp ext-id is not UTF-8".to_string()))?;
    let timestamp: i64 = timestamp_str
        .parse()
        .map_err(|_| Error::InvalidTransactionEntry("timestamp ext-id is not an integer".to_string()))?;

    let rest = &ext_ids[1..];
    if rest.len() % 2 != 0 {
        return Err(Error::InvalidTransactionEntry(
            "ext-ids after the timestamp must come in rcd/signature pairs".to_string(),
        ));
    }

    let mut slots = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks(2) {
        let rcd = &pair[0];
        if rcd.len() != 33 || rcd[0] != entry::RCD_TYPE_1 {
            return Err(Error::InvalidTransactionEntry("malformed rcd ext-id".to_string()));
        }
        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&rcd[1..]);

        let signature = if pair[1].is_empty() {
            None
        } else if pair[1].len() == 64 {
            let mut sig = [0u8; 64];
            sig.copy_from_slice(&pair[1]);
            Some(sig)
        } else {
            return Err(Error::InvalidTransactionEntry("malformed signature ext-id".to_string()));
        };

        slots.push(SignedSlot { public_key, signature });
    }

    Ok((timestamp, slots))
}

/// Reconstructs a [`TxCore`] and its optional FAT-1 `tokenmetadata` from a
/// previously built transaction's [`Entry`] — the inverse of [`finish`]/
/// [`Self::entry`]. Input/output order is taken from the JSON object's own
/// key order, which `serde_json`'s `preserve_order` feature preserves
/// exactly as written by [`build_content`].
pub(crate) fn from_entry<A: AmountLike>(
    entry: &Entry,
    want_token_metadata: bool,
) -> Result<(TxCore<A>, Option<Vec<TokenMetadataEntry>>), Error> {
    let (timestamp, slots) = parse_ext_ids(&entry.ext_ids)?;

    let content: serde_json::Value = serde_json::from_slice(&entry.content)
        .map_err(|e| Error::InvalidTransactionEntry(e.to_string()))?;
    let object = content
        .as_object()
        .ok_or_else(|| Error::InvalidTransactionEntry("content is not a JSON object".to_string()))?;

    let inputs_obj = object
        .get("inputs")
        .and_then(|v| v.as_object())
        .ok_or_else(|| Error::InvalidTransactionEntry("missing inputs object".to_string()))?;
    let outputs_obj = object
        .get("outputs")
        .and_then(|v| v.as_object())
        .ok_or_else(|| Error::InvalidTransactionEntry("missing outputs object".to_string()))?;

    let mut inputs = Vec::with_capacity(inputs_obj.len());
    for (address, value) in inputs_obj.iter() {
        let amount = A::from_json(value)?;
        if address == crate::address::COINBASE_PUBLIC {
            inputs.push(Input::Coinbase { amount });
        } else {
            let address = crate::address::PublicAddress::parse(address)?;
            inputs.push(Input::Normal { address, amount });
        }
    }

    let mut outputs = Vec::with_capacity(outputs_obj.len());
    for (address, value) in outputs_obj.iter() {
        let amount = A::from_json(value)?;
        if address == crate::address::COINBASE_PUBLIC {
            outputs.push(Output::Burn { amount });
        } else {
            let address = crate::address::PublicAddress::parse(address)?;
            outputs.push(Output::Normal { address, amount });
        }
    }

    let metadata = object.get("metadata").cloned();

    let token_metadata = if want_token_metadata {
        match object.get("tokenmetadata") {
            Some(serde_json::Value::Array(entries)) => {
                let mut parsed = Vec::with_capacity(entries.len());
                for entry in entries {
                    let ids_value = entry
                        .get("ids")
                        .ok_or_else(|| Error::InvalidTransactionEntry("token metadata entry missing ids".to_string()))?;
                    let elements: Vec<crate::idset::Element> = serde_json::from_value(ids_value.clone())
                        .map_err(|e| Error::InvalidTransactionEntry(e.to_string()))?;
                    let metadata = entry
                        .get("metadata")
                        .cloned()
                        .ok_or_else(|| Error::InvalidTransactionEntry("token metadata entry missing metadata".to_string()))?;
                    parsed.push(TokenMetadataEntry {
                        ids: NFTokenIdSet::new(elements),
                        metadata,
                    });
                }
                Some(parsed)
            }
            Some(_) => return Err(Error::InvalidTransactionEntry("tokenmetadata is not an array".to_string())),
            None => None,
        }
    } else {
        None
    };

    let core = TxCore {
        chain_id: entry.chain_id,
        inputs,
        outputs,
        metadata,
        timestamp,
        content: entry.content.clone(),
        slots,
        entryhash: Cached::from(entry::entry_hash(entry)),
    };

    Ok((core, token_metadata))
}
