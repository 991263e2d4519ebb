//! FAT-1 (non-fungible) transactions.

use crate::address::PublicAddress;
use crate::chain_id::ChainId;
use crate::entry::Entry;
use crate::error::Error;
use crate::idset::NFTokenIdSet;

use super::builder::{BuilderCore, SignatureBuilderCore};
use super::core::{Input, Output, TokenMetadataEntry, TxCore};

pub type Fat1Input = Input<NFTokenIdSet>;
pub type Fat1Output = Output<NFTokenIdSet>;

/// An immutable, signed-or-unsigned FAT-1 transaction.
#[derive(Clone, Debug)]
pub struct Fat1Transaction {
    core: TxCore<NFTokenIdSet>,
    token_metadata: Option<Vec<TokenMetadataEntry>>,
}

impl Fat1Transaction {
    pub fn inputs(&self) -> &[Fat1Input] {
        &self.core.inputs
    }

    pub fn outputs(&self) -> &[Fat1Output] {
        &self.core.outputs
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.core.metadata.as_ref()
    }

    pub fn token_metadata(&self) -> Option<&[TokenMetadataEntry]> {
        self.token_metadata.as_deref()
    }

    pub fn timestamp(&self) -> i64 {
        self.core.timestamp
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.core.chain_id
    }

    pub fn content(&self) -> &[u8] {
        &self.core.content
    }

    pub fn entry(&self) -> Entry {
        self.core.entry()
    }

    pub fn entryhash(&self) -> [u8; 32] {
        self.core.entryhash()
    }

    pub fn marshal_data_sig(&self, position: usize) -> Vec<u8> {
        self.core.marshal_data_sig(position)
    }

    pub fn is_coinbase(&self) -> bool {
        self.core.is_coinbase()
    }

    pub fn validate_signatures(&self) -> bool {
        self.core.validate_signatures()
    }

    /// Reconstructs a transaction from a previously built [`Entry`] — the
    /// inverse of [`Self::entry`]. Does not re-validate balance,
    /// `tokenmetadata` coinbase-only placement, or signatures; callers that
    /// need those run [`Self::validate_signatures`] or their own balance
    /// check afterward.
    pub fn from_entry(entry: &Entry) -> Result<Fat1Transaction, Error> {
        let (core, token_metadata) = super::core::from_entry(entry, true)?;
        Ok(Fat1Transaction { core, token_metadata })
    }
}

fn validate_sets(sets: &[NFTokenIdSet]) -> Result<(), Error> {
    for set in sets {
        set.validate()?;
    }
    Ok(())
}

fn validate_balance(inputs: &[Fat1Input], outputs: &[Fat1Output]) -> Result<(), Error> {
    validate_sets(&inputs.iter().map(|i| i.amount().clone()).collect::<Vec<_>>())?;
    validate_sets(&outputs.iter().map(|o| o.amount().clone()).collect::<Vec<_>>())?;

    let mut in_ids: Vec<u64> = inputs.iter().flat_map(|i| i.amount().expand()).collect();
    let mut out_ids: Vec<u64> = outputs.iter().flat_map(|o| o.amount().expand()).collect();
    in_ids.sort_unstable();
    out_ids.sort_unstable();
    if in_ids != out_ids {
        return Err(Error::BalanceMismatch);
    }
    Ok(())
}

fn validate_token_metadata(is_coinbase: bool, token_metadata: &Option<Vec<TokenMetadataEntry>>) -> Result<(), Error> {
    match token_metadata {
        Some(entries) if !is_coinbase => {
            let _ = entries;
            Err(Error::TokenMetadataNotCoinbase)
        }
        Some(entries) => {
            for entry in entries {
                entry.ids.validate()?;
            }
            let union: Vec<crate::idset::Element> = entries
                .iter()
                .flat_map(|entry| entry.ids.elements().iter().copied())
                .collect();
            NFTokenIdSet::new(union).validate()
        }
        None => Ok(()),
    }
}

/// Phase-1 builder for FAT-1 transactions.
pub struct Fat1Builder {
    core: BuilderCore<NFTokenIdSet>,
    token_metadata: Option<Vec<TokenMetadataEntry>>,
}

impl Fat1Builder {
    pub fn new(chain_id: ChainId) -> Self {
        Fat1Builder {
            core: BuilderCore::new(chain_id),
            token_metadata: None,
        }
    }

    pub fn input(&mut self, address: &str, ids: NFTokenIdSet) -> Result<&mut Self, Error> {
        self.core.input(address, ids)?;
        Ok(self)
    }

    pub fn coinbase_input(&mut self, ids: NFTokenIdSet) -> Result<&mut Self, Error> {
        self.core.coinbase_input(ids)?;
        Ok(self)
    }

    pub fn output(&mut self, address: &str, ids: NFTokenIdSet) -> Result<&mut Self, Error> {
        self.core.output(address, ids)?;
        Ok(self)
    }

    pub fn burn_output(&mut self, ids: NFTokenIdSet) -> Result<&mut Self, Error> {
        self.core.burn_output(ids)?;
        Ok(self)
    }

    pub fn metadata(&mut self, value: impl serde::Serialize) -> Result<&mut Self, Error> {
        let value = serde_json::to_value(value).map_err(|e| Error::MetadataNotSerializable(e.to_string()))?;
        self.core.metadata(value);
        Ok(self)
    }

    /// Only meaningful on a coinbase transaction; enforced at
    /// [`Self::build`] time since input order and coinbase-ness may not be
    /// settled yet when this is called.
    pub fn token_metadata(&mut self, entries: Vec<TokenMetadataEntry>) -> &mut Self {
        self.token_metadata = Some(entries);
        self
    }

    pub fn sk1(&mut self, sk1: &str) -> Result<&mut Self, Error> {
        self.core.sk1(sk1)?;
        Ok(self)
    }

    pub fn id1(&mut self, id1: &str) -> Result<&mut Self, Error> {
        self.core.id1(id1)?;
        Ok(self)
    }

    pub fn build(self, timestamp: i64) -> Result<Fat1Transaction, Error> {
        validate_balance(self.core.inputs(), self.core.outputs())?;
        validate_token_metadata(self.core.is_coinbase(), &self.token_metadata)?;
        let token_metadata = self.token_metadata;
        let core = self.core.finish(timestamp, token_metadata.as_deref())?;
        Ok(Fat1Transaction { core, token_metadata })
    }

    pub fn build_unsigned(self, timestamp: i64) -> Result<Fat1Transaction, Error> {
        self.build(timestamp)
    }

    /// Convenience over [`Self::build`] that stamps the transaction with
    /// the current Unix time.
    pub fn build_now(self) -> Result<Fat1Transaction, Error> {
        self.build(chrono::Utc::now().timestamp())
    }
}

/// Phase-2 builder for FAT-1 transactions.
pub struct Fat1SignatureBuilder {
    inner: SignatureBuilderCore<NFTokenIdSet>,
    token_metadata: Option<Vec<TokenMetadataEntry>>,
}

impl Fat1SignatureBuilder {
    pub fn for_external_signing(unsigned: Fat1Transaction) -> Self {
        Fat1SignatureBuilder {
            inner: SignatureBuilderCore::new(unsigned.core),
            token_metadata: unsigned.token_metadata,
        }
    }

    pub fn pk_signature(&mut self, address: &PublicAddress, signature: &[u8; 64]) -> Result<&mut Self, Error> {
        self.inner.pk_signature(&address.to_public_key(), signature)?;
        Ok(self)
    }

    pub fn id1_signature(&mut self, id1_public_key: &[u8; 32], signature: &[u8; 64]) -> Result<&mut Self, Error> {
        self.inner.id1_signature(id1_public_key, signature)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Fat1Transaction, Error> {
        let core = self.inner.build()?;
        validate_balance(&core.inputs, &core.outputs)?;
        Ok(Fat1Transaction {
            core,
            token_metadata: self.token_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{test_encode, PrivateAddress};
    use crate::error::AddressRole;
    use crate::idset::Element;

    fn chain_id() -> ChainId {
        ChainId::from_bytes([0x21; 32])
    }

    fn private_fixture(seed: u8) -> String {
        test_encode(AddressRole::PrivateFct, [seed; 32])
    }

    fn ids(elements: Vec<Element>) -> NFTokenIdSet {
        NFTokenIdSet::new(elements)
    }

    #[test]
    fn matching_expanded_sets_balance() {
        let alice_private = private_fixture(11);
        let bob = PublicAddress::from_public_key(&[0x77; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .input(&alice_private, ids(vec![Element::Range { min: 0, max: 2 }]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(0), Element::Id(1), Element::Id(2)]))
            .unwrap();
        let tx = builder.build(1_700_000_100).unwrap();
        assert!(tx.validate_signatures());
    }

    #[test]
    fn mismatched_sets_are_rejected() {
        let alice_private = private_fixture(12);
        let bob = PublicAddress::from_public_key(&[0x78; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .input(&alice_private, ids(vec![Element::Range { min: 0, max: 2 }]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(0), Element::Id(1)]))
            .unwrap();
        assert!(matches!(builder.build(1_700_000_100), Err(Error::BalanceMismatch)));
    }

    #[test]
    fn token_metadata_rejected_off_coinbase() {
        let alice_private = private_fixture(13);
        let bob = PublicAddress::from_public_key(&[0x79; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .input(&alice_private, ids(vec![Element::Id(0)]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(0)]))
            .unwrap()
            .token_metadata(vec![TokenMetadataEntry {
                ids: ids(vec![Element::Id(0)]),
                metadata: serde_json::json!({"name": "token zero"}),
            }]);
        assert!(matches!(
            builder.build(1_700_000_100),
            Err(Error::TokenMetadataNotCoinbase)
        ));
    }

    #[test]
    fn token_metadata_accepted_on_coinbase() {
        let sk1 = test_encode(AddressRole::Sk1, [14; 32]);
        let bob = PublicAddress::from_public_key(&[0x80; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .coinbase_input(ids(vec![Element::Id(0), Element::Id(1)]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(0), Element::Id(1)]))
            .unwrap()
            .sk1(&sk1)
            .unwrap()
            .token_metadata(vec![TokenMetadataEntry {
                ids: ids(vec![Element::Id(0)]),
                metadata: serde_json::json!({"name": "token zero"}),
            }]);

        let tx = builder.build(1_700_000_100).unwrap();
        assert!(tx.is_coinbase());
        assert!(tx.validate_signatures());
        assert_eq!(tx.token_metadata().unwrap().len(), 1);
    }

    #[test]
    fn private_address_derives_matching_normal_input() {
        let alice_private = private_fixture(15);
        let alice_public = PrivateAddress::parse(&alice_private).unwrap().public_address_of();
        let bob = PublicAddress::from_public_key(&[0x81; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .input(&alice_private, ids(vec![Element::Id(5)]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(5)]))
            .unwrap();
        let tx = builder.build(1_700_000_100).unwrap();
        assert!(matches!(&tx.inputs()[0], Input::Normal{address, ..} if address == &alice_public));
    }

    #[test]
    fn entry_round_trips_into_a_fresh_transaction() {
        let sk1 = test_encode(AddressRole::Sk1, [16; 32]);
        let bob = PublicAddress::from_public_key(&[0x82; 32]);

        let mut builder = Fat1Builder::new(chain_id());
        builder
            .coinbase_input(ids(vec![Element::Range { min: 0, max: 2 }]))
            .unwrap()
            .output(bob.as_str(), ids(vec![Element::Id(0), Element::Id(1), Element::Id(2)]))
            .unwrap()
            .sk1(&sk1)
            .unwrap()
            .token_metadata(vec![TokenMetadataEntry {
                ids: ids(vec![Element::Range { min: 0, max: 2 }]),
                metadata: serde_json::json!({"series": "genesis"}),
            }]);
        let original = builder.build(1_700_000_700).unwrap();

        let entry = original.entry();
        let reparsed = Fat1Transaction::from_entry(&entry).unwrap();

        assert_eq!(reparsed.inputs(), original.inputs());
        assert_eq!(reparsed.outputs(), original.outputs());
        assert_eq!(reparsed.token_metadata(), original.token_metadata());
        assert_eq!(reparsed.timestamp(), original.timestamp());
        assert_eq!(reparsed.content(), original.content());
        assert_eq!(reparsed.validate_signatures(), original.validate_signatures());
    }
}
