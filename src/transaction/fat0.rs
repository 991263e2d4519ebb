//! FAT-0 (fungible) transactions.

use crate::address::PublicAddress;
use crate::amount::Amount;
use crate::chain_id::ChainId;
use crate::entry::Entry;
use crate::error::Error;

use super::builder::{BuilderCore, SignatureBuilderCore};
use super::core::{Input, Output, TxCore};

pub type Fat0Input = Input<Amount>;
pub type Fat0Output = Output<Amount>;

/// An immutable, signed-or-unsigned FAT-0 transaction. Once built, every
/// accessor is a plain read: content, timestamp, and input/output order
/// never change after construction, so a `Fat0Transaction` is safe to
/// share freely across threads with no synchronization.
#[derive(Clone, Debug)]
pub struct Fat0Transaction(TxCore<Amount>);

impl Fat0Transaction {
    pub fn inputs(&self) -> &[Fat0Input] {
        &self.0.inputs
    }

    pub fn outputs(&self) -> &[Fat0Output] {
        &self.0.outputs
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.0.metadata.as_ref()
    }

    pub fn timestamp(&self) -> i64 {
        self.0.timestamp
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.0.chain_id
    }

    pub fn content(&self) -> &[u8] {
        &self.0.content
    }

    pub fn entry(&self) -> Entry {
        self.0.entry()
    }

    pub fn entryhash(&self) -> [u8; 32] {
        self.0.entryhash()
    }

    pub fn marshal_data_sig(&self, position: usize) -> Vec<u8> {
        self.0.marshal_data_sig(position)
    }

    pub fn is_coinbase(&self) -> bool {
        self.0.is_coinbase()
    }

    pub fn validate_signatures(&self) -> bool {
        self.0.validate_signatures()
    }

    /// Reconstructs a transaction from a previously built [`Entry`] — the
    /// inverse of [`Self::entry`]. Relies on `inputs`/`outputs` JSON key
    /// order being preserved by the parser; does not re-validate balance
    /// or re-verify signatures (callers that need those call
    /// [`Self::validate_signatures`] afterward).
    pub fn from_entry(entry: &Entry) -> Result<Fat0Transaction, Error> {
        let (core, _) = super::core::from_entry(entry, false)?;
        Ok(Fat0Transaction(core))
    }
}

fn validate_balance(inputs: &[Fat0Input], outputs: &[Fat0Output]) -> Result<(), Error> {
    let in_sum = Amount::checked_sum(inputs.iter().map(|i| i.amount()))?;
    let out_sum = Amount::checked_sum(outputs.iter().map(|o| o.amount()))?;
    if in_sum != out_sum {
        return Err(Error::BalanceMismatch);
    }
    Ok(())
}

/// Phase-1 builder: accumulates inputs (by private or public address),
/// outputs, and optional metadata, then signs what it can.
pub struct Fat0Builder(BuilderCore<Amount>);

impl Fat0Builder {
    pub fn new(chain_id: ChainId) -> Self {
        Fat0Builder(BuilderCore::new(chain_id))
    }

    pub fn input(&mut self, address: &str, amount: Amount) -> Result<&mut Self, Error> {
        self.0.input(address, amount)?;
        Ok(self)
    }

    pub fn coinbase_input(&mut self, amount: Amount) -> Result<&mut Self, Error> {
        self.0.coinbase_input(amount)?;
        Ok(self)
    }

    pub fn output(&mut self, address: &str, amount: Amount) -> Result<&mut Self, Error> {
        self.0.output(address, amount)?;
        Ok(self)
    }

    pub fn burn_output(&mut self, amount: Amount) -> Result<&mut Self, Error> {
        self.0.burn_output(amount)?;
        Ok(self)
    }

    pub fn metadata(&mut self, value: impl serde::Serialize) -> Result<&mut Self, Error> {
        let value = serde_json::to_value(value).map_err(|e| Error::MetadataNotSerializable(e.to_string()))?;
        self.0.metadata(value);
        Ok(self)
    }

    pub fn sk1(&mut self, sk1: &str) -> Result<&mut Self, Error> {
        self.0.sk1(sk1)?;
        Ok(self)
    }

    pub fn id1(&mut self, id1: &str) -> Result<&mut Self, Error> {
        self.0.id1(id1)?;
        Ok(self)
    }

    pub fn build(self, timestamp: i64) -> Result<Fat0Transaction, Error> {
        validate_balance(self.0.inputs(), self.0.outputs())?;
        let core = self.0.finish(timestamp, None)?;
        Ok(Fat0Transaction(core))
    }

    /// Convenience over [`Self::build`] that stamps the transaction with
    /// the current Unix time.
    pub fn build_now(self) -> Result<Fat0Transaction, Error> {
        self.build(chrono::Utc::now().timestamp())
    }

    /// Builds a re-wrappable unsigned transaction for external signing.
    /// The balance check also runs again in
    /// [`Fat0SignatureBuilder::build`] once every slot is signed.
    pub fn build_unsigned(self, timestamp: i64) -> Result<Fat0Transaction, Error> {
        validate_balance(self.0.inputs(), self.0.outputs())?;
        let core = self.0.finish(timestamp, None)?;
        Ok(Fat0Transaction(core))
    }
}

/// Phase-2 builder: fills the signature slots of a transaction produced by
/// [`Fat0Builder::build_unsigned`].
pub struct Fat0SignatureBuilder(SignatureBuilderCore<Amount>);

impl Fat0SignatureBuilder {
    pub fn for_external_signing(unsigned: Fat0Transaction) -> Self {
        Fat0SignatureBuilder(SignatureBuilderCore::new(unsigned.0))
    }

    pub fn pk_signature(&mut self, address: &PublicAddress, signature: &[u8; 64]) -> Result<&mut Self, Error> {
        self.0.pk_signature(&address.to_public_key(), signature)?;
        Ok(self)
    }

    pub fn id1_signature(&mut self, id1_public_key: &[u8; 32], signature: &[u8; 64]) -> Result<&mut Self, Error> {
        self.0.id1_signature(id1_public_key, signature)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Fat0Transaction, Error> {
        let core = self.0.build()?;
        validate_balance(&core.inputs, &core.outputs)?;
        Ok(Fat0Transaction(core))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{test_encode, IssuerSecretKey, PrivateAddress, COINBASE_PUBLIC};
    use crate::error::AddressRole;
    use ed25519_dalek::Signer;
    use sha2::{Digest, Sha512};

    fn chain_id() -> ChainId {
        ChainId::from_bytes([0x11; 32])
    }

    fn private_fixture(seed: u8) -> String {
        test_encode(AddressRole::PrivateFct, [seed; 32])
    }

    #[test]
    fn balanced_transaction_builds_and_signs() {
        let alice_private = private_fixture(1);
        let alice_public = PrivateAddress::parse(&alice_private).unwrap().public_address_of();
        let bob = PublicAddress::from_public_key(&[0x22; 32]);

        let mut builder = Fat0Builder::new(chain_id());
        builder
            .input(&alice_private, Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(10).unwrap())
            .unwrap();
        let tx = builder.build(1_700_000_000).unwrap();

        assert!(tx.validate_signatures());
        assert_eq!(tx.inputs().len(), 1);
        assert_eq!(tx.outputs().len(), 1);
        assert!(matches!(&tx.inputs()[0], Input::Normal{address, ..} if address == &alice_public));
    }

    #[test]
    fn unbalanced_transaction_is_rejected() {
        let alice_private = private_fixture(2);
        let bob = PublicAddress::from_public_key(&[0x33; 32]);

        let mut builder = Fat0Builder::new(chain_id());
        builder
            .input(&alice_private, Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(5).unwrap())
            .unwrap();

        assert!(matches!(builder.build(1_700_000_000), Err(Error::BalanceMismatch)));
    }

    #[test]
    fn address_on_both_sides_is_rejected() {
        let alice_private = private_fixture(3);
        let alice_public = PrivateAddress::parse(&alice_private).unwrap().public_address_of();

        let mut builder = Fat0Builder::new(chain_id());
        builder.input(&alice_private, Amount::new(10).unwrap()).unwrap();
        let err = builder.output(alice_public.as_str(), Amount::new(10).unwrap());
        assert!(matches!(err, Err(Error::AddressAppearsOnBothSides(_))));
    }

    #[test]
    fn coinbase_requires_issuer_key() {
        let bob = PublicAddress::from_public_key(&[0x44; 32]);
        let mut builder = Fat0Builder::new(chain_id());
        builder
            .coinbase_input(Amount::new(100).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(100).unwrap())
            .unwrap();
        assert!(matches!(builder.build(1_700_000_000), Err(Error::MissingIssuerKey)));
    }

    #[test]
    fn coinbase_with_sk1_signs_immediately() {
        let sk1 = test_encode(AddressRole::Sk1, [5; 32]);
        let bob = PublicAddress::from_public_key(&[0x55; 32]);
        let mut builder = Fat0Builder::new(chain_id());
        builder
            .coinbase_input(Amount::new(100).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(100).unwrap())
            .unwrap()
            .sk1(&sk1)
            .unwrap();

        let tx = builder.build(1_700_000_000).unwrap();
        assert!(tx.is_coinbase());
        assert!(tx.validate_signatures());
    }

    #[test]
    fn burn_output_targets_coinbase_marker() {
        let alice_private = private_fixture(6);
        let mut builder = Fat0Builder::new(chain_id());
        builder
            .input(&alice_private, Amount::new(10).unwrap())
            .unwrap()
            .burn_output(Amount::new(10).unwrap())
            .unwrap();
        let tx = builder.build(1_700_000_000).unwrap();
        assert!(matches!(&tx.outputs()[0], Output::Burn{..}));
        assert_eq!(tx.outputs()[0].address_str(), COINBASE_PUBLIC);
    }

    #[test]
    fn two_phase_build_round_trips_signature() {
        let alice_private = private_fixture(7);
        let alice = PrivateAddress::parse(&alice_private).unwrap();
        let alice_public = alice.public_address_of();
        let bob = PublicAddress::from_public_key(&[0x66; 32]);

        // Phase 1: build with the public address only, no signing key in hand.
        let mut builder = Fat0Builder::new(chain_id());
        builder
            .input(alice_public.as_str(), Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(10).unwrap())
            .unwrap();
        let unsigned = builder.build_unsigned(1_700_000_000).unwrap();
        assert!(!unsigned.validate_signatures());

        // An external signer computes and supplies the detached signature.
        let preimage = unsigned.marshal_data_sig(0);
        let digest = Sha512::digest(&preimage);
        let mut digest_bytes = [0u8; 64];
        digest_bytes.copy_from_slice(&digest);

        let seed = alice.to_seed();
        let secret = ed25519_dalek::SecretKey::from_bytes(&seed).unwrap();
        let public: ed25519_dalek::PublicKey = (&secret).into();
        let keypair = ed25519_dalek::Keypair { secret, public };
        let signature = keypair.sign(&digest_bytes).to_bytes();

        let mut sig_builder = Fat0SignatureBuilder::for_external_signing(unsigned);
        sig_builder.pk_signature(&alice_public, &signature).unwrap();
        let signed = sig_builder.build().unwrap();
        assert!(signed.validate_signatures());
    }

    #[test]
    fn two_phase_signing_matches_single_phase_ext_ids_byte_for_byte() {
        let alice_private = private_fixture(8);
        let alice = PrivateAddress::parse(&alice_private).unwrap();
        let alice_public = alice.public_address_of();
        let bob = PublicAddress::from_public_key(&[0x67; 32]);
        let timestamp = 1_700_000_050;

        let mut one_phase = Fat0Builder::new(chain_id());
        one_phase
            .input(&alice_private, Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(10).unwrap())
            .unwrap();
        let t1 = one_phase.build(timestamp).unwrap();

        let mut two_phase = Fat0Builder::new(chain_id());
        two_phase
            .input(alice_public.as_str(), Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(10).unwrap())
            .unwrap();
        let unsigned = two_phase.build_unsigned(timestamp).unwrap();

        let preimage = unsigned.marshal_data_sig(0);
        let digest = Sha512::digest(&preimage);
        let mut digest_bytes = [0u8; 64];
        digest_bytes.copy_from_slice(&digest);
        let seed = alice.to_seed();
        let secret = ed25519_dalek::SecretKey::from_bytes(&seed).unwrap();
        let public: ed25519_dalek::PublicKey = (&secret).into();
        let keypair = ed25519_dalek::Keypair { secret, public };
        let signature = keypair.sign(&digest_bytes).to_bytes();

        let mut sig_builder = Fat0SignatureBuilder::for_external_signing(unsigned);
        sig_builder.pk_signature(&alice_public, &signature).unwrap();
        let t2 = sig_builder.build().unwrap();

        assert_eq!(t1.entry().ext_ids, t2.entry().ext_ids);
    }

    #[test]
    fn entry_round_trips_into_a_fresh_transaction() {
        let alice_private = private_fixture(9);
        let bob = PublicAddress::from_public_key(&[0x68; 32]);

        let mut builder = Fat0Builder::new(chain_id());
        builder
            .input(&alice_private, Amount::new(10).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(10).unwrap())
            .unwrap()
            .metadata(serde_json::json!({"memo": "coffee"}))
            .unwrap();
        let original = builder.build(1_700_000_600).unwrap();

        let entry = original.entry();
        let reparsed = Fat0Transaction::from_entry(&entry).unwrap();

        assert_eq!(reparsed.inputs(), original.inputs());
        assert_eq!(reparsed.outputs(), original.outputs());
        assert_eq!(reparsed.metadata(), original.metadata());
        assert_eq!(reparsed.timestamp(), original.timestamp());
        assert_eq!(reparsed.content(), original.content());
        assert_eq!(reparsed.entry().content, original.entry().content);
        assert_eq!(reparsed.validate_signatures(), original.validate_signatures());
    }

    #[test]
    fn coinbase_two_phase_id1_signature_round_trips() {
        let sk1_str = test_encode(AddressRole::Sk1, [12; 32]);
        let sk1 = IssuerSecretKey::parse(&sk1_str).unwrap();
        let id1 = sk1.public_key();
        let bob = PublicAddress::from_public_key(&[0x70; 32]);

        // Phase 1: build with the public id1 key only, no secret key in hand.
        let mut builder = Fat0Builder::new(chain_id());
        builder
            .coinbase_input(Amount::new(100).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(100).unwrap())
            .unwrap()
            .id1(id1.as_str())
            .unwrap();
        let unsigned = builder.build_unsigned(1_700_000_700).unwrap();
        assert!(unsigned.is_coinbase());
        assert!(!unsigned.validate_signatures());

        // An external signer holding the sk1 seed computes the detached signature.
        let preimage = unsigned.marshal_data_sig(0);
        let digest = Sha512::digest(&preimage);
        let mut digest_bytes = [0u8; 64];
        digest_bytes.copy_from_slice(&digest);

        let seed = sk1.to_seed();
        let secret = ed25519_dalek::SecretKey::from_bytes(&seed).unwrap();
        let public: ed25519_dalek::PublicKey = (&secret).into();
        let keypair = ed25519_dalek::Keypair { secret, public };
        let signature = keypair.sign(&digest_bytes).to_bytes();

        let mut sig_builder = Fat0SignatureBuilder::for_external_signing(unsigned);
        sig_builder.id1_signature(&id1.to_bytes(), &signature).unwrap();
        let signed = sig_builder.build().unwrap();
        assert!(signed.validate_signatures());
    }

    #[test]
    fn coinbase_id1_signature_rejects_wrong_key() {
        let sk1_str = test_encode(AddressRole::Sk1, [13; 32]);
        let sk1 = IssuerSecretKey::parse(&sk1_str).unwrap();
        let id1 = sk1.public_key();
        let bob = PublicAddress::from_public_key(&[0x71; 32]);

        let mut builder = Fat0Builder::new(chain_id());
        builder
            .coinbase_input(Amount::new(100).unwrap())
            .unwrap()
            .output(bob.as_str(), Amount::new(100).unwrap())
            .unwrap()
            .id1(id1.as_str())
            .unwrap();
        let unsigned = builder.build_unsigned(1_700_000_710).unwrap();

        let preimage = unsigned.marshal_data_sig(0);
        let digest = Sha512::digest(&preimage);
        let mut digest_bytes = [0u8; 64];
        digest_bytes.copy_from_slice(&digest);
        let secret = ed25519_dalek::SecretKey::from_bytes(&sk1.to_seed()).unwrap();
        let public: ed25519_dalek::PublicKey = (&secret).into();
        let keypair = ed25519_dalek::Keypair { secret, public };
        let signature = keypair.sign(&digest_bytes).to_bytes();

        let wrong_id1 = IssuerSecretKey::parse(&test_encode(AddressRole::Sk1, [99; 32]))
            .unwrap()
            .public_key();

        let mut sig_builder = Fat0SignatureBuilder::for_external_signing(unsigned);
        let result = sig_builder.id1_signature(&wrong_id1.to_bytes(), &signature);
        assert!(matches!(result, Err(Error::Id1Mismatch)));
    }
}
