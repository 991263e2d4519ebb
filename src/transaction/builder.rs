//! The shared builder state machine generalized over an amount type.
//! [`BuilderCore`] and [`SignatureBuilderCore`] are deliberately separate
//! types rather than one builder with a runtime mode flag, so a finalized,
//! awaiting-signatures builder simply has no `input`/`output` methods to
//! call by construction, not by a runtime guard.

use crate::address::{IssuerPublicKey, IssuerSecretKey, PrivateAddress, PublicAddress};
use crate::chain_id::ChainId;
use crate::error::{AddressRole, Error};

use super::core::{self, derive_public_key, AmountLike, Input, Output, SignedSlot, TokenMetadataEntry, TxCore};

/// `BuilderCore` accumulates inputs, outputs, metadata and (for a coinbase
/// transaction) the issuer key, then signs every slot whose key material
/// it was given directly. Slots belonging to inputs added via a public
/// address (no private key in hand) are left unsigned for
/// [`SignatureBuilderCore`] to fill later.
pub(crate) struct BuilderCore<A> {
    chain_id: ChainId,
    inputs: Vec<Input<A>>,
    outputs: Vec<Output<A>>,
    private_seeds: Vec<Option<[u8; 32]>>,
    metadata: Option<serde_json::Value>,
    coinbase_added: bool,
    burn_added: bool,
    sk1: Option<IssuerSecretKey>,
    id1: Option<IssuerPublicKey>,
}

impl<A: AmountLike> BuilderCore<A> {
    pub fn new(chain_id: ChainId) -> Self {
        BuilderCore {
            chain_id,
            inputs: Vec::new(),
            outputs: Vec::new(),
            private_seeds: Vec::new(),
            metadata: None,
            coinbase_added: false,
            burn_added: false,
            sk1: None,
            id1: None,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.coinbase_added
    }

    pub fn input(&mut self, address: &str, amount: A) -> Result<(), Error> {
        if self.coinbase_added {
            return Err(Error::CoinbaseWithExtraInputs);
        }
        if self.outputs.iter().any(|o| o.address_str() == address) {
            return Err(Error::AddressAppearsOnBothSides(address.to_string()));
        }

        if let Ok(private) = PrivateAddress::parse(address) {
            if private.is_coinbase() {
                return Err(Error::InvalidAddress {
                    role: AddressRole::PrivateFct,
                    value: address.to_string(),
                });
            }
            let public = private.public_address_of();
            self.private_seeds.push(Some(private.to_seed()));
            self.inputs.push(Input::Normal {
                address: public,
                amount,
            });
            return Ok(());
        }

        let public = PublicAddress::parse(address)?;
        if public.is_coinbase() {
            return Err(Error::InvalidAddress {
                role: AddressRole::PublicFct,
                value: address.to_string(),
            });
        }
        self.private_seeds.push(None);
        self.inputs.push(Input::Normal {
            address: public,
            amount,
        });
        Ok(())
    }

    pub fn coinbase_input(&mut self, amount: A) -> Result<(), Error> {
        if !self.inputs.is_empty() {
            return Err(Error::CoinbaseWithExtraInputs);
        }
        self.coinbase_added = true;
        self.private_seeds.push(None);
        self.inputs.push(Input::Coinbase { amount });
        Ok(())
    }

    pub fn output(&mut self, address: &str, amount: A) -> Result<(), Error> {
        let public = PublicAddress::parse(address)?;
        if public.is_coinbase() {
            return Err(Error::InvalidAddress {
                role: AddressRole::PublicFct,
                value: address.to_string(),
            });
        }
        if self.inputs.iter().any(|i| i.address_str() == address) {
            return Err(Error::AddressAppearsOnBothSides(address.to_string()));
        }
        self.outputs.push(Output::Normal {
            address: public,
            amount,
        });
        Ok(())
    }

    pub fn burn_output(&mut self, amount: A) -> Result<(), Error> {
        if self.burn_added {
            return Err(Error::DuplicateBurnOutput);
        }
        self.burn_added = true;
        self.outputs.push(Output::Burn { amount });
        Ok(())
    }

    pub fn metadata(&mut self, value: serde_json::Value) {
        self.metadata = Some(value);
    }

    pub fn sk1(&mut self, sk1: &str) -> Result<(), Error> {
        self.sk1 = Some(IssuerSecretKey::parse(sk1)?);
        Ok(())
    }

    pub fn id1(&mut self, id1: &str) -> Result<(), Error> {
        self.id1 = Some(IssuerPublicKey::parse(id1)?);
        Ok(())
    }

    pub fn inputs(&self) -> &[Input<A>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output<A>] {
        &self.outputs
    }

    /// Assembles and, where possible, signs the transaction core. Callers
    /// (`Fat0Builder`/`Fat1Builder`) are responsible for running their
    /// standard-specific balance and metadata checks first.
    pub fn finish(
        self,
        timestamp: i64,
        token_metadata: Option<&[TokenMetadataEntry]>,
    ) -> Result<TxCore<A>, Error> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(Error::EmptyInputsOrOutputs);
        }
        if self.coinbase_added && self.sk1.is_none() && self.id1.is_none() {
            return Err(Error::MissingIssuerKey);
        }

        let issuer_seed = self.sk1.as_ref().map(|sk1| sk1.to_seed());
        let issuer_public = issuer_seed
            .map(|seed| derive_public_key(&seed))
            .or_else(|| self.id1.as_ref().map(|id1| id1.to_bytes()));

        core::finish(
            self.chain_id,
            self.inputs,
            self.outputs,
            self.metadata,
            token_metadata,
            self.private_seeds,
            issuer_seed,
            issuer_public,
            timestamp,
        )
    }
}

/// A builder that only accepts signature material for a transaction whose
/// inputs, outputs, metadata, content and timestamp are already frozen
/// (produced by [`BuilderCore::finish`] in phase 1).
pub(crate) struct SignatureBuilderCore<A> {
    core: TxCore<A>,
    slots: Vec<SignedSlot>,
}

impl<A: AmountLike> SignatureBuilderCore<A> {
    pub fn new(core: TxCore<A>) -> Self {
        let slots = core.slots.clone();
        SignatureBuilderCore { core, slots }
    }

    pub fn pk_signature(&mut self, public_key: &[u8; 32], signature: &[u8; 64]) -> Result<(), Error> {
        let position = self
            .core
            .inputs
            .iter()
            .position(|input| match input {
                Input::Normal { address, .. } => &address.to_public_key() == public_key,
                Input::Coinbase { .. } => false,
            })
            .ok_or(Error::UnknownPublicKey)?;
        self.slots[position].signature = Some(*signature);
        Ok(())
    }

    pub fn id1_signature(&mut self, id1_public_key: &[u8; 32], signature: &[u8; 64]) -> Result<(), Error> {
        let position = self
            .core
            .inputs
            .iter()
            .position(|input| matches!(input, Input::Coinbase { .. }))
            .ok_or(Error::UnknownPublicKey)?;
        if &self.slots[position].public_key != id1_public_key {
            return Err(Error::Id1Mismatch);
        }
        self.slots[position].signature = Some(*signature);
        Ok(())
    }

    pub fn build(self) -> Result<TxCore<A>, Error> {
        core::refreeze(self.core, self.slots)
    }
}
