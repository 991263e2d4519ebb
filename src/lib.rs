//! A client-side construction, serialization, and signature-validation
//! core for FAT-0 (fungible) and FAT-1 (non-fungible) tokens layered on an
//! external content-addressed chain system.
//!
//! This crate covers the data model and wire form only: building a
//! [`transaction::Fat0Transaction`] or [`transaction::Fat1Transaction`]
//! from addresses, amounts or ID-sets, and signing keys; producing the
//! canonical [`entry::Entry`] that commits a transaction to the chain;
//! handling coinbase (mint) and burn variants; supporting externally
//! supplied signatures via a two-phase build; and the
//! [`idset::NFTokenIdSet`] algebra FAT-1 relies on. Submitting an entry to
//! the chain, running a daemon, and the wire transport to one are all out
//! of scope — callers wire this crate's [`entry::Entry`] output into
//! whatever client they use for that.

mod cached;

pub mod address;
pub mod amount;
pub mod chain_id;
pub mod entry;
pub mod error;
pub mod idset;
pub mod issuance;
pub mod transaction;

pub use address::{IssuerPublicKey, IssuerSecretKey, PrivateAddress, PublicAddress};
pub use amount::Amount;
pub use chain_id::ChainId;
pub use entry::Entry;
pub use error::Error;
pub use idset::{Element, NFTokenIdSet};
pub use issuance::{Issuance, IssuanceBuilder, TokenType};
