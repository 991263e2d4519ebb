//! The single error type for every fallible operation in this crate.

use thiserror::Error;

/// Why a candidate [`crate::idset::NFTokenIdSet`] failed [`crate::idset::validate`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidIdSetReason {
    /// An element was not a non-negative integer or a `{min, max}` object.
    #[error("element is neither an integer nor a {{min, max}} range")]
    NonInteger,
    /// A range or singleton bound was negative.
    #[error("range bound is negative")]
    NegativeBound,
    /// A range had `min > max`.
    #[error("range has min > max")]
    EmptyRange,
    /// Two elements cover overlapping IDs.
    #[error("two elements overlap")]
    Overlap,
    /// The top-level value was not a list of elements.
    #[error("value is not an array")]
    NotAnArray,
}

/// Which address/key role a string failed to validate as.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    #[error("private Factoid address (Fs...)")]
    PrivateFct,
    #[error("public Factoid address (FA...)")]
    PublicFct,
    #[error("issuer secret key (sk1...)")]
    Sk1,
    #[error("issuer public key (id1...)")]
    Id1,
}

/// A slot in a two-phase build that is missing its signature or key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("slot {0}")]
pub struct Slot(pub usize);

/// The single error type surfaced by transaction construction, the ID-set
/// algebra, and the address/key adapter.
///
/// Every variant here corresponds to one failure kind named in the
/// specification; none of them are stringly typed. `validate_signatures`
/// is the only crate operation that reports a signature mismatch as a
/// plain `false` rather than one of these variants.
#[derive(Error, Debug)]
pub enum Error {
    /// The token chain ID was not 64 hex characters.
    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    /// An address or key string failed its role's validator.
    #[error("invalid address for role {role}: {value}")]
    InvalidAddress { role: AddressRole, value: String },

    /// An `sk1`/`id1` issuer key string failed its validator.
    #[error("invalid issuer key: {0}")]
    InvalidIssuerKey(String),

    /// A non-fungible token ID set failed [`crate::idset::validate`].
    #[error("invalid token id set: {0}")]
    InvalidIdSet(InvalidIdSetReason),

    /// A FAT-0 amount was not a positive integer.
    #[error("amount must be a positive integer")]
    InvalidAmount,

    /// Summing amounts would overflow a `u64`.
    #[error("summing amounts overflowed")]
    BalanceOverflow,

    /// FAT-0 input sum didn't equal output sum, or the FAT-1 expanded input
    /// and output ID sets weren't equal.
    #[error("inputs and outputs do not balance")]
    BalanceMismatch,

    /// The same address appears in both `inputs` and `outputs`.
    #[error("address {0} appears on both sides of the transaction")]
    AddressAppearsOnBothSides(String),

    /// A coinbase input was added alongside another input.
    #[error("coinbase input must be the only input")]
    CoinbaseWithExtraInputs,

    /// `burn_output` was called more than once.
    #[error("a burn output was already set")]
    DuplicateBurnOutput,

    /// A coinbase transaction had no issuer key supplied.
    #[error("coinbase transaction requires sk1 or id1")]
    MissingIssuerKey,

    /// `token_metadata` was set on a non-coinbase FAT-1 builder.
    #[error("token metadata is only valid on a coinbase transaction")]
    TokenMetadataNotCoinbase,

    /// `metadata` could not be serialized to JSON.
    #[error("metadata is not serializable: {0}")]
    MetadataNotSerializable(String),

    /// A two-phase build completed with a signature slot still empty.
    #[error("missing signature for {0}")]
    MissingSignature(Slot),

    /// A two-phase `pk_signature` public key matched no input.
    #[error("public key does not match any input address")]
    UnknownPublicKey,

    /// A two-phase coinbase signature was supplied for the wrong identity key.
    #[error("id1 signature does not match the declared issuer key")]
    Id1Mismatch,

    /// `inputs` or `outputs` was empty.
    #[error("transaction must have at least one input and one output")]
    EmptyInputsOrOutputs,

    /// An issuance `supply` was negative and not the `-1` unlimited sentinel.
    #[error("supply must be -1 (unlimited) or a non-negative integer")]
    InvalidSupply,

    /// An issuance entry's content or ext-ids didn't parse into a
    /// well-formed issuance record.
    #[error("entry is not a well-formed issuance record: {0}")]
    InvalidIssuanceEntry(String),

    /// A transaction entry's content or ext-ids didn't parse into a
    /// well-formed transaction.
    #[error("entry is not a well-formed transaction: {0}")]
    InvalidTransactionEntry(String),
}
