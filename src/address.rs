//! The address & key adapter (C2).
//!
//! This is a thin contract over an external address/identity codec: it
//! classifies strings by prefix, and converts between private
//! seeds/secrets and their public counterparts. The exact wire bytes of a
//! real-world deployment's codec are treated as a black box; what's
//! implemented here is an internally consistent Base58Check scheme whose
//! public Factoid address is *bijective* with its 32-byte public key.

use ed25519_dalek::{PublicKey as Ed25519PublicKey, SecretKey as Ed25519SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{AddressRole, Error};

/// The reserved public address that marks a mint (as an input) or a burn
/// (as an output).
pub const COINBASE_PUBLIC: &str = "FA1zT4aFpEvcnPqPCigB3fvGu4Q4mTXY22iiuV69DqE1pNhdF2MC";

/// The reserved private address whose seed is all-zero bytes; its public
/// image is [`COINBASE_PUBLIC`]. Never used to sign — coinbase transactions
/// are authorized by the issuer's identity key instead.
pub const COINBASE_PRIVATE: &str = "Fs1KWJrpLdfucvmYwN2nWrwepLn8ercpMbzXshd1g8zyhKXLVLWj";

mod magics {
    pub mod fct {
        pub const PUBLIC: [u8; 2] = [0x5f, 0xb1];
        pub const PRIVATE: [u8; 2] = [0x64, 0x78];
    }
    pub mod identity {
        pub const PUBLIC: [u8; 2] = [0x3f, 0xbe];
        pub const SECRET: [u8; 2] = [0x4d, 0xb6];
    }
}

fn checksum(data: &[u8]) -> [u8; 4] {
    let round1 = Sha256::digest(data);
    let round2 = Sha256::digest(&round1);
    let mut out = [0u8; 4];
    out.copy_from_slice(&round2[..4]);
    out
}

fn encode(prefix: [u8; 2], payload: &[u8; 32]) -> String {
    let mut buf = Vec::with_capacity(2 + 32 + 4);
    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(payload);
    let sum = checksum(&buf);
    buf.extend_from_slice(&sum);
    bs58::encode(buf).into_string()
}

fn decode(s: &str, prefix: [u8; 2]) -> Option<[u8; 32]> {
    let buf = bs58::decode(s).into_vec().ok()?;
    if buf.len() != 2 + 32 + 4 {
        return None;
    }
    let (head, rest) = buf.split_at(2);
    if head != prefix {
        return None;
    }
    let (payload, sum) = rest.split_at(32);
    if checksum(&buf[..34]) != sum {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(payload);
    Some(out)
}

/// A public Factoid address (`FA…`): the spending destination for FAT-0/
/// FAT-1 outputs, and the RCD-matching address for inputs. Bijective with
/// the 32-byte Ed25519 public key it encodes.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PublicAddress(String);

impl PublicAddress {
    pub fn parse(s: &str) -> Result<PublicAddress, Error> {
        if s == COINBASE_PUBLIC || decode(s, magics::fct::PUBLIC).is_some() {
            Ok(PublicAddress(s.to_string()))
        } else {
            Err(Error::InvalidAddress {
                role: AddressRole::PublicFct,
                value: s.to_string(),
            })
        }
    }

    /// `key_to_public_fct` — renders a 32-byte Ed25519 public key as its
    /// address form.
    pub fn from_public_key(key: &[u8; 32]) -> PublicAddress {
        PublicAddress(encode(magics::fct::PUBLIC, key))
    }

    /// The inverse of [`PublicAddress::from_public_key`]. Panics if called
    /// on [`COINBASE_PUBLIC`], which is a marker address with no backing
    /// key — callers must check [`PublicAddress::is_coinbase`] first.
    pub fn to_public_key(&self) -> [u8; 32] {
        decode(&self.0, magics::fct::PUBLIC)
            .expect("PublicAddress is always either the coinbase marker or a valid encoding")
    }

    pub fn is_coinbase(&self) -> bool {
        self.0 == COINBASE_PUBLIC
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicAddress").field(&self.0).finish()
    }
}

/// A private Factoid address (`Fs…`): convertible to a 32-byte Ed25519
/// signing seed.
#[derive(Clone, Eq, PartialEq)]
pub struct PrivateAddress(String);

impl PrivateAddress {
    pub fn parse(s: &str) -> Result<PrivateAddress, Error> {
        if s == COINBASE_PRIVATE || decode(s, magics::fct::PRIVATE).is_some() {
            Ok(PrivateAddress(s.to_string()))
        } else {
            Err(Error::InvalidAddress {
                role: AddressRole::PrivateFct,
                value: s.to_string(),
            })
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.0 == COINBASE_PRIVATE
    }

    /// `address_to_seed` — the 32-byte Ed25519 signing seed this address
    /// encodes. [`COINBASE_PRIVATE`] decodes to the documented all-zero
    /// seed; nothing signs with it in practice since coinbase transactions
    /// are authorized by the issuer's identity key instead.
    pub fn to_seed(&self) -> [u8; 32] {
        if self.is_coinbase() {
            return [0u8; 32];
        }
        decode(&self.0, magics::fct::PRIVATE).expect("validated at parse time")
    }

    /// `public_address_of` — derives the spending address for this key.
    pub fn public_address_of(&self) -> PublicAddress {
        let seed = self.to_seed();
        let secret = Ed25519SecretKey::from_bytes(&seed).expect("32-byte seed is always valid");
        let public: Ed25519PublicKey = (&secret).into();
        PublicAddress::from_public_key(public.as_bytes())
    }
}

impl fmt::Debug for PrivateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateAddress").field(&"<redacted>").finish()
    }
}

/// An issuer identity secret key (`sk1…`).
#[derive(Clone, Eq, PartialEq)]
pub struct IssuerSecretKey(String);

impl IssuerSecretKey {
    pub fn parse(s: &str) -> Result<IssuerSecretKey, Error> {
        if decode(s, magics::identity::SECRET).is_some() {
            Ok(IssuerSecretKey(s.to_string()))
        } else {
            Err(Error::InvalidIssuerKey(s.to_string()))
        }
    }

    /// `extract_identity_seed`.
    pub fn to_seed(&self) -> [u8; 32] {
        decode(&self.0, magics::identity::SECRET).expect("validated at parse time")
    }

    pub fn public_key(&self) -> IssuerPublicKey {
        let seed = self.to_seed();
        let secret = Ed25519SecretKey::from_bytes(&seed).expect("32-byte seed is always valid");
        let public: Ed25519PublicKey = (&secret).into();
        IssuerPublicKey::from_bytes(public.as_bytes())
    }
}

impl fmt::Debug for IssuerSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IssuerSecretKey").field(&"<redacted>").finish()
    }
}

/// An issuer identity public key (`id1…`).
#[derive(Clone, Eq, PartialEq)]
pub struct IssuerPublicKey(String);

impl IssuerPublicKey {
    pub fn parse(s: &str) -> Result<IssuerPublicKey, Error> {
        if decode(s, magics::identity::PUBLIC).is_some() {
            Ok(IssuerPublicKey(s.to_string()))
        } else {
            Err(Error::InvalidIssuerKey(s.to_string()))
        }
    }

    pub fn from_bytes(key: &[u8; 32]) -> IssuerPublicKey {
        IssuerPublicKey(encode(magics::identity::PUBLIC, key))
    }

    /// `extract_identity_public`.
    pub fn to_bytes(&self) -> [u8; 32] {
        decode(&self.0, magics::identity::PUBLIC).expect("validated at parse time")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IssuerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IssuerPublicKey").field(&self.0).finish()
    }
}

impl fmt::Display for IssuerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_valid_private_fct(s: &str) -> bool {
    PrivateAddress::parse(s).is_ok()
}

pub fn is_valid_public_fct(s: &str) -> bool {
    PublicAddress::parse(s).is_ok()
}

pub fn is_valid_sk1(s: &str) -> bool {
    IssuerSecretKey::parse(s).is_ok()
}

pub fn is_valid_id1(s: &str) -> bool {
    IssuerPublicKey::parse(s).is_ok()
}

/// Builds a valid address/key string for an arbitrary seed, for use in
/// tests elsewhere in the crate that need real, checksum-valid fixtures
/// rather than hand-typed literals.
#[cfg(test)]
pub(crate) fn test_encode(role: AddressRole, seed: [u8; 32]) -> String {
    let prefix = match role {
        AddressRole::PrivateFct => magics::fct::PRIVATE,
        AddressRole::PublicFct => magics::fct::PUBLIC,
        AddressRole::Sk1 => magics::identity::SECRET,
        AddressRole::Id1 => magics::identity::PUBLIC,
    };
    encode(prefix, &seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn public_address_round_trips_through_key() {
        let key = seed(7);
        let addr = PublicAddress::from_public_key(&key);
        assert!(is_valid_public_fct(addr.as_str()));
        assert_eq!(addr.to_public_key(), key);
    }

    #[test]
    fn private_address_round_trips_through_seed() {
        let s = seed(9);
        let encoded = encode(magics::fct::PRIVATE, &s);
        let addr = PrivateAddress::parse(&encoded).unwrap();
        assert_eq!(addr.to_seed(), s);
    }

    #[test]
    fn private_address_derives_matching_public_address() {
        let s = seed(3);
        let encoded = encode(magics::fct::PRIVATE, &s);
        let private = PrivateAddress::parse(&encoded).unwrap();
        let public = private.public_address_of();
        assert!(is_valid_public_fct(public.as_str()));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_valid_public_fct("not an address"));
        assert!(!is_valid_private_fct("FA1zT4aFpEvcnPqPCigB3fvGu4Q4mTXY22iiuV69DqE1pNhdF2MC"));
    }

    #[test]
    fn coinbase_public_is_recognized_without_decoding() {
        let addr = PublicAddress::parse(COINBASE_PUBLIC).unwrap();
        assert!(addr.is_coinbase());
    }

    #[test]
    fn sk1_derives_id1() {
        let s = seed(42);
        let encoded = encode(magics::identity::SECRET, &s);
        let sk1 = IssuerSecretKey::parse(&encoded).unwrap();
        let id1 = sk1.public_key();
        assert!(is_valid_id1(id1.as_str()));
    }

    #[test]
    fn wrong_role_prefix_is_rejected() {
        let s = seed(1);
        let fct_private = encode(magics::fct::PRIVATE, &s);
        assert!(!is_valid_sk1(&fct_private));
    }

    #[test]
    fn invalid_issuer_key_is_its_own_error_kind() {
        let s = seed(1);
        let fct_private = encode(magics::fct::PRIVATE, &s);
        assert!(matches!(
            IssuerSecretKey::parse(&fct_private),
            Err(Error::InvalidIssuerKey(_))
        ));
        assert!(matches!(
            IssuerPublicKey::parse(&fct_private),
            Err(Error::InvalidIssuerKey(_))
        ));
    }
}
