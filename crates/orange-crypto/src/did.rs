// Ontology addresses and did:ont identifiers
//
// An address is RIPEMD160(SHA256(program)) where the program pushes the
// serialized public key and ends with CHECKSIG. Its base58 form is
// `0x17 | address | checksum[..4]`.

use std::fmt;
use std::str::FromStr;

use p256::PublicKey;

use crate::error::{CryptoError, Result};
use crate::hash::{hash160, sha256d};
use crate::keys::serialize_public_key;

/// DID method prefix for Ontology identities.
pub const DID_PREFIX: &str = "did:ont:";

/// Version byte of a base58 address.
const ADDRESS_VERSION: u8 = 0x17;

/// NeoVM CHECKSIG opcode closing a single-key program.
const OP_CHECKSIG: u8 = 0xac;

/// A 20-byte Ontology account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derives the address of the single-signature program for `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let key_bytes = serialize_public_key(public_key);
        let mut program = Vec::with_capacity(key_bytes.len() + 2);
        // 33 bytes always fits a single-byte PUSHBYTES opcode
        program.push(key_bytes.len() as u8);
        program.extend_from_slice(&key_bytes);
        program.push(OP_CHECKSIG);
        Self(hash160(&program))
    }

    pub fn to_base58(&self) -> String {
        let mut data = Vec::with_capacity(25);
        data.push(ADDRESS_VERSION);
        data.extend_from_slice(&self.0);
        let checksum = sha256d(&data);
        data.extend_from_slice(&checksum[..4]);
        bs58::encode(data).into_string()
    }

    pub fn from_base58(encoded: &str) -> Result<Self> {
        let data = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(format!("invalid base58: {}", e)))?;

        if data.len() != 25 {
            return Err(CryptoError::InvalidAddress(format!(
                "expected 25 bytes, got {}",
                data.len()
            )));
        }
        if data[0] != ADDRESS_VERSION {
            return Err(CryptoError::InvalidAddress(format!(
                "unexpected version byte {:#04x}",
                data[0]
            )));
        }

        let checksum = sha256d(&data[..21]);
        if checksum[..4] != data[21..] {
            return Err(CryptoError::InvalidAddress("checksum mismatch".to_string()));
        }

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&data[1..21]);
        Ok(Self(bytes))
    }

    /// The `did:ont:` identifier for this address.
    pub fn to_did(&self) -> String {
        format!("{}{}", DID_PREFIX, self.to_base58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

/// Parses a `did:ont:<base58-address>` identifier.
pub fn address_from_did(did: &str) -> Result<Address> {
    let encoded = did
        .strip_prefix(DID_PREFIX)
        .ok_or_else(|| CryptoError::InvalidDid(format!("'{}' is not a did:ont identifier", did)))?;
    Address::from_base58(encoded).map_err(|e| CryptoError::InvalidDid(format!("{}: {}", did, e)))
}
