// Detached signatures in Ontology's serialization
//
// A serialized signature is `scheme id | r | s`, with r and s each
// left-padded to the curve size.

use std::fmt;
use std::str::FromStr;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::error::{CryptoError, Result};

/// Signature schemes known to the Ontology signature format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Sha224WithEcdsa,
    Sha256WithEcdsa,
    Sha384WithEcdsa,
    Sha512WithEcdsa,
    Sha3_224WithEcdsa,
    Sha3_256WithEcdsa,
    Sha3_384WithEcdsa,
    Sha3_512WithEcdsa,
    Ripemd160WithEcdsa,
    Sm3WithSm2,
    Sha512WithEdDsa,
}

impl SignatureScheme {
    const ALL: [SignatureScheme; 11] = [
        Self::Sha224WithEcdsa,
        Self::Sha256WithEcdsa,
        Self::Sha384WithEcdsa,
        Self::Sha512WithEcdsa,
        Self::Sha3_224WithEcdsa,
        Self::Sha3_256WithEcdsa,
        Self::Sha3_384WithEcdsa,
        Self::Sha3_512WithEcdsa,
        Self::Ripemd160WithEcdsa,
        Self::Sm3WithSm2,
        Self::Sha512WithEdDsa,
    ];

    /// The one-byte id written at the front of a serialized signature.
    pub fn id(self) -> u8 {
        match self {
            Self::Sha224WithEcdsa => 0,
            Self::Sha256WithEcdsa => 1,
            Self::Sha384WithEcdsa => 2,
            Self::Sha512WithEcdsa => 3,
            Self::Sha3_224WithEcdsa => 4,
            Self::Sha3_256WithEcdsa => 5,
            Self::Sha3_384WithEcdsa => 6,
            Self::Sha3_512WithEcdsa => 7,
            Self::Ripemd160WithEcdsa => 8,
            Self::Sm3WithSm2 => 9,
            Self::Sha512WithEdDsa => 10,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224WithEcdsa => "SHA224withECDSA",
            Self::Sha256WithEcdsa => "SHA256withECDSA",
            Self::Sha384WithEcdsa => "SHA384withECDSA",
            Self::Sha512WithEcdsa => "SHA512withECDSA",
            Self::Sha3_224WithEcdsa => "SHA3-224withECDSA",
            Self::Sha3_256WithEcdsa => "SHA3-256withECDSA",
            Self::Sha3_384WithEcdsa => "SHA3-384withECDSA",
            Self::Sha3_512WithEcdsa => "SHA3-512withECDSA",
            Self::Ripemd160WithEcdsa => "RIPEMD160withECDSA",
            Self::Sm3WithSm2 => "SM3withSM2",
            Self::Sha512WithEdDsa => "SHA512withEdDSA",
        }
    }

    pub fn is_ecdsa(self) -> bool {
        !matches!(self, Self::Sm3WithSm2 | Self::Sha512WithEdDsa)
    }

    /// Message digest for ECDSA schemes, `None` for SM2 and EdDSA.
    pub fn ecdsa_digest(self, message: &[u8]) -> Option<Vec<u8>> {
        let digest = match self {
            Self::Sha224WithEcdsa => Sha224::digest(message).to_vec(),
            Self::Sha256WithEcdsa => Sha256::digest(message).to_vec(),
            Self::Sha384WithEcdsa => Sha384::digest(message).to_vec(),
            Self::Sha512WithEcdsa => Sha512::digest(message).to_vec(),
            Self::Sha3_224WithEcdsa => Sha3_224::digest(message).to_vec(),
            Self::Sha3_256WithEcdsa => Sha3_256::digest(message).to_vec(),
            Self::Sha3_384WithEcdsa => Sha3_384::digest(message).to_vec(),
            Self::Sha3_512WithEcdsa => Sha3_512::digest(message).to_vec(),
            Self::Ripemd160WithEcdsa => Ripemd160::digest(message).to_vec(),
            Self::Sm3WithSm2 | Self::Sha512WithEdDsa => return None,
        };
        Some(digest)
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureScheme {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CryptoError::InvalidSignatureEncoding(format!("unknown signature scheme '{}'", s))
            })
    }
}

/// Signs `message` with SHA256withECDSA and returns the serialized signature.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let signature: Signature = signing_key
        .try_sign(message)
        .map_err(|_| CryptoError::SigningFailed)?;

    let mut out = Vec::with_capacity(65);
    out.push(SignatureScheme::Sha256WithEcdsa.id());
    out.extend_from_slice(&signature.to_bytes());
    Ok(out)
}
