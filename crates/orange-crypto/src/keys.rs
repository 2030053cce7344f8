// Key codec for Ontology's curve-tagged key serialization
//
// Private keys are stored as `alg | curve | D | compressed public point`.
// Public keys on P-256 travel as a bare SEC1 point; every other
// combination carries the algorithm and curve tags up front.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// Algorithm tag for ECDSA keys.
pub const ALGORITHM_ECDSA: u8 = 0x12;
/// Algorithm tag for SM2 keys.
pub const ALGORITHM_SM2: u8 = 0x13;
/// Algorithm tag for EdDSA keys.
pub const ALGORITHM_EDDSA: u8 = 0x14;

/// Key algorithm named by the first byte of a tagged key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Ecdsa,
    Sm2,
    EdDsa,
}

impl KeyAlgorithm {
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            ALGORITHM_ECDSA => Ok(Self::Ecdsa),
            ALGORITHM_SM2 => Ok(Self::Sm2),
            ALGORITHM_EDDSA => Ok(Self::EdDsa),
            other => Err(CryptoError::UnsupportedAlgorithm(other)),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Ecdsa => ALGORITHM_ECDSA,
            Self::Sm2 => ALGORITHM_SM2,
            Self::EdDsa => ALGORITHM_EDDSA,
        }
    }
}

/// Weierstrass curves recognized in tagged key blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P224,
    P256,
    P384,
    P521,
    Sm2P256V1,
}

impl Curve {
    /// All curves a private key blob may declare.
    pub const ALL: [Curve; 5] = [
        Curve::P224,
        Curve::P256,
        Curve::P384,
        Curve::P521,
        Curve::Sm2P256V1,
    ];

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::P224),
            2 => Ok(Self::P256),
            3 => Ok(Self::P384),
            4 => Ok(Self::P521),
            20 => Ok(Self::Sm2P256V1),
            other => Err(CryptoError::UnsupportedCurve(other)),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::P224 => 1,
            Self::P256 => 2,
            Self::P384 => 3,
            Self::P521 => 4,
            Self::Sm2P256V1 => 20,
        }
    }

    /// Curve name as written in wallet files.
    pub fn name(self) -> &'static str {
        match self {
            Self::P224 => "P-224",
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
            Self::Sm2P256V1 => "SM2P256V1",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn bit_size(self) -> usize {
        match self {
            Self::P224 => 224,
            Self::P256 | Self::Sm2P256V1 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }

    /// Byte length of one field element (and of the private scalar).
    pub fn coordinate_size(self) -> usize {
        (self.bit_size() + 7) / 8
    }
}

/// A private scalar extracted from a tagged key blob.
pub struct DecodedPrivateKey {
    pub curve: Curve,
    pub scalar: Zeroizing<Vec<u8>>,
}

impl DecodedPrivateKey {
    /// Converts the scalar into a P-256 secret key.
    pub fn to_p256(&self) -> Result<SecretKey> {
        if self.curve != Curve::P256 {
            return Err(CryptoError::UnsupportedCurve(self.curve.tag()));
        }
        SecretKey::from_slice(&self.scalar)
            .map_err(|_| CryptoError::MalformedKey("scalar out of range".to_string()))
    }
}

/// Reads the curve and private scalar out of a serialized private key.
///
/// The blob must be at least `2 * size + 3` bytes, where `size` is the
/// coordinate size of the curve named by `blob[1]`.
pub fn decode_private_key(blob: &[u8]) -> Result<DecodedPrivateKey> {
    if blob.len() < 2 {
        return Err(CryptoError::MalformedKey(
            "missing algorithm and curve tags".to_string(),
        ));
    }

    let curve = Curve::from_tag(blob[1])?;
    let size = curve.coordinate_size();
    if blob.len() < size * 2 + 3 {
        return Err(CryptoError::MalformedKey(format!(
            "not enough length: expected at least {} bytes, got {}",
            size * 2 + 3,
            blob.len()
        )));
    }

    Ok(DecodedPrivateKey {
        curve,
        scalar: Zeroizing::new(blob[2..2 + size].to_vec()),
    })
}

/// Decodes a bare SEC1 point (compressed or uncompressed) on `curve`.
pub fn decode_public_key(bytes: &[u8], curve: Curve) -> Result<PublicKey> {
    if curve != Curve::P256 {
        return Err(CryptoError::UnsupportedCurve(curve.tag()));
    }
    PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPoint)
}

/// Decodes a public key in Ontology's generic serialization.
///
/// A 33- or 65-byte value starting with a SEC1 prefix is an untagged
/// P-256 ECDSA key. Anything else is `alg | curve | point`.
pub fn deserialize_public_key(bytes: &[u8]) -> Result<PublicKey> {
    match bytes {
        [0x02 | 0x03, ..] if bytes.len() == 33 => decode_public_key(bytes, Curve::P256),
        [0x04, ..] if bytes.len() == 65 => decode_public_key(bytes, Curve::P256),
        [alg, curve, point @ ..] if !point.is_empty() => {
            let algorithm = KeyAlgorithm::from_tag(*alg)?;
            if algorithm != KeyAlgorithm::Ecdsa {
                return Err(CryptoError::UnsupportedAlgorithm(*alg));
            }
            decode_public_key(point, Curve::from_tag(*curve)?)
        }
        _ => Err(CryptoError::MalformedKey(format!(
            "public key too short: {} bytes",
            bytes.len()
        ))),
    }
}

/// Serializes a P-256 public key as a compressed 33-byte point.
pub fn serialize_public_key(public_key: &PublicKey) -> Vec<u8> {
    public_key.to_encoded_point(true).as_bytes().to_vec()
}

/// Serializes a P-256 secret key as `0x12 | 0x02 | D | compressed point`.
pub fn serialize_private_key(secret_key: &SecretKey) -> Zeroizing<Vec<u8>> {
    let size = Curve::P256.coordinate_size();
    let mut blob = Zeroizing::new(Vec::with_capacity(size * 2 + 3));
    blob.push(ALGORITHM_ECDSA);
    blob.push(Curve::P256.tag());
    blob.extend_from_slice(&secret_key.to_bytes());
    blob.extend_from_slice(&serialize_public_key(&secret_key.public_key()));
    blob
}
