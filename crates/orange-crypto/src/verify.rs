// Detached signature verification
//
// Malformed inputs are errors; a well-formed signature that does not
// match the message or key is `Ok(false)`.

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::PublicKey;

use crate::error::{CryptoError, Result};
use crate::keys::deserialize_public_key;
use crate::sign::SignatureScheme;

/// Raw `r | s` length for P-256, accepted without a scheme byte.
const LEGACY_SIGNATURE_LEN: usize = 64;

/// A deserialized Ontology signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntSignature {
    pub scheme: SignatureScheme,
    pub value: Signature,
}

/// Parses `scheme | r | s`, or a bare 64-byte `r | s` as SHA256withECDSA.
pub fn deserialize_signature(bytes: &[u8]) -> Result<OntSignature> {
    if bytes.len() < 2 {
        return Err(CryptoError::InvalidSignatureEncoding(
            "signature data too short".to_string(),
        ));
    }

    let (scheme, rs) = if bytes.len() == LEGACY_SIGNATURE_LEN {
        (SignatureScheme::Sha256WithEcdsa, bytes)
    } else {
        let scheme = SignatureScheme::from_id(bytes[0]).ok_or_else(|| {
            CryptoError::InvalidSignatureEncoding(format!("unknown scheme id {}", bytes[0]))
        })?;
        (scheme, &bytes[1..])
    };

    if !scheme.is_ecdsa() {
        return Err(CryptoError::InvalidSignatureEncoding(format!(
            "unsupported scheme {}",
            scheme
        )));
    }

    if rs.len() != LEGACY_SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignatureEncoding(format!(
            "invalid r|s length: expected {} bytes, got {}",
            LEGACY_SIGNATURE_LEN,
            rs.len()
        )));
    }

    let value = Signature::from_slice(rs).map_err(|_| {
        CryptoError::InvalidSignatureEncoding("r or s out of range".to_string())
    })?;

    Ok(OntSignature { scheme, value })
}

/// Checks a deserialized signature against an already-decoded key.
pub fn verify_with_key(public_key: &PublicKey, message: &[u8], signature: &OntSignature) -> bool {
    let Some(digest) = signature.scheme.ecdsa_digest(message) else {
        return false;
    };
    VerifyingKey::from(public_key)
        .verify_prehash(&digest, &signature.value)
        .is_ok()
}

/// Verifies `signature_bytes` over `message` under a serialized public key.
pub fn verify(public_key_bytes: &[u8], message: &[u8], signature_bytes: &[u8]) -> Result<bool> {
    let signature = deserialize_signature(signature_bytes)?;
    let public_key = deserialize_public_key(public_key_bytes)?;
    Ok(verify_with_key(&public_key, message, &signature))
}
