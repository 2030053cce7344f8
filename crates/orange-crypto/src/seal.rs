// DID-keyed encryption: encrypt to a resolved public key, decrypt with
// the local tagged private key. Both sides use empty shared-info.

use rand_core::OsRng;

use crate::ecies;
use crate::error::Result;
use crate::keys::{decode_private_key, decode_public_key, Curve};

/// Encrypts `message` to the raw P-256 point published for a DID.
pub fn encrypt_for_recipient(message: &[u8], recipient_public_key: &[u8]) -> Result<Vec<u8>> {
    let public_key = decode_public_key(recipient_public_key, Curve::P256)?;
    ecies::encrypt(&mut OsRng, &public_key, message, &[], &[])
}

/// Decrypts `ciphertext` with a serialized private key blob.
pub fn decrypt_local(ciphertext: &[u8], own_private_key: &[u8]) -> Result<Vec<u8>> {
    let secret = decode_private_key(own_private_key)?.to_p256()?;
    ecies::decrypt(&secret, ciphertext, &[], &[])
}
