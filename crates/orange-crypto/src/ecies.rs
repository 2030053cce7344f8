// ECIES over P-256 with AES-128-CTR and HMAC-SHA-256
//
// Wire layout (compatible with go-ethereum's ECIES_AES128_SHA256):
//   R (65 bytes, uncompressed) | IV (16) | AES-128-CTR ciphertext | HMAC-SHA-256 tag (32)
//
// Key material is K = ConcatKDF-SHA256(ECDH x-coordinate, s1, 32),
// split into Ke = K[..16] and Km = SHA-256(K[16..]).

use aes::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use p256::ecdh::{diffie_hellman, EphemeralSecret};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::{CryptoRngCore, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Symmetric key length in bytes (AES-128 and the MAC key share it).
const KEY_LEN: usize = 16;
/// AES block size, used as the IV length.
const IV_LEN: usize = 16;
/// HMAC-SHA-256 output size.
const TAG_LEN: usize = 32;
/// Uncompressed SEC1 P-256 point size.
const EPHEMERAL_KEY_LEN: usize = 65;

/// Smallest ciphertext that can hold `R | IV | tag`.
pub const MIN_CIPHERTEXT_LEN: usize = EPHEMERAL_KEY_LEN + IV_LEN + TAG_LEN;

/// NIST SP 800-56 concatenation KDF with SHA-256.
fn concat_kdf(z: &[u8], s1: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(len + 32));
    let mut counter: u32 = 1;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(s1);
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(len);
    out
}

/// Derives (Ke, Km) from the shared secret.
fn derive_keys(z: &[u8], s1: &[u8]) -> (Zeroizing<Vec<u8>>, Zeroizing<[u8; 32]>) {
    let k = concat_kdf(z, s1, 2 * KEY_LEN);
    let ke = Zeroizing::new(k[..KEY_LEN].to_vec());
    let km = Zeroizing::new(Sha256::digest(&k[KEY_LEN..]).into());
    (ke, km)
}

fn message_tag(km: &[u8], em: &[u8], s2: &[u8]) -> Result<HmacSha256> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(km).map_err(|_| CryptoError::EncryptionFailed)?;
    mac.update(em);
    mac.update(s2);
    Ok(mac)
}

/// Encrypts `message` to `recipient`.
///
/// `s1` feeds the KDF and `s2` the MAC; both are usually empty.
pub fn encrypt<R: CryptoRngCore>(
    rng: &mut R,
    recipient: &PublicKey,
    message: &[u8],
    s1: &[u8],
    s2: &[u8],
) -> Result<Vec<u8>> {
    let ephemeral = EphemeralSecret::random(&mut *rng);
    let shared = ephemeral.diffie_hellman(recipient);
    let (ke, km) = derive_keys(shared.raw_secret_bytes(), s1);

    let mut iv = [0u8; IV_LEN];
    rng.try_fill_bytes(&mut iv)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut em = Vec::with_capacity(IV_LEN + message.len());
    em.extend_from_slice(&iv);
    em.extend_from_slice(message);
    let mut cipher =
        Aes128Ctr::new_from_slices(&ke, &iv).map_err(|_| CryptoError::EncryptionFailed)?;
    cipher.apply_keystream(&mut em[IV_LEN..]);

    let tag = message_tag(km.as_slice(), &em, s2)?.finalize().into_bytes();

    let ephemeral_point = ephemeral.public_key().to_encoded_point(false);
    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LEN + em.len() + TAG_LEN);
    out.extend_from_slice(ephemeral_point.as_bytes());
    out.extend_from_slice(&em);
    out.extend_from_slice(&tag);
    Ok(out)
}

/// Decrypts a ciphertext produced by [`encrypt`].
///
/// Every failure maps to [`CryptoError::DecryptionFailed`].
pub fn decrypt(secret: &SecretKey, ciphertext: &[u8], s1: &[u8], s2: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < MIN_CIPHERTEXT_LEN || ciphertext[0] != 0x04 {
        return Err(CryptoError::DecryptionFailed);
    }

    let (r_bytes, rest) = ciphertext.split_at(EPHEMERAL_KEY_LEN);
    let (em, tag) = rest.split_at(rest.len() - TAG_LEN);

    let ephemeral =
        PublicKey::from_sec1_bytes(r_bytes).map_err(|_| CryptoError::DecryptionFailed)?;
    let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
    let (ke, km) = derive_keys(shared.raw_secret_bytes(), s1);

    message_tag(km.as_slice(), em, s2)
        .map_err(|_| CryptoError::DecryptionFailed)?
        .verify_slice(tag)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let (iv, body) = em.split_at(IV_LEN);
    let mut plaintext = body.to_vec();
    let mut cipher =
        Aes128Ctr::new_from_slices(&ke, iv).map_err(|_| CryptoError::DecryptionFailed)?;
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn keypair(byte: u8) -> (SecretKey, PublicKey) {
        let secret = SecretKey::from_slice(&[byte; 32]).expect("valid scalar");
        let public = secret.public_key();
        (secret, public)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (secret, public) = keypair(0x11);
        let message = b"Orange ECIES test message";

        let ciphertext = encrypt(&mut OsRng, &public, message, &[], &[]).expect("encrypt");
        assert_eq!(ciphertext.len(), MIN_CIPHERTEXT_LEN + message.len());
        assert_eq!(ciphertext[0], 0x04);

        let plaintext = decrypt(&secret, &ciphertext, &[], &[]).expect("decrypt");
        assert_eq!(plaintext, message);
    }

    #[test]
    fn test_empty_message_roundtrip() {
        let (secret, public) = keypair(0x12);
        let ciphertext = encrypt(&mut OsRng, &public, b"", &[], &[]).expect("encrypt");
        assert_eq!(ciphertext.len(), MIN_CIPHERTEXT_LEN);
        assert!(decrypt(&secret, &ciphertext, &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_encryption_is_randomized() {
        let (_, public) = keypair(0x13);
        let a = encrypt(&mut OsRng, &public, b"same", &[], &[]).unwrap();
        let b = encrypt(&mut OsRng, &public, b"same", &[], &[]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_flipped_tag_fails() {
        let (secret, public) = keypair(0x14);
        let mut ciphertext = encrypt(&mut OsRng, &public, b"payload", &[], &[]).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert_eq!(
            decrypt(&secret, &ciphertext, &[], &[]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_flipped_body_fails() {
        let (secret, public) = keypair(0x15);
        let mut ciphertext = encrypt(&mut OsRng, &public, b"payload", &[], &[]).unwrap();
        ciphertext[EPHEMERAL_KEY_LEN + IV_LEN] ^= 0x80;

        assert_eq!(
            decrypt(&secret, &ciphertext, &[], &[]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let (_, public) = keypair(0x16);
        let (other_secret, _) = keypair(0x17);
        let ciphertext = encrypt(&mut OsRng, &public, b"payload", &[], &[]).unwrap();

        assert_eq!(
            decrypt(&other_secret, &ciphertext, &[], &[]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_truncated_and_garbage_inputs_fail() {
        let (secret, public) = keypair(0x18);
        let ciphertext = encrypt(&mut OsRng, &public, b"payload", &[], &[]).unwrap();

        for len in [0, 1, 64, MIN_CIPHERTEXT_LEN - 1] {
            assert_eq!(
                decrypt(&secret, &ciphertext[..len], &[], &[]),
                Err(CryptoError::DecryptionFailed),
                "length {}",
                len
            );
        }

        let mut compressed_prefix = ciphertext.clone();
        compressed_prefix[0] = 0x02;
        assert_eq!(
            decrypt(&secret, &compressed_prefix, &[], &[]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_shared_info_must_match() {
        let (secret, public) = keypair(0x19);
        let ciphertext = encrypt(&mut OsRng, &public, b"payload", b"s1", b"s2").unwrap();

        assert_eq!(
            decrypt(&secret, &ciphertext, b"s1", b"s2").unwrap(),
            b"payload"
        );
        assert!(decrypt(&secret, &ciphertext, &[], b"s2").is_err());
        assert!(decrypt(&secret, &ciphertext, b"s1", &[]).is_err());
    }

    #[test]
    fn test_concat_kdf_length_and_prefix() {
        let short = concat_kdf(b"z", b"", 16);
        let long = concat_kdf(b"z", b"", 48);
        assert_eq!(short.len(), 16);
        assert_eq!(long.len(), 48);
        assert_eq!(&long[..16], &short[..]);
    }
}
