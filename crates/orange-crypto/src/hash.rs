// Hashing helpers for Ontology addresses and signature digests

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of the input bytes.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// SHA-256 applied twice, as used by base58 address checksums.
pub fn sha256d(bytes: &[u8]) -> [u8; 32] {
    sha256(&sha256(bytes))
}

/// RIPEMD-160 of SHA-256, the 20-byte program hash behind an address.
pub fn hash160(bytes: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(sha256(bytes));
    hasher.finalize().into()
}
