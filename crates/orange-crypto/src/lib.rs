// Orange Crypto - Key codec, ECIES and signatures for the Ontology provider

pub mod did;
pub mod ecies;
pub mod error;
pub mod hash;
pub mod keys;
pub mod seal;
pub mod sign;
pub mod verify;

pub use did::{address_from_did, Address, DID_PREFIX};
pub use error::{CryptoError, Result};
pub use keys::{
    decode_private_key, decode_public_key, deserialize_public_key, serialize_private_key,
    serialize_public_key, Curve, DecodedPrivateKey, KeyAlgorithm,
};
pub use p256::ecdsa::SigningKey;
pub use p256::{PublicKey, SecretKey};
pub use seal::{decrypt_local, encrypt_for_recipient};
pub use sign::{sign, SignatureScheme};
pub use verify::{deserialize_signature, verify, verify_with_key, OntSignature};
