//! Error types for Orange crypto operations.

/// Errors produced by key decoding, signing, verification and ECIES.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Unsupported curve: {0:#04x}")]
    UnsupportedCurve(u8),

    #[error("Unsupported key algorithm: {0:#04x}")]
    UnsupportedAlgorithm(u8),

    #[error("Invalid curve point")]
    InvalidPoint,

    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Signing failed")]
    SigningFailed,

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Carries no cause so callers cannot tell a bad MAC from a bad key.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid DID: {0}")]
    InvalidDid(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
