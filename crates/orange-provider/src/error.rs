//! Error types for the Orange provider.

use orange_crypto::CryptoError;

/// Provider error type.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("DID not found: no public key registered for {0}")]
    DidNotFound(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Malformed registry response: {0}")]
    MalformedRegistryResponse(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Wrong wallet password")]
    WrongPassword,

    #[error("Unknown network '{0}' (expected MAINNET or TESTNET)")]
    UnknownNetwork(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
