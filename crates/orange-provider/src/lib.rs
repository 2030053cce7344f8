//! Orange provider backed by an Ontology wallet.
//!
//! [`OntProvider`] signs and decrypts with the default account of an
//! Ontology wallet file, and resolves other parties' keys through the ONT ID
//! DID registry.

pub mod config;
pub mod error;
pub mod invoke;
pub mod provider;
pub mod registry;
pub mod wallet;

pub use config::{Network, ProviderConfig, DEFAULT_TIMEOUT, MAINNET_RPC, TESTNET_RPC};
pub use error::{ProviderError, Result};
pub use provider::{OntProvider, Provider};
pub use registry::{resolve_public_key, DidPubkey, DidRegistry, RpcRegistry, StaticRegistry};
pub use wallet::{Account, AccountData, ScryptParams, Wallet};

pub use secrecy::SecretString;
