//! The provider interface and its Ontology implementation.

use orange_crypto::{decrypt_local, encrypt_for_recipient};
use secrecy::SecretString;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::registry::{resolve_public_key, DidRegistry, RpcRegistry};
use crate::wallet::{Account, Wallet};

/// Identity operations exposed to Orange.
pub trait Provider {
    /// Signs `data` with the local identity's key.
    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Checks `sig` over `msg` against the key registered for `did`.
    ///
    /// A signature that simply does not verify is `Ok(false)`.
    fn verify_sig(&self, did: &str, msg: &[u8], sig: &[u8]) -> Result<bool>;

    /// Encrypts `data` so only the holder of `did`'s key can read it.
    fn encrypt_data_with_did(&self, data: &[u8], did: &str) -> Result<Vec<u8>>;

    /// Decrypts data encrypted to the local identity.
    fn decrypt_data(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// `did:ont:<address>` of the local identity.
    fn self_did(&self) -> String;
}

/// Provider backed by an Ontology wallet account and a DID registry.
#[derive(Debug)]
pub struct OntProvider<R = RpcRegistry> {
    account: Account,
    registry: R,
}

impl OntProvider<RpcRegistry> {
    /// Opens the wallet at `config.wallet_path` and unlocks its default
    /// account.
    pub fn new(config: &ProviderConfig, password: &SecretString) -> Result<Self> {
        let wallet = Wallet::open(&config.wallet_path)?;
        let account = wallet.default_account(password)?;
        let registry = RpcRegistry::from_config(config);
        tracing::debug!(
            did = %account.did(),
            network = %config.network,
            rpc = registry.address(),
            "provider ready"
        );
        Ok(Self::with_registry(account, registry))
    }
}

impl<R: DidRegistry> OntProvider<R> {
    pub fn with_registry(account: Account, registry: R) -> Self {
        Self { account, registry }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Public key bytes registered for `did`.
    pub fn resolve_public_key(&self, did: &str) -> Result<Vec<u8>> {
        resolve_public_key(&self.registry, did)
    }
}

impl<R: DidRegistry> Provider for OntProvider<R> {
    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.account.sign(data)
    }

    fn verify_sig(&self, did: &str, msg: &[u8], sig: &[u8]) -> Result<bool> {
        let public_key = self.resolve_public_key(did)?;
        Ok(orange_crypto::verify(&public_key, msg, sig)?)
    }

    fn encrypt_data_with_did(&self, data: &[u8], did: &str) -> Result<Vec<u8>> {
        let public_key = self.resolve_public_key(did)?;
        Ok(encrypt_for_recipient(data, &public_key)?)
    }

    fn decrypt_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let private_key = self.account.serialized_private_key();
        Ok(decrypt_local(data, &private_key)?)
    }

    fn self_did(&self) -> String {
        self.account.did()
    }
}
