//! Ontology wallet files and the accounts they protect.
//!
//! A wallet is a JSON document holding one or more accounts. Each account
//! stores its private scalar encrypted with AES-256-GCM under a key derived
//! from the wallet password with scrypt:
//!
//! - `dk = scrypt(password, salt, N, r, p, 64)`
//! - nonce = `dk[0..12]`, key = `dk[32..64]`
//! - associated data = the account's base58 address

use std::fmt;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use orange_crypto::{
    serialize_private_key, serialize_public_key, Address, Curve, PublicKey, SecretKey,
    SignatureScheme, SigningKey,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{ProviderError, Result};

const ALGORITHM_ECDSA: &str = "ECDSA";
const ENC_ALG_AES_GCM: &str = "aes-256-gcm";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const DERIVED_KEY_LEN: usize = 64;

/// scrypt cost parameters stored at the top of a wallet file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScryptParams {
    pub n: u32,
    pub r: u32,
    pub p: u32,
    pub dk_len: usize,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            n: 16384,
            r: 8,
            p: 8,
            dk_len: DERIVED_KEY_LEN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParameters {
    #[serde(default)]
    pub curve: String,
}

/// One account entry as stored in the wallet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    #[serde(default)]
    pub label: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub lock: bool,
    pub algorithm: String,
    #[serde(default)]
    pub parameters: KeyParameters,
    /// Base64 AES-GCM ciphertext of the private scalar.
    pub key: String,
    #[serde(rename = "enc-alg", default = "default_enc_alg")]
    pub enc_alg: String,
    /// Base64 scrypt salt.
    pub salt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default = "default_signature_scheme")]
    pub signature_scheme: String,
}

fn default_enc_alg() -> String {
    ENC_ALG_AES_GCM.to_string()
}

fn default_signature_scheme() -> String {
    SignatureScheme::Sha256WithEcdsa.name().to_string()
}

/// An Ontology wallet document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub scrypt: ScryptParams,
    #[serde(default)]
    pub identities: Option<serde_json::Value>,
    #[serde(default)]
    pub accounts: Vec<AccountData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

fn default_version() -> String {
    "1.1".to_string()
}

impl Wallet {
    /// Creates an empty wallet with the given scrypt cost.
    pub fn new(name: impl Into<String>, scrypt: ScryptParams) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            scrypt,
            identities: None,
            accounts: Vec::new(),
            extra: None,
        }
    }

    /// Reads and parses a wallet file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Wallet(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let wallet = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            accounts = wallet.accounts.len(),
            "opened wallet"
        );
        Ok(wallet)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ProviderError::Wallet(format!("Failed to parse wallet: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProviderError::Wallet(format!("Failed to serialize wallet: {}", e)))
    }

    /// Writes the wallet as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| {
            ProviderError::Wallet(format!("Failed to write '{}': {}", path.display(), e))
        })
    }

    /// The account flagged `isDefault`, or the first account.
    pub fn default_account_data(&self) -> Result<&AccountData> {
        self.accounts
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.accounts.first())
            .ok_or_else(|| ProviderError::Wallet("wallet has no accounts".to_string()))
    }

    /// Decrypts the default account with `password`.
    pub fn default_account(&self, password: &SecretString) -> Result<Account> {
        let data = self.default_account_data()?;
        decrypt_account(data, password, &self.scrypt)
    }

    /// Encrypts `secret` under `password` and appends it as a new account.
    ///
    /// The new account becomes the default when `make_default` is set or the
    /// wallet was empty.
    pub fn add_account(
        &mut self,
        secret: &SecretKey,
        label: impl Into<String>,
        password: &SecretString,
        make_default: bool,
    ) -> Result<&AccountData> {
        let make_default = make_default || self.accounts.is_empty();
        let data = encrypt_account(secret, label.into(), password, &self.scrypt)?;
        if make_default {
            for account in &mut self.accounts {
                account.is_default = false;
            }
        }
        self.accounts.push(AccountData {
            is_default: make_default,
            ..data
        });
        Ok(&self.accounts[self.accounts.len() - 1])
    }
}

/// A decrypted wallet account able to sign and decrypt.
pub struct Account {
    label: String,
    address: Address,
    secret: SecretKey,
}

impl Account {
    pub fn from_secret(secret: SecretKey, label: impl Into<String>) -> Self {
        let address = Address::from_public_key(&secret.public_key());
        Self {
            label: label.into(),
            address,
            secret,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `did:ont:<base58-address>` for this account.
    pub fn did(&self) -> String {
        self.address.to_did()
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Compressed public key, as published in the DID registry.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        serialize_public_key(&self.public_key())
    }

    /// The tagged private key blob understood by the key codec.
    pub fn serialized_private_key(&self) -> Zeroizing<Vec<u8>> {
        serialize_private_key(&self.secret)
    }

    pub fn signature_scheme(&self) -> SignatureScheme {
        SignatureScheme::Sha256WithEcdsa
    }

    /// Signs `data` with the account's SHA256withECDSA key.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(orange_crypto::sign(&SigningKey::from(&self.secret), data)?)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("label", &self.label)
            .field("address", &self.address.to_base58())
            .finish_non_exhaustive()
    }
}

fn derive_key(
    password: &SecretString,
    salt: &[u8],
    params: &ScryptParams,
) -> Result<Zeroizing<Vec<u8>>> {
    if params.n < 2 || !params.n.is_power_of_two() {
        return Err(ProviderError::Wallet(format!(
            "scrypt N must be a power of two, got {}",
            params.n
        )));
    }
    if params.dk_len < DERIVED_KEY_LEN {
        return Err(ProviderError::Wallet(format!(
            "scrypt dkLen must be at least {}, got {}",
            DERIVED_KEY_LEN, params.dk_len
        )));
    }

    let log_n = params.n.trailing_zeros() as u8;
    let scrypt_params = scrypt::Params::new(log_n, params.r, params.p, params.dk_len)
        .map_err(|e| ProviderError::Wallet(format!("Invalid scrypt parameters: {}", e)))?;

    let mut derived = Zeroizing::new(vec![0u8; params.dk_len]);
    scrypt::scrypt(
        password.expose_secret().as_bytes(),
        salt,
        &scrypt_params,
        &mut derived,
    )
    .map_err(|e| ProviderError::Wallet(format!("Key derivation failed: {}", e)))?;
    Ok(derived)
}

fn gcm_for(derived: &[u8]) -> Result<(Aes256Gcm, &Nonce<aes_gcm::aead::consts::U12>)> {
    let cipher = Aes256Gcm::new_from_slice(&derived[32..DERIVED_KEY_LEN])
        .map_err(|_| ProviderError::Wallet("Invalid AES key length".to_string()))?;
    Ok((cipher, Nonce::from_slice(&derived[..NONCE_LEN])))
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(value)
        .map_err(|e| ProviderError::Wallet(format!("Invalid base64 in '{}': {}", field, e)))
}

fn check_supported(data: &AccountData) -> Result<()> {
    if data.algorithm != ALGORITHM_ECDSA {
        return Err(ProviderError::Wallet(format!(
            "Unsupported key algorithm '{}'",
            data.algorithm
        )));
    }
    if Curve::from_name(&data.parameters.curve) != Some(Curve::P256) {
        return Err(ProviderError::Wallet(format!(
            "Unsupported curve '{}'",
            data.parameters.curve
        )));
    }
    if data.enc_alg != ENC_ALG_AES_GCM {
        return Err(ProviderError::Wallet(format!(
            "Unsupported encryption algorithm '{}'",
            data.enc_alg
        )));
    }
    let scheme: SignatureScheme = data.signature_scheme.parse()?;
    if scheme != SignatureScheme::Sha256WithEcdsa {
        return Err(ProviderError::Wallet(format!(
            "Unsupported signature scheme '{}'",
            scheme
        )));
    }
    Ok(())
}

fn decrypt_account(
    data: &AccountData,
    password: &SecretString,
    params: &ScryptParams,
) -> Result<Account> {
    check_supported(data)?;

    let salt = decode_base64("salt", &data.salt)?;
    let encrypted = decode_base64("key", &data.key)?;
    let derived = derive_key(password, &salt, params)?;
    let (cipher, nonce) = gcm_for(&derived)?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &encrypted,
                    aad: data.address.as_bytes(),
                },
            )
            .map_err(|_| ProviderError::WrongPassword)?,
    );

    // The stored scalar drops leading zero bytes
    let size = Curve::P256.coordinate_size();
    if plaintext.is_empty() || plaintext.len() > size {
        return Err(ProviderError::Wallet(format!(
            "Invalid private key length {}",
            plaintext.len()
        )));
    }
    let mut scalar = Zeroizing::new(vec![0u8; size]);
    scalar[size - plaintext.len()..].copy_from_slice(&plaintext);
    let secret = SecretKey::from_slice(&scalar)
        .map_err(|_| ProviderError::Wallet("Private key out of range".to_string()))?;

    let account = Account::from_secret(secret, data.label.clone());
    if account.address().to_base58() != data.address {
        tracing::warn!(
            stored = %data.address,
            derived = %account.address(),
            "wallet address does not match decrypted key"
        );
        return Err(ProviderError::Wallet(format!(
            "Address mismatch: wallet says {}, key derives {}",
            data.address,
            account.address()
        )));
    }

    Ok(account)
}

fn encrypt_account(
    secret: &SecretKey,
    label: String,
    password: &SecretString,
    params: &ScryptParams,
) -> Result<AccountData> {
    let address = Address::from_public_key(&secret.public_key()).to_base58();

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let derived = derive_key(password, &salt, params)?;
    let (cipher, nonce) = gcm_for(&derived)?;
    let scalar = Zeroizing::new(secret.to_bytes().to_vec());
    let encrypted = cipher
        .encrypt(
            nonce,
            Payload {
                msg: &scalar,
                aad: address.as_bytes(),
            },
        )
        .map_err(|_| ProviderError::Wallet("Failed to encrypt private key".to_string()))?;

    Ok(AccountData {
        label,
        address,
        is_default: false,
        lock: false,
        algorithm: ALGORITHM_ECDSA.to_string(),
        parameters: KeyParameters {
            curve: Curve::P256.name().to_string(),
        },
        key: BASE64_STANDARD.encode(encrypted),
        enc_alg: ENC_ALG_AES_GCM.to_string(),
        salt: BASE64_STANDARD.encode(salt),
        public_key: Some(hex::encode(serialize_public_key(&secret.public_key()))),
        signature_scheme: default_signature_scheme(),
    })
}
