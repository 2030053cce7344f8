// Keystore module - creates and unlocks the Ontology wallet used by the CLI

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use orange_crypto::{Address, SecretKey};
use orange_provider::{OntProvider, ProviderConfig, ScryptParams, SecretString, Wallet};
use rand::rngs::OsRng;

/// Environment variable consulted before prompting for the wallet password.
pub const PASSWORD_ENV: &str = "ORANGE_WALLET_PASSWORD";

/// Reads the wallet password from the environment or the terminal.
///
/// With `confirm` set the password is asked twice and must be non-empty.
pub fn read_password(confirm: bool) -> Result<SecretString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        tracing::debug!("using wallet password from {}", PASSWORD_ENV);
        return Ok(SecretString::new(password));
    }

    let password =
        rpassword::prompt_password("Wallet password: ").context("Failed to read password")?;
    if confirm {
        if password.is_empty() {
            anyhow::bail!("Password must not be empty");
        }
        let again =
            rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
        if password != again {
            anyhow::bail!("Passwords do not match");
        }
    }
    Ok(SecretString::new(password))
}

/// Creates a wallet at `path` holding one fresh P-256 account.
///
/// Returns the DID of the new account.
pub fn init_wallet(
    path: &Path,
    password: &SecretString,
    scrypt: ScryptParams,
    force: bool,
) -> Result<String> {
    if path.exists() && !force {
        anyhow::bail!(
            "Wallet already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let secret = SecretKey::random(&mut OsRng);
    let mut wallet = Wallet::new("orange", scrypt);
    wallet.add_account(&secret, "default", password, true)?;
    wallet.save(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(Address::from_public_key(&secret.public_key()).to_did())
}

/// DID of the wallet's default account, read without the password.
pub fn wallet_did(path: &Path) -> Result<String> {
    let wallet = Wallet::open(path)?;
    let account = wallet.default_account_data()?;
    let address = Address::from_str(&account.address)
        .with_context(|| format!("Invalid account address '{}'", account.address))?;
    Ok(address.to_did())
}

/// Unlocks the wallet named in `config` and connects to its registry.
pub fn load_provider(config: &ProviderConfig, password: &SecretString) -> Result<OntProvider> {
    OntProvider::new(config, password)
        .with_context(|| format!("Failed to open wallet {}", config.wallet_path.display()))
}
