// Orange CLI - Ontology identity provider for Orange

mod keystore;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use orange_provider::{
    resolve_public_key, Network, Provider, ProviderConfig, RpcRegistry, ScryptParams,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Orange - sign, verify and encrypt with an Ontology DID
#[derive(Parser)]
#[command(name = "orange")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the Ontology wallet file
    #[arg(long, global = true, default_value = "wallet.dat")]
    wallet: PathBuf,

    /// Network whose DID registry is queried (MAINNET or TESTNET)
    #[arg(long, global = true, default_value = "TESTNET")]
    network: Network,

    /// RPC endpoint overriding the network default
    #[arg(long, global = true, value_name = "URL")]
    rpc: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a wallet with a fresh P-256 account
    Init {
        /// Force overwrite existing wallet
        #[arg(short, long)]
        force: bool,
    },
    /// Print the DID of the wallet's default account
    Did,
    /// Sign a file, printing the hex signature
    Sign {
        /// Path to the file to sign
        path: PathBuf,
    },
    /// Verify a hex signature over a file against a DID's registered key
    Verify {
        /// Signer DID
        did: String,

        /// Path to the signed file
        path: PathBuf,

        /// Hex-encoded signature
        signature: String,
    },
    /// Encrypt a file to a DID
    Encrypt {
        /// Recipient DID
        did: String,

        /// Path to the file to encrypt
        path: PathBuf,

        /// Output file (defaults to <file>.enc)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decrypt a file encrypted to the wallet's DID
    Decrypt {
        /// Path to the ciphertext
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the first public key registered for a DID
    Resolve {
        /// DID to look up
        did: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ProviderConfig::new(&cli.wallet, cli.network);
    if let Some(rpc) = &cli.rpc {
        config = config.with_rpc_address(rpc);
    }

    let result = match cli.command {
        Commands::Init { force } => handle_init(&config.wallet_path, force),
        Commands::Did => handle_did(&config.wallet_path),
        Commands::Sign { path } => handle_sign(&config, &path),
        Commands::Verify {
            did,
            path,
            signature,
        } => handle_verify(&config, &did, &path, &signature),
        Commands::Encrypt { did, path, output } => {
            handle_encrypt(&config, &did, &path, output.as_deref())
        }
        Commands::Decrypt { path, output } => handle_decrypt(&config, &path, output.as_deref()),
        Commands::Resolve { did } => handle_resolve(&config, &did),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn handle_init(wallet: &Path, force: bool) -> anyhow::Result<()> {
    let password = keystore::read_password(true)?;
    let did = keystore::init_wallet(wallet, &password, ScryptParams::default(), force)?;

    println!("Wallet initialized successfully!");
    println!();
    println!("Your DID: {}", did);
    println!();
    println!("Wallet file: {}", wallet.display());
    println!("Register the DID on chain before others can resolve it.");
    println!("Keep your password safe - it cannot be recovered!");
    Ok(())
}

fn handle_did(wallet: &Path) -> anyhow::Result<()> {
    println!("{}", keystore::wallet_did(wallet)?);
    Ok(())
}

fn handle_sign(config: &ProviderConfig, path: &Path) -> anyhow::Result<()> {
    let password = keystore::read_password(false)?;
    let provider = keystore::load_provider(config, &password)?;

    let data = read_file(path)?;
    let signature = provider.sign_data(&data)?;
    println!("{}", hex::encode(signature));
    Ok(())
}

fn handle_verify(
    config: &ProviderConfig,
    did: &str,
    path: &Path,
    signature: &str,
) -> anyhow::Result<()> {
    use colored::Colorize;

    let signature = hex::decode(signature.trim()).context("Signature is not valid hex")?;
    let data = read_file(path)?;

    // Verification needs only the registry, not the local wallet.
    let registry = RpcRegistry::from_config(config);
    let public_key = resolve_public_key(&registry, did)?;
    let valid = orange_crypto::verify(&public_key, &data, &signature)?;

    if valid {
        println!("{} {}", "✓".green().bold(), "Signature verified".green());
        println!();
        println!("  Signer: {}", truncate_did(did));
        println!("  File:   {}", path.display());
        Ok(())
    } else {
        eprintln!("{} {}", "✗".red().bold(), "Signature verification failed".red());
        anyhow::bail!("signature does not match {}", did)
    }
}

fn handle_encrypt(
    config: &ProviderConfig,
    did: &str,
    path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let registry = RpcRegistry::from_config(config);
    let public_key = resolve_public_key(&registry, did)?;

    let data = read_file(path)?;
    let ciphertext = orange_crypto::encrypt_for_recipient(&data, &public_key)?;

    let output = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let mut name = path.as_os_str().to_owned();
            name.push(".enc");
            PathBuf::from(name)
        }
    };
    std::fs::write(&output, &ciphertext)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    println!("Ciphertext written to: {}", output.display());
    println!("Recipient: {}", did);
    Ok(())
}

fn handle_decrypt(config: &ProviderConfig, path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let password = keystore::read_password(false)?;
    let provider = keystore::load_provider(config, &password)?;

    let ciphertext = read_file(path)?;
    let plaintext = provider.decrypt_data(&ciphertext)?;

    match output {
        Some(p) => {
            std::fs::write(p, &plaintext)
                .with_context(|| format!("Failed to write '{}'", p.display()))?;
            println!("Plaintext written to: {}", p.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn handle_resolve(config: &ProviderConfig, did: &str) -> anyhow::Result<()> {
    let registry = RpcRegistry::from_config(config);
    let public_key = resolve_public_key(&registry, did)?;
    println!("{}", hex::encode(public_key));
    Ok(())
}

/// Truncates a DID for readability: "did:ont:AFmseVrdL9f9...vhUMqNMV"
fn truncate_did(did: &str) -> String {
    if did.len() <= 30 || !did.is_ascii() {
        return did.to_string();
    }
    let prefix = &did[..20];
    let suffix = &did[did.len() - 8..];
    format!("{}...{}", prefix, suffix)
}
