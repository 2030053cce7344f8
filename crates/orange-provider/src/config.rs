//! Provider configuration: wallet location and registry endpoint.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ProviderError;

/// RPC endpoint for Ontology MainNet.
pub const MAINNET_RPC: &str = "http://dappnode2.ont.io:20336";

/// RPC endpoint for the Polaris TestNet.
pub const TESTNET_RPC: &str = "http://polaris2.ont.io:20336";

/// Default timeout for a registry round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The Ontology network whose DID registry is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn rpc_address(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_RPC,
            Network::Testnet => TESTNET_RPC,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("MAINNET"),
            Network::Testnet => f.write_str("TESTNET"),
        }
    }
}

impl FromStr for Network {
    type Err = ProviderError;

    /// Unrecognized selectors are rejected rather than falling back to TestNet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MAINNET" => Ok(Network::Mainnet),
            "TESTNET" => Ok(Network::Testnet),
            _ => Err(ProviderError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Everything needed to construct an [`OntProvider`](crate::OntProvider)
/// except the wallet password.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub wallet_path: PathBuf,
    pub network: Network,
    /// Overrides the network's default RPC endpoint.
    pub rpc_address: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(wallet_path: impl Into<PathBuf>, network: Network) -> Self {
        Self {
            wallet_path: wallet_path.into(),
            network,
            rpc_address: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_rpc_address(mut self, rpc_address: impl Into<String>) -> Self {
        self.rpc_address = Some(rpc_address.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The endpoint the registry client will talk to.
    pub fn rpc_address(&self) -> &str {
        self.rpc_address
            .as_deref()
            .unwrap_or_else(|| self.network.rpc_address())
    }
}
