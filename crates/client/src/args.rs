//! Command-line and config-file arguments.
//!
//! Every field is optional so that layered sources (environment, config
//! file, flags) only override what they actually set. Accessors apply the
//! defaults.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use stowage_primitives::constants::{
    DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_POLL_INTERVAL, DEFAULT_TX_TIMEOUT,
};

/// Default REST gateway of a local chain node.
pub const DEFAULT_CHAIN_REST: &str = "http://localhost:1317";

/// Default chain id.
pub const DEFAULT_CHAIN_ID: &str = "stowage_9000-1";

/// Default timeout of a single chain or provider request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain node connection.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Chain")]
#[serde(default)]
pub struct ChainArgs {
    /// REST gateway of the chain node.
    #[arg(id = "chain.rest", long = "chain.rest", value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<String>,

    /// Chain id transactions are signed for.
    #[arg(id = "chain.id", long = "chain.id", value_name = "ID")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Timeout of a single chain request, in seconds.
    #[arg(id = "chain.timeout", long = "chain.timeout", value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ChainArgs {
    pub fn rest(&self) -> &str {
        self.rest.as_deref().unwrap_or(DEFAULT_CHAIN_REST)
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_CHAIN_ID)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Broadcast and confirmation defaults.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Transactions")]
#[serde(default)]
pub struct TxArgs {
    /// Confirmation deadline, in seconds.
    #[arg(id = "tx.timeout", long = "tx.timeout", value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Interval between inclusion queries, in milliseconds.
    #[arg(id = "tx.poll-interval", long = "tx.poll-interval", value_name = "MILLIS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,

    #[arg(id = "tx.gas-limit", long = "tx.gas-limit", value_name = "GAS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,

    /// Gas price in the base denomination.
    #[arg(id = "tx.gas-price", long = "tx.gas-price", value_name = "PRICE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,

    /// Return right after submission without waiting for inclusion.
    #[arg(id = "tx.async", long = "tx.async")]
    #[serde(rename = "async", skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
}

impl TxArgs {
    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_TX_TIMEOUT)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.map(Duration::from_millis).unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT)
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price.unwrap_or(DEFAULT_GAS_PRICE)
    }
}

/// Signing identity.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Authentication")]
#[serde(default)]
pub struct AuthArgs {
    /// Hex secp256k1 key of the chain account.
    #[arg(
        id = "auth.private-key",
        long = "auth.private-key",
        env = "STOWAGE_PRIVATE_KEY",
        value_name = "HEX",
        hide_env_values = true
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Hex ed25519 seed registered with providers for off-chain auth.
    #[arg(
        id = "auth.offchain-seed",
        long = "auth.offchain-seed",
        value_name = "HEX",
        requires = "auth.domain"
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offchain_seed: Option<String>,

    /// App domain the off-chain key was registered for.
    #[arg(id = "auth.domain", long = "auth.domain", value_name = "DOMAIN")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Storage-provider selection.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Storage provider")]
#[serde(default)]
pub struct SpArgs {
    /// Talk to this provider instead of looking one up on chain.
    #[arg(id = "sp.endpoint", long = "sp.endpoint", value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Operator address of the provider to use.
    #[arg(id = "sp.address", long = "sp.address", value_name = "ADDRESS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Timeout of a single provider request, in seconds.
    #[arg(id = "sp.timeout", long = "sp.timeout", value_name = "SECS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl SpArgs {
    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        chain: ChainArgs,
        #[command(flatten)]
        tx: TxArgs,
        #[command(flatten)]
        sp: SpArgs,
    }

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn timeouts_are_independent() {
        let cli = Cli::parse_from(["stowage", "--chain.timeout", "7", "--tx.timeout", "90", "--sp.timeout", "12"]);
        assert_eq!(cli.chain.timeout(), Duration::from_secs(7));
        assert_eq!(cli.tx.timeout(), Duration::from_secs(90));
        assert_eq!(cli.sp.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cli = Cli::parse_from(["stowage"]);
        assert_eq!(cli.chain.rest(), DEFAULT_CHAIN_REST);
        assert_eq!(cli.tx.timeout(), DEFAULT_TX_TIMEOUT);
        assert_eq!(cli.tx.gas_limit(), DEFAULT_GAS_LIMIT);
        assert!(!cli.tx.is_async);
    }

    #[test]
    fn dotted_flags_parse() {
        let cli = Cli::parse_from([
            "stowage",
            "--chain.id",
            "test_1-1",
            "--tx.timeout",
            "5",
            "--tx.poll-interval",
            "250",
            "--tx.async",
            "--sp.endpoint",
            "https://sp.example",
        ]);
        assert_eq!(cli.chain.id(), "test_1-1");
        assert_eq!(cli.tx.timeout(), Duration::from_secs(5));
        assert_eq!(cli.tx.poll_interval(), Duration::from_millis(250));
        assert!(cli.tx.is_async);
        assert_eq!(cli.sp.endpoint.as_deref(), Some("https://sp.example"));
    }
}
