//! Figment-based configuration loading.
//!
//! Priority (highest wins):
//! 1. CLI arguments
//! 2. Config file (TOML, `--config`)
//! 3. Environment variables (`STOWAGE_` prefix, `__` between sections,
//!    e.g. `STOWAGE_CHAIN__REST`)
//! 4. Defaults

use std::path::Path;

use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use stowage_client::{AuthArgs, ChainArgs, ClientConfig, SpArgs, TxArgs};

/// Every configurable section, as read from any source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StowageConfig {
    pub(crate) chain: ChainArgs,
    pub(crate) tx: TxArgs,
    pub(crate) auth: AuthArgs,
    pub(crate) sp: SpArgs,
}

impl StowageConfig {
    /// Layer defaults, environment, `config_path` and `cli`.
    pub(crate) fn load(config_path: Option<&Path>, cli: &StowageConfig) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(StowageConfig::default()))
            .merge(Env::prefixed("STOWAGE_").split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                eyre::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Serialized::globals(cli)).extract().wrap_err("Failed to load configuration")
    }

    pub(crate) fn client_config(&self) -> Result<ClientConfig> {
        ClientConfig::from_args(&self.chain, &self.tx, &self.auth, &self.sp).wrap_err("Invalid configuration")
    }
}
