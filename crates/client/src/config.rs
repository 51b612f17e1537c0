use std::time::Duration;

use alloy_primitives::U256;
use alloy_signer_local::PrivateKeySigner;
use stowage_api::ClientError;
use stowage_auth::SigningStrategy;
use stowage_chain::FallbackPolicy;
use stowage_primitives::parse_optional_address;
use stowage_sp::EndpointSelection;
use stowage_tx::TxOptions;
use url::Url;

use crate::args::{AuthArgs, ChainArgs, DEFAULT_CHAIN_ID, DEFAULT_REQUEST_TIMEOUT, SpArgs, TxArgs};

/// Everything a [`Client`](crate::Client) needs, fixed at construction.
///
/// The account key lives here rather than in any process-wide default.
/// Use [`Client::with_account`](crate::Client::with_account) to act as
/// another account.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub chain_id: String,
    pub chain_rest: Url,
    pub chain_timeout: Duration,
    /// Template for per-call transaction options.
    pub tx: TxOptions,
    pub sp: EndpointSelection,
    pub sp_timeout: Duration,
    /// Signs transactions, and provider requests unless `off_chain` is set.
    pub account: Option<PrivateKeySigner>,
    /// Registered off-chain key for provider requests.
    pub off_chain: Option<SigningStrategy>,
    pub fallback: FallbackPolicy,
}

impl ClientConfig {
    /// Config for `chain_rest` with defaults everywhere else.
    pub fn new(chain_rest: Url) -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            chain_rest,
            chain_timeout: DEFAULT_REQUEST_TIMEOUT,
            tx: TxOptions::default(),
            sp: EndpointSelection::default(),
            sp_timeout: DEFAULT_REQUEST_TIMEOUT,
            account: None,
            off_chain: None,
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn from_args(chain: &ChainArgs, tx: &TxArgs, auth: &AuthArgs, sp: &SpArgs) -> Result<Self, ClientError> {
        let chain_rest = Url::parse(chain.rest())
            .map_err(|e| ClientError::InvalidArgument(format!("chain.rest {}: {e}", chain.rest())))?;

        let account = auth
            .private_key
            .as_deref()
            .map(|key| {
                key.trim_start_matches("0x")
                    .parse::<PrivateKeySigner>()
                    .map_err(|e| ClientError::Authentication(format!("auth.private-key: {e}")))
            })
            .transpose()?;

        let off_chain = match (&auth.offchain_seed, &auth.domain) {
            (None, _) => None,
            (Some(seed), Some(domain)) => {
                let user = account
                    .as_ref()
                    .map(|a| a.address())
                    .ok_or_else(|| ClientError::Authentication("off-chain auth needs the account key".into()))?;
                Some(SigningStrategy::off_chain_from_seed_hex(seed, domain, user)?)
            }
            (Some(_), None) => {
                return Err(ClientError::InvalidArgument("auth.offchain-seed requires auth.domain".into()));
            }
        };

        let tx_defaults = TxOptions {
            is_async: tx.is_async,
            timeout: tx.timeout(),
            poll_interval: tx.poll_interval(),
            gas_limit: tx.gas_limit(),
            gas_price: U256::from(tx.gas_price()),
            ..TxOptions::default()
        };

        Ok(Self {
            chain_id: chain.id().to_string(),
            chain_rest,
            chain_timeout: chain.timeout(),
            tx: tx_defaults,
            sp: EndpointSelection {
                endpoint: sp.endpoint.clone(),
                sp_address: parse_optional_address("sp.address", sp.address.as_deref())?,
            },
            sp_timeout: sp.timeout(),
            account,
            off_chain,
            fallback: FallbackPolicy::default(),
        })
    }

    /// Strategy for provider requests: the off-chain key if configured,
    /// else the account key.
    pub fn signing_strategy(&self) -> Option<SigningStrategy> {
        self.off_chain.clone().or_else(|| self.account.clone().map(SigningStrategy::AccountKey))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn from_args_applies_defaults() {
        let config =
            ClientConfig::from_args(&ChainArgs::default(), &TxArgs::default(), &AuthArgs::default(), &SpArgs::default())
                .unwrap();
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert!(config.account.is_none());
        assert!(config.signing_strategy().is_none());
        assert!(!config.tx.is_async);
    }

    #[test]
    fn off_chain_key_wins_for_provider_requests() {
        let auth = AuthArgs {
            private_key: Some(KEY.into()),
            offchain_seed: Some("22".repeat(32)),
            domain: Some("https://app.example".into()),
        };
        let config =
            ClientConfig::from_args(&ChainArgs::default(), &TxArgs::default(), &auth, &SpArgs::default()).unwrap();
        let account = config.account.as_ref().unwrap().address();
        assert_matches!(
            config.signing_strategy(),
            Some(SigningStrategy::OffChainKey { user_address, .. }) if user_address == account
        );
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let bad_key = AuthArgs { private_key: Some("nope".into()), ..Default::default() };
        assert_matches!(
            ClientConfig::from_args(&ChainArgs::default(), &TxArgs::default(), &bad_key, &SpArgs::default()),
            Err(ClientError::Authentication(_))
        );

        let bad_sp = SpArgs { address: Some("0x12".into()), ..Default::default() };
        assert_matches!(
            ClientConfig::from_args(&ChainArgs::default(), &TxArgs::default(), &AuthArgs::default(), &bad_sp),
            Err(ClientError::InvalidArgument(_))
        );
    }
}
