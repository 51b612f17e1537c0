//! Storage-provider lifecycle messages.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::validate;
use crate::TxError;

/// Module account that executes passed proposals.
pub fn gov_module_address() -> Address {
    let digest = Sha256::digest(b"gov");
    let mut out = [0u8; 20];
    for (dst, src) in out.iter_mut().zip(digest.iter()) {
        *dst = *src;
    }
    Address::from(out)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

/// Registers a storage provider. Only valid inside a governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStorageProvider {
    /// Always the governance module account.
    pub creator: Address,
    pub description: Description,
    pub sp_address: Address,
    pub funding_address: Address,
    pub seal_address: Address,
    pub approval_address: Address,
    pub gc_address: Address,
    pub maintenance_address: Address,
    pub endpoint: String,
    pub deposit: U256,
    pub read_price: U256,
    pub free_read_quota: u64,
    pub store_price: U256,
    pub bls_key: Bytes,
    pub bls_proof: Bytes,
}

impl CreateStorageProvider {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::non_empty("description.moniker", &self.description.moniker)?;
        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| TxError::field("endpoint", e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TxError::field("endpoint", "scheme must be http or https"));
        }
        let roles = [
            self.sp_address,
            self.funding_address,
            self.seal_address,
            self.approval_address,
            self.gc_address,
            self.maintenance_address,
        ];
        let distinct: HashSet<_> = roles.iter().collect();
        if distinct.len() != roles.len() {
            return Err(TxError::field("addresses", "role addresses must be distinct"));
        }
        validate::positive_amount("deposit", &self.deposit)
    }
}

/// Spending limit the funding account grants the governance module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAuthorization {
    pub max_tokens: U256,
    /// Storage providers the deposit may be made for.
    pub allow_list: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDeposit {
    pub granter: Address,
    pub grantee: Address,
    pub authorization: DepositAuthorization,
    pub expiration: Option<i64>,
}

impl GrantDeposit {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::positive_amount("authorization.max_tokens", &self.authorization.max_tokens)?;
        if self.authorization.allow_list.is_empty() {
            return Err(TxError::field("authorization.allow_list", "must name at least one provider"));
        }
        if self.granter == self.grantee {
            return Err(TxError::field("grantee", "cannot grant to self"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum SpStatus {
    InService,
    InMaintenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpStatus {
    pub sp_address: Address,
    pub status: SpStatus,
    /// Maintenance window in seconds.
    pub duration: Option<i64>,
}

impl UpdateSpStatus {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        match (self.status, self.duration) {
            (SpStatus::InMaintenance, Some(d)) if d > 0 => Ok(()),
            (SpStatus::InMaintenance, _) => {
                Err(TxError::field("duration", "maintenance needs a positive duration"))
            }
            (SpStatus::InService, None) => Ok(()),
            (SpStatus::InService, Some(_)) => {
                Err(TxError::field("duration", "only valid for maintenance"))
            }
        }
    }
}
