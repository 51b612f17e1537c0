//! Chain-state views returned by [`ChainQuery`](crate::ChainQuery).

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use stowage_primitives::{TxHash, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    StatusInService,
    StatusInJailed,
    StatusGracefulExiting,
    StatusInMaintenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProviderInfo {
    pub id: u32,
    pub operator_address: Address,
    pub funding_address: Address,
    pub approval_address: Address,
    pub endpoint: String,
    pub status: ProviderStatus,
}

impl StorageProviderInfo {
    pub fn is_in_service(&self) -> bool {
        self.status == ProviderStatus::StatusInService
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub id: U256,
    pub bucket_name: String,
    pub owner: Address,
    pub visibility: Visibility,
    pub payment_address: Address,
    pub primary_sp_id: u32,
    pub global_virtual_group_family_id: u32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    ProposalStatusDepositPeriod,
    ProposalStatusVotingPeriod,
    ProposalStatusPassed,
    ProposalStatusRejected,
    ProposalStatusFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub status: ProposalStatus,
    pub title: String,
    pub proposer: Address,
}

/// A typed event emitted by an included transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl TxEvent {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// A transaction as seen once included in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInclusion {
    pub hash: TxHash,
    pub height: u64,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
    pub events: Vec<TxEvent>,
}

impl TxInclusion {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// First value of `key` on an event of type `kind`.
    pub fn event_attribute(&self, kind: &str, key: &str) -> Option<&str> {
        self.events.iter().filter(|e| e.kind == kind).find_map(|e| e.attribute(key))
    }
}

/// Immediate answer to a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub hash: TxHash,
    /// Non-zero when the node refused the transaction.
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_attribute_lookup() {
        let inclusion = TxInclusion {
            hash: TxHash::ZERO,
            height: 10,
            code: 0,
            codespace: String::new(),
            raw_log: String::new(),
            events: vec![
                TxEvent { kind: "transfer".into(), attributes: vec![("amount".into(), "5".into())] },
                TxEvent {
                    kind: "submit_proposal".into(),
                    attributes: vec![("proposal_id".into(), "42".into())],
                },
            ],
        };
        assert_eq!(inclusion.event_attribute("submit_proposal", "proposal_id"), Some("42"));
        assert_eq!(inclusion.event_attribute("transfer", "proposal_id"), None);
    }

    #[test]
    fn provider_status_parses() {
        assert_eq!(
            "STATUS_IN_SERVICE".parse::<ProviderStatus>().unwrap(),
            ProviderStatus::StatusInService
        );
    }
}
