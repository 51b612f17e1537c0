use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use auto_impl::auto_impl;
use stowage_primitives::{BroadcastMode, TxHash};
use stowage_tx::{ApprovalToken, TxMessage};

use crate::{
    BaseAccount, BroadcastResponse, BucketInfo, ChainError, ClientError, Proposal,
    StorageProviderInfo, TxInclusion,
};

/// Read access to chain state.
///
/// Implementations must not cache: every call reflects the node's current view.
#[async_trait]
#[auto_impl(&, Arc, Box)]
pub trait ChainQuery: Send + Sync {
    /// Account number and current sequence.
    async fn account(&self, address: Address) -> Result<BaseAccount, ChainError>;

    /// A storage provider by operator address.
    async fn storage_provider(&self, operator: Address) -> Result<StorageProviderInfo, ChainError>;

    async fn storage_providers(&self) -> Result<Vec<StorageProviderInfo>, ChainError>;

    /// Placement group the chain currently recommends for a new bucket on `sp_id`.
    async fn recommended_family_id(&self, sp_id: u32) -> Result<u32, ChainError>;

    async fn bucket(&self, name: &str) -> Result<BucketInfo, ChainError>;

    async fn proposal(&self, id: u64) -> Result<Proposal, ChainError>;

    /// `None` while the transaction is not yet included.
    async fn tx_by_hash(&self, hash: TxHash) -> Result<Option<TxInclusion>, ChainError>;
}

/// Submission of signed transactions.
#[async_trait]
#[auto_impl(&, Arc, Box)]
pub trait ChainBroadcast: Send + Sync {
    async fn broadcast(&self, tx: Bytes, mode: BroadcastMode) -> Result<BroadcastResponse, ChainError>;
}

/// Source of storage-provider approvals.
#[async_trait]
#[auto_impl(&, Arc, Box)]
pub trait ApprovalProvider: Send + Sync {
    /// Ask `sp` to approve `msg`. The token is bound to `msg` as given.
    async fn request_approval(
        &self,
        sp: &StorageProviderInfo,
        msg: &TxMessage,
    ) -> Result<ApprovalToken, ClientError>;
}
