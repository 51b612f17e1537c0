use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use stowage_api::{ApprovalProvider, ClientError, StorageProviderInfo};
use stowage_tx::{ApprovalToken, TxMessage};

const EXPIRED_HEIGHT: u64 = 1_000;

/// Signs approvals with a freshly generated key, embedding a fixed family id.
#[derive(Debug)]
pub struct StubApprovals {
    key: PrivateKeySigner,
    family_id: u32,
    fail: bool,
    calls: AtomicUsize,
}

impl StubApprovals {
    pub fn new(family_id: u32) -> Self {
        Self { key: PrivateKeySigner::random(), family_id, fail: false, calls: AtomicUsize::new(0) }
    }

    /// Every request fails with a transport error.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::new(0) }
    }

    /// Address to register as the provider's approval address.
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApprovalProvider for StubApprovals {
    async fn request_approval(
        &self,
        _sp: &StorageProviderInfo,
        msg: &TxMessage,
    ) -> Result<ApprovalToken, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClientError::Transport("approval endpoint unavailable".into()));
        }
        Ok(ApprovalToken::issue(&self.key, msg, EXPIRED_HEIGHT, self.family_id)?)
    }
}
