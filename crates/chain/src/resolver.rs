//! Resolution of chain-state dependent message fields.

use stowage_api::{ApprovalProvider, ChainError, ChainQuery, ClientError, StorageProviderInfo};
use stowage_tx::{TxMessage, msg::CreateBucket};
use tracing::{debug, warn};

use crate::metrics::ChainMetrics;

const PLACEMENT_STEP: &str = "bucket placement group";

/// Which direct-query failures trigger the approval fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Every failure, including transport errors.
    #[default]
    Any,
    /// Only "not found" and "stale state" failures.
    NotIndexed,
}

impl FallbackPolicy {
    fn allows(self, err: &ChainError) -> bool {
        match self {
            Self::Any => true,
            Self::NotIndexed => err.is_not_indexed(),
        }
    }
}

/// Resolves the placement group and provider approvals a message needs.
///
/// Nothing is cached between calls; each resolution re-queries the chain.
#[derive(Debug, Clone)]
pub struct PlacementResolver<Q, A> {
    query: Q,
    approvals: A,
    policy: FallbackPolicy,
    metrics: ChainMetrics,
}

impl<Q: ChainQuery, A: ApprovalProvider> PlacementResolver<Q, A> {
    pub fn new(query: Q, approvals: A) -> Self {
        Self { query, approvals, policy: FallbackPolicy::default(), metrics: ChainMetrics::default() }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve every message in place, in order.
    pub async fn resolve_all(&self, messages: &mut [TxMessage]) -> Result<(), ClientError> {
        for msg in messages.iter_mut() {
            self.resolve(msg).await?;
        }
        Ok(())
    }

    /// Resolve one message. Messages without dependencies pass through.
    pub async fn resolve(&self, msg: &mut TxMessage) -> Result<(), ClientError> {
        let sp = match &*msg {
            TxMessage::CreateBucket(bucket) => self.query.storage_provider(bucket.primary_sp_address).await?,
            // objects have no direct-query alternative
            TxMessage::CreateObject(object) => self.primary_sp_of(&object.bucket_name).await?,
            _ => return Ok(()),
        };
        if matches!(msg, TxMessage::CreateBucket(_)) {
            self.resolve_bucket(msg, &sp).await
        } else {
            self.attach_approval(msg, &sp).await
        }
    }

    async fn resolve_bucket(&self, msg: &mut TxMessage, sp: &StorageProviderInfo) -> Result<(), ClientError> {
        let source = match self.query.recommended_family_id(sp.id).await {
            Ok(family_id) if family_id != 0 => {
                debug!(sp = sp.id, family_id, "resolved placement group from chain");
                if let TxMessage::CreateBucket(CreateBucket { primary_sp_approval, .. }) = msg {
                    primary_sp_approval.global_virtual_group_family_id = family_id;
                }
                return Ok(());
            }
            Ok(_) => ChainError::NotFound(format!("no placement group recommended for sp {}", sp.id)),
            Err(err) => err,
        };

        if !self.policy.allows(&source) {
            return Err(ClientError::Resolution { step: PLACEMENT_STEP, source, fallback: None });
        }

        warn!(sp = sp.id, error = %source, "placement query failed, requesting provider approval");
        self.metrics.inc_fallbacks();
        self.attach_approval(msg, sp).await.map_err(|fallback| ClientError::Resolution {
            step: PLACEMENT_STEP,
            source,
            fallback: Some(Box::new(fallback)),
        })?;

        let family_id = msg.approval().map(|a| a.global_virtual_group_family_id).unwrap_or_default();
        debug!(sp = sp.id, family_id, "resolved placement group from approval");
        Ok(())
    }

    async fn attach_approval(&self, msg: &mut TxMessage, sp: &StorageProviderInfo) -> Result<(), ClientError> {
        let token = self.approvals.request_approval(sp, msg).await?;
        token.verify_issuer(sp.approval_address)?;
        token.attach(msg)?;
        msg.check_resolved()?;
        Ok(())
    }

    async fn primary_sp_of(&self, bucket: &str) -> Result<StorageProviderInfo, ClientError> {
        let info = self.query.bucket(bucket).await?;
        self.query
            .storage_providers()
            .await?
            .into_iter()
            .find(|sp| sp.id == info.primary_sp_id)
            .ok_or_else(|| {
                ClientError::Chain(ChainError::NotFound(format!(
                    "primary storage provider {} of bucket {bucket}",
                    info.primary_sp_id
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use assert_matches::assert_matches;
    use stowage_test_utils::{StubApprovals, StubChain};
    use stowage_tx::{CreateBucketOptions, MessageBuilder};

    fn bucket_msg(chain: &StubChain) -> TxMessage {
        let sp = chain.provider().operator_address.to_string();
        let mut msgs = MessageBuilder::new(Address::repeat_byte(1))
            .create_bucket("photos", &sp, &CreateBucketOptions::default())
            .unwrap();
        msgs.remove(0)
    }

    #[tokio::test]
    async fn direct_query_wins_when_available() {
        let approvals = StubApprovals::new(9);
        let chain = StubChain::new(approvals.address());
        chain.set_recommended_family(Ok(3));
        let resolver = PlacementResolver::new(&chain, &approvals);

        let mut msg = bucket_msg(&chain);
        resolver.resolve(&mut msg).await.unwrap();
        assert_eq!(msg.approval().unwrap().global_virtual_group_family_id, 3);
        assert_eq!(approvals.calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_approval() {
        let approvals = StubApprovals::new(7);
        let chain = StubChain::new(approvals.address());
        chain.set_recommended_family(Err(ChainError::Transport("connection reset".into())));
        let resolver = PlacementResolver::new(&chain, &approvals);

        let mut msg = bucket_msg(&chain);
        resolver.resolve(&mut msg).await.unwrap();
        assert_eq!(msg.approval().unwrap().global_virtual_group_family_id, 7);
        assert_eq!(approvals.calls(), 1);
    }

    #[tokio::test]
    async fn both_failing_is_a_resolution_failure() {
        let approvals = StubApprovals::failing();
        let chain = StubChain::new(approvals.address());
        chain.set_recommended_family(Err(ChainError::NotFound("family".into())));
        let resolver = PlacementResolver::new(&chain, &approvals);

        let mut msg = bucket_msg(&chain);
        let err = resolver.resolve(&mut msg).await.unwrap_err();
        assert_matches!(
            err,
            ClientError::Resolution { step: PLACEMENT_STEP, source: ChainError::NotFound(_), fallback: Some(_) }
        );
    }

    #[tokio::test]
    async fn narrow_policy_skips_fallback_on_transport_errors() {
        let approvals = StubApprovals::new(7);
        let chain = StubChain::new(approvals.address());
        chain.set_recommended_family(Err(ChainError::Transport("timeout".into())));
        let resolver = PlacementResolver::new(&chain, &approvals).with_policy(FallbackPolicy::NotIndexed);

        let mut msg = bucket_msg(&chain);
        let err = resolver.resolve(&mut msg).await.unwrap_err();
        assert_matches!(err, ClientError::Resolution { fallback: None, .. });
        assert_eq!(approvals.calls(), 0);
    }

    #[tokio::test]
    async fn approval_from_the_wrong_key_is_refused() {
        let approvals = StubApprovals::new(7);
        let chain = StubChain::new(Address::repeat_byte(0xee));
        chain.set_recommended_family(Err(ChainError::NotFound("family".into())));
        let resolver = PlacementResolver::new(&chain, &approvals);

        let mut msg = bucket_msg(&chain);
        assert_matches!(resolver.resolve(&mut msg).await, Err(ClientError::Resolution { fallback: Some(_), .. }));
    }
}
