//! Broadcast and confirmation polling.

use std::time::Duration;

use stowage_api::{ChainBroadcast, ChainQuery, ClientError, TxOutcome, TxSubmission};
use stowage_primitives::{CancelToken, TxHash};
use stowage_tx::{SignedTx, TxOptions};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::metrics::ChainMetrics;

/// Submits signed envelopes and waits for their inclusion.
#[derive(Debug, Clone)]
pub struct TxBroadcaster<C> {
    chain: C,
    metrics: ChainMetrics,
}

impl<C: ChainQuery + ChainBroadcast> TxBroadcaster<C> {
    pub fn new(chain: C) -> Self {
        Self { chain, metrics: ChainMetrics::default() }
    }

    /// Submit `tx` and, unless `opts` asks not to wait, poll for inclusion.
    ///
    /// A refusal by the node is a [`ClientError::BroadcastRejected`]. Once the
    /// node accepted the transaction this never errors: the poll result is in
    /// [`TxSubmission::outcome`].
    pub async fn broadcast(&self, tx: &SignedTx, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let bytes = tx.to_bytes()?;
        self.metrics.inc_broadcasts();
        let response = self.chain.broadcast(bytes.into(), opts.mode).await?;
        if response.code != 0 {
            self.metrics.inc_rejections();
            return Err(ClientError::BroadcastRejected {
                code: response.code,
                codespace: response.codespace,
                log: response.raw_log,
            });
        }

        let hash = response.hash;
        info!(%hash, mode = ?opts.mode, "transaction accepted");
        if !opts.waits_for_inclusion() {
            return Ok(TxSubmission::submitted(hash));
        }

        let outcome = self.wait_for_inclusion(hash, opts.timeout, opts.poll_interval, opts.cancel.clone()).await;
        Ok(TxSubmission { hash, outcome: Some(outcome) })
    }

    /// Poll until `hash` is included, `timeout` elapses or `cancel` fires.
    ///
    /// Query errors while polling are treated as "still pending". Deadline
    /// expiry and cancellation both yield [`TxOutcome::Unconfirmed`], even
    /// in the middle of a poll interval.
    pub async fn wait_for_inclusion(
        &self,
        hash: TxHash,
        timeout: Duration,
        interval: Duration,
        cancel: Option<CancelToken>,
    ) -> TxOutcome {
        let deadline = Instant::now() + timeout;
        let mut cancel = cancel.unwrap_or_else(CancelToken::never);

        let outcome = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(%hash, "confirmation polling cancelled");
                TxOutcome::Unconfirmed
            }
            _ = tokio::time::sleep_until(deadline) => {
                debug!(%hash, ?timeout, "confirmation deadline reached");
                TxOutcome::Unconfirmed
            }
            outcome = self.poll(hash, interval) => outcome,
        };

        self.metrics.record_outcome(outcome.label());
        match &outcome {
            TxOutcome::Confirmed(inclusion) => info!(%hash, height = inclusion.height, "transaction confirmed"),
            TxOutcome::Failed(inclusion) => info!(
                %hash,
                code = inclusion.code,
                codespace = %inclusion.codespace,
                "transaction failed"
            ),
            TxOutcome::Unconfirmed => info!(%hash, "transaction not confirmed before deadline"),
        }
        outcome
    }

    async fn poll(&self, hash: TxHash, interval: Duration) -> TxOutcome {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.chain.tx_by_hash(hash).await {
                Ok(Some(inclusion)) if inclusion.is_success() => return TxOutcome::Confirmed(inclusion),
                Ok(Some(inclusion)) => return TxOutcome::Failed(inclusion),
                Ok(None) => trace!(%hash, "transaction pending"),
                Err(error) => debug!(%hash, %error, "transaction query failed, retrying"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use alloy_signer_local::PrivateKeySigner;
    use assert_matches::assert_matches;
    use stowage_api::{BroadcastResponse, ChainError};
    use stowage_primitives::{BroadcastMode, cancel_pair};
    use stowage_test_utils::StubChain;
    use stowage_tx::{MessageBuilder, SignerData, TxEnvelope};

    const DEADLINE: Duration = Duration::from_secs(30);
    const INTERVAL: Duration = Duration::from_secs(1);

    fn signed_tx() -> SignedTx {
        let key = PrivateKeySigner::random();
        let msgs = MessageBuilder::new(key.address())
            .transfer(&Address::repeat_byte(2).to_string(), U256::from(1u64))
            .unwrap();
        TxEnvelope::new(msgs, &TxOptions::default())
            .unwrap()
            .sign(&key, &SignerData { chain_id: "test-1".into(), account_number: 0, sequence: 0 })
            .unwrap()
    }

    fn chain() -> StubChain {
        StubChain::new(Address::repeat_byte(0xaa))
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_before_deadline() {
        let chain = chain();
        chain.include_after(Duration::from_secs(29), 0);
        let broadcaster = TxBroadcaster::new(&chain);

        let start = Instant::now();
        let submission = broadcaster.broadcast(&signed_tx(), &TxOptions::default()).await.unwrap();
        assert_matches!(submission.outcome, Some(TxOutcome::Confirmed(_)));
        assert!(start.elapsed() < DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn never_included_is_ambiguous_at_deadline() {
        let chain = chain();
        let broadcaster = TxBroadcaster::new(&chain);

        let start = Instant::now();
        let submission = broadcaster.broadcast(&signed_tx(), &TxOptions::default()).await.unwrap();
        assert_eq!(submission.outcome, Some(TxOutcome::Unconfirmed));
        assert!(start.elapsed() >= DEADLINE);
        assert_matches!(submission.into_result(), Err(ClientError::AmbiguousTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn non_zero_code_is_definite_failure() {
        let chain = chain();
        chain.include_after(Duration::from_secs(2), 5);
        let broadcaster = TxBroadcaster::new(&chain);

        let submission = broadcaster.broadcast(&signed_tx(), &TxOptions::default()).await.unwrap();
        assert_matches!(submission.into_result(), Err(ClientError::DefiniteTxFailure { code: 5, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn query_errors_keep_polling() {
        let chain = chain();
        chain.fail_tx_queries(3, ChainError::Transport("reset".into()));
        chain.include_after(Duration::ZERO, 0);
        let broadcaster = TxBroadcaster::new(&chain);

        let outcome = broadcaster.wait_for_inclusion(TxHash::ZERO, DEADLINE, INTERVAL, None).await;
        assert_matches!(outcome, TxOutcome::Confirmed(_));
        assert_eq!(chain.tx_queries(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_poll_is_ambiguous() {
        let chain = chain();
        let broadcaster = TxBroadcaster::new(&chain);
        let (handle, token) = cancel_pair();

        let start = Instant::now();
        let wait = broadcaster.wait_for_inclusion(TxHash::ZERO, DEADLINE, INTERVAL, Some(token));
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            handle.cancel();
        };
        let (outcome, ()) = tokio::join!(wait, cancel);
        assert_eq!(outcome, TxOutcome::Unconfirmed);
        assert!(start.elapsed() < DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn async_mode_never_polls() {
        let chain = chain();
        let broadcaster = TxBroadcaster::new(&chain);

        let opts = TxOptions { mode: BroadcastMode::Async, ..Default::default() };
        let submission = broadcaster.broadcast(&signed_tx(), &opts).await.unwrap();
        assert_eq!(submission.outcome, None);
        assert_eq!(chain.tx_queries(), 0);
    }

    #[tokio::test]
    async fn rejection_surfaces_code() {
        let chain = chain();
        chain.set_broadcast_response(BroadcastResponse {
            hash: TxHash::ZERO,
            code: 32,
            codespace: "sdk".into(),
            raw_log: "account sequence mismatch".into(),
        });
        let broadcaster = TxBroadcaster::new(&chain);

        let err = broadcaster.broadcast(&signed_tx(), &TxOptions::default()).await.unwrap_err();
        assert_matches!(err, ClientError::BroadcastRejected { code: 32, .. });
        assert_eq!(chain.tx_queries(), 0);
    }
}
