//! End-to-end transaction lifecycle against stub collaborators.

use std::{sync::Arc, time::Duration};

use alloy_signer_local::PrivateKeySigner;
use assert_matches::assert_matches;
use stowage_api::{ChainError, TxEvent};
use stowage_auth::RequestSigner;
use stowage_client::{
    BroadcastMode, Client, ClientConfig, ClientError, CreateBucketOptions, TxOptions, TxOutcome,
};
use stowage_primitives::U256;
use stowage_sp::SpClient;
use stowage_test_utils::{STUB_CHAIN_ID, StubApprovals, StubChain};
use stowage_tx::TxMessage;
use url::Url;

struct Harness {
    client: Client<Arc<StubChain>, Arc<StubApprovals>>,
    chain: Arc<StubChain>,
    approvals: Arc<StubApprovals>,
    key: PrivateKeySigner,
}

fn harness(approvals: StubApprovals) -> Harness {
    let key = PrivateKeySigner::random();
    let approvals = Arc::new(approvals);
    let chain = Arc::new(StubChain::new(approvals.address()));

    let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:1317").unwrap());
    config.chain_id = STUB_CHAIN_ID.to_string();
    config.account = Some(key.clone());
    let sp = SpClient::new(RequestSigner::new(None), Duration::from_secs(1)).unwrap();

    let client = Client::from_parts(config, Arc::clone(&chain), Arc::clone(&approvals), sp);
    Harness { client, chain, approvals, key }
}

fn quick_tx() -> TxOptions {
    TxOptions { timeout: Duration::from_secs(5), poll_interval: Duration::from_millis(100), ..Default::default() }
}

fn sp_operator(h: &Harness) -> String {
    h.chain.provider().operator_address.to_string()
}

#[tokio::test]
async fn malformed_address_fails_before_any_call() {
    let h = harness(StubApprovals::new(7));

    let err = h.client.create_bucket("photos", "not-an-address", &CreateBucketOptions::default()).await.unwrap_err();
    assert_matches!(err, ClientError::InvalidArgument(_));

    let err = h.client.transfer("0x1234", U256::from(5u64), &quick_tx()).await.unwrap_err();
    assert_matches!(err, ClientError::InvalidArgument(_));

    assert_eq!(h.chain.calls(), 0);
    assert_eq!(h.approvals.calls(), 0);
}

#[tokio::test]
async fn missing_account_key_is_an_authentication_error() {
    let h = harness(StubApprovals::new(7));
    let mut config = h.client.config().clone();
    config.account = None;
    let sp = SpClient::new(RequestSigner::new(None), Duration::from_secs(1)).unwrap();
    let keyless = Client::from_parts(config, Arc::clone(&h.chain), Arc::clone(&h.approvals), sp);

    let err = keyless.create_payment_account(&quick_tx()).await.unwrap_err();
    assert_matches!(err, ClientError::Authentication(_));
    assert_eq!(h.chain.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn approval_fallback_family_reaches_the_broadcast() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::from_millis(300), 0);

    let opts = CreateBucketOptions { tx: quick_tx(), ..Default::default() };
    let submission = h.client.create_bucket("photos", &sp_operator(&h), &opts).await.unwrap();
    assert_matches!(submission.outcome, Some(TxOutcome::Confirmed(_)));
    assert_eq!(h.approvals.calls(), 1);

    let broadcasts = h.chain.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_matches!(
        &broadcasts[0].body.messages[0],
        TxMessage::CreateBucket(msg) if msg.primary_sp_approval.global_virtual_group_family_id == 7
    );
}

#[tokio::test(start_paused = true)]
async fn direct_query_result_skips_the_approval_for_family() {
    let h = harness(StubApprovals::new(7));
    h.chain.set_recommended_family(Ok(3));
    h.chain.include_after(Duration::ZERO, 0);

    let opts = CreateBucketOptions { tx: quick_tx(), ..Default::default() };
    h.client.create_bucket("photos", &sp_operator(&h), &opts).await.unwrap();

    let broadcasts = h.chain.broadcasts();
    assert_matches!(
        &broadcasts[0].body.messages[0],
        TxMessage::CreateBucket(msg) if msg.primary_sp_approval.global_virtual_group_family_id == 3
    );
}

#[tokio::test]
async fn both_resolution_paths_failing_is_reported() {
    let h = harness(StubApprovals::failing());
    h.chain.set_recommended_family(Err(ChainError::Transport("connection reset".into())));

    let err = h.client.create_bucket("photos", &sp_operator(&h), &CreateBucketOptions::default()).await.unwrap_err();
    assert_matches!(err, ClientError::Resolution { source: ChainError::Transport(_), fallback: Some(_), .. });
    assert!(h.chain.broadcasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn async_mode_returns_only_a_hash() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::ZERO, 0);

    let opts = TxOptions { is_async: true, ..quick_tx() };
    let submission = h.client.transfer(&PrivateKeySigner::random().address().to_string(), U256::from(1u64), &opts)
        .await
        .unwrap();

    assert!(submission.outcome.is_none());
    assert_eq!(h.chain.tx_queries(), 0);
    assert_eq!(h.chain.broadcast_modes(), vec![BroadcastMode::Sync]);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_at_deadline_is_ambiguous() {
    let h = harness(StubApprovals::new(7));

    let submission = h.client.create_payment_account(&quick_tx()).await.unwrap();
    assert_eq!(submission.outcome, Some(TxOutcome::Unconfirmed));

    let hash = submission.hash;
    let err = submission.into_result().unwrap_err();
    assert!(err.should_poll_again());
    assert_matches!(err, ClientError::AmbiguousTimeout { hash: h2 } if h2 == hash);
}

#[tokio::test(start_paused = true)]
async fn non_zero_code_is_a_definite_failure() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::ZERO, 5);

    let err = h.client.create_payment_account(&quick_tx()).await.unwrap().into_result().unwrap_err();
    assert_matches!(err, ClientError::DefiniteTxFailure { code: 5, .. });
}

#[tokio::test(start_paused = true)]
async fn sequence_is_read_fresh_for_each_envelope() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::ZERO, 0);

    h.client.create_payment_account(&quick_tx()).await.unwrap();
    h.client.create_payment_account(&quick_tx()).await.unwrap();

    let sequences: Vec<u64> = h.chain.broadcasts().iter().map(|tx| tx.auth_info.sequence).collect();
    assert_eq!(sequences, vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn with_account_signs_as_the_new_key() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::ZERO, 0);
    let other = PrivateKeySigner::random();

    h.client.with_account(other.clone()).create_payment_account(&quick_tx()).await.unwrap();
    h.client.create_payment_account(&quick_tx()).await.unwrap();

    let signers: Vec<_> =
        h.chain.broadcasts().iter().map(|tx| tx.recover_signer(STUB_CHAIN_ID, 1).unwrap()).collect();
    assert_eq!(signers, vec![other.address(), h.key.address()]);
}

#[tokio::test(start_paused = true)]
async fn proposal_id_is_extracted_from_events() {
    let h = harness(StubApprovals::new(7));
    h.chain.include_after(Duration::ZERO, 0);
    h.chain.set_events(vec![TxEvent {
        kind: "submit_proposal".into(),
        attributes: vec![("proposal_id".into(), "12".into())],
    }]);

    let proposer = h.client.address().unwrap();
    let inner = stowage_tx::MessageBuilder::new(proposer).create_payment_account().unwrap();
    let (_, id) = h.client.submit_proposal(inner, U256::from(1u64), "title", "summary", &quick_tx()).await.unwrap();
    assert_eq!(id, 12);
}
