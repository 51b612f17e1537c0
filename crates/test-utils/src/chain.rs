use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use stowage_api::{
    BaseAccount, BroadcastResponse, BucketInfo, ChainBroadcast, ChainError, ChainQuery, Proposal,
    ProviderStatus, StorageProviderInfo, TxEvent, TxInclusion,
};
use stowage_primitives::{BroadcastMode, TxHash, Visibility};
use stowage_tx::SignedTx;
use tokio::time::Instant;

/// Chain id the stub expects transactions to be signed for.
pub const STUB_CHAIN_ID: &str = "stowage_9000-1";

/// Account number the stub reports for every address.
const ACCOUNT_NUMBER: u64 = 1;

#[derive(Debug)]
struct State {
    provider: StorageProviderInfo,
    others: Vec<StorageProviderInfo>,
    bucket_primary: u32,
    family: Result<u32, ChainError>,
    include_at: Option<(Instant, u32)>,
    events: Vec<TxEvent>,
    tx_failures: VecDeque<ChainError>,
    broadcast_response: Option<BroadcastResponse>,
    broadcasts: Vec<(Bytes, BroadcastMode)>,
    sequence: u64,
}

/// Scripted chain node.
///
/// By default transactions are accepted but never included, the placement
/// query fails with "not found", and one in-service provider exists and is
/// the primary of every bucket.
#[derive(Debug)]
pub struct StubChain {
    state: Mutex<State>,
    calls: AtomicUsize,
    tx_queries: AtomicUsize,
}

impl StubChain {
    /// A chain with one provider whose approval key is `approval_address`.
    pub fn new(approval_address: Address) -> Self {
        let provider = StorageProviderInfo {
            id: 1,
            operator_address: Address::repeat_byte(0x51),
            funding_address: Address::repeat_byte(0x52),
            approval_address,
            endpoint: "http://127.0.0.1:9033".into(),
            status: ProviderStatus::StatusInService,
        };
        Self {
            state: Mutex::new(State {
                bucket_primary: provider.id,
                provider,
                others: Vec::new(),
                family: Err(ChainError::NotFound("no family indexed".into())),
                include_at: None,
                events: Vec::new(),
                tx_failures: VecDeque::new(),
                broadcast_response: None,
                broadcasts: Vec::new(),
                sequence: 0,
            }),
            calls: AtomicUsize::new(0),
            tx_queries: AtomicUsize::new(0),
        }
    }

    /// The provider the stub starts with. It is listed first.
    pub fn provider(&self) -> StorageProviderInfo {
        self.state.lock().provider.clone()
    }

    /// List another provider after the existing ones.
    pub fn add_provider(&self, provider: StorageProviderInfo) {
        self.state.lock().others.push(provider);
    }

    /// Primary provider id reported for every bucket.
    pub fn set_bucket_primary(&self, sp_id: u32) {
        self.state.lock().bucket_primary = sp_id;
    }

    pub fn set_recommended_family(&self, family: Result<u32, ChainError>) {
        self.state.lock().family = family;
    }

    /// Report any queried transaction as included once `after` has elapsed.
    pub fn include_after(&self, after: Duration, code: u32) {
        self.state.lock().include_at = Some((Instant::now() + after, code));
    }

    /// Events attached to included transactions.
    pub fn set_events(&self, events: Vec<TxEvent>) {
        self.state.lock().events = events;
    }

    /// Fail the next `n` transaction queries with `err`.
    pub fn fail_tx_queries(&self, n: usize, err: ChainError) {
        self.state.lock().tx_failures.extend(std::iter::repeat_n(err, n));
    }

    pub fn set_broadcast_response(&self, response: BroadcastResponse) {
        self.state.lock().broadcast_response = Some(response);
    }

    /// Calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tx_queries(&self) -> usize {
        self.tx_queries.load(Ordering::SeqCst)
    }

    /// Every transaction broadcast so far, decoded.
    pub fn broadcasts(&self) -> Vec<SignedTx> {
        self.state.lock().broadcasts.iter().filter_map(|(bytes, _)| SignedTx::from_bytes(bytes).ok()).collect()
    }

    pub fn broadcast_modes(&self) -> Vec<BroadcastMode> {
        self.state.lock().broadcasts.iter().map(|(_, mode)| *mode).collect()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainQuery for StubChain {
    async fn account(&self, address: Address) -> Result<BaseAccount, ChainError> {
        self.record();
        let sequence = self.state.lock().sequence;
        Ok(BaseAccount { address, account_number: ACCOUNT_NUMBER, sequence })
    }

    async fn storage_provider(&self, operator: Address) -> Result<StorageProviderInfo, ChainError> {
        self.record();
        let state = self.state.lock();
        std::iter::once(&state.provider)
            .chain(&state.others)
            .find(|sp| sp.operator_address == operator)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("storage provider {operator}")))
    }

    async fn storage_providers(&self) -> Result<Vec<StorageProviderInfo>, ChainError> {
        self.record();
        let state = self.state.lock();
        Ok(std::iter::once(&state.provider).chain(&state.others).cloned().collect())
    }

    async fn recommended_family_id(&self, _sp_id: u32) -> Result<u32, ChainError> {
        self.record();
        self.state.lock().family.clone()
    }

    async fn bucket(&self, name: &str) -> Result<BucketInfo, ChainError> {
        self.record();
        let primary_sp_id = self.state.lock().bucket_primary;
        Ok(BucketInfo {
            id: U256::from(1u64),
            bucket_name: name.to_string(),
            owner: Address::ZERO,
            visibility: Visibility::Private,
            payment_address: Address::ZERO,
            primary_sp_id,
            global_virtual_group_family_id: 1,
        })
    }

    async fn proposal(&self, id: u64) -> Result<Proposal, ChainError> {
        self.record();
        Err(ChainError::NotFound(format!("proposal {id}")))
    }

    async fn tx_by_hash(&self, hash: TxHash) -> Result<Option<TxInclusion>, ChainError> {
        self.record();
        self.tx_queries.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(err) = state.tx_failures.pop_front() {
            return Err(err);
        }
        match state.include_at {
            Some((at, code)) if Instant::now() >= at => Ok(Some(TxInclusion {
                hash,
                height: 100,
                code,
                codespace: if code == 0 { String::new() } else { "stub".into() },
                raw_log: String::new(),
                events: state.events.clone(),
            })),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ChainBroadcast for StubChain {
    async fn broadcast(&self, tx: Bytes, mode: BroadcastMode) -> Result<BroadcastResponse, ChainError> {
        self.record();
        let mut state = self.state.lock();
        let hash = B256::from_slice(&Sha256::digest(&tx));
        state.broadcasts.push((tx, mode));
        if let Some(response) = state.broadcast_response.clone() {
            return Ok(response);
        }
        state.sequence += 1;
        Ok(BroadcastResponse { hash, code: 0, codespace: String::new(), raw_log: String::new() })
    }
}
