//! Chain queries and broadcasts over the node's REST gateway.

use std::{str::FromStr, time::Duration};

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use stowage_api::{
    BaseAccount, BroadcastResponse, BucketInfo, ChainBroadcast, ChainError, ChainQuery, Proposal,
    ProposalStatus, ProviderStatus, StorageProviderInfo, TxEvent, TxInclusion,
};
use stowage_primitives::{BroadcastMode, TxHash, Visibility, constants::user_agent};
use tracing::debug;
use url::Url;

/// Longest error body kept in a [`ChainError::Status`].
const MAX_STATUS_BODY: usize = 512;

/// gRPC status codes the gateway forwards in its error body.
const GRPC_NOT_FOUND: i64 = 5;
const GRPC_FAILED_PRECONDITION: i64 = 9;
const GRPC_UNAVAILABLE: i64 = 14;

/// REST gateway client. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RestChainClient {
    http: reqwest::Client,
    base: Url,
}

impl RestChainClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self::with_http(http, base))
    }

    /// Reuse an existing pooled client.
    pub fn with_http(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    fn url(&self, path: &str) -> Result<Url, ChainError> {
        self.base.join(path).map_err(|e| ChainError::Decode(format!("bad path {path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ChainError> {
        let url = self.url(path)?;
        debug!(%url, "chain query");
        let resp = self.http.get(url).query(query).send().await.map_err(transport)?;
        decode(resp).await
    }
}

fn transport(err: reqwest::Error) -> ChainError {
    ChainError::Transport(err.to_string())
}

#[derive(Deserialize)]
struct GatewayError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ChainError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(transport)?;
    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|e| ChainError::Decode(e.to_string()));
    }
    Err(classify_status(status.as_u16(), &body))
}

fn classify_status(status: u16, body: &[u8]) -> ChainError {
    let text = String::from_utf8_lossy(body);
    let parsed = serde_json::from_slice::<GatewayError>(body).ok();
    let message = parsed.as_ref().map(|e| e.message.clone()).unwrap_or_else(|| text.trim().to_string());
    match (status, parsed.map(|e| e.code)) {
        (404, _) | (_, Some(GRPC_NOT_FOUND)) => ChainError::NotFound(message),
        (_, Some(GRPC_FAILED_PRECONDITION)) => ChainError::StaleState(message),
        (503, _) | (_, Some(GRPC_UNAVAILABLE)) => ChainError::Transport(message),
        _ => ChainError::Status { status, body: message.chars().take(MAX_STATUS_BODY).collect() },
    }
}

fn u64_from_str<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn u32_from_str<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let n = u64_from_str(d)?;
    u32::try_from(n).map_err(serde::de::Error::custom)
}

fn parse<T: FromStr>(what: &str, value: &str) -> Result<T, ChainError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| ChainError::Decode(format!("{what} {value:?}: {e}")))
}

#[derive(Deserialize)]
struct AccountResponse {
    account: RawAccount,
}

#[derive(Deserialize)]
struct RawAccount {
    address: String,
    #[serde(deserialize_with = "u64_from_str")]
    account_number: u64,
    #[serde(deserialize_with = "u64_from_str")]
    sequence: u64,
}

#[derive(Deserialize)]
struct RawProvider {
    #[serde(deserialize_with = "u32_from_str")]
    id: u32,
    operator_address: String,
    funding_address: String,
    approval_address: String,
    endpoint: String,
    status: String,
}

impl RawProvider {
    fn into_info(self) -> Result<StorageProviderInfo, ChainError> {
        Ok(StorageProviderInfo {
            id: self.id,
            operator_address: parse("operator_address", &self.operator_address)?,
            funding_address: parse("funding_address", &self.funding_address)?,
            approval_address: parse("approval_address", &self.approval_address)?,
            endpoint: self.endpoint,
            status: parse::<ProviderStatus>("status", &self.status)?,
        })
    }
}

#[derive(Deserialize)]
struct ProviderResponse {
    #[serde(rename = "storageProvider")]
    storage_provider: RawProvider,
}

#[derive(Deserialize)]
struct ProvidersResponse {
    sps: Vec<RawProvider>,
}

#[derive(Deserialize)]
struct FamilyResponse {
    #[serde(deserialize_with = "u32_from_str")]
    global_virtual_group_family_id: u32,
}

#[derive(Deserialize)]
struct BucketResponse {
    bucket_info: RawBucket,
}

#[derive(Deserialize)]
struct RawBucket {
    id: String,
    bucket_name: String,
    owner: String,
    visibility: String,
    payment_address: String,
    #[serde(deserialize_with = "u32_from_str")]
    primary_sp_id: u32,
    #[serde(deserialize_with = "u32_from_str")]
    global_virtual_group_family_id: u32,
}

#[derive(Deserialize)]
struct ProposalResponse {
    proposal: RawProposal,
}

#[derive(Deserialize)]
struct RawProposal {
    #[serde(deserialize_with = "u64_from_str")]
    id: u64,
    status: String,
    #[serde(default)]
    title: String,
    proposer: String,
}

#[derive(Deserialize)]
struct TxResponseEnvelope {
    tx_response: RawTxResponse,
}

#[derive(Deserialize)]
struct RawTxResponse {
    txhash: String,
    #[serde(default, deserialize_with = "u64_from_str")]
    height: u64,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    raw_log: String,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: Vec<RawAttribute>,
}

#[derive(Deserialize)]
struct RawAttribute {
    key: String,
    #[serde(default)]
    value: String,
}

impl RawTxResponse {
    fn into_inclusion(self) -> Result<TxInclusion, ChainError> {
        Ok(TxInclusion {
            hash: parse_hash(&self.txhash)?,
            height: self.height,
            code: self.code,
            codespace: self.codespace,
            raw_log: self.raw_log,
            events: self
                .events
                .into_iter()
                .map(|e| TxEvent {
                    kind: e.kind,
                    attributes: e.attributes.into_iter().map(|a| (a.key, a.value)).collect(),
                })
                .collect(),
        })
    }
}

fn parse_hash(hex: &str) -> Result<TxHash, ChainError> {
    parse("txhash", hex)
}

#[async_trait]
impl ChainQuery for RestChainClient {
    async fn account(&self, address: Address) -> Result<BaseAccount, ChainError> {
        let resp: AccountResponse = self.get(&format!("cosmos/auth/v1beta1/accounts/{address}"), &[]).await?;
        Ok(BaseAccount {
            address: parse("address", &resp.account.address)?,
            account_number: resp.account.account_number,
            sequence: resp.account.sequence,
        })
    }

    async fn storage_provider(&self, operator: Address) -> Result<StorageProviderInfo, ChainError> {
        let resp: ProviderResponse = self
            .get(
                "greenfield/sp/storage_provider_by_operator_address",
                &[("operator_address", operator.to_string())],
            )
            .await?;
        resp.storage_provider.into_info()
    }

    async fn storage_providers(&self) -> Result<Vec<StorageProviderInfo>, ChainError> {
        let resp: ProvidersResponse = self.get("greenfield/sp/storage_providers", &[]).await?;
        resp.sps.into_iter().map(RawProvider::into_info).collect()
    }

    async fn recommended_family_id(&self, sp_id: u32) -> Result<u32, ChainError> {
        let resp: FamilyResponse = self
            .get(
                "greenfield/virtualgroup/query_sp_optimal_global_virtual_group_family",
                &[("sp_id", sp_id.to_string())],
            )
            .await?;
        Ok(resp.global_virtual_group_family_id)
    }

    async fn bucket(&self, name: &str) -> Result<BucketInfo, ChainError> {
        let resp: BucketResponse = self.get(&format!("greenfield/storage/head_bucket/{name}"), &[]).await?;
        let raw = resp.bucket_info;
        Ok(BucketInfo {
            id: parse::<U256>("id", &raw.id)?,
            bucket_name: raw.bucket_name,
            owner: parse("owner", &raw.owner)?,
            visibility: parse_visibility(&raw.visibility),
            payment_address: parse("payment_address", &raw.payment_address)?,
            primary_sp_id: raw.primary_sp_id,
            global_virtual_group_family_id: raw.global_virtual_group_family_id,
        })
    }

    async fn proposal(&self, id: u64) -> Result<Proposal, ChainError> {
        let resp: ProposalResponse = self.get(&format!("cosmos/gov/v1/proposals/{id}"), &[]).await?;
        let raw = resp.proposal;
        Ok(Proposal {
            id: raw.id,
            status: parse::<ProposalStatus>("status", &raw.status)?,
            title: raw.title,
            proposer: parse("proposer", &raw.proposer)?,
        })
    }

    async fn tx_by_hash(&self, hash: TxHash) -> Result<Option<TxInclusion>, ChainError> {
        let hex = alloy_primitives::hex::encode_upper(hash);
        match self.get::<TxResponseEnvelope>(&format!("cosmos/tx/v1beta1/txs/{hex}"), &[]).await {
            Ok(resp) => resp.tx_response.into_inclusion().map(Some),
            Err(ChainError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn parse_visibility(raw: &str) -> Visibility {
    match raw {
        "VISIBILITY_TYPE_PUBLIC_READ" => Visibility::PublicRead,
        "VISIBILITY_TYPE_INHERIT" => Visibility::Inherit,
        _ => Visibility::Private,
    }
}

#[async_trait]
impl ChainBroadcast for RestChainClient {
    async fn broadcast(&self, tx: Bytes, mode: BroadcastMode) -> Result<BroadcastResponse, ChainError> {
        let url = self.url("cosmos/tx/v1beta1/txs")?;
        let body = serde_json::json!({
            "tx_bytes": base64::engine::general_purpose::STANDARD.encode(&tx),
            "mode": mode.as_gateway_str(),
        });
        debug!(%url, size = tx.len(), "broadcasting transaction");
        let resp = self.http.post(url).json(&body).send().await.map_err(transport)?;
        let raw: TxResponseEnvelope = decode(resp).await?;
        let raw = raw.tx_response;
        Ok(BroadcastResponse {
            hash: parse_hash(&raw.txhash)?,
            code: raw.code,
            codespace: raw.codespace,
            raw_log: raw.raw_log,
        })
    }
}
