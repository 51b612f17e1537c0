//! The caller-facing client.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use sha2::{Digest, Sha256};
use stowage_api::{
    ApprovalProvider, BaseAccount, BucketInfo, ChainBroadcast, ChainError, ChainQuery, ClientError, Proposal,
    StorageProviderInfo, TxOutcome, TxSubmission,
};
use stowage_auth::{RequestSigner, SigningStrategy};
use stowage_chain::{PlacementResolver, RestChainClient, TxBroadcaster};
use stowage_primitives::{TxHash, parse_address};
use stowage_sp::{
    BucketEntry, ByteRange, ListObjectsOptions, ListObjectsResult, ObjectContent, SpApprovalClient, SpClient,
    select_endpoint,
};
use stowage_tx::{
    CreateBucketOptions, CreateGroupOptions, CreateObjectOptions, CreateStorageProviderParams, MessageBuilder,
    SignerData, TransferDetail, TxEnvelope, TxMessage, TxOptions,
    msg::{SpStatus, Tag, VoteOption},
};
use tracing::debug;

use crate::ClientConfig;

const PROPOSAL_EVENT: &str = "submit_proposal";
const PROPOSAL_ID_KEY: &str = "proposal_id";

/// Builds, resolves, signs and broadcasts chain actions, and performs
/// signed storage-provider operations.
///
/// Holds no call-scoped state. Clones share the same pooled transports.
#[derive(Debug)]
pub struct Client<C = RestChainClient, A = SpApprovalClient> {
    config: Arc<ClientConfig>,
    chain: Arc<C>,
    resolver: PlacementResolver<Arc<C>, Arc<A>>,
    broadcaster: TxBroadcaster<Arc<C>>,
    sp: SpClient,
    account: Option<PrivateKeySigner>,
}

impl<C, A> Clone for Client<C, A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            chain: Arc::clone(&self.chain),
            resolver: self.resolver.clone(),
            broadcaster: self.broadcaster.clone(),
            sp: self.sp.clone(),
            account: self.account.clone(),
        }
    }
}

impl Client {
    /// Connect to the chain's REST gateway and providers per `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let chain = RestChainClient::new(config.chain_rest.clone(), config.chain_timeout)?;
        let sp = SpClient::new(RequestSigner::new(config.signing_strategy()), config.sp_timeout)?;
        let approvals = SpApprovalClient::new(sp.clone());
        Ok(Self::from_parts(config, chain, approvals, sp))
    }
}

impl<C, A> Client<C, A>
where
    C: ChainQuery + ChainBroadcast,
    A: ApprovalProvider,
{
    /// Assemble a client from explicit collaborators.
    pub fn from_parts(config: ClientConfig, chain: C, approvals: A, sp: SpClient) -> Self {
        let chain = Arc::new(chain);
        let resolver = PlacementResolver::new(Arc::clone(&chain), Arc::new(approvals)).with_policy(config.fallback);
        let broadcaster = TxBroadcaster::new(Arc::clone(&chain));
        let account = config.account.clone();
        Self { config: Arc::new(config), chain, resolver, broadcaster, sp, account }
    }

    /// The same client acting as `key`. Transports are shared.
    pub fn with_account(&self, key: PrivateKeySigner) -> Self {
        let sp = self.sp.with_signer(RequestSigner::new(Some(SigningStrategy::AccountKey(key.clone()))));
        Self { sp, account: Some(key), ..self.clone() }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Address of the configured account.
    pub fn address(&self) -> Result<Address, ClientError> {
        Ok(self.key()?.address())
    }

    /// Transaction options seeded from the config.
    pub fn tx_options(&self) -> TxOptions {
        self.config.tx.clone()
    }

    fn key(&self) -> Result<&PrivateKeySigner, ClientError> {
        self.account.as_ref().ok_or_else(|| ClientError::Authentication("no account key configured".into()))
    }

    fn builder(&self) -> Result<MessageBuilder, ClientError> {
        Ok(MessageBuilder::new(self.address()?))
    }

    /// Resolve, sign with a freshly read sequence, and broadcast.
    pub async fn execute(&self, mut messages: Vec<TxMessage>, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let key = self.key()?;
        self.resolver.resolve_all(&mut messages).await?;
        let envelope = TxEnvelope::new(messages, opts)?;

        let account = self.chain.account(key.address()).await?;
        debug!(address = %account.address, sequence = account.sequence, "signing envelope");
        let signed = envelope.sign(
            key,
            &SignerData {
                chain_id: self.config.chain_id.clone(),
                account_number: account.account_number,
                sequence: account.sequence,
            },
        )?;
        self.broadcaster.broadcast(&signed, opts).await
    }

    /// Poll for a previously submitted transaction.
    pub async fn wait_for_tx(&self, hash: TxHash, opts: &TxOptions) -> TxOutcome {
        self.broadcaster.wait_for_inclusion(hash, opts.timeout, opts.poll_interval, opts.cancel.clone()).await
    }

    pub async fn create_bucket(
        &self,
        bucket: &str,
        primary_sp: &str,
        opts: &CreateBucketOptions,
    ) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.create_bucket(bucket, primary_sp, opts)?;
        self.execute(messages, &opts.tx).await
    }

    pub async fn delete_bucket(&self, bucket: &str, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.delete_bucket(bucket)?;
        self.execute(messages, opts).await
    }

    /// Create an object whose payload is `content`.
    ///
    /// The expected checksum list holds the sha256 of the whole payload.
    pub async fn create_object(
        &self,
        bucket: &str,
        object: &str,
        content: &[u8],
        opts: &CreateObjectOptions,
    ) -> Result<TxSubmission, ClientError> {
        let checksum = Bytes::copy_from_slice(&Sha256::digest(content));
        let messages =
            self.builder()?.create_object(bucket, object, content.len() as u64, vec![checksum], opts)?;
        self.execute(messages, &opts.tx).await
    }

    pub async fn delete_object(&self, bucket: &str, object: &str, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.delete_object(bucket, object)?;
        self.execute(messages, opts).await
    }

    pub async fn set_tag(&self, resource: &str, tags: Vec<Tag>, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.set_tag(resource, tags)?;
        self.execute(messages, opts).await
    }

    pub async fn create_group(&self, group: &str, opts: &CreateGroupOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.create_group(group, opts)?;
        self.execute(messages, &opts.tx).await
    }

    pub async fn delete_group(&self, group: &str, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.delete_group(group)?;
        self.execute(messages, opts).await
    }

    pub async fn update_group_member(
        &self,
        owner: &str,
        group: &str,
        add: &[String],
        remove: &[String],
        expiration: Option<i64>,
        opts: &TxOptions,
    ) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.update_group_member(owner, group, add, remove, expiration)?;
        self.execute(messages, opts).await
    }

    pub async fn leave_group(&self, owner: &str, group: &str, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.leave_group(owner, group)?;
        self.execute(messages, opts).await
    }

    pub async fn transfer(&self, to: &str, amount: U256, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.transfer(to, amount)?;
        self.execute(messages, opts).await
    }

    pub async fn multi_transfer(
        &self,
        details: &[TransferDetail],
        opts: &TxOptions,
    ) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.multi_transfer(details)?;
        self.execute(messages, opts).await
    }

    pub async fn create_payment_account(&self, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.create_payment_account()?;
        self.execute(messages, opts).await
    }

    pub async fn deposit(&self, to: &str, amount: U256, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.deposit(to, amount)?;
        self.execute(messages, opts).await
    }

    pub async fn withdraw(&self, from: &str, amount: U256, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.withdraw(from, amount)?;
        self.execute(messages, opts).await
    }

    pub async fn disable_refund(&self, payment_account: &str, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.disable_refund(payment_account)?;
        self.execute(messages, opts).await
    }

    /// Submit a proposal and return its hash and id.
    ///
    /// The id is read from the confirmed transaction, so this fails in
    /// asynchronous mode.
    pub async fn submit_proposal(
        &self,
        messages: Vec<TxMessage>,
        deposit: U256,
        title: &str,
        summary: &str,
        opts: &TxOptions,
    ) -> Result<(TxHash, u64), ClientError> {
        let messages = self.builder()?.submit_proposal(messages, deposit, title, summary, "")?;
        proposal_id(self.execute(messages, opts).await?)
    }

    pub async fn vote(&self, proposal_id: u64, option: VoteOption, opts: &TxOptions) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.vote(proposal_id, option, "")?;
        self.execute(messages, opts).await
    }

    /// Propose a new storage provider. Returns the hash and proposal id.
    pub async fn create_storage_provider(
        &self,
        params: &CreateStorageProviderParams,
        opts: &TxOptions,
    ) -> Result<(TxHash, u64), ClientError> {
        let messages = self.builder()?.create_storage_provider(params)?;
        proposal_id(self.execute(messages, opts).await?)
    }

    pub async fn grant_deposit_for_sp(
        &self,
        sp_address: &str,
        max_tokens: U256,
        expiration: Option<i64>,
        opts: &TxOptions,
    ) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.grant_deposit_for_sp(sp_address, max_tokens, expiration)?;
        self.execute(messages, opts).await
    }

    pub async fn update_sp_status(
        &self,
        status: SpStatus,
        duration: Option<i64>,
        opts: &TxOptions,
    ) -> Result<TxSubmission, ClientError> {
        let messages = self.builder()?.update_sp_status(status, duration)?;
        self.execute(messages, opts).await
    }

    pub async fn account(&self, address: &str) -> Result<BaseAccount, ClientError> {
        Ok(self.chain.account(parse_address("address", address)?).await?)
    }

    pub async fn head_bucket(&self, bucket: &str) -> Result<BucketInfo, ClientError> {
        Ok(self.chain.bucket(bucket).await?)
    }

    pub async fn proposal(&self, id: u64) -> Result<Proposal, ClientError> {
        Ok(self.chain.proposal(id).await?)
    }

    /// Operator address for a new bucket's primary provider: the configured
    /// provider if any, else the first in-service one.
    pub async fn default_primary_sp(&self) -> Result<Address, ClientError> {
        if let Some(address) = self.config.sp.sp_address {
            return Ok(address);
        }
        self.chain
            .storage_providers()
            .await?
            .into_iter()
            .find(StorageProviderInfo::is_in_service)
            .map(|sp| sp.operator_address)
            .ok_or_else(|| ChainError::NotFound("no in-service storage provider".into()).into())
    }

    /// Buckets of `account`, or of the configured account.
    pub async fn list_buckets(
        &self,
        account: Option<&str>,
        include_removed: bool,
    ) -> Result<Vec<BucketEntry>, ClientError> {
        let account = match account {
            Some(account) => parse_address("account", account)?,
            None => self.address()?,
        };
        let endpoint = select_endpoint(self.chain.as_ref(), &self.config.sp, None).await?;
        self.sp.list_buckets(&endpoint, account, include_removed).await
    }

    pub async fn list_objects(&self, bucket: &str, opts: &ListObjectsOptions) -> Result<ListObjectsResult, ClientError> {
        let endpoint = select_endpoint(self.chain.as_ref(), &self.config.sp, Some(bucket)).await?;
        self.sp.list_objects(&endpoint, bucket, opts).await
    }

    pub async fn get_object(
        &self,
        bucket: &str,
        object: &str,
        range: Option<ByteRange>,
    ) -> Result<ObjectContent, ClientError> {
        let endpoint = select_endpoint(self.chain.as_ref(), &self.config.sp, Some(bucket)).await?;
        self.sp.get_object(&endpoint, bucket, object, range).await
    }

    /// Upload the payload of an object created by `txn_hash`.
    pub async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        content: bytes::Bytes,
        content_type: Option<&str>,
        txn_hash: Option<TxHash>,
    ) -> Result<(), ClientError> {
        let endpoint = select_endpoint(self.chain.as_ref(), &self.config.sp, Some(bucket)).await?;
        self.sp.put_object(&endpoint, bucket, object, content, content_type, txn_hash).await
    }
}

fn proposal_id(submission: TxSubmission) -> Result<(TxHash, u64), ClientError> {
    let hash = submission.hash;
    let id = submission
        .into_result()?
        .and_then(|inclusion| {
            inclusion.event_attribute(PROPOSAL_EVENT, PROPOSAL_ID_KEY).and_then(|id| id.trim_matches('"').parse().ok())
        })
        .ok_or_else(|| ClientError::InvalidArgument("proposal id not found".into()))?;
    Ok((hash, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use stowage_api::{TxEvent, TxInclusion};

    fn included(events: Vec<TxEvent>) -> TxSubmission {
        let hash = TxHash::repeat_byte(3);
        TxSubmission {
            hash,
            outcome: Some(TxOutcome::Confirmed(TxInclusion {
                hash,
                height: 10,
                code: 0,
                codespace: String::new(),
                raw_log: String::new(),
                events,
            })),
        }
    }

    #[test]
    fn proposal_id_comes_from_the_event() {
        let event = TxEvent {
            kind: PROPOSAL_EVENT.into(),
            attributes: vec![(PROPOSAL_ID_KEY.into(), "\"42\"".into())],
        };
        assert_eq!(proposal_id(included(vec![event])).unwrap(), (TxHash::repeat_byte(3), 42));
    }

    #[test]
    fn missing_proposal_id_is_reported() {
        assert_matches!(proposal_id(included(vec![])), Err(ClientError::InvalidArgument(m)) if m == "proposal id not found");
        assert_matches!(
            proposal_id(TxSubmission::submitted(TxHash::ZERO)),
            Err(ClientError::InvalidArgument(_))
        );
    }
}
