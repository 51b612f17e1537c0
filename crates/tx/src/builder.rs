//! Per-action message constructors.
//!
//! Builders only transform caller intent into messages: they parse address
//! strings, apply the defaulting policy and run self-validation. Nothing here
//! touches the network, so malformed input fails before any round-trip.

use alloy_primitives::{Address, Bytes, U256};
use stowage_primitives::{Grn, Visibility, constants::CONTENT_TYPE_DEFAULT, parse_address, parse_optional_address};

use crate::{
    TxError, TxMessage, TxOptions,
    msg::{
        Approval, CreateBucket, CreateGroup, CreateObject, CreatePaymentAccount, CreateStorageProvider, DeleteBucket,
        DeleteGroup, DeleteObject, Deposit, DepositAuthorization, Description, DisableRefund, GrantDeposit,
        LeaveGroup, MemberToAdd, MultiSend, Output, RedundancyType, SendCoins, SetTag, SpStatus, SubmitProposal, Tag,
        UpdateGroupMember, UpdateSpStatus, Vote, VoteOption, Withdraw, gov_module_address,
    },
};

#[derive(Debug, Clone, Default)]
pub struct CreateBucketOptions {
    /// Defaults to private.
    pub visibility: Option<Visibility>,
    /// Defaults to the sender.
    pub payment_address: Option<String>,
    pub charged_quota: u64,
    /// Appended as a `SetTag` message after the create.
    pub tags: Vec<Tag>,
    pub tx: TxOptions,
}

#[derive(Debug, Clone, Default)]
pub struct CreateObjectOptions {
    /// Defaults to the bucket's visibility.
    pub visibility: Option<Visibility>,
    /// Defaults to `application/octet-stream`.
    pub content_type: Option<String>,
    pub redundancy: RedundancyType,
    pub tags: Vec<Tag>,
    pub tx: TxOptions,
}

#[derive(Debug, Clone, Default)]
pub struct CreateGroupOptions {
    pub extra: String,
    pub tags: Vec<Tag>,
    pub tx: TxOptions,
}

/// One destination of a multi-transfer.
#[derive(Debug, Clone)]
pub struct TransferDetail {
    pub to: String,
    pub amount: U256,
}

/// Registration details for a new storage provider.
#[derive(Debug, Clone, Default)]
pub struct CreateStorageProviderParams {
    pub sp_address: String,
    pub funding_address: String,
    pub seal_address: String,
    pub approval_address: String,
    pub gc_address: String,
    pub maintenance_address: String,
    pub endpoint: String,
    pub description: Description,
    pub deposit: U256,
    pub read_price: U256,
    pub free_read_quota: u64,
    pub store_price: U256,
    pub bls_key: Bytes,
    pub bls_proof: Bytes,
    pub proposal_deposit: U256,
    pub title: String,
    pub summary: String,
}

/// Builds messages on behalf of one sender.
#[derive(Debug, Clone, Copy)]
pub struct MessageBuilder {
    sender: Address,
}

impl MessageBuilder {
    pub fn new(sender: Address) -> Self {
        Self { sender }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Create a bucket, followed by a `SetTag` when tags are given.
    ///
    /// The placement group inside the approval is left unset for the
    /// resolver to fill in.
    pub fn create_bucket(
        &self,
        bucket: &str,
        primary_sp: &str,
        opts: &CreateBucketOptions,
    ) -> Result<Vec<TxMessage>, TxError> {
        let primary_sp_address = parse_address("primary_sp_address", primary_sp)?;
        let payment_address = parse_optional_address("payment_address", opts.payment_address.as_deref())?
            .unwrap_or(self.sender);
        let create = TxMessage::CreateBucket(CreateBucket {
            creator: self.sender,
            bucket_name: bucket.to_string(),
            visibility: opts.visibility.unwrap_or(Visibility::Private),
            payment_address,
            primary_sp_address,
            primary_sp_approval: Approval::default(),
            charged_read_quota: opts.charged_quota,
        });
        self.with_tags(create, Grn::bucket(bucket), &opts.tags)
    }

    pub fn delete_bucket(&self, bucket: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::DeleteBucket(DeleteBucket { operator: self.sender, bucket_name: bucket.to_string() }))
    }

    /// Create an object. `checksums` are the expected piece checksums.
    pub fn create_object(
        &self,
        bucket: &str,
        object: &str,
        payload_size: u64,
        checksums: Vec<Bytes>,
        opts: &CreateObjectOptions,
    ) -> Result<Vec<TxMessage>, TxError> {
        let create = TxMessage::CreateObject(CreateObject {
            creator: self.sender,
            bucket_name: bucket.to_string(),
            object_name: object.to_string(),
            payload_size,
            visibility: opts.visibility.unwrap_or(Visibility::Inherit),
            content_type: opts.content_type.clone().unwrap_or_else(|| CONTENT_TYPE_DEFAULT.to_string()),
            primary_sp_approval: Approval::default(),
            expect_checksums: checksums,
            redundancy_type: opts.redundancy,
        });
        self.with_tags(create, Grn::object(bucket, object), &opts.tags)
    }

    pub fn delete_object(&self, bucket: &str, object: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::DeleteObject(DeleteObject {
            operator: self.sender,
            bucket_name: bucket.to_string(),
            object_name: object.to_string(),
        }))
    }

    /// Replace the tags of a resource given as a GRN string.
    pub fn set_tag(&self, resource: &str, tags: Vec<Tag>) -> Result<Vec<TxMessage>, TxError> {
        let resource: Grn = resource.parse()?;
        checked(TxMessage::SetTag(SetTag { operator: self.sender, resource, tags }))
    }

    pub fn create_group(&self, group: &str, opts: &CreateGroupOptions) -> Result<Vec<TxMessage>, TxError> {
        let create = TxMessage::CreateGroup(CreateGroup {
            creator: self.sender,
            group_name: group.to_string(),
            extra: opts.extra.clone(),
        });
        self.with_tags(create, Grn::group(self.sender, group), &opts.tags)
    }

    pub fn delete_group(&self, group: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::DeleteGroup(DeleteGroup { operator: self.sender, group_name: group.to_string() }))
    }

    /// Add and remove members. `expiration` applies to every added member.
    pub fn update_group_member(
        &self,
        owner: &str,
        group: &str,
        add: &[String],
        remove: &[String],
        expiration: Option<i64>,
    ) -> Result<Vec<TxMessage>, TxError> {
        let group_owner = parse_address("group_owner", owner)?;
        let members_to_add = add
            .iter()
            .map(|m| Ok(MemberToAdd { member: parse_address("members_to_add", m)?, expiration_time: expiration }))
            .collect::<Result<Vec<_>, TxError>>()?;
        let members_to_delete = remove
            .iter()
            .map(|m| parse_address("members_to_delete", m))
            .collect::<Result<Vec<_>, _>>()?;
        checked(TxMessage::UpdateGroupMember(UpdateGroupMember {
            operator: self.sender,
            group_owner,
            group_name: group.to_string(),
            members_to_add,
            members_to_delete,
        }))
    }

    pub fn leave_group(&self, owner: &str, group: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::LeaveGroup(LeaveGroup {
            member: self.sender,
            group_owner: parse_address("group_owner", owner)?,
            group_name: group.to_string(),
        }))
    }

    pub fn transfer(&self, to: &str, amount: U256) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::Send(SendCoins {
            from_address: self.sender,
            to_address: parse_address("to_address", to)?,
            amount,
        }))
    }

    /// Send to several destinations; the input amount is their sum.
    pub fn multi_transfer(&self, details: &[TransferDetail]) -> Result<Vec<TxMessage>, TxError> {
        let outputs = details
            .iter()
            .map(|d| Ok(Output { address: parse_address("outputs.address", &d.to)?, amount: d.amount }))
            .collect::<Result<Vec<_>, TxError>>()?;
        let total = outputs
            .iter()
            .try_fold(U256::ZERO, |acc, o| acc.checked_add(o.amount))
            .ok_or_else(|| TxError::field("outputs", "sum overflows"))?;
        checked(TxMessage::MultiSend(MultiSend { input: Output { address: self.sender, amount: total }, outputs }))
    }

    pub fn create_payment_account(&self) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::CreatePaymentAccount(CreatePaymentAccount { creator: self.sender }))
    }

    pub fn deposit(&self, to: &str, amount: U256) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::Deposit(Deposit { creator: self.sender, to: parse_address("to", to)?, amount }))
    }

    pub fn withdraw(&self, from: &str, amount: U256) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::Withdraw(Withdraw { creator: self.sender, from: parse_address("from", from)?, amount }))
    }

    pub fn disable_refund(&self, payment_account: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::DisableRefund(DisableRefund {
            owner: self.sender,
            addr: parse_address("payment_account", payment_account)?,
        }))
    }

    pub fn submit_proposal(
        &self,
        messages: Vec<TxMessage>,
        deposit: U256,
        title: &str,
        summary: &str,
        metadata: &str,
    ) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::SubmitProposal(SubmitProposal {
            proposer: self.sender,
            messages,
            initial_deposit: deposit,
            metadata: metadata.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
        }))
    }

    pub fn vote(&self, proposal_id: u64, option: VoteOption, metadata: &str) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::Vote(Vote { proposal_id, voter: self.sender, option, metadata: metadata.to_string() }))
    }

    /// A governance proposal wrapping the provider registration.
    pub fn create_storage_provider(&self, params: &CreateStorageProviderParams) -> Result<Vec<TxMessage>, TxError> {
        let create = TxMessage::CreateStorageProvider(CreateStorageProvider {
            creator: gov_module_address(),
            description: params.description.clone(),
            sp_address: parse_address("sp_address", &params.sp_address)?,
            funding_address: parse_address("funding_address", &params.funding_address)?,
            seal_address: parse_address("seal_address", &params.seal_address)?,
            approval_address: parse_address("approval_address", &params.approval_address)?,
            gc_address: parse_address("gc_address", &params.gc_address)?,
            maintenance_address: parse_address("maintenance_address", &params.maintenance_address)?,
            endpoint: params.endpoint.clone(),
            deposit: params.deposit,
            read_price: params.read_price,
            free_read_quota: params.free_read_quota,
            store_price: params.store_price,
            bls_key: params.bls_key.clone(),
            bls_proof: params.bls_proof.clone(),
        });
        self.submit_proposal(vec![create], params.proposal_deposit, &params.title, &params.summary, "")
    }

    /// Let the governance module draw a provider's deposit from this account.
    pub fn grant_deposit_for_sp(
        &self,
        sp_address: &str,
        max_tokens: U256,
        expiration: Option<i64>,
    ) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::GrantDeposit(GrantDeposit {
            granter: self.sender,
            grantee: gov_module_address(),
            authorization: DepositAuthorization {
                max_tokens,
                allow_list: vec![parse_address("sp_address", sp_address)?],
            },
            expiration,
        }))
    }

    /// Switch the sender's provider between in-service and maintenance.
    pub fn update_sp_status(&self, status: SpStatus, duration: Option<i64>) -> Result<Vec<TxMessage>, TxError> {
        checked(TxMessage::UpdateSpStatus(UpdateSpStatus { sp_address: self.sender, status, duration }))
    }

    fn with_tags(&self, create: TxMessage, resource: Grn, tags: &[Tag]) -> Result<Vec<TxMessage>, TxError> {
        let mut messages = checked(create)?;
        if !tags.is_empty() {
            messages.extend(checked(TxMessage::SetTag(SetTag {
                operator: self.sender,
                resource,
                tags: tags.to_vec(),
            }))?);
        }
        Ok(messages)
    }
}

fn checked(msg: TxMessage) -> Result<Vec<TxMessage>, TxError> {
    msg.validate_basic()?;
    Ok(vec![msg])
}
