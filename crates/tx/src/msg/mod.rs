//! Chain message payloads.
//!
//! Each variant of [`TxMessage`] wraps one concrete message struct. Messages
//! serialize with an `@type` tag so that the sign document and the broadcast
//! payload carry the same self-describing JSON.

mod bank;
mod gov;
mod group;
mod payment;
mod sp;
mod storage;
pub(crate) mod validate;

pub use bank::{MultiSend, Output, SendCoins};
pub use gov::{SubmitProposal, Vote, VoteOption};
pub use group::{CreateGroup, DeleteGroup, LeaveGroup, MemberToAdd, UpdateGroupMember};
pub use payment::{CreatePaymentAccount, Deposit, DisableRefund, Withdraw};
pub use sp::{
    CreateStorageProvider, DepositAuthorization, Description, GrantDeposit, SpStatus, UpdateSpStatus,
    gov_module_address,
};
pub use storage::{
    Approval, CreateBucket, CreateObject, DeleteBucket, DeleteObject, RedundancyType, SetTag, Tag,
};

use alloy_primitives::{Address, B256, keccak256};
use serde::{Deserialize, Serialize};

use crate::TxError;

/// One chain-level intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TxMessage {
    #[serde(rename = "/storage.MsgCreateBucket")]
    CreateBucket(CreateBucket),
    #[serde(rename = "/storage.MsgDeleteBucket")]
    DeleteBucket(DeleteBucket),
    #[serde(rename = "/storage.MsgCreateObject")]
    CreateObject(CreateObject),
    #[serde(rename = "/storage.MsgDeleteObject")]
    DeleteObject(DeleteObject),
    #[serde(rename = "/storage.MsgSetTag")]
    SetTag(SetTag),
    #[serde(rename = "/storage.MsgCreateGroup")]
    CreateGroup(CreateGroup),
    #[serde(rename = "/storage.MsgDeleteGroup")]
    DeleteGroup(DeleteGroup),
    #[serde(rename = "/storage.MsgUpdateGroupMember")]
    UpdateGroupMember(UpdateGroupMember),
    #[serde(rename = "/storage.MsgLeaveGroup")]
    LeaveGroup(LeaveGroup),
    #[serde(rename = "/bank.MsgSend")]
    Send(SendCoins),
    #[serde(rename = "/bank.MsgMultiSend")]
    MultiSend(MultiSend),
    #[serde(rename = "/payment.MsgCreatePaymentAccount")]
    CreatePaymentAccount(CreatePaymentAccount),
    #[serde(rename = "/payment.MsgDeposit")]
    Deposit(Deposit),
    #[serde(rename = "/payment.MsgWithdraw")]
    Withdraw(Withdraw),
    #[serde(rename = "/payment.MsgDisableRefund")]
    DisableRefund(DisableRefund),
    #[serde(rename = "/gov.MsgSubmitProposal")]
    SubmitProposal(SubmitProposal),
    #[serde(rename = "/gov.MsgVote")]
    Vote(Vote),
    #[serde(rename = "/sp.MsgCreateStorageProvider")]
    CreateStorageProvider(CreateStorageProvider),
    #[serde(rename = "/authz.MsgGrantDeposit")]
    GrantDeposit(GrantDeposit),
    #[serde(rename = "/sp.MsgUpdateStorageProviderStatus")]
    UpdateSpStatus(UpdateSpStatus),
}

impl TxMessage {
    /// Short action name, used in logs and approval requests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateBucket(_) => "CreateBucket",
            Self::DeleteBucket(_) => "DeleteBucket",
            Self::CreateObject(_) => "CreateObject",
            Self::DeleteObject(_) => "DeleteObject",
            Self::SetTag(_) => "SetTag",
            Self::CreateGroup(_) => "CreateGroup",
            Self::DeleteGroup(_) => "DeleteGroup",
            Self::UpdateGroupMember(_) => "UpdateGroupMember",
            Self::LeaveGroup(_) => "LeaveGroup",
            Self::Send(_) => "Send",
            Self::MultiSend(_) => "MultiSend",
            Self::CreatePaymentAccount(_) => "CreatePaymentAccount",
            Self::Deposit(_) => "Deposit",
            Self::Withdraw(_) => "Withdraw",
            Self::DisableRefund(_) => "DisableRefund",
            Self::SubmitProposal(_) => "SubmitProposal",
            Self::Vote(_) => "Vote",
            Self::CreateStorageProvider(_) => "CreateStorageProvider",
            Self::GrantDeposit(_) => "GrantDeposit",
            Self::UpdateSpStatus(_) => "UpdateSpStatus",
        }
    }

    /// Address that must sign a transaction carrying this message.
    pub fn signer(&self) -> Address {
        match self {
            Self::CreateBucket(m) => m.creator,
            Self::DeleteBucket(m) => m.operator,
            Self::CreateObject(m) => m.creator,
            Self::DeleteObject(m) => m.operator,
            Self::SetTag(m) => m.operator,
            Self::CreateGroup(m) => m.creator,
            Self::DeleteGroup(m) => m.operator,
            Self::UpdateGroupMember(m) => m.operator,
            Self::LeaveGroup(m) => m.member,
            Self::Send(m) => m.from_address,
            Self::MultiSend(m) => m.input.address,
            Self::CreatePaymentAccount(m) => m.creator,
            Self::Deposit(m) => m.creator,
            Self::Withdraw(m) => m.creator,
            Self::DisableRefund(m) => m.owner,
            Self::SubmitProposal(m) => m.proposer,
            Self::Vote(m) => m.voter,
            Self::CreateStorageProvider(m) => m.creator,
            Self::GrantDeposit(m) => m.granter,
            Self::UpdateSpStatus(m) => m.sp_address,
        }
    }

    /// Stateless self-validation.
    pub fn validate_basic(&self) -> Result<(), TxError> {
        match self {
            Self::CreateBucket(m) => m.validate_basic(),
            Self::DeleteBucket(m) => m.validate_basic(),
            Self::CreateObject(m) => m.validate_basic(),
            Self::DeleteObject(m) => m.validate_basic(),
            Self::SetTag(m) => m.validate_basic(),
            Self::CreateGroup(m) => m.validate_basic(),
            Self::DeleteGroup(m) => m.validate_basic(),
            Self::UpdateGroupMember(m) => m.validate_basic(),
            Self::LeaveGroup(m) => m.validate_basic(),
            Self::Send(m) => m.validate_basic(),
            Self::MultiSend(m) => m.validate_basic(),
            Self::CreatePaymentAccount(_) => Ok(()),
            Self::Deposit(m) => m.validate_basic(),
            Self::Withdraw(m) => m.validate_basic(),
            Self::DisableRefund(_) => Ok(()),
            Self::SubmitProposal(m) => m.validate_basic(),
            Self::Vote(_) => Ok(()),
            Self::CreateStorageProvider(m) => m.validate_basic(),
            Self::GrantDeposit(m) => m.validate_basic(),
            Self::UpdateSpStatus(m) => m.validate_basic(),
        }
    }

    /// Fails if a chain-state dependent field is still unset.
    ///
    /// Builders leave these empty; the dependency resolver fills them in
    /// before the envelope is assembled.
    pub fn check_resolved(&self) -> Result<(), TxError> {
        match self {
            Self::CreateBucket(m) if m.primary_sp_approval.global_virtual_group_family_id == 0 => {
                Err(TxError::UnresolvedDependency("bucket placement group"))
            }
            Self::CreateObject(m) if m.primary_sp_approval.sig.is_empty() => {
                Err(TxError::UnresolvedDependency("object approval"))
            }
            _ => Ok(()),
        }
    }

    /// The approval slot of messages that carry one.
    pub fn approval(&self) -> Option<&Approval> {
        match self {
            Self::CreateBucket(m) => Some(&m.primary_sp_approval),
            Self::CreateObject(m) => Some(&m.primary_sp_approval),
            _ => None,
        }
    }

    pub(crate) fn approval_mut(&mut self) -> Option<&mut Approval> {
        match self {
            Self::CreateBucket(m) => Some(&mut m.primary_sp_approval),
            Self::CreateObject(m) => Some(&mut m.primary_sp_approval),
            _ => None,
        }
    }

    /// Keccak digest of the message with its approval slot cleared.
    ///
    /// Any change to the message other than the approval itself changes the
    /// digest, which is what binds an approval to one exact message.
    pub fn approval_digest(&self) -> Result<B256, TxError> {
        let mut unsigned = self.clone();
        if let Some(approval) = unsigned.approval_mut() {
            *approval = Approval::default();
        }
        let bytes = serde_json::to_vec(&unsigned).map_err(|e| TxError::Serialization(e.to_string()))?;
        Ok(keccak256(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use stowage_primitives::Visibility;

    fn bucket_msg() -> TxMessage {
        TxMessage::CreateBucket(CreateBucket {
            creator: Address::repeat_byte(1),
            bucket_name: "photos".into(),
            visibility: Visibility::Private,
            payment_address: Address::repeat_byte(1),
            primary_sp_address: Address::repeat_byte(2),
            primary_sp_approval: Approval::default(),
            charged_read_quota: 0,
        })
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&bucket_msg()).unwrap();
        assert!(json.contains(r#""@type":"/storage.MsgCreateBucket""#));
        let back: TxMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bucket_msg());
    }

    #[test]
    fn approval_digest_ignores_approval_but_not_fields() {
        let msg = bucket_msg();
        let digest = msg.approval_digest().unwrap();

        let mut with_approval = msg.clone();
        if let Some(a) = with_approval.approval_mut() {
            a.global_virtual_group_family_id = 7;
            a.expired_height = 100;
        }
        assert_eq!(with_approval.approval_digest().unwrap(), digest);

        let TxMessage::CreateBucket(mut inner) = msg else { unreachable!() };
        inner.bucket_name = "photos2".into();
        assert_ne!(TxMessage::CreateBucket(inner).approval_digest().unwrap(), digest);
    }

    #[test]
    fn unresolved_bucket_is_flagged() {
        assert!(bucket_msg().check_resolved().is_err());

        let send = TxMessage::Send(SendCoins {
            from_address: Address::repeat_byte(1),
            to_address: Address::repeat_byte(2),
            amount: U256::from(5u64),
        });
        assert!(send.check_resolved().is_ok());
        assert_eq!(send.signer(), Address::repeat_byte(1));
    }
}
