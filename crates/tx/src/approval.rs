//! Storage-provider approvals bound to a single message.
//!
//! A provider co-signs a message that needs its consent (bucket or object
//! creation) and may embed state the chain has not indexed yet, such as the
//! placement group for a new bucket. The token remembers the digest of the
//! message it was issued for, so it can only be attached to that exact
//! message.

use alloy_primitives::{Address, B256, Bytes, Signature, keccak256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};

use crate::{TxError, TxMessage, msg::Approval};

/// Actions a storage provider approves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr, strum::EnumString,
)]
pub enum ApprovalAction {
    CreateBucket,
    CreateObject,
}

impl ApprovalAction {
    /// The action for a message, if it needs approval at all.
    pub fn for_message(msg: &TxMessage) -> Option<Self> {
        match msg {
            TxMessage::CreateBucket(_) => Some(Self::CreateBucket),
            TxMessage::CreateObject(_) => Some(Self::CreateObject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalToken {
    action: ApprovalAction,
    digest: B256,
    approval: Approval,
}

impl ApprovalToken {
    /// Sign an approval for `msg` with the provider's approval key.
    pub fn issue(
        key: &PrivateKeySigner,
        msg: &TxMessage,
        expired_height: u64,
        family_id: u32,
    ) -> Result<Self, TxError> {
        let action = Self::action_of(msg)?;
        let digest = msg.approval_digest()?;
        let hash = signing_hash(&digest, expired_height, family_id);
        let sig = key.sign_hash_sync(&hash).map_err(|e| TxError::Signing(e.to_string()))?;
        Ok(Self {
            action,
            digest,
            approval: Approval {
                expired_height,
                global_virtual_group_family_id: family_id,
                sig: Bytes::copy_from_slice(&sig.as_bytes()),
            },
        })
    }

    /// Build a token from the signed message a provider returned.
    pub fn from_signed_message(signed: &TxMessage) -> Result<Self, TxError> {
        let action = Self::action_of(signed)?;
        let approval = signed
            .approval()
            .cloned()
            .ok_or_else(|| TxError::ApprovalMismatch("message carries no approval".into()))?;
        if approval.sig.is_empty() {
            return Err(TxError::ApprovalMismatch("provider returned an unsigned approval".into()));
        }
        Ok(Self { action, digest: signed.approval_digest()?, approval })
    }

    fn action_of(msg: &TxMessage) -> Result<ApprovalAction, TxError> {
        ApprovalAction::for_message(msg)
            .ok_or_else(|| TxError::ApprovalMismatch(format!("{} does not take an approval", msg.kind())))
    }

    pub fn action(&self) -> ApprovalAction {
        self.action
    }

    pub fn digest(&self) -> B256 {
        self.digest
    }

    pub fn approval(&self) -> &Approval {
        &self.approval
    }

    /// Placement group embedded by the provider.
    pub fn family_id(&self) -> u32 {
        self.approval.global_virtual_group_family_id
    }

    pub fn recover_issuer(&self) -> Result<Address, TxError> {
        let hash = signing_hash(
            &self.digest,
            self.approval.expired_height,
            self.approval.global_virtual_group_family_id,
        );
        let sig = Signature::try_from(self.approval.sig.as_ref())
            .map_err(|e| TxError::Signing(format!("invalid approval signature: {e}")))?;
        sig.recover_address_from_prehash(&hash)
            .map_err(|e| TxError::Signing(format!("approval recovery failed: {e}")))
    }

    /// Check the token was signed by the provider's approval address.
    pub fn verify_issuer(&self, approval_address: Address) -> Result<(), TxError> {
        let issuer = self.recover_issuer()?;
        if issuer != approval_address {
            return Err(TxError::ApprovalMismatch(format!(
                "signed by {issuer}, expected {approval_address}"
            )));
        }
        Ok(())
    }

    /// Copy the approval into `msg`, which must be the message it was issued for.
    pub fn attach(&self, msg: &mut TxMessage) -> Result<(), TxError> {
        let digest = msg.approval_digest()?;
        if digest != self.digest {
            return Err(TxError::ApprovalMismatch(format!(
                "token issued for {}, message digest is {digest}",
                self.digest
            )));
        }
        let kind = msg.kind();
        let slot = msg
            .approval_mut()
            .ok_or_else(|| TxError::ApprovalMismatch(format!("{kind} does not take an approval")))?;
        *slot = self.approval.clone();
        Ok(())
    }
}

fn signing_hash(digest: &B256, expired_height: u64, family_id: u32) -> B256 {
    let mut buf = Vec::with_capacity(32 + 8 + 4);
    buf.extend_from_slice(digest.as_slice());
    buf.extend_from_slice(&expired_height.to_be_bytes());
    buf.extend_from_slice(&family_id.to_be_bytes());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::{CreateBucket, SendCoins};
    use alloy_primitives::U256;
    use assert_matches::assert_matches;
    use stowage_primitives::Visibility;

    fn bucket(name: &str) -> TxMessage {
        TxMessage::CreateBucket(CreateBucket {
            creator: Address::repeat_byte(1),
            bucket_name: name.into(),
            visibility: Visibility::Private,
            payment_address: Address::repeat_byte(1),
            primary_sp_address: Address::repeat_byte(2),
            primary_sp_approval: Approval::default(),
            charged_read_quota: 0,
        })
    }

    #[test]
    fn issued_token_attaches_and_verifies() {
        let sp = PrivateKeySigner::random();
        let mut msg = bucket("photos");
        let token = ApprovalToken::issue(&sp, &msg, 100, 7).unwrap();

        token.verify_issuer(sp.address()).unwrap();
        assert_matches!(token.verify_issuer(Address::repeat_byte(3)), Err(TxError::ApprovalMismatch(_)));

        token.attach(&mut msg).unwrap();
        assert_eq!(msg.approval().unwrap().global_virtual_group_family_id, 7);
        assert!(msg.check_resolved().is_ok());
    }

    #[test]
    fn stale_token_is_rejected() {
        let sp = PrivateKeySigner::random();
        let token = ApprovalToken::issue(&sp, &bucket("photos"), 100, 7).unwrap();

        let mut mutated = bucket("photos-v2");
        assert_matches!(token.attach(&mut mutated), Err(TxError::ApprovalMismatch(_)));
        assert_eq!(mutated.approval().unwrap().global_virtual_group_family_id, 0);
    }

    #[test]
    fn round_trips_through_signed_message() {
        let sp = PrivateKeySigner::random();
        let mut signed = bucket("photos");
        ApprovalToken::issue(&sp, &signed, 100, 7).unwrap().attach(&mut signed).unwrap();

        let token = ApprovalToken::from_signed_message(&signed).unwrap();
        assert_eq!(token.family_id(), 7);
        assert_eq!(token.recover_issuer().unwrap(), sp.address());
    }

    #[test]
    fn messages_without_approval_slot_are_refused() {
        let send = TxMessage::Send(SendCoins {
            from_address: Address::repeat_byte(1),
            to_address: Address::repeat_byte(2),
            amount: U256::from(1u64),
        });
        assert!(ApprovalToken::issue(&PrivateKeySigner::random(), &send, 1, 1).is_err());
        assert!(ApprovalToken::from_signed_message(&bucket("photos")).is_err());

        let mut send = send;
        let token = ApprovalToken {
            action: ApprovalAction::CreateBucket,
            digest: send.approval_digest().unwrap(),
            approval: Approval::default(),
        };
        let err = token.attach(&mut send).unwrap_err();
        assert_matches!(err, TxError::ApprovalMismatch(reason) if reason == "Send does not take an approval");
    }
}
