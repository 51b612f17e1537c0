//! Group lifecycle messages.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::validate;
use crate::TxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroup {
    pub creator: Address,
    pub group_name: String,
    pub extra: String,
}

impl CreateGroup {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::group_name(&self.group_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteGroup {
    pub operator: Address,
    pub group_name: String,
}

impl DeleteGroup {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::group_name(&self.group_name)
    }
}

/// A member to add, with an optional expiration (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberToAdd {
    pub member: Address,
    pub expiration_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGroupMember {
    pub operator: Address,
    pub group_owner: Address,
    pub group_name: String,
    pub members_to_add: Vec<MemberToAdd>,
    pub members_to_delete: Vec<Address>,
}

impl UpdateGroupMember {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::group_name(&self.group_name)?;
        if self.members_to_add.is_empty() && self.members_to_delete.is_empty() {
            return Err(TxError::field("members", "no members to add or delete"));
        }
        let removed: HashSet<_> = self.members_to_delete.iter().collect();
        if let Some(both) = self.members_to_add.iter().find(|m| removed.contains(&m.member)) {
            return Err(TxError::field(
                "members",
                format!("{} is both added and deleted", both.member),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGroup {
    pub member: Address,
    pub group_owner: Address,
    pub group_name: String,
}

impl LeaveGroup {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::group_name(&self.group_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_requires_a_change_and_no_overlap() {
        let member = Address::repeat_byte(9);
        let mut msg = UpdateGroupMember {
            operator: Address::repeat_byte(1),
            group_owner: Address::repeat_byte(1),
            group_name: "editors".into(),
            members_to_add: vec![],
            members_to_delete: vec![],
        };
        assert!(msg.validate_basic().is_err());

        msg.members_to_add.push(MemberToAdd { member, expiration_time: None });
        assert!(msg.validate_basic().is_ok());

        msg.members_to_delete.push(member);
        assert!(msg.validate_basic().is_err());
    }
}
