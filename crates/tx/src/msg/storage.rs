//! Bucket, object and tag messages.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use stowage_primitives::{Grn, Visibility};

use super::validate::{self, MAX_TAG_KEY_LEN, MAX_TAG_VALUE_LEN, MAX_TAGS};
use crate::TxError;

/// Storage-provider approval embedded in bucket and object creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Block height after which the approval is no longer accepted.
    pub expired_height: u64,
    /// Placement group the bucket joins. Unused for objects.
    pub global_virtual_group_family_id: u32,
    /// Provider signature over the approved message.
    pub sig: Bytes,
}

/// A key/value tag on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucket {
    pub creator: Address,
    pub bucket_name: String,
    pub visibility: Visibility,
    pub payment_address: Address,
    pub primary_sp_address: Address,
    pub primary_sp_approval: Approval,
    pub charged_read_quota: u64,
}

impl CreateBucket {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::bucket_name(&self.bucket_name)?;
        if self.primary_sp_address.is_zero() {
            return Err(TxError::field("primary_sp_address", "must be set"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBucket {
    pub operator: Address,
    pub bucket_name: String,
}

impl DeleteBucket {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::bucket_name(&self.bucket_name)
    }
}

/// Data redundancy scheme for a new object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundancyType {
    #[default]
    ErasureCoding,
    Replica,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateObject {
    pub creator: Address,
    pub bucket_name: String,
    pub object_name: String,
    pub payload_size: u64,
    pub visibility: Visibility,
    pub content_type: String,
    pub primary_sp_approval: Approval,
    /// One 32-byte checksum for the primary segment plus one per redundancy piece.
    pub expect_checksums: Vec<Bytes>,
    pub redundancy_type: RedundancyType,
}

impl CreateObject {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::bucket_name(&self.bucket_name)?;
        validate::object_name(&self.object_name)?;
        validate::non_empty("content_type", &self.content_type)?;
        if self.expect_checksums.is_empty() {
            return Err(TxError::field("expect_checksums", "at least one checksum is required"));
        }
        if let Some(bad) = self.expect_checksums.iter().find(|c| c.len() != 32) {
            return Err(TxError::field(
                "expect_checksums",
                format!("checksum must be 32 bytes, got {}", bad.len()),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteObject {
    pub operator: Address,
    pub bucket_name: String,
    pub object_name: String,
}

impl DeleteObject {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::bucket_name(&self.bucket_name)?;
        validate::object_name(&self.object_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTag {
    pub operator: Address,
    pub resource: Grn,
    pub tags: Vec<Tag>,
}

impl SetTag {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        if self.tags.len() > MAX_TAGS {
            return Err(TxError::field(
                "tags",
                format!("at most {MAX_TAGS} tags, got {}", self.tags.len()),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for tag in &self.tags {
            validate::non_empty("tags.key", &tag.key)?;
            if tag.key.len() > MAX_TAG_KEY_LEN || tag.value.len() > MAX_TAG_VALUE_LEN {
                return Err(TxError::field(
                    "tags",
                    format!("tag {:?} exceeds {MAX_TAG_KEY_LEN}/{MAX_TAG_VALUE_LEN} byte limits", tag.key),
                ));
            }
            if !seen.insert(tag.key.as_str()) {
                return Err(TxError::field("tags", format!("duplicate key {:?}", tag.key)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> CreateObject {
        CreateObject {
            creator: Address::repeat_byte(1),
            bucket_name: "photos".into(),
            object_name: "cat.png".into(),
            payload_size: 10,
            visibility: Visibility::Inherit,
            content_type: "image/png".into(),
            primary_sp_approval: Approval::default(),
            expect_checksums: vec![Bytes::from(vec![0u8; 32])],
            redundancy_type: RedundancyType::ErasureCoding,
        }
    }

    #[test]
    fn object_checksums_must_be_32_bytes() {
        assert!(object().validate_basic().is_ok());

        let mut bad = object();
        bad.expect_checksums = vec![Bytes::from(vec![0u8; 31])];
        assert!(bad.validate_basic().is_err());

        bad.expect_checksums.clear();
        assert!(bad.validate_basic().is_err());
    }

    #[test]
    fn tags_are_bounded_and_unique() {
        let mut msg = SetTag {
            operator: Address::repeat_byte(1),
            resource: Grn::bucket("photos"),
            tags: vec![Tag::new("env", "prod"), Tag::new("team", "infra")],
        };
        assert!(msg.validate_basic().is_ok());

        msg.tags.push(Tag::new("env", "dev"));
        assert!(msg.validate_basic().is_err());

        msg.tags = (0..5).map(|i| Tag::new(format!("k{i}"), "v")).collect();
        assert!(msg.validate_basic().is_err());
    }
}
