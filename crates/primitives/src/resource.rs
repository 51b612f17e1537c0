//! Global resource names (GRN).
//!
//! Chain messages that target a resource generically (tags, policies) refer to
//! it by GRN:
//!
//! ```text
//! grn:b::<bucket>
//! grn:o::<bucket>/<object>
//! grn:g:<owner>::<group>
//! ```

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A fully qualified reference to a bucket, object or group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grn {
    /// A bucket by name.
    Bucket { bucket: String },
    /// An object within a bucket.
    Object { bucket: String, object: String },
    /// A group, scoped by its owner.
    Group { owner: Address, group: String },
}

/// Failure to parse a GRN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource name {0:?}")]
pub struct GrnError(pub String);

impl Grn {
    /// GRN of a bucket.
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::Bucket { bucket: name.into() }
    }

    /// GRN of an object.
    pub fn object(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Object { bucket: bucket.into(), object: object.into() }
    }

    /// GRN of a group.
    pub fn group(owner: Address, group: impl Into<String>) -> Self {
        Self::Group { owner, group: group.into() }
    }
}

impl fmt::Display for Grn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket { bucket } => write!(f, "grn:b::{bucket}"),
            Self::Object { bucket, object } => write!(f, "grn:o::{bucket}/{object}"),
            Self::Group { owner, group } => write!(f, "grn:g:{owner}::{group}"),
        }
    }
}

impl FromStr for Grn {
    type Err = GrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || GrnError(s.to_string());
        if let Some(bucket) = s.strip_prefix("grn:b::") {
            if bucket.is_empty() {
                return Err(err());
            }
            return Ok(Self::bucket(bucket));
        }
        if let Some(rest) = s.strip_prefix("grn:o::") {
            let (bucket, object) = rest.split_once('/').ok_or_else(err)?;
            if bucket.is_empty() || object.is_empty() {
                return Err(err());
            }
            return Ok(Self::object(bucket, object));
        }
        if let Some(rest) = s.strip_prefix("grn:g:") {
            let (owner, group) = rest.split_once("::").ok_or_else(err)?;
            let owner = Address::from_str(owner).map_err(|_| err())?;
            if group.is_empty() {
                return Err(err());
            }
            return Ok(Self::group(owner, group));
        }
        Err(err())
    }
}

impl TryFrom<String> for Grn {
    type Error = GrnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grn> for String {
    fn from(grn: Grn) -> Self {
        grn.to_string()
    }
}
