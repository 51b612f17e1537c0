//! Shared field validators.

use alloy_primitives::U256;

use crate::TxError;

pub(crate) const MIN_BUCKET_NAME_LEN: usize = 3;
pub(crate) const MAX_BUCKET_NAME_LEN: usize = 63;
pub(crate) const MAX_OBJECT_NAME_LEN: usize = 1024;
pub(crate) const MAX_GROUP_NAME_LEN: usize = 63;
pub(crate) const MAX_TAGS: usize = 4;
pub(crate) const MAX_TAG_KEY_LEN: usize = 32;
pub(crate) const MAX_TAG_VALUE_LEN: usize = 64;

pub(crate) fn bucket_name(name: &str) -> Result<(), TxError> {
    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(TxError::field(
            "bucket_name",
            format!("length must be {MIN_BUCKET_NAME_LEN}..={MAX_BUCKET_NAME_LEN}, got {len}"),
        ));
    }
    if !name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
        return Err(TxError::field(
            "bucket_name",
            "only lowercase letters, digits and '-' are allowed",
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(TxError::field("bucket_name", "must start and end with a letter or digit"));
    }
    Ok(())
}

pub(crate) fn object_name(name: &str) -> Result<(), TxError> {
    if name.is_empty() || name.len() > MAX_OBJECT_NAME_LEN {
        return Err(TxError::field(
            "object_name",
            format!("length must be 1..={MAX_OBJECT_NAME_LEN}, got {}", name.len()),
        ));
    }
    if name.starts_with('/') || name.contains('\\') {
        return Err(TxError::field("object_name", "must not start with '/' or contain '\\'"));
    }
    if name.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(TxError::field("object_name", "must not contain '.' or '..' segments"));
    }
    Ok(())
}

pub(crate) fn group_name(name: &str) -> Result<(), TxError> {
    if name.is_empty() || name.len() > MAX_GROUP_NAME_LEN {
        return Err(TxError::field(
            "group_name",
            format!("length must be 1..={MAX_GROUP_NAME_LEN}, got {}", name.len()),
        ));
    }
    Ok(())
}

pub(crate) fn positive_amount(field: &'static str, amount: &U256) -> Result<(), TxError> {
    if amount.is_zero() {
        return Err(TxError::field(field, "amount must be positive"));
    }
    Ok(())
}

pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<(), TxError> {
    if value.trim().is_empty() {
        return Err(TxError::field(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names() {
        for ok in ["abc", "my-bucket-01", "a1b"] {
            assert!(bucket_name(ok).is_ok(), "{ok}");
        }
        let long = "a".repeat(64);
        for bad in ["ab", "-abc", "abc-", "ABC", "a_b_c", "a.b.c", long.as_str()] {
            assert!(bucket_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn object_names() {
        assert!(object_name("dir/file.txt").is_ok());
        assert!(object_name("").is_err());
        assert!(object_name("/abs").is_err());
        assert!(object_name("a/../b").is_err());
        assert!(object_name("a/./b").is_err());
        assert!(object_name("a/.hidden").is_ok());
        assert!(object_name("a\\b").is_err());
    }
}
