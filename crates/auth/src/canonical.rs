//! Canonical request form.

use alloy_primitives::{B256, keccak256};
use sha2::{Digest, Sha256};
use url::form_urlencoded::byte_serialize;

/// Hex sha256 of a request body.
pub fn content_sha256(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// A request before authentication headers are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRequest {
    pub method: String,
    /// Path starting with `/`, already escaped.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Hex sha256 of the body.
    pub content_sha256: String,
    pub content_type: String,
    /// Extra headers to sign and send, such as `Range`.
    pub headers: Vec<(String, String)>,
}

impl UnsignedRequest {
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.into(),
            query: Vec::new(),
            content_sha256: content_sha256(&[]),
            content_type: stowage_primitives::constants::CONTENT_TYPE_DEFAULT.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: &[u8], content_type: impl Into<String>) -> Self {
        self.content_sha256 = content_sha256(body);
        self.content_type = content_type.into();
        self
    }
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Query sorted by key then value, so the sent order matches the signed one.
pub(crate) fn sorted_query(query: &[(String, String)]) -> Vec<(String, String)> {
    let mut sorted = query.to_vec();
    sorted.sort();
    sorted
}

pub(crate) fn query_string(sorted: &[(String, String)]) -> String {
    sorted.iter().map(|(k, v)| format!("{}={}", encode(k), encode(v))).collect::<Vec<_>>().join("&")
}

/// Headers lowercased, trimmed and sorted by name.
pub(crate) fn canonical_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    let mut out: Vec<_> =
        headers.iter().map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string())).collect();
    out.sort();
    out
}

/// The string both strategies sign, and its keccak digest.
pub(crate) fn canonical_string(
    method: &str,
    path: &str,
    sorted_query: &[(String, String)],
    canonical_headers: &[(String, String)],
) -> (String, B256) {
    let header_block: String = canonical_headers.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
    let signed: Vec<&str> = canonical_headers.iter().map(|(k, _)| k.as_str()).collect();
    let canonical = format!(
        "{method}\n{path}\n{}\n{header_block}\n{}",
        query_string(sorted_query),
        signed.join(";")
    );
    let digest = keccak256(canonical.as_bytes());
    (canonical, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_hash() {
        assert_eq!(content_sha256(&[]), stowage_primitives::constants::EMPTY_STRING_SHA256);
    }

    #[test]
    fn query_is_sorted_and_encoded() {
        let sorted = sorted_query(&[("prefix".into(), "a b/c".into()), ("delimiter".into(), "/".into())]);
        assert_eq!(query_string(&sorted), "delimiter=%2F&prefix=a%20b%2Fc");
    }

    #[test]
    fn canonical_layout() {
        let headers = canonical_headers(&[
            ("X-Gnfd-Date".into(), " 2024-01-01T00:00:00Z ".into()),
            ("Content-Type".into(), "application/xml".into()),
        ]);
        let (canonical, _) = canonical_string("GET", "/photos", &[], &headers);
        assert_eq!(
            canonical,
            "GET\n/photos\n\ncontent-type:application/xml\nx-gnfd-date:2024-01-01T00:00:00Z\n\ncontent-type;x-gnfd-date"
        );
    }
}
