//! Storage operations served by a provider.

use alloy_primitives::Address;
use bytes::Bytes;
use serde::{Deserialize, de::DeserializeOwned};
use stowage_api::{ClientError, RemoteError, RemoteErrorKind};
use stowage_auth::UnsignedRequest;
use stowage_primitives::{
    TxHash,
    constants::{CONTENT_TYPE_DEFAULT, CONTENT_TYPE_XML, HEADER_RANGE, HEADER_TRANSACTION_HASH},
};
use url::{Url, form_urlencoded::byte_serialize};

use crate::{ErrorContext, SpClient};

/// One bucket in a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BucketEntry {
    pub bucket_name: String,
    pub owner: String,
    pub visibility: String,
    /// Unix seconds.
    pub create_at: i64,
    pub removed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListBucketsResult {
    buckets: Vec<BucketEntry>,
}

/// One object in a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ObjectEntry {
    pub object_name: String,
    pub bucket_name: String,
    pub owner: String,
    pub payload_size: u64,
    pub content_type: String,
    pub create_at: i64,
    pub removed: bool,
}

/// A page of objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListObjectsResult {
    /// Bucket name.
    pub name: String,
    pub objects: Vec<ObjectEntry>,
    pub common_prefixes: Vec<String>,
    pub key_count: u64,
    pub max_keys: u64,
    pub is_truncated: bool,
    /// Pass back as `continuation_token` to get the next page.
    pub next_continuation_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsOptions {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: Option<u64>,
    pub continuation_token: Option<String>,
}

/// Inclusive byte range. An open end reads to the end of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    fn header_value(&self) -> Result<String, ClientError> {
        match self.end {
            Some(end) if end < self.start => {
                Err(ClientError::InvalidArgument(format!("range end {end} before start {}", self.start)))
            }
            Some(end) => Ok(format!("bytes={}-{end}", self.start)),
            None => Ok(format!("bytes={}-", self.start)),
        }
    }
}

/// A downloaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContent {
    pub content_type: String,
    pub content: Bytes,
}

impl SpClient {
    /// Buckets owned by `account`.
    pub async fn list_buckets(
        &self,
        endpoint: &Url,
        account: Address,
        include_removed: bool,
    ) -> Result<Vec<BucketEntry>, ClientError> {
        let req = list_buckets_request(account, include_removed);
        let resp = self.send(endpoint, req, None, &ErrorContext::none()).await?;
        let result: ListBucketsResult = read_xml(resp).await?;
        Ok(result.buckets)
    }

    pub async fn list_objects(
        &self,
        endpoint: &Url,
        bucket: &str,
        opts: &ListObjectsOptions,
    ) -> Result<ListObjectsResult, ClientError> {
        let req = list_objects_request(bucket, opts)?;
        let resp = self.send(endpoint, req, None, &ErrorContext::bucket(bucket)).await?;
        read_xml(resp).await
    }

    pub async fn get_object(
        &self,
        endpoint: &Url,
        bucket: &str,
        object: &str,
        range: Option<ByteRange>,
    ) -> Result<ObjectContent, ClientError> {
        let req = get_object_request(bucket, object, range)?;
        let resp = self.send(endpoint, req, None, &ErrorContext::object(bucket, object)).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(CONTENT_TYPE_DEFAULT)
            .to_string();
        let content = resp.bytes().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(ObjectContent { content_type, content })
    }

    /// Upload the payload of an object whose creation `txn_hash` committed.
    pub async fn put_object(
        &self,
        endpoint: &Url,
        bucket: &str,
        object: &str,
        content: Bytes,
        content_type: Option<&str>,
        txn_hash: Option<TxHash>,
    ) -> Result<(), ClientError> {
        let req = put_object_request(bucket, object, &content, content_type, txn_hash)?;
        self.send(endpoint, req, Some(content), &ErrorContext::object(bucket, object)).await?;
        Ok(())
    }
}

fn list_buckets_request(account: Address, include_removed: bool) -> UnsignedRequest {
    UnsignedRequest::new("GET", "/")
        .query("include-removed", include_removed.to_string())
        .query("user-address", account.to_string())
}

fn list_objects_request(bucket: &str, opts: &ListObjectsOptions) -> Result<UnsignedRequest, ClientError> {
    let mut req = UnsignedRequest::new("GET", bucket_path(bucket)?);
    if let Some(prefix) = &opts.prefix {
        req = req.query("prefix", prefix.as_str());
    }
    if let Some(delimiter) = &opts.delimiter {
        req = req.query("delimiter", delimiter.as_str());
    }
    if let Some(max_keys) = opts.max_keys {
        req = req.query("max-keys", max_keys.to_string());
    }
    if let Some(token) = &opts.continuation_token {
        req = req.query("continuation-token", token.as_str());
    }
    Ok(req)
}

fn get_object_request(bucket: &str, object: &str, range: Option<ByteRange>) -> Result<UnsignedRequest, ClientError> {
    let mut req = UnsignedRequest::new("GET", object_path(bucket, object)?);
    if let Some(range) = range {
        req = req.header(HEADER_RANGE, range.header_value()?);
    }
    Ok(req)
}

fn put_object_request(
    bucket: &str,
    object: &str,
    content: &[u8],
    content_type: Option<&str>,
    txn_hash: Option<TxHash>,
) -> Result<UnsignedRequest, ClientError> {
    let mut req = UnsignedRequest::new("PUT", object_path(bucket, object)?)
        .body(content, content_type.unwrap_or(CONTENT_TYPE_DEFAULT));
    if let Some(hash) = txn_hash {
        req = req.header(HEADER_TRANSACTION_HASH, hex::encode(hash));
    }
    Ok(req)
}

/// Escape one path segment. Dot segments are refused: URLs drop them, so
/// the path sent would differ from the path signed.
fn escape(what: &str, segment: &str) -> Result<String, ClientError> {
    if segment == "." || segment == ".." {
        return Err(ClientError::InvalidArgument(format!("{what} must not contain '.' or '..' segments")));
    }
    Ok(byte_serialize(segment.as_bytes()).collect::<String>().replace('+', "%20"))
}

fn bucket_path(bucket: &str) -> Result<String, ClientError> {
    if bucket.is_empty() {
        return Err(ClientError::InvalidArgument("bucket name is empty".into()));
    }
    Ok(format!("/{}", escape("bucket name", bucket)?))
}

fn object_path(bucket: &str, object: &str) -> Result<String, ClientError> {
    if object.is_empty() {
        return Err(ClientError::InvalidArgument("object name is empty".into()));
    }
    let segments = object.split('/').map(|s| escape("object name", s)).collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}/{}", bucket_path(bucket)?, segments.join("/")))
}

async fn read_xml<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status().as_u16();
    let text = resp.text().await.map_err(|e| ClientError::Transport(e.to_string()))?;
    parse_xml(status, &text)
}

fn parse_xml<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, ClientError> {
    quick_xml::de::from_str(text).map_err(|e| {
        RemoteError {
            status,
            kind: RemoteErrorKind::Unknown,
            code: "MalformedResponse".into(),
            message: format!("expected {CONTENT_TYPE_XML}: {e}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_bucket_listing() {
        let xml = r#"<ListBucketsResult>
            <Buckets><BucketName>photos</BucketName><Owner>0xabc</Owner><Visibility>VISIBILITY_TYPE_PRIVATE</Visibility><CreateAt>1700000000</CreateAt><Removed>false</Removed></Buckets>
            <Buckets><BucketName>old</BucketName><Removed>true</Removed></Buckets>
        </ListBucketsResult>"#;
        let result: ListBucketsResult = parse_xml(200, xml).unwrap();
        assert_eq!(result.buckets.len(), 2);
        assert_eq!(result.buckets[0].bucket_name, "photos");
        assert_eq!(result.buckets[0].create_at, 1_700_000_000);
        assert!(result.buckets[1].removed);

        let empty: ListBucketsResult = parse_xml(200, "<ListBucketsResult></ListBucketsResult>").unwrap();
        assert!(empty.buckets.is_empty());
    }

    #[test]
    fn parses_object_page() {
        let xml = r#"<ListObjectsResult>
            <Name>photos</Name>
            <Objects><ObjectName>2024/cat.png</ObjectName><PayloadSize>1024</PayloadSize><ContentType>image/png</ContentType></Objects>
            <CommonPrefixes>2024/trips/</CommonPrefixes>
            <KeyCount>1</KeyCount><MaxKeys>50</MaxKeys><IsTruncated>true</IsTruncated>
            <NextContinuationToken>abc</NextContinuationToken>
        </ListObjectsResult>"#;
        let page: ListObjectsResult = parse_xml(200, xml).unwrap();
        assert_eq!(page.name, "photos");
        assert_eq!(page.objects[0].payload_size, 1024);
        assert_eq!(page.common_prefixes, vec!["2024/trips/".to_string()]);
        assert!(page.is_truncated);
        assert_eq!(page.next_continuation_token, "abc");
    }

    #[test]
    fn malformed_listing_is_a_remote_error() {
        let err = parse_xml::<ListObjectsResult>(200, "{\"json\": true}").unwrap_err();
        assert_matches!(err, ClientError::Remote(RemoteError { code, .. }) if code == "MalformedResponse");
    }

    #[test]
    fn object_paths_escape_each_segment() {
        assert_eq!(object_path("photos", "2024 trips/cat+dog.png").unwrap(), "/photos/2024%20trips/cat%2Bdog.png");
        assert_matches!(object_path("photos", ""), Err(ClientError::InvalidArgument(_)));
        assert_matches!(bucket_path(""), Err(ClientError::InvalidArgument(_)));
    }

    #[test]
    fn dot_segments_are_refused() {
        assert_matches!(get_object_request("photos", "a/./b", None), Err(ClientError::InvalidArgument(_)));
        assert_matches!(get_object_request("photos", "a/../b", None), Err(ClientError::InvalidArgument(_)));
        assert_matches!(list_objects_request("..", &ListObjectsOptions::default()), Err(ClientError::InvalidArgument(_)));
        assert_eq!(object_path("photos", "a/.hidden/..b").unwrap(), "/photos/a/.hidden/..b");
    }

    #[test]
    fn list_objects_only_sends_given_options() {
        let opts = ListObjectsOptions { prefix: Some("2024/".into()), max_keys: Some(10), ..Default::default() };
        let req = list_objects_request("photos", &opts).unwrap();
        assert_eq!(req.path, "/photos");
        assert_eq!(
            req.query,
            vec![("prefix".to_string(), "2024/".to_string()), ("max-keys".to_string(), "10".to_string())]
        );
    }

    #[test]
    fn ranges() {
        let req = get_object_request("b", "o", Some(ByteRange { start: 10, end: Some(19) })).unwrap();
        assert_eq!(req.headers, vec![(HEADER_RANGE.to_string(), "bytes=10-19".to_string())]);
        let open = ByteRange { start: 5, end: None }.header_value().unwrap();
        assert_eq!(open, "bytes=5-");
        assert_matches!(ByteRange { start: 5, end: Some(4) }.header_value(), Err(ClientError::InvalidArgument(_)));
    }

    #[test]
    fn put_hashes_body_and_names_creation_tx() {
        let hash = TxHash::repeat_byte(0xab);
        let req = put_object_request("b", "o", b"hello", None, Some(hash)).unwrap();
        assert_eq!(req.method, "PUT");
        assert_eq!(req.content_sha256, stowage_auth::content_sha256(b"hello"));
        assert_eq!(req.content_type, CONTENT_TYPE_DEFAULT);
        assert_eq!(req.headers, vec![(HEADER_TRANSACTION_HASH.to_string(), "ab".repeat(32))]);
    }

    #[test]
    fn bucket_listing_names_the_account() {
        let req = list_buckets_request(Address::repeat_byte(1), true);
        assert!(req.query.contains(&("include-removed".to_string(), "true".to_string())));
    }
}
