//! Classification of storage-provider error responses.
//!
//! A provider is expected to answer failures with an XML envelope:
//!
//! ```xml
//! <Error><Code>NoSuchBucket</Code><Message>...</Message></Error>
//! ```
//!
//! Not every provider does, so when the body does not parse the kind is
//! inferred from the status and from what the request was about.

use serde::Deserialize;
use stowage_api::{RemoteError, RemoteErrorKind};
use stowage_primitives::constants::MAX_ERROR_BODY_SIZE;

const UNKNOWN_CODE: &str = "unknown error";
const INTERNAL_CODE: &str = "InternalError";

/// What the failed request referred to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub bucket: Option<String>,
    pub object: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn bucket(bucket: &str) -> Self {
        Self { bucket: Some(bucket.to_string()), object: None }
    }

    pub fn object(bucket: &str, object: &str) -> Self {
        Self { bucket: Some(bucket.to_string()), object: Some(object.to_string()) }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Classify a response. `None` for any 2xx status, whatever the body.
pub fn classify(status: u16, body: &[u8], ctx: &ErrorContext) -> Option<RemoteError> {
    if (200..300).contains(&status) {
        return None;
    }

    if let Some(envelope) = parse_envelope(body) {
        return Some(RemoteError {
            status,
            kind: RemoteErrorKind::from_code(&envelope.code),
            code: envelope.code,
            message: envelope.message,
        });
    }

    let inferred = |kind: RemoteErrorKind, message: &str| RemoteError {
        status,
        kind,
        code: kind.to_string(),
        message: message.to_string(),
    };
    let err = match (status, ctx.bucket.is_some(), ctx.object.is_some()) {
        (404, true, false) => inferred(RemoteErrorKind::NoSuchBucket, "The specified bucket does not exist."),
        (404, true, true) => inferred(RemoteErrorKind::NoSuchObject, "The specified object does not exist."),
        (403, _, _) => inferred(RemoteErrorKind::AccessDenied, "no permission to access the resource"),
        _ => {
            let trimmed = String::from_utf8_lossy(body).trim().to_string();
            RemoteError {
                status,
                kind: RemoteErrorKind::Unknown,
                code: UNKNOWN_CODE.to_string(),
                message: if trimmed.is_empty() { UNKNOWN_CODE.to_string() } else { trimmed },
            }
        }
    };
    Some(err)
}

fn parse_envelope(body: &[u8]) -> Option<ErrorEnvelope> {
    let text = std::str::from_utf8(body).ok()?;
    if !text.contains("<Error>") {
        return None;
    }
    quick_xml::de::from_str(text).ok()
}

/// Error for a body that could not be read at all.
pub(crate) fn unreadable(status: u16, reason: &str) -> RemoteError {
    RemoteError {
        status,
        kind: RemoteErrorKind::Unknown,
        code: INTERNAL_CODE.to_string(),
        message: reason.to_string(),
    }
}

/// Read at most [`MAX_ERROR_BODY_SIZE`] bytes of `resp`.
pub(crate) async fn read_capped(mut resp: reqwest::Response) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = MAX_ERROR_BODY_SIZE.saturating_sub(body.len());
        body.extend(chunk.iter().take(room));
        if body.len() >= MAX_ERROR_BODY_SIZE {
            break;
        }
    }
    Ok(body)
}
