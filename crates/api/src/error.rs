//! The client error taxonomy.
//!
//! Component errors convert into [`ClientError`], which is what every public
//! operation returns. Variants carry typed data so callers can branch on the
//! kind of failure without matching on message text.

use stowage_primitives::{AddressError, TxHash};
use stowage_tx::TxError;

/// Failure of a chain query or broadcast transport call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The requested entity does not exist, or is not indexed yet.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node answered from state older than required.
    #[error("stale state: {0}")]
    StaleState(String),

    /// No usable answer reached us.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with an unexpected status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Trimmed response body.
        body: String,
    },

    /// The answer could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ChainError {
    /// Failures that mean "the chain does not know this yet".
    pub fn is_not_indexed(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::StaleState(_))
    }
}

/// Kind of a classified storage-provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::IntoStaticStr)]
pub enum RemoteErrorKind {
    NoSuchBucket,
    NoSuchObject,
    AccessDenied,
    Unknown,
}

impl RemoteErrorKind {
    /// Map a structured error code onto a kind.
    pub fn from_code(code: &str) -> Self {
        match code {
            "NoSuchBucket" | "BucketNotExist" => Self::NoSuchBucket,
            "NoSuchObject" | "NoSuchKey" | "ObjectNotExist" => Self::NoSuchObject,
            "AccessDenied" => Self::AccessDenied,
            _ => Self::Unknown,
        }
    }
}

/// A non-2xx answer from a storage provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("storage provider error {status} {code}: {message}")]
pub struct RemoteError {
    pub status: u16,
    pub kind: RemoteErrorKind,
    /// Machine code from the error envelope, or the kind name when inferred.
    pub code: String,
    pub message: String,
}

/// Every failure a public client operation can return.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed input, caught before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Both the direct query and the approval fallback failed.
    #[error(
        "resolving {step} failed: {source}{}",
        .fallback.as_ref().map(|f| format!(" (fallback: {f})")).unwrap_or_default()
    )]
    Resolution {
        /// Which dependency was being resolved.
        step: &'static str,
        /// The original direct-query failure.
        source: ChainError,
        /// The fallback failure, if the fallback was attempted.
        fallback: Option<Box<ClientError>>,
    },

    /// No usable signing identity.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The node refused the transaction before inclusion.
    #[error("broadcast rejected: code {code} ({codespace}): {log}")]
    BroadcastRejected {
        /// Result code.
        code: u32,
        /// Module that produced the code.
        codespace: String,
        /// Raw node log.
        log: String,
    },

    /// Included with a non-zero result code. Definite.
    #[error("transaction {hash} failed: code {code} ({codespace})")]
    DefiniteTxFailure {
        /// Transaction hash.
        hash: TxHash,
        /// Result code.
        code: u32,
        /// Module that produced the code.
        codespace: String,
    },

    /// Submitted, but inclusion was not observed before the deadline.
    ///
    /// Not a failure verdict: the transaction may still land. Poll again
    /// with the hash instead of resubmitting.
    #[error("transaction {hash} submitted but not yet confirmed; check later")]
    AmbiguousTimeout {
        /// Transaction hash.
        hash: TxHash,
    },

    /// A classified storage-provider error.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A chain query failed outside dependency resolution.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// The HTTP request failed before any response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Whether resubmitting the same call may succeed.
    ///
    /// Caller bugs and definite outcomes are never retryable. An ambiguous
    /// timeout is not retryable either; use [`Self::should_poll_again`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidArgument(_)
            | Self::Authentication(_)
            | Self::DefiniteTxFailure { .. }
            | Self::AmbiguousTimeout { .. } => false,
            Self::Resolution { .. } | Self::BroadcastRejected { .. } | Self::Transport(_) => true,
            Self::Chain(e) => !matches!(e, ChainError::Decode(_)),
            Self::Remote(e) => e.status >= 500,
        }
    }

    /// The transaction may still land; query it by hash later.
    pub fn should_poll_again(&self) -> bool {
        matches!(self, Self::AmbiguousTimeout { .. })
    }

    /// Kind of a remote error, for "create it if missing" style branching.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Self::Remote(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl From<TxError> for ClientError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Signing(reason) => Self::Authentication(reason),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

impl From<AddressError> for ClientError {
    fn from(err: AddressError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
