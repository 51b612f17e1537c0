//! Error type for message construction and signing.

use stowage_primitives::{AddressError, GrnError};

/// Errors raised before anything reaches the network.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// A supplied address string could not be parsed.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// A supplied resource name could not be parsed.
    #[error(transparent)]
    Resource(#[from] GrnError),

    /// Self-validation rejected a field.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// An envelope must carry at least one message.
    #[error("transaction has no messages")]
    EmptyEnvelope,

    /// Messages in one envelope must share a signer.
    #[error("mixed signers in one transaction: {expected} and {found}")]
    MixedSigners {
        /// Signer of the first message.
        expected: alloy_primitives::Address,
        /// Conflicting signer.
        found: alloy_primitives::Address,
    },

    /// A chain-state dependent field was never filled in.
    #[error("unresolved dependency: {0}")]
    UnresolvedDependency(&'static str),

    /// An approval token does not belong to the message it is attached to.
    #[error("approval mismatch: {0}")]
    ApprovalMismatch(String),

    /// The signing key failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TxError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }
}
