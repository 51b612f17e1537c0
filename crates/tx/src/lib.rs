//! Chain message construction, self-validation and envelope signing.
//!
//! - [`TxMessage`] - One chain-level intent, validated by [`TxMessage::validate_basic`]
//! - [`MessageBuilder`] - Per-action constructors that apply the defaulting policy
//! - [`TxEnvelope`] - An ordered, validated batch of messages plus broadcast options
//! - [`SignedTx`] - A signed envelope ready for the broadcaster
//! - [`ApprovalToken`] - A storage-provider attestation bound to one message
//!
//! # Signing
//!
//! The sign document (chain id, account number, sequence, fee, memo and the
//! ordered messages) is serialized to JSON, hashed with keccak-256 and signed
//! with the account's secp256k1 key:
//!
//! ```ignore
//! let envelope = TxEnvelope::new(messages, &opts)?;
//! let signed = envelope.sign(&signer, &SignerData { chain_id, account_number, sequence })?;
//! ```

mod approval;
mod builder;
mod envelope;
mod error;
pub mod msg;

pub use approval::{ApprovalAction, ApprovalToken};
pub use builder::{
    CreateBucketOptions, CreateGroupOptions, CreateObjectOptions, CreateStorageProviderParams,
    MessageBuilder, TransferDetail,
};
pub use envelope::{AuthInfo, Fee, SignedTx, SignerData, TxBody, TxEnvelope, TxOptions};
pub use error::TxError;
pub use msg::TxMessage;

/// Signer used for chain account keys.
pub type AccountSigner = alloy_signer_local::PrivateKeySigner;
