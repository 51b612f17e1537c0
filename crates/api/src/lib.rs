//! Collaborator traits and shared types for the stowage client.
//!
//! The client talks to three external services, each behind a trait so
//! that tests can substitute recording stubs:
//!
//! - [`ChainQuery`] - Read chain state: accounts, providers, buckets, transactions
//! - [`ChainBroadcast`] - Submit signed transaction bytes
//! - [`ApprovalProvider`] - Obtain a storage-provider approval for one message
//!
//! Every public operation fails with a [`ClientError`]. Transaction
//! submissions report a three-way [`TxOutcome`].

mod error;
mod outcome;
mod traits;
mod types;

pub use error::{ChainError, ClientError, RemoteError, RemoteErrorKind};
pub use outcome::{TxOutcome, TxSubmission};
pub use traits::{ApprovalProvider, ChainBroadcast, ChainQuery};
pub use types::{
    BaseAccount, BroadcastResponse, BucketInfo, Proposal, ProposalStatus, ProviderStatus,
    StorageProviderInfo, TxEvent, TxInclusion,
};
