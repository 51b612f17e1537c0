//! Stowage client.
//!
//! [`Client`] ties the pieces together. A chain action goes through the
//! message builder, the placement resolver, envelope signing with a freshly
//! read account sequence, and the broadcaster:
//!
//! ```ignore
//! let client = Client::new(ClientConfig::from_args(&chain, &tx, &auth, &sp)?)?;
//! let submission = client.create_bucket("photos", &sp_operator, &CreateBucketOptions::default()).await?;
//! match submission.outcome {
//!     Some(TxOutcome::Confirmed(_)) => {}
//!     Some(TxOutcome::Failed(inclusion)) => { /* definite failure */ }
//!     Some(TxOutcome::Unconfirmed) => { /* check `submission.hash` later */ }
//!     None => { /* asynchronous mode */ }
//! }
//! ```
//!
//! Storage operations pick a provider endpoint and send signed requests;
//! failures come back as classified [`RemoteError`]s.

mod args;
mod client;
mod config;

pub use args::{AuthArgs, ChainArgs, DEFAULT_CHAIN_ID, DEFAULT_CHAIN_REST, SpArgs, TxArgs};
pub use client::Client;
pub use config::ClientConfig;

pub use stowage_api::{ClientError, RemoteError, RemoteErrorKind, TxOutcome, TxSubmission};
pub use stowage_chain::FallbackPolicy;
pub use stowage_primitives::{BroadcastMode, CancelHandle, CancelToken, TxHash, Visibility, cancel_pair};
pub use stowage_sp::{BucketEntry, ByteRange, EndpointSelection, ListObjectsOptions, ListObjectsResult, ObjectContent};
pub use stowage_tx::{
    CreateBucketOptions, CreateGroupOptions, CreateObjectOptions, CreateStorageProviderParams, TransferDetail,
    TxOptions, msg::Tag,
};
