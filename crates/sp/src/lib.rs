//! Storage-provider HTTP layer.
//!
//! [`SpClient`] signs each request with the configured strategy, sends
//! exactly what was signed, and turns non-2xx answers into classified
//! [`RemoteError`](stowage_api::RemoteError)s via [`classify`].
//! [`SpApprovalClient`] implements the approval collaborator used by the
//! dependency resolver.

mod approval;
mod classify;
mod dispatch;
mod endpoint;
mod metrics;
mod ops;

pub use approval::SpApprovalClient;
pub use classify::{ErrorContext, classify};
pub use dispatch::SpClient;
pub use endpoint::{EndpointSelection, parse_endpoint, select_endpoint};
pub use ops::{BucketEntry, ByteRange, ListObjectsOptions, ListObjectsResult, ObjectContent, ObjectEntry};
