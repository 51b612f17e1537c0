//! Storage-provider request authentication.
//!
//! Every request to a storage provider carries a signature over a canonical
//! form of the request. Two strategies produce it:
//!
//! - [`SigningStrategy::AccountKey`] - The chain account's secp256k1 key
//!   (`GNFD1-ECDSA`)
//! - [`SigningStrategy::OffChainKey`] - An ed25519 key registered with the
//!   provider ahead of time for an app domain (`GNFD1-EDDSA`)
//!
//! The canonical string is computed from the final header set and query
//! order, and the [`SignedRequest`] carries exactly what must be sent.

mod canonical;
mod error;
mod signer;

pub use canonical::{UnsignedRequest, content_sha256};
pub use error::AuthError;
pub use signer::{RequestSigner, SignedRequest, SigningStrategy};
