//! Core primitive types for the Stowage storage-network client.
//!
//! This crate provides the small, dependency-light types used across the
//! stack, kept separate to avoid circular dependencies between the message
//! builder, the chain layer and the storage-provider layer.

mod address;
mod cancel;
pub mod constants;
mod resource;
mod types;

pub use address::{AddressError, parse_address, parse_optional_address};
pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use resource::{Grn, GrnError};
pub use types::{BroadcastMode, Visibility};

pub use alloy_primitives::{Address, B256, Bytes, U256};

/// Transaction hash as assigned by the chain at broadcast time.
pub type TxHash = B256;
