//! Chain-side transaction lifecycle.
//!
//! - [`PlacementResolver`] - Fills in chain-state dependent message fields,
//!   falling back to a storage-provider approval when the direct query fails
//! - [`TxBroadcaster`] - Submits a signed envelope and polls for inclusion
//!   under a deadline
//! - [`RestChainClient`] - [`ChainQuery`](stowage_api::ChainQuery) and
//!   [`ChainBroadcast`](stowage_api::ChainBroadcast) over the node's REST gateway

mod broadcaster;
mod metrics;
mod resolver;
mod rest;

pub use broadcaster::TxBroadcaster;
pub use resolver::{FallbackPolicy, PlacementResolver};
pub use rest::RestChainClient;
