//! Test utilities for stowage crates.
//!
//! - [`StubChain`] - Scripted [`ChainQuery`](stowage_api::ChainQuery) and
//!   [`ChainBroadcast`](stowage_api::ChainBroadcast) with call counters
//! - [`StubApprovals`] - An [`ApprovalProvider`](stowage_api::ApprovalProvider)
//!   holding a real approval key

mod approvals;
mod chain;

pub use approvals::StubApprovals;
pub use chain::{STUB_CHAIN_ID, StubChain};
