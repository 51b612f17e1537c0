//! Small enums shared by the message builder and the broadcaster.

use serde::{Deserialize, Serialize};

/// Read visibility of a bucket or object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Visibility {
    /// Anyone may read.
    PublicRead,
    /// Only the owner and explicitly granted principals may read.
    #[default]
    Private,
    /// Objects inherit the visibility of their bucket.
    Inherit,
}

/// Acknowledgement depth requested when submitting a transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BroadcastMode {
    /// Return once the node has run `CheckTx` (mempool acceptance).
    #[default]
    Sync,
    /// Return immediately, without waiting for `CheckTx`.
    Async,
    /// Return once the transaction is in a block.
    Block,
}

impl BroadcastMode {
    /// Wire name used by the chain's REST gateway.
    pub fn as_gateway_str(&self) -> &'static str {
        match self {
            Self::Sync => "BROADCAST_MODE_SYNC",
            Self::Async => "BROADCAST_MODE_ASYNC",
            Self::Block => "BROADCAST_MODE_BLOCK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults() {
        assert_eq!(Visibility::default(), Visibility::Private);
        assert_eq!(BroadcastMode::default(), BroadcastMode::Sync);
    }

    #[test]
    fn visibility_parses_cli_form() {
        assert_eq!(Visibility::from_str("public-read").unwrap(), Visibility::PublicRead);
        assert_eq!(Visibility::PublicRead.to_string(), "public-read");
    }
}
