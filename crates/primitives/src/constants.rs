//! Protocol constants: header names, defaults and limits.

use std::time::Duration;

/// Library name reported in the `User-Agent` header.
pub const LIB_NAME: &str = "stowage";

/// Library version reported in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_RANGE: &str = "Range";
pub const HEADER_CONTENT_SHA256: &str = "X-Gnfd-Content-Sha256";
pub const HEADER_DATE: &str = "X-Gnfd-Date";
pub const HEADER_EXPIRY_TIMESTAMP: &str = "X-Gnfd-Expiry-Timestamp";
pub const HEADER_USER_ADDRESS: &str = "X-Gnfd-User-Address";
pub const HEADER_APP_DOMAIN: &str = "X-Gnfd-App-Domain";
pub const HEADER_TRANSACTION_HASH: &str = "X-Gnfd-Txn-Hash";
pub const HEADER_UNSIGNED_MSG: &str = "X-Gnfd-Unsigned-Msg";
pub const HEADER_SIGNED_MSG: &str = "X-Gnfd-Signed-Msg";

pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_DEFAULT: &str = "application/octet-stream";

/// Hex-encoded SHA-256 of the empty string.
pub const EMPTY_STRING_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Path prefix of the storage-provider admin API (approvals).
pub const ADMIN_URL_PREFIX: &str = "/greenfield/admin/v1";

/// Default confirmation deadline after a synchronous broadcast.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between inclusion queries while confirming.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Validity window of a signed storage-provider request.
pub const DEFAULT_EXPIRE_SECONDS: u64 = 1000;

/// Default gas limit attached to an envelope when none is given.
pub const DEFAULT_GAS_LIMIT: u64 = 1_200_000;

/// Default gas price in the chain's base denomination.
pub const DEFAULT_GAS_PRICE: u64 = 5_000_000_000;

/// Base fee denomination.
pub const DEFAULT_DENOM: &str = "BNB";

/// Upper bound on an error body read from a storage provider.
pub const MAX_ERROR_BODY_SIZE: usize = 10 * 1024 * 1024;

/// `User-Agent` value sent with every storage-provider request.
pub fn user_agent() -> String {
    format!(
        "Stowage ({}; {}) {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        LIB_NAME,
        VERSION
    )
}
