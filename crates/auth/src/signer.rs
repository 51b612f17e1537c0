//! Signing strategies and the signed request.

use std::time::Duration;

use alloy_primitives::{Address, B256, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use chrono::{DateTime, SecondsFormat, Utc};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _};
use stowage_primitives::constants::{
    DEFAULT_EXPIRE_SECONDS, HEADER_APP_DOMAIN, HEADER_AUTHORIZATION, HEADER_CONTENT_SHA256,
    HEADER_CONTENT_TYPE, HEADER_DATE, HEADER_EXPIRY_TIMESTAMP, HEADER_USER_ADDRESS, HEADER_USER_AGENT,
    user_agent,
};
use tracing::trace;

use crate::{
    AuthError, UnsignedRequest,
    canonical::{canonical_headers, canonical_string, query_string, sorted_query},
};

const ECDSA_SCHEME: &str = "GNFD1-ECDSA";
const EDDSA_SCHEME: &str = "GNFD1-EDDSA";

/// How requests are signed. Chosen per client, not per request.
#[derive(Debug, Clone)]
pub enum SigningStrategy {
    /// Sign with the chain account key.
    AccountKey(PrivateKeySigner),
    /// Sign with an ed25519 key registered for `domain` on behalf of `user_address`.
    OffChainKey { key: SigningKey, domain: String, user_address: Address },
}

impl SigningStrategy {
    /// Off-chain strategy from a hex-encoded 32-byte seed.
    pub fn off_chain_from_seed_hex(seed: &str, domain: &str, user_address: Address) -> Result<Self, AuthError> {
        let bytes = hex::decode(seed.trim_start_matches("0x")).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        let seed: [u8; 32] =
            bytes.try_into().map_err(|_| AuthError::InvalidKey("off-chain seed must be 32 bytes".into()))?;
        Ok(Self::OffChainKey { key: SigningKey::from_bytes(&seed), domain: domain.to_string(), user_address })
    }

    /// Address the provider attributes requests to.
    pub fn user_address(&self) -> Address {
        match self {
            Self::AccountKey(key) => key.address(),
            Self::OffChainKey { user_address, .. } => *user_address,
        }
    }

    fn app_domain(&self) -> Option<&str> {
        match self {
            Self::AccountKey(_) => None,
            Self::OffChainKey { domain, .. } => Some(domain),
        }
    }

    /// The single dispatch point producing an authorization value.
    fn authorize(&self, digest: &B256) -> Result<String, AuthError> {
        match self {
            Self::AccountKey(key) => {
                let sig = key.sign_hash_sync(digest).map_err(|e| AuthError::Signing(e.to_string()))?;
                Ok(format!("{ECDSA_SCHEME}, Signature={}", hex::encode(sig.as_bytes())))
            }
            Self::OffChainKey { key, .. } => {
                let sig = key.sign(digest.as_slice());
                Ok(format!("{EDDSA_SCHEME}, Signature={}", hex::encode(sig.to_bytes())))
            }
        }
    }
}

/// Produces [`SignedRequest`]s with a configured strategy.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    strategy: Option<SigningStrategy>,
    expiry: Duration,
}

impl RequestSigner {
    pub fn new(strategy: Option<SigningStrategy>) -> Self {
        Self { strategy, expiry: Duration::from_secs(DEFAULT_EXPIRE_SECONDS) }
    }

    /// Validity window advertised in `X-Gnfd-Expiry-Timestamp`.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn strategy(&self) -> Option<&SigningStrategy> {
        self.strategy.as_ref()
    }

    pub fn sign(&self, req: UnsignedRequest) -> Result<SignedRequest, AuthError> {
        self.sign_at(req, Utc::now())
    }

    /// Sign with an explicit timestamp.
    pub fn sign_at(&self, req: UnsignedRequest, now: DateTime<Utc>) -> Result<SignedRequest, AuthError> {
        let strategy = self.strategy.as_ref().ok_or(AuthError::MissingIdentity)?;
        let expiry = chrono::Duration::from_std(self.expiry).map_err(|e| AuthError::Signing(e.to_string()))?;

        let mut headers = req.headers;
        headers.push((HEADER_CONTENT_SHA256.to_string(), req.content_sha256));
        headers.push((HEADER_CONTENT_TYPE.to_string(), req.content_type));
        headers.push((HEADER_DATE.to_string(), now.to_rfc3339_opts(SecondsFormat::Secs, true)));
        headers.push((
            HEADER_EXPIRY_TIMESTAMP.to_string(),
            (now + expiry).to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        headers.push((HEADER_USER_ADDRESS.to_string(), strategy.user_address().to_string()));
        if let Some(domain) = strategy.app_domain() {
            headers.push((HEADER_APP_DOMAIN.to_string(), domain.to_string()));
        }

        // last step: nothing below may change what was signed
        let query = sorted_query(&req.query);
        let headers = canonical_headers(&headers);
        let (canonical, digest) = canonical_string(&req.method, &req.path, &query, &headers);
        let authorization = strategy.authorize(&digest)?;
        trace!(%canonical, "signed storage-provider request");

        Ok(SignedRequest { method: req.method, path: req.path, query, headers, authorization, canonical, digest })
    }
}

/// A request plus its authentication headers, ready to dispatch.
///
/// `query` and `headers` are in the order they were signed in and must be
/// sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Signed headers, lowercased and sorted.
    pub headers: Vec<(String, String)>,
    pub authorization: String,
    pub canonical: String,
    pub digest: B256,
}

impl SignedRequest {
    /// Every header to send, including authorization and user agent.
    pub fn header_set(&self) -> Vec<(String, String)> {
        let mut all = self.headers.clone();
        all.push((HEADER_AUTHORIZATION.to_string(), self.authorization.clone()));
        all.push((HEADER_USER_AGENT.to_string(), user_agent()));
        all
    }

    /// Encoded query in signing order.
    pub fn query_string(&self) -> String {
        query_string(&self.query)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    fn signature_hex(&self, scheme: &str) -> Result<&str, AuthError> {
        self.authorization
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix(", Signature="))
            .ok_or_else(|| AuthError::InvalidSignature(format!("expected {scheme} authorization")))
    }

    /// Recover the signer of an account-key request.
    pub fn recover_account(&self) -> Result<Address, AuthError> {
        let bytes = hex::decode(self.signature_hex(ECDSA_SCHEME)?)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        let sig = Signature::try_from(bytes.as_slice()).map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        sig.recover_address_from_prehash(&self.digest).map_err(|e| AuthError::InvalidSignature(e.to_string()))
    }

    /// Verify an off-chain request against the registered public key.
    pub fn verify_off_chain(&self, key: &ed25519_dalek::VerifyingKey) -> Result<(), AuthError> {
        let bytes = hex::decode(self.signature_hex(EDDSA_SCHEME)?)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        let sig = ed25519_dalek::Signature::from_slice(&bytes).map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        key.verify(self.digest.as_slice(), &sig).map_err(|e| AuthError::InvalidSignature(e.to_string()))
    }
}
