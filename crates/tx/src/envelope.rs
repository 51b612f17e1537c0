//! Broadcast-ready envelopes and their signed form.

use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, Signature, U256, keccak256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stowage_primitives::{
    BroadcastMode, CancelToken, TxHash,
    constants::{DEFAULT_DENOM, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_POLL_INTERVAL, DEFAULT_TX_TIMEOUT},
};

use crate::{TxError, TxMessage};

/// Per-call broadcast options.
#[derive(Debug, Clone)]
pub struct TxOptions {
    /// Acknowledgement depth requested from the chain node.
    pub mode: BroadcastMode,
    /// Return right after submission without waiting for inclusion.
    pub is_async: bool,
    /// Deadline for confirmation polling.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub memo: String,
    /// Caller-side cancellation, observed by the confirmation poller.
    pub cancel: Option<CancelToken>,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            mode: BroadcastMode::default(),
            is_async: false,
            timeout: DEFAULT_TX_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: U256::from(DEFAULT_GAS_PRICE),
            memo: String::new(),
            cancel: None,
        }
    }
}

impl TxOptions {
    /// Whether the broadcaster should poll for inclusion after submitting.
    pub fn waits_for_inclusion(&self) -> bool {
        !self.is_async && self.mode != BroadcastMode::Async
    }

    pub fn fee(&self) -> Fee {
        Fee {
            gas_limit: self.gas_limit,
            amount: self.gas_price.saturating_mul(U256::from(self.gas_limit)),
            denom: DEFAULT_DENOM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub gas_limit: u64,
    pub amount: U256,
    pub denom: String,
}

/// Account state the signature commits to. Read fresh before every signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// An ordered, validated batch of messages from a single signer.
#[derive(Debug, Clone)]
pub struct TxEnvelope {
    messages: Vec<TxMessage>,
    signer: Address,
    mode: BroadcastMode,
    fee: Fee,
    memo: String,
}

impl TxEnvelope {
    /// Validates every message and fixes the broadcast mode.
    ///
    /// Messages keep the order given; the chain applies them in that order.
    pub fn new(messages: Vec<TxMessage>, opts: &TxOptions) -> Result<Self, TxError> {
        let Some(first) = messages.first() else {
            return Err(TxError::EmptyEnvelope);
        };
        let signer = first.signer();
        for msg in &messages {
            msg.validate_basic()?;
            msg.check_resolved()?;
            if msg.signer() != signer {
                return Err(TxError::MixedSigners { expected: signer, found: msg.signer() });
            }
        }
        Ok(Self { messages, signer, mode: opts.mode, fee: opts.fee(), memo: opts.memo.clone() })
    }

    pub fn messages(&self) -> &[TxMessage] {
        &self.messages
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn mode(&self) -> BroadcastMode {
        self.mode
    }

    /// Sign with the account key. The key must belong to the envelope's signer.
    pub fn sign(&self, key: &PrivateKeySigner, data: &SignerData) -> Result<SignedTx, TxError> {
        if key.address() != self.signer {
            return Err(TxError::MixedSigners { expected: self.signer, found: key.address() });
        }
        let body = TxBody { messages: self.messages.clone(), memo: self.memo.clone() };
        let auth_info = AuthInfo { signer: self.signer, sequence: data.sequence, fee: self.fee.clone() };
        let hash = sign_doc_hash(&body, &auth_info, &data.chain_id, data.account_number)?;
        let sig = key.sign_hash_sync(&hash).map_err(|e| TxError::Signing(e.to_string()))?;
        Ok(SignedTx { body, auth_info, signature: Bytes::copy_from_slice(&sig.as_bytes()) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<TxMessage>,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer: Address,
    pub sequence: u64,
    pub fee: Fee,
}

#[derive(Serialize)]
struct SignDoc<'a> {
    chain_id: &'a str,
    account_number: u64,
    sequence: u64,
    fee: &'a Fee,
    memo: &'a str,
    msgs: &'a [TxMessage],
}

fn sign_doc_hash(body: &TxBody, auth: &AuthInfo, chain_id: &str, account_number: u64) -> Result<B256, TxError> {
    let doc = SignDoc {
        chain_id,
        account_number,
        sequence: auth.sequence,
        fee: &auth.fee,
        memo: &body.memo,
        msgs: &body.messages,
    };
    let bytes = serde_json::to_vec(&doc).map_err(|e| TxError::Serialization(e.to_string()))?;
    Ok(keccak256(bytes))
}

/// A signed envelope in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signature: Bytes,
}

impl SignedTx {
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        serde_json::to_vec(self).map_err(|e| TxError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        serde_json::from_slice(bytes).map_err(|e| TxError::Serialization(e.to_string()))
    }

    /// Transaction hash as the chain computes it: sha256 of the wire bytes.
    pub fn hash(&self) -> Result<TxHash, TxError> {
        let bytes = self.to_bytes()?;
        Ok(B256::from_slice(&Sha256::digest(bytes)))
    }

    /// Recover the address that produced the signature.
    pub fn recover_signer(&self, chain_id: &str, account_number: u64) -> Result<Address, TxError> {
        let hash = sign_doc_hash(&self.body, &self.auth_info, chain_id, account_number)?;
        let sig = Signature::try_from(self.signature.as_ref())
            .map_err(|e| TxError::Signing(format!("invalid signature: {e}")))?;
        sig.recover_address_from_prehash(&hash)
            .map_err(|e| TxError::Signing(format!("recovery failed: {e}")))
    }
}
