//! Payment-account messages.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::TxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentAccount {
    pub creator: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub creator: Address,
    pub to: Address,
    pub amount: U256,
}

impl Deposit {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::positive_amount("amount", &self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub creator: Address,
    pub from: Address,
    pub amount: U256,
}

impl Withdraw {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::positive_amount("amount", &self.amount)
    }
}

/// Irreversibly turns off refunds for a payment account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableRefund {
    pub owner: Address,
    pub addr: Address,
}
