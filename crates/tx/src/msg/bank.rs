//! Token transfer messages.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::TxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCoins {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: U256,
}

impl SendCoins {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        validate::positive_amount("amount", &self.amount)
    }
}

/// One side of a multi-send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub amount: U256,
}

/// A single input fanned out to several outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSend {
    pub input: Output,
    pub outputs: Vec<Output>,
}

impl MultiSend {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        if self.outputs.is_empty() {
            return Err(TxError::field("outputs", "no destinations"));
        }
        validate::positive_amount("input.amount", &self.input.amount)?;
        let mut total = U256::ZERO;
        for output in &self.outputs {
            validate::positive_amount("outputs.amount", &output.amount)?;
            total = total
                .checked_add(output.amount)
                .ok_or_else(|| TxError::field("outputs", "sum overflows"))?;
        }
        if total != self.input.amount {
            return Err(TxError::field(
                "outputs",
                format!("sum of outputs {total} does not match input {}", self.input.amount),
            ));
        }
        Ok(())
    }
}
