//! Governance messages.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::{TxMessage, validate};
use crate::TxError;

/// A proposal carrying messages executed by the governance module on pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitProposal {
    pub proposer: Address,
    pub messages: Vec<TxMessage>,
    pub initial_deposit: U256,
    pub metadata: String,
    pub title: String,
    pub summary: String,
}

impl SubmitProposal {
    pub(crate) fn validate_basic(&self) -> Result<(), TxError> {
        if self.messages.is_empty() {
            return Err(TxError::field("messages", "proposal carries no messages"));
        }
        for inner in &self.messages {
            inner.validate_basic()?;
        }
        validate::non_empty("title", &self.title)?;
        validate::non_empty("summary", &self.summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Address,
    pub option: VoteOption,
    pub metadata: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::SendCoins;

    #[test]
    fn proposal_validates_inner_messages() {
        let inner = |amount: u64| {
            TxMessage::Send(SendCoins {
                from_address: Address::repeat_byte(1),
                to_address: Address::repeat_byte(2),
                amount: U256::from(amount),
            })
        };
        let mut proposal = SubmitProposal {
            proposer: Address::repeat_byte(1),
            messages: vec![inner(1)],
            initial_deposit: U256::from(1u64),
            metadata: String::new(),
            title: "pay".into(),
            summary: "pay someone".into(),
        };
        assert!(proposal.validate_basic().is_ok());

        proposal.messages.push(inner(0));
        assert!(proposal.validate_basic().is_err());

        proposal.messages.clear();
        assert!(proposal.validate_basic().is_err());
    }

    #[test]
    fn vote_option_parses() {
        assert_eq!("no_with_veto".parse::<VoteOption>().unwrap(), VoteOption::NoWithVeto);
    }
}
