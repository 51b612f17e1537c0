//! Transaction submission results.

use stowage_primitives::TxHash;

use crate::{ClientError, TxInclusion};

/// Final state observed by the confirmation poller.
///
/// `Unconfirmed` is a distinct verdict: the deadline passed while the
/// transaction was pending, so it may still be included later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Included with code 0.
    Confirmed(TxInclusion),
    /// Included with a non-zero code.
    Failed(TxInclusion),
    /// Still pending when the deadline fired or the caller cancelled.
    Unconfirmed,
}

impl TxOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => "confirmed",
            Self::Failed(_) => "failed",
            Self::Unconfirmed => "unconfirmed",
        }
    }
}

/// What a broadcast call returns: the hash, and the outcome when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSubmission {
    /// Assigned at broadcast and never reassigned.
    pub hash: TxHash,
    /// `None` in asynchronous mode.
    pub outcome: Option<TxOutcome>,
}

impl TxSubmission {
    pub fn submitted(hash: TxHash) -> Self {
        Self { hash, outcome: None }
    }

    /// Fold the outcome into the error taxonomy.
    ///
    /// `Ok(None)` means the caller asked not to wait.
    pub fn into_result(self) -> Result<Option<TxInclusion>, ClientError> {
        match self.outcome {
            None => Ok(None),
            Some(TxOutcome::Confirmed(inclusion)) => Ok(Some(inclusion)),
            Some(TxOutcome::Failed(inclusion)) => Err(ClientError::DefiniteTxFailure {
                hash: self.hash,
                code: inclusion.code,
                codespace: inclusion.codespace,
            }),
            Some(TxOutcome::Unconfirmed) => Err(ClientError::AmbiguousTimeout { hash: self.hash }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn inclusion(code: u32) -> TxInclusion {
        TxInclusion {
            hash: TxHash::repeat_byte(1),
            height: 1,
            code,
            codespace: if code == 0 { String::new() } else { "storage".into() },
            raw_log: String::new(),
            events: vec![],
        }
    }

    #[test]
    fn three_way_outcome_stays_distinct() {
        let hash = TxHash::repeat_byte(1);
        let ok = TxSubmission { hash, outcome: Some(TxOutcome::Confirmed(inclusion(0))) };
        assert_matches!(ok.into_result(), Ok(Some(_)));

        let failed = TxSubmission { hash, outcome: Some(TxOutcome::Failed(inclusion(5))) };
        assert_matches!(
            failed.into_result(),
            Err(ClientError::DefiniteTxFailure { code: 5, ref codespace, .. }) if codespace == "storage"
        );

        let pending = TxSubmission { hash, outcome: Some(TxOutcome::Unconfirmed) };
        assert_matches!(pending.into_result(), Err(ClientError::AmbiguousTimeout { hash: h }) if h == hash);

        assert_matches!(TxSubmission::submitted(hash).into_result(), Ok(None));
    }
}
