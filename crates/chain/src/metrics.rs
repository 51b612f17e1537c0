//! Transaction lifecycle metrics

use metrics::Counter;

#[derive(Clone, Debug)]
pub(crate) struct ChainMetrics {
    /// Envelopes handed to the node
    broadcasts_total: Counter,
    /// Envelopes the node refused
    broadcast_rejections_total: Counter,
    /// Direct placement queries that fell back to a provider approval
    resolver_fallbacks_total: Counter,
}

impl Default for ChainMetrics {
    fn default() -> Self {
        Self {
            broadcasts_total: metrics::counter!("tx.broadcast.submitted_total"),
            broadcast_rejections_total: metrics::counter!("tx.broadcast.rejected_total"),
            resolver_fallbacks_total: metrics::counter!("tx.resolver.fallbacks_total"),
        }
    }
}

impl ChainMetrics {
    pub(crate) fn inc_broadcasts(&self) {
        self.broadcasts_total.increment(1);
    }

    pub(crate) fn inc_rejections(&self) {
        self.broadcast_rejections_total.increment(1);
    }

    pub(crate) fn inc_fallbacks(&self) {
        self.resolver_fallbacks_total.increment(1);
    }

    pub(crate) fn record_outcome(&self, label: &'static str) {
        metrics::counter!("tx.confirmation.outcome_total", "outcome" => label).increment(1);
    }
}
