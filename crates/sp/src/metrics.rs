//! Storage-provider request metrics

use metrics::Counter;
use stowage_api::RemoteErrorKind;

#[derive(Clone, Debug)]
pub(crate) struct SpMetrics {
    /// Signed requests dispatched
    requests_total: Counter,
    /// Requests that failed before any response
    transport_errors_total: Counter,
}

impl Default for SpMetrics {
    fn default() -> Self {
        Self {
            requests_total: metrics::counter!("sp.request.dispatched_total"),
            transport_errors_total: metrics::counter!("sp.request.transport_errors_total"),
        }
    }
}

impl SpMetrics {
    pub(crate) fn inc_requests(&self) {
        self.requests_total.increment(1);
    }

    pub(crate) fn inc_transport_errors(&self) {
        self.transport_errors_total.increment(1);
    }

    pub(crate) fn record_error(&self, kind: RemoteErrorKind) {
        let label: &'static str = kind.into();
        metrics::counter!("sp.request.classified_errors_total", "kind" => label).increment(1);
    }
}
