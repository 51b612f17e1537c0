//! Signed request dispatch.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use stowage_api::ClientError;
use stowage_auth::{RequestSigner, UnsignedRequest};
use tracing::debug;
use url::Url;

use crate::{
    classify::{ErrorContext, classify, read_capped, unreadable},
    metrics::SpMetrics,
};

/// Sends signed requests to storage providers.
///
/// Clones share one connection pool. [`SpClient::with_signer`] swaps the
/// identity while keeping the pool.
#[derive(Debug, Clone)]
pub struct SpClient {
    http: reqwest::Client,
    signer: RequestSigner,
    metrics: SpMetrics,
}

impl SpClient {
    pub fn new(signer: RequestSigner, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self::with_http(http, signer))
    }

    pub fn with_http(http: reqwest::Client, signer: RequestSigner) -> Self {
        Self { http, signer, metrics: SpMetrics::default() }
    }

    /// Same pool, different identity.
    pub fn with_signer(&self, signer: RequestSigner) -> Self {
        Self { signer, ..self.clone() }
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Sign `req` and build the exact HTTP request that will be sent.
    ///
    /// The path, query string and headers come from the signed request
    /// unchanged. A path the URL would rewrite is refused.
    pub fn prepare(
        &self,
        endpoint: &Url,
        req: UnsignedRequest,
        body: Option<Bytes>,
    ) -> Result<reqwest::Request, ClientError> {
        let method = Method::from_bytes(req.method.as_bytes())
            .map_err(|e| ClientError::InvalidArgument(format!("method {}: {e}", req.method)))?;
        let mut url = endpoint.clone();
        url.set_path(&req.path);
        if url.path() != req.path {
            return Err(ClientError::InvalidArgument(format!(
                "path {} would be sent as {}",
                req.path,
                url.path()
            )));
        }
        let signed = self.signer.sign(req)?;

        let query = signed.query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));

        let mut builder = self.http.request(method, url);
        for (name, value) in signed.header_set() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder.build().map_err(|e| ClientError::InvalidArgument(e.to_string()))
    }

    /// Sign, send, and classify any non-2xx answer.
    pub async fn send(
        &self,
        endpoint: &Url,
        req: UnsignedRequest,
        body: Option<Bytes>,
        ctx: &ErrorContext,
    ) -> Result<reqwest::Response, ClientError> {
        let request = self.prepare(endpoint, req, body)?;
        debug!(method = %request.method(), url = %request.url(), "storage-provider request");
        self.metrics.inc_requests();

        let resp = self.http.execute(request).await.map_err(|e| {
            self.metrics.inc_transport_errors();
            ClientError::Transport(e.to_string())
        })?;
        let status = resp.status().as_u16();
        if resp.status().is_success() {
            return Ok(resp);
        }

        let err = match read_capped(resp).await {
            Ok(body) => classify(status, &body, ctx).unwrap_or_else(|| unreadable(status, "unclassified")),
            Err(e) => unreadable(status, &e.to_string()),
        };
        debug!(status, code = %err.code, kind = %err.kind, "storage-provider error");
        self.metrics.record_error(err.kind);
        Err(err.into())
    }
}
