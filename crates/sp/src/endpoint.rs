//! Choosing which storage provider to talk to.

use alloy_primitives::Address;
use stowage_api::{ChainError, ChainQuery, ClientError};
use tracing::debug;
use url::Url;

/// Caller preference for the provider endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSelection {
    /// Used as-is when set.
    pub endpoint: Option<String>,
    /// Looked up on chain when no explicit endpoint is given.
    pub sp_address: Option<Address>,
}

impl EndpointSelection {
    pub fn explicit(endpoint: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()), sp_address: None }
    }

    pub fn provider(sp_address: Address) -> Self {
        Self { endpoint: None, sp_address: Some(sp_address) }
    }
}

/// Parse an endpoint, assuming `https` when no scheme is given.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let endpoint = endpoint.trim();
    let with_scheme =
        if endpoint.contains("://") { endpoint.to_string() } else { format!("https://{endpoint}") };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ClientError::InvalidArgument(format!("endpoint {endpoint}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidArgument(format!("endpoint {endpoint}: unsupported scheme {other}"))),
    }
}

/// Resolve the endpoint for a request about `bucket`.
///
/// Order: explicit endpoint, then the provider named by address, then the
/// bucket's primary provider, then the first in-service provider.
pub async fn select_endpoint<Q: ChainQuery>(
    chain: &Q,
    selection: &EndpointSelection,
    bucket: Option<&str>,
) -> Result<Url, ClientError> {
    if let Some(endpoint) = &selection.endpoint {
        return parse_endpoint(endpoint);
    }
    if let Some(address) = selection.sp_address {
        let sp = chain.storage_provider(address).await?;
        return parse_endpoint(&sp.endpoint);
    }

    let providers = chain.storage_providers().await?;
    if let Some(bucket) = bucket {
        let info = chain.bucket(bucket).await?;
        let primary = providers.iter().find(|sp| sp.id == info.primary_sp_id).ok_or_else(|| {
            ChainError::NotFound(format!("primary provider {} of bucket {bucket}", info.primary_sp_id))
        })?;
        debug!(bucket, sp = primary.id, "using bucket's primary provider");
        return parse_endpoint(&primary.endpoint);
    }

    let sp = providers
        .iter()
        .find(|sp| sp.is_in_service())
        .ok_or_else(|| ChainError::NotFound("no in-service storage provider".into()))?;
    debug!(sp = sp.id, "using first in-service provider");
    parse_endpoint(&sp.endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use stowage_api::{ProviderStatus, StorageProviderInfo};
    use stowage_test_utils::StubChain;

    #[test]
    fn scheme_defaults_to_https() {
        assert_eq!(parse_endpoint("sp1.example:9033").unwrap().as_str(), "https://sp1.example:9033/");
        assert_eq!(parse_endpoint("http://127.0.0.1:9033").unwrap().scheme(), "http");
        assert_matches!(parse_endpoint("ftp://sp1.example"), Err(ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn explicit_endpoint_skips_the_chain() {
        let chain = StubChain::new(Address::ZERO);
        let url = select_endpoint(&chain, &EndpointSelection::explicit("https://mine.example"), Some("b"))
            .await
            .unwrap();
        assert_eq!(url.host_str(), Some("mine.example"));
        assert_eq!(chain.calls(), 0);
    }

    #[tokio::test]
    async fn provider_address_is_looked_up() {
        let chain = StubChain::new(Address::ZERO);
        let operator = chain.provider().operator_address;
        let url = select_endpoint(&chain, &EndpointSelection::provider(operator), None).await.unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9033/");

        let err = select_endpoint(&chain, &EndpointSelection::provider(Address::repeat_byte(9)), None)
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Chain(ChainError::NotFound(_)));
    }

    fn provider(id: u32, endpoint: &str, status: ProviderStatus) -> StorageProviderInfo {
        StorageProviderInfo {
            id,
            operator_address: Address::repeat_byte(0x60 + id as u8),
            funding_address: Address::ZERO,
            approval_address: Address::ZERO,
            endpoint: endpoint.into(),
            status,
        }
    }

    #[tokio::test]
    async fn falls_back_to_primary_then_any() {
        let chain = StubChain::new(Address::ZERO);
        chain.add_provider(provider(2, "https://jailed.example", ProviderStatus::StatusInJailed));
        chain.add_provider(provider(3, "https://primary.example", ProviderStatus::StatusInService));
        chain.set_bucket_primary(3);

        let for_bucket = select_endpoint(&chain, &EndpointSelection::default(), Some("photos")).await.unwrap();
        assert_eq!(for_bucket.as_str(), "https://primary.example/");

        let any = select_endpoint(&chain, &EndpointSelection::default(), None).await.unwrap();
        assert_eq!(any.as_str(), "http://127.0.0.1:9033/");
    }

    #[tokio::test]
    async fn primary_missing_from_the_list_is_not_found() {
        let chain = StubChain::new(Address::ZERO);
        chain.set_bucket_primary(7);
        let err = select_endpoint(&chain, &EndpointSelection::default(), Some("photos")).await.unwrap_err();
        assert_matches!(err, ClientError::Chain(ChainError::NotFound(_)));
    }

    #[tokio::test]
    async fn extra_providers_are_looked_up_by_operator() {
        let chain = StubChain::new(Address::ZERO);
        let extra = provider(2, "https://sp2.example", ProviderStatus::StatusInService);
        chain.add_provider(extra.clone());
        let url = select_endpoint(&chain, &EndpointSelection::provider(extra.operator_address), None)
            .await
            .unwrap();
        assert_eq!(url.host_str(), Some("sp2.example"));
    }
}
