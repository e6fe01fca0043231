//! Upstream client for forwarding proxied requests

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use reqwest::{redirect, Client, Response};
use tokio::time::Duration;

use crate::proxy::error::ProxyError;

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    /// Build the shared client. Redirects are relayed to the caller, not followed.
    pub fn new(connect_timeout: Option<Duration>) -> Result<Self, ProxyError> {
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("chat-relay/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
            tracing::info!("Upstream connect timeout: {:?}", timeout);
        }

        let http_client = builder.build().map_err(ProxyError::ClientBuild)?;
        Ok(Self { http_client })
    }

    /// Send one request to `url`. Any upstream status counts as success here;
    /// only transport failures become errors.
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let mut request = self.http_client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        request.send().await.map_err(|source| ProxyError::Upstream {
            url: url.to_string(),
            source,
        })
    }
}
