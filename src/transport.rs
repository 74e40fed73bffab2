use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;

use crate::{TransportResult, WireRequest};

/// Requests are abandoned after this long and reported as transport errors.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Sends a signed request and hands back the raw response body.
///
/// HTTP status codes are not interpreted: the providers report failures in
/// the body, which then fails to parse.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: WireRequest) -> TransportResult<Vec<u8>>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn execute(&self, request: WireRequest) -> TransportResult<Vec<u8>> {
        (**self).execute(request).await
    }
}

/// [`HttpTransport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: ReqwestClient,
    timeout: Duration,
}

impl ReqwestTransport {
    /// A transport over a fresh `reqwest` client, giving up after 8 seconds.
    pub fn new() -> Self {
        Self::new_with_client(ReqwestClient::new())
    }

    /// Sends through `client`, which keeps its own pool and TLS settings.
    pub fn new_with_client(client: ReqwestClient) -> Self {
        ReqwestTransport {
            inner: client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        ReqwestTransport { timeout, ..self }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ReqwestClient> for ReqwestTransport {
    fn from(client: ReqwestClient) -> Self {
        ReqwestTransport::new_with_client(client)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: WireRequest) -> TransportResult<Vec<u8>> {
        let WireRequest {
            method,
            url,
            authorization,
            body,
        } = request;
        tracing::debug!(%method, %url, "sending signed request");

        let mut builder = self
            .inner
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        let response = builder.send().await?;
        tracing::debug!(status = %response.status(), "received response");
        Ok(response.bytes().await?.to_vec())
    }
}
