//! `reqwest` wrapper that opens a span per outgoing request and propagates
//! a `traceparent` header.

use crate::http::trace_context;
use serde::Serialize;
use std::time::Duration;
use tracing::{field::Empty, Instrument, Level};

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map(Self::new)
    }

    /// Execute a built request inside an `outgoing_http` span.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = Empty,
        );
        trace_context::inject_trace_context(req.headers_mut(), &span);

        let inner = self.inner.clone();
        async move {
            let result = inner.execute(req).await;
            match &result {
                Ok(resp) => {
                    tracing::Span::current().record("http.status_code", resp.status().as_u16());
                    if resp.status().is_client_error() || resp.status().is_server_error() {
                        tracing::warn!(status = resp.status().as_u16(), "upstream returned error status");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "outgoing request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.get(url).build()?;
        self.execute(req).await
    }

    /// POST `body` as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.post(url).json(body).build()?;
        self.execute(req).await
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}
