//! Transport boundary: a single HTTP round trip.
//!
//! The task lifecycle never talks to an HTTP stack directly; it hands an
//! [`HttpRequest`] to a [`Transport`] and gets an [`HttpResponse`] back.
//! [`ReqwestTransport`] is the production implementation.

use std::time::Duration;

use futures_util::future::BoxFuture;
use url::Url;

use crate::error::TransportError;

/// Outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Inbound response, fully buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Performs one HTTP exchange.
///
/// Dropping the returned future must abort the in-flight call; the task
/// lifecycle relies on this for cancellation.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Connection settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Timeout for a whole request (write + read).
    pub request_timeout: Duration,
    /// Idle connections kept per host.
    pub max_idle_connections: usize,
    /// How long an idle connection stays in the pool.
    pub keep_alive: Duration,
    /// Upper bound on simultaneously outstanding exchanges.
    pub max_concurrent_requests: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_secs(2),
            max_idle_connections: 5,
            keep_alive: Duration::from_secs(5 * 60),
            max_concurrent_requests: 5,
        }
    }
}

#[cfg(feature = "http")]
pub use self::reqwest_impl::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_impl {
    use std::sync::Arc;

    use futures_util::future::BoxFuture;
    use reqwest::Client;
    use tokio::sync::Semaphore;

    use super::{HttpRequest, HttpResponse, Transport, TransportConfig};
    use crate::error::{SdkError, SdkResult, TransportError};

    /// Pooled `reqwest` transport shared by every operation of a client.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
        permits: Arc<Semaphore>,
    }

    impl ReqwestTransport {
        pub fn new(config: &TransportConfig) -> SdkResult<Self> {
            if config.max_concurrent_requests == 0 {
                return Err(SdkError::Config(
                    "max_concurrent_requests must be at least 1".to_string(),
                ));
            }

            let client = Client::builder()
                .connect_timeout(config.connect_timeout)
                .timeout(config.request_timeout)
                .pool_max_idle_per_host(config.max_idle_connections)
                .pool_idle_timeout(config.keep_alive)
                .build()
                .map_err(|e| SdkError::Config(format!("Failed to build HTTP client: {}", e)))?;

            Ok(Self {
                client,
                permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            })
        }
    }

    impl Transport for ReqwestTransport {
        fn execute(
            &self,
            request: HttpRequest,
        ) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
            Box::pin(async move {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|_| TransportError::Connection("transport is closed".to_string()))?;

                let mut req = self.client.get(request.url);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }

                let resp = req.send().await?;
                let status = resp.status().as_u16();
                let headers = resp
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect();
                let body = resp.bytes().await?.to_vec();

                Ok(HttpResponse {
                    status,
                    headers,
                    body,
                })
            })
        }
    }
}
