//! High-level client: `RealEngineClient` and its builder.
//!
//! The client holds only shared, read-only configuration plus the shared
//! transport and scheduler. Every call to [`RealEngineClient::submit`]
//! spawns an independent task lifecycle and returns its [`ResultHandle`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{SdkError, SdkResult};
use crate::http::backoff::BackoffCalculator;
use crate::http::exchange::RequestExchanger;
use crate::http::transport::{Transport, TransportConfig};
use crate::task::lifecycle::TaskLifecycle;
use crate::task::{Operation, ResultHandle, Scheduler};

/// Default advisory window attached to each operation as its `deadline`.
const DEFAULT_OPERATION_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Default number of transient-error retries per operation.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// The primary entry point for the RealEngine SDK.
///
/// Cheap to clone; clones share the connection pool and scheduler.
#[derive(Clone)]
pub struct RealEngineClient {
    exchanger: Arc<RequestExchanger>,
    scheduler: Scheduler,
    backoff: BackoffCalculator,
    max_retries: u32,
    operation_deadline: Duration,
}

impl RealEngineClient {
    pub fn builder() -> RealEngineClientBuilder {
        RealEngineClientBuilder::default()
    }

    pub fn root_url(&self) -> &Url {
        self.exchanger.root_url()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Start one logical call against `path` (relative to the service root).
    ///
    /// Must be called from within the runtime's context or with a runtime
    /// configured on the builder. The returned handle resolves once the
    /// server produces a terminal answer.
    pub fn submit<T>(&self, path: &str, query: &[(&str, &str)]) -> ResultHandle<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = match Operation::new(self.root_url(), path, query, self.next_deadline()) {
            Ok(operation) => {
                tracing::debug!(url = %operation.target(), "Submitting operation");
                let lifecycle = TaskLifecycle::<T>::new(
                    Arc::clone(&self.exchanger),
                    self.scheduler.clone(),
                    self.backoff,
                    self.max_retries,
                    operation,
                    cancel.clone(),
                );
                self.scheduler.spawn(lifecycle.run())
            }
            Err(err) => self.scheduler.spawn(async move { Err(err) }),
        };
        ResultHandle::new(task, cancel)
    }

    /// Caption the image at `image_url`.
    pub fn caption(&self, image_url: &str) -> ResultHandle<String> {
        self.submit("caption", &[("url", image_url)])
    }

    fn next_deadline(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.operation_deadline)
            .ok()
            .and_then(|window| Utc::now().checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct RealEngineClientBuilder {
    token: Option<String>,
    root_url: String,
    max_retries: u32,
    transport_config: TransportConfig,
    operation_deadline: Duration,
    runtime: Option<Handle>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for RealEngineClientBuilder {
    fn default() -> Self {
        Self {
            token: None,
            root_url: crate::network::DEFAULT_API_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            transport_config: TransportConfig::default(),
            operation_deadline: DEFAULT_OPERATION_DEADLINE,
            runtime: None,
            transport: None,
        }
    }
}

impl RealEngineClientBuilder {
    /// Bearer token sent with every request. Required.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Service root. Relative `Location` headers resolve against it.
    pub fn root_url(mut self, url: &str) -> Self {
        self.root_url = url.to_string();
        self
    }

    /// Transient-error retries allowed per operation. Default 5.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Timeout for establishing a TCP connection. Default 500ms.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.connect_timeout = timeout;
        self
    }

    /// Timeout for a single request. Default 2s.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.request_timeout = timeout;
        self
    }

    /// Idle pooled connections per host. Default 5.
    pub fn max_idle_connections(mut self, max: usize) -> Self {
        self.transport_config.max_idle_connections = max;
        self
    }

    /// How long idle connections are kept. Default 5 minutes.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.transport_config.keep_alive = keep_alive;
        self
    }

    /// Simultaneously outstanding exchanges across all operations. Default 5.
    pub fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.transport_config.max_concurrent_requests = max;
        self
    }

    /// Advisory window sent to the server as each operation's deadline.
    pub fn operation_deadline(mut self, window: Duration) -> Self {
        self.operation_deadline = window;
        self
    }

    /// Runtime used to run lifecycles and their delays. Defaults to the
    /// runtime `build()` is called on.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Replace the HTTP transport; connection settings are then ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> SdkResult<RealEngineClient> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SdkError::Config("token must be set".to_string()))?;

        let root_url = Url::parse(self.root_url.trim())
            .map_err(|e| SdkError::Config(format!("invalid root URL '{}': {}", self.root_url, e)))?;
        if !matches!(root_url.scheme(), "http" | "https") || root_url.cannot_be_a_base() {
            return Err(SdkError::Config(format!(
                "root URL must be an http(s) URL: {}",
                root_url
            )));
        }

        let scheduler = match self.runtime {
            Some(handle) => Scheduler::from_handle(handle),
            None => Scheduler::current()?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.transport_config)?,
        };

        Ok(RealEngineClient {
            exchanger: Arc::new(RequestExchanger::new(transport, root_url, token)),
            scheduler,
            backoff: BackoffCalculator::default(),
            max_retries: self.max_retries,
            operation_deadline: self.operation_deadline,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(config: &TransportConfig) -> SdkResult<Arc<dyn Transport>> {
    Ok(Arc::new(crate::http::transport::ReqwestTransport::new(config)?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_config: &TransportConfig) -> SdkResult<Arc<dyn Transport>> {
    Err(SdkError::Config(
        "no transport configured; enable the `http` feature or call `transport()`".to_string(),
    ))
}
