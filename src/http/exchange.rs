//! One authenticated round trip, classified into the next lifecycle action.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::Envelope;
use crate::error::{SdkError, SdkResult, TransportError};
use crate::http::transport::{HttpRequest, HttpResponse, Transport};
use crate::network::{DEFAULT_POLL_DELAY, LOCATION_HEADER, RETRY_AFTER_HEADER};

/// Outcome of a single exchange.
#[derive(Debug)]
pub enum Exchange<T> {
    /// 429 or 5xx: worth another attempt after a backoff.
    Retryable { status: u16, path: String },
    /// 202: the result is not ready yet; poll `location` after `retry_after`.
    Pending { location: Url, retry_after: Duration },
    /// Any other status, with its decoded body.
    Decoded {
        status: u16,
        path: String,
        envelope: Envelope<T>,
    },
    /// The exchange never produced a response.
    TransportFailure(TransportError),
}

/// Builds authenticated requests and interprets the server's answer.
///
/// Malformed responses (202 without a usable `Location`, unreadable body)
/// come back as `Err` and are terminal for the operation.
pub struct RequestExchanger {
    transport: Arc<dyn Transport>,
    root_url: Url,
    token: String,
}

impl RequestExchanger {
    pub fn new(transport: Arc<dyn Transport>, root_url: Url, token: impl Into<String>) -> Self {
        Self {
            transport,
            root_url,
            token: token.into(),
        }
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn request(&self, url: &Url) -> HttpRequest {
        HttpRequest::get(url.clone())
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
    }

    pub async fn exchange<T: DeserializeOwned>(&self, url: &Url) -> SdkResult<Exchange<T>> {
        match self.transport.execute(self.request(url)).await {
            Ok(response) => self.classify(url, response),
            Err(e) => Ok(Exchange::TransportFailure(e)),
        }
    }

    /// Map a response received for `url` onto an [`Exchange`].
    pub fn classify<T: DeserializeOwned>(
        &self,
        url: &Url,
        response: HttpResponse,
    ) -> SdkResult<Exchange<T>> {
        let status = response.status;
        let path = url.path().to_string();

        if is_retryable_status(status) {
            return Ok(Exchange::Retryable { status, path });
        }

        if status == 202 {
            let raw = response
                .header(LOCATION_HEADER)
                .ok_or_else(|| SdkError::protocol("Location header is missing", status, &path))?;
            let location = resolve_location(&self.root_url, raw)
                .ok_or_else(|| SdkError::protocol("Location header is invalid", status, &path))?;
            let retry_after = parse_retry_after(response.header(RETRY_AFTER_HEADER));
            return Ok(Exchange::Pending {
                location,
                retry_after,
            });
        }

        if response.body.is_empty() {
            return Err(SdkError::protocol("response body is empty", status, path));
        }

        let envelope = serde_json::from_slice(&response.body).map_err(|source| SdkError::Decode {
            status,
            path: path.clone(),
            source,
        })?;

        Ok(Exchange::Decoded {
            status,
            path,
            envelope,
        })
    }
}

/// Rate limiting and server errors are transient regardless of body.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Absolute locations are used as-is; anything else is resolved against the
/// service root.
pub fn resolve_location(root: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => root.join(raw).ok(),
        Err(_) => None,
    }
}

/// `X-Retry-After` is decimal seconds; absent or unusable values fall back
/// to [`DEFAULT_POLL_DELAY`].
pub fn parse_retry_after(raw: Option<&str>) -> Duration {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_millis((secs * 1000.0) as u64))
        .unwrap_or(DEFAULT_POLL_DELAY)
}
