//! # RealEngine SDK
//!
//! Async Rust client for the RealEngine AI API.
//!
//! A call to the API may be answered immediately, rejected with a transient
//! error, or deferred: the server replies `202 Accepted` with a `Location`
//! to poll. The SDK turns that exchange pattern into a single awaitable,
//! cancellable [`ResultHandle`](task::ResultHandle).
//!
//! ## Architecture
//!
//! 1. **Domain**: The `{success, data, error}` wire envelope
//! 2. **HTTP**: Transport boundary, exchange classification, backoff
//! 3. **Task**: Per-operation lifecycle state machine, scheduler, result handle
//! 4. **Client**: `RealEngineClient` with its builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use realengine::prelude::*;
//!
//! let client = RealEngineClient::builder()
//!     .token("re_live_...")
//!     .build()?;
//!
//! let caption = client.caption("https://example.com/house.jpg").await?;
//! ```

// ── Layer 1: Domain ──────────────────────────────────────────────────────────

/// Wire envelope shared by all endpoints.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network constants.
pub mod network;

// ── Layer 2: HTTP ────────────────────────────────────────────────────────────

/// Transport, exchange classification and backoff.
pub mod http;

// ── Layer 3: Task lifecycle ──────────────────────────────────────────────────

/// Operation lifecycle, scheduling and result handles.
pub mod task;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `RealEngineClient`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    pub use crate::client::{RealEngineClient, RealEngineClientBuilder};
    pub use crate::domain::{Envelope, ErrorInfo};
    pub use crate::error::{SdkError, SdkResult, TransportError};
    pub use crate::http::{HttpRequest, HttpResponse, Transport};
    pub use crate::network::DEFAULT_API_URL;
    pub use crate::task::ResultHandle;
}
