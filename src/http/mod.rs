//! HTTP layer: transport boundary, exchange classification, backoff.

pub mod backoff;
pub mod exchange;
pub mod transport;

pub use backoff::BackoffCalculator;
pub use exchange::{Exchange, RequestExchanger};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, Transport, TransportConfig};
