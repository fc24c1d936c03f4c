//! Domain modules.
//!
//! - `envelope`: Wire envelope shared by every RealEngine endpoint

pub mod envelope;

pub use envelope::{Envelope, ErrorInfo};
