//! Network constants for the RealEngine API.

use std::time::Duration;

/// Default REST API root URL.
pub const DEFAULT_API_URL: &str = "https://api.realengine.ai";

/// Header carrying the polling location on a `202 Accepted`.
pub const LOCATION_HEADER: &str = "Location";

/// Header carrying the server-dictated poll delay, in (decimal) seconds.
pub const RETRY_AFTER_HEADER: &str = "X-Retry-After";

/// Query parameter carrying the advisory operation deadline (epoch millis).
pub const DEADLINE_PARAM: &str = "deadline";

/// Poll delay used when the server sends no usable `X-Retry-After`.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(1000);
