//! Wire envelope returned by every RealEngine endpoint.
//!
//! `{"success": bool, "data": T?, "error": {"id": "...", "msg": "..."}?}`

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{SdkError, SdkResult};

/// Decoded server response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
}

/// Error payload of a failed envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorInfo {
    /// Opaque diagnostic identifier, useful for support requests.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "msg", alias = "message", default)]
    pub message: String,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Resolve the envelope into the operation's value or its terminal error.
    ///
    /// A successful envelope without `data` yields whatever `T` decodes from
    /// JSON `null`, so `()` and `Option<_>` payloads complete normally.
    /// `success` decides the outcome: an `error` sent alongside a successful
    /// envelope is ignored.
    pub fn into_result(self, status: u16, path: &str) -> SdkResult<T> {
        if !self.success {
            return Err(match self.error {
                Some(error) => SdkError::Remote {
                    id: error.id,
                    message: error.message,
                    status,
                    path: path.to_string(),
                },
                None => SdkError::protocol(
                    "response not successful but error is null",
                    status,
                    path,
                ),
            });
        }

        match self.data {
            Some(data) => Ok(data),
            None => T::deserialize(serde_json::Value::Null).map_err(|_| {
                SdkError::protocol("response successful but data is null", status, path)
            }),
        }
    }
}
