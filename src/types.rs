use serde::de::DeserializeOwned;

use crate::{MeetlyError, Result};

/// Successful response returned to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code (always 2xx).
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Decodes the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|err| MeetlyError::Decode(format!("invalid response JSON: {err}")))
    }
}
