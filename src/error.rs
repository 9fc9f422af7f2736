/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum MeetlyError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code the active retry policy declined to retry.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// OAuth2 token exchange rejected by the authorization server, or an
    /// unusable token response.
    #[error("auth error: {0}")]
    Auth(String),
    /// Retry budget spent without a successful attempt.
    ///
    /// Carries the last attempt's detail so the caller never sees an opaque
    /// failure. `status` is `None` when the final attempt failed at the
    /// transport layer before a status code existed.
    #[error("retry policy exhausted after {attempts} attempts: {body}")]
    PolicyExhausted {
        /// Total attempts performed, including the first.
        attempts: u32,
        /// Status code of the final attempt, if one was received.
        status: Option<u16>,
        /// Response body or transport error text of the final attempt.
        body: String,
    },
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}
