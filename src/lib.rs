//! `meetly-http` is an async OAuth2 client for the Meetly REST API.
//!
//! The crate wraps authenticated request dispatch with named retry policies:
//! - [`oauth2`] builds a [`CredentialProvider`] from application credentials
//! - [`client`] builds a [`MeetlyClient`] from a [`ClientConfig`]
//! - [`SharedConfig`] holds the settings every call reads: base URL,
//!   key-case sensitivity, debug flag, and the retry-policy registry
//!
//! ```no_run
//! use meetly_http::{client, oauth2, ClientConfig, PolicySpec};
//!
//! # async fn run() -> meetly_http::Result<()> {
//! let credentials = oauth2("app-key", "app-secret", "https://example.app/cb");
//! let meetly = client(ClientConfig::new(credentials));
//!
//! meetly.settings().set_retry_policies([(
//!     "list",
//!     PolicySpec::new(3, |attempt| attempt.status == Some(429)),
//! )]);
//!
//! let users = meetly.get("/users").await?;
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod auth;
mod case;
mod client;
mod config;
mod error;
mod executor;
mod request;
mod retry;
mod types;

pub use auth::{Credential, CredentialProvider, DEFAULT_TOKEN_URL};
pub use case::{keys_match, normalize_key};
pub use client::MeetlyClient;
pub use config::{ClientConfig, SharedConfig, DEFAULT_BASE_URL, DEFAULT_POLICY_NAME};
pub use error::MeetlyError;
pub use request::ApiRequest;
pub use retry::{AttemptResult, PolicySpec, RetryDecision, RetryRule};
pub use types::ApiResponse;

pub type Result<T> = std::result::Result<T, MeetlyError>;

/// Builds a credential provider from OAuth2 application credentials.
///
/// No I/O happens until the first request needs a token.
pub fn oauth2(
    app_key: impl Into<String>,
    app_secret: impl Into<String>,
    redirect_uri: impl Into<String>,
) -> CredentialProvider {
    CredentialProvider::new(app_key, app_secret, redirect_uri)
}

/// Builds a client from an explicit configuration.
pub fn client(config: ClientConfig) -> MeetlyClient {
    MeetlyClient::new(config)
}
