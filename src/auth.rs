//! OAuth2 credential acquisition and refresh.
//!
//! The provider holds the application credentials so a credential can be
//! renewed without the caller resupplying secrets. Concurrent refreshes for
//! the same credential are serialized through an async mutex; a generation
//! counter lets a waiter adopt a refresh that completed while it was queued
//! instead of issuing a duplicate exchange.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{MeetlyError, Result};

/// Default Meetly OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://auth.meetly.io/oauth/token";

/// Tokens within this window of expiry are treated as already expired.
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

/// Fallback lifetime when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3_600;

/// Bearer token material obtained from the token endpoint.
#[derive(Clone, Debug)]
pub struct Credential {
    access_token: String,
    expires_at: Instant,
    generation: u64,
}

impl Credential {
    /// The `Authorization` header value for this credential.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// True once the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_SKEW >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Default)]
struct CredentialSlot {
    current: Option<Credential>,
    generation: u64,
}

struct ProviderInner {
    http: reqwest::Client,
    app_key: String,
    app_secret: String,
    redirect_uri: String,
    token_url: String,
    slot: Mutex<CredentialSlot>,
}

/// Wraps the OAuth2 exchange; produces and refreshes bearer credentials.
///
/// Clones share the same underlying credential, so a refresh performed for
/// one in-flight request is visible to all of them.
#[derive(Clone)]
pub struct CredentialProvider {
    inner: Arc<ProviderInner>,
}

impl fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("app_key", &self.inner.app_key)
            .field("app_secret", &"<redacted>")
            .field("redirect_uri", &self.inner.redirect_uri)
            .field("token_url", &self.inner.token_url)
            .finish()
    }
}

impl CredentialProvider {
    /// Creates a provider from application credentials. No I/O happens until
    /// the first [`CredentialProvider::acquire`].
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                http: reqwest::Client::new(),
                app_key: app_key.into(),
                app_secret: app_secret.into(),
                redirect_uri: redirect_uri.into(),
                token_url: DEFAULT_TOKEN_URL.to_owned(),
                slot: Mutex::new(CredentialSlot::default()),
            }),
        }
    }

    /// Overrides the token endpoint. Call before sharing the provider.
    pub fn with_token_url(self, token_url: impl Into<String>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(ProviderInner {
                http: inner.http.clone(),
                app_key: inner.app_key.clone(),
                app_secret: inner.app_secret.clone(),
                redirect_uri: inner.redirect_uri.clone(),
                token_url: token_url.into(),
                slot: Mutex::new(CredentialSlot::default()),
            }),
        }
    }

    /// Returns the cached credential, exchanging for a fresh one when the
    /// cache is empty or expired.
    pub async fn acquire(&self) -> Result<Credential> {
        let mut slot = self.inner.slot.lock().await;
        if let Some(credential) = &slot.current {
            if !credential.is_expired() {
                return Ok(credential.clone());
            }
        }
        self.exchange_locked(&mut slot).await
    }

    /// Renews the credential that `stale` was issued from.
    ///
    /// If another task already refreshed past `stale`'s generation, its
    /// result is returned without a second exchange. At most one exchange is
    /// in flight at a time; later callers await it through the slot mutex.
    pub async fn refresh(&self, stale: &Credential) -> Result<Credential> {
        let mut slot = self.inner.slot.lock().await;
        if slot.generation > stale.generation {
            if let Some(credential) = &slot.current {
                if !credential.is_expired() {
                    return Ok(credential.clone());
                }
            }
        }
        self.exchange_locked(&mut slot).await
    }

    async fn exchange_locked(&self, slot: &mut CredentialSlot) -> Result<Credential> {
        let inner = &self.inner;
        tracing::debug!(token_url = %inner.token_url, "exchanging credentials for bearer token");

        let response = inner
            .http
            .post(&inner.token_url)
            .basic_auth(&inner.app_key, Some(&inner.app_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("redirect_uri", inner.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(MeetlyError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(MeetlyError::Transport)?;
        if !status.is_success() {
            return Err(MeetlyError::Auth(format!(
                "token endpoint rejected exchange with status {}: {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| MeetlyError::Auth(format!("invalid token response JSON: {err}")))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
        slot.generation += 1;
        let credential = Credential {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
            generation: slot.generation,
        };
        slot.current = Some(credential.clone());
        Ok(credential)
    }
}
