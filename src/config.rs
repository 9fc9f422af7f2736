//! Shared client configuration: base URL, case-sensitivity and debug flags,
//! and the registry of named retry rules.
//!
//! All setters use validate-and-skip semantics: an invalid value is silently
//! ignored and the previous value preserved. A `tracing::warn!` breadcrumb is
//! emitted for skipped values, but no error is ever surfaced to the caller.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::auth::CredentialProvider;
use crate::case::keys_match;
use crate::retry::{PolicySpec, RetryRule};

/// Default Meetly REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.meetly.io/v2";

/// Policy name consulted when a request carries no override.
pub const DEFAULT_POLICY_NAME: &str = "default";

#[derive(Debug)]
struct ConfigState {
    base_url: String,
    case_sensitive: bool,
    debug: bool,
    policies: HashMap<String, RetryRule>,
}

/// Cheaply cloneable handle to the shared configuration.
///
/// Read concurrently by in-flight requests; written only through the setters.
/// Each setter takes the write lock once, so a single entry's update is atomic
/// with respect to concurrent readers. No cross-request snapshot isolation is
/// promised: a change made mid-flight affects only attempts issued after it.
#[derive(Clone, Debug)]
pub struct SharedConfig {
    inner: Arc<RwLock<ConfigState>>,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConfigState {
                base_url: DEFAULT_BASE_URL.to_owned(),
                case_sensitive: true,
                debug: false,
                policies: HashMap::new(),
            })),
        }
    }
}

impl SharedConfig {
    /// Creates a config with default settings and no registered policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config with an explicit initial base URL.
    ///
    /// The secure-scheme check applies to updates through
    /// [`SharedConfig::set_base_url`], not to the initial value, so local or
    /// mock endpoints can be targeted without going through the setter.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let config = Self::default();
        config.write().base_url = base_url.into();
        config
    }

    /// Registers retry policies by name.
    ///
    /// Each complete spec upserts the rule under its name. Incomplete specs
    /// (missing budget or predicate) are skipped entirely: the existing rule
    /// under that name, if any, stays as it was, and other entries in the same
    /// call are unaffected.
    pub fn set_retry_policies<I, K>(&self, specs: I)
    where
        I: IntoIterator<Item = (K, PolicySpec)>,
        K: Into<String>,
    {
        let mut state = self.write();
        for (name, spec) in specs {
            let name = name.into();
            match spec.into_rule() {
                Some(rule) => {
                    state.policies.insert(name, rule);
                }
                None => {
                    tracing::warn!(policy = %name, "skipping incomplete retry policy");
                }
            }
        }
    }

    /// Sets whether policy-name and request-key lookups are exact-case.
    pub fn set_case_sensitive(&self, flag: bool) {
        self.write().case_sensitive = flag;
    }

    /// Enables or disables per-attempt debug logging.
    pub fn set_debug(&self, flag: bool) {
        self.write().debug = flag;
    }

    /// Replaces the base URL, provided it uses a secure scheme.
    ///
    /// Anything not starting with `https://` is skipped and the previous
    /// value preserved.
    pub fn set_base_url(&self, url: &str) {
        if url.starts_with("https://") {
            self.write().base_url = url.to_owned();
        } else {
            tracing::warn!(%url, "skipping base URL without https:// scheme");
        }
    }

    pub fn base_url(&self) -> String {
        self.read().base_url.clone()
    }

    pub fn case_sensitive(&self) -> bool {
        self.read().case_sensitive
    }

    pub fn debug(&self) -> bool {
        self.read().debug
    }

    /// Looks up a registered rule under the active case rule.
    ///
    /// Registered names are stored as given; the case rule is applied at
    /// lookup time, so toggling the flag changes resolution without rewriting
    /// the registry. Under case-insensitive lookup an exact-case match wins;
    /// when several other registered names fold to the requested key, the
    /// lexicographically smallest one is used so resolution is stable.
    pub fn resolve_policy(&self, name: &str) -> Option<RetryRule> {
        let state = self.read();
        if let Some(rule) = state.policies.get(name) {
            return Some(rule.clone());
        }
        if state.case_sensitive {
            return None;
        }
        state
            .policies
            .iter()
            .filter(|(registered, _)| keys_match(registered, name, false))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, rule)| rule.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ConfigState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ConfigState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Everything a client is constructed from, enumerated explicitly.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// OAuth2 credential source.
    pub credentials: CredentialProvider,
    /// Shared settings handle; callers keep a clone to mutate settings later.
    pub config: SharedConfig,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
}

impl ClientConfig {
    /// Builds a config with default settings around a credential provider.
    pub fn new(credentials: CredentialProvider) -> Self {
        Self {
            credentials,
            config: SharedConfig::new(),
            timeout_ms: 10_000,
            retry_backoff_ms: 250,
        }
    }

    /// Uses an existing shared settings handle.
    pub fn with_config(mut self, config: SharedConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the per-attempt timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Overrides the retry backoff base.
    pub fn with_retry_backoff_ms(mut self, retry_backoff_ms: u64) -> Self {
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }
}
