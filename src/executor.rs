//! Request dispatch engine: attempt loop, retry-policy evaluation, and
//! transparent credential refresh.

use std::time::Duration;

use reqwest::header;
use tokio::time::sleep;

use crate::{
    auth::CredentialProvider,
    case::normalize_key,
    config::{SharedConfig, DEFAULT_POLICY_NAME},
    request::ApiRequest,
    retry::{AttemptResult, RetryRule},
    types::ApiResponse,
    MeetlyError, Result,
};

pub(crate) struct RequestExecutor {
    http: reqwest::Client,
    config: SharedConfig,
    credentials: CredentialProvider,
    timeout_ms: u64,
    retry_backoff_ms: u64,
}

impl RequestExecutor {
    pub(crate) fn new(
        config: SharedConfig,
        credentials: CredentialProvider,
        timeout_ms: u64,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            credentials,
            timeout_ms,
            retry_backoff_ms,
        }
    }

    pub(crate) fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Runs one request to success or policy exhaustion.
    ///
    /// Attempts are strictly sequential; the retry predicate is evaluated at
    /// most once per completed attempt; the attempt count never exceeds the
    /// rule's budget. A 401 triggers at most one credential refresh per
    /// request lifecycle, and the re-attempt after a refresh bypasses the
    /// predicate (auth failures are refreshed, not policy-retried).
    pub(crate) async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
        let base_url = self.config.base_url();
        let case_sensitive = self.config.case_sensitive();
        let debug = self.config.debug();
        let rule = self.select_rule(request.policy.as_deref(), debug);

        let url = join_url(&base_url, &request.path);
        let query: Vec<(String, String)> = request
            .query
            .iter()
            .map(|(key, value)| (normalize_key(key, case_sensitive).into_owned(), value.clone()))
            .collect();
        let headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (normalize_key(name, case_sensitive).into_owned(), value.clone()))
            .collect();

        let mut attempt: u32 = 1;
        let mut refreshed = false;
        loop {
            let credential = self.credentials.acquire().await?;
            let (result, transport_err) = self
                .perform(&request, &url, &query, &headers, credential.authorization(), attempt)
                .await;

            if let Some(status) = result.status {
                if (200..300).contains(&status) {
                    if debug {
                        tracing::debug!(attempt, status, "request succeeded");
                    }
                    return Ok(ApiResponse {
                        status,
                        body: result.body,
                    });
                }

                if status == 401 && !refreshed {
                    refreshed = true;
                    if debug {
                        tracing::debug!(attempt, "credential rejected, refreshing");
                    }
                    self.credentials.refresh(&credential).await?;
                    attempt += 1;
                    continue;
                }
            }

            let wants_retry = (rule.should_retry)(&result);
            if debug {
                tracing::debug!(attempt, status = ?result.status, wants_retry, "attempt failed");
            }

            if wants_retry && attempt < rule.max_attempts {
                self.wait_before_retry(attempt, debug).await;
                attempt += 1;
                continue;
            }

            if wants_retry {
                return Err(MeetlyError::PolicyExhausted {
                    attempts: attempt,
                    status: result.status,
                    body: result.body,
                });
            }
            if let Some(err) = transport_err {
                return Err(MeetlyError::Transport(err));
            }
            return Err(MeetlyError::Http {
                status: result.status.unwrap_or_default(),
                body: result.body,
            });
        }
    }

    async fn perform(
        &self,
        request: &ApiRequest,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        authorization: String,
        attempt: u32,
    ) -> (AttemptResult, Option<reqwest::Error>) {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(header::AUTHORIZATION, authorization)
            .timeout(Duration::from_millis(self.timeout_ms));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => (
                        AttemptResult {
                            status: Some(status),
                            body,
                            error: None,
                            attempt,
                        },
                        None,
                    ),
                    Err(err) => transport_failure(err, attempt),
                }
            }
            Err(err) => transport_failure(err, attempt),
        }
    }

    /// Resolves the request's policy override (or the default policy name)
    /// against the registry, degrading to a single attempt when unresolved.
    fn select_rule(&self, override_name: Option<&str>, debug: bool) -> RetryRule {
        let name = override_name.unwrap_or(DEFAULT_POLICY_NAME);
        match self.config.resolve_policy(name) {
            Some(rule) => rule,
            None => {
                if debug && override_name.is_some() {
                    tracing::debug!(policy = name, "retry policy not registered, using single attempt");
                }
                RetryRule::single_attempt()
            }
        }
    }

    async fn wait_before_retry(&self, attempt: u32, debug: bool) {
        let exp = attempt.min(16);
        let delay_ms = self.retry_backoff_ms.saturating_mul(1u64 << exp);
        if debug {
            tracing::debug!(delay_ms, "waiting before next attempt");
        }
        sleep(Duration::from_millis(delay_ms)).await;
    }
}

fn transport_failure(err: reqwest::Error, attempt: u32) -> (AttemptResult, Option<reqwest::Error>) {
    let text = err.to_string();
    (
        AttemptResult {
            status: None,
            body: text.clone(),
            error: Some(text),
            attempt,
        },
        Some(err),
    )
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
