//! Named retry rules: an attempt budget paired with a caller-supplied
//! predicate deciding whether a failed attempt warrants another try.

use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a failed attempt should be retried.
///
/// Side-effect-free by contract; invoked at most once per completed attempt.
pub type RetryDecision = Arc<dyn Fn(&AttemptResult) -> bool + Send + Sync>;

/// Outcome of one execution attempt, as seen by a retry predicate.
///
/// Built fresh per attempt and discarded once the retry decision is made.
#[derive(Clone, Debug)]
pub struct AttemptResult {
    /// HTTP status code, or `None` when the attempt failed in transport
    /// before a response existed.
    pub status: Option<u16>,
    /// Raw response body, or the transport error text for transport failures.
    pub body: String,
    /// Transport error text, when the attempt never produced a response.
    pub error: Option<String>,
    /// 1-based attempt index within the request lifecycle.
    pub attempt: u32,
}

impl AttemptResult {
    /// True for 2xx responses.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|code| (200..300).contains(&code))
    }
}

/// A registered retry rule: total attempt budget plus retry predicate.
///
/// `max_attempts` counts attempts, not retries: the first attempt always
/// happens, and a budget of 0 or 1 means exactly one attempt regardless of
/// what the predicate says.
#[derive(Clone)]
pub struct RetryRule {
    /// Total number of attempts allowed, including the first.
    pub max_attempts: u32,
    /// Decides, per failed attempt, whether another try is warranted.
    pub should_retry: RetryDecision,
}

impl RetryRule {
    /// Builds a complete rule from a budget and a predicate.
    pub fn new<F>(max_attempts: u32, should_retry: F) -> Self
    where
        F: Fn(&AttemptResult) -> bool + Send + Sync + 'static,
    {
        Self {
            max_attempts,
            should_retry: Arc::new(should_retry),
        }
    }

    /// The built-in fallback: one attempt, never retry.
    ///
    /// Used whenever a request names no policy, names an unregistered policy,
    /// or the name fails to resolve under the active case rule.
    pub fn single_attempt() -> Self {
        Self::new(1, |_| false)
    }
}

impl fmt::Debug for RetryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryRule")
            .field("max_attempts", &self.max_attempts)
            .field("should_retry", &"<predicate>")
            .finish()
    }
}

/// Registration input for a retry rule.
///
/// Both fields are optional so partially specified policies are expressible;
/// registration skips any spec that is not complete, leaving whatever rule is
/// already registered under that name untouched.
#[derive(Clone, Default)]
pub struct PolicySpec {
    /// Total attempt budget.
    pub max_attempts: Option<u32>,
    /// Retry predicate.
    pub should_retry: Option<RetryDecision>,
}

impl PolicySpec {
    /// Builds a complete spec.
    pub fn new<F>(max_attempts: u32, should_retry: F) -> Self
    where
        F: Fn(&AttemptResult) -> bool + Send + Sync + 'static,
    {
        Self {
            max_attempts: Some(max_attempts),
            should_retry: Some(Arc::new(should_retry)),
        }
    }

    /// Converts into a registrable rule; `None` when either field is missing.
    pub fn into_rule(self) -> Option<RetryRule> {
        match (self.max_attempts, self.should_retry) {
            (Some(max_attempts), Some(should_retry)) => Some(RetryRule {
                max_attempts,
                should_retry,
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySpec")
            .field("max_attempts", &self.max_attempts)
            .field(
                "should_retry",
                &self.should_retry.as_ref().map(|_| "<predicate>"),
            )
            .finish()
    }
}
