use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::AiError;

pub const RATE_LIMIT_PLACEHOLDER: &str = "Rate limit exceeded after multiple retries.";
pub const CONTENT_BLOCKED_PLACEHOLDER: &str = "Content blocked due to moderation policy";

/// Exponential backoff: attempt `n` (0-based) waits `base_delay * 2^n`
/// before the next call. `max_retries` counts retries after the first call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 8,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Transient failures worth another attempt. Auth and moderation failures
/// will not change on retry.
pub fn is_retriable(err: &AiError) -> bool {
    match err {
        AiError::RateLimited | AiError::Network(_) | AiError::Malformed(_) => true,
        AiError::Api { code, .. } => *code == 408 || *code >= 500,
        AiError::ApiKeyNotSet
        | AiError::Unauthorized(_)
        | AiError::ContentBlocked(_)
        | AiError::LimiterClosed => false,
    }
}

/// Runs `call` until it succeeds, fails with a non-retriable error, or the
/// retry budget is spent. Returns the last error in the latter cases.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut call: F,
) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && is_retriable(&e) => {
                let delay = policy.delay(attempt);
                warn!(
                    call = label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Text produced by an AI call, or a placeholder standing in for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub degraded: bool,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: false,
        }
    }

    pub fn degraded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: true,
        }
    }
}

/// Turns a finished call into a reply. Fatal errors pass through so the
/// caller can stop the batch; everything else becomes a placeholder.
pub fn settle(result: Result<String, AiError>) -> Result<Reply, AiError> {
    match result {
        Ok(text) => Ok(Reply::ok(text)),
        Err(e) if e.is_fatal() => Err(e),
        Err(AiError::RateLimited) => Ok(Reply::degraded(RATE_LIMIT_PLACEHOLDER)),
        Err(AiError::ContentBlocked(_)) => Ok(Reply::degraded(CONTENT_BLOCKED_PLACEHOLDER)),
        Err(AiError::Api { code, .. }) if (400..500).contains(&code) => {
            Ok(Reply::degraded(format!("Request rejected (HTTP {code})")))
        }
        Err(e) => Ok(Reply::degraded(format!("Failed after retries: {e}"))),
    }
}
