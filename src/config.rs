use std::env;
use std::time::Duration;

use reqwest::Client;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request ceiling covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
/// Maximum redirect hops before aborting. Photo media URLs redirect once.
const MAX_REDIRECTS: usize = 5;

/// Credential read from the environment. `Debug` never prints the value.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Reads a non-blank credential from `var`.
pub fn read_key(var: &str) -> Option<ApiKey> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(ApiKey)
}

/// Reads an optional setting, falling back to `default` when unset or blank.
pub fn read_setting(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// The single HTTP client shared by every service of a batch.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(crate::USER_AGENT)
        .build()
}
