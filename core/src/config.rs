//! Client configuration and the API key credential.
//!
//! All values are fixed once a client is constructed; nothing here is read
//! from the environment.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

/// Production service root.
pub const DEFAULT_BASE_URL: &str = "https://api.aftership.com/v4";

/// Upper bound on a single call, from connect to the last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_MAX_IDLE_CONNECTIONS_PER_HOST: usize = 20;

/// Header carrying the credential on every request.
pub const API_KEY_HEADER: &str = "aftership-api-key";

/// Opaque API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Everything a client needs at construction time.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    api_key: ApiKey,
    timeout: Duration,
    max_idle_connections_per_host: usize,
}

impl ClientConfig {
    /// Configuration for the production service with default timeouts.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            max_idle_connections_per_host: DEFAULT_MAX_IDLE_CONNECTIONS_PER_HOST,
        }
    }

    /// Point the client at another service root, e.g. a sandbox or a local
    /// mock. The root must be an absolute http(s) URL that can carry path
    /// segments; a trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        parse_base_url(base_url)?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_idle_connections_per_host(mut self, max: usize) -> Self {
        self.max_idle_connections_per_host = max;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_idle_connections_per_host(&self) -> usize {
        self.max_idle_connections_per_host
    }
}

/// Parse and check a service root.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| ApiError::RequestConstruction(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::RequestConstruction(format!(
            "{raw}: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(ApiError::RequestConstruction(format!("{raw}: cannot be a base URL")));
    }
    Ok(url)
}
