//! Configuration options for the Journy client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Configuration options for the Journy client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout for remote calls
    pub request_timeout: Option<Duration>,

    /// How many times a nested-array write is attempted before giving up on
    /// version conflicts
    pub max_write_attempts: u32,

    /// How often the REST backend polls a watched collection
    pub poll_interval: Duration,

    /// Whether the auth client keeps the session after sign-in
    pub persist_session: bool,

    /// Object storage bucket holding profile pictures
    pub storage_bucket: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            max_write_attempts: 10,
            poll_interval: Duration::from_secs(2),
            persist_session: true,
            storage_bucket: "journy".to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the number of write attempts; zero is treated as one
    pub fn with_max_write_attempts(mut self, value: u32) -> Self {
        self.max_write_attempts = value.max(1);
        self
    }

    /// Set the poll interval for watched remote collections
    pub fn with_poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the object storage bucket
    pub fn with_storage_bucket(mut self, value: impl Into<String>) -> Self {
        self.storage_bucket = value.into();
        self
    }

    /// Apply `JOURNY_MAX_WRITE_ATTEMPTS` and `JOURNY_POLL_INTERVAL_MS` from the
    /// environment on top of these options.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var("JOURNY_MAX_WRITE_ATTEMPTS") {
            let attempts: u32 = raw.parse().map_err(|e| {
                Error::config(format!("invalid JOURNY_MAX_WRITE_ATTEMPTS: {}", e))
            })?;
            self = self.with_max_write_attempts(attempts);
        }
        if let Ok(raw) = std::env::var("JOURNY_POLL_INTERVAL_MS") {
            let millis: u64 = raw
                .parse()
                .map_err(|e| Error::config(format!("invalid JOURNY_POLL_INTERVAL_MS: {}", e)))?;
            self = self.with_poll_interval(Duration::from_millis(millis));
        }
        Ok(self)
    }
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct JournyConfig {
    pub url: Url,
    pub api_key: String,
}

impl JournyConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, api_key: String) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if api_key.is_empty() {
            return Err(Error::config("api_key cannot be empty"));
        }
        Ok(Self { url, api_key })
    }

    /// Reads `JOURNY_URL` and `JOURNY_API_KEY` from the environment.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("JOURNY_URL")
            .map_err(|_| Error::config("JOURNY_URL environment variable not found"))?;
        let api_key = std::env::var("JOURNY_API_KEY")
            .map_err(|_| Error::config("JOURNY_API_KEY environment variable not found"))?;
        Self::new(&url_str, api_key)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}
