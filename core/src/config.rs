//! Construction-time configuration for `Client`.
//!
//! A `Config` is an immutable value owned by each client, so several clients
//! with different keys, datasets or endpoints can coexist in one process.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ApiError, Result};

/// Production endpoint of the Honeycomb API.
pub const DEFAULT_API_URL: &str = "https://api.honeycomb.io";

pub const ENV_API_KEY: &str = "HONEYCOMBIO_APIKEY";
pub const ENV_DATASET: &str = "HONEYCOMBIO_DATASET";
pub const ENV_API_URL: &str = "HONEYCOMBIO_APIURL";
/// Request timeout in whole seconds.
pub const ENV_TIMEOUT: &str = "HONEYCOMBIO_TIMEOUT";

/// Settings shared by every request a `Client` makes.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: SecretString,
    api_url: String,
    dataset: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl Config {
    pub fn new(api_key: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into_boxed_str()),
            api_url: DEFAULT_API_URL.to_string(),
            dataset: dataset.into(),
            user_agent: default_user_agent(),
            timeout: None,
        }
    }

    /// Load configuration from the `HONEYCOMBIO_*` environment variables.
    ///
    /// `HONEYCOMBIO_APIKEY` and `HONEYCOMBIO_DATASET` are required;
    /// `HONEYCOMBIO_APIURL` and `HONEYCOMBIO_TIMEOUT` are optional.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(required_var(ENV_API_KEY)?, required_var(ENV_DATASET)?);

        if let Some(api_url) = optional_var(ENV_API_URL) {
            config.api_url = api_url;
        }
        if let Some(raw) = optional_var(ENV_TIMEOUT) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ApiError::Config(format!("{ENV_TIMEOUT} must be a whole number of seconds, got {raw:?}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Reject configurations that could never produce a valid request.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key().trim().is_empty() {
            return Err(ApiError::Config("API key must not be empty".to_string()));
        }
        if self.dataset.trim().is_empty() {
            return Err(ApiError::Config("dataset must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name).ok_or_else(|| ApiError::Config(format!("{name} is not set")))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
