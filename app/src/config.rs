//! Client configuration.
//!
//! Values come from `TODOLISTS_*` environment variables, with builder-style
//! overrides for everything the command line can set.

use crate::environment::{
    AppEnvironment, DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_NOTIFICATION_DURATION,
};
use std::time::Duration;
use thiserror::Error;
use todolists_api::client::parse_base_url;
use todolists_api::{ApiError, DEFAULT_BASE_URL, HttpClient, HttpClientConfig};
use url::Url;

/// API base URL
pub const ENV_BASE_URL: &str = "TODOLISTS_BASE_URL";
/// Value of the `API-KEY` header
pub const ENV_API_KEY: &str = "TODOLISTS_API_KEY";
/// Bearer token from an earlier session
pub const ENV_TOKEN: &str = "TODOLISTS_TOKEN";
/// Per-request timeout in seconds
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TODOLISTS_REQUEST_TIMEOUT_SECS";
/// Notification display time in seconds
pub const ENV_NOTIFICATION_SECS: &str = "TODOLISTS_NOTIFICATION_SECS";
/// Notification queue bound
pub const ENV_NOTIFICATION_CAPACITY: &str = "TODOLISTS_NOTIFICATION_CAPACITY";
/// Log filter used when `RUST_LOG` is unset
pub const ENV_LOG: &str = "TODOLISTS_LOG";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but does not parse
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        /// Variable or setting name
        name: &'static str,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },

    /// The HTTP client could not be built from the settings
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}

/// Everything needed to build an [`AppEnvironment`] talking to a real server
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL, always ending with `/`
    pub base_url: Url,
    /// Value of the `API-KEY` header
    pub api_key: String,
    /// Bearer token from an earlier session
    pub token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long a failure notification is shown
    pub notification_duration: Duration,
    /// Maximum queued notifications
    pub notification_capacity: usize,
    /// Default log filter
    pub log_filter: String,
}

impl ClientConfig {
    /// Defaults for the public server
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the built-in base URL fails to parse.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url(ENV_BASE_URL, DEFAULT_BASE_URL)?,
            api_key: api_key.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        })
    }

    /// Read the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `TODOLISTS_API_KEY` is unset and
    /// [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let mut config = Self::new(api_key)?;

        if let Some(raw) = lookup(ENV_BASE_URL) {
            config.base_url = parse_url(ENV_BASE_URL, &raw)?;
        }
        config.token = lookup(ENV_TOKEN).filter(|token| !token.is_empty());
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_NOTIFICATION_SECS) {
            config.notification_duration =
                Duration::from_secs(parse_number(ENV_NOTIFICATION_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_NOTIFICATION_CAPACITY) {
            config.notification_capacity = parse_number(ENV_NOTIFICATION_CAPACITY, &raw)?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }

        tracing::debug!(base_url = %config.base_url, "Loaded client configuration");
        Ok(config)
    }

    /// Use another server
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `base_url` is not a valid URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_url(ENV_BASE_URL, base_url)?;
        Ok(self)
    }

    /// Start with a bearer token
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the notification display time
    #[must_use]
    pub const fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    /// Set the notification queue bound
    #[must_use]
    pub const fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// Check the settings for values that would make the client unusable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty API key, a zero timeout or
    /// a zero notification capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(invalid(ENV_API_KEY, &self.api_key, "must not be empty"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid(ENV_REQUEST_TIMEOUT_SECS, "0", "must be positive"));
        }
        if self.notification_capacity == 0 {
            return Err(invalid(ENV_NOTIFICATION_CAPACITY, "0", "must be positive"));
        }
        Ok(())
    }

    /// Settings for the HTTP adapter
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.request_timeout,
            token: self.token.clone(),
        }
    }

    /// Validate, then build an environment backed by [`HttpClient`]
    ///
    /// # Errors
    ///
    /// Returns the [`ClientConfig::validate`] error, or [`ConfigError::Client`]
    /// when the HTTP client cannot be built.
    pub fn environment(&self) -> Result<AppEnvironment, ConfigError> {
        self.validate()?;
        let client = HttpClient::new(self.http_config())?;
        Ok(AppEnvironment::from_backend(client)
            .with_notification_duration(self.notification_duration)
            .with_notification_capacity(self.notification_capacity))
    }
}

fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    parse_base_url(raw).map_err(|error| invalid(name, raw, error.user_message()))
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|error: T::Err| invalid(name, raw, error.to_string()))
}
