//! `reqwest`-backed implementation of the API adapters.

use crate::error::{ApiError, GENERIC_FAILURE_MESSAGE};
use crate::schema::{self, Validate};
use crate::types::{Envelope, ResultCode};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

/// Default server of the todolists API
pub const DEFAULT_BASE_URL: &str = "https://social-network.samuraijs.com/api/1.1/";

const HEADER_API_KEY: &str = "API-KEY";

/// Connection settings for [`HttpClient`]
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Base URL, always ending with `/`
    pub base_url: Url,
    /// Value of the `API-KEY` header
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Bearer token from an earlier session
    pub token: Option<String>,
}

impl HttpClientConfig {
    /// Settings for the default server
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unexpected`] if the built-in URL fails to parse.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            token: None,
        })
    }

    /// Use another server
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unexpected`] if `base_url` is not a valid URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start with a bearer token
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Parse a base URL, appending the trailing slash `Url::join` relies on
///
/// # Errors
///
/// Returns [`ApiError::Unexpected`] if the URL does not parse.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|error| ApiError::Unexpected(format!("invalid base URL {raw:?}: {error}")))
}

/// HTTP client for the todolists API
///
/// Implements [`TodolistsApi`](crate::TodolistsApi), [`TasksApi`](crate::TasksApi)
/// and [`AuthApi`](crate::AuthApi). Clones share the session token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    /// Build a client from its settings
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unexpected`] if the API key is not a valid header
    /// value or the TLS backend fails to initialize.
    pub fn new(config: HttpClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ApiError::Unexpected("API key contains invalid characters".to_string()))?;
        headers.insert(HEADER_API_KEY, api_key);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ApiError::Unexpected(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            token: Arc::new(RwLock::new(config.token)),
        })
    }

    /// The current bearer token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    pub(crate) fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    /// Send a request and decode the validated body
    pub(crate) async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|error| {
                ApiError::Unexpected(format!("invalid request path {path:?}: {error}"))
            })?;

        tracing::debug!(%method, path, "Sending request");

        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|error| {
            tracing::warn!(%method, path, %error, "Request failed");
            ApiError::from(error)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from)?;

        if !status.is_success() {
            let error = transport_error(status, &bytes);
            tracing::warn!(%method, path, status = status.as_u16(), %error, "Request rejected");
            return Err(error);
        }

        schema::parse(&bytes)
    }

    /// Send a request whose response is an [`Envelope`] and unwrap its data
    ///
    /// The result code is checked before the payload is decoded: a rejected
    /// operation usually carries `data: {}` whatever the success shape is.
    pub(crate) async fn envelope<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let envelope: Envelope<serde_json::Value> = self.request(method.clone(), path, body).await?;
        let data = into_data(envelope).inspect_err(|error| {
            tracing::warn!(%method, path, %error, "Operation rejected by server");
        })?;
        schema::from_value(data)
    }
}

/// Unwrap an envelope, turning a non-success result code into an error
///
/// # Errors
///
/// Returns [`ApiError::Application`] for any result code but `Success`.
pub fn into_data<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    if envelope.result_code == ResultCode::Success {
        Ok(envelope.data)
    } else {
        Err(ApiError::Application {
            result_code: envelope.result_code,
            messages: envelope.messages,
            fields_errors: envelope.fields_errors,
        })
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Message from the error body if present, else the HTTP status line
fn transport_error(status: StatusCode, body: &[u8]) -> ApiError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty());

    let message = detail.unwrap_or_else(|| {
        let reason = status.canonical_reason().unwrap_or(GENERIC_FAILURE_MESSAGE);
        format!("Request failed with status code {}: {reason}", status.as_u16())
    });

    ApiError::Transport {
        status: Some(status.as_u16()),
        message,
    }
}
