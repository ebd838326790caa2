//! Backend API client
//!
//! Thin wrapper over one shared `reqwest::Client` rooted at the backend base
//! URL. Every call receives its own [`RequestConfig`]; the shared client never
//! carries per-user state such as an `Authorization` header.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::AuthSession;

/// Errors returned by backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, TLS or request-building failure
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape
    #[error("Invalid backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// HTTP status of a `Status` error
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Per-request configuration
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    bearer: Option<String>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration authorized with the session's bearer token
    pub fn for_session(session: &AuthSession) -> Self {
        Self::new().bearer(&session.token)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Client for the REST backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dealership/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a backend path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request carrying the config's bearer, headers and query
    pub fn request(&self, method: Method, path: &str, config: &RequestConfig) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .headers(config.headers.clone());

        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(token) = &config.bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Build a multipart request. A caller-supplied `Content-Type` is dropped
    /// so the multipart boundary header always wins.
    pub fn form_request(
        &self,
        method: Method,
        path: &str,
        form: Form,
        config: &RequestConfig,
    ) -> RequestBuilder {
        let mut config = config.clone();
        config.headers.remove(CONTENT_TYPE);
        self.request(method, path, &config).multipart(form)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: &RequestConfig,
    ) -> Result<T, BackendError> {
        self.send(self.request(Method::GET, path, config)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, config: &RequestConfig) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path, config).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, config: &RequestConfig) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path, config).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: &RequestConfig,
    ) -> Result<T, BackendError> {
        self.send(self.request(Method::DELETE, path, config)).await
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        config: &RequestConfig,
    ) -> Result<T, BackendError> {
        self.send(self.form_request(Method::POST, path, form, config)).await
    }

    pub async fn put_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        config: &RequestConfig,
    ) -> Result<T, BackendError> {
        self.send(self.form_request(Method::PUT, path, form, config)).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let request = builder.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "backend request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&body, status.canonical_reason()),
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// Pull a human readable message out of an error body
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(msg)) if !msg.is_empty() => return msg.clone(),
                Some(serde_json::Value::Object(inner)) => {
                    if let Some(serde_json::Value::String(msg)) = inner.get("message") {
                        return msg.clone();
                    }
                }
                _ => {}
            }
        }
    }

    let body = body.trim();
    if !body.is_empty() && body.len() <= 200 {
        return body.to_string();
    }
    reason.unwrap_or("Unknown error").to_string()
}
