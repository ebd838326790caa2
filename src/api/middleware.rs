//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type of the admin API
//! - Session restoration from cookies and the admin session guard
//! - Cache header helpers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::i18n::DictionaryLoader;
use crate::models::AuthSession;
use crate::services::{
    AuthContext, AuthError, BackendClient, BackendError, CatalogService, CookieStorage, FormError,
    ReorderError, RequestConfig,
};
use crate::theme::ThemeEngine;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub catalog: Arc<CatalogService>,
    pub dictionaries: Arc<DictionaryLoader>,
    pub theme: Arc<ThemeEngine>,
}

impl AppState {
    /// Build every service from the loaded configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = BackendClient::new(config.backend.base_url.clone())?;
        let dictionaries = DictionaryLoader::with_defaults(
            config.i18n.default_locale,
            config.i18n.dictionaries_path.clone(),
        );
        let theme = ThemeEngine::new(config.theme.path.as_deref(), &config.backend.asset_base())?;

        Ok(Self {
            catalog: Arc::new(CatalogService::new(backend.clone())),
            backend,
            dictionaries: Arc::new(dictionaries),
            theme: Arc::new(theme),
            config: Arc::new(config),
        })
    }

    /// Auth context over the request's session cookies
    pub fn auth_context(&self, headers: &HeaderMap) -> AuthContext<CookieStorage> {
        let storage = CookieStorage::from_headers(headers, self.config.session.cookie_max_age_secs);
        AuthContext::restore(self.backend.clone(), storage)
    }
}

/// Session of the signed-in back-office user, inserted by [`require_session`]
#[derive(Debug, Clone)]
pub struct AdminSession(pub AuthSession);

impl AdminSession {
    /// Backend request configuration carrying this session's bearer token
    pub fn request_config(&self) -> RequestConfig {
        RequestConfig::for_session(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status: 401, message } => ApiError::unauthorized(message),
            BackendError::Status { status: 403, message } => ApiError::forbidden(message),
            BackendError::Status { status: 404, message } => ApiError::not_found(message),
            BackendError::Status { status: 409, message } => ApiError::new("CONFLICT", message),
            BackendError::Status { status: 400 | 422, message } => ApiError::validation_error(message),
            other => {
                tracing::warn!("Backend call failed: {}", other);
                ApiError::bad_gateway(other.to_string())
            }
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        ApiError::validation_error(err.to_string())
    }
}

impl From<ReorderError> for ApiError {
    fn from(err: ReorderError) -> Self {
        match err {
            ReorderError::NotFound(_) => ApiError::not_found(err.to_string()),
            ReorderError::AtEdge(_) => ApiError::validation_error(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::validation_error(err.to_string()),
            AuthError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthError::Backend(backend) => backend.into(),
            AuthError::Storage(_) => ApiError::internal_error(err.to_string()),
        }
    }
}

/// Attach the cookie writes recorded by `storage` to a response
pub fn with_cookies(storage: &CookieStorage, mut response: Response) -> Response {
    storage.write_to(response.headers_mut());
    response
}

/// Admin session middleware
///
/// Restores the session from the request cookies. Stale or partial session
/// cookies are cleared on the way out.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = state.auth_context(request.headers());

    let Some(session) = auth.session() else {
        let response = ApiError::unauthorized("Authentication required").into_response();
        return with_cookies(auth.storage(), response);
    };

    request.extensions_mut().insert(AdminSession(session));
    let response = next.run(request).await;
    with_cookies(auth.storage(), response)
}

/// Build Cache-Control header for static assets
pub fn cache_control_static(max_age: u32, immutable: bool) -> String {
    if immutable {
        format!("public, max-age={}, immutable", max_age)
    } else {
        format!("public, max-age={}", max_age)
    }
}

/// Build Cache-Control header for no-cache content
pub fn cache_control_no_cache() -> String {
    "no-cache, no-store, must-revalidate".to_string()
}
