//! Auth context
//!
//! Holds the signed-in back-office session. The session lives in memory for
//! the lifetime of the context and is mirrored into a [`SessionStorage`] under
//! the `token` and `user` keys so it survives across requests.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::models::{AuthSession, AuthUser, Envelope};
use crate::services::backend::{BackendClient, BackendError, RequestConfig};
use crate::services::storage::SessionStorage;

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key of the JSON-encoded user
pub const USER_KEY: &str = "user";

/// Error types for auth operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Failed to store session: {0}")]
    Storage(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Session state plus the storage it is persisted in
pub struct AuthContext<S: SessionStorage> {
    client: BackendClient,
    storage: S,
    session: RwLock<Option<AuthSession>>,
}

impl<S: SessionStorage> AuthContext<S> {
    /// Restore a previously stored session.
    ///
    /// Half-present or undecodable data is wiped from the storage and the
    /// context starts logged out.
    pub fn restore(client: BackendClient, storage: S) -> Self {
        let session = read_session(&storage);
        Self {
            client,
            storage,
            session: RwLock::new(session),
        }
    }

    /// Sign in against the backend and persist the session
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let body = LoginRequest { username, password };
        let session = self
            .client
            .post::<_, Envelope<AuthSession>>("auth/login", &body, &RequestConfig::new())
            .await
            .map_err(|err| match err.status() {
                Some(400 | 401 | 403) => AuthError::InvalidCredentials,
                _ => AuthError::Backend(err),
            })?
            .into_inner();

        let user_json = serde_json::to_string(&session.user)?;
        self.storage.set(TOKEN_KEY, &session.token);
        self.storage.set(USER_KEY, &user_json);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());

        tracing::info!("User {} signed in", session.user.username);
        Ok(session)
    }

    /// Forget the session in memory and in storage
    pub fn logout(&self) {
        let previous = self.session.write().unwrap_or_else(PoisonError::into_inner).take();
        clear_storage(&self.storage);
        if let Some(session) = previous {
            tracing::info!("User {} signed out", session.user.username);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.session().map(|s| s.user)
    }

    /// Request configuration carrying the bearer token, if signed in
    pub fn request_config(&self) -> RequestConfig {
        match self.session.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(session) => RequestConfig::for_session(session),
            None => RequestConfig::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn read_session(storage: &impl SessionStorage) -> Option<AuthSession> {
    match (storage.get(TOKEN_KEY), storage.get(USER_KEY)) {
        (None, None) => None,
        (Some(token), Some(user)) if !token.is_empty() => {
            match serde_json::from_str::<AuthUser>(&user) {
                Ok(user) => Some(AuthSession { token, user }),
                Err(e) => {
                    tracing::warn!("Discarding stored session with unreadable user: {}", e);
                    clear_storage(storage);
                    None
                }
            }
        }
        _ => {
            tracing::debug!("Discarding incomplete stored session");
            clear_storage(storage);
            None
        }
    }
}

fn clear_storage(storage: &impl SessionStorage) {
    storage.remove(TOKEN_KEY);
    storage.remove(USER_KEY);
}
