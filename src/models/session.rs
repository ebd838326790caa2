//! Client-side auth session

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::reference::EntityId;

/// Role of a back-office user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::to_lowercase).as_deref() {
            Some("admin") => UserRole::Admin,
            _ => UserRole::User,
        })
    }
}

/// User record returned by the backend on login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Bearer token plus the user it belongs to. No expiry is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub user: AuthUser,
}
