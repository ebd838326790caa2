//! Session storage
//!
//! Key/value stores that hold the signed-in session between requests.
//! [`MemoryStorage`] keeps values in process; [`CookieStorage`] is a
//! per-request view over the `Cookie` header whose writes are replayed to the
//! client as `Set-Cookie` headers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use axum::http::{header, HeaderMap, HeaderValue};

/// String key/value storage for session data
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CookieChange {
    Set(String, String),
    Remove(String),
}

#[derive(Debug, Default)]
struct CookieJar {
    values: HashMap<String, String>,
    changes: Vec<CookieChange>,
}

/// Storage backed by request cookies
#[derive(Debug)]
pub struct CookieStorage {
    jar: Mutex<CookieJar>,
    max_age_secs: u64,
}

impl CookieStorage {
    /// Read the cookies of an incoming request
    pub fn from_headers(headers: &HeaderMap, max_age_secs: u64) -> Self {
        let mut values = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            if let Ok(raw) = value.to_str() {
                values.extend(parse_cookies(raw));
            }
        }

        Self {
            jar: Mutex::new(CookieJar {
                values,
                changes: Vec::new(),
            }),
            max_age_secs,
        }
    }

    /// `Set-Cookie` values for every write made through this storage
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        let jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        jar.changes
            .iter()
            .filter_map(|change| {
                let cookie = match change {
                    CookieChange::Set(key, value) => format!(
                        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                        key,
                        urlencoding::encode(value),
                        self.max_age_secs
                    ),
                    CookieChange::Remove(key) => {
                        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", key)
                    }
                };
                HeaderValue::from_str(&cookie).ok()
            })
            .collect()
    }

    /// Append the pending `Set-Cookie` headers to a response header map
    pub fn write_to(&self, headers: &mut HeaderMap) {
        for value in self.set_cookie_headers() {
            headers.append(header::SET_COOKIE, value);
        }
    }
}

impl SessionStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        let jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        jar.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        jar.values.insert(key.to_string(), value.to_string());
        jar.changes.retain(|c| !matches!(c, CookieChange::Set(k, _) | CookieChange::Remove(k) if k == key));
        jar.changes.push(CookieChange::Set(key.to_string(), value.to_string()));
    }

    fn remove(&self, key: &str) {
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        jar.values.remove(key);
        jar.changes.retain(|c| !matches!(c, CookieChange::Set(k, _) | CookieChange::Remove(k) if k == key));
        jar.changes.push(CookieChange::Remove(key.to_string()));
    }
}

/// Parse a `Cookie` header into decoded name/value pairs
pub fn parse_cookies(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = urlencoding::decode(value.trim())
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.trim().to_string());
            Some((name.to_string(), value))
        })
        .collect()
}

/// Read one cookie from request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| parse_cookies(raw).remove(name))
}
