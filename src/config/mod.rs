//! Configuration management
//!
//! This module handles loading and parsing configuration for the storefront.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::i18n::Locale;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// REST backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Locale and dictionary configuration
    #[serde(default)]
    pub i18n: I18nConfig,
    /// Template override configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Admin session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Admin upload limits
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for the admin front end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Root of the REST API, e.g. `http://localhost:5000/api`
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Host that serves uploaded images. Derived from `base_url` when absent.
    #[serde(default)]
    pub asset_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            asset_url: None,
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:5000/api".to_string()
}

impl BackendConfig {
    /// Base URL images are resolved against
    ///
    /// Without an explicit `asset_url` this is `base_url` with a trailing
    /// `/api` segment removed, since uploads are served from the host root.
    pub fn asset_base(&self) -> String {
        if let Some(url) = self.asset_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        base.strip_suffix("/api").unwrap_or(base).to_string()
    }
}

/// Locale configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Locale used when neither cookie nor Accept-Language decide
    #[serde(default)]
    pub default_locale: Locale,
    /// Directory of `{locale}.json` bundles overriding the embedded ones
    #[serde(default)]
    pub dictionaries_path: Option<PathBuf>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            dictionaries_path: None,
        }
    }
}

/// Template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory of templates overriding the embedded ones
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Max-Age of the session cookies in seconds (default: 7 days)
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_max_age_secs: default_cookie_max_age(),
        }
    }
}

fn default_cookie_max_age() -> u64 {
    7 * 24 * 60 * 60
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - DEALERSHIP_SERVER_HOST
    /// - DEALERSHIP_SERVER_PORT
    /// - DEALERSHIP_SERVER_CORS_ORIGIN
    /// - DEALERSHIP_BACKEND_URL
    /// - DEALERSHIP_ASSET_URL
    /// - DEALERSHIP_DEFAULT_LOCALE
    /// - DEALERSHIP_DICTIONARIES_PATH
    /// - DEALERSHIP_THEME_PATH
    /// - DEALERSHIP_SESSION_MAX_AGE
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("DEALERSHIP_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("DEALERSHIP_SERVER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(cors_origin) = var("DEALERSHIP_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Some(url) = var("DEALERSHIP_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(url) = var("DEALERSHIP_ASSET_URL") {
            self.backend.asset_url = Some(url);
        }

        if let Some(locale) = var("DEALERSHIP_DEFAULT_LOCALE") {
            match locale.parse::<Locale>() {
                Ok(locale) => self.i18n.default_locale = locale,
                Err(_) => tracing::warn!("Ignoring unsupported DEALERSHIP_DEFAULT_LOCALE '{}'", locale),
            }
        }
        if let Some(path) = var("DEALERSHIP_DICTIONARIES_PATH") {
            self.i18n.dictionaries_path = Some(PathBuf::from(path));
        }

        if let Some(path) = var("DEALERSHIP_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
        }

        if let Some(max_age) = var("DEALERSHIP_SESSION_MAX_AGE").and_then(|v| v.parse().ok()) {
            self.session.cookie_max_age_secs = max_age;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(std::path::Path::new("/nonexistent/config.yml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backend.base_url, "http://localhost:5000/api");
        assert_eq!(config.i18n.default_locale, Locale::En);
        assert_eq!(config.session.cookie_max_age_secs, 604800);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "backend:\n  base_url: https://api.cars.example/api\ni18n:\n  default_locale: ar").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.backend.base_url, "https://api.cars.example/api");
        assert_eq!(config.i18n.default_locale, Locale::Ar);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.upload.is_type_allowed("image/png"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: [not a port").unwrap();

        match Config::load(file.path()) {
            Err(ConfigError::ParseError { message, .. }) => assert!(message.contains("line")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEALERSHIP_SERVER_PORT", "8088"),
            ("DEALERSHIP_BACKEND_URL", "http://backend:9000/api"),
            ("DEALERSHIP_DEFAULT_LOCALE", "ar"),
            ("DEALERSHIP_SESSION_MAX_AGE", "60"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.backend.base_url, "http://backend:9000/api");
        assert_eq!(config.i18n.default_locale, Locale::Ar);
        assert_eq!(config.session.cookie_max_age_secs, 60);
    }

    #[test]
    fn test_invalid_override_values_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "DEALERSHIP_SERVER_PORT" => Some("not-a-port".to_string()),
            "DEALERSHIP_DEFAULT_LOCALE" => Some("fr".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.i18n.default_locale, Locale::En);
    }

    #[test]
    fn test_asset_base() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.asset_base(), "http://localhost:5000");

        backend.base_url = "http://localhost:5000/api/".to_string();
        assert_eq!(backend.asset_base(), "http://localhost:5000");

        backend.base_url = "http://localhost:5000/v2".to_string();
        assert_eq!(backend.asset_base(), "http://localhost:5000/v2");

        backend.asset_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(backend.asset_base(), "https://cdn.example.com");
    }
}
