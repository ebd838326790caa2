//! Translation dictionaries
//!
//! A [`Dictionary`] is the full, typed set of UI strings for one locale. A
//! bundle that misses any key fails to decode, so templates and handlers can
//! rely on every field being present.
//!
//! Bundles are read from [`DictionarySource`]s in order (an optional directory
//! on disk first, then the bundles embedded in the binary). Nothing is cached:
//! each [`DictionaryLoader::load`] call reads its sources again.

use async_trait::async_trait;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::Locale;
use crate::models::CarType;

/// Dictionary errors
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// No source has a bundle for the locale
    #[error("No dictionary bundle for locale '{0}'")]
    Missing(Locale),

    /// A bundle exists but could not be read
    #[error("Failed to read dictionary '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A bundle exists but does not match the schema
    #[error("Invalid dictionary for locale '{locale}': {source}")]
    Invalid {
        locale: Locale,
        source: serde_json::Error,
    },

    /// Neither the requested nor the default locale could be loaded
    #[error("Dictionary for '{requested}' unavailable and default '{fallback}' failed: {source}")]
    Unavailable {
        requested: Locale,
        fallback: Locale,
        source: Box<DictionaryError>,
    },
}

/// Strings shared by every page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonText {
    pub site_name: String,
    pub tagline: String,
    pub home: String,
    pub cars: String,
    pub brands: String,
    pub importers: String,
    pub blog: String,
    pub admin: String,
    pub switch_language: String,
    pub view_details: String,
    pub read_more: String,
    pub search: String,
    pub filter: String,
    pub all: String,
    pub no_results: String,
    pub error_title: String,
    pub error_message: String,
    pub not_found_title: String,
    pub not_found_message: String,
    pub back_home: String,
    pub footer: String,
}

/// Homepage strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeText {
    pub featured_cars: String,
    pub featured_brands: String,
    pub latest_posts: String,
    pub see_all: String,
}

/// Vehicle strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarText {
    pub model: String,
    #[serde(rename = "type")]
    pub car_type: String,
    pub price: String,
    pub currency: String,
    pub description: String,
    pub brand: String,
    pub importer: String,
    pub photos: String,
}

/// Labels for every [`CarType`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CarTypeText {
    pub sedan: String,
    pub suv: String,
    pub pickup: String,
    pub berlin: String,
    pub compact: String,
    pub coupe: String,
    pub cabriolet: String,
    pub monospace: String,
}

impl CarTypeText {
    pub fn label(&self, car_type: CarType) -> &str {
        match car_type {
            CarType::Sedan => &self.sedan,
            CarType::Suv => &self.suv,
            CarType::Pickup => &self.pickup,
            CarType::Berlin => &self.berlin,
            CarType::Compact => &self.compact,
            CarType::Coupe => &self.coupe,
            CarType::Cabriolet => &self.cabriolet,
            CarType::Monospace => &self.monospace,
        }
    }
}

/// Brand page strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandText {
    pub cars_by_brand: String,
    pub importers_of_brand: String,
    pub no_cars: String,
}

/// Importer page strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterText {
    pub address: String,
    pub phone: String,
    pub email: String,
    pub brands: String,
    pub cars: String,
}

/// Blog strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogText {
    pub categories: String,
    pub tags: String,
    pub published_on: String,
    pub by_author: String,
    pub no_posts: String,
}

/// Back-office strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminText {
    pub dashboard: String,
    pub login_title: String,
    pub username: String,
    pub password: String,
    pub sign_in: String,
    pub sign_out: String,
    pub invalid_credentials: String,
    pub login_failed: String,
    pub signed_in_as: String,
    pub vehicles: String,
    pub brands: String,
    pub importers: String,
    pub blog_posts: String,
    pub hero_slides: String,
}

/// Every UI string for one locale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    pub common: CommonText,
    pub home: HomeText,
    pub car: CarText,
    pub car_types: CarTypeText,
    pub brand: BrandText,
    pub importer: ImporterText,
    pub blog: BlogText,
    pub admin: AdminText,
}

impl Dictionary {
    pub fn from_json(locale: Locale, raw: &str) -> Result<Self, DictionaryError> {
        serde_json::from_str(raw).map_err(|source| DictionaryError::Invalid { locale, source })
    }
}

/// Somewhere dictionary bundles can be read from
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Raw JSON bundle for `locale`, or [`DictionaryError::Missing`]
    async fn read(&self, locale: Locale) -> Result<String, DictionaryError>;
}

/// Bundles compiled into the binary
#[derive(RustEmbed)]
#[folder = "locales/"]
#[include = "*.json"]
struct EmbeddedBundles;

/// Bundles shipped inside the binary (`locales/{locale}.json`)
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedDictionaries;

#[async_trait]
impl DictionarySource for EmbeddedDictionaries {
    async fn read(&self, locale: Locale) -> Result<String, DictionaryError> {
        let file = EmbeddedBundles::get(&format!("{}.json", locale.code()))
            .ok_or(DictionaryError::Missing(locale))?;
        Ok(String::from_utf8_lossy(&file.data).into_owned())
    }
}

/// Bundles in a directory on disk (`{dir}/{locale}.json`)
#[derive(Debug, Clone)]
pub struct DirectoryDictionaries {
    path: PathBuf,
}

impl DirectoryDictionaries {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DictionarySource for DirectoryDictionaries {
    async fn read(&self, locale: Locale) -> Result<String, DictionaryError> {
        let file = self.path.join(format!("{}.json", locale.code()));
        match tokio::fs::read_to_string(&file).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DictionaryError::Missing(locale)),
            Err(source) => Err(DictionaryError::Io {
                path: file.display().to_string(),
                source,
            }),
        }
    }
}

/// Loads dictionaries with a single fallback to the default locale
pub struct DictionaryLoader {
    sources: Vec<Box<dyn DictionarySource>>,
    default_locale: Locale,
}

impl DictionaryLoader {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            sources: Vec::new(),
            default_locale,
        }
    }

    /// Loader over the embedded bundles, optionally overridden by a directory
    pub fn with_defaults(default_locale: Locale, directory: Option<PathBuf>) -> Self {
        let mut loader = Self::new(default_locale);
        if let Some(dir) = directory {
            loader = loader.with_source(DirectoryDictionaries::new(dir));
        }
        loader.with_source(EmbeddedDictionaries)
    }

    /// Append a source; earlier sources take precedence
    pub fn with_source(mut self, source: impl DictionarySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Load the dictionary for a locale code
    ///
    /// Unsupported codes resolve to the default locale. If the requested
    /// locale fails to load, the default locale is tried once; if that fails
    /// too the error is returned.
    pub async fn load(&self, locale: &str) -> Result<Dictionary, DictionaryError> {
        let requested = locale.parse::<Locale>().unwrap_or(self.default_locale);
        self.load_locale(requested).await
    }

    pub async fn load_locale(&self, requested: Locale) -> Result<Dictionary, DictionaryError> {
        let err = match self.read_first(requested).await {
            Ok(dictionary) => return Ok(dictionary),
            Err(e) => e,
        };

        if requested == self.default_locale {
            return Err(err);
        }

        tracing::warn!(
            "Dictionary for '{}' unavailable ({}), falling back to '{}'",
            requested,
            err,
            self.default_locale
        );

        self.read_first(self.default_locale)
            .await
            .map_err(|source| DictionaryError::Unavailable {
                requested,
                fallback: self.default_locale,
                source: Box::new(source),
            })
    }

    /// First source with a valid bundle wins
    async fn read_first(&self, locale: Locale) -> Result<Dictionary, DictionaryError> {
        let mut last_error = DictionaryError::Missing(locale);

        for source in &self.sources {
            match source.read(locale).await {
                Ok(raw) => match Dictionary::from_json(locale, &raw) {
                    Ok(dictionary) => return Ok(dictionary),
                    Err(e) => {
                        tracing::warn!("Skipping invalid dictionary bundle: {}", e);
                        last_error = e;
                    }
                },
                Err(DictionaryError::Missing(_)) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable dictionary bundle: {}", e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
