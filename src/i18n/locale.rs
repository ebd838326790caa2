//! Locales and locale resolution
//!
//! Resolution order for a request without a locale segment:
//! 1. `NEXT_LOCALE` cookie (if it names a supported locale)
//! 2. `Accept-Language` header
//! 3. Configured default

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cookie remembering the visitor's locale choice
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// Prefixes that never get a locale segment
static EXCLUDED_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(api|static|uploads|_next)(/|$)|^/(favicon\.ico|robots\.txt)$")
        .expect("excluded prefix pattern")
});

/// Supported UI locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Text direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ar];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Locale::En => Direction::Ltr,
            Locale::Ar => Direction::Rtl,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.direction() == Direction::Rtl
    }

    /// The locale offered by the language switcher
    pub fn other(&self) -> Locale {
        match self {
            Locale::En => Locale::Ar,
            Locale::Ar => Locale::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            _ => Err(anyhow::anyhow!("Unsupported locale: {}", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ltr => write!(f, "ltr"),
            Direction::Rtl => write!(f, "rtl"),
        }
    }
}

/// Locale named by the first path segment, if any
pub fn locale_from_path(path: &str) -> Option<Locale> {
    let first = path.trim_start_matches('/').split('/').next()?;
    first.parse().ok()
}

/// Asset and API paths are left alone by the locale router
pub fn is_excluded_path(path: &str) -> bool {
    if EXCLUDED_PREFIX.is_match(path) {
        return true;
    }
    path.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

/// Pick a locale from an `Accept-Language` header
///
/// Entries are tried by descending quality; the first whose primary subtag is
/// supported wins. If none does, the accepted tags are searched for a locale code.
pub fn locale_from_accept_language(header: &str) -> Option<Locale> {
    let mut entries: Vec<(&str, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag, quality))
        })
        .filter(|(_, q)| *q > 0.0)
        .collect();

    // Stable sort keeps header order for equal weights
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let by_tag = entries.iter().find_map(|(tag, _)| {
        let primary = tag.split('-').next().unwrap_or(tag);
        primary.parse::<Locale>().ok()
    });

    // Refused (q=0) entries are already gone, so they cannot match here
    by_tag.or_else(|| {
        entries.iter().find_map(|(tag, _)| {
            let lower = tag.to_lowercase();
            Locale::ALL.into_iter().find(|l| lower.contains(l.code()))
        })
    })
}

/// Resolve a locale with cookie > Accept-Language > default priority
pub fn resolve_locale(cookie: Option<&str>, accept_language: Option<&str>, default: Locale) -> Locale {
    if let Some(locale) = cookie.and_then(|c| c.parse::<Locale>().ok()) {
        return locale;
    }

    if let Some(locale) = accept_language.and_then(locale_from_accept_language) {
        return locale;
    }

    default
}

/// `/{locale}{path}` with the query string preserved
pub fn prefixed_path(locale: Locale, path: &str, query: Option<&str>) -> String {
    let mut target = if path == "/" || path.is_empty() {
        format!("/{}", locale.code())
    } else {
        format!("/{}{}", locale.code(), path)
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Same page in another locale
pub fn switch_locale_path(path: &str, target: Locale) -> String {
    let trimmed = path.trim_start_matches('/');
    let rest = match trimmed.split_once('/') {
        Some((first, rest)) if first.parse::<Locale>().is_ok() => format!("/{}", rest),
        None if trimmed.parse::<Locale>().is_ok() => String::new(),
        _ => format!("/{}", trimmed),
    };
    if rest == "/" {
        return format!("/{}", target.code());
    }
    format!("/{}{}", target.code(), rest)
}
