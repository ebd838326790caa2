//! Internationalization
//!
//! Two locales are supported, English and Arabic (right-to-left). Every
//! storefront path carries its locale as the first segment (`/{locale}/...`);
//! translated strings come from a typed [`Dictionary`] per locale.

mod dictionary;
mod locale;

pub use dictionary::{
    AdminText, BlogText, BrandText, CarText, CarTypeText, CommonText, Dictionary, DictionaryError,
    DictionaryLoader, DictionarySource, DirectoryDictionaries, EmbeddedDictionaries, HomeText,
    ImporterText,
};
pub use locale::{
    is_excluded_path, locale_from_accept_language, locale_from_path, prefixed_path, resolve_locale,
    switch_locale_path, Direction, Locale, LOCALE_COOKIE,
};
