//! Image references
//!
//! Backend records carry image locations as loose strings: absolute URLs,
//! root-relative paths, Windows-style `uploads\\x\\y.png` paths, or bare file
//! names living in the backend's `uploads/` directory. They are classified once
//! into an [`ImageRef`] when a model is deserialized and resolved to an
//! absolute URL against the asset base when rendered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Asset served when a record has no image
pub const PLACEHOLDER_IMAGE: &str = "/static/placeholder.svg";

/// Where an image lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `http://` or `https://` URL, used verbatim
    Absolute,
    /// Path on the backend host, resolved against the asset base URL
    Relative,
}

/// A classified image location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    kind: ImageKind,
    path: String,
}

impl ImageRef {
    /// Classify a raw backend path. Returns `None` for empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if is_absolute(raw) {
            return Some(Self {
                kind: ImageKind::Absolute,
                path: raw.to_string(),
            });
        }

        Some(Self {
            kind: ImageKind::Relative,
            path: normalize_relative(raw),
        })
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Normalized path (forward slashes, always rooted for relative images)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve to an absolute URL against `base_url`
    pub fn url(&self, base_url: &str) -> String {
        match self.kind {
            ImageKind::Absolute => self.path.clone(),
            ImageKind::Relative => format!("{}{}", base_url.trim_end_matches('/'), self.path),
        }
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Turn a backend-relative path into a rooted path on the asset host.
///
/// `/a/b.png` stays as is, anything containing `uploads/` is cut down to the
/// part starting at `uploads/`, and bare names are placed under `/uploads/`.
fn normalize_relative(raw: &str) -> String {
    let path = raw.replace('\\', "/");

    if path.starts_with('/') {
        return path;
    }

    if let Some(idx) = path.find("uploads/") {
        return format!("/{}", &path[idx..]);
    }

    format!("/uploads/{}", path)
}

/// Map a backend image path to an absolute URL.
///
/// Missing or empty paths map to [`PLACEHOLDER_IMAGE`].
pub fn format_image_path(base_url: &str, path: Option<&str>) -> String {
    match path.and_then(ImageRef::parse) {
        Some(image) => image.url(base_url),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageRef::parse(&raw).ok_or_else(|| serde::de::Error::custom("empty image path"))
    }
}

/// Deserialize an optional image, treating `null` and `""` as absent
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ImageRef::parse))
}

/// Deserialize a photo list, dropping empty entries
pub fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|p| ImageRef::parse(&p))
        .collect())
}
