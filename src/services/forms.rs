//! Admin form payloads
//!
//! Back-office writes arrive as multipart forms, are checked against the
//! per-resource field rules, and are forwarded to the backend as a fresh
//! multipart body.

use std::fmt;
use std::str::FromStr;

use reqwest::multipart::{Form, Part};

use crate::config::UploadConfig;
use crate::models::CarType;

/// Back-office resources proxied to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cars,
    Brands,
    Importers,
    Blog,
    HeroSlides,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Cars,
        Resource::Brands,
        Resource::Importers,
        Resource::Blog,
        Resource::HeroSlides,
    ];

    /// Backend collection path
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Cars => "cars",
            Resource::Brands => "brands",
            Resource::Importers => "importers",
            Resource::Blog => "blog",
            Resource::HeroSlides => "hero-slides",
        }
    }

    /// Backend path of one record
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), urlencoding::encode(id))
    }

    fn rules(&self) -> &'static [FieldRule] {
        match self {
            Resource::Cars => CAR_RULES,
            Resource::Brands | Resource::Importers => NAMED_RULES,
            Resource::Blog => BLOG_RULES,
            Resource::HeroSlides => SLIDE_RULES,
        }
    }
}

const CAR_RULES: &[FieldRule] = &[
    FieldRule::required("model"),
    FieldRule::required("type"),
    FieldRule::required("price"),
    FieldRule::optional("description").min_len(10),
];
const NAMED_RULES: &[FieldRule] = &[FieldRule::required("name")];
const BLOG_RULES: &[FieldRule] = &[
    FieldRule::required("title"),
    FieldRule::required("content").min_len(10),
];
const SLIDE_RULES: &[FieldRule] = &[FieldRule::required("title")];

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.path() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown resource: {}", s))
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    required: bool,
    min_len: usize,
}

impl FieldRule {
    const fn required(name: &'static str) -> Self {
        Self { name, required: true, min_len: 0 }
    }

    const fn optional(name: &'static str) -> Self {
        Self { name, required: false, min_len: 0 }
    }

    const fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }
}

/// Whether a form creates a record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Validation failures
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Field '{0}' is required")]
    Missing(&'static str),

    #[error("Field '{field}' must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Unknown car type: {0}")]
    InvalidCarType(String),

    #[error("Invalid file type for {filename}: {content_type}")]
    FileType { filename: String, content_type: String },

    #[error("File {filename} is too large. Maximum size: {max} bytes")]
    FileTooLarge { filename: String, max: u64 },

    #[error("Invalid upload {filename}: {reason}")]
    InvalidPart { filename: String, reason: String },
}

/// A file received in a form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields and files of one submitted form, in submission order
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// First value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Check the payload against the resource's rules and upload limits
    pub fn validate(&self, resource: Resource, mode: FormMode, upload: &UploadConfig) -> Result<(), FormError> {
        for rule in resource.rules() {
            let sent = self.text(rule.name).map(str::trim);
            let value = sent.filter(|v| !v.is_empty());
            match value {
                // Updates may omit a required field but may not blank it
                None if rule.required && (mode == FormMode::Create || sent.is_some()) => {
                    return Err(FormError::Missing(rule.name));
                }
                Some(v) if v.chars().count() < rule.min_len => {
                    return Err(FormError::TooShort {
                        field: rule.name,
                        min: rule.min_len,
                    });
                }
                _ => {}
            }
        }

        if resource == Resource::Cars {
            if let Some(raw) = self.text("type").map(str::trim).filter(|v| !v.is_empty()) {
                raw.parse::<CarType>()
                    .map_err(|_| FormError::InvalidCarType(raw.to_string()))?;
            }
        }

        for file in &self.files {
            if !upload.is_type_allowed(&file.content_type) {
                return Err(FormError::FileType {
                    filename: file.filename.clone(),
                    content_type: file.content_type.clone(),
                });
            }
            if file.data.len() as u64 > upload.max_file_size {
                return Err(FormError::FileTooLarge {
                    filename: file.filename.clone(),
                    max: upload.max_file_size,
                });
            }
        }

        Ok(())
    }

    /// Rebuild the payload as an outgoing multipart form
    pub fn into_form(self) -> Result<Form, FormError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = Part::bytes(file.data)
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)
                .map_err(|e| FormError::InvalidPart {
                    filename: file.filename,
                    reason: e.to_string(),
                })?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}
