//! Shared wire helpers for backend records
//!
//! The backend is loose about identifiers (numeric or string, `id` or `_id`)
//! and about whether related records arrive embedded or as bare ids.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque backend identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Loose::Str(s) => s,
            Loose::Int(n) => n.to_string(),
            Loose::Float(n) => n.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Loose::deserialize(deserializer)?.into_string()))
    }
}

/// Accept a string or a number (prices arrive both ways) and keep it textual
pub fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Loose> = Option::deserialize(deserializer)?;
    Ok(raw.map(Loose::into_string).unwrap_or_default())
}

/// Treat an explicit JSON `null` like a missing field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A related record, either embedded by the backend or referenced by id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Embedded(T),
    Id(EntityId),
}

/// Records that carry their own id
pub trait Identified {
    fn entity_id(&self) -> &EntityId;
}

impl<T: Identified> Reference<T> {
    pub fn id(&self) -> &EntityId {
        match self {
            Reference::Embedded(record) => record.entity_id(),
            Reference::Id(id) => id,
        }
    }

    pub fn embedded(&self) -> Option<&T> {
        match self {
            Reference::Embedded(record) => Some(record),
            Reference::Id(_) => None,
        }
    }
}

/// List responses come either bare or wrapped in `{"data": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}
