//! Brand and importer models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::{self, ImageRef};
use super::reference::{null_as_default, EntityId, Identified, Reference};

/// Vehicle brand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "image::deserialize_optional")]
    pub logo: Option<ImageRef>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Brand {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

/// Dealership or distributor representing one or more brands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Importer {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(
        default,
        alias = "profileImage",
        alias = "profile_image",
        deserialize_with = "image::deserialize_optional"
    )]
    pub image: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brands: Vec<Reference<Brand>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Importer {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

impl Importer {
    pub fn carries_brand(&self, brand_id: &str) -> bool {
        self.brands.iter().any(|b| b.id() == brand_id)
    }

    pub fn brand_ids(&self) -> Vec<&EntityId> {
        self.brands.iter().map(|b| b.id()).collect()
    }
}
