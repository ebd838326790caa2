//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::{self, ImageRef};
use super::reference::{null_as_default, EntityId, Identified, Reference};

/// Post author as embedded by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub username: String,
}

impl Identified for Author {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

/// Blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    /// Backend-authored HTML
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(
        default,
        alias = "featuredImage",
        deserialize_with = "image::deserialize_optional"
    )]
    pub featured_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, alias = "isPublished", deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default)]
    pub author: Option<Reference<Author>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for BlogPost {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

impl BlogPost {
    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|a| a.embedded())
            .map(|a| a.username.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Filter for the public blog listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl BlogFilter {
    /// Only published posts are ever listed publicly
    pub fn matches(&self, post: &BlogPost) -> bool {
        if !post.published {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            if !post.has_category(category) {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref().filter(|s| !s.is_empty()) {
            if !post.has_tag(tag) {
                return false;
            }
        }
        true
    }
}
