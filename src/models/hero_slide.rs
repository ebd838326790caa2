//! Homepage carousel slide model

use serde::{Deserialize, Serialize};

use super::image::{self, ImageRef};
use super::reference::{null_as_default, EntityId, Identified};

/// Homepage carousel entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSlide {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "image::deserialize_optional")]
    pub image: Option<ImageRef>,
    #[serde(default, alias = "buttonText")]
    pub button_text: Option<String>,
    #[serde(default, alias = "buttonLink")]
    pub button_link: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active", alias = "isActive")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Identified for HeroSlide {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

/// One entry of a batched reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideOrder {
    pub id: EntityId,
    pub order: i32,
}

/// Batched reorder payload sent to the backend in a single request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderSlides {
    pub orders: Vec<SlideOrder>,
}

/// Active slides sorted by their display order
pub fn active_in_order(mut slides: Vec<HeroSlide>) -> Vec<HeroSlide> {
    slides.retain(|s| s.active);
    slides.sort_by_key(|s| s.order);
    slides
}
