//! Data models
//!
//! Records owned by the REST backend, mirrored for display and editing:
//! - Car, Brand, Importer, BlogPost, HeroSlide
//! - AuthSession (client-only)
//! - ImageRef, classified once at deserialization

mod blog_post;
mod brand;
mod car;
mod hero_slide;
pub mod image;
mod reference;
mod session;

pub use blog_post::{Author, BlogFilter, BlogPost};
pub use brand::{Brand, Importer};
pub use car::{Car, CarFilter, CarType};
pub use hero_slide::{active_in_order, HeroSlide, ReorderSlides, SlideOrder};
pub use image::{format_image_path, ImageKind, ImageRef, PLACEHOLDER_IMAGE};
pub use reference::{Envelope, EntityId, Identified, Reference};
pub use session::{AuthSession, AuthUser, UserRole};
