//! Dealership - multilingual vehicle dealership storefront
//!
//! Server-rendered Arabic/English storefront and back office over a REST
//! backend that owns all persistent data.

pub mod api;
pub mod config;
pub mod i18n;
pub mod models;
pub mod services;
pub mod theme;
