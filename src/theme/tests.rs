//! Tests for the theme engine

use super::*;
use crate::i18n::{Dictionary, Locale};
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

const ASSET_BASE: &str = "http://backend:5000";

fn dictionary() -> Dictionary {
    Dictionary::from_json(Locale::En, include_str!("../../locales/en.json")).unwrap()
}

/// Context every page template expects
fn page_context() -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("t", &dictionary());
    context.insert("locale", "en");
    context.insert("dir", "ltr");
    context.insert("other_locale", "ar");
    context.insert("switch_url", "/ar");
    context.insert("year", &2024);
    context
}

#[test]
fn test_embedded_templates_loaded() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    for name in ["base.html", "home.html", "cars.html", "car.html", "error.html", "admin_login.html"] {
        assert!(engine.has_template(name), "missing {}", name);
    }
    assert!(engine.override_path().is_none());
}

#[test]
fn test_error_page_renders_localized() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let mut context = page_context();
    context.insert("title", "Page not found");
    context.insert("message", "Nope");

    let html = engine.render("error.html", &context).unwrap();
    assert!(html.contains("<html lang=\"en\" dir=\"ltr\">"));
    assert!(html.contains("Page not found"));
    assert!(html.contains("href=\"/ar\""));
}

#[test]
fn test_output_escaping_keeps_urls() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let mut context = page_context();
    context.insert("title", "<script>alert('x')</script> & co");
    context.insert("message", "a/b");

    let html = engine.render("error.html", &context).unwrap();
    assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; co"));
    assert!(!html.contains("<script>"));
    assert!(html.contains("a/b"));
    assert!(html.contains("href=\"/ar\""));
}

#[test]
fn test_image_url_filter() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let mut context = page_context();
    context.insert(
        "car",
        &serde_json::json!({
            "id": "c1", "model": "Hilux", "type": "PICKUP", "price": "30000",
            "description": "", "photos": ["uploads\\cars\\1.jpg"]
        }),
    );
    context.insert("brands", &Vec::<serde_json::Value>::new());
    context.insert("importer", &serde_json::Value::Null);

    let html = engine.render("car.html", &context).unwrap();
    assert!(html.contains("src=\"http://backend:5000/uploads/cars/1.jpg\""));
    assert!(html.contains("Pickup"));
}

#[test]
fn test_missing_image_renders_placeholder() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let mut context = page_context();
    context.insert("brands", &serde_json::json!([{"id": "b1", "name": "Kia", "logo": null}]));

    let html = engine.render("brands.html", &context).unwrap();
    assert!(html.contains(crate::models::PLACEHOLDER_IMAGE));
}

#[test]
fn test_override_directory_replaces_template() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("error.html"),
        "<p>custom {{ title }}</p>",
    )
    .unwrap();

    let engine = ThemeEngine::new(Some(temp_dir.path()), ASSET_BASE).unwrap();
    let mut context = TeraContext::new();
    context.insert("title", "oops");

    assert_eq!(engine.render("error.html", &context).unwrap(), "<p>custom oops</p>");
    assert!(engine.has_template("home.html"));
}

#[test]
fn test_missing_override_directory() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope");
    assert!(matches!(
        ThemeEngine::new(Some(&missing), ASSET_BASE),
        Err(ThemeError::NotFound(_))
    ));
}

#[test]
fn test_render_with_fallback_uses_error_template() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let html = engine.render_with_fallback("does-not-exist.html", &page_context());
    assert!(html.contains("Something went wrong"));
    assert!(html.contains(&dictionary().common.back_home));
}

#[test]
fn test_render_with_fallback_last_resort() {
    let engine = ThemeEngine::new(None, ASSET_BASE).unwrap();
    let html = engine.render_with_fallback("does-not-exist.html", &TeraContext::new());
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Something went wrong"));
}

#[test]
fn test_broken_override_reported() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("broken.html"), "{% if %}").unwrap();
    assert!(matches!(
        ThemeEngine::new(Some(temp_dir.path()), ASSET_BASE),
        Err(ThemeError::TemplateError(_))
    ));
}
