//! Static asset serving
//!
//! `/static/*` is served from the `assets/` directory embedded at build time.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use crate::api::middleware::cache_control_static;

/// Stylesheet, placeholder image and friends
#[derive(RustEmbed)]
#[folder = "assets/"]
struct StaticAssets;

/// Max age of embedded assets. They change only with a new binary.
const ASSET_MAX_AGE: u32 = 86400;

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let decoded = urlencoding::decode(&path).map(|p| p.into_owned()).unwrap_or(path);
    let asset_path = decoded.trim_start_matches('/');

    if asset_path.split('/').any(|segment| segment == "..") {
        return not_found();
    }

    match StaticAssets::get(asset_path) {
        Some(content) => build_response(asset_path, content.data.into_owned()),
        None => not_found(),
    }
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, get_content_type(path).to_string()),
            (header::CACHE_CONTROL, cache_control_static(ASSET_MAX_AGE, false)),
        ],
        data,
    )
        .into_response()
}

/// 404 response
fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "404 Not Found",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
