//! API layer - HTTP handlers and routing
//!
//! - Localized storefront and back-office pages under `/{locale}`
//! - Admin JSON API under `/api/admin`
//! - Embedded static assets under `/static`
//! - Locale redirect for every path without a locale prefix

pub mod admin;
pub mod locale;
pub mod middleware;
pub mod static_files;
pub mod storefront;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{cache_control_no_cache, cache_control_static, AdminSession, ApiError, AppState};

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .nest("/api/admin", admin::router(state.clone()))
        .route("/static/{*path}", get(static_files::serve_static))
        .merge(storefront::router())
        .fallback(storefront::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            locale::locale_redirect,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the admin API, with cookie credentials
fn cors_layer(origin: &str) -> CorsLayer {
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(e) => {
            tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
            CorsLayer::new()
        }
    }
}
