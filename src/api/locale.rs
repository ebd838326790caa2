//! Locale router
//!
//! Every page URL carries its locale as the first path segment. Requests
//! without one are redirected to the locale picked from the `NEXT_LOCALE`
//! cookie, then `Accept-Language`, then the configured default.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::middleware::AppState;
use crate::i18n::{is_excluded_path, locale_from_path, prefixed_path, resolve_locale, LOCALE_COOKIE};
use crate::services::read_cookie;

/// Locale redirect middleware
pub async fn locale_redirect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_excluded_path(path) || locale_from_path(path).is_some() {
        return next.run(request).await;
    }

    let cookie = read_cookie(request.headers(), LOCALE_COOKIE);
    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let locale = resolve_locale(cookie.as_deref(), accept_language, state.config.i18n.default_locale);

    let target = prefixed_path(locale, path, request.uri().query());
    tracing::debug!("Redirecting {} to {}", request.uri(), target);
    Redirect::temporary(&target).into_response()
}
