//! Admin API endpoints
//!
//! JSON and multipart endpoints behind `/api/admin`:
//! - POST /login, POST /logout, GET /session
//! - CRUD over cars, brands, importers, blog and hero-slides, proxied to the
//!   backend with the session's bearer token
//! - Hero slide reordering

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::middleware::{require_session, with_cookies, AdminSession, ApiError, AppState};
use crate::config::UploadConfig;
use crate::models::ReorderSlides;
use crate::services::{plan_move, FormMode, FormPayload, MoveDirection, Resource, UploadedFile};

/// Backend path of the batched hero slide reorder
const REORDER_PATH: &str = "hero-slides/reorder";

/// Files accepted in one form submission, used to size the body limit
const MAX_FILES_PER_FORM: u64 = 10;

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for a one-step slide move
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
}

/// Build the admin router
pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = body_limit(&state.config.upload);

    let resources = Router::new()
        .route("/hero-slides/reorder", put(reorder_slides))
        .route("/hero-slides/{id}/move", post(move_slide))
        .route("/{resource}", get(list).post(create))
        .route("/{resource}/{id}", get(fetch).put(update).delete(remove))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .merge(resources)
        .fallback(|| async { ApiError::not_found("Endpoint not found") })
}

fn body_limit(upload: &UploadConfig) -> usize {
    let limit = upload.max_file_size.saturating_mul(MAX_FILES_PER_FORM) + 1024 * 1024;
    usize::try_from(limit).unwrap_or(usize::MAX)
}

fn parse_resource(raw: &str) -> Result<Resource, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown resource: {}", raw)))
}

// ============================================================================
// Session
// ============================================================================

/// POST /api/admin/login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let auth = state.auth_context(&headers);
    let session = auth.login(&body.username, &body.password).await?;
    tracing::info!("Admin user {} logged in", session.user.username);
    Ok(with_cookies(auth.storage(), Json(session).into_response()))
}

/// POST /api/admin/logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = state.auth_context(&headers);
    auth.logout();
    with_cookies(auth.storage(), StatusCode::NO_CONTENT.into_response())
}

/// GET /api/admin/session
async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = state.auth_context(&headers);
    let response = match auth.user() {
        Some(user) => Json(user).into_response(),
        None => ApiError::unauthorized("Not logged in").into_response(),
    };
    with_cookies(auth.storage(), response)
}

// ============================================================================
// Resources
// ============================================================================

/// GET /api/admin/{resource}
async fn list(
    session: AdminSession,
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resource = parse_resource(&resource)?;
    let items = state.backend.get(resource.path(), &session.request_config()).await?;
    Ok(Json(items))
}

/// GET /api/admin/{resource}/{id}
async fn fetch(
    session: AdminSession,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let resource = parse_resource(&resource)?;
    let item = state
        .backend
        .get(&resource.item_path(&id), &session.request_config())
        .await?;
    Ok(Json(item))
}

/// POST /api/admin/{resource}
async fn create(
    session: AdminSession,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let resource = parse_resource(&resource)?;
    let payload = read_form(multipart).await?;
    payload.validate(resource, FormMode::Create, &state.config.upload)?;

    let created: Value = state
        .backend
        .post_form(resource.path(), payload.into_form()?, &session.request_config())
        .await?;
    tracing::info!("Created {} record", resource);
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/admin/{resource}/{id}
async fn update(
    session: AdminSession,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let resource = parse_resource(&resource)?;
    let payload = read_form(multipart).await?;
    payload.validate(resource, FormMode::Update, &state.config.upload)?;

    let updated = state
        .backend
        .put_form(&resource.item_path(&id), payload.into_form()?, &session.request_config())
        .await?;
    tracing::info!("Updated {} record {}", resource, id);
    Ok(Json(updated))
}

/// DELETE /api/admin/{resource}/{id}
async fn remove(
    session: AdminSession,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let resource = parse_resource(&resource)?;
    let _: Value = state
        .backend
        .delete(&resource.item_path(&id), &session.request_config())
        .await?;
    tracing::info!("Deleted {} record {}", resource, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Collect text fields and files of a multipart body
async fn read_form(mut multipart: Multipart) -> Result<FormPayload, ApiError> {
    let mut payload = FormPayload::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::validation_error(format!("Failed to read file {}: {}", filename, e))
                })?;
                payload.push_file(UploadedFile {
                    field: name,
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    ApiError::validation_error(format!("Failed to read field {}: {}", name, e))
                })?;
                payload.push_text(name, value);
            }
        }
    }

    Ok(payload)
}

// ============================================================================
// Hero slides
// ============================================================================

/// PUT /api/admin/hero-slides/reorder
async fn reorder_slides(
    session: AdminSession,
    State(state): State<AppState>,
    Json(body): Json<ReorderSlides>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .backend
        .put(REORDER_PATH, &body, &session.request_config())
        .await?;
    Ok(Json(result))
}

/// POST /api/admin/hero-slides/{id}/move
async fn move_slide(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<ReorderSlides>, ApiError> {
    let config = session.request_config();
    let slides = state.catalog.slides_with(&config).await?;
    let reorder = ReorderSlides {
        orders: plan_move(&slides, &id, body.direction)?,
    };

    let _: Value = state.backend.put(REORDER_PATH, &reorder, &config).await?;
    tracing::info!("Moved hero slide {} {:?}", id, body.direction);
    Ok(Json(reorder))
}
