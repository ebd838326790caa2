//! Public storefront and back-office pages
//!
//! Server-rendered pages under `/{locale}`. Every page loads the locale's
//! dictionary, fetches its data from the backend and renders a template.

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::middleware::{cache_control_no_cache, with_cookies, AppState};
use crate::i18n::{locale_from_path, switch_locale_path, Dictionary, Locale, LOCALE_COOKIE};
use crate::models::{BlogFilter, BlogPost, CarFilter};
use crate::services::{AuthError, BackendError, DashboardCounts};
use crate::theme::simple_error_page;

/// Lifetime of the locale preference cookie
const LOCALE_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Build the storefront router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{locale}", get(home))
        .route("/{locale}/cars", get(cars))
        .route("/{locale}/cars/{id}", get(car))
        .route("/{locale}/brands", get(brands))
        .route("/{locale}/brands/{id}", get(brand))
        .route("/{locale}/importers", get(importers))
        .route("/{locale}/importers/{id}", get(importer))
        .route("/{locale}/blog", get(blog))
        .route("/{locale}/blog/{slug}", get(blog_post))
        .route("/{locale}/admin", get(dashboard))
        .route("/{locale}/admin/login", get(login_form).post(login))
        .route("/{locale}/admin/logout", post(logout))
}

/// Request-scoped rendering context: locale, its dictionary and the path
pub struct Page {
    state: AppState,
    locale: Locale,
    dictionary: Dictionary,
    path: String,
}

impl FromRequestParts<AppState> for Page {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let requested = locale_from_path(&path);
        let locale = requested.unwrap_or_else(|| state.dictionaries.default_locale());

        let dictionary = state.dictionaries.load_locale(locale).await.map_err(|e| {
            tracing::error!("Failed to load dictionary for {}: {}", locale, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(simple_error_page("Something went wrong", "Translations are unavailable.")),
            )
                .into_response()
        })?;

        let page = Page {
            state: state.clone(),
            locale,
            dictionary,
            path,
        };

        // Paths like `/fr/cars` reach here with an unsupported first segment
        if requested.is_none() {
            return Err(page.not_found());
        }
        Ok(page)
    }
}

impl Page {
    /// Variables shared by every template
    fn context(&self) -> TeraContext {
        let mut context = TeraContext::new();
        context.insert("t", &self.dictionary);
        context.insert("locale", self.locale.code());
        context.insert("dir", &self.locale.direction());
        context.insert("other_locale", self.locale.other().code());
        context.insert("switch_url", &switch_locale_path(&self.path, self.locale.other()));
        context.insert("path", &self.path);
        context.insert("year", &chrono::Utc::now().year());
        context
    }

    fn render(&self, status: StatusCode, template: &str, context: &TeraContext) -> Response {
        let html = self.state.theme.render_with_fallback(template, context);
        let mut response = (status, Html(html)).into_response();

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&cache_control_no_cache()) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        let cookie = format!(
            "{}={}; Path=/; SameSite=Lax; Max-Age={}",
            LOCALE_COOKIE,
            self.locale.code(),
            LOCALE_COOKIE_MAX_AGE
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
        response
    }

    /// Render `template` with `data` merged into the shared context
    fn render_data<T: Serialize>(&self, template: &str, data: &T) -> Response {
        let mut context = self.context();
        match TeraContext::from_serialize(data) {
            Ok(extra) => context.extend(extra),
            Err(e) => {
                tracing::error!("Failed to build context for '{}': {}", template, e);
                return self.error_page(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        self.render(StatusCode::OK, template, &context)
    }

    /// Render fetched data, or the matching error page when the fetch failed
    fn show<T: Serialize>(&self, template: &str, data: Result<T, BackendError>) -> Response {
        match data {
            Ok(data) => self.render_data(template, &data),
            Err(e) => self.backend_error(e),
        }
    }

    fn backend_error(&self, err: BackendError) -> Response {
        if err.is_not_found() {
            return self.not_found();
        }
        tracing::warn!("Backend request for {} failed: {}", self.path, err);
        self.error_page(StatusCode::BAD_GATEWAY)
    }

    fn error_page(&self, status: StatusCode) -> Response {
        let mut context = self.context();
        context.insert("title", &self.dictionary.common.error_title);
        context.insert("message", &self.dictionary.common.error_message);
        self.render(status, "error.html", &context)
    }

    fn not_found(&self) -> Response {
        let mut context = self.context();
        context.insert("title", &self.dictionary.common.not_found_title);
        context.insert("message", &self.dictionary.common.not_found_message);
        self.render(StatusCode::NOT_FOUND, "error.html", &context)
    }

    fn url(&self, path: &str) -> String {
        format!("/{}{}", self.locale.code(), path)
    }
}

/// Page data plus the filter that produced it
#[derive(Serialize)]
struct Filtered<'a, T: Serialize, F: Serialize> {
    #[serde(flatten)]
    data: T,
    filter: &'a F,
}

async fn home(page: Page) -> Response {
    page.show("home.html", page.state.catalog.home().await)
}

async fn cars(page: Page, Query(filter): Query<CarFilter>) -> Response {
    let listing = page.state.catalog.car_listing(&filter).await;
    page.show("cars.html", listing.map(|data| Filtered { data, filter: &filter }))
}

async fn car(page: Page, Path((_, id)): Path<(String, String)>) -> Response {
    page.show("car.html", page.state.catalog.car_detail(&id).await)
}

#[derive(Serialize)]
struct BrandList {
    brands: Vec<crate::models::Brand>,
}

async fn brands(page: Page) -> Response {
    let brands = page.state.catalog.brands().await;
    page.show("brands.html", brands.map(|brands| BrandList { brands }))
}

async fn brand(page: Page, Path((_, id)): Path<(String, String)>) -> Response {
    page.show("brand.html", page.state.catalog.brand_detail(&id).await)
}

#[derive(Serialize)]
struct ImporterList {
    importers: Vec<crate::models::Importer>,
}

async fn importers(page: Page) -> Response {
    let importers = page.state.catalog.importers().await;
    page.show("importers.html", importers.map(|importers| ImporterList { importers }))
}

async fn importer(page: Page, Path((_, id)): Path<(String, String)>) -> Response {
    page.show("importer.html", page.state.catalog.importer_detail(&id).await)
}

#[derive(Serialize)]
struct PostList {
    posts: Vec<BlogPost>,
}

async fn blog(page: Page, Query(filter): Query<BlogFilter>) -> Response {
    let posts = page.state.catalog.blog(&filter).await;
    page.show(
        "blog.html",
        posts.map(|posts| Filtered {
            data: PostList { posts },
            filter: &filter,
        }),
    )
}

#[derive(Serialize)]
struct PostPage {
    author: Option<String>,
    post: BlogPost,
}

async fn blog_post(page: Page, Path((_, slug)): Path<(String, String)>) -> Response {
    let post = page.state.catalog.post(&slug).await.map(|post| PostPage {
        author: post.author_name().map(str::to_string),
        post,
    });
    page.show("post.html", post)
}

// ============================================================================
// Back office
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn login_page(page: &Page, status: StatusCode, username: &str, error: Option<&str>) -> Response {
    let mut context = page.context();
    context.insert("username", username);
    context.insert("error", &error);
    page.render(status, "admin_login.html", &context)
}

/// GET /{locale}/admin/login
async fn login_form(page: Page, headers: HeaderMap) -> Response {
    let auth = page.state.auth_context(&headers);
    if auth.is_authenticated() {
        return Redirect::to(&page.url("/admin")).into_response();
    }
    with_cookies(auth.storage(), login_page(&page, StatusCode::OK, "", None))
}

/// POST /{locale}/admin/login
async fn login(
    page: Page,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = page.state.auth_context(&headers);
    let response = match auth.login(&form.username, &form.password).await {
        Ok(_) => Redirect::to(&page.url("/admin")).into_response(),
        Err(AuthError::InvalidCredentials | AuthError::MissingCredentials) => login_page(
            &page,
            StatusCode::UNAUTHORIZED,
            &form.username,
            Some(page.dictionary.admin.invalid_credentials.as_str()),
        ),
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            login_page(
                &page,
                StatusCode::BAD_GATEWAY,
                &form.username,
                Some(page.dictionary.admin.login_failed.as_str()),
            )
        }
    };
    with_cookies(auth.storage(), response)
}

#[derive(Serialize)]
struct DashboardPage {
    user: crate::models::AuthUser,
    counts: DashboardCounts,
}

/// GET /{locale}/admin
async fn dashboard(page: Page, headers: HeaderMap) -> Response {
    let auth = page.state.auth_context(&headers);
    let Some(session) = auth.session() else {
        return with_cookies(auth.storage(), Redirect::to(&page.url("/admin/login")).into_response());
    };

    let response = match page.state.catalog.dashboard(&auth.request_config()).await {
        Ok(counts) => page.render_data(
            "admin_dashboard.html",
            &DashboardPage {
                user: session.user,
                counts,
            },
        ),
        Err(BackendError::Status { status: 401, .. }) => {
            tracing::info!("Stored session rejected by backend, signing out");
            auth.logout();
            Redirect::to(&page.url("/admin/login")).into_response()
        }
        Err(e) => page.backend_error(e),
    };
    with_cookies(auth.storage(), response)
}

/// POST /{locale}/admin/logout
async fn logout(page: Page, headers: HeaderMap) -> Response {
    let auth = page.state.auth_context(&headers);
    auth.logout();
    with_cookies(auth.storage(), Redirect::to(&page.url("/admin/login")).into_response())
}

/// Fallback for unmatched paths
pub async fn not_found(page: Page) -> Response {
    page.not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::HeaderName;
    use axum_test::{TestResponse, TestServer};
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{}", route)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn app(backend: &MockServer) -> TestServer {
        let mut config = Config::default();
        config.backend.base_url = format!("{}/api", backend.uri());
        let state = AppState::new(config).unwrap();
        TestServer::new(router().fallback(not_found).with_state(state)).unwrap()
    }

    fn session_cookie() -> HeaderValue {
        let user = json!({"id": "u1", "username": "admin", "role": "admin"}).to_string();
        let raw = format!("token=abc123; user={}", urlencoding::encode(&user));
        HeaderValue::from_str(&raw).unwrap()
    }

    fn set_cookies(response: &TestResponse) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn location(response: &TestResponse) -> String {
        response.header(header::LOCATION).to_str().unwrap().to_string()
    }

    async fn mount_home(backend: &MockServer) {
        mount(backend, "hero-slides", 200, json!([{"id": "s1", "title": "Summer deals", "order": 1}])).await;
        mount(backend, "brands", 200, json!([{"_id": "b1", "name": "Toyota"}])).await;
        mount(backend, "cars", 200, json!([{"_id": "c1", "model": "Land Cruiser", "type": "SUV", "price": 90000}])).await;
        mount(backend, "blog", 200, json!([])).await;
    }

    #[tokio::test]
    async fn test_home_in_both_locales() {
        let backend = MockServer::start().await;
        mount_home(&backend).await;
        let server = app(&backend);

        let response = server.get("/en").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let html = response.text();
        assert!(html.contains("dir=\"ltr\""));
        assert!(html.contains("Summer deals"));
        assert!(html.contains("Land Cruiser"));
        assert!(html.contains("href=\"/ar\""));
        assert!(set_cookies(&response).iter().any(|c| c.starts_with("NEXT_LOCALE=en;")));

        let response = server.get("/ar").await;
        let html = response.text();
        assert!(html.contains("<html lang=\"ar\" dir=\"rtl\">"));
        assert!(html.contains("سوق السيارات"));
    }

    #[tokio::test]
    async fn test_backend_failure_renders_error_page() {
        let backend = MockServer::start().await;
        mount(&backend, "brands", 500, json!({"message": "boom"})).await;
        let server = app(&backend);

        let response = server.get("/en/brands").await;
        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        assert!(response.text().contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_missing_records_render_not_found() {
        let backend = MockServer::start().await;
        mount(&backend, "cars/nope", 404, json!({"message": "Car not found"})).await;
        mount(&backend, "blog/draft", 200, json!({"_id": "p1", "title": "Draft", "slug": "draft"})).await;
        let server = app(&backend);

        let response = server.get("/ar/cars/nope").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.text().contains("الصفحة غير موجودة"));

        let response = server.get("/en/blog/draft").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_published_post_renders() {
        let backend = MockServer::start().await;
        mount(&backend, "blog/live", 200, json!({
            "_id": "p2",
            "title": "Live",
            "slug": "live",
            "published": true,
            "content": "<p>Hello there</p>",
            "author": {"_id": "u1", "username": "salma"},
            "tags": ["news"]
        }))
        .await;
        let server = app(&backend);

        let response = server.get("/en/blog/live").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<h1>Live</h1>"));
        assert!(html.contains("<p>Hello there</p>"));
        assert!(html.contains("salma"));
        assert!(html.contains("href=\"/en/blog?tag=news\""));
    }

    #[tokio::test]
    async fn test_unsupported_locale_is_not_found() {
        let backend = MockServer::start().await;
        let server = app(&backend);

        let response = server.get("/fr/cars").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.text().contains("Page not found"));

        let response = server.get("/en/no/such/page").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_car_listing_keeps_filter() {
        let backend = MockServer::start().await;
        mount(&backend, "cars", 200, json!([
            {"_id": "c1", "model": "Land Cruiser", "type": "SUV", "price": 90000},
            {"_id": "c2", "model": "Civic", "type": "SEDAN", "price": 21000}
        ]))
        .await;
        mount(&backend, "brands", 200, json!([])).await;
        let server = app(&backend);

        let html = server.get("/en/cars?type=SEDAN").await.text();
        assert!(html.contains("Civic"));
        assert!(!html.contains("Land Cruiser"));
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let backend = MockServer::start().await;
        let server = app(&backend);

        let response = server.get("/en/admin").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/en/admin/login");
    }

    #[tokio::test]
    async fn test_dashboard_with_session() {
        let backend = MockServer::start().await;
        for route in ["cars", "brands", "importers", "blog", "hero-slides"] {
            Mock::given(method("GET"))
                .and(path(format!("/api/{}", route)))
                .and(header_eq("authorization", "Bearer abc123"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
                .mount(&backend)
                .await;
        }
        let server = app(&backend);

        let response = server.get("/en/admin").add_header(header::COOKIE, session_cookie()).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let html = response.text();
        assert!(html.contains("Signed in as admin"));
        assert!(html.contains("<span class=\"count\">2</span>"));
    }

    #[tokio::test]
    async fn test_dashboard_signs_out_on_rejected_token() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
            .mount(&backend)
            .await;
        let server = app(&backend);

        let response = server.get("/en/admin").add_header(header::COOKIE, session_cookie()).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert!(set_cookies(&response).iter().any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_login_success_sets_session_cookies() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc123",
                "user": {"_id": "u1", "username": "admin", "role": "admin"}
            })))
            .mount(&backend)
            .await;
        let server = app(&backend);

        let response = server
            .post("/ar/admin/login")
            .form(&json!({"username": "admin", "password": "secret"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/ar/admin");
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("token=abc123;")));
        assert!(cookies.iter().any(|c| c.starts_with("user=")));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
            .mount(&backend)
            .await;
        let server = app(&backend);

        let response = server
            .post("/en/admin/login")
            .form(&json!({"username": "admin", "password": "wrong"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let html = response.text();
        assert!(html.contains("Invalid username or password."));
        assert!(html.contains("value=\"admin\""));
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_signed_in() {
        let backend = MockServer::start().await;
        let server = app(&backend);

        let response = server.get("/en/admin/login").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = server.get("/en/admin/login").add_header(header::COOKIE, session_cookie()).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/en/admin");
    }

    #[tokio::test]
    async fn test_logout_clears_cookies() {
        let backend = MockServer::start().await;
        let server = app(&backend);

        let response = server
            .post("/en/admin/logout")
            .add_header(HeaderName::from_static("cookie"), session_cookie())
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/en/admin/login");
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));
        assert!(cookies.iter().any(|c| c.starts_with("user=;") && c.contains("Max-Age=0")));
    }
}
