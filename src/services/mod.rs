//! Services layer
//!
//! Everything that talks to the REST backend or holds session state:
//! - `backend`: HTTP client with per-request configuration
//! - `auth` and `storage`: back-office session and where it is persisted
//! - `catalog`: storefront page composition
//! - `forms` and `hero`: admin write validation and slide ordering

pub mod auth;
pub mod backend;
pub mod catalog;
pub mod forms;
pub mod hero;
pub mod storage;

pub use auth::{AuthContext, AuthError, TOKEN_KEY, USER_KEY};
pub use backend::{BackendClient, BackendError, RequestConfig};
pub use catalog::{
    BrandDetail, CarDetail, CarListing, CatalogService, DashboardCounts, HomePage, ImporterDetail,
};
pub use forms::{FormError, FormMode, FormPayload, Resource, UploadedFile};
pub use hero::{plan_move, MoveDirection, ReorderError};
pub use storage::{parse_cookies, read_cookie, CookieStorage, MemoryStorage, SessionStorage};
