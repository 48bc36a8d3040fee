//! API handlers for the Cloud Library REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::book::MAX_BOOK_FILE_SIZE, models::user::UserClaims, AppState};

/// Canonical hyphenated UUID text, the only id form routes accept
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Room for the text fields and multipart framing around a maximal book file
const UPLOAD_BODY_LIMIT: usize = MAX_BOOK_FILE_SIZE + 64 * 1024;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Authentication("missing authorization header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Authentication("malformed token".to_string()))?;

        let token = bearer_token(auth_header)
            .ok_or_else(|| AppError::Authentication("malformed token".to_string()))?;

        let claims = state.services.auth.verify_token(token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Like [`AuthenticatedUser`], but anonymous requests are let through.
/// A present but invalid token is still rejected.
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeUser(None));
        }
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(MaybeUser(Some(claims)))
    }
}

/// Path id extractor. Anything but a canonical UUID is treated as an
/// unmatched route.
pub struct ResourceId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = || AppError::NotFound("resource not found".to_string());

        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;

        parse_resource_id(&raw).map(ResourceId).ok_or_else(not_found)
    }
}

/// Acknowledgement body for mutations
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    /// Id of the created resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}

/// Token from an `Authorization` value of exactly the form `Bearer <token>`
pub fn bearer_token(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Parse a path id, accepting only the canonical hyphenated form
pub fn parse_resource_id(raw: &str) -> Option<Uuid> {
    if !UUID_RE.is_match(raw) {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // Preflights are answered here, before any route or extractor runs
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/signin", post(auth::signin))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/file", get(books::get_book_file))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
