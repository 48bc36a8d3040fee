//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User},
    AppState,
};

use super::{AuthenticatedUser, MaybeUser, MessageResponse, ResourceId};

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    claims.require_admin()?;

    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Create a new user.
///
/// Administrators may create any role. When open registration is enabled,
/// anyone may create a reader account.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security((), ("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Invalid input or unknown role", body = crate::error::ErrorResponse),
        (status = 401, description = "Not allowed to create this account", body = crate::error::ErrorResponse),
        (status = 409, description = "Username already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    WithRejection(Json(user), _): WithRejection<Json<CreateUser>, AppError>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let created = state
        .services
        .users
        .create_user(user, claims.as_ref(), state.config.access.open_registration)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(
            format!("user created with id: {}", created.id),
            created.id,
        )),
    ))
}

/// Update a user (only non-empty fields are applied)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Unknown role", body = crate::error::ErrorResponse),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Username already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(user), _): WithRejection<Json<UpdateUser>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.users.update_user(id, user).await?;
    Ok(Json(MessageResponse::new("user updated")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.users.delete_user(id).await?;
    Ok(Json(MessageResponse::new("user deleted")))
}
