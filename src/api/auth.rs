//! Sign-in endpoint

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::Role,
    AppState,
};

/// Sign-in request
#[derive(Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Sign-in response
#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub username: String,
    pub role: Role,
    /// Bearer token, valid for 30 minutes
    pub token: String,
}

/// Exchange username and password for an access token
#[utoipa::path(
    post,
    path = "/signin",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 201, description = "Signed in", body = SignInResponse),
        (status = 400, description = "Malformed request", body = crate::error::ErrorResponse),
        (status = 401, description = "Wrong password", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown username", body = crate::error::ErrorResponse)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<SignInRequest>, AppError>,
) -> AppResult<(StatusCode, Json<SignInResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (token, user) = state
        .services
        .auth
        .sign_in(&request.username, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignInResponse {
            username: user.username,
            role: user.role,
            token,
        }),
    ))
}
