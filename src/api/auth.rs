//! Authentication and profile endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, Profile, RegisterRequest, UpdateProfileRequest},
};

use super::AuthenticatedUser;

/// Login response with JWT bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Profile update response: the refreshed identity and a fresh token
/// bound to it
#[derive(Serialize, ToSchema)]
pub struct UpdateProfileResponse {
    pub username: String,
    pub name: String,
    pub access_token: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid input, password mismatch or duplicate username", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<StatusCode> {
    let registration = request.into_registration()?;
    state.services.auth.register(registration).await?;
    Ok(StatusCode::CREATED)
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let access_token = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;
    Ok(Json(LoginResponse { access_token }))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current identity", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn profile(AuthenticatedUser(claims): AuthenticatedUser) -> Json<Profile> {
    Json(Profile {
        username: claims.sub,
        name: claims.name,
    })
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UpdateProfileResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<UpdateProfileResponse>> {
    request.validate_complete()?;
    let (profile, access_token) = state
        .services
        .auth
        .update_profile(&claims.sub, request)
        .await?;
    Ok(Json(UpdateProfileResponse {
        username: profile.username,
        name: profile.name,
        access_token,
    }))
}
