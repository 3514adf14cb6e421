//! Registration and login endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{AuthResponse, LoginRequest, RegisterRequest},
    AppState,
};

use super::ApiJson;

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.services.auth.register(request).await?;
    Ok(Json(response))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Unknown user or wrong password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.services.auth.login(request).await?;
    Ok(Json(response))
}
