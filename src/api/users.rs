//! User record endpoints

use axum::{extract::State, Json};

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{AddUserRequest, UpdateRolesRequest, UserLookupQuery, UserLookupResponse},
        InsertOneResult, UpdateResult,
    },
    AppState,
};

use super::{ApiJson, ApiQuery, AuthenticatedUser};

/// Insert a user record
#[utoipa::path(
    post,
    path = "/addUser",
    tag = "users",
    request_body = AddUserRequest,
    responses(
        (status = 200, description = "User inserted", body = InsertOneResult),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddUserRequest>,
) -> AppResult<Json<InsertOneResult>> {
    let result = state.services.auth.add_user(request).await?;
    Ok(Json(result))
}

/// Check that a user exists and get a session token for it
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    params(UserLookupQuery),
    responses(
        (status = 200, description = "User found", body = UserLookupResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_user(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserLookupQuery>,
) -> AppResult<Json<UserLookupResponse>> {
    let email = query
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

    let response = state.services.auth.lookup_user(&email).await?;
    Ok(Json(response))
}

/// Set the roles of a user, creating the record if needed
#[utoipa::path(
    put,
    path = "/update-user",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateRolesRequest,
    responses(
        (status = 200, description = "Roles updated", body = UpdateResult),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid token")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<UpdateRolesRequest>,
) -> AppResult<Json<UpdateResult>> {
    let result = state.services.auth.update_roles(&claims, request).await?;
    Ok(Json(result))
}
