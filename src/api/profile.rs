//! Profile endpoints for the signed-in user.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::ApiJson;
use super::{ApiError, ApiResponse, AppState, UserDto};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// `GET /api/profile`
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.auth_service().get_user(user.id()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// `PUT /api/profile`
///
/// Renames the user. The name is trimmed and limited to 50 characters.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .auth_service()
        .update_name(user.id(), &payload.name)
        .await?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(Json(ApiResponse::success(user.into())))
}
