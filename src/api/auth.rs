use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::extract::ApiJson;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::constants::session::USER_ID_KEY;
use crate::domain::UserId;
use crate::services::{AuthError, Signup};

// ============================================================================
// Request/Response Types
// ============================================================================

/// The authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl CurrentUser {
    #[must_use]
    pub const fn id(&self) -> i32 {
        self.0.0
    }
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::EmailNotVerified => {
                Self::unauthorized(err.to_string())
            }
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::InvalidToken => Self::validation(err.to_string()),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Email(e) => Self::email_error(e.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
///
/// On success the caller is available to handlers as `Extension<CurrentUser>`.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(USER_ID_KEY).await {
        tracing::Span::current().record("user_id", user_id);
        request.extensions_mut().insert(CurrentUser(UserId(user_id)));
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.auth_service().verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser(UserId(user.id)));
        return Ok(next.run(request).await);
    }

    Err(ApiError::unauthorized("Unauthorized"))
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Create an account and send the verification email
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .auth_service()
        .signup(Signup {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /auth/login
/// Authenticate with email and password and start a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(USER_ID_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        api_key: user.api_key.clone(),
        user: user.into(),
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Logged out",
    ))))
}

/// POST /auth/verify-email
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service().verify_email(&payload.token).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Email verified. You can now sign in.",
    ))))
}

/// POST /auth/forgot-password
/// Issue a password reset token and email it
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service().forgot_password(&payload.email).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset email sent",
    ))))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.auth_service().get_user(user.id()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().get_api_key(user.id()).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key; the old one stops working immediately
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().regenerate_api_key(user.id()).await?;

    tracing::info!(user_id = user.id(), "API key regenerated");

    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
