//! Domain service for accounts and authentication.
//!
//! Handles signup with email verification, login, password reset, profile
//! edits and API key management.

use thiserror::Error;

use crate::models::User;
use crate::services::email::EmailError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please verify your email before signing in")]
    EmailNotVerified,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an unverified account and sends the verification email.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for a malformed email, empty name or short password
    /// - [`AuthError::EmailTaken`] if the email is registered
    async fn signup(&self, signup: Signup) -> Result<User, AuthError>;

    /// Creates an already verified account without sending mail (CLI use).
    async fn create_verified_user(&self, signup: Signup) -> Result<User, AuthError>;

    /// Checks credentials.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for an unknown email or wrong password
    /// - [`AuthError::EmailNotVerified`] for a correct password on an unverified account
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Consumes a verification token and marks the account verified.
    async fn verify_email(&self, token: &str) -> Result<(), AuthError>;

    /// Issues a one-hour reset token, replacing older ones, and mails it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] for an unknown email.
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    /// Consumes a reset token and stores the new password.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError>;

    /// Verifies an API key and returns its owner if valid.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;

    async fn update_name(&self, user_id: i32, name: &str) -> Result<User, AuthError>;

    async fn get_api_key(&self, user_id: i32) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, user_id: i32) -> Result<String, AuthError>;
}
