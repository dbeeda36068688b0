//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::tokens::{PASSWORD_RESET_TTL_HOURS, VERIFICATION_TTL_HOURS};
use crate::db::{NewUser, Store, generate_api_key, hash_password, verify_password};
use crate::models::User;
use crate::services::auth_service::{AuthError, AuthService, Signup};
use crate::services::email::Mailer;

const MAX_NAME_LENGTH: usize = 50;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

/// Trims and lowercases an email address, rejecting malformed ones.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }
    Ok(email)
}

pub fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Name must be {MAX_NAME_LENGTH} characters or less"
        )));
    }
    Ok(name.to_string())
}

pub struct SeaOrmAuthService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, security: SecurityConfig) -> Self {
        Self {
            store,
            mailer,
            security,
        }
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    /// Argon2 is CPU-heavy; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let security = self.security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))??;
        Ok(hash)
    }

    async fn create(&self, signup: Signup, verified: bool) -> Result<User, AuthError> {
        let email = normalize_email(&signup.email)?;
        let name = validate_name(&signup.name)?;
        self.validate_password(&signup.password)?;

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash(&signup.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                name,
                password_hash: Some(password_hash),
                email_verified_at: verified.then(Utc::now),
            })
            .await?;

        info!(event = "user_created", user_id = user.id, verified, "Account created");
        Ok(user)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn signup(&self, signup: Signup) -> Result<User, AuthError> {
        let user = self.create(signup, false).await?;

        let token = generate_api_key();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS);
        self.store
            .insert_verification_token(&user.email, &token, expires_at)
            .await?;

        if let Err(e) = self.mailer.send_verification(&user.email, &token).await {
            // Free the address so the user can sign up again.
            self.store.delete_verification_tokens(&user.email).await?;
            self.store.delete_unverified_user(&user.email).await?;
            warn!(
                event = "signup_rolled_back",
                user_id = user.id,
                error = %e,
                "Verification mail failed, account removed"
            );
            return Err(e.into());
        }

        Ok(user)
    }

    async fn create_verified_user(&self, signup: Signup) -> Result<User, AuthError> {
        self.create(signup, true).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();

        let Some((user, Some(password_hash))) =
            self.store.get_user_by_email_with_password(&email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| {
                AuthError::Internal(format!("Password verification task panicked: {e}"))
            })??;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified() {
            return Err(AuthError::EmailNotVerified);
        }

        info!(event = "user_logged_in", user_id = user.id, "Login succeeded");
        Ok(user)
    }

    async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let now = Utc::now();

        let email = self
            .store
            .take_verification_token(token.trim(), now)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !self.store.mark_user_verified(&email, now).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(event = "email_verified", "Email verified");
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email)?;

        if self.store.get_user_by_email(&email).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let token = generate_api_key();
        let expires_at = Utc::now() + Duration::hours(PASSWORD_RESET_TTL_HOURS);
        self.store
            .replace_password_reset_token(&email, &token, expires_at)
            .await?;

        self.mailer.send_password_reset(&email, &token).await?;
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        self.validate_password(new_password)?;

        // Hash first; a failure here must leave the token usable.
        let password_hash = self.hash(new_password).await?;

        let email = self
            .store
            .take_password_reset_token(token.trim(), Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !self
            .store
            .set_user_password_hash(&email, password_hash)
            .await?
        {
            return Err(AuthError::UserNotFound);
        }

        info!(event = "password_reset", "Password reset");
        Ok(())
    }

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.verify_api_key(api_key).await?)
    }

    async fn update_name(&self, user_id: i32, name: &str) -> Result<User, AuthError> {
        let name = validate_name(name)?;

        self.store
            .rename_user(user_id, &name)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_api_key(&self, user_id: i32) -> Result<String, AuthError> {
        Ok(self.get_user(user_id).await?.api_key)
    }

    async fn regenerate_api_key(&self, user_id: i32) -> Result<String, AuthError> {
        self.get_user(user_id).await?;
        Ok(self.store.regenerate_user_api_key(user_id).await?)
    }
}
