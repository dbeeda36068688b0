//! One-time email tokens: account verification and password reset.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};

use crate::db::WriteLock;
use crate::entities::{password_reset_tokens, prelude::*, verification_tokens};

pub struct TokenRepository {
    conn: DatabaseConnection,
    writer: WriteLock,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, writer: WriteLock) -> Self {
        Self { conn, writer }
    }

    pub async fn insert_verification(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        VerificationTokens::insert(verification_tokens::ActiveModel {
            email: Set(email.to_string()),
            token: Set(token.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        })
        .exec(&self.conn)
        .await
        .context("Failed to insert verification token")?;

        Ok(())
    }

    pub async fn delete_verifications(&self, email: &str) -> Result<()> {
        VerificationTokens::delete_many()
            .filter(verification_tokens::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to delete verification tokens")?;

        Ok(())
    }

    /// Consumes a verification token. Returns the email it was issued for,
    /// or `None` when the token is unknown or expired. Expired tokens are
    /// deleted as well.
    pub async fn take_verification(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let _writer = self.writer.lock().await;
        let txn = self.conn.begin().await?;

        let row = VerificationTokens::find()
            .filter(verification_tokens::Column::Token.eq(token))
            .one(&txn)
            .await
            .context("Failed to query verification token")?;

        let Some(row) = row else {
            return Ok(None);
        };

        VerificationTokens::delete_by_id(row.id).exec(&txn).await?;
        txn.commit().await?;

        Ok((row.expires_at > now).then_some(row.email))
    }

    /// Stores a reset token, replacing any earlier ones for `email`.
    pub async fn replace_password_reset(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let _writer = self.writer.lock().await;
        let txn = self.conn.begin().await?;

        PasswordResetTokens::delete_many()
            .filter(password_reset_tokens::Column::Email.eq(email))
            .exec(&txn)
            .await?;

        PasswordResetTokens::insert(password_reset_tokens::ActiveModel {
            email: Set(email.to_string()),
            token: Set(token.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        })
        .exec(&txn)
        .await
        .context("Failed to insert password reset token")?;

        txn.commit().await?;
        Ok(())
    }

    /// Same contract as [`Self::take_verification`] for reset tokens.
    pub async fn take_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let _writer = self.writer.lock().await;
        let txn = self.conn.begin().await?;

        let row = PasswordResetTokens::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&txn)
            .await
            .context("Failed to query password reset token")?;

        let Some(row) = row else {
            return Ok(None);
        };

        PasswordResetTokens::delete_by_id(row.id).exec(&txn).await?;
        txn.commit().await?;

        Ok((row.expires_at > now).then_some(row.email))
    }
}
