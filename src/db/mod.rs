use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sqlx::ConnectOptions as _;
use sea_orm::sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, SqlxSqliteConnector, Statement};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{EntryStatus, MediaKind, UserId};
use crate::models::{EntryKey, Favorite, FavoriteAction, MediaEntry, TitleSnapshot, User};

pub mod migrator;
pub mod repositories;

pub use repositories::user::{NewUser, generate_api_key, hash_password, verify_password};

/// Serializes write transactions. SQLite allows one writer at a time, and a
/// deferred transaction that upgrades from read to write fails with
/// `SQLITE_BUSY` instead of waiting on `busy_timeout`.
pub type WriteLock = Arc<Mutex<()>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    writer: WriteLock,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }

        let connect_options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database url: {db_url}"))?
            .busy_timeout(BUSY_TIMEOUT)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true)
            .disable_statement_logging();

        // Every pooled connection to `:memory:` would open its own database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .connect_with(connect_options)
            .await
            .context("Failed to open database pool")?;

        let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{}, wal)",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            writer: Arc::new(Mutex::new(())),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========== Entry Repository Methods ==========

    #[must_use]
    pub fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn.clone(), self.writer.clone())
    }

    pub async fn get_entry(&self, key: EntryKey) -> Result<Option<MediaEntry>, DbErr> {
        self.entry_repo().get(key).await
    }

    pub async fn list_entries(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        status: Option<EntryStatus>,
    ) -> Result<Vec<MediaEntry>, DbErr> {
        self.entry_repo().list(user_id, kind, status).await
    }

    pub async fn remove_entry(&self, key: EntryKey) -> Result<bool, DbErr> {
        self.entry_repo().remove(key).await
    }

    // ========== Favorite Repository Methods ==========

    fn favorite_repo(&self) -> repositories::favorite::FavoriteRepository {
        repositories::favorite::FavoriteRepository::new(self.conn.clone(), self.writer.clone())
    }

    pub async fn is_favorite(&self, key: EntryKey) -> Result<bool, DbErr> {
        self.favorite_repo().exists(key).await
    }

    pub async fn list_favorites(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
    ) -> Result<Vec<Favorite>, DbErr> {
        self.favorite_repo().list(user_id, kind).await
    }

    pub async fn toggle_favorite(
        &self,
        key: EntryKey,
        snapshot: TitleSnapshot,
        now: DateTime<Utc>,
    ) -> Result<FavoriteAction, DbErr> {
        self.favorite_repo().toggle(key, snapshot, now).await
    }

    // ========== Token Repository Methods ==========

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone(), self.writer.clone())
    }

    pub async fn insert_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.token_repo()
            .insert_verification(email, token, expires_at)
            .await
    }

    pub async fn take_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.token_repo().take_verification(token, now).await
    }

    pub async fn delete_verification_tokens(&self, email: &str) -> Result<()> {
        self.token_repo().delete_verifications(email).await
    }

    pub async fn replace_password_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.token_repo()
            .replace_password_reset(email, token, expires_at)
            .await
    }

    pub async fn take_password_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.token_repo().take_password_reset(token, now).await
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().create(user).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, Option<String>)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn mark_user_verified(&self, email: &str, at: DateTime<Utc>) -> Result<bool> {
        self.user_repo().mark_verified(email, at).await
    }

    pub async fn delete_unverified_user(&self, email: &str) -> Result<bool> {
        self.user_repo().delete_unverified(email).await
    }

    pub async fn set_user_password_hash(&self, email: &str, password_hash: String) -> Result<bool> {
        self.user_repo()
            .set_password_hash(email, password_hash)
            .await
    }

    pub async fn rename_user(&self, id: i32, name: &str) -> Result<Option<User>> {
        self.user_repo().rename(id, name).await
    }

    pub async fn regenerate_user_api_key(&self, id: i32) -> Result<String> {
        self.user_repo().regenerate_api_key(id).await
    }
}
