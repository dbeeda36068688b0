//! Domain service for favorites.
//!
//! There is no "ensure favorited" primitive: every toggle flips the state.

use thiserror::Error;

use crate::domain::{MediaKind, UserId};
use crate::models::{EntryKey, Favorite, FavoriteAction, TitleSnapshot};

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for FavoriteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait FavoriteService: Send + Sync {
    /// Removes the favorite if present, otherwise creates it.
    ///
    /// When creating without a `snapshot`, the catalog is asked for the
    /// title and cover; if that fails the favorite is stored with an empty
    /// snapshot instead of failing.
    async fn toggle(
        &self,
        key: EntryKey,
        snapshot: Option<TitleSnapshot>,
    ) -> Result<FavoriteAction, FavoriteError>;

    async fn is_favorite(&self, key: EntryKey) -> Result<bool, FavoriteError>;

    /// Newest first.
    async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
    ) -> Result<Vec<Favorite>, FavoriteError>;
}
