//! Domain service for a user's list entries.
//!
//! Every write goes through [`crate::domain::tracker::reconcile`] inside one
//! transaction, serialized per entry key.

use thiserror::Error;

use crate::domain::tracker::{EntryUpdate, TrackerError};
use crate::domain::{EntryStatus, MalId, MediaKind, UserId};
use crate::models::{EntryKey, MediaEntry};
use crate::services::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{} {} is not on the list", .0.kind, .0.mal_id)]
    NotFound(EntryKey),

    #[error("{kind} {mal_id} does not exist in the catalog")]
    UnknownTitle { kind: MediaKind, mal_id: MalId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Catalog error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for EntryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<TrackerError> for EntryError {
    fn from(err: TrackerError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CatalogError> for EntryError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { kind, mal_id } => Self::UnknownTitle { kind, mal_id },
            CatalogError::Upstream(e) => Self::Upstream(e.to_string()),
        }
    }
}

/// Add/update request: tracker fields plus the title snapshot.
///
/// `title` may be omitted for an existing entry; for a new one it is looked
/// up in the catalog.
#[derive(Debug, Clone, Default)]
pub struct EntryInput {
    pub update: EntryUpdate,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntryState {
    pub entry: Option<MediaEntry>,
    pub is_favorite: bool,
}

#[async_trait::async_trait]
pub trait EntryService: Send + Sync {
    /// Adds the entry or applies `input` to the stored one.
    ///
    /// # Errors
    ///
    /// - [`EntryError::Validation`] when the reconciled state is invalid
    /// - [`EntryError::Upstream`] when a new entry needs a catalog lookup that fails
    async fn upsert(&self, key: EntryKey, input: EntryInput) -> Result<MediaEntry, EntryError>;

    /// Moves progress by `delta`, clamped to `[0, total]`.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::NotFound`] if there is no entry.
    async fn step_progress(&self, key: EntryKey, delta: i32) -> Result<MediaEntry, EntryError>;

    /// Hard delete.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::NotFound`] if there is no entry.
    async fn remove(&self, key: EntryKey) -> Result<(), EntryError>;

    async fn get_state(&self, key: EntryKey) -> Result<EntryState, EntryError>;

    /// Most recently updated first.
    async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        status: Option<EntryStatus>,
    ) -> Result<Vec<MediaEntry>, EntryError>;
}
