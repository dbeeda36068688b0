//! `SeaORM` implementation of the `FavoriteService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::domain::{MediaKind, UserId};
use crate::models::{EntryKey, Favorite, FavoriteAction, TitleSnapshot};
use crate::services::catalog::CatalogService;
use crate::services::favorite_service::{FavoriteError, FavoriteService};
use crate::services::locks::KeyedLocks;

pub struct SeaOrmFavoriteService {
    store: Store,
    catalog: Arc<CatalogService>,
    locks: KeyedLocks,
}

impl SeaOrmFavoriteService {
    #[must_use]
    pub const fn new(store: Store, catalog: Arc<CatalogService>, locks: KeyedLocks) -> Self {
        Self {
            store,
            catalog,
            locks,
        }
    }
}

#[async_trait]
impl FavoriteService for SeaOrmFavoriteService {
    async fn toggle(
        &self,
        key: EntryKey,
        snapshot: Option<TitleSnapshot>,
    ) -> Result<FavoriteAction, FavoriteError> {
        let _guard = self.locks.lock(&key).await;

        let snapshot = if self.store.is_favorite(key).await? {
            TitleSnapshot::default()
        } else if let Some(snapshot) = snapshot.filter(|s| !s.title.trim().is_empty()) {
            snapshot
        } else {
            self.catalog.snapshot_or_empty(key.kind, key.mal_id).await
        };

        let action = self
            .store
            .toggle_favorite(key, snapshot, Utc::now())
            .await?;

        metrics::counter!("favorites_toggled_total", "action" => action.as_str()).increment(1);
        info!(
            event = "favorite_toggled",
            user_id = %key.user_id,
            kind = %key.kind,
            mal_id = %key.mal_id,
            action = action.as_str(),
            "Favorite toggled"
        );

        Ok(action)
    }

    async fn is_favorite(&self, key: EntryKey) -> Result<bool, FavoriteError> {
        Ok(self.store.is_favorite(key).await?)
    }

    async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
    ) -> Result<Vec<Favorite>, FavoriteError> {
        Ok(self.store.list_favorites(user_id, kind).await?)
    }
}
