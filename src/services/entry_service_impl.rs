//! `SeaORM` implementation of the `EntryService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::domain::tracker::{self, EntryUpdate};
use crate::domain::{EntryStatus, MediaKind, UserId};
use crate::models::{EntryKey, EntryRecord, MediaEntry};
use crate::services::catalog::{CatalogItem, CatalogService};
use crate::services::entry_service::{EntryError, EntryInput, EntryService, EntryState};
use crate::services::locks::KeyedLocks;

pub struct SeaOrmEntryService {
    store: Store,
    catalog: Arc<CatalogService>,
    locks: KeyedLocks,
}

impl SeaOrmEntryService {
    #[must_use]
    pub const fn new(store: Store, catalog: Arc<CatalogService>, locks: KeyedLocks) -> Self {
        Self {
            store,
            catalog,
            locks,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fills totals the caller left out with what the catalog reports.
fn with_catalog_totals(
    kind: MediaKind,
    mut update: EntryUpdate,
    item: &CatalogItem,
) -> EntryUpdate {
    update.total_units = update.total_units.or_else(|| item.total_units());
    if kind == MediaKind::Manga {
        update.total_volumes = update.total_volumes.or_else(|| item.total_volumes());
    }
    update
}

fn count_reconciled(operation: &'static str) {
    metrics::counter!("entries_reconciled_total", "operation" => operation).increment(1);
}

#[async_trait]
impl EntryService for SeaOrmEntryService {
    async fn upsert(&self, key: EntryKey, input: EntryInput) -> Result<MediaEntry, EntryError> {
        let title = non_empty(input.title);

        // Catalog lookup runs outside the key lock.
        let catalog_item = if title.is_none() && self.store.get_entry(key).await?.is_none() {
            Some(self.catalog.lookup(key.kind, key.mal_id).await?)
        } else {
            None
        };

        let _guard = self.locks.lock(&key).await;
        let now = Utc::now();

        let entry = self
            .store
            .entry_repo()
            .apply::<EntryError, _>(key, now, |current| {
                let update = match &catalog_item {
                    Some(item) if current.is_none() => {
                        with_catalog_totals(key.kind, input.update, item)
                    }
                    _ => input.update,
                };

                let tracked =
                    tracker::reconcile(key.kind, current.map(|c| &c.tracked), &update, now)?;

                let snapshot = catalog_item.as_ref().map(CatalogItem::snapshot);

                let title = title
                    .or_else(|| current.map(|c| c.title.clone()))
                    .or_else(|| snapshot.as_ref().map(|s| s.title.clone()))
                    .ok_or_else(|| EntryError::Validation("title is required".to_string()))?;

                let image_url = non_empty(input.image_url)
                    .or_else(|| current.and_then(|c| c.image_url.clone()))
                    .or_else(|| snapshot.and_then(|s| s.image_url));

                Ok(EntryRecord {
                    title,
                    image_url,
                    tracked,
                })
            })
            .await?;

        count_reconciled("upsert");
        info!(
            event = "entry_reconciled",
            user_id = %key.user_id,
            kind = %key.kind,
            mal_id = %key.mal_id,
            status = entry.tracked.status.as_str(key.kind),
            progress = entry.tracked.progress,
            "Entry saved"
        );

        Ok(entry)
    }

    async fn step_progress(&self, key: EntryKey, delta: i32) -> Result<MediaEntry, EntryError> {
        let _guard = self.locks.lock(&key).await;
        let now = Utc::now();

        let entry = self
            .store
            .entry_repo()
            .apply::<EntryError, _>(key, now, |current| {
                let current = current.ok_or(EntryError::NotFound(key))?;

                let update = EntryUpdate {
                    progress: Some(tracker::step_progress(&current.tracked, delta)),
                    ..EntryUpdate::default()
                };
                let tracked = tracker::reconcile(key.kind, Some(&current.tracked), &update, now)?;

                Ok(EntryRecord {
                    title: current.title.clone(),
                    image_url: current.image_url.clone(),
                    tracked,
                })
            })
            .await?;

        count_reconciled("step");
        info!(
            event = "entry_progress_stepped",
            user_id = %key.user_id,
            kind = %key.kind,
            mal_id = %key.mal_id,
            delta,
            progress = entry.tracked.progress,
            "Entry progress changed"
        );

        Ok(entry)
    }

    async fn remove(&self, key: EntryKey) -> Result<(), EntryError> {
        let _guard = self.locks.lock(&key).await;

        if !self.store.remove_entry(key).await? {
            return Err(EntryError::NotFound(key));
        }

        info!(
            event = "entry_removed",
            user_id = %key.user_id,
            kind = %key.kind,
            mal_id = %key.mal_id,
            "Entry removed"
        );
        Ok(())
    }

    async fn get_state(&self, key: EntryKey) -> Result<EntryState, EntryError> {
        let (entry, is_favorite) =
            tokio::try_join!(self.store.get_entry(key), self.store.is_favorite(key))?;

        Ok(EntryState { entry, is_favorite })
    }

    async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        status: Option<EntryStatus>,
    ) -> Result<Vec<MediaEntry>, EntryError> {
        Ok(self.store.list_entries(user_id, kind, status).await?)
    }
}
