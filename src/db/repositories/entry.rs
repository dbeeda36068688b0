use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::db::WriteLock;
use crate::domain::tracker::Tracked;
use crate::domain::{EntryStatus, MalId, MediaKind, UserId};
use crate::entities::{media_entries, prelude::*};
use crate::models::{EntryKey, EntryRecord, MediaEntry};

pub(crate) fn parse_kind(raw: &str) -> Result<MediaKind, DbErr> {
    raw.parse()
        .map_err(|e| DbErr::Custom(format!("corrupt kind column: {e}")))
}

impl TryFrom<media_entries::Model> for MediaEntry {
    type Error = DbErr;

    fn try_from(model: media_entries::Model) -> Result<Self, Self::Error> {
        let kind = parse_kind(&model.kind)?;
        let status = EntryStatus::parse(kind, &model.status)
            .map_err(|e| DbErr::Custom(format!("corrupt status column: {e}")))?;

        Ok(Self {
            id: model.id,
            key: EntryKey::new(UserId(model.user_id), kind, MalId::new(model.mal_id)),
            title: model.title,
            image_url: model.image_url,
            tracked: Tracked {
                status,
                progress: model.progress,
                total_units: model.total_units,
                total_volumes: model.total_volumes,
                score: model.score,
                start_date: model.start_date,
                end_date: model.end_date,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn key_condition(key: EntryKey) -> Condition {
    Condition::all()
        .add(media_entries::Column::UserId.eq(key.user_id.0))
        .add(media_entries::Column::MalId.eq(key.mal_id.value()))
        .add(media_entries::Column::Kind.eq(key.kind.as_str()))
}

/// Status words differ per kind, so a kind-less status filter expands to
/// one `(kind, word)` pair per kind.
fn status_condition(kind: Option<MediaKind>, status: EntryStatus) -> Condition {
    let kinds = kind.map_or_else(|| vec![MediaKind::Anime, MediaKind::Manga], |k| vec![k]);

    kinds.into_iter().fold(Condition::any(), |cond, kind| {
        cond.add(
            Condition::all()
                .add(media_entries::Column::Kind.eq(kind.as_str()))
                .add(media_entries::Column::Status.eq(status.as_str(kind))),
        )
    })
}

async fn find_by_key<C: ConnectionTrait>(
    conn: &C,
    key: EntryKey,
) -> Result<Option<MediaEntry>, DbErr> {
    MediaEntries::find()
        .filter(key_condition(key))
        .one(conn)
        .await?
        .map(MediaEntry::try_from)
        .transpose()
}

pub struct EntryRepository {
    conn: DatabaseConnection,
    writer: WriteLock,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, writer: WriteLock) -> Self {
        Self { conn, writer }
    }

    pub async fn get(&self, key: EntryKey) -> Result<Option<MediaEntry>, DbErr> {
        find_by_key(&self.conn, key).await
    }

    /// Entries of one user, most recently updated first.
    pub async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        status: Option<EntryStatus>,
    ) -> Result<Vec<MediaEntry>, DbErr> {
        let mut query = MediaEntries::find().filter(media_entries::Column::UserId.eq(user_id.0));

        if let Some(kind) = kind {
            query = query.filter(media_entries::Column::Kind.eq(kind.as_str()));
        }

        if let Some(status) = status {
            query = query.filter(status_condition(kind, status));
        }

        query
            .order_by_desc(media_entries::Column::UpdatedAt)
            .order_by_desc(media_entries::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(MediaEntry::try_from)
            .collect()
    }

    /// Read-modify-write of one entry inside a single transaction.
    ///
    /// `compute` sees the stored entry (if any) and returns the record to
    /// persist. An error from `compute` rolls the transaction back.
    pub async fn apply<E, F>(
        &self,
        key: EntryKey,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<MediaEntry, E>
    where
        E: From<DbErr>,
        F: FnOnce(Option<&MediaEntry>) -> Result<EntryRecord, E> + Send,
    {
        let _writer = self.writer.lock().await;
        let txn = self.conn.begin().await?;

        let current = find_by_key(&txn, key).await?;
        let record = compute(current.as_ref())?;
        let tracked = record.tracked;

        let active_model = media_entries::ActiveModel {
            user_id: Set(key.user_id.0),
            mal_id: Set(key.mal_id.value()),
            kind: Set(key.kind.as_str().to_string()),
            title: Set(record.title),
            image_url: Set(record.image_url),
            status: Set(tracked.status.as_str(key.kind).to_string()),
            progress: Set(tracked.progress),
            total_units: Set(tracked.total_units),
            total_volumes: Set(tracked.total_volumes),
            score: Set(tracked.score),
            start_date: Set(tracked.start_date),
            end_date: Set(tracked.end_date),
            created_at: Set(current.as_ref().map_or(now, |c| c.created_at)),
            updated_at: Set(now),
            ..Default::default()
        };

        MediaEntries::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    media_entries::Column::UserId,
                    media_entries::Column::MalId,
                    media_entries::Column::Kind,
                ])
                .update_columns([
                    media_entries::Column::Title,
                    media_entries::Column::ImageUrl,
                    media_entries::Column::Status,
                    media_entries::Column::Progress,
                    media_entries::Column::TotalUnits,
                    media_entries::Column::TotalVolumes,
                    media_entries::Column::Score,
                    media_entries::Column::StartDate,
                    media_entries::Column::EndDate,
                    media_entries::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&txn)
            .await?;

        let saved = find_by_key(&txn, key)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("entry {key:?} vanished after upsert")))?;

        txn.commit().await?;
        Ok(saved)
    }

    /// Hard delete. Returns false if there was nothing to delete.
    pub async fn remove(&self, key: EntryKey) -> Result<bool, DbErr> {
        let result = MediaEntries::delete_many()
            .filter(key_condition(key))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
