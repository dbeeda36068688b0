use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::db::WriteLock;
use crate::db::repositories::entry::parse_kind;
use crate::domain::{MalId, MediaKind, UserId};
use crate::entities::{favorites, prelude::*};
use crate::models::{EntryKey, Favorite, FavoriteAction, TitleSnapshot};

impl TryFrom<favorites::Model> for Favorite {
    type Error = DbErr;

    fn try_from(model: favorites::Model) -> Result<Self, Self::Error> {
        let kind = parse_kind(&model.kind)?;

        Ok(Self {
            id: model.id,
            key: EntryKey::new(UserId(model.user_id), kind, MalId::new(model.mal_id)),
            snapshot: TitleSnapshot {
                title: model.title,
                image_url: model.image_url,
            },
            created_at: model.created_at,
        })
    }
}

fn key_condition(key: EntryKey) -> Condition {
    Condition::all()
        .add(favorites::Column::UserId.eq(key.user_id.0))
        .add(favorites::Column::MalId.eq(key.mal_id.value()))
        .add(favorites::Column::Kind.eq(key.kind.as_str()))
}

pub struct FavoriteRepository {
    conn: DatabaseConnection,
    writer: WriteLock,
}

impl FavoriteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, writer: WriteLock) -> Self {
        Self { conn, writer }
    }

    pub async fn exists(&self, key: EntryKey) -> Result<bool, DbErr> {
        let count = Favorites::find()
            .filter(key_condition(key))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn list(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
    ) -> Result<Vec<Favorite>, DbErr> {
        let mut query = Favorites::find().filter(favorites::Column::UserId.eq(user_id.0));

        if let Some(kind) = kind {
            query = query.filter(favorites::Column::Kind.eq(kind.as_str()));
        }

        query
            .order_by_desc(favorites::Column::CreatedAt)
            .order_by_desc(favorites::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Favorite::try_from)
            .collect()
    }

    /// Flips the favorite state of `key` in one transaction.
    ///
    /// `snapshot` is only written when the row is created.
    pub async fn toggle(
        &self,
        key: EntryKey,
        snapshot: TitleSnapshot,
        now: DateTime<Utc>,
    ) -> Result<FavoriteAction, DbErr> {
        let _writer = self.writer.lock().await;
        let txn = self.conn.begin().await?;

        let deleted = Favorites::delete_many()
            .filter(key_condition(key))
            .exec(&txn)
            .await?;

        if deleted.rows_affected > 0 {
            txn.commit().await?;
            return Ok(FavoriteAction::Removed);
        }

        Favorites::insert(favorites::ActiveModel {
            user_id: Set(key.user_id.0),
            mal_id: Set(key.mal_id.value()),
            kind: Set(key.kind.as_str().to_string()),
            title: Set(snapshot.title),
            image_url: Set(snapshot.image_url),
            created_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                favorites::Column::UserId,
                favorites::Column::MalId,
                favorites::Column::Kind,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await?;

        txn.commit().await?;
        Ok(FavoriteAction::Added)
    }
}
