use sea_orm::entity::prelude::*;

/// One user's list entry for one catalog title.
///
/// Unique on `(user_id, mal_id, kind)`; the index is created by migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "media_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub mal_id: i32,
    /// `ANIME` or `MANGA`
    pub kind: String,
    pub title: String,
    pub image_url: Option<String>,
    /// Kind-specific status word, e.g. `PLAN_TO_WATCH` or `READING`
    pub status: String,
    pub progress: i32,
    /// Episodes for anime, chapters for manga
    pub total_units: Option<i32>,
    pub total_volumes: Option<i32>,
    pub score: Option<i32>,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
