use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,

    /// Argon2id password hash. Absent for accounts backed by an external provider.
    pub password_hash: Option<String>,

    /// Subject claim of the external identity provider, if any.
    pub auth_subject: Option<String>,

    /// Random API key (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    pub email_verified_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::media_entries::Entity")]
    MediaEntries,
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
}

impl Related<super::media_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaEntries.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
