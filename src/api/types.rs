use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{MalId, MediaKind};
use crate::models::{Favorite, FavoriteAction, MediaEntry, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email_verified: user.is_verified(),
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// List entry as rendered to clients.
///
/// `status` uses the vocabulary of `kind`, so an anime entry reports
/// `WATCHING` where a manga entry reports `READING`.
#[derive(Debug, Serialize)]
pub struct EntryDto {
    pub id: i32,
    pub kind: MediaKind,
    pub mal_id: MalId,
    pub title: String,
    pub image_url: Option<String>,
    pub status: &'static str,
    pub progress: i32,
    pub total_units: Option<i32>,
    pub total_volumes: Option<i32>,
    pub score: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MediaEntry> for EntryDto {
    fn from(entry: MediaEntry) -> Self {
        let kind = entry.key.kind;
        let tracked = entry.tracked;
        Self {
            id: entry.id,
            kind,
            mal_id: entry.key.mal_id,
            title: entry.title,
            image_url: entry.image_url,
            status: tracked.status.as_str(kind),
            progress: tracked.progress,
            total_units: tracked.total_units,
            total_volumes: tracked.total_volumes,
            score: tracked.score,
            start_date: tracked.start_date,
            end_date: tracked.end_date,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryStateDto {
    pub entry: Option<EntryDto>,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteDto {
    pub id: i32,
    pub kind: MediaKind,
    pub mal_id: MalId,
    pub title: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Favorite> for FavoriteDto {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: favorite.id,
            kind: favorite.key.kind,
            mal_id: favorite.key.mal_id,
            title: favorite.snapshot.title,
            image_url: favorite.snapshot.image_url,
            created_at: favorite.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub action: FavoriteAction,
    pub is_favorite: bool,
}

impl From<FavoriteAction> for ToggleFavoriteResponse {
    fn from(action: FavoriteAction) -> Self {
        Self {
            action,
            is_favorite: action == FavoriteAction::Added,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
