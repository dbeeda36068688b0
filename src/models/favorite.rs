use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::EntryKey;

/// Title and cover captured from the catalog at write time; never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSnapshot {
    pub title: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    pub id: i32,
    pub key: EntryKey,
    pub snapshot: TitleSnapshot,
    pub created_at: DateTime<Utc>,
}

/// Outcome of flipping a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Added,
    Removed,
}

impl FavoriteAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}
