use chrono::{DateTime, Utc};

use crate::domain::tracker::Tracked;
use crate::domain::{MalId, MediaKind, UserId};

/// Identity of a list entry: one row per user, title and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub user_id: UserId,
    pub kind: MediaKind,
    pub mal_id: MalId,
}

impl EntryKey {
    #[must_use]
    pub const fn new(user_id: UserId, kind: MediaKind, mal_id: MalId) -> Self {
        Self {
            user_id,
            kind,
            mal_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub id: i32,
    pub key: EntryKey,
    pub title: String,
    pub image_url: Option<String>,
    pub tracked: Tracked,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What gets written for an entry after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub title: String,
    pub image_url: Option<String>,
    pub tracked: Tracked,
}
