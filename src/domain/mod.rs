//! Domain types for list tracking with strong typing.
//!
//! Newtypes keep catalog ids and user ids from being mixed up, and
//! [`MediaKind`] parameterizes everything that differs between anime and manga.

pub mod tracker;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a title in the external catalog (MyAnimeList id).
///
/// # Examples
///
/// ```rust
/// use tsundoku::domain::MalId;
///
/// let id = MalId::new(5114);
/// assert_eq!(id.value(), 5114);
/// assert_eq!(id.to_string(), "5114");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MalId(i32);

impl MalId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "MalId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MalId> for i32 {
    fn from(id: MalId) -> Self {
        id.0
    }
}

impl Serialize for MalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

/// Row id of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which catalog a title belongs to.
///
/// Serialized as `ANIME` / `MANGA`; parsed case-insensitively so path
/// segments like `/entries/anime/1` work too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "ANIME",
            Self::Manga => "MANGA",
        }
    }

    /// Lowercase form used by the catalog API paths.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
        }
    }

    /// Word for one unit of progress, for messages.
    #[must_use]
    pub const fn unit_name(&self) -> &'static str {
        match self {
            Self::Anime => "episodes",
            Self::Manga => "chapters",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind '{0}', expected anime or manga")]
pub struct UnknownMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("anime") {
            Ok(Self::Anime)
        } else if s.eq_ignore_ascii_case("manga") {
            Ok(Self::Manga)
        } else {
            Err(UnknownMediaKind(s.to_string()))
        }
    }
}

impl Serialize for MediaKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// List status of an entry, independent of media kind.
///
/// The wire vocabulary differs per kind (`WATCHING` vs `READING`), so the
/// string form is always produced through [`EntryStatus::as_str`] with the
/// entry's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Planned,
    InProgress,
    OnHold,
    Dropped,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{status}' is not a valid {kind} status")]
pub struct UnknownStatus {
    pub kind: MediaKind,
    pub status: String,
}

impl EntryStatus {
    pub const ALL: [Self; 5] = [
        Self::Planned,
        Self::InProgress,
        Self::OnHold,
        Self::Dropped,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (Self::Planned, MediaKind::Anime) => "PLAN_TO_WATCH",
            (Self::Planned, MediaKind::Manga) => "PLAN_TO_READ",
            (Self::InProgress, MediaKind::Anime) => "WATCHING",
            (Self::InProgress, MediaKind::Manga) => "READING",
            (Self::OnHold, _) => "ON_HOLD",
            (Self::Dropped, _) => "DROPPED",
            (Self::Completed, _) => "COMPLETED",
        }
    }

    /// Parses a status word from the vocabulary of `kind`.
    ///
    /// `READING` is rejected for anime and `WATCHING` for manga.
    pub fn parse(kind: MediaKind, raw: &str) -> Result<Self, UnknownStatus> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str(kind).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus {
                kind,
                status: raw.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_parses_case_insensitively() {
        assert_eq!("anime".parse::<MediaKind>(), Ok(MediaKind::Anime));
        assert_eq!("MANGA".parse::<MediaKind>(), Ok(MediaKind::Manga));
        assert!("novel".parse::<MediaKind>().is_err());
    }

    #[test]
    fn media_kind_serializes_uppercase() {
        let json = serde_json::to_string(&MediaKind::Manga).unwrap();
        assert_eq!(json, "\"MANGA\"");
        let back: MediaKind = serde_json::from_str("\"anime\"").unwrap();
        assert_eq!(back, MediaKind::Anime);
    }

    #[test]
    fn status_vocabulary_is_per_kind() {
        assert_eq!(
            EntryStatus::parse(MediaKind::Anime, "WATCHING"),
            Ok(EntryStatus::InProgress)
        );
        assert_eq!(
            EntryStatus::parse(MediaKind::Manga, "plan_to_read"),
            Ok(EntryStatus::Planned)
        );
        assert!(EntryStatus::parse(MediaKind::Anime, "READING").is_err());
        assert!(EntryStatus::parse(MediaKind::Manga, "PLAN_TO_WATCH").is_err());
        assert_eq!(
            EntryStatus::parse(MediaKind::Manga, "ON_HOLD"),
            Ok(EntryStatus::OnHold)
        );
    }

    #[test]
    fn mal_id_display() {
        let id = MalId::new(1);
        assert_eq!(id.to_string(), "1");
        assert_eq!(i32::from(id), 1);
    }
}
