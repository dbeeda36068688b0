//! Read-only client for the Jikan v4 API (MyAnimeList data).
//!
//! Every list endpoint runs its result through [`dedup_by_mal_id`]: Jikan
//! pages are known to repeat a title when rankings shift between requests.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::JikanConfig;

#[derive(Debug, Error)]
pub enum JikanError {
    #[error("Jikan API error: {status}")]
    Status { status: StatusCode },

    #[error("Jikan request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl JikanError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
struct JikanResponse<T> {
    data: T,
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
    pub current_page: Option<u32>,
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

/// One page of a list endpoint, already de-duplicated.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: ImageSet,
}

impl Images {
    /// Large WebP cover if present, otherwise the large JPEG one.
    #[must_use]
    pub fn preferred_large(&self) -> Option<&str> {
        self.webp
            .large_image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.jpg.large_image_url.as_deref().filter(|u| !u.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: i32,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
    pub string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalAnime {
    pub mal_id: i32,
    pub url: Option<String>,
    #[serde(default)]
    pub images: Images,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_synonyms: Vec<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub source: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,
    pub aired: Option<DateRange>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub score: Option<f64>,
    pub scored_by: Option<i64>,
    pub rank: Option<i32>,
    pub popularity: Option<i32>,
    pub members: Option<i64>,
    pub favorites: Option<i64>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub studios: Vec<MalEntity>,
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalManga {
    pub mal_id: i32,
    pub url: Option<String>,
    #[serde(default)]
    pub images: Images,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_synonyms: Vec<String>,
    #[serde(rename = "type")]
    pub manga_type: Option<String>,
    pub chapters: Option<i32>,
    pub volumes: Option<i32>,
    pub status: Option<String>,
    #[serde(default)]
    pub publishing: bool,
    pub published: Option<DateRange>,
    pub score: Option<f64>,
    pub scored_by: Option<i64>,
    pub rank: Option<i32>,
    pub popularity: Option<i32>,
    pub members: Option<i64>,
    pub favorites: Option<i64>,
    pub synopsis: Option<String>,
    #[serde(default)]
    pub authors: Vec<MalEntity>,
    #[serde(default)]
    pub serializations: Vec<MalEntity>,
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalGenre {
    pub mal_id: i32,
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub count: i64,
}

/// Anything carrying a catalog id.
pub trait HasMalId {
    fn mal_id(&self) -> i32;
}

impl HasMalId for MalAnime {
    fn mal_id(&self) -> i32 {
        self.mal_id
    }
}

impl HasMalId for MalManga {
    fn mal_id(&self) -> i32 {
        self.mal_id
    }
}

impl HasMalId for MalGenre {
    fn mal_id(&self) -> i32 {
        self.mal_id
    }
}

/// Drops repeated ids, keeping the first occurrence and the original order.
pub fn dedup_by_mal_id<T: HasMalId>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.mal_id()))
        .collect()
}

/// Filters for `/anime` and `/manga` search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub status: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    #[serde(default)]
    pub genres: Vec<i32>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sfw: Option<bool>,
}

impl SearchParams {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "q", self.q.as_ref());
        push_opt(&mut pairs, "type", self.media_type.as_ref());
        push_opt(&mut pairs, "status", self.status.as_ref());
        push_opt(&mut pairs, "min_score", self.min_score);
        push_opt(&mut pairs, "max_score", self.max_score);
        if !self.genres.is_empty() {
            let joined = self
                .genres
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("genres", joined));
        }
        push_opt(&mut pairs, "order_by", self.order_by.as_ref());
        push_opt(&mut pairs, "sort", self.sort.as_ref());
        push_opt(&mut pairs, "page", self.page);
        push_opt(&mut pairs, "limit", self.limit);
        push_opt(&mut pairs, "sfw", self.sfw);
        pairs
    }
}

/// Filters for the `/top/*` rankings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopParams {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TopParams {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "type", self.media_type.as_ref());
        push_opt(&mut pairs, "filter", self.filter.as_ref());
        push_opt(&mut pairs, "page", self.page);
        push_opt(&mut pairs, "limit", self.limit);
        pairs
    }
}

fn push_opt<V: ToString>(
    pairs: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<V>,
) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            "fall" | "autumn" => Ok(Self::Fall),
            other => Err(format!(
                "unknown season '{other}', expected winter, spring, summer or fall"
            )),
        }
    }
}

#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
}

impl JikanClient {
    /// Creates a client against `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Tsundoku/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &JikanConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<JikanResponse<T>, JikanError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "Jikan request");

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JikanError::Status { status });
        }

        Ok(response.json().await?)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, JikanError> {
        Ok(self.fetch::<T>(path, &[]).await?.data)
    }

    async fn fetch_page<T: DeserializeOwned + HasMalId>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Page<T>, JikanError> {
        let response = self.fetch::<Vec<T>>(path, query).await?;
        Ok(Page {
            data: dedup_by_mal_id(response.data),
            pagination: response.pagination,
        })
    }

    pub async fn get_anime(&self, mal_id: i32) -> Result<MalAnime, JikanError> {
        self.fetch_one(&format!("/anime/{mal_id}")).await
    }

    pub async fn get_manga(&self, mal_id: i32) -> Result<MalManga, JikanError> {
        self.fetch_one(&format!("/manga/{mal_id}")).await
    }

    pub async fn search_anime(&self, params: &SearchParams) -> Result<Page<MalAnime>, JikanError> {
        self.fetch_page("/anime", &params.query_pairs()).await
    }

    pub async fn search_manga(&self, params: &SearchParams) -> Result<Page<MalManga>, JikanError> {
        self.fetch_page("/manga", &params.query_pairs()).await
    }

    pub async fn top_anime(&self, params: &TopParams) -> Result<Page<MalAnime>, JikanError> {
        self.fetch_page("/top/anime", &params.query_pairs()).await
    }

    pub async fn top_manga(&self, params: &TopParams) -> Result<Page<MalManga>, JikanError> {
        self.fetch_page("/top/manga", &params.query_pairs()).await
    }

    pub async fn season_now(&self, page: Option<u32>) -> Result<Page<MalAnime>, JikanError> {
        let mut query = Vec::new();
        push_opt(&mut query, "page", page);
        self.fetch_page("/seasons/now", &query).await
    }

    pub async fn season(
        &self,
        year: i32,
        season: Season,
        page: Option<u32>,
    ) -> Result<Page<MalAnime>, JikanError> {
        let mut query = Vec::new();
        push_opt(&mut query, "page", page);
        self.fetch_page(&format!("/seasons/{year}/{season}"), &query)
            .await
    }

    pub async fn anime_genres(&self) -> Result<Vec<MalGenre>, JikanError> {
        Ok(self.fetch_page("/genres/anime", &[]).await?.data)
    }

    pub async fn manga_genres(&self) -> Result<Vec<MalGenre>, JikanError> {
        Ok(self.fetch_page("/genres/manga", &[]).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> MalGenre {
        MalGenre {
            mal_id: id,
            name: name.to_string(),
            url: None,
            count: 0,
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let items = vec![
            genre(1, "Action"),
            genre(2, "Adventure"),
            genre(1, "Action (again)"),
            genre(3, "Comedy"),
            genre(2, "Adventure (again)"),
        ];

        let names: Vec<_> = dedup_by_mal_id(items)
            .into_iter()
            .map(|g| g.name)
            .collect();

        assert_eq!(names, vec!["Action", "Adventure", "Comedy"]);
    }

    #[test]
    fn search_params_join_genres_and_skip_unset_fields() {
        let params = SearchParams {
            q: Some("frieren".to_string()),
            genres: vec![1, 10, 22],
            page: Some(2),
            sfw: Some(true),
            ..SearchParams::default()
        };

        assert_eq!(
            params.query_pairs(),
            vec![
                ("q", "frieren".to_string()),
                ("genres", "1,10,22".to_string()),
                ("page", "2".to_string()),
                ("sfw", "true".to_string()),
            ]
        );
    }

    #[test]
    fn preferred_image_falls_back_to_jpeg() {
        let mut images = Images {
            jpg: ImageSet {
                large_image_url: Some("https://cdn/x.jpg".to_string()),
                ..ImageSet::default()
            },
            webp: ImageSet::default(),
        };
        assert_eq!(images.preferred_large(), Some("https://cdn/x.jpg"));

        images.webp.large_image_url = Some("https://cdn/x.webp".to_string());
        assert_eq!(images.preferred_large(), Some("https://cdn/x.webp"));
    }

    #[test]
    fn season_parsing() {
        assert_eq!("Winter".parse::<Season>(), Ok(Season::Winter));
        assert_eq!("autumn".parse::<Season>(), Ok(Season::Fall));
        assert!("monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn anime_payload_tolerates_missing_optional_fields() {
        let json = r#"{
            "mal_id": 52991,
            "title": "Sousou no Frieren",
            "images": { "jpg": { "large_image_url": "https://cdn/f.jpg" } },
            "episodes": 28,
            "score": 9.3
        }"#;

        let anime: MalAnime = serde_json::from_str(json).unwrap();
        assert_eq!(anime.episodes, Some(28));
        assert!(anime.genres.is_empty());
        assert_eq!(anime.images.preferred_large(), Some("https://cdn/f.jpg"));
    }
}
