//! Catalog lookups and page assembly on top of [`JikanClient`].

use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::warn;

use crate::clients::jikan::{
    JikanClient, JikanError, MalAnime, MalGenre, MalManga, Page, SearchParams, Season, TopParams,
};
use crate::constants::catalog::{FEATURED_COUNT, HOME_PAGE_LIMIT};
use crate::domain::{MalId, MediaKind};
use crate::models::TitleSnapshot;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} {mal_id} not found in catalog")]
    NotFound { kind: MediaKind, mal_id: MalId },

    #[error(transparent)]
    Upstream(#[from] JikanError),
}

/// A single catalog title of either kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogItem {
    Anime(Box<MalAnime>),
    Manga(Box<MalManga>),
}

impl CatalogItem {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Anime(a) => &a.title,
            Self::Manga(m) => &m.title,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TitleSnapshot {
        let images = match self {
            Self::Anime(a) => &a.images,
            Self::Manga(m) => &m.images,
        };

        TitleSnapshot {
            title: self.title().to_string(),
            image_url: images.preferred_large().map(str::to_string),
        }
    }

    /// Episodes for anime, chapters for manga.
    #[must_use]
    pub fn total_units(&self) -> Option<i32> {
        match self {
            Self::Anime(a) => a.episodes,
            Self::Manga(m) => m.chapters,
        }
    }

    #[must_use]
    pub fn total_volumes(&self) -> Option<i32> {
        match self {
            Self::Anime(_) => None,
            Self::Manga(m) => m.volumes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogPage {
    Anime(Page<MalAnime>),
    Manga(Page<MalManga>),
}

/// Landing page for one kind: a ranking, what is currently running, and a
/// short featured strip picked from the running titles.
#[derive(Debug, Clone, Serialize)]
pub struct Home<T> {
    pub top: Vec<T>,
    pub airing: Vec<T>,
    pub featured: Vec<T>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogHome {
    Anime(Home<MalAnime>),
    Manga(Home<MalManga>),
}

/// Titles with a positive score, best first, at most [`FEATURED_COUNT`].
///
/// The sort is stable, so ties keep their upstream order.
pub fn select_featured<T: Clone>(items: &[T], score: impl Fn(&T) -> Option<f64>) -> Vec<T> {
    let mut scored: Vec<(f64, &T)> = items
        .iter()
        .filter_map(|item| score(item).filter(|s| *s > 0.0).map(|s| (s, item)))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(FEATURED_COUNT)
        .map(|(_, item)| item.clone())
        .collect()
}

fn record<T, E>(operation: &'static str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    metrics::counter!(
        "catalog_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

#[derive(Clone)]
pub struct CatalogService {
    jikan: JikanClient,
}

impl CatalogService {
    #[must_use]
    pub const fn new(jikan: JikanClient) -> Self {
        Self { jikan }
    }

    pub async fn lookup(
        &self,
        kind: MediaKind,
        mal_id: MalId,
    ) -> Result<CatalogItem, CatalogError> {
        let result = match kind {
            MediaKind::Anime => self
                .jikan
                .get_anime(mal_id.value())
                .await
                .map(|a| CatalogItem::Anime(Box::new(a))),
            MediaKind::Manga => self
                .jikan
                .get_manga(mal_id.value())
                .await
                .map(|m| CatalogItem::Manga(Box::new(m))),
        };
        record("lookup", &result);

        result.map_err(|e| {
            if e.is_not_found() {
                CatalogError::NotFound { kind, mal_id }
            } else {
                CatalogError::Upstream(e)
            }
        })
    }

    /// Title and preferred cover for snapshots.
    pub async fn snapshot(
        &self,
        kind: MediaKind,
        mal_id: MalId,
    ) -> Result<TitleSnapshot, CatalogError> {
        Ok(self.lookup(kind, mal_id).await?.snapshot())
    }

    /// Like [`Self::snapshot`] but never fails; errors degrade to an empty
    /// snapshot.
    pub async fn snapshot_or_empty(&self, kind: MediaKind, mal_id: MalId) -> TitleSnapshot {
        match self.snapshot(kind, mal_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%kind, %mal_id, error = %e, "Catalog lookup failed, storing empty snapshot");
                TitleSnapshot::default()
            }
        }
    }

    pub async fn search(
        &self,
        kind: MediaKind,
        params: &SearchParams,
    ) -> Result<CatalogPage, CatalogError> {
        let result = match kind {
            MediaKind::Anime => self.jikan.search_anime(params).await.map(CatalogPage::Anime),
            MediaKind::Manga => self.jikan.search_manga(params).await.map(CatalogPage::Manga),
        };
        record("search", &result);
        Ok(result?)
    }

    pub async fn top(
        &self,
        kind: MediaKind,
        params: &TopParams,
    ) -> Result<CatalogPage, CatalogError> {
        let result = match kind {
            MediaKind::Anime => self.jikan.top_anime(params).await.map(CatalogPage::Anime),
            MediaKind::Manga => self.jikan.top_manga(params).await.map(CatalogPage::Manga),
        };
        record("top", &result);
        Ok(result?)
    }

    pub async fn season_now(&self, page: Option<u32>) -> Result<Page<MalAnime>, CatalogError> {
        let result = self.jikan.season_now(page).await;
        record("season_now", &result);
        Ok(result?)
    }

    pub async fn season(
        &self,
        year: i32,
        season: Season,
        page: Option<u32>,
    ) -> Result<Page<MalAnime>, CatalogError> {
        let result = self.jikan.season(year, season, page).await;
        record("season", &result);
        Ok(result?)
    }

    pub async fn genres(&self, kind: MediaKind) -> Result<Vec<MalGenre>, CatalogError> {
        let result = match kind {
            MediaKind::Anime => self.jikan.anime_genres().await,
            MediaKind::Manga => self.jikan.manga_genres().await,
        };
        record("genres", &result);
        Ok(result?)
    }

    /// Fetches the ranking and the running list concurrently. Either
    /// failing fails the whole page.
    pub async fn home(&self, kind: MediaKind) -> Result<CatalogHome, CatalogError> {
        let top = TopParams {
            limit: Some(HOME_PAGE_LIMIT),
            ..TopParams::default()
        };

        let result = match kind {
            MediaKind::Anime => {
                tokio::try_join!(self.jikan.top_anime(&top), self.jikan.season_now(None)).map(
                    |(top, airing)| {
                        let featured = select_featured(&airing.data, |a| a.score);
                        CatalogHome::Anime(Home {
                            top: top.data,
                            airing: airing.data,
                            featured,
                        })
                    },
                )
            }
            MediaKind::Manga => {
                let publishing = SearchParams {
                    status: Some("publishing".to_string()),
                    limit: Some(HOME_PAGE_LIMIT),
                    ..SearchParams::default()
                };

                tokio::try_join!(
                    self.jikan.top_manga(&top),
                    self.jikan.search_manga(&publishing)
                )
                .map(|(top, airing)| {
                    let featured = select_featured(&airing.data, |m| m.score);
                    CatalogHome::Manga(Home {
                        top: top.data,
                        airing: airing.data,
                        featured,
                    })
                })
            }
        };
        record("home", &result);
        Ok(result?)
    }
}
