//! Read-only catalog endpoints backed by Jikan.
//!
//! Every list is de-duplicated by MAL id before it reaches the client.

use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::entries::parse_kind;
use super::extract::{ApiPath, ApiQuery};
use super::validation::{
    parse_genres, validate_limit, validate_mal_id, validate_page, validate_year,
};
use super::{ApiError, ApiResponse, AppState};
use crate::clients::jikan::{MalAnime, MalGenre, Page, SearchParams, Season, TopParams};
use crate::services::CatalogError;
use crate::services::catalog::{CatalogHome, CatalogItem, CatalogPage};

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } => Self::NotFound(err.to_string()),
            CatalogError::Upstream(e) => Self::jikan_error(e.to_string()),
        }
    }
}

/// Search filters as they arrive in the query string. `genres` is a
/// comma-separated id list.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub status: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub genres: Option<String>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sfw: Option<bool>,
}

impl SearchQuery {
    fn into_params(self) -> Result<SearchParams, ApiError> {
        Ok(SearchParams {
            genres: parse_genres(self.genres.as_deref())?,
            page: validate_page(self.page)?,
            limit: validate_limit(self.limit)?,
            q: self.q.filter(|q| !q.trim().is_empty()),
            media_type: self.media_type,
            status: self.status,
            min_score: self.min_score,
            max_score: self.max_score,
            order_by: self.order_by,
            sort: self.sort,
            sfw: self.sfw,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// `GET /api/catalog/{kind}/{mal_id}`
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
) -> Result<Json<ApiResponse<CatalogItem>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let mal_id = validate_mal_id(mal_id)?;

    let item = state.catalog().lookup(kind, mal_id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// `GET /api/catalog/{kind}?q=&type=&status=&genres=...`
pub async fn search(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<CatalogPage>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let params = query.into_params()?;

    let page = state.catalog().search(kind, &params).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `GET /api/catalog/{kind}/top?type=&filter=&page=&limit=`
pub async fn top(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(mut params): ApiQuery<TopParams>,
) -> Result<Json<ApiResponse<CatalogPage>>, ApiError> {
    let kind = parse_kind(&kind)?;
    params.page = validate_page(params.page)?;
    params.limit = validate_limit(params.limit)?;

    let page = state.catalog().top(kind, &params).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `GET /api/catalog/{kind}/home`
///
/// Top list, currently airing/publishing list and the featured strip in
/// one response. Fails as a whole if either upstream call fails.
pub async fn home(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
) -> Result<Json<ApiResponse<CatalogHome>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let home = state.catalog().home(kind).await?;
    Ok(Json(ApiResponse::success(home)))
}

/// `GET /api/catalog/{kind}/genres`
pub async fn genres(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
) -> Result<Json<ApiResponse<Vec<MalGenre>>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let genres = state.catalog().genres(kind).await?;
    Ok(Json(ApiResponse::success(genres)))
}

/// `GET /api/catalog/seasons/now?page=`
pub async fn season_now(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Page<MalAnime>>>, ApiError> {
    let page = validate_page(query.page)?;

    let season = state.catalog().season_now(page).await?;
    Ok(Json(ApiResponse::success(season)))
}

/// `GET /api/catalog/seasons/{year}/{season}?page=`
pub async fn season(
    State(state): State<Arc<AppState>>,
    ApiPath((year, season)): ApiPath<(i32, String)>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Page<MalAnime>>>, ApiError> {
    let year = validate_year(year)?;
    let season = season.parse::<Season>().map_err(ApiError::validation)?;
    let page = validate_page(query.page)?;

    let listing = state.catalog().season(year, season, page).await?;
    Ok(Json(ApiResponse::success(listing)))
}
