use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::entries::{parse_kind, parse_optional_kind};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::validate_mal_id;
use super::{ApiError, ApiResponse, AppState, FavoriteDto, ToggleFavoriteResponse};
use crate::models::{EntryKey, TitleSnapshot};
use crate::services::FavoriteError;

impl From<FavoriteError> for ApiError {
    fn from(err: FavoriteError) -> Self {
        match err {
            FavoriteError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListFavoritesQuery {
    pub kind: Option<String>,
}

/// Optional snapshot sent by clients that already show the title.
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// `GET /api/favorites?kind=`
///
/// Newest first.
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<ListFavoritesQuery>,
) -> Result<Json<ApiResponse<Vec<FavoriteDto>>>, ApiError> {
    let kind = parse_optional_kind(query.kind.as_deref())?;
    let favorites = state.favorite_service().list(user.0, kind).await?;

    Ok(Json(ApiResponse::success(
        favorites.into_iter().map(FavoriteDto::from).collect(),
    )))
}

/// `POST /api/favorites/{kind}/{mal_id}/toggle`
///
/// Flips the favorite state and reports which way it went.
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
    payload: Option<ApiJson<ToggleFavoriteRequest>>,
) -> Result<Json<ApiResponse<ToggleFavoriteResponse>>, ApiError> {
    let key = EntryKey::new(user.0, parse_kind(&kind)?, validate_mal_id(mal_id)?);

    let snapshot = payload.and_then(|ApiJson(body)| {
        body.title.map(|title| TitleSnapshot {
            title,
            image_url: body.image_url,
        })
    });

    let action = state.favorite_service().toggle(key, snapshot).await?;
    Ok(Json(ApiResponse::success(action.into())))
}
