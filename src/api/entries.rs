//! List entry endpoints.
//!
//! Handlers only translate HTTP to [`EntryService`] calls; the status and
//! progress rules live in [`crate::domain::tracker`].
//!
//! [`EntryService`]: crate::services::EntryService

use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{parse_status, validate_delta, validate_mal_id};
use super::{ApiError, ApiResponse, AppState, EntryDto, EntryStateDto, MessageResponse};
use crate::domain::tracker::EntryUpdate;
use crate::domain::{EntryStatus, MediaKind};
use crate::models::EntryKey;
use crate::services::{EntryError, EntryInput};

impl From<EntryError> for ApiError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::NotFound(_) | EntryError::UnknownTitle { .. } => {
                Self::NotFound(err.to_string())
            }
            EntryError::Validation(msg) => Self::validation(msg),
            EntryError::Upstream(msg) => Self::jikan_error(msg),
            EntryError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
}

/// Body of `PUT /entries/{kind}/{mal_id}`. Every field is optional; omitted
/// fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpsertEntryRequest {
    pub progress: Option<i32>,
    pub status: Option<String>,
    #[serde(alias = "total_episodes", alias = "total_chapters")]
    pub total_units: Option<i32>,
    pub total_volumes: Option<i32>,
    pub score: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StepProgressRequest {
    pub delta: i32,
}

pub(super) fn parse_kind(raw: &str) -> Result<MediaKind, ApiError> {
    raw.parse::<MediaKind>()
        .map_err(|e| ApiError::validation(e.to_string()))
}

pub(super) fn parse_optional_kind(raw: Option<&str>) -> Result<Option<MediaKind>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(parse_kind)
        .transpose()
}

fn entry_key(user: CurrentUser, kind: &str, mal_id: i32) -> Result<EntryKey, ApiError> {
    Ok(EntryKey::new(
        user.0,
        parse_kind(kind)?,
        validate_mal_id(mal_id)?,
    ))
}

/// Without a kind, a status word from either vocabulary is accepted.
fn parse_list_status(
    kind: Option<MediaKind>,
    raw: Option<&str>,
) -> Result<Option<EntryStatus>, ApiError> {
    match kind {
        Some(kind) => parse_status(kind, raw),
        None => parse_status(MediaKind::Anime, raw)
            .or_else(|_| parse_status(MediaKind::Manga, raw)),
    }
}

/// `GET /api/entries?kind=&status=`
///
/// Most recently updated first.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<ListEntriesQuery>,
) -> Result<Json<ApiResponse<Vec<EntryDto>>>, ApiError> {
    let kind = parse_optional_kind(query.kind.as_deref())?;
    let status = parse_list_status(kind, query.status.as_deref())?;

    let entries = state.entry_service().list(user.0, kind, status).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(EntryDto::from).collect(),
    )))
}

/// `GET /api/entries/{kind}/{mal_id}`
///
/// Returns `{ entry, is_favorite }`; `entry` is null when the title is not
/// on the list.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
) -> Result<Json<ApiResponse<EntryStateDto>>, ApiError> {
    let key = entry_key(user, &kind, mal_id)?;
    let entry_state = state.entry_service().get_state(key).await?;

    Ok(Json(ApiResponse::success(EntryStateDto {
        entry: entry_state.entry.map(EntryDto::from),
        is_favorite: entry_state.is_favorite,
    })))
}

/// `PUT /api/entries/{kind}/{mal_id}`
///
/// Adds the title to the list or updates it, reconciling status, progress
/// and dates.
pub async fn upsert_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
    ApiJson(payload): ApiJson<UpsertEntryRequest>,
) -> Result<Json<ApiResponse<EntryDto>>, ApiError> {
    let key = entry_key(user, &kind, mal_id)?;

    let input = EntryInput {
        update: EntryUpdate {
            progress: payload.progress,
            status: parse_status(key.kind, payload.status.as_deref())?,
            total_units: payload.total_units,
            total_volumes: payload.total_volumes,
            score: payload.score,
            start_date: payload.start_date,
            end_date: payload.end_date,
        },
        title: payload.title,
        image_url: payload.image_url,
    };

    let entry = state.entry_service().upsert(key, input).await?;
    Ok(Json(ApiResponse::success(entry.into())))
}

/// `POST /api/entries/{kind}/{mal_id}/progress`
///
/// Moves progress by `delta`, clamped to `[0, total]`.
pub async fn step_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
    ApiJson(payload): ApiJson<StepProgressRequest>,
) -> Result<Json<ApiResponse<EntryDto>>, ApiError> {
    let key = entry_key(user, &kind, mal_id)?;
    let delta = validate_delta(payload.delta)?;

    let entry = state.entry_service().step_progress(key, delta).await?;
    Ok(Json(ApiResponse::success(entry.into())))
}

/// `DELETE /api/entries/{kind}/{mal_id}`
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((kind, mal_id)): ApiPath<(String, i32)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let key = entry_key(user, &kind, mal_id)?;
    state.entry_service().remove(key).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Entry removed",
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_status_without_kind_accepts_both_vocabularies() {
        assert_eq!(
            parse_list_status(None, Some("READING")).unwrap(),
            Some(EntryStatus::InProgress)
        );
        assert_eq!(
            parse_list_status(None, Some("plan_to_watch")).unwrap(),
            Some(EntryStatus::Planned)
        );
        assert!(parse_list_status(Some(MediaKind::Anime), Some("READING")).is_err());
        assert!(parse_list_status(None, Some("BINGING")).is_err());
    }

    #[test]
    fn request_accepts_kind_specific_total_names() {
        let body: UpsertEntryRequest =
            serde_json::from_str(r#"{"total_episodes": 12, "progress": 3}"#).unwrap();
        assert_eq!(body.total_units, Some(12));
        assert_eq!(body.progress, Some(3));
    }
}
