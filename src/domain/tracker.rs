//! Status and progress reconciliation for list entries.
//!
//! [`reconcile`] takes the stored state of an entry (if any) and a proposed
//! update, and produces the state to persist. It is pure: the caller supplies
//! `now` and is responsible for running it inside the same transaction as the
//! read of `current` and the write of the result.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{EntryStatus, MediaKind};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

/// The reconciled fields of an entry.
///
/// `total_units` and `total_volumes` are always either `None` or positive;
/// a total of 0 from the catalog or the client means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracked {
    pub status: EntryStatus,
    pub progress: i32,
    pub total_units: Option<i32>,
    pub total_volumes: Option<i32>,
    pub score: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A proposed change to an entry. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub progress: Option<i32>,
    pub status: Option<EntryStatus>,
    pub total_units: Option<i32>,
    pub total_volumes: Option<i32>,
    pub score: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("progress cannot be negative (got {0})")]
    NegativeProgress(i32),

    #[error("progress exceeds total ({progress} > {total})")]
    ProgressExceedsTotal { progress: i32, total: i32 },

    #[error("total cannot be negative (got {0})")]
    NegativeTotal(i32),

    #[error("score must be between 1 and 10 (got {0})")]
    ScoreOutOfRange(i32),

    #[error("volume counts only apply to manga")]
    VolumesNotApplicable,
}

fn known(total: Option<i32>) -> Option<i32> {
    total.filter(|t| *t > 0)
}

/// Computes the authoritative state for an entry after `input` is applied.
///
/// Status rules, in order:
/// 1. explicit status, else stored status, else the plan status;
/// 2. a stored plan-status entry with 0 progress that gains progress becomes
///    in-progress, whatever status was requested;
/// 3. an in-progress entry whose progress reaches a known total is completed.
///
/// Explicit progress above a known total is rejected, never clamped.
pub fn reconcile(
    kind: MediaKind,
    current: Option<&Tracked>,
    input: &EntryUpdate,
    now: DateTime<Utc>,
) -> Result<Tracked, TrackerError> {
    let progress = input
        .progress
        .or_else(|| current.map(|c| c.progress))
        .unwrap_or(0);
    if progress < 0 {
        return Err(TrackerError::NegativeProgress(progress));
    }

    if kind == MediaKind::Anime && input.total_volumes.is_some() {
        return Err(TrackerError::VolumesNotApplicable);
    }
    if let Some(total) = [input.total_units, input.total_volumes]
        .into_iter()
        .flatten()
        .find(|t| *t < 0)
    {
        return Err(TrackerError::NegativeTotal(total));
    }

    let total_units = known(input.total_units.or_else(|| current.and_then(|c| c.total_units)));
    let total_volumes = known(
        input
            .total_volumes
            .or_else(|| current.and_then(|c| c.total_volumes)),
    );

    if let Some(total) = total_units
        && progress > total
    {
        return Err(TrackerError::ProgressExceedsTotal { progress, total });
    }

    let score = match input.score {
        Some(score) if !(MIN_SCORE..=MAX_SCORE).contains(&score) => {
            return Err(TrackerError::ScoreOutOfRange(score));
        }
        Some(score) => Some(score),
        None => current.and_then(|c| c.score),
    };

    let mut status = input
        .status
        .or_else(|| current.map(|c| c.status))
        .unwrap_or(EntryStatus::Planned);

    if let Some(previous) = current
        && previous.status == EntryStatus::Planned
        && previous.progress == 0
        && progress > 0
    {
        status = EntryStatus::InProgress;
    }

    if status == EntryStatus::InProgress && total_units == Some(progress) {
        status = EntryStatus::Completed;
    }

    let mut start_date = input
        .start_date
        .or_else(|| current.and_then(|c| c.start_date));
    if status == EntryStatus::InProgress && start_date.is_none() {
        start_date = Some(now);
    }

    let mut end_date = input.end_date.or_else(|| current.and_then(|c| c.end_date));
    if status == EntryStatus::Completed && end_date.is_none() {
        end_date = Some(now);
    }

    Ok(Tracked {
        status,
        progress,
        total_units,
        total_volumes,
        score,
        start_date,
        end_date,
    })
}

/// Applies an internal +/- step to the stored progress, clamped to
/// `[0, total]`. Unlike explicit input, overshooting is never an error.
#[must_use]
pub fn step_progress(current: &Tracked, delta: i32) -> i32 {
    let next = current.progress.saturating_add(delta).max(0);
    current.total_units.map_or(next, |total| next.min(total))
}
