use super::ApiError;
use crate::constants::catalog::MAX_PAGE_LIMIT;
use crate::domain::{EntryStatus, MalId, MediaKind};

pub fn validate_mal_id(id: i32) -> Result<MalId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid MAL ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(MalId::new(id))
}

pub fn validate_page(page: Option<u32>) -> Result<Option<u32>, ApiError> {
    match page {
        Some(0) => Err(ApiError::validation("Page numbers start at 1")),
        other => Ok(other),
    }
}

pub fn validate_limit(limit: Option<u32>) -> Result<Option<u32>, ApiError> {
    match limit {
        Some(limit) if !(1..=MAX_PAGE_LIMIT).contains(&limit) => Err(ApiError::validation(
            format!("Invalid limit: {limit}. Limit must be between 1 and {MAX_PAGE_LIMIT}"),
        )),
        other => Ok(other),
    }
}

/// Seasonal listings exist from 1917 (the oldest catalog entries) onward.
pub fn validate_year(year: i32) -> Result<i32, ApiError> {
    if !(1917..=9999).contains(&year) {
        return Err(ApiError::validation(format!("Invalid year: {year}")));
    }
    Ok(year)
}

pub fn validate_delta(delta: i32) -> Result<i32, ApiError> {
    if delta == 0 {
        return Err(ApiError::validation("Delta must not be zero"));
    }
    Ok(delta)
}

/// Parses an optional status word against the vocabulary of `kind`.
pub fn parse_status(kind: MediaKind, raw: Option<&str>) -> Result<Option<EntryStatus>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| EntryStatus::parse(kind, s).map_err(|e| ApiError::validation(e.to_string())))
        .transpose()
}

/// Parses a comma-separated genre id list such as `1,4,22`.
pub fn parse_genres(raw: Option<&str>) -> Result<Vec<i32>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| ApiError::validation(format!("Invalid genre id: {s}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mal_id() {
        assert!(validate_mal_id(1).is_ok());
        assert!(validate_mal_id(52991).is_ok());
        assert!(validate_mal_id(0).is_err());
        assert!(validate_mal_id(-5).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None).unwrap(), None);
        assert_eq!(validate_limit(Some(25)).unwrap(), Some(25));
        assert!(validate_limit(Some(0)).is_err());
        assert!(validate_limit(Some(26)).is_err());
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(Some(0)).is_err());
        assert_eq!(validate_page(Some(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_parse_status_uses_kind_vocabulary() {
        assert_eq!(
            parse_status(MediaKind::Manga, Some("READING")).unwrap(),
            Some(EntryStatus::InProgress)
        );
        assert!(parse_status(MediaKind::Manga, Some("WATCHING")).is_err());
        assert_eq!(parse_status(MediaKind::Anime, Some("  ")).unwrap(), None);
        assert_eq!(parse_status(MediaKind::Anime, None).unwrap(), None);
    }

    #[test]
    fn test_parse_genres() {
        assert_eq!(parse_genres(Some("1, 4,,22")).unwrap(), vec![1, 4, 22]);
        assert!(parse_genres(Some("1,action")).is_err());
        assert!(parse_genres(None).unwrap().is_empty());
    }
}
