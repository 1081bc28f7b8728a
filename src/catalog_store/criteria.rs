//! Normalized search/filter/sort/paginate criteria.
//!
//! Malformed input never fails a request: unknown sort keys fall back to
//! the entity default, pagination values are clamped, and empty string
//! filters mean "no filter", never "match empty string".

use crate::analytics::EmotionLabel;

use super::models::AlbumType;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Parse a requested order; anything but an explicit ascending request
    /// keeps the default descending order.
    pub fn parse(s: Option<&str>) -> SortOrder {
        match s {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

/// Requested sort field. Each entity maps these onto its own column
/// allow-list; keys an entity does not support fall back to its default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Popularity,
    Name,
    Followers,
    ReleaseDate,
    DurationMs,
}

impl SortKey {
    pub fn parse(s: Option<&str>) -> Option<SortKey> {
        match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("popularity") => Some(SortKey::Popularity),
            Some("name") => Some(SortKey::Name),
            Some("followers") => Some(SortKey::Followers),
            Some("release_date") => Some(SortKey::ReleaseDate),
            Some("duration_ms") => Some(SortKey::DurationMs),
            _ => None,
        }
    }
}

/// Normalized representation of one search request.
///
/// All filters are optional and combine conjunctively. The id-set filters
/// back the `byId` / `byArtist` / `byAlbum` presets; when one is present
/// but empty the query must match zero rows rather than drop the filter.
#[derive(Clone, Debug, Default)]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    pub genre_filter: Option<String>,
    pub type_filter: Option<AlbumType>,
    pub emotion_filter: Option<EmotionLabel>,
    pub ids: Option<Vec<String>>,
    pub artist_ids: Option<Vec<String>>,
    pub album_ids: Option<Vec<String>>,
    pub sort_by: Option<SortKey>,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl FilterCriteria {
    pub fn new() -> Self {
        FilterCriteria {
            limit: DEFAULT_PAGE_SIZE,
            ..Default::default()
        }
    }

    /// Preset for id lookups: bypasses free-text search, returns at most
    /// one page regardless of pagination input.
    pub fn by_ids(ids: Vec<String>) -> Self {
        FilterCriteria {
            limit: MAX_PAGE_SIZE,
            ids: Some(ids),
            ..Default::default()
        }
    }

    /// Preset for "all content credited to this artist".
    pub fn by_artist(artist_id: &str, limit: Option<i64>, offset: Option<i64>) -> Self {
        FilterCriteria {
            artist_ids: Some(vec![artist_id.to_string()]),
            limit: clamp_limit(limit),
            offset: clamp_offset(offset),
            ..Default::default()
        }
    }

    /// Preset for "all tracks of this album".
    pub fn by_album(album_id: &str) -> Self {
        FilterCriteria {
            album_ids: Some(vec![album_id.to_string()]),
            limit: MAX_PAGE_SIZE,
            ..Default::default()
        }
    }
}

/// Trim a raw text filter; empty and whitespace-only values are no filter.
pub fn normalize_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Split a comma-separated id list. An absent or empty parameter is no
/// filter; explicit empty id sets only arise programmatically.
pub fn parse_id_list(raw: Option<String>) -> Option<Vec<String>> {
    let raw = normalize_text(raw)?;
    Some(
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Clamp a requested page size into `[0, MAX_PAGE_SIZE]`, defaulting when
/// absent or negative.
pub fn clamp_limit(raw: Option<i64>) -> i64 {
    match raw {
        None => DEFAULT_PAGE_SIZE,
        Some(v) if v < 0 => DEFAULT_PAGE_SIZE,
        Some(v) => v.min(MAX_PAGE_SIZE),
    }
}

/// Clamp a requested offset to a non-negative value.
pub fn clamp_offset(raw: Option<i64>) -> i64 {
    raw.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!(SortKey::parse(Some("popularity")), Some(SortKey::Popularity));
        assert_eq!(SortKey::parse(Some("Release_Date")), Some(SortKey::ReleaseDate));
        assert_eq!(SortKey::parse(Some("duration_ms")), Some(SortKey::DurationMs));
        // Unknown keys resolve to None, entities substitute their default.
        assert_eq!(SortKey::parse(Some("danceability")), None);
        assert_eq!(SortKey::parse(None), None);
    }

    #[test]
    fn test_sort_order_defaults_to_desc() {
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
    }

    #[test]
    fn test_empty_string_filters_are_no_filter() {
        assert_eq!(normalize_text(Some("".to_string())), None);
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(normalize_text(Some(" pop ".to_string())), Some("pop".to_string()));
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn test_id_list_parsing() {
        assert_eq!(parse_id_list(None), None);
        assert_eq!(parse_id_list(Some("".to_string())), None);
        assert_eq!(
            parse_id_list(Some("a1,a2, a3".to_string())),
            Some(vec!["a1".to_string(), "a2".to_string(), "a3".to_string()])
        );
    }

    #[test]
    fn test_pagination_clamping() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(-5)), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(25)), 25);
        assert_eq!(clamp_limit(Some(5000)), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 0);

        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(30)), 30);
    }
}
