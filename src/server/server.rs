use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::metrics::metrics_handler;
use super::response::ApiResponse;
use super::state::{GuardedCatalogStore, ServerState};
use super::{log_requests, RequestsLoggingLevel, ServerConfig};
use crate::analytics::similarity;
use crate::catalog_store::{
    clamp_limit, clamp_offset, normalize_text, parse_id_list, AlbumType, CatalogStore,
    FilterCriteria, SortKey, SortOrder,
};
use crate::analytics::EmotionLabel;

/// Search/filter/sort/paginate query parameters, shared by every list
/// endpoint. Parameters an entity does not support are simply ignored by
/// its predicate composition. Numeric parameters arrive as strings so
/// malformed values degrade to defaults instead of a deserialization
/// rejection.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    search_term: Option<String>,
    genre_filter: Option<String>,
    type_filter: Option<String>,
    emotion_filter: Option<String>,
    /// Comma-separated id list.
    ids: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl SearchQuery {
    fn into_criteria(self) -> FilterCriteria {
        FilterCriteria {
            search_term: normalize_text(self.search_term),
            genre_filter: normalize_text(self.genre_filter),
            type_filter: self
                .type_filter
                .as_deref()
                .and_then(AlbumType::parse_filter),
            emotion_filter: self.emotion_filter.as_deref().and_then(EmotionLabel::parse),
            ids: parse_id_list(self.ids),
            artist_ids: None,
            album_ids: None,
            sort_by: SortKey::parse(self.sort_by.as_deref()),
            sort_order: SortOrder::parse(self.sort_order.as_deref()),
            limit: clamp_limit(parse_number(self.limit.as_deref())),
            offset: clamp_offset(parse_number(self.offset.as_deref())),
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Response {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        artists: state.catalog_store.artists_count(),
        albums: state.catalog_store.albums_count(),
        tracks: state.catalog_store.tracks_count(),
    };
    ApiResponse::ok(stats)
}

// =============================================================================
// Artist routes
// =============================================================================

async fn search_artists(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.search_artists(&query.into_criteria()) {
        Ok(artists) => ApiResponse::ok(artists),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn count_artists(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.count_artists(&query.into_criteria()) {
        Ok(count) => ApiResponse::ok(json!({ "count": count })),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn trending_artists(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    // Preset: popularity descending, only the page size is caller-controlled.
    let criteria = FilterCriteria {
        limit: clamp_limit(parse_number(query.limit.as_deref())),
        ..Default::default()
    };
    match store.search_artists(&criteria) {
        Ok(artists) => ApiResponse::ok(artists),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn genre_count(State(store): State<GuardedCatalogStore>) -> Response {
    match store.genre_count() {
        Ok(count) => ApiResponse::ok(json!({ "count": count })),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn genre_distribution(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.genre_distribution(&query.into_criteria()) {
        Ok(entries) => ApiResponse::ok(entries),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn emotion_distribution(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.emotion_distribution(&query.into_criteria()) {
        Ok(entries) => ApiResponse::ok(entries),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_artist(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match store.get_artist(&id) {
        Ok(Some(artist)) => ApiResponse::ok(artist),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_artist_collaborators(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match store.get_collaborators(&id) {
        Ok(Some(collaborators)) => ApiResponse::ok(collaborators),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_artist_albums(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match artist_content(store.as_ref(), &id, &query, |s, c| s.search_albums(c)) {
        Ok(Some(albums)) => ApiResponse::ok(albums),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_artist_tracks(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match artist_content(store.as_ref(), &id, &query, |s, c| s.search_tracks(c)) {
        Ok(Some(tracks)) => ApiResponse::ok(tracks),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn count_artist_albums(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match artist_count(store.as_ref(), &id, |s, c| s.count_albums(c)) {
        Ok(Some(count)) => ApiResponse::ok(json!({ "count": count })),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn count_artist_tracks(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match artist_count(store.as_ref(), &id, |s, c| s.count_tracks(c)) {
        Ok(Some(count)) => ApiResponse::ok(json!({ "count": count })),
        Ok(None) => ApiResponse::not_found("Artist"),
        Err(err) => ApiResponse::internal(err),
    }
}

/// Shared "content credited to one artist" lookup; a miss on the artist id
/// is a 404, not an empty page.
fn artist_content<T>(
    store: &dyn CatalogStore,
    artist_id: &str,
    query: &SearchQuery,
    search: impl Fn(&dyn CatalogStore, &FilterCriteria) -> Result<Vec<T>>,
) -> Result<Option<Vec<T>>> {
    if store.get_artist(artist_id)?.is_none() {
        return Ok(None);
    }
    let criteria = FilterCriteria::by_artist(
        artist_id,
        parse_number(query.limit.as_deref()),
        parse_number(query.offset.as_deref()),
    );
    search(store, &criteria).map(Some)
}

/// Count counterpart of [`artist_content`]; pagination does not apply to
/// counts, so only the artist id flows into the criteria.
fn artist_count(
    store: &dyn CatalogStore,
    artist_id: &str,
    count: impl Fn(&dyn CatalogStore, &FilterCriteria) -> Result<i64>,
) -> Result<Option<i64>> {
    if store.get_artist(artist_id)?.is_none() {
        return Ok(None);
    }
    let criteria = FilterCriteria::by_artist(artist_id, None, None);
    count(store, &criteria).map(Some)
}

// =============================================================================
// Album routes
// =============================================================================

async fn search_albums(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.search_albums(&query.into_criteria()) {
        Ok(albums) => ApiResponse::ok(albums),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn count_albums(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.count_albums(&query.into_criteria()) {
        Ok(count) => ApiResponse::ok(json!({ "count": count })),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn recent_albums(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    // Preset: release date descending.
    let criteria = FilterCriteria {
        sort_by: Some(SortKey::ReleaseDate),
        limit: clamp_limit(parse_number(query.limit.as_deref())),
        ..Default::default()
    };
    match store.search_albums(&criteria) {
        Ok(albums) => ApiResponse::ok(albums),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn album_type_distribution(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.album_type_distribution(&query.into_criteria()) {
        Ok(entries) => ApiResponse::ok(entries),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_album(State(store): State<GuardedCatalogStore>, Path(id): Path<String>) -> Response {
    match store.get_album(&id) {
        Ok(Some(album)) => ApiResponse::ok(album),
        Ok(None) => ApiResponse::not_found("Album"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_album_tracks(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    let exists = match store.get_album(&id) {
        Ok(album) => album.is_some(),
        Err(err) => return ApiResponse::internal(err),
    };
    if !exists {
        return ApiResponse::not_found("Album");
    }
    match store.search_tracks(&FilterCriteria::by_album(&id)) {
        Ok(tracks) => ApiResponse::ok(tracks),
        Err(err) => ApiResponse::internal(err),
    }
}

// =============================================================================
// Track routes
// =============================================================================

async fn search_tracks(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.search_tracks(&query.into_criteria()) {
        Ok(tracks) => ApiResponse::ok(tracks),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn count_tracks(
    State(store): State<GuardedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match store.count_tracks(&query.into_criteria()) {
        Ok(count) => ApiResponse::ok(json!({ "count": count })),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_track(State(store): State<GuardedCatalogStore>, Path(id): Path<String>) -> Response {
    match store.get_track(&id) {
        Ok(Some(track)) => ApiResponse::ok(track),
        Ok(None) => ApiResponse::not_found("Track"),
        Err(err) => ApiResponse::internal(err),
    }
}

async fn get_similar_tracks(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let k = similarity::clamp_limit(parse_number(query.limit.as_deref()));
    match store.similar_tracks(&id, k) {
        Ok(Some(tracks)) => ApiResponse::ok(tracks),
        Ok(None) => ApiResponse::not_found("Track"),
        Err(err) => ApiResponse::internal(err),
    }
}

// =============================================================================
// Router
// =============================================================================

pub fn make_router(state: ServerState) -> Router {
    let artist_routes: Router = Router::new()
        .route("/search", get(search_artists))
        .route("/count", get(count_artists))
        .route("/trending", get(trending_artists))
        .route("/genre-count", get(genre_count))
        .route("/genre-distribution", get(genre_distribution))
        .route("/emotion-distribution", get(emotion_distribution))
        .route("/{id}", get(get_artist))
        .route("/{id}/collaborators", get(get_artist_collaborators))
        .route("/{id}/albums", get(get_artist_albums))
        .route("/{id}/albums/count", get(count_artist_albums))
        .route("/{id}/tracks", get(get_artist_tracks))
        .route("/{id}/tracks/count", get(count_artist_tracks))
        .with_state(state.clone());

    let album_routes: Router = Router::new()
        .route("/search", get(search_albums))
        .route("/count", get(count_albums))
        .route("/recent", get(recent_albums))
        .route("/search/type-distribution", get(album_type_distribution))
        .route("/{id}", get(get_album))
        .route("/{id}/tracks", get(get_album_tracks))
        .with_state(state.clone());

    let track_routes: Router = Router::new()
        .route("/search", get(search_tracks))
        .route("/count", get(count_tracks))
        .route("/{id}", get(get_track))
        .route("/{id}/similar", get(get_similar_tracks))
        .with_state(state.clone());

    let home_router: Router = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .route("/metrics", get(metrics_handler))
        .nest("/artists", artist_routes)
        .nest("/albums", album_routes)
        .nest("/tracks", track_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    catalog_store: Arc<dyn CatalogStore>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let state = ServerState::new(config, catalog_store);
    let app = make_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_map_to_criteria() {
        let query = SearchQuery {
            search_term: Some(" daft ".to_string()),
            genre_filter: Some("".to_string()),
            type_filter: Some("single".to_string()),
            emotion_filter: Some("calm".to_string()),
            ids: Some("a1,a2".to_string()),
            sort_by: Some("name".to_string()),
            sort_order: Some("asc".to_string()),
            limit: Some("20".to_string()),
            offset: Some("40".to_string()),
        };
        let criteria = query.into_criteria();

        assert_eq!(criteria.search_term.as_deref(), Some("daft"));
        assert_eq!(criteria.genre_filter, None);
        assert_eq!(criteria.type_filter, Some(AlbumType::Single));
        assert_eq!(criteria.emotion_filter, Some(EmotionLabel::Calm));
        assert_eq!(
            criteria.ids,
            Some(vec!["a1".to_string(), "a2".to_string()])
        );
        assert_eq!(criteria.sort_by, Some(SortKey::Name));
        assert_eq!(criteria.sort_order, SortOrder::Asc);
        assert_eq!(criteria.limit, 20);
        assert_eq!(criteria.offset, 40);
    }

    #[test]
    fn test_malformed_values_degrade_to_defaults() {
        let query = SearchQuery {
            type_filter: Some("all".to_string()),
            emotion_filter: Some("All".to_string()),
            sort_by: Some("danceability".to_string()),
            sort_order: Some("sideways".to_string()),
            limit: Some("not-a-number".to_string()),
            offset: Some("-3".to_string()),
            ..Default::default()
        };
        let criteria = query.into_criteria();

        assert_eq!(criteria.type_filter, None);
        assert_eq!(criteria.emotion_filter, None);
        assert_eq!(criteria.sort_by, None);
        assert_eq!(criteria.sort_order, SortOrder::Desc);
        assert_eq!(criteria.limit, crate::catalog_store::DEFAULT_PAGE_SIZE);
        assert_eq!(criteria.offset, 0);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }
}
