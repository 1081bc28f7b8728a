//! CatalogStore trait definition.
//!
//! This trait abstracts catalog reads so handlers and tests can work
//! against any backend; `SqliteCatalogStore` is the production
//! implementation.

use anyhow::Result;

use super::criteria::FilterCriteria;
use super::models::{Album, Artist, Collaborator, Track};
use crate::analytics::DistributionEntry;

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    /// Search artists matching the criteria, sorted and paginated.
    fn search_artists(&self, criteria: &FilterCriteria) -> Result<Vec<Artist>>;

    /// Count artists matching the criteria, ignoring pagination.
    fn count_artists(&self, criteria: &FilterCriteria) -> Result<i64>;

    /// Get an artist by ID.
    fn get_artist(&self, id: &str) -> Result<Option<Artist>>;

    /// Get an artist's collaborators with shared-track counts, sorted by
    /// collaboration count descending. `None` when the artist is unknown.
    fn get_collaborators(&self, id: &str) -> Result<Option<Vec<Collaborator>>>;

    // =========================================================================
    // Albums
    // =========================================================================

    /// Search albums matching the criteria, sorted and paginated.
    fn search_albums(&self, criteria: &FilterCriteria) -> Result<Vec<Album>>;

    /// Count albums matching the criteria, ignoring pagination.
    fn count_albums(&self, criteria: &FilterCriteria) -> Result<i64>;

    /// Get an album by ID.
    fn get_album(&self, id: &str) -> Result<Option<Album>>;

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Search tracks matching the criteria, sorted and paginated.
    fn search_tracks(&self, criteria: &FilterCriteria) -> Result<Vec<Track>>;

    /// Count tracks matching the criteria, ignoring pagination.
    fn count_tracks(&self, criteria: &FilterCriteria) -> Result<i64>;

    /// Get a track by ID.
    fn get_track(&self, id: &str) -> Result<Option<Track>>;

    /// Get the `k` tracks most similar to the given track by audio
    /// features, nearest first. `None` when the track is unknown; empty
    /// when the track is missing the features needed for comparison.
    fn similar_tracks(&self, track_id: &str, k: usize) -> Result<Option<Vec<Track>>>;

    // =========================================================================
    // Distributions
    // =========================================================================

    /// Number of distinct genres across the catalog.
    fn genre_count(&self) -> Result<i64>;

    /// Genre distribution over the artists matching the criteria.
    /// Multi-genre artists count once per genre membership.
    fn genre_distribution(&self, criteria: &FilterCriteria) -> Result<Vec<DistributionEntry>>;

    /// Emotion-label distribution over the tracks credited to artists
    /// matching the criteria, classifying each track on the fly.
    fn emotion_distribution(&self, criteria: &FilterCriteria) -> Result<Vec<DistributionEntry>>;

    /// Album-type distribution over the albums matching the criteria.
    fn album_type_distribution(&self, criteria: &FilterCriteria)
        -> Result<Vec<DistributionEntry>>;

    // =========================================================================
    // Counts (for metrics)
    // =========================================================================

    /// Get the number of artists in the catalog.
    fn artists_count(&self) -> usize;

    /// Get the number of albums in the catalog.
    fn albums_count(&self) -> usize;

    /// Get the number of tracks in the catalog.
    fn tracks_count(&self) -> usize;
}
