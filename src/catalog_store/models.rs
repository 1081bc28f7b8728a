//! Catalog models for the SQLite-backed store.
//!
//! These are the API-facing shapes: artists and albums carry their
//! denormalized counters and relations, tracks carry the audio-feature
//! vector plus the derived emotion label.

use crate::analytics::EmotionLabel;
use serde::{Deserialize, Serialize};

/// Album type classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
}

impl AlbumType {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "single" => AlbumType::Single,
            "compilation" => AlbumType::Compilation,
            _ => AlbumType::Album, // Default fallback
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Single => "single",
            AlbumType::Compilation => "compilation",
        }
    }

    /// Parse a type filter value. `"all"`, empty and unknown strings mean
    /// "no filter".
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "album" => Some(AlbumType::Album),
            "single" => Some(AlbumType::Single),
            "compilation" => Some(AlbumType::Compilation),
            _ => None,
        }
    }
}

/// Artist entity with denormalized counters
#[derive(Clone, Debug, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub followers: i64,
    pub genres: Vec<String>,
    pub urls: Vec<String>,
    pub album_num: i64,
    pub track_num: i64,
    pub collab_num: i64,
}

/// Album entity with credited artists
#[derive(Clone, Debug, Serialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub album_type: AlbumType,
    pub release_date: Option<String>,
    pub popularity: i64,
    pub urls: Vec<String>,
    pub num_tracks: i64,
    pub artist_ids: Vec<String>,
    pub artist_names: Vec<String>,
}

/// Audio-feature vector of a track.
///
/// Absence is a first-class state for every feature: a missing value means
/// "not computed / not applicable", never zero.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AudioFeatures {
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub danceability: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
    pub loudness: Option<f64>,
    pub tempo: Option<f64>,
    pub key: Option<i64>,
    pub mode: Option<i64>,
    pub time_signature: Option<i64>,
}

/// Track entity. `album_id` is nullable: a track may be uncategorized.
#[derive(Clone, Debug, Serialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub album_id: Option<String>,
    pub album_name: Option<String>,
    pub artist_ids: Vec<String>,
    pub artist_names: Vec<String>,
    pub duration_ms: i64,
    pub explicit: bool,
    pub popularity: i64,
    #[serde(flatten)]
    pub features: AudioFeatures,
    /// Derived from energy and valence on every read, never stored.
    pub emotion: EmotionLabel,
}

/// A co-credited artist with the number of distinct shared tracks.
#[derive(Clone, Debug, Serialize)]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub genres: Vec<String>,
    pub urls: Vec<String>,
    pub collab_num: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_type_roundtrip() {
        for album_type in [AlbumType::Album, AlbumType::Single, AlbumType::Compilation] {
            let parsed = AlbumType::from_db_str(album_type.to_db_str());
            assert_eq!(album_type, parsed);
        }
    }

    #[test]
    fn test_album_type_filter_parsing() {
        assert_eq!(AlbumType::parse_filter("single"), Some(AlbumType::Single));
        assert_eq!(AlbumType::parse_filter("Album"), Some(AlbumType::Album));
        assert_eq!(AlbumType::parse_filter("all"), None);
        assert_eq!(AlbumType::parse_filter(""), None);
        assert_eq!(AlbumType::parse_filter("podcast"), None);
    }

    #[test]
    fn test_track_serializes_features_flat() {
        let track = Track {
            id: "t1".to_string(),
            name: "Test Track".to_string(),
            album_id: None,
            album_name: None,
            artist_ids: vec![],
            artist_names: vec![],
            duration_ms: 210_000,
            explicit: false,
            popularity: 50,
            features: AudioFeatures {
                energy: Some(0.9),
                valence: Some(0.1),
                ..Default::default()
            },
            emotion: crate::analytics::classify(Some(0.9), Some(0.1)),
        };

        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["energy"], 0.9);
        assert_eq!(json["emotion"], "Frantic");
        assert!(json["album_id"].is_null());
    }
}
