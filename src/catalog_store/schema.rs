//! SQLite schema for the music catalog database.
//!
//! Primary keys are integer rowids with unique text catalog IDs for
//! lookups. Audio features live as nullable REAL columns directly on the
//! tracks table: absence means "not computed", and the emotion label is
//! derived on read, never stored.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Artists table
const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("followers", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_artists_name", "name")],
};

/// Albums table
const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_type", &SqlType::Text, non_null = true), // 'album', 'single', 'compilation'
        sqlite_column!("release_date", &SqlType::Text), // '2023-05-15', '2023-05' or '2023'
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_albums_name", "name"),
        ("idx_albums_type", "album_type"),
    ],
};

/// Tracks table with the audio-feature vector inline
const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_rowid", &SqlType::Integer), // NULL for uncategorized tracks
        sqlite_column!("duration_ms", &SqlType::Integer, non_null = true),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("energy", &SqlType::Real),
        sqlite_column!("valence", &SqlType::Real),
        sqlite_column!("danceability", &SqlType::Real),
        sqlite_column!("acousticness", &SqlType::Real),
        sqlite_column!("instrumentalness", &SqlType::Real),
        sqlite_column!("liveness", &SqlType::Real),
        sqlite_column!("speechiness", &SqlType::Real),
        sqlite_column!("loudness", &SqlType::Real),
        sqlite_column!("tempo", &SqlType::Real),
        sqlite_column!("key", &SqlType::Integer),
        sqlite_column!("mode", &SqlType::Integer),
        sqlite_column!("time_signature", &SqlType::Integer),
    ],
    indices: &[
        ("idx_tracks_name", "name"),
        ("idx_tracks_album", "album_rowid"),
    ],
};

/// Track <-> Artist credits, ordered by position
const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!("track_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_track_artists_track", "track_rowid"),
        ("idx_track_artists_artist", "artist_rowid"),
    ],
};

/// Album <-> Artist credits, ordered by position
const ALBUM_ARTISTS_TABLE: Table = Table {
    name: "album_artists",
    columns: &[
        sqlite_column!("album_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_album_artists_album", "album_rowid"),
        ("idx_album_artists_artist", "artist_rowid"),
    ],
};

/// Artist <-> Genre relationship, one row per membership
const ARTIST_GENRES_TABLE: Table = Table {
    name: "artist_genres",
    columns: &[
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_artist_genres_artist", "artist_rowid"),
        ("idx_artist_genres_genre", "genre"),
    ],
};

/// External artist URLs
const ARTIST_URLS_TABLE: Table = Table {
    name: "artist_urls",
    columns: &[
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_artist_urls_artist", "artist_rowid")],
};

/// External album URLs
const ALBUM_URLS_TABLE: Table = Table {
    name: "album_urls",
    columns: &[
        sqlite_column!("album_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_album_urls_album", "album_rowid")],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        TRACKS_TABLE,
        TRACK_ARTISTS_TABLE,
        ALBUM_ARTISTS_TABLE,
        ARTIST_GENRES_TABLE,
        ARTIST_URLS_TABLE,
        ALBUM_URLS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_creates_successfully() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &CATALOG_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn test_insert_artist_and_genres() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO artists (id, name, popularity, followers) VALUES ('a1', 'Pitbull', 82, 25000000)",
            [],
        )
        .unwrap();
        let artist_rowid: i64 = conn
            .query_row("SELECT rowid FROM artists WHERE id = 'a1'", [], |r| {
                r.get(0)
            })
            .unwrap();

        conn.execute(
            "INSERT INTO artist_genres (artist_rowid, genre) VALUES (?, 'dance pop')",
            [artist_rowid],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO artist_genres (artist_rowid, genre) VALUES (?, 'miami hip hop')",
            [artist_rowid],
        )
        .unwrap();

        let mut stmt = conn
            .prepare("SELECT genre FROM artist_genres WHERE artist_rowid = ?")
            .unwrap();
        let genres: Vec<String> = stmt
            .query_map([artist_rowid], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(genres.len(), 2);
        assert!(genres.contains(&"dance pop".to_string()));
    }

    #[test]
    fn test_duplicate_catalog_id_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO artists (id, name, popularity, followers) VALUES ('a1', 'First', 10, 0)",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO artists (id, name, popularity, followers) VALUES ('a1', 'Second', 20, 0)",
            [],
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_track_features_are_nullable() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        // A track without any computed audio features and no album.
        conn.execute(
            "INSERT INTO tracks (id, name, album_rowid, duration_ms, explicit, popularity)
             VALUES ('t1', 'Demo', NULL, 180000, 0, 10)",
            [],
        )
        .unwrap();

        let (energy, tempo): (Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT energy, tempo FROM tracks WHERE id = 't1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(energy, None);
        assert_eq!(tempo, None);
    }

    #[test]
    fn test_track_artists_keep_credit_order() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO artists (id, name, popularity, followers) VALUES ('a1', 'Lead', 50, 100)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO artists (id, name, popularity, followers) VALUES ('a2', 'Feature', 30, 50)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tracks (id, name, album_rowid, duration_ms, explicit, popularity)
             VALUES ('t1', 'Duet', NULL, 210000, 0, 40)",
            [],
        )
        .unwrap();

        let track_rowid: i64 = conn
            .query_row("SELECT rowid FROM tracks WHERE id = 't1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        // Inserted out of order on purpose.
        conn.execute(
            "INSERT INTO track_artists (track_rowid, artist_rowid, position)
             SELECT ?, rowid, 1 FROM artists WHERE id = 'a2'",
            [track_rowid],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO track_artists (track_rowid, artist_rowid, position)
             SELECT ?, rowid, 0 FROM artists WHERE id = 'a1'",
            [track_rowid],
        )
        .unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT a.name FROM track_artists ta
                 JOIN artists a ON a.rowid = ta.artist_rowid
                 WHERE ta.track_rowid = ?
                 ORDER BY ta.position",
            )
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([track_rowid], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(names, vec!["Lead".to_string(), "Feature".to_string()]);
    }
}
