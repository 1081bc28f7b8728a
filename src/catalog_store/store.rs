//! SQLite-backed catalog store implementation.
//!
//! All reads go through a round-robin pool of read-only connections; a
//! write-capable connection is only opened at startup to create or migrate
//! the schema. Search and count for an entity share one predicate
//! composition function so paging math stays consistent with counts.

use super::criteria::{FilterCriteria, SortKey};
use super::models::{Album, AlbumType, Artist, AudioFeatures, Collaborator, Track};
use super::query::QueryBuilder;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::analytics::emotion::Band;
use crate::analytics::{classify, distribution, rank_similar, DistributionEntry, FeatureVector};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    // Brand new database: create the latest schema directly.
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);
    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Catalog database has unversioned schema (user_version = {})",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating catalog db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema.validate(conn)?;
    Ok(())
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path` with
    /// `read_pool_size` connections for concurrent reads.
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut setup_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;

        migrate_if_needed(&mut setup_conn)?;
        setup_conn.pragma_update(None, "journal_mode", "WAL")?;

        let artist_count: i64 = setup_conn
            .query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))
            .unwrap_or(0);
        let album_count: i64 = setup_conn
            .query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))
            .unwrap_or(0);
        let track_count: i64 = setup_conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened music catalog: {} artists, {} albums, {} tracks",
            artist_count, album_count, track_count
        );
        drop(setup_conn);

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    // =========================================================================
    // Predicate composition (shared between search and count per entity)
    // =========================================================================

    fn artist_predicates(criteria: &FilterCriteria) -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        if let Some(term) = &criteria.search_term {
            qb.and_like("a.name LIKE ?", term);
        }
        if let Some(genre) = &criteria.genre_filter {
            qb.and_like(
                "EXISTS (SELECT 1 FROM artist_genres g \
                 WHERE g.artist_rowid = a.rowid AND g.genre LIKE ?)",
                genre,
            );
        }
        if let Some(ids) = &criteria.ids {
            qb.and_id_set("a.id", ids);
        }
        qb
    }

    fn album_predicates(criteria: &FilterCriteria) -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        if let Some(term) = &criteria.search_term {
            qb.and_like("al.name LIKE ?", term);
        }
        if let Some(album_type) = &criteria.type_filter {
            qb.and(
                "al.album_type = ?",
                [Value::Text(album_type.to_db_str().to_string())],
            );
        }
        if let Some(ids) = &criteria.ids {
            qb.and_id_set("al.id", ids);
        }
        if let Some(artist_ids) = &criteria.artist_ids {
            and_exists_id_set(
                &mut qb,
                "EXISTS (SELECT 1 FROM album_artists aa \
                 JOIN artists ar ON ar.rowid = aa.artist_rowid \
                 WHERE aa.album_rowid = al.rowid AND ar.id IN ({ids}))",
                artist_ids,
            );
        }
        qb
    }

    fn track_predicates(criteria: &FilterCriteria) -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        if let Some(term) = &criteria.search_term {
            qb.and_like("t.name LIKE ?", term);
        }
        if let Some(emotion) = &criteria.emotion_filter {
            match emotion.bands() {
                // Other covers the rows classification cannot place.
                None => qb.and("(t.energy IS NULL OR t.valence IS NULL)", []),
                Some((energy_band, valence_band)) => {
                    and_band(&mut qb, "t.energy", energy_band);
                    and_band(&mut qb, "t.valence", valence_band);
                }
            }
        }
        if let Some(ids) = &criteria.ids {
            qb.and_id_set("t.id", ids);
        }
        if let Some(artist_ids) = &criteria.artist_ids {
            and_exists_id_set(
                &mut qb,
                "EXISTS (SELECT 1 FROM track_artists ta \
                 JOIN artists ar ON ar.rowid = ta.artist_rowid \
                 WHERE ta.track_rowid = t.rowid AND ar.id IN ({ids}))",
                artist_ids,
            );
        }
        if let Some(album_ids) = &criteria.album_ids {
            and_exists_id_set(
                &mut qb,
                "EXISTS (SELECT 1 FROM albums al2 \
                 WHERE al2.rowid = t.album_rowid AND al2.id IN ({ids}))",
                album_ids,
            );
        }
        qb
    }

    // ORDER BY columns come from these allow-lists only; a secondary id
    // sort makes every ordering total so pagination never straddles ties.

    fn artist_order(criteria: &FilterCriteria) -> String {
        let column = match criteria.sort_by {
            Some(SortKey::Name) => "a.name",
            Some(SortKey::Followers) => "a.followers",
            _ => "a.popularity",
        };
        format!("{} {}, a.id ASC", column, criteria.sort_order.as_sql())
    }

    fn album_order(criteria: &FilterCriteria) -> String {
        let column = match criteria.sort_by {
            Some(SortKey::Name) => "al.name",
            Some(SortKey::ReleaseDate) => "al.release_date",
            _ => "al.popularity",
        };
        format!("{} {}, al.id ASC", column, criteria.sort_order.as_sql())
    }

    fn track_order(criteria: &FilterCriteria) -> String {
        let column = match criteria.sort_by {
            Some(SortKey::Name) => "t.name",
            Some(SortKey::DurationMs) => "t.duration_ms",
            _ => "t.popularity",
        };
        format!("{} {}, t.id ASC", column, criteria.sort_order.as_sql())
    }

    // =========================================================================
    // Per-row relation helpers
    // =========================================================================

    fn artist_genres(conn: &Connection, artist_rowid: i64) -> Result<Vec<String>> {
        let mut stmt =
            conn.prepare_cached("SELECT genre FROM artist_genres WHERE artist_rowid = ?1")?;
        let genres = stmt
            .query_map(params![artist_rowid], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(genres)
    }

    fn artist_urls(conn: &Connection, artist_rowid: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare_cached(
            "SELECT url FROM artist_urls WHERE artist_rowid = ?1 ORDER BY position",
        )?;
        let urls = stmt
            .query_map(params![artist_rowid], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn album_urls(conn: &Connection, album_rowid: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare_cached(
            "SELECT url FROM album_urls WHERE album_rowid = ?1 ORDER BY position",
        )?;
        let urls = stmt
            .query_map(params![album_rowid], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    /// Credited artists in display order, as (ids, names).
    fn album_credits(conn: &Connection, album_rowid: i64) -> Result<(Vec<String>, Vec<String>)> {
        let mut stmt = conn.prepare_cached(
            "SELECT a.id, a.name FROM album_artists aa \
             JOIN artists a ON a.rowid = aa.artist_rowid \
             WHERE aa.album_rowid = ?1 ORDER BY aa.position",
        )?;
        let pairs = stmt
            .query_map(params![album_rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(pairs.into_iter().unzip())
    }

    fn track_credits(conn: &Connection, track_rowid: i64) -> Result<(Vec<String>, Vec<String>)> {
        let mut stmt = conn.prepare_cached(
            "SELECT a.id, a.name FROM track_artists ta \
             JOIN artists a ON a.rowid = ta.artist_rowid \
             WHERE ta.track_rowid = ?1 ORDER BY ta.position",
        )?;
        let pairs = stmt
            .query_map(params![track_rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(pairs.into_iter().unzip())
    }

    fn get_artist_rowid(conn: &Connection, id: &str) -> Result<Option<i64>> {
        match conn.query_row(
            "SELECT rowid FROM artists WHERE id = ?1",
            params![id],
            |r| r.get(0),
        ) {
            Ok(rowid) => Ok(Some(rowid)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn count_with(
        conn: &Connection,
        table_alias: &str,
        qb: QueryBuilder,
    ) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}{}", table_alias, qb.where_clause());
        let count = conn
            .prepare_cached(&sql)?
            .query_row(params_from_iter(qb.into_params()), |r| r.get(0))?;
        Ok(count)
    }
}

/// Restrict a feature column to one tertile band. Missing features never
/// match a band predicate because SQL NULL comparisons are not true.
/// Out-of-range values are treated like the classifier treats them: below
/// zero falls into the low band, above one into the high band.
fn and_band(qb: &mut QueryBuilder, column: &str, band: Band) {
    let (low, high, high_inclusive) = band.bounds();
    if low > 0.0 {
        qb.and(&format!("{} >= ?", column), [Value::Real(low)]);
    } else {
        qb.and(&format!("{} IS NOT NULL", column), []);
    }
    if !high_inclusive {
        qb.and(&format!("{} < ?", column), [Value::Real(high)]);
    }
}

/// Append an EXISTS predicate whose subquery filters on an id set. The
/// `{ids}` marker in `fragment` is replaced with the placeholder list; an
/// empty set matches zero rows like the plain id-set predicate.
fn and_exists_id_set(qb: &mut QueryBuilder, fragment: &str, ids: &[String]) {
    if ids.is_empty() {
        qb.and("0 = 1", []);
        return;
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    qb.and(
        &fragment.replace("{ids}", &placeholders),
        ids.iter().map(|id| Value::Text(id.clone())),
    );
}

const ARTIST_SELECT: &str = "SELECT a.rowid, a.id, a.name, a.popularity, a.followers, \
    (SELECT COUNT(*) FROM album_artists aa WHERE aa.artist_rowid = a.rowid) AS album_num, \
    (SELECT COUNT(*) FROM track_artists ta WHERE ta.artist_rowid = a.rowid) AS track_num, \
    (SELECT COUNT(DISTINCT ta2.artist_rowid) FROM track_artists ta1 \
     JOIN track_artists ta2 ON ta2.track_rowid = ta1.track_rowid \
     WHERE ta1.artist_rowid = a.rowid AND ta2.artist_rowid != a.rowid) AS collab_num \
    FROM artists a";

const ALBUM_SELECT: &str = "SELECT al.rowid, al.id, al.name, al.album_type, al.release_date, \
    al.popularity, \
    (SELECT COUNT(*) FROM tracks t WHERE t.album_rowid = al.rowid) AS num_tracks \
    FROM albums al";

const TRACK_SELECT: &str = "SELECT t.rowid, t.id, t.name, al.id, al.name, t.duration_ms, \
    t.explicit, t.popularity, t.energy, t.valence, t.danceability, t.acousticness, \
    t.instrumentalness, t.liveness, t.speechiness, t.loudness, t.tempo, t.key, t.mode, \
    t.time_signature \
    FROM tracks t LEFT JOIN albums al ON al.rowid = t.album_rowid";

impl CatalogStore for SqliteCatalogStore {
    fn search_artists(&self, criteria: &FilterCriteria) -> Result<Vec<Artist>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let qb = Self::artist_predicates(criteria);
        let sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            ARTIST_SELECT,
            qb.where_clause(),
            Self::artist_order(criteria)
        );
        let mut params = qb.into_params();
        params.push(Value::Integer(criteria.limit));
        params.push(Value::Integer(criteria.offset));

        let mut stmt = conn.prepare_cached(&sql).context("artist search query")?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Artist {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        popularity: row.get(3)?,
                        followers: row.get(4)?,
                        genres: Vec::new(),
                        urls: Vec::new(),
                        album_num: row.get(5)?,
                        track_num: row.get(6)?,
                        collab_num: row.get(7)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut artists = Vec::with_capacity(rows.len());
        for (rowid, mut artist) in rows {
            artist.genres = Self::artist_genres(&conn, rowid)?;
            artist.urls = Self::artist_urls(&conn, rowid)?;
            artists.push(artist);
        }
        Ok(artists)
    }

    fn count_artists(&self, criteria: &FilterCriteria) -> Result<i64> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::count_with(&conn, "artists a", Self::artist_predicates(criteria))
            .context("artist count query")
    }

    fn get_artist(&self, id: &str) -> Result<Option<Artist>> {
        let criteria = FilterCriteria::by_ids(vec![id.to_string()]);
        Ok(self.search_artists(&criteria)?.into_iter().next())
    }

    fn get_collaborators(&self, id: &str) -> Result<Option<Vec<Collaborator>>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let Some(artist_rowid) = Self::get_artist_rowid(&conn, id)? else {
            return Ok(None);
        };

        // collab_num counts distinct shared tracks, not credit rows.
        let mut stmt = conn.prepare_cached(
            "SELECT a.rowid, a.id, a.name, a.popularity, \
             COUNT(DISTINCT ta1.track_rowid) AS collab_num \
             FROM track_artists ta1 \
             JOIN track_artists ta2 ON ta2.track_rowid = ta1.track_rowid \
             JOIN artists a ON a.rowid = ta2.artist_rowid \
             WHERE ta1.artist_rowid = ?1 AND ta2.artist_rowid != ?1 \
             GROUP BY a.rowid \
             ORDER BY collab_num DESC, a.name ASC",
        )?;
        let rows = stmt
            .query_map(params![artist_rowid], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Collaborator {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        popularity: row.get(3)?,
                        genres: Vec::new(),
                        urls: Vec::new(),
                        collab_num: row.get(4)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut collaborators = Vec::with_capacity(rows.len());
        for (rowid, mut collaborator) in rows {
            collaborator.genres = Self::artist_genres(&conn, rowid)?;
            collaborator.urls = Self::artist_urls(&conn, rowid)?;
            collaborators.push(collaborator);
        }
        Ok(Some(collaborators))
    }

    fn search_albums(&self, criteria: &FilterCriteria) -> Result<Vec<Album>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let qb = Self::album_predicates(criteria);
        let sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            ALBUM_SELECT,
            qb.where_clause(),
            Self::album_order(criteria)
        );
        let mut params = qb.into_params();
        params.push(Value::Integer(criteria.limit));
        params.push(Value::Integer(criteria.offset));

        let mut stmt = conn.prepare_cached(&sql).context("album search query")?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                let album_type: String = row.get(3)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    Album {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        album_type: AlbumType::from_db_str(&album_type),
                        release_date: row.get(4)?,
                        popularity: row.get(5)?,
                        urls: Vec::new(),
                        num_tracks: row.get(6)?,
                        artist_ids: Vec::new(),
                        artist_names: Vec::new(),
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut albums = Vec::with_capacity(rows.len());
        for (rowid, mut album) in rows {
            album.urls = Self::album_urls(&conn, rowid)?;
            let (artist_ids, artist_names) = Self::album_credits(&conn, rowid)?;
            album.artist_ids = artist_ids;
            album.artist_names = artist_names;
            albums.push(album);
        }
        Ok(albums)
    }

    fn count_albums(&self, criteria: &FilterCriteria) -> Result<i64> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::count_with(&conn, "albums al", Self::album_predicates(criteria))
            .context("album count query")
    }

    fn get_album(&self, id: &str) -> Result<Option<Album>> {
        let criteria = FilterCriteria::by_ids(vec![id.to_string()]);
        Ok(self.search_albums(&criteria)?.into_iter().next())
    }

    fn search_tracks(&self, criteria: &FilterCriteria) -> Result<Vec<Track>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let qb = Self::track_predicates(criteria);
        let sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            TRACK_SELECT,
            qb.where_clause(),
            Self::track_order(criteria)
        );
        let mut params = qb.into_params();
        params.push(Value::Integer(criteria.limit));
        params.push(Value::Integer(criteria.offset));

        let mut stmt = conn.prepare_cached(&sql).context("track search query")?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                let features = AudioFeatures {
                    energy: row.get(8)?,
                    valence: row.get(9)?,
                    danceability: row.get(10)?,
                    acousticness: row.get(11)?,
                    instrumentalness: row.get(12)?,
                    liveness: row.get(13)?,
                    speechiness: row.get(14)?,
                    loudness: row.get(15)?,
                    tempo: row.get(16)?,
                    key: row.get(17)?,
                    mode: row.get(18)?,
                    time_signature: row.get(19)?,
                };
                let emotion = classify(features.energy, features.valence);
                Ok((
                    row.get::<_, i64>(0)?,
                    Track {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        album_id: row.get(3)?,
                        album_name: row.get(4)?,
                        artist_ids: Vec::new(),
                        artist_names: Vec::new(),
                        duration_ms: row.get(5)?,
                        explicit: row.get::<_, i64>(6)? != 0,
                        popularity: row.get(7)?,
                        features,
                        emotion,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tracks = Vec::with_capacity(rows.len());
        for (rowid, mut track) in rows {
            let (artist_ids, artist_names) = Self::track_credits(&conn, rowid)?;
            track.artist_ids = artist_ids;
            track.artist_names = artist_names;
            tracks.push(track);
        }
        Ok(tracks)
    }

    fn count_tracks(&self, criteria: &FilterCriteria) -> Result<i64> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Self::count_with(&conn, "tracks t", Self::track_predicates(criteria))
            .context("track count query")
    }

    fn get_track(&self, id: &str) -> Result<Option<Track>> {
        let criteria = FilterCriteria::by_ids(vec![id.to_string()]);
        Ok(self.search_tracks(&criteria)?.into_iter().next())
    }

    fn similar_tracks(&self, track_id: &str, k: usize) -> Result<Option<Vec<Track>>> {
        let reference = {
            let read_conn = self.get_read_conn();
            let conn = read_conn.lock().unwrap();

            let row = conn
                .query_row(
                    "SELECT energy, valence, danceability, acousticness, tempo \
                     FROM tracks WHERE id = ?1",
                    params![track_id],
                    |r| {
                        Ok((
                            r.get::<_, Option<f64>>(0)?,
                            r.get::<_, Option<f64>>(1)?,
                            r.get::<_, Option<f64>>(2)?,
                            r.get::<_, Option<f64>>(3)?,
                            r.get::<_, Option<f64>>(4)?,
                        ))
                    },
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    e => Err(e),
                })?;

            let Some(row) = row else {
                return Ok(None);
            };
            // Comparison needs the full vector on the reference side too.
            let (Some(energy), Some(valence), Some(danceability), Some(acousticness), Some(tempo)) =
                row
            else {
                return Ok(Some(Vec::new()));
            };
            FeatureVector {
                track_id: track_id.to_string(),
                energy,
                valence,
                danceability,
                acousticness,
                tempo,
            }
        };

        let candidates = {
            let read_conn = self.get_read_conn();
            let conn = read_conn.lock().unwrap();
            let mut stmt = conn.prepare_cached(
                "SELECT id, energy, valence, danceability, acousticness, tempo FROM tracks \
                 WHERE energy IS NOT NULL AND valence IS NOT NULL \
                 AND danceability IS NOT NULL AND acousticness IS NOT NULL \
                 AND tempo IS NOT NULL",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(FeatureVector {
                    track_id: row.get(0)?,
                    energy: row.get(1)?,
                    valence: row.get(2)?,
                    danceability: row.get(3)?,
                    acousticness: row.get(4)?,
                    tempo: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let ranked = rank_similar(&reference, &candidates, k);
        if ranked.is_empty() {
            return Ok(Some(Vec::new()));
        }

        // Fetch the full rows, then restore ranking order.
        let tracks = self.search_tracks(&FilterCriteria::by_ids(ranked.clone()))?;
        let mut by_id: HashMap<String, Track> =
            tracks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Ok(Some(
            ranked.into_iter().filter_map(|id| by_id.remove(&id)).collect(),
        ))
    }

    fn genre_count(&self) -> Result<i64> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let count = conn
            .query_row("SELECT COUNT(DISTINCT genre) FROM artist_genres", [], |r| {
                r.get(0)
            })
            .context("genre count query")?;
        Ok(count)
    }

    fn genre_distribution(&self, criteria: &FilterCriteria) -> Result<Vec<DistributionEntry>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let qb = Self::artist_predicates(criteria);
        let sql = format!(
            "SELECT g.genre FROM artist_genres g \
             JOIN artists a ON a.rowid = g.artist_rowid{}",
            qb.where_clause()
        );
        let mut stmt = conn.prepare_cached(&sql).context("genre distribution query")?;
        let genres = stmt
            .query_map(params_from_iter(qb.into_params()), |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(distribution(genres))
    }

    fn emotion_distribution(&self, criteria: &FilterCriteria) -> Result<Vec<DistributionEntry>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        // No artist filter means every track counts, credited or not.
        let qb = Self::artist_predicates(criteria);
        let sql = if qb.is_empty() {
            "SELECT t.energy, t.valence FROM tracks t".to_string()
        } else {
            format!(
                "SELECT t.energy, t.valence FROM tracks t \
                 WHERE EXISTS (SELECT 1 FROM track_artists ta \
                 JOIN artists a ON a.rowid = ta.artist_rowid \
                 WHERE ta.track_rowid = t.rowid AND {})",
                qb.conjunction()
            )
        };
        let mut stmt = conn
            .prepare_cached(&sql)
            .context("emotion distribution query")?;
        let labels = stmt
            .query_map(params_from_iter(qb.into_params()), |row| {
                let energy: Option<f64> = row.get(0)?;
                let valence: Option<f64> = row.get(1)?;
                Ok(classify(energy, valence).as_str().to_string())
            })?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(distribution(labels))
    }

    fn album_type_distribution(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<DistributionEntry>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let qb = Self::album_predicates(criteria);
        let sql = format!(
            "SELECT al.album_type FROM albums al{}",
            qb.where_clause()
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .context("album type distribution query")?;
        let labels = stmt
            .query_map(params_from_iter(qb.into_params()), |row| {
                let raw: String = row.get(0)?;
                Ok(AlbumType::from_db_str(&raw).to_db_str().to_string())
            })?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(distribution(labels))
    }

    fn artists_count(&self) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    fn albums_count(&self) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM albums", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    fn tracks_count(&self) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }
}
