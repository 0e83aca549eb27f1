//! SQLite-backed [`SpotSource`].

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use geo::Coord;
use rusqlite::{Connection, OpenFlags, Row, params};
use thiserror::Error;

use crate::{
    Address, DifficultyLevel, Obstacle, Photo, Spot, SpotId, SpotObstacle, SpotType, SurfaceType,
    TaxonomyEntry, Tranquility, TranquilityError,
};

use super::{SourceError, SpotSource, join_photo_url};

/// Public base URL used when none is configured.
pub const DEFAULT_PHOTO_BASE_URL: &str = "/storage/photos";

/// Tables read by [`SqliteSpotSource`].
pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS spot_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS difficulty_levels (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS surface_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS spots (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    street TEXT,
    city TEXT,
    province TEXT,
    country TEXT,
    spot_type_id INTEGER REFERENCES spot_types (id),
    difficulty_id INTEGER REFERENCES difficulty_levels (id),
    surface_type_id INTEGER REFERENCES surface_types (id),
    is_public INTEGER,
    has_security INTEGER,
    has_water INTEGER,
    tranquility INTEGER,
    best_time TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT
);
CREATE TABLE IF NOT EXISTS photos (
    id TEXT PRIMARY KEY,
    spot_id TEXT NOT NULL REFERENCES spots (id),
    storage_path TEXT NOT NULL,
    description TEXT,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS obstacles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS spot_obstacles (
    spot_id TEXT NOT NULL REFERENCES spots (id),
    obstacle_id INTEGER NOT NULL REFERENCES obstacles (id),
    notes TEXT,
    PRIMARY KEY (spot_id, obstacle_id)
);
";

const SPOT_COLUMNS: &str = "
SELECT s.id, s.name, s.description, s.latitude, s.longitude,
       s.street, s.city, s.province, s.country,
       s.spot_type_id, s.difficulty_id, s.surface_type_id,
       s.is_public, s.has_security, s.has_water, s.tranquility, s.best_time,
       s.created_at, s.updated_at,
       st.id, st.name, st.description,
       dl.id, dl.name, dl.description,
       su.id, su.name, su.description
FROM spots s
LEFT JOIN spot_types st ON st.id = s.spot_type_id
LEFT JOIN difficulty_levels dl ON dl.id = s.difficulty_id
LEFT JOIN surface_types su ON su.id = s.surface_type_id";

/// Connection settings for [`SqliteSpotSource`].
///
/// # Examples
/// ```
/// use spotfinder_core::{DEFAULT_PHOTO_BASE_URL, SqliteSpotSourceConfig};
///
/// let config = SqliteSpotSourceConfig::new("spots.db");
/// assert_eq!(config.photo_base_url, DEFAULT_PHOTO_BASE_URL);
///
/// let config = config.with_photo_base_url("https://cdn.example.org/photos");
/// assert_eq!(config.photo_base_url, "https://cdn.example.org/photos");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SqliteSpotSourceConfig {
    /// Location of the SQLite database on disk.
    pub database_path: PathBuf,
    /// Public URL prefix for photo storage paths.
    pub photo_base_url: String,
}

impl Default for SqliteSpotSourceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("spots.db"),
            photo_base_url: DEFAULT_PHOTO_BASE_URL.to_owned(),
        }
    }
}

impl SqliteSpotSourceConfig {
    /// Configuration for the database at `database_path`.
    #[must_use]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Override the public photo base URL.
    #[must_use]
    pub fn with_photo_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.photo_base_url = base_url.into();
        self
    }
}

/// Error raised when opening or reading the spot database.
#[derive(Debug, Error)]
pub enum SqliteSpotSourceError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored tranquility score was outside the valid range.
    #[error("invalid tranquility for spot {id}: {source}")]
    InvalidTranquility {
        /// Identifier of the offending spot.
        id: String,
        /// Validation failure.
        #[source]
        source: TranquilityError,
    },
    /// Generic SQLite error when reading rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl SqliteSpotSourceError {
    fn into_source_error(self, operation: &'static str) -> SourceError {
        match self {
            Self::InvalidTranquility { id, source } => SourceError::InvalidRecord {
                id,
                reason: source.to_string(),
            },
            Self::Database(source) => SourceError::query(operation, source),
            other @ Self::OpenDatabase { .. } => SourceError::query(operation, other),
        }
    }
}

/// Read-only spot source over a SQLite database.
pub struct SqliteSpotSource {
    connection: Connection,
    path: PathBuf,
    photo_base_url: String,
}

impl fmt::Debug for SqliteSpotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSpotSource")
            .field("path", &self.path)
            .field("photo_base_url", &self.photo_base_url)
            .finish_non_exhaustive()
    }
}

impl SqliteSpotSource {
    /// Open the database named by `config` read-only.
    pub fn open(config: &SqliteSpotSourceConfig) -> Result<Self, SqliteSpotSourceError> {
        let path = config.database_path.clone();
        let connection = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteSpotSourceError::OpenDatabase {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            connection,
            path,
            photo_base_url: config.photo_base_url.clone(),
        })
    }

    /// Location of the backing database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_spots(&self) -> Result<Vec<Spot>, SqliteSpotSourceError> {
        let mut photos = self.load_photos(None)?;
        let mut statement = self
            .connection
            .prepare(&format!("{SPOT_COLUMNS} ORDER BY s.name COLLATE NOCASE, s.id"))?;
        let mut rows = statement.query([])?;
        let mut spots = Vec::new();
        while let Some(row) = rows.next()? {
            let mut spot = spot_from_row(row)?;
            spot.photos = photos.remove(spot.id.as_str()).unwrap_or_default();
            spots.push(spot);
        }
        Ok(spots)
    }

    fn load_spot(&self, id: &SpotId) -> Result<Option<Spot>, SqliteSpotSourceError> {
        let mut statement = self
            .connection
            .prepare(&format!("{SPOT_COLUMNS} WHERE s.id = ?1"))?;
        let mut rows = statement.query(params![id.as_str()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut spot = spot_from_row(row)?;
        spot.photos = self
            .load_photos(Some(id))?
            .remove(id.as_str())
            .unwrap_or_default();
        spot.obstacles = Some(self.load_obstacles(id)?);
        Ok(Some(spot))
    }

    fn load_photos(
        &self,
        spot: Option<&SpotId>,
    ) -> Result<HashMap<String, Vec<Photo>>, SqliteSpotSourceError> {
        let mut statement = self.connection.prepare(
            "SELECT id, spot_id, storage_path, description, is_primary, created_at \
             FROM photos WHERE (?1 IS NULL OR spot_id = ?1) ORDER BY created_at, id",
        )?;
        let rows = statement.query_map(params![spot.map(SpotId::as_str)], |row| {
            Ok(Photo {
                id: row.get(0)?,
                spot_id: SpotId::new(row.get::<_, String>(1)?),
                storage_path: row.get(2)?,
                description: row.get(3)?,
                is_primary: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        let mut grouped: HashMap<String, Vec<Photo>> = HashMap::new();
        for fetched in rows {
            let photo = fetched?;
            grouped
                .entry(photo.spot_id.as_str().to_owned())
                .or_default()
                .push(photo);
        }
        Ok(grouped)
    }

    fn load_obstacles(&self, id: &SpotId) -> Result<Vec<SpotObstacle>, SqliteSpotSourceError> {
        let mut statement = self.connection.prepare(
            "SELECT o.id, o.name, o.description, so.notes \
             FROM spot_obstacles so JOIN obstacles o ON o.id = so.obstacle_id \
             WHERE so.spot_id = ?1 ORDER BY o.name COLLATE NOCASE, o.id",
        )?;
        let rows = statement.query_map(params![id.as_str()], |row| {
            Ok(SpotObstacle {
                obstacle: Obstacle {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                },
                notes: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn load_taxonomy(&self, table: &str) -> Result<Vec<TaxonomyEntry>, SqliteSpotSourceError> {
        let mut statement = self.connection.prepare(&format!(
            "SELECT id, name, description FROM {table} ORDER BY name COLLATE NOCASE, id"
        ))?;
        let rows = statement.query_map([], |row| {
            Ok(TaxonomyEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn spot_from_row(row: &Row<'_>) -> Result<Spot, SqliteSpotSourceError> {
    let id: String = row.get(0)?;
    let tranquility = row
        .get::<_, Option<i64>>(15)?
        .map(Tranquility::try_from)
        .transpose()
        .map_err(|source| SqliteSpotSourceError::InvalidTranquility {
            id: id.clone(),
            source,
        })?;
    Ok(Spot {
        id: SpotId::new(id),
        name: row.get(1)?,
        description: row.get(2)?,
        location: Coord {
            x: row.get(4)?,
            y: row.get(3)?,
        },
        address: Address {
            street: row.get(5)?,
            city: row.get(6)?,
            province: row.get(7)?,
            country: row.get(8)?,
        },
        spot_type_id: row.get(9)?,
        difficulty_id: row.get(10)?,
        surface_type_id: row.get(11)?,
        is_public: row.get(12)?,
        has_security: row.get(13)?,
        has_water: row.get(14)?,
        tranquility,
        best_time: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
        spot_type: joined_entry(row, 19)?,
        difficulty_level: joined_entry(row, 22)?,
        surface_type: joined_entry(row, 25)?,
        photos: Vec::new(),
        obstacles: None,
    })
}

fn joined_entry(row: &Row<'_>, first: usize) -> rusqlite::Result<Option<TaxonomyEntry>> {
    let id: Option<i64> = row.get(first)?;
    let name: Option<String> = row.get(first + 1)?;
    let description: Option<String> = row.get(first + 2)?;
    Ok(id.zip(name).map(|(entry_id, entry_name)| TaxonomyEntry {
        id: entry_id,
        name: entry_name,
        description,
    }))
}

#[async_trait(?Send)]
impl SpotSource for SqliteSpotSource {
    async fn list_spots(&self) -> Result<Vec<Spot>, SourceError> {
        self.load_spots()
            .map_err(|err| err.into_source_error("list spots"))
    }

    async fn list_spot_types(&self) -> Result<Vec<SpotType>, SourceError> {
        self.load_taxonomy("spot_types")
            .map_err(|err| err.into_source_error("list spot types"))
    }

    async fn list_difficulty_levels(&self) -> Result<Vec<DifficultyLevel>, SourceError> {
        self.load_taxonomy("difficulty_levels")
            .map_err(|err| err.into_source_error("list difficulty levels"))
    }

    async fn list_surface_types(&self) -> Result<Vec<SurfaceType>, SourceError> {
        self.load_taxonomy("surface_types")
            .map_err(|err| err.into_source_error("list surface types"))
    }

    async fn spot_detail(&self, id: &SpotId) -> Result<Spot, SourceError> {
        self.load_spot(id)
            .map_err(|err| err.into_source_error("load spot detail"))?
            .ok_or_else(|| SourceError::NotFound { id: id.clone() })
    }

    fn photo_url(&self, storage_path: &str) -> String {
        join_photo_url(&self.photo_base_url, storage_path)
    }
}
