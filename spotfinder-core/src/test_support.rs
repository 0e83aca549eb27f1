//! In-memory [`SpotSource`] and fixture helpers used by unit and behaviour
//! tests.

use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::Coord;

use crate::{
    DifficultyLevel, SourceError, Spot, SpotId, SpotSource, SpotType, SurfaceType, Taxonomies,
    source::join_photo_url,
};

#[cfg(feature = "store-sqlite")]
pub use sqlite_fixture::write_sqlite_database;

/// The [`SpotSource`] operations, used to script failures and record calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOperation {
    /// [`SpotSource::list_spots`].
    ListSpots,
    /// [`SpotSource::list_spot_types`].
    ListSpotTypes,
    /// [`SpotSource::list_difficulty_levels`].
    ListDifficultyLevels,
    /// [`SpotSource::list_surface_types`].
    ListSurfaceTypes,
    /// [`SpotSource::spot_detail`].
    SpotDetail,
}

/// Build a spot at the origin with only a name set.
#[must_use]
pub fn spot(id: &str, name: &str) -> Spot {
    spot_at(id, name, 0.0, 0.0)
}

/// Build a spot at `(longitude, latitude)` with only a name set.
#[must_use]
pub fn spot_at(id: &str, name: &str, longitude: f64, latitude: f64) -> Spot {
    Spot::new(
        SpotId::new(id),
        name,
        Coord {
            x: longitude,
            y: latitude,
        },
        DateTime::<Utc>::default(),
    )
}

/// In-memory [`SpotSource`] with scriptable failures and latency.
///
/// Listings are returned in insertion order. Detail lookups prefer spots
/// registered with [`MemorySource::with_detail`] and fall back to the
/// listing, adding an empty obstacle list.
#[derive(Debug, Default)]
pub struct MemorySource {
    spots: RefCell<Vec<Spot>>,
    details: HashMap<SpotId, Spot>,
    taxonomies: Taxonomies,
    failures: RefCell<HashMap<SourceOperation, String>>,
    detail_delays: HashMap<SpotId, usize>,
    photo_base_url: String,
    calls: RefCell<Vec<SourceOperation>>,
}

impl MemorySource {
    /// Create a source listing `spots`.
    #[must_use]
    pub fn with_spots<I>(spots: I) -> Self
    where
        I: IntoIterator<Item = Spot>,
    {
        Self {
            spots: RefCell::new(spots.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Serve all three taxonomy lists.
    #[must_use]
    pub fn with_taxonomies(mut self, taxonomies: Taxonomies) -> Self {
        self.taxonomies = taxonomies;
        self
    }

    /// Serve `spot` from [`SpotSource::spot_detail`] under its own id.
    #[must_use]
    pub fn with_detail(mut self, spot: Spot) -> Self {
        self.details.insert(spot.id.clone(), spot);
        self
    }

    /// Fail `operation` with [`SourceError::Unavailable`] carrying `message`.
    #[must_use]
    pub fn with_failure(self, operation: SourceOperation, message: &str) -> Self {
        self.fail(operation, message);
        self
    }

    /// Delay the detail fetch of `id` by `polls` scheduler yields.
    #[must_use]
    pub fn with_detail_delay(mut self, id: &str, polls: usize) -> Self {
        self.detail_delays.insert(SpotId::new(id), polls);
        self
    }

    /// Prefix photo storage paths with `base_url`.
    #[must_use]
    pub fn with_photo_base_url(mut self, base_url: &str) -> Self {
        self.photo_base_url = base_url.to_owned();
        self
    }

    /// Start failing `operation` from now on.
    pub fn fail(&self, operation: SourceOperation, message: &str) {
        self.failures
            .borrow_mut()
            .insert(operation, message.to_owned());
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: SourceOperation) {
        self.failures.borrow_mut().remove(&operation);
    }

    /// Replace the listed spots.
    pub fn replace_spots<I>(&self, spots: I)
    where
        I: IntoIterator<Item = Spot>,
    {
        *self.spots.borrow_mut() = spots.into_iter().collect();
    }

    /// Every operation invoked so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<SourceOperation> {
        self.calls.borrow().clone()
    }

    fn begin(&self, operation: SourceOperation) -> Result<(), SourceError> {
        self.calls.borrow_mut().push(operation);
        match self.failures.borrow().get(&operation) {
            Some(message) => Err(SourceError::unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn find_detail(&self, id: &SpotId) -> Option<Spot> {
        if let Some(detail) = self.details.get(id) {
            return Some(detail.clone());
        }
        let mut listed = self
            .spots
            .borrow()
            .iter()
            .find(|candidate| &candidate.id == id)
            .cloned()?;
        listed.obstacles.get_or_insert_with(Vec::new);
        Some(listed)
    }
}

#[async_trait(?Send)]
impl SpotSource for MemorySource {
    async fn list_spots(&self) -> Result<Vec<Spot>, SourceError> {
        self.begin(SourceOperation::ListSpots)?;
        Ok(self.spots.borrow().clone())
    }

    async fn list_spot_types(&self) -> Result<Vec<SpotType>, SourceError> {
        self.begin(SourceOperation::ListSpotTypes)?;
        Ok(self.taxonomies.spot_types.clone())
    }

    async fn list_difficulty_levels(&self) -> Result<Vec<DifficultyLevel>, SourceError> {
        self.begin(SourceOperation::ListDifficultyLevels)?;
        Ok(self.taxonomies.difficulty_levels.clone())
    }

    async fn list_surface_types(&self) -> Result<Vec<SurfaceType>, SourceError> {
        self.begin(SourceOperation::ListSurfaceTypes)?;
        Ok(self.taxonomies.surface_types.clone())
    }

    async fn spot_detail(&self, id: &SpotId) -> Result<Spot, SourceError> {
        let polls = self.detail_delays.get(id).copied().unwrap_or_default();
        Yield { remaining: polls }.await;
        self.begin(SourceOperation::SpotDetail)?;
        self.find_detail(id)
            .ok_or_else(|| SourceError::NotFound { id: id.clone() })
    }

    fn photo_url(&self, storage_path: &str) -> String {
        join_photo_url(&self.photo_base_url, storage_path)
    }
}

/// Returns `Pending` a fixed number of times, waking itself each time.
struct Yield {
    remaining: usize,
}

impl Future for Yield {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(feature = "store-sqlite")]
mod sqlite_fixture {
    use std::path::Path;

    use rusqlite::{Connection, params};

    use crate::{Spot, Taxonomies, Taxonomy, source::SCHEMA};

    /// Create a SQLite database at `path` holding `spots` and `taxonomies`.
    ///
    /// Photos are taken from each spot's `photos`; obstacles from
    /// `obstacles` when present.
    pub fn write_sqlite_database(
        path: &Path,
        spots: &[Spot],
        taxonomies: &Taxonomies,
    ) -> Result<(), rusqlite::Error> {
        let mut connection = Connection::open(path)?;
        connection.execute_batch(SCHEMA)?;
        let tx = connection.transaction()?;
        for taxonomy in Taxonomy::ALL {
            let table = match taxonomy {
                Taxonomy::SpotType => "spot_types",
                Taxonomy::Difficulty => "difficulty_levels",
                Taxonomy::Surface => "surface_types",
            };
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {table} (id, name, description) VALUES (?1, ?2, ?3)"
            ))?;
            for entry in taxonomies.entries(taxonomy) {
                insert.execute(params![entry.id, entry.name, entry.description])?;
            }
        }
        {
            let mut insert_spot = tx.prepare(
                "INSERT INTO spots (id, name, description, latitude, longitude, street, city, \
                 province, country, spot_type_id, difficulty_id, surface_type_id, is_public, \
                 has_security, has_water, tranquility, best_time, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                 ?16, ?17, ?18, ?19)",
            )?;
            let mut insert_photo = tx.prepare(
                "INSERT INTO photos (id, spot_id, storage_path, description, is_primary, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_obstacle = tx.prepare(
                "INSERT OR IGNORE INTO obstacles (id, name, description) VALUES (?1, ?2, ?3)",
            )?;
            let mut link_obstacle = tx.prepare(
                "INSERT INTO spot_obstacles (spot_id, obstacle_id, notes) VALUES (?1, ?2, ?3)",
            )?;
            for spot in spots {
                insert_spot.execute(params![
                    spot.id.as_str(),
                    spot.name,
                    spot.description,
                    spot.latitude(),
                    spot.longitude(),
                    spot.address.street,
                    spot.address.city,
                    spot.address.province,
                    spot.address.country,
                    spot.spot_type_id,
                    spot.difficulty_id,
                    spot.surface_type_id,
                    spot.is_public,
                    spot.has_security,
                    spot.has_water,
                    spot.tranquility.map(u8::from),
                    spot.best_time,
                    spot.created_at,
                    spot.updated_at,
                ])?;
                for photo in &spot.photos {
                    insert_photo.execute(params![
                        photo.id,
                        spot.id.as_str(),
                        photo.storage_path,
                        photo.description,
                        photo.is_primary,
                        photo.created_at,
                    ])?;
                }
                for entry in spot.obstacles.iter().flatten() {
                    insert_obstacle.execute(params![
                        entry.obstacle.id,
                        entry.obstacle.name,
                        entry.obstacle.description,
                    ])?;
                    link_obstacle.execute(params![
                        spot.id.as_str(),
                        entry.obstacle.id,
                        entry.notes
                    ])?;
                }
            }
        }
        tx.commit()
    }
}
