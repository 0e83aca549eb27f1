//! Data-access port for spots and reference taxonomies.
//!
//! [`SpotSource`] is the only way the directory reaches its backing data.
//! Operations are asynchronous and run on the caller's thread, so the trait
//! does not require `Send` futures.

use async_trait::async_trait;
use thiserror::Error;

use crate::{DifficultyLevel, Spot, SpotId, SpotType, SurfaceType};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub(crate) use sqlite::SCHEMA;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{
    DEFAULT_PHOTO_BASE_URL, SqliteSpotSource, SqliteSpotSourceConfig, SqliteSpotSourceError,
};

/// Failure reported by a [`SpotSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// No spot exists with the requested identifier.
    #[error("spot {id} not found")]
    NotFound {
        /// Identifier that was requested.
        id: SpotId,
    },
    /// The backing store could not be reached.
    #[error("data source unavailable: {message}")]
    Unavailable {
        /// Human-readable cause.
        message: String,
    },
    /// A query against the backing store failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Short description of the failed operation, e.g. `"list spots"`.
        operation: &'static str,
        /// Underlying driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A stored row could not be turned into a domain value.
    #[error("invalid record for spot {id}: {reason}")]
    InvalidRecord {
        /// Identifier of the offending row.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl SourceError {
    /// Build a [`SourceError::Unavailable`] from any displayable cause.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Wrap a driver error raised while performing `operation`.
    #[must_use]
    pub fn query<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            operation,
            source: Box::new(source),
        }
    }
}

/// Asynchronous, read-only access to spots and taxonomies.
///
/// Listings are ordered by name. [`SpotSource::list_spots`] embeds each
/// spot's taxonomy rows and photos; [`SpotSource::spot_detail`] also fills
/// in obstacles.
///
/// # Examples
/// ```
/// use async_trait::async_trait;
/// use spotfinder_core::{SourceError, Spot, SpotId, SpotSource, TaxonomyEntry};
///
/// struct EmptySource;
///
/// #[async_trait(?Send)]
/// impl SpotSource for EmptySource {
///     async fn list_spots(&self) -> Result<Vec<Spot>, SourceError> {
///         Ok(Vec::new())
///     }
///     async fn list_spot_types(&self) -> Result<Vec<TaxonomyEntry>, SourceError> {
///         Ok(Vec::new())
///     }
///     async fn list_difficulty_levels(&self) -> Result<Vec<TaxonomyEntry>, SourceError> {
///         Ok(Vec::new())
///     }
///     async fn list_surface_types(&self) -> Result<Vec<TaxonomyEntry>, SourceError> {
///         Ok(Vec::new())
///     }
///     async fn spot_detail(&self, id: &SpotId) -> Result<Spot, SourceError> {
///         Err(SourceError::NotFound { id: id.clone() })
///     }
///     fn photo_url(&self, storage_path: &str) -> String {
///         storage_path.to_owned()
///     }
/// }
///
/// assert_eq!(EmptySource.photo_url("a/1.jpg"), "a/1.jpg");
/// ```
#[async_trait(?Send)]
pub trait SpotSource {
    /// Every spot, ordered by name, with embedded taxonomy rows and photos.
    async fn list_spots(&self) -> Result<Vec<Spot>, SourceError>;

    /// Spot types ordered by name.
    async fn list_spot_types(&self) -> Result<Vec<SpotType>, SourceError>;

    /// Difficulty levels ordered by name.
    async fn list_difficulty_levels(&self) -> Result<Vec<DifficultyLevel>, SourceError>;

    /// Surface types ordered by name.
    async fn list_surface_types(&self) -> Result<Vec<SurfaceType>, SourceError>;

    /// One spot with taxonomy rows, photos and obstacles.
    ///
    /// Returns [`SourceError::NotFound`] when `id` is unknown.
    async fn spot_detail(&self, id: &SpotId) -> Result<Spot, SourceError>;

    /// Public URL of a photo's storage path. Never fails; an empty string
    /// means the photo cannot be shown.
    fn photo_url(&self, storage_path: &str) -> String;
}

/// Join a public base URL and a storage path with a single `/`.
///
/// An empty storage path yields an empty string.
///
/// # Examples
/// ```
/// use spotfinder_core::source::join_photo_url;
///
/// assert_eq!(join_photo_url("https://cdn.test/photos/", "/a/1.jpg"), "https://cdn.test/photos/a/1.jpg");
/// assert_eq!(join_photo_url("", "a/1.jpg"), "a/1.jpg");
/// assert_eq!(join_photo_url("https://cdn.test", ""), "");
/// ```
#[must_use]
pub fn join_photo_url(base_url: &str, storage_path: &str) -> String {
    let path = storage_path.trim_start_matches('/');
    if path.is_empty() {
        return String::new();
    }
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        path.to_owned()
    } else {
        format!("{base}/{path}")
    }
}
