//! Facade crate for the spot finder.
//!
//! This crate re-exports the core domain types and directory state, and
//! exposes the SQLite-backed spot source behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use spotfinder_core::{
    Address, Amenity, DifficultyLevel, DirectoryEvent, FilterChange, Filters, Gallery, Hero,
    HeroImage, MAX_TRANQUILITY, Obstacle, Photo, ResolvedGallery, SourceError, Spot,
    SpotDirectory, SpotId, SpotObstacle, SpotSource, SpotType, SubscriptionId, SurfaceType,
    Taxonomies, Taxonomy, TaxonomyEntry, Tranquility, TranquilityError, ViewMode, bounds_of,
};

#[cfg(feature = "store-sqlite")]
pub use spotfinder_core::{
    DEFAULT_PHOTO_BASE_URL, SqliteSpotSource, SqliteSpotSourceConfig, SqliteSpotSourceError,
};

#[cfg(feature = "test-support")]
pub use spotfinder_core::test_support;
