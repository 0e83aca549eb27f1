//! Core domain types and client-side state for the spot finder.
//!
//! The [`SpotDirectory`] owns the canonical spot dataset loaded through a
//! [`SpotSource`], derives the filtered view from the active [`Filters`],
//! and tracks the [`ViewMode`] and selected spot. Presentation layers read
//! its state through accessors and subscribe to [`DirectoryEvent`]s.

#![forbid(unsafe_code)]

mod directory;
mod filter;
mod gallery;
pub mod source;
mod spot;
mod taxonomy;
mod view;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use directory::{DirectoryEvent, SpotDirectory, SubscriptionId};
pub use filter::{FilterChange, Filters};
pub use gallery::{Gallery, Hero, HeroImage, ResolvedGallery};
pub use source::{SourceError, SpotSource};
pub use spot::{
    Address, Amenity, MAX_TRANQUILITY, Obstacle, Photo, Spot, SpotId, SpotObstacle, Tranquility,
    TranquilityError, bounds_of,
};
pub use taxonomy::{DifficultyLevel, SpotType, SurfaceType, Taxonomies, Taxonomy, TaxonomyEntry};
pub use view::ViewMode;

#[cfg(feature = "store-sqlite")]
pub use source::{
    DEFAULT_PHOTO_BASE_URL, SqliteSpotSource, SqliteSpotSourceConfig, SqliteSpotSourceError,
};
