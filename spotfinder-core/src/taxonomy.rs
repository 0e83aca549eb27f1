//! Reference taxonomies used to categorise spots.
//!
//! The three lists share one row shape; the aliases keep call sites
//! readable.

/// A row of one of the reference taxonomies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxonomyEntry {
    /// Row identifier referenced by spots.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
}

impl TaxonomyEntry {
    /// Construct an entry without a description.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }
}

/// Kind of spot (park, plaza, street...).
pub type SpotType = TaxonomyEntry;
/// How demanding a spot is.
pub type DifficultyLevel = TaxonomyEntry;
/// Ground material of a spot.
pub type SurfaceType = TaxonomyEntry;

/// Identifies one of the three taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    /// [`SpotType`] rows.
    SpotType,
    /// [`DifficultyLevel`] rows.
    Difficulty,
    /// [`SurfaceType`] rows.
    Surface,
}

impl Taxonomy {
    /// Every taxonomy in load order.
    pub const ALL: [Self; 3] = [Self::SpotType, Self::Difficulty, Self::Surface];

    /// Lowercase, human-readable name used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpotType => "spot types",
            Self::Difficulty => "difficulty levels",
            Self::Surface => "surface types",
        }
    }
}

impl std::fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three reference lists, each ordered by name.
///
/// # Examples
/// ```
/// use spotfinder_core::{Taxonomies, Taxonomy, TaxonomyEntry};
///
/// let mut taxonomies = Taxonomies::default();
/// taxonomies.replace(Taxonomy::Surface, vec![TaxonomyEntry::new(3, "Concrete")]);
/// assert_eq!(taxonomies.surface_type(3).map(|s| s.name.as_str()), Some("Concrete"));
/// assert!(taxonomies.spot_type(3).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Taxonomies {
    /// Spot types.
    pub spot_types: Vec<SpotType>,
    /// Difficulty levels.
    pub difficulty_levels: Vec<DifficultyLevel>,
    /// Surface types.
    pub surface_types: Vec<SurfaceType>,
}

impl Taxonomies {
    /// Borrow the rows of one taxonomy.
    #[must_use]
    pub fn entries(&self, taxonomy: Taxonomy) -> &[TaxonomyEntry] {
        match taxonomy {
            Taxonomy::SpotType => &self.spot_types,
            Taxonomy::Difficulty => &self.difficulty_levels,
            Taxonomy::Surface => &self.surface_types,
        }
    }

    /// Replace the rows of one taxonomy wholesale.
    pub fn replace(&mut self, taxonomy: Taxonomy, entries: Vec<TaxonomyEntry>) {
        match taxonomy {
            Taxonomy::SpotType => self.spot_types = entries,
            Taxonomy::Difficulty => self.difficulty_levels = entries,
            Taxonomy::Surface => self.surface_types = entries,
        }
    }

    /// Find a row by id within one taxonomy.
    #[must_use]
    pub fn find(&self, taxonomy: Taxonomy, id: i64) -> Option<&TaxonomyEntry> {
        self.entries(taxonomy).iter().find(|entry| entry.id == id)
    }

    /// Find a spot type by id.
    #[must_use]
    pub fn spot_type(&self, id: i64) -> Option<&SpotType> {
        self.find(Taxonomy::SpotType, id)
    }

    /// Find a difficulty level by id.
    #[must_use]
    pub fn difficulty_level(&self, id: i64) -> Option<&DifficultyLevel> {
        self.find(Taxonomy::Difficulty, id)
    }

    /// Find a surface type by id.
    #[must_use]
    pub fn surface_type(&self, id: i64) -> Option<&SurfaceType> {
        self.find(Taxonomy::Surface, id)
    }
}
