//! Filter criteria narrowing the visible spot collection.
//!
//! Every criterion is either unset (no constraint) or set. A spot must
//! satisfy all set criteria to pass. Boolean requirements only ever demand
//! `true`; there is no "must be false" filter.

use crate::Spot;

/// User-editable criteria set.
///
/// # Examples
/// ```
/// use chrono::{DateTime, Utc};
/// use geo::Coord;
/// use spotfinder_core::{FilterChange, Filters, Spot, SpotId};
///
/// let mut spot = Spot::new(SpotId::new("b"), "Downtown Plaza", Coord { x: 0.0, y: 0.0 }, DateTime::<Utc>::default());
/// spot.has_security = Some(false);
///
/// let mut filters = Filters::default();
/// filters.set(FilterChange::SearchTerm(Some("PLAZA".into())));
/// assert!(filters.matches(&spot));
///
/// filters.set(FilterChange::HasSecurity(true));
/// assert!(!filters.matches(&spot));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filters {
    /// Required spot type id.
    pub spot_type_id: Option<i64>,
    /// Required difficulty id.
    pub difficulty_id: Option<i64>,
    /// Required surface type id.
    pub surface_type_id: Option<i64>,
    /// Require water to be available.
    pub has_water: bool,
    /// Require security to be present.
    pub has_security: bool,
    /// Require public access.
    pub is_public: bool,
    /// Case-insensitive text matched against name or description. Empty
    /// terms are ignored.
    pub search_term: Option<String>,
}

/// An edit of exactly one [`Filters`] field.
///
/// `None` or `false` unsets the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Set or clear the spot type criterion.
    SpotType(Option<i64>),
    /// Set or clear the difficulty criterion.
    Difficulty(Option<i64>),
    /// Set or clear the surface type criterion.
    SurfaceType(Option<i64>),
    /// Require water, or drop the requirement.
    HasWater(bool),
    /// Require security, or drop the requirement.
    HasSecurity(bool),
    /// Require public access, or drop the requirement.
    IsPublic(bool),
    /// Set or clear the search term.
    SearchTerm(Option<String>),
}

impl Filters {
    /// Overwrite the field named by `change`, leaving the others untouched.
    pub fn set(&mut self, change: FilterChange) {
        match change {
            FilterChange::SpotType(id) => self.spot_type_id = id,
            FilterChange::Difficulty(id) => self.difficulty_id = id,
            FilterChange::SurfaceType(id) => self.surface_type_id = id,
            FilterChange::HasWater(required) => self.has_water = required,
            FilterChange::HasSecurity(required) => self.has_security = required,
            FilterChange::IsPublic(required) => self.is_public = required,
            FilterChange::SearchTerm(term) => self.search_term = term,
        }
    }

    /// The search term, when set and non-empty.
    #[must_use]
    pub fn active_search_term(&self) -> Option<&str> {
        self.search_term.as_deref().filter(|term| !term.is_empty())
    }

    /// Whether any criterion is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.spot_type_id.is_some()
            || self.difficulty_id.is_some()
            || self.surface_type_id.is_some()
            || self.has_water
            || self.has_security
            || self.is_public
            || self.active_search_term().is_some()
    }

    /// Whether `spot` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, spot: &Spot) -> bool {
        self.matches_search(spot)
            && matches_reference(self.spot_type_id, spot.spot_type_id)
            && matches_reference(self.difficulty_id, spot.difficulty_id)
            && matches_reference(self.surface_type_id, spot.surface_type_id)
            && matches_requirement(self.has_water, spot.has_water)
            && matches_requirement(self.has_security, spot.has_security)
            && matches_requirement(self.is_public, spot.is_public)
    }

    /// Stable filter of `spots`; the result keeps source order.
    #[must_use]
    pub fn apply(&self, spots: &[Spot]) -> Vec<Spot> {
        spots
            .iter()
            .filter(|spot| self.matches(spot))
            .cloned()
            .collect()
    }

    fn matches_search(&self, spot: &Spot) -> bool {
        let Some(term) = self.active_search_term() else {
            return true;
        };
        let needle = term.to_lowercase();
        spot.name.to_lowercase().contains(&needle)
            || spot
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
    }
}

fn matches_reference(wanted: Option<i64>, actual: Option<i64>) -> bool {
    wanted.is_none_or(|id| actual == Some(id))
}

fn matches_requirement(required: bool, actual: Option<bool>) -> bool {
    !required || actual == Some(true)
}
