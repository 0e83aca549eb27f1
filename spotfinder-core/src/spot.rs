//! Spots and the records embedded in them.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, matching
//! the convention used for every [`geo::Coord`] in this crate.

use std::fmt;

use chrono::{DateTime, Utc};
use geo::{Coord, Rect};
use thiserror::Error;

use crate::taxonomy::{DifficultyLevel, SpotType, SurfaceType};

/// Opaque identity of a [`Spot`].
///
/// # Examples
/// ```
/// use spotfinder_core::SpotId;
///
/// let id = SpotId::new("riverside");
/// assert_eq!(id.as_str(), "riverside");
/// assert_eq!(id.to_string(), "riverside");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SpotId(String);

impl SpotId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SpotId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Postal address of a spot. Every part is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Street and number.
    pub street: Option<String>,
    /// City or town.
    pub city: Option<String>,
    /// Province, state or region.
    pub province: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

impl Address {
    /// Join the non-empty parts with `", "`, or `None` when every part is
    /// missing.
    ///
    /// # Examples
    /// ```
    /// use spotfinder_core::Address;
    ///
    /// let address = Address {
    ///     street: Some("1 Quay Street".into()),
    ///     city: None,
    ///     province: Some(String::new()),
    ///     country: Some("Spain".into()),
    /// };
    /// assert_eq!(address.line().as_deref(), Some("1 Quay Street, Spain"));
    /// assert_eq!(Address::default().line(), None);
    /// ```
    #[must_use]
    pub fn line(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.street, &self.city, &self.province, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Upper bound of the tranquility scale.
pub const MAX_TRANQUILITY: u8 = 10;

/// How quiet a spot usually is, from 0 (busy) to [`MAX_TRANQUILITY`].
///
/// # Examples
/// ```
/// use spotfinder_core::Tranquility;
///
/// # fn main() -> Result<(), spotfinder_core::TranquilityError> {
/// let calm = Tranquility::new(8)?;
/// assert_eq!(calm.get(), 8);
/// assert!(Tranquility::new(11).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Tranquility(u8);

/// Errors returned by [`Tranquility::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranquilityError {
    /// The score exceeded [`MAX_TRANQUILITY`].
    #[error("tranquility must be between 0 and {MAX_TRANQUILITY}, got {0}")]
    OutOfRange(i64),
}

impl Tranquility {
    /// Validate and wrap a tranquility score.
    pub fn new(score: u8) -> Result<Self, TranquilityError> {
        if score > MAX_TRANQUILITY {
            return Err(TranquilityError::OutOfRange(i64::from(score)));
        }
        Ok(Self(score))
    }

    /// The raw score.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Tranquility {
    type Error = TranquilityError;

    fn try_from(score: u8) -> Result<Self, Self::Error> {
        Self::new(score)
    }
}

impl TryFrom<i64> for Tranquility {
    type Error = TranquilityError;

    fn try_from(score: i64) -> Result<Self, Self::Error> {
        u8::try_from(score)
            .map_err(|_| TranquilityError::OutOfRange(score))
            .and_then(Self::new)
    }
}

impl From<Tranquility> for u8 {
    fn from(value: Tranquility) -> Self {
        value.0
    }
}

/// A stored photo of a spot.
///
/// `storage_path` is an opaque locator; turn it into a URL with
/// [`SpotSource::photo_url`](crate::SpotSource::photo_url).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Photo {
    /// Photo identifier.
    pub id: String,
    /// Spot the photo belongs to.
    pub spot_id: SpotId,
    /// Locator inside the photo storage bucket.
    pub storage_path: String,
    /// Optional caption.
    pub description: Option<String>,
    /// Whether this is the spot's cover photo. At most one per spot.
    pub is_primary: bool,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// A kind of feature a spot may offer (rails, ledges, bowls...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    /// Obstacle identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
}

/// An [`Obstacle`] as found at one particular spot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpotObstacle {
    /// The obstacle itself.
    pub obstacle: Obstacle,
    /// Free-text note about this obstacle at this spot.
    pub notes: Option<String>,
}

/// Facilities advertised by a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amenity {
    /// Drinking water is available.
    Water,
    /// Security staff are present.
    Security,
    /// The spot is publicly accessible.
    PublicAccess,
}

impl Amenity {
    /// Human-readable badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Water => "Water Available",
            Self::Security => "Security Present",
            Self::PublicAccess => "Public Access",
        }
    }
}

/// A geolocated point of interest.
///
/// Spots from a listing embed their taxonomy rows and photos; spots fetched
/// through [`SpotSource::spot_detail`](crate::SpotSource::spot_detail) also
/// carry their obstacles.
///
/// # Examples
/// ```
/// use chrono::{DateTime, Utc};
/// use geo::Coord;
/// use spotfinder_core::{Spot, SpotId};
///
/// let spot = Spot::new(
///     SpotId::new("a"),
///     "Riverside Park",
///     Coord { x: -3.7, y: 40.4 },
///     DateTime::<Utc>::default(),
/// );
/// assert_eq!(spot.latitude(), 40.4);
/// assert_eq!(spot.longitude(), -3.7);
/// assert!(spot.obstacles.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spot {
    /// Unique identifier.
    pub id: SpotId,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// Postal address parts.
    pub address: Address,
    /// Reference to the spot's [`SpotType`].
    pub spot_type_id: Option<i64>,
    /// Reference to the spot's [`DifficultyLevel`].
    pub difficulty_id: Option<i64>,
    /// Reference to the spot's [`SurfaceType`].
    pub surface_type_id: Option<i64>,
    /// Embedded spot type row, when joined.
    pub spot_type: Option<SpotType>,
    /// Embedded difficulty row, when joined.
    pub difficulty_level: Option<DifficultyLevel>,
    /// Embedded surface row, when joined.
    pub surface_type: Option<SurfaceType>,
    /// Public access, if known.
    pub is_public: Option<bool>,
    /// Security presence, if known.
    pub has_security: Option<bool>,
    /// Water availability, if known.
    pub has_water: Option<bool>,
    /// How quiet the spot usually is.
    pub tranquility: Option<Tranquility>,
    /// Free-text advice on when to visit.
    pub best_time: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Photos of the spot.
    pub photos: Vec<Photo>,
    /// Obstacles with per-spot notes. `None` unless fetched in detail.
    pub obstacles: Option<Vec<SpotObstacle>>,
}

impl Spot {
    /// Construct a spot with only the required fields set.
    #[must_use]
    pub fn new(
        id: SpotId,
        name: impl Into<String>,
        location: Coord<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            location,
            address: Address::default(),
            spot_type_id: None,
            difficulty_id: None,
            surface_type_id: None,
            spot_type: None,
            difficulty_level: None,
            surface_type: None,
            is_public: None,
            has_security: None,
            has_water: None,
            tranquility: None,
            best_time: None,
            created_at,
            updated_at: None,
            photos: Vec::new(),
            obstacles: None,
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }

    /// The address as a single line; see [`Address::line`].
    #[must_use]
    pub fn address_line(&self) -> Option<String> {
        self.address.line()
    }

    /// The spot's cover photo, if one is marked primary.
    #[must_use]
    pub fn primary_photo(&self) -> Option<&Photo> {
        self.photos.iter().find(|photo| photo.is_primary)
    }

    /// Amenities whose attribute is exactly `true`, in badge order.
    ///
    /// # Examples
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use geo::Coord;
    /// use spotfinder_core::{Amenity, Spot, SpotId};
    ///
    /// let mut spot = Spot::new(SpotId::new("a"), "A", Coord { x: 0.0, y: 0.0 }, DateTime::<Utc>::default());
    /// spot.has_water = Some(true);
    /// spot.has_security = Some(false);
    /// assert_eq!(spot.amenities(), vec![Amenity::Water]);
    /// ```
    #[must_use]
    pub fn amenities(&self) -> Vec<Amenity> {
        [
            (self.has_water, Amenity::Water),
            (self.has_security, Amenity::Security),
            (self.is_public, Amenity::PublicAccess),
        ]
        .into_iter()
        .filter_map(|(flag, amenity)| (flag == Some(true)).then_some(amenity))
        .collect()
    }
}

/// Bounding rectangle covering every spot, or `None` for an empty slice.
///
/// Spots with non-finite coordinates are skipped.
#[must_use]
pub fn bounds_of(spots: &[Spot]) -> Option<Rect<f64>> {
    spots
        .iter()
        .map(|spot| spot.location)
        .filter(|coord| coord.x.is_finite() && coord.y.is_finite())
        .fold(None, |bounds, coord| match bounds {
            None => Some(Rect::new(coord, coord)),
            Some(rect) => {
                let min = rect.min();
                let max = rect.max();
                Some(Rect::new(
                    Coord {
                        x: min.x.min(coord.x),
                        y: min.y.min(coord.y),
                    },
                    Coord {
                        x: max.x.max(coord.x),
                        y: max.y.max(coord.y),
                    },
                ))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn spot_at(id: &str, x: f64, y: f64) -> Spot {
        Spot::new(SpotId::new(id), id, Coord { x, y }, DateTime::<Utc>::default())
    }

    fn photo(id: &str, primary: bool) -> Photo {
        Photo {
            id: id.into(),
            spot_id: SpotId::new("a"),
            storage_path: format!("a/{id}.jpg"),
            description: None,
            is_primary: primary,
            created_at: DateTime::<Utc>::default(),
        }
    }

    #[fixture]
    fn spot() -> Spot {
        spot_at("a", 0.0, 0.0)
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_TRANQUILITY)]
    fn tranquility_accepts_bounds(#[case] score: u8) {
        assert_eq!(Tranquility::new(score).map(Tranquility::get), Ok(score));
    }

    #[rstest]
    #[case(-1)]
    #[case(11)]
    #[case(300)]
    fn tranquility_rejects_out_of_range(#[case] score: i64) {
        assert_eq!(
            Tranquility::try_from(score),
            Err(TranquilityError::OutOfRange(score))
        );
    }

    #[rstest]
    fn primary_photo_is_found_among_others(mut spot: Spot) {
        spot.photos = vec![photo("1", false), photo("2", true)];
        assert_eq!(spot.primary_photo().map(|p| p.id.as_str()), Some("2"));
    }

    #[rstest]
    fn primary_photo_absent_without_flag(mut spot: Spot) {
        spot.photos = vec![photo("1", false)];
        assert!(spot.primary_photo().is_none());
    }

    #[rstest]
    fn address_line_joins_all_parts(mut spot: Spot) {
        spot.address = Address {
            street: Some("Calle Mayor 1".into()),
            city: Some("Madrid".into()),
            province: Some("Madrid".into()),
            country: Some("Spain".into()),
        };
        assert_eq!(
            spot.address_line().as_deref(),
            Some("Calle Mayor 1, Madrid, Madrid, Spain")
        );
    }

    #[rstest]
    fn amenities_ignore_unknown_attributes(mut spot: Spot) {
        spot.is_public = Some(true);
        spot.has_water = None;
        assert_eq!(spot.amenities(), vec![Amenity::PublicAccess]);
        assert_eq!(Amenity::PublicAccess.label(), "Public Access");
    }

    #[rstest]
    fn bounds_cover_every_spot() {
        let spots = vec![
            spot_at("a", -1.0, 2.0),
            spot_at("b", 3.0, -4.0),
            spot_at("c", 0.5, 0.5),
        ];
        let bounds = bounds_of(&spots).expect("non-empty input has bounds");
        assert_eq!(bounds.min(), Coord { x: -1.0, y: -4.0 });
        assert_eq!(bounds.max(), Coord { x: 3.0, y: 2.0 });
    }

    #[rstest]
    fn bounds_of_single_spot_is_degenerate() {
        let bounds = bounds_of(&[spot_at("a", 1.0, 1.0)]).expect("bounds");
        assert_eq!(bounds.min(), bounds.max());
    }

    #[rstest]
    fn bounds_skip_non_finite_coordinates() {
        let spots = vec![spot_at("a", f64::NAN, 0.0), spot_at("b", 1.0, 1.0)];
        let bounds = bounds_of(&spots).expect("finite spot has bounds");
        assert_eq!(bounds.min(), Coord { x: 1.0, y: 1.0 });
        assert!(bounds_of(&[]).is_none());
    }
}
