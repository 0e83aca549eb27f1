//! Photo gallery derived from a spot's photos.
//!
//! The hero image is the primary photo; every other photo belongs to the
//! gallery strip. Storage paths become URLs only when the gallery is
//! resolved against a [`SpotSource`].

use crate::{Photo, Spot, SpotSource};

/// Cover image of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hero<'a> {
    /// The spot's primary photo.
    Photo(&'a Photo),
    /// No primary photo; carries the spot name as alternative text.
    Placeholder(&'a str),
}

/// Hero image plus the remaining photos of one spot.
///
/// # Examples
/// ```
/// use chrono::{DateTime, Utc};
/// use geo::Coord;
/// use spotfinder_core::{Hero, Spot, SpotId};
///
/// let spot = Spot::new(SpotId::new("a"), "Bare Spot", Coord { x: 0.0, y: 0.0 }, DateTime::<Utc>::default());
/// let gallery = spot.gallery();
/// assert_eq!(gallery.hero, Hero::Placeholder("Bare Spot"));
/// assert!(gallery.photos.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery<'a> {
    /// Cover image.
    pub hero: Hero<'a>,
    /// Non-primary photos in stored order.
    pub photos: Vec<&'a Photo>,
}

/// A hero image after URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeroImage {
    /// Public URL of the primary photo.
    Url(String),
    /// Placeholder with the spot name as alternative text.
    Placeholder(String),
}

/// A [`Gallery`] with every storage path turned into a public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGallery {
    /// Cover image.
    pub hero: HeroImage,
    /// URLs of the non-primary photos; empty URLs are dropped.
    pub photo_urls: Vec<String>,
}

impl Spot {
    /// Split the spot's photos into hero and gallery strip.
    #[must_use]
    pub fn gallery(&self) -> Gallery<'_> {
        let hero = self
            .primary_photo()
            .map_or(Hero::Placeholder(self.name.as_str()), Hero::Photo);
        let photos = self.photos.iter().filter(|photo| !photo.is_primary).collect();
        Gallery { hero, photos }
    }
}

impl Gallery<'_> {
    /// Turn storage paths into URLs through `source`.
    ///
    /// A hero whose URL comes back empty falls back to the placeholder.
    #[must_use]
    pub fn resolve<S>(&self, source: &S, spot_name: &str) -> ResolvedGallery
    where
        S: SpotSource + ?Sized,
    {
        let hero = match self.hero {
            Hero::Photo(photo) => {
                let url = source.photo_url(&photo.storage_path);
                if url.is_empty() {
                    HeroImage::Placeholder(spot_name.to_owned())
                } else {
                    HeroImage::Url(url)
                }
            }
            Hero::Placeholder(name) => HeroImage::Placeholder(name.to_owned()),
        };
        let photo_urls = self
            .photos
            .iter()
            .map(|photo| source.photo_url(&photo.storage_path))
            .filter(|url| !url.is_empty())
            .collect();
        ResolvedGallery { hero, photo_urls }
    }
}
