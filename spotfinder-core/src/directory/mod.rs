//! The spot directory: canonical dataset, filtered view, view mode and
//! selection, coordinated over a [`SpotSource`].
//!
//! All operations take `&self`. State lives behind a `RefCell` that is never
//! borrowed across an await point, so several operations may be in flight
//! on one thread at once. When two selections overlap, whichever fetch
//! completes last owns the selection.

use std::{cell::RefCell, fmt, rc::Rc};

use geo::Rect;
use log::{debug, error};

use crate::{
    DifficultyLevel, FilterChange, Filters, ResolvedGallery, SourceError, Spot, SpotId,
    SpotSource, SpotType, SurfaceType, Taxonomies, Taxonomy, TaxonomyEntry, ViewMode, bounds_of,
};

mod events;

pub use events::{DirectoryEvent, SubscriptionId};
use events::Observers;

#[derive(Debug, Default)]
struct DirectoryState {
    spots: Rc<[Spot]>,
    filtered: Rc<[Spot]>,
    taxonomies: Taxonomies,
    filters: Filters,
    loading: bool,
    error: Option<String>,
    view_mode: ViewMode,
    selected: Option<Rc<Spot>>,
}

/// Client-side state of the spot finder.
///
/// # Examples
/// ```
/// use spotfinder_core::{FilterChange, SpotDirectory, ViewMode, test_support::{MemorySource, spot}};
///
/// let source = MemorySource::with_spots([spot("a", "Riverside Park"), spot("b", "Downtown Plaza")]);
/// let directory = SpotDirectory::new(source);
/// # let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
/// # runtime.block_on(async {
/// directory.initialise().await;
/// # });
///
/// directory.set_filter(FilterChange::SearchTerm(Some("plaza".into())));
/// assert_eq!(directory.filtered_spots().len(), 2);
/// directory.apply_filters();
/// assert_eq!(directory.filtered_spots().len(), 1);
/// assert_eq!(directory.view_mode(), ViewMode::Map);
/// ```
pub struct SpotDirectory<S> {
    source: S,
    state: RefCell<DirectoryState>,
    observers: Observers,
}

impl<S> fmt::Debug for SpotDirectory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SpotDirectory")
            .field("spots", &state.spots.len())
            .field("filtered", &state.filtered.len())
            .field("loading", &state.loading)
            .field("view_mode", &state.view_mode)
            .field("selected", &state.selected.as_ref().map(|spot| &spot.id))
            .finish_non_exhaustive()
    }
}

impl<S> SpotDirectory<S> {
    /// Create an empty directory in map mode over `source`.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RefCell::new(DirectoryState::default()),
            observers: Observers::default(),
        }
    }

    /// The data source this directory reads from.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Canonical dataset as last loaded.
    #[must_use]
    pub fn spots(&self) -> Rc<[Spot]> {
        Rc::clone(&self.state.borrow().spots)
    }

    /// Spots passing the filters as of the last recomputation.
    #[must_use]
    pub fn filtered_spots(&self) -> Rc<[Spot]> {
        Rc::clone(&self.state.borrow().filtered)
    }

    /// All three taxonomy lists.
    #[must_use]
    pub fn taxonomies(&self) -> Taxonomies {
        self.state.borrow().taxonomies.clone()
    }

    /// Spot types as last loaded.
    #[must_use]
    pub fn spot_types(&self) -> Vec<SpotType> {
        self.taxonomy(Taxonomy::SpotType)
    }

    /// Difficulty levels as last loaded.
    #[must_use]
    pub fn difficulty_levels(&self) -> Vec<DifficultyLevel> {
        self.taxonomy(Taxonomy::Difficulty)
    }

    /// Surface types as last loaded.
    #[must_use]
    pub fn surface_types(&self) -> Vec<SurfaceType> {
        self.taxonomy(Taxonomy::Surface)
    }

    fn taxonomy(&self, taxonomy: Taxonomy) -> Vec<TaxonomyEntry> {
        self.state.borrow().taxonomies.entries(taxonomy).to_vec()
    }

    /// Current filter criteria, which may not yet be applied.
    #[must_use]
    pub fn filters(&self) -> Filters {
        self.state.borrow().filters.clone()
    }

    /// Whether a dataset or detail fetch is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Message of the most recent failure, if not since cleared.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Active view mode.
    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        self.state.borrow().view_mode
    }

    /// The fully hydrated selected spot.
    #[must_use]
    pub fn selected_spot(&self) -> Option<Rc<Spot>> {
        self.state.borrow().selected.clone()
    }

    /// Rectangle covering the filtered spots, for fitting the map.
    #[must_use]
    pub fn filtered_bounds(&self) -> Option<Rect<f64>> {
        bounds_of(&self.state.borrow().filtered)
    }

    /// Register `callback` for every subsequent [`DirectoryEvent`].
    #[must_use]
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DirectoryEvent) + 'static,
    {
        self.observers.subscribe(Rc::new(callback))
    }

    /// Remove a subscription. Returns `false` when `id` was not registered.
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Overwrite one filter criterion. The filtered view is not recomputed.
    pub fn set_filter(&self, change: FilterChange) {
        self.state.borrow_mut().filters.set(change);
        self.notify(&DirectoryEvent::FiltersChanged);
    }

    /// Unset every criterion, then recompute the filtered view.
    pub fn reset_filters(&self) {
        self.state.borrow_mut().filters = Filters::default();
        self.notify(&DirectoryEvent::FiltersChanged);
        self.apply_filters();
    }

    /// Recompute the filtered view from the dataset and current criteria.
    pub fn apply_filters(&self) {
        let filtered: Rc<[Spot]> = {
            let state = self.state.borrow();
            if state.filters.is_active() {
                state.filters.apply(&state.spots).into()
            } else {
                Rc::clone(&state.spots)
            }
        };
        let count = filtered.len();
        debug!("filters applied: {count} spots visible");
        self.state.borrow_mut().filtered = filtered;
        self.notify(&DirectoryEvent::FilteredChanged { count });
    }

    /// Switch view mode. Any mode other than [`ViewMode::Detail`] clears
    /// the selection, even when the mode is unchanged.
    pub fn set_view_mode(&self, mode: ViewMode) {
        let clears_selection = mode != ViewMode::Detail;
        {
            let mut state = self.state.borrow_mut();
            state.view_mode = mode;
            if clears_selection {
                state.selected = None;
            }
        }
        self.notify(&DirectoryEvent::ViewModeChanged(mode));
        if clears_selection {
            self.notify(&DirectoryEvent::SelectionChanged(None));
        }
    }

    /// Drop the selection without touching the view mode.
    pub fn clear_selection(&self) {
        self.state.borrow_mut().selected = None;
        self.notify(&DirectoryEvent::SelectionChanged(None));
    }

    fn set_loading(&self, loading: bool) {
        self.state.borrow_mut().loading = loading;
        self.notify(&DirectoryEvent::LoadingChanged(loading));
    }

    fn set_error(&self, message: Option<String>) {
        self.state.borrow_mut().error.clone_from(&message);
        self.notify(&DirectoryEvent::ErrorChanged(message));
    }

    fn record_failure(&self, context: &str, err: &SourceError) {
        error!("{context}: {err}");
        self.set_error(Some(err.to_string()));
    }

    fn notify(&self, event: &DirectoryEvent) {
        self.observers.notify(event);
    }
}

impl<S> SpotDirectory<S>
where
    S: SpotSource,
{
    /// Fetch every spot and make it both the dataset and the filtered view.
    ///
    /// Filters are not re-applied. On failure the error message is stored
    /// and the previous dataset is kept.
    pub async fn load_dataset(&self) {
        self.set_loading(true);
        self.set_error(None);
        match self.source.list_spots().await {
            Ok(fetched) => {
                let count = fetched.len();
                debug!("loaded {count} spots");
                let spots: Rc<[Spot]> = fetched.into();
                {
                    let mut state = self.state.borrow_mut();
                    state.filtered = Rc::clone(&spots);
                    state.spots = spots;
                }
                self.notify(&DirectoryEvent::DatasetReplaced { count });
                self.notify(&DirectoryEvent::FilteredChanged { count });
                self.set_loading(false);
            }
            Err(err) => {
                self.record_failure("failed to load spots", &err);
                self.set_loading(false);
            }
        }
    }

    /// Fetch spot types, difficulty levels and surface types in that order.
    ///
    /// Each list is stored as it arrives. The first failure stores its
    /// message and stops the chain; lists already stored are kept. Neither
    /// the loading flag nor an existing error is touched on success.
    pub async fn load_taxonomies(&self) {
        for taxonomy in Taxonomy::ALL {
            let fetched = match taxonomy {
                Taxonomy::SpotType => self.source.list_spot_types().await,
                Taxonomy::Difficulty => self.source.list_difficulty_levels().await,
                Taxonomy::Surface => self.source.list_surface_types().await,
            };
            match fetched {
                Ok(entries) => {
                    debug!("loaded {} {taxonomy}", entries.len());
                    self.state
                        .borrow_mut()
                        .taxonomies
                        .replace(taxonomy, entries);
                    self.notify(&DirectoryEvent::TaxonomyReplaced(taxonomy));
                }
                Err(err) => {
                    self.record_failure(&format!("failed to load {taxonomy}"), &err);
                    return;
                }
            }
        }
    }

    /// Select a spot by id, fetching its full detail first.
    ///
    /// `None` or an empty id clears the selection without touching the view
    /// mode. On success the view switches to [`ViewMode::Detail`]; on
    /// failure the error is stored and selection and view mode are kept.
    ///
    /// A successful fetch stores the spot, the detail view mode and the
    /// cleared loading flag in one write before any observer runs.
    pub async fn select_spot(&self, id: Option<SpotId>) {
        let Some(requested) = id.filter(|candidate| !candidate.is_empty()) else {
            self.clear_selection();
            return;
        };
        self.set_loading(true);
        self.set_error(None);
        match self.source.spot_detail(&requested).await {
            Ok(spot) => {
                debug!("selected spot {}", spot.id);
                let selected_id = spot.id.clone();
                {
                    let mut state = self.state.borrow_mut();
                    state.selected = Some(Rc::new(spot));
                    state.view_mode = ViewMode::Detail;
                    state.loading = false;
                }
                self.notify(&DirectoryEvent::SelectionChanged(Some(selected_id)));
                self.notify(&DirectoryEvent::ViewModeChanged(ViewMode::Detail));
                self.notify(&DirectoryEvent::LoadingChanged(false));
            }
            Err(err) => {
                self.record_failure(&format!("failed to load spot {requested}"), &err);
                self.set_loading(false);
            }
        }
    }

    /// Startup sequence: load the dataset, then the taxonomies, then apply
    /// the current filters.
    pub async fn initialise(&self) {
        self.load_dataset().await;
        self.load_taxonomies().await;
        self.apply_filters();
    }

    /// Gallery of the selected spot with photo URLs resolved.
    #[must_use]
    pub fn selected_gallery(&self) -> Option<ResolvedGallery> {
        let spot = self.selected_spot()?;
        Some(spot.gallery().resolve(&self.source, &spot.name))
    }
}

#[cfg(test)]
mod tests;
