//! Unit tests for the spot directory.

use std::{cell::RefCell, rc::Rc};

use geo::Coord;
use rstest::{fixture, rstest};

use super::*;
use crate::{
    HeroImage, Obstacle, Photo, SpotObstacle,
    test_support::{MemorySource, SourceOperation, spot, spot_at},
};

fn riverside() -> Spot {
    let mut spot = spot_at("a", "Riverside Park", -3.70, 40.41);
    spot.description = Some("Smooth ledges under the bridge".into());
    spot.spot_type_id = Some(1);
    spot.has_security = Some(true);
    spot.has_water = Some(true);
    spot
}

fn plaza() -> Spot {
    let mut spot = spot_at("b", "Downtown Plaza", -3.69, 40.42);
    spot.has_security = Some(false);
    spot
}

fn taxonomies() -> Taxonomies {
    Taxonomies {
        spot_types: vec![TaxonomyEntry::new(1, "Park"), TaxonomyEntry::new(2, "Plaza")],
        difficulty_levels: vec![TaxonomyEntry::new(1, "Beginner")],
        surface_types: vec![TaxonomyEntry::new(1, "Concrete")],
    }
}

fn detailed_riverside() -> Spot {
    let mut detail = riverside();
    detail.obstacles = Some(vec![SpotObstacle {
        obstacle: Obstacle {
            id: 1,
            name: "Ledge".into(),
            description: None,
        },
        notes: Some("waxed".into()),
    }]);
    detail.photos = vec![Photo {
        id: "p1".into(),
        spot_id: detail.id.clone(),
        storage_path: "a/p1.jpg".into(),
        description: None,
        is_primary: true,
        created_at: detail.created_at,
    }];
    detail
}

#[fixture]
fn source() -> MemorySource {
    MemorySource::with_spots([riverside(), plaza()])
        .with_taxonomies(taxonomies())
        .with_detail(detailed_riverside())
        .with_photo_base_url("https://cdn.test")
}

#[fixture]
fn directory(source: MemorySource) -> SpotDirectory<MemorySource> {
    SpotDirectory::new(source)
}

fn record_events(directory: &SpotDirectory<MemorySource>) -> Rc<RefCell<Vec<DirectoryEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _subscription = directory.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    seen
}

fn ids(spots: &[Spot]) -> Vec<&str> {
    spots.iter().map(|spot| spot.id.as_str()).collect()
}

#[rstest]
fn starts_empty_in_map_mode(directory: SpotDirectory<MemorySource>) {
    assert!(directory.spots().is_empty());
    assert!(directory.filtered_spots().is_empty());
    assert!(!directory.is_loading());
    assert!(directory.error().is_none());
    assert_eq!(directory.view_mode(), ViewMode::Map);
    assert!(directory.selected_spot().is_none());
    assert_eq!(directory.taxonomies(), Taxonomies::default());
}

#[rstest]
#[tokio::test]
async fn load_dataset_replaces_spots_and_filtered(directory: SpotDirectory<MemorySource>) {
    let events = record_events(&directory);
    directory.load_dataset().await;

    assert_eq!(ids(&directory.spots()), vec!["a", "b"]);
    assert_eq!(ids(&directory.filtered_spots()), vec!["a", "b"]);
    assert!(!directory.is_loading());
    assert!(directory.error().is_none());
    assert_eq!(
        *events.borrow(),
        vec![
            DirectoryEvent::LoadingChanged(true),
            DirectoryEvent::ErrorChanged(None),
            DirectoryEvent::DatasetReplaced { count: 2 },
            DirectoryEvent::FilteredChanged { count: 2 },
            DirectoryEvent::LoadingChanged(false),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn load_dataset_does_not_reapply_filters(directory: SpotDirectory<MemorySource>) {
    directory.set_filter(FilterChange::HasSecurity(true));
    directory.load_dataset().await;
    assert_eq!(directory.filtered_spots().len(), 2);
    directory.apply_filters();
    assert_eq!(ids(&directory.filtered_spots()), vec!["a"]);
}

#[rstest]
#[tokio::test]
async fn load_dataset_failure_keeps_previous_dataset(directory: SpotDirectory<MemorySource>) {
    directory.load_dataset().await;
    directory.source().fail(SourceOperation::ListSpots, "network down");
    directory.load_dataset().await;

    assert_eq!(directory.spots().len(), 2);
    assert_eq!(directory.filtered_spots().len(), 2);
    assert!(!directory.is_loading());
    assert_eq!(
        directory.error().as_deref(),
        Some("data source unavailable: network down")
    );
}

#[rstest]
#[tokio::test]
async fn load_dataset_clears_stale_error(directory: SpotDirectory<MemorySource>) {
    directory.source().fail(SourceOperation::ListSpots, "network down");
    directory.load_dataset().await;
    assert!(directory.error().is_some());

    directory.source().recover(SourceOperation::ListSpots);
    directory.load_dataset().await;
    assert!(directory.error().is_none());
    assert_eq!(directory.spots().len(), 2);
}

#[rstest]
#[tokio::test]
async fn reload_replaces_dataset_wholesale(directory: SpotDirectory<MemorySource>) {
    directory.load_dataset().await;
    directory.source().replace_spots([spot("c", "Canal Banks")]);
    directory.load_dataset().await;
    assert_eq!(ids(&directory.spots()), vec!["c"]);
    assert_eq!(ids(&directory.filtered_spots()), vec!["c"]);
}

#[rstest]
#[tokio::test]
async fn load_taxonomies_stores_all_lists(directory: SpotDirectory<MemorySource>) {
    let events = record_events(&directory);
    directory.load_taxonomies().await;

    assert_eq!(directory.taxonomies(), taxonomies());
    assert_eq!(directory.spot_types().len(), 2);
    assert_eq!(directory.difficulty_levels().len(), 1);
    assert_eq!(directory.surface_types().len(), 1);
    assert!(
        !events
            .borrow()
            .iter()
            .any(|event| matches!(event, DirectoryEvent::LoadingChanged(_))),
        "taxonomy loading must not touch the loading flag"
    );
}

#[rstest]
#[tokio::test]
async fn load_taxonomies_stops_at_first_failure(source: MemorySource) {
    let directory = SpotDirectory::new(
        source.with_failure(SourceOperation::ListDifficultyLevels, "timeout"),
    );
    directory.load_taxonomies().await;

    assert_eq!(directory.spot_types().len(), 2);
    assert!(directory.difficulty_levels().is_empty());
    assert!(directory.surface_types().is_empty());
    assert_eq!(
        directory.error().as_deref(),
        Some("data source unavailable: timeout")
    );
    assert_eq!(
        directory.source().calls(),
        vec![
            SourceOperation::ListSpotTypes,
            SourceOperation::ListDifficultyLevels
        ]
    );
    assert!(!directory.is_loading());
}

#[rstest]
#[tokio::test]
async fn load_taxonomies_keeps_existing_error(directory: SpotDirectory<MemorySource>) {
    directory.source().fail(SourceOperation::ListSpots, "network down");
    directory.load_dataset().await;
    directory.load_taxonomies().await;
    assert_eq!(directory.spot_types().len(), 2);
    assert_eq!(
        directory.error().as_deref(),
        Some("data source unavailable: network down")
    );
}

#[rstest]
#[tokio::test]
async fn set_filter_waits_for_apply(directory: SpotDirectory<MemorySource>) {
    directory.load_dataset().await;
    directory.set_filter(FilterChange::SearchTerm(Some("plaza".into())));
    assert_eq!(directory.filtered_spots().len(), 2);
    assert_eq!(
        directory.filters().search_term.as_deref(),
        Some("plaza")
    );

    directory.apply_filters();
    assert_eq!(ids(&directory.filtered_spots()), vec!["b"]);
    directory.apply_filters();
    assert_eq!(ids(&directory.filtered_spots()), vec!["b"]);
}

#[rstest]
#[tokio::test]
async fn reset_filters_restores_full_view(directory: SpotDirectory<MemorySource>) {
    directory.load_dataset().await;
    directory.set_filter(FilterChange::HasWater(true));
    directory.set_filter(FilterChange::SpotType(Some(1)));
    directory.apply_filters();
    assert_eq!(ids(&directory.filtered_spots()), vec!["a"]);

    directory.reset_filters();
    assert_eq!(directory.filters(), Filters::default());
    assert_eq!(ids(&directory.filtered_spots()), vec!["a", "b"]);
}

#[rstest]
#[tokio::test]
async fn select_spot_hydrates_and_switches_to_detail(directory: SpotDirectory<MemorySource>) {
    directory.load_dataset().await;
    directory.select_spot(Some(SpotId::new("a"))).await;

    let selected = directory.selected_spot().expect("selection stored");
    assert_eq!(selected.id.as_str(), "a");
    assert_eq!(selected.obstacles.as_ref().map(Vec::len), Some(1));
    assert_eq!(directory.view_mode(), ViewMode::Detail);
    assert!(!directory.is_loading());
    assert!(directory.error().is_none());
}

#[rstest]
#[tokio::test]
async fn select_spot_event_order(directory: SpotDirectory<MemorySource>) {
    let events = record_events(&directory);
    directory.select_spot(Some(SpotId::new("b"))).await;
    assert_eq!(
        *events.borrow(),
        vec![
            DirectoryEvent::LoadingChanged(true),
            DirectoryEvent::ErrorChanged(None),
            DirectoryEvent::SelectionChanged(Some(SpotId::new("b"))),
            DirectoryEvent::ViewModeChanged(ViewMode::Detail),
            DirectoryEvent::LoadingChanged(false),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn selection_is_visible_with_detail_view(directory: SpotDirectory<MemorySource>) {
    let shared = Rc::new(directory);
    let observed = Rc::new(RefCell::new(Vec::new()));
    let reader = Rc::downgrade(&shared);
    let sink = Rc::clone(&observed);
    let _subscription = shared.subscribe(move |event| {
        if matches!(event, DirectoryEvent::SelectionChanged(Some(_))) {
            if let Some(current) = reader.upgrade() {
                sink.borrow_mut().push((current.view_mode(), current.is_loading()));
            }
        }
    });
    shared.set_view_mode(ViewMode::List);
    shared.select_spot(Some(SpotId::new("b"))).await;
    assert_eq!(*observed.borrow(), vec![(ViewMode::Detail, false)]);
}

#[rstest]
fn detail_view_alone_selects_nothing(directory: SpotDirectory<MemorySource>) {
    directory.set_view_mode(ViewMode::Detail);

    assert!(directory.selected_spot().is_none());
    assert_eq!(directory.view_mode(), ViewMode::Detail);
    assert!(
        !directory
            .source()
            .calls()
            .contains(&SourceOperation::SpotDetail)
    );
}

#[rstest]
#[case(None)]
#[case(Some(SpotId::new("")))]
#[tokio::test]
async fn select_none_clears_without_changing_view(
    directory: SpotDirectory<MemorySource>,
    #[case] id: Option<SpotId>,
) {
    directory.select_spot(Some(SpotId::new("a"))).await;
    directory.set_view_mode(ViewMode::Detail);
    directory.select_spot(id).await;

    assert!(directory.selected_spot().is_none());
    assert_eq!(directory.view_mode(), ViewMode::Detail);
    assert!(!directory.is_loading());
    assert!(
        !directory
            .source()
            .calls()
            .iter()
            .skip(1)
            .any(|call| *call == SourceOperation::SpotDetail),
        "clearing must not fetch"
    );
}

#[rstest]
#[tokio::test]
async fn failed_selection_keeps_previous_state(directory: SpotDirectory<MemorySource>) {
    directory.select_spot(Some(SpotId::new("a"))).await;
    directory.select_spot(Some(SpotId::new("ghost"))).await;

    assert_eq!(
        directory.selected_spot().map(|spot| spot.id.clone()),
        Some(SpotId::new("a"))
    );
    assert_eq!(directory.view_mode(), ViewMode::Detail);
    assert_eq!(directory.error().as_deref(), Some("spot ghost not found"));
    assert!(!directory.is_loading());
}

#[rstest]
#[tokio::test]
async fn failed_first_selection_stays_in_list(directory: SpotDirectory<MemorySource>) {
    directory.set_view_mode(ViewMode::List);
    directory.select_spot(Some(SpotId::new("ghost"))).await;
    assert!(directory.selected_spot().is_none());
    assert_eq!(directory.view_mode(), ViewMode::List);
    assert!(directory.error().is_some());
}

#[rstest]
#[case(ViewMode::Map, false)]
#[case(ViewMode::List, false)]
#[case(ViewMode::Detail, true)]
#[tokio::test]
async fn view_mode_change_clears_selection_unless_detail(
    directory: SpotDirectory<MemorySource>,
    #[case] mode: ViewMode,
    #[case] keeps_selection: bool,
) {
    directory.select_spot(Some(SpotId::new("a"))).await;
    directory.set_view_mode(mode);
    assert_eq!(directory.view_mode(), mode);
    assert_eq!(directory.selected_spot().is_some(), keeps_selection);
}

#[rstest]
fn setting_current_mode_still_clears_selection(directory: SpotDirectory<MemorySource>) {
    directory.set_view_mode(ViewMode::List);
    let events = record_events(&directory);
    directory.set_view_mode(ViewMode::List);
    assert_eq!(
        *events.borrow(),
        vec![
            DirectoryEvent::ViewModeChanged(ViewMode::List),
            DirectoryEvent::SelectionChanged(None),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn overlapping_selections_last_completion_wins(source: MemorySource) {
    let directory = SpotDirectory::new(source.with_detail_delay("a", 3));
    tokio::join!(
        directory.select_spot(Some(SpotId::new("a"))),
        directory.select_spot(Some(SpotId::new("b"))),
    );
    assert_eq!(
        directory.selected_spot().map(|spot| spot.id.clone()),
        Some(SpotId::new("a"))
    );
    assert!(!directory.is_loading());
    assert_eq!(directory.view_mode(), ViewMode::Detail);
}

#[rstest]
#[tokio::test]
async fn initialise_runs_startup_sequence(source: MemorySource) {
    let directory = SpotDirectory::new(source);
    directory.set_filter(FilterChange::HasSecurity(true));
    directory.initialise().await;

    assert_eq!(
        directory.source().calls(),
        vec![
            SourceOperation::ListSpots,
            SourceOperation::ListSpotTypes,
            SourceOperation::ListDifficultyLevels,
            SourceOperation::ListSurfaceTypes,
        ]
    );
    assert_eq!(ids(&directory.filtered_spots()), vec!["a"]);
    assert_eq!(directory.spot_types().len(), 2);
}

#[rstest]
#[tokio::test]
async fn filtered_bounds_follow_filtered_view(directory: SpotDirectory<MemorySource>) {
    assert!(directory.filtered_bounds().is_none());
    directory.load_dataset().await;
    let bounds = directory.filtered_bounds().expect("bounds for two spots");
    assert_eq!(bounds.min(), Coord { x: -3.70, y: 40.41 });
    assert_eq!(bounds.max(), Coord { x: -3.69, y: 40.42 });

    directory.set_filter(FilterChange::SearchTerm(Some("riverside".into())));
    directory.apply_filters();
    let single = directory.filtered_bounds().expect("bounds for one spot");
    assert_eq!(single.min(), single.max());
}

#[rstest]
#[tokio::test]
async fn selected_gallery_resolves_urls(directory: SpotDirectory<MemorySource>) {
    assert!(directory.selected_gallery().is_none());
    directory.select_spot(Some(SpotId::new("a"))).await;
    let gallery = directory.selected_gallery().expect("gallery for selection");
    assert_eq!(
        gallery.hero,
        HeroImage::Url("https://cdn.test/a/p1.jpg".into())
    );
    assert!(gallery.photo_urls.is_empty());
}

#[rstest]
fn unsubscribed_observer_is_silent(directory: SpotDirectory<MemorySource>) {
    let seen = Rc::new(RefCell::new(0_usize));
    let sink = Rc::clone(&seen);
    let id = directory.subscribe(move |_| *sink.borrow_mut() += 1);
    directory.set_filter(FilterChange::IsPublic(true));
    assert!(directory.unsubscribe(id));
    directory.set_filter(FilterChange::IsPublic(false));
    assert_eq!(*seen.borrow(), 1);
}

#[rstest]
fn observers_can_read_state_during_notify(directory: SpotDirectory<MemorySource>) {
    let shared = Rc::new(directory);
    let observed = Rc::new(RefCell::new(None));
    let reader = Rc::downgrade(&shared);
    let sink = Rc::clone(&observed);
    let _subscription = shared.subscribe(move |event| {
        if matches!(event, DirectoryEvent::ViewModeChanged(_)) {
            if let Some(current) = reader.upgrade() {
                *sink.borrow_mut() = Some(current.view_mode());
            }
        }
    });
    shared.set_view_mode(ViewMode::List);
    assert_eq!(*observed.borrow(), Some(ViewMode::List));
}
