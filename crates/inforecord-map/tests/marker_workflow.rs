//! End-to-end tests for the weather map marker workflow.
//!
//! These drive `WeatherMapController` through the headless provider and
//! check what ends up on the map and in the pin store.

use inforecord_core::{AppError, Config, MapError};
use inforecord_map::{
    GeoPoint, InMemoryProvider, MapEvent, MemoryKeyValueStore, OverlaySource, PinDatabase,
    RetryPolicy, SessionState, WeatherMapController,
};

type Controller = WeatherMapController<InMemoryProvider, MemoryKeyValueStore>;

fn config() -> Config {
    let mut config = Config::default();
    config.map.center_lat = 37.30;
    config.map.center_lng = 126.84;
    config.map.click_epsilon_meters = 10.0;
    config
}

fn controller_with(provider: InMemoryProvider) -> Controller {
    WeatherMapController::new(provider, MemoryKeyValueStore::new(), &config()).unwrap()
}

fn ready_controller() -> Controller {
    let mut c = controller_with(InMemoryProvider::new());
    c.initialize_map().unwrap();
    c
}

fn click(c: &mut Controller, lat: f64, lng: f64) {
    c.handle(MapEvent::Click { lat, lng }).unwrap();
}

fn fill(c: &mut Controller, label: &str, keyword: &str) {
    c.handle(MapEvent::SetLabel(label.to_string())).unwrap();
    c.handle(MapEvent::SetKeyword(keyword.to_string())).unwrap();
}

fn commit(c: &mut Controller) {
    c.handle(MapEvent::Commit).unwrap();
}

fn draft_glyphs(c: &Controller) -> usize {
    c.surface()
        .provider()
        .glyphs()
        .filter(|(_, glyph)| glyph.icon.as_str() == "marker_draft")
        .count()
}

#[test]
fn at_most_one_draft_for_any_click_sequence() {
    let mut c = ready_controller();
    let clicks = [
        (37.30, 126.84),
        (37.31, 126.84),
        (37.31001, 126.84),
        (37.31001, 126.84),
        (37.32, 126.85),
        (37.33, 126.86),
        (37.3300001, 126.86),
    ];

    for (lat, lng) in clicks {
        click(&mut c, lat, lng);
        let glyphs = draft_glyphs(&c);
        assert!(glyphs <= 1, "{glyphs} draft glyphs after click at {lat},{lng}");
        assert_eq!(glyphs == 1, c.draft_position().is_some());
    }
}

#[test]
fn click_within_epsilon_toggles_draft_off() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    assert!(c.overlay().is_open());

    // ~5.5m away
    click(&mut c, 37.30005, 126.84);
    assert_eq!(c.session(), SessionState::Empty);
    assert!(!c.overlay().is_open());
    assert_eq!(draft_glyphs(&c), 0);
}

#[test]
fn click_beyond_epsilon_replaces_draft_and_drops_edits() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    fill(&mut c, "unsaved", "lost");

    click(&mut c, 37.31, 126.84);
    assert_eq!(c.draft_position(), Some(GeoPoint::new(37.31, 126.84).unwrap()));
    assert_eq!(c.overlay().fields().unwrap().label, "");

    c.handle(MapEvent::Commit).unwrap();
    assert!(c.store().iter().all(|m| m.label() != "unsaved"));
    assert!(c.store().iter().all(|m| m.keyword() != "lost"));
}

#[test]
fn commits_append_independent_pins() {
    let mut c = ready_controller();

    click(&mut c, 37.30, 126.84);
    fill(&mut c, "카페", "따뜻한");
    c.handle(MapEvent::Commit).unwrap();

    assert_eq!(c.store().len(), 1);
    assert_eq!(c.session(), SessionState::Empty);
    assert!(c.draft_position().is_none());
    let first = c.store().iter().next().unwrap().clone();
    assert_eq!(first.label(), "카페");
    assert_eq!(first.keyword(), "따뜻한");
    assert_eq!(first.position(), GeoPoint::new(37.30, 126.84).unwrap());

    click(&mut c, 37.35, 126.90);
    fill(&mut c, "공원", "");
    c.handle(MapEvent::Commit).unwrap();

    assert_eq!(c.store().len(), 2);
    let pins: Vec<_> = c.store().iter().collect();
    assert_eq!(pins[0], &first);
    assert_eq!(pins[1].label(), "공원");
    assert_ne!(pins[0].id(), pins[1].id());
}

#[test]
fn empty_fields_can_be_committed() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    c.handle(MapEvent::Commit).unwrap();
    let pin = c.store().iter().next().unwrap();
    assert_eq!(pin.label(), "");
    assert_eq!(pin.keyword(), "");
}

#[test]
fn one_glyph_and_listener_per_pin() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    c.handle(MapEvent::Commit).unwrap();
    click(&mut c, 37.40, 126.84);
    c.handle(MapEvent::Commit).unwrap();

    // Re-running initialization flushes nothing new.
    assert_eq!(c.initialize_map().unwrap(), 0);

    let provider = c.surface().provider();
    assert_eq!(provider.glyphs_at(GeoPoint::new(37.30, 126.84).unwrap()), 1);
    assert_eq!(provider.glyph_count(), 2);
    for pin in c.store().iter() {
        let handle = c.pin_marker(pin.id()).unwrap();
        assert_eq!(provider.marker_listener_count(handle), 1);
    }
    // background listener + two pins, the removed drafts left nothing behind
    assert_eq!(provider.listener_count(), 3);
}

#[test]
fn reopening_a_pin_and_closing_leaves_it_unchanged() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    fill(&mut c, "카페", "따뜻한");
    c.handle(MapEvent::Commit).unwrap();
    let pin = c.store().iter().next().unwrap().clone();

    let handle = c.pin_marker(pin.id()).unwrap();
    c.handle(MapEvent::MarkerClick(handle)).unwrap();
    assert_eq!(c.overlay().source(), Some(OverlaySource::Fixed(pin.id())));
    assert_eq!(c.overlay().fields().unwrap().label, "카페");

    fill(&mut c, "edited", "edited");
    c.handle(MapEvent::CloseOverlay).unwrap();

    let stored = c.store().get(pin.id()).unwrap();
    assert_eq!(stored, &pin);
    assert_eq!(c.store().len(), 1);
}

#[test]
fn click_near_pin_opens_its_overlay_instead_of_a_draft() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    fill(&mut c, "카페", "");
    c.handle(MapEvent::Commit).unwrap();

    click(&mut c, 37.30002, 126.84);
    assert!(c.draft_position().is_none());
    assert!(matches!(c.overlay().source(), Some(OverlaySource::Fixed(_))));
    assert_eq!(c.overlay().fields().unwrap().label, "카페");
}

#[test]
fn opening_a_pin_hides_the_draft_overlay() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    c.handle(MapEvent::Commit).unwrap();
    let pin_id = c.store().iter().next().unwrap().id();

    click(&mut c, 37.40, 126.84);
    fill(&mut c, "draft text", "");
    let handle = c.pin_marker(pin_id).unwrap();
    c.handle(MapEvent::MarkerClick(handle)).unwrap();

    // one overlay at a time, draft still on the map
    assert_eq!(c.overlay().source(), Some(OverlaySource::Fixed(pin_id)));
    assert!(matches!(c.session(), SessionState::DraftPlaced { .. }));

    let draft = c.draft_marker().unwrap();
    c.handle(MapEvent::MarkerClick(draft)).unwrap();
    assert_eq!(c.overlay().source(), Some(OverlaySource::Draft));
    assert_eq!(c.overlay().fields().unwrap().label, "draft text");
}

#[test]
fn draft_marker_click_while_open_is_noop() {
    let mut c = ready_controller();
    click(&mut c, 37.30, 126.84);
    fill(&mut c, "keep", "");
    let before = c.session();

    let draft = c.draft_marker().unwrap();
    c.handle(MapEvent::MarkerClick(draft)).unwrap();
    assert_eq!(c.session(), before);
    assert_eq!(c.overlay().fields().unwrap().label, "keep");
}

#[test]
fn committed_pins_keep_commit_order() {
    let mut c = ready_controller().with_pin_database(PinDatabase::in_memory().unwrap());
    for (lat, label) in [(37.30, "a"), (37.31, "b"), (37.32, "c")] {
        click(&mut c, lat, 126.84);
        fill(&mut c, label, "");
        commit(&mut c);
    }

    let labels: Vec<&str> = c.store().iter().map(|m| m.label()).collect();
    assert_eq!(labels, vec!["a", "b", "c"]);
}

#[test]
fn restore_queues_until_map_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pins.db");

    {
        let mut c = ready_controller().with_pin_database(PinDatabase::open(&path).unwrap());
        for lat in [37.30, 37.31, 37.32] {
            click(&mut c, lat, 126.84);
            commit(&mut c);
        }
    }

    let mut c = controller_with(InMemoryProvider::new())
        .with_pin_database(PinDatabase::open(&path).unwrap());
    assert_eq!(c.restore_pins().unwrap(), 3);
    assert_eq!(c.surface().provider().glyph_count(), 0);

    assert_eq!(c.initialize_map().unwrap(), 3);
    let drawn: Vec<f64> = c
        .surface()
        .provider()
        .glyphs()
        .map(|(_, g)| g.point.lat())
        .collect();
    assert_eq!(drawn, vec![37.30, 37.31, 37.32]);
}

#[tokio::test]
async fn load_map_retries_then_flushes_queued_pins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pins.db");
    {
        let mut c = ready_controller().with_pin_database(PinDatabase::open(&path).unwrap());
        click(&mut c, 37.30, 126.84);
        commit(&mut c);
    }

    let mut c = controller_with(InMemoryProvider::failing(1))
        .with_pin_database(PinDatabase::open(&path).unwrap());
    c.restore_pins().unwrap();

    let drawn = c.load_map(&RetryPolicy::immediate(3)).await.unwrap();
    assert_eq!(drawn, 1);
    assert_eq!(c.surface().provider().init_attempts(), 2);
}

#[tokio::test]
async fn provider_failure_is_not_fatal() {
    let mut c = controller_with(InMemoryProvider::failing(10));
    let result = c.load_map(&RetryPolicy::immediate(2)).await;
    assert!(matches!(result, Err(MapError::ProviderUnavailable(_))));

    let rejected = c.handle(MapEvent::Click {
        lat: 37.30,
        lng: 126.84,
    });
    assert!(matches!(rejected, Err(AppError::Map(MapError::NotReady))));
    assert_eq!(c.session(), SessionState::Empty);
}

#[test]
fn refused_pin_glyph_is_saved_and_drawn_on_next_pass() {
    let mut c = controller_with(InMemoryProvider::new().rejecting_icon("marker_fixed", 1))
        .with_pin_database(PinDatabase::in_memory().unwrap());
    c.initialize_map().unwrap();

    click(&mut c, 37.30, 126.84);
    fill(&mut c, "카페", "");
    commit(&mut c);

    assert_eq!(c.session(), SessionState::Empty);
    assert_eq!(draft_glyphs(&c), 0);
    assert_eq!(c.store().len(), 1);
    assert_eq!(c.surface().provider().glyph_count(), 0);

    // the next commit's render pass picks up the earlier pin too
    click(&mut c, 37.40, 126.84);
    commit(&mut c);
    assert_eq!(c.surface().provider().glyph_count(), 2);
}
