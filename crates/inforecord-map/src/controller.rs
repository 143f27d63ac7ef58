//! Weather map controller.
//!
//! Receives every user event on the weather map, runs it through the draft
//! state machine, and applies the resulting effects to the surface, the
//! overlay and the pin store. All of it happens synchronously on the UI
//! event loop; map loading is the only `async` step.

use inforecord_core::{AppError, Config, MapError, StorageError};

use crate::form_store::{self, KeyValueStore};
use crate::geo::{GeoPoint, ScreenPoint};
use crate::init::{self, RetryPolicy};
use crate::marker::{FixedMarker, MarkerId};
use crate::overlay::{OverlayFields, OverlayForm, OverlaySource};
use crate::pin_db::PinDatabase;
use crate::provider::{IconRef, MapOptions, MapProvider, MarkerHandle};
use crate::session::{self, Effect, SessionEvent, SessionState};
use crate::store::FixedMarkerStore;
use crate::surface::{MapSurface, MarkerKey};

/// Identifier of a screen the host application can navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenId(String);

impl ScreenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Receives navigation requests; the host owns navigation itself.
pub trait Navigator {
    fn navigate(&mut self, screen: &ScreenId);
}

impl<F: FnMut(&ScreenId)> Navigator for F {
    fn navigate(&mut self, screen: &ScreenId) {
        self(screen)
    }
}

fn screen_setting(value: Option<&str>) -> Option<ScreenId> {
    value.filter(|id| !id.is_empty()).map(ScreenId::new)
}

/// User input on the weather map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Background tap already translated by the provider.
    Click { lat: f64, lng: f64 },
    /// Background tap in viewport pixels.
    Pointer(ScreenPoint),
    MarkerClick(MarkerHandle),
    SetLabel(String),
    SetKeyword(String),
    CloseOverlay,
    Commit,
}

#[derive(Debug, Clone)]
struct Settings {
    epsilon_m: f64,
    draft_icon: IconRef,
    on_commit: Option<ScreenId>,
    on_cancel: Option<ScreenId>,
}

pub struct WeatherMapController<P: MapProvider, K: KeyValueStore> {
    surface: MapSurface<P>,
    store: FixedMarkerStore,
    overlay: OverlayForm,
    session: SessionState,
    options: MapOptions,
    settings: Settings,
    form_store: K,
    prefill: Option<OverlayFields>,
    pins: Option<PinDatabase>,
    navigator: Option<Box<dyn Navigator>>,
}

impl<P: MapProvider, K: KeyValueStore> WeatherMapController<P, K> {
    /// Build a controller; reads the naming screen's values once.
    ///
    /// # Errors
    /// `InvalidPoint` if the configured map center is not a valid point.
    pub fn new(provider: P, form_store: K, config: &Config) -> Result<Self, MapError> {
        let options = MapOptions::from_config(&config.map)?;
        let prefill = form_store::load_prefill(&form_store);
        if let Some(fields) = &prefill {
            tracing::debug!("Pre-filling next pin with '{}'", fields.label);
        }

        Ok(Self {
            surface: MapSurface::new(provider),
            store: FixedMarkerStore::new(IconRef::new(config.map.fixed_icon.as_str())),
            overlay: OverlayForm::new(),
            session: SessionState::Empty,
            options,
            settings: Settings {
                epsilon_m: config.map.click_epsilon_meters,
                draft_icon: IconRef::new(config.map.draft_icon.as_str()),
                on_commit: screen_setting(config.navigation.on_commit.as_deref()),
                on_cancel: screen_setting(config.navigation.on_cancel.as_deref()),
            },
            form_store,
            prefill,
            pins: None,
            navigator: None,
        })
    }

    /// Persist committed pins to `db`.
    pub fn with_pin_database(mut self, db: PinDatabase) -> Self {
        self.pins = Some(db);
        self
    }

    /// Register the navigation callback.
    pub fn on_navigate_request(&mut self, navigator: impl Navigator + 'static) {
        self.navigator = Some(Box::new(navigator));
    }

    /// Load stored pins into the store. Drawn now if the map is ready,
    /// otherwise on initialization.
    pub fn restore_pins(&mut self) -> Result<usize, AppError> {
        let Some(db) = &self.pins else {
            return Ok(0);
        };
        let pins = db.load_all()?;
        let count = pins.len();
        for pin in pins {
            self.store.append(pin, &mut self.surface);
        }
        tracing::info!("Restored {} pin(s)", count);
        Ok(count)
    }

    /// Initialize the map once and draw any queued pins.
    ///
    /// Returns the number of pins drawn by the flush.
    pub fn initialize_map(&mut self) -> Result<usize, MapError> {
        self.surface.initialize(&self.options)?;
        self.flush_pending()
    }

    /// Initialize the map with retry and draw any queued pins.
    pub async fn load_map(&mut self, policy: &RetryPolicy) -> Result<usize, MapError> {
        init::initialize_with_retry(&mut self.surface, &self.options, policy).await?;
        self.flush_pending()
    }

    fn flush_pending(&mut self) -> Result<usize, MapError> {
        let drawn = self.store.render_pass(&mut self.surface)?;
        if drawn > 0 {
            tracing::info!("Drew {} queued pin(s)", drawn);
        }
        Ok(drawn)
    }

    /// Handle one user event.
    ///
    /// Rejected events leave all state unchanged.
    pub fn handle(&mut self, event: MapEvent) -> Result<(), AppError> {
        match event {
            MapEvent::Click { lat, lng } => {
                let point = GeoPoint::new(lat, lng).map_err(|e| {
                    tracing::warn!("Dropping click: {}", e);
                    e
                })?;
                self.background_click(point)
            }
            MapEvent::Pointer(screen) => {
                let point = self.surface.translate_pointer(screen).map_err(|e| {
                    tracing::warn!("Dropping pointer event at {:?}: {}", screen, e);
                    e
                })?;
                self.background_click(point)
            }
            MapEvent::MarkerClick(handle) => self.marker_click(handle),
            MapEvent::SetLabel(text) => {
                if !self.overlay.set_label(text) {
                    tracing::debug!("Label edit with no overlay open");
                }
                Ok(())
            }
            MapEvent::SetKeyword(text) => {
                if !self.overlay.set_keyword(text) {
                    tracing::debug!("Keyword edit with no overlay open");
                }
                Ok(())
            }
            MapEvent::CloseOverlay => self.close_overlay(),
            MapEvent::Commit => self.commit(),
        }
    }

    fn background_click(&mut self, point: GeoPoint) -> Result<(), AppError> {
        if !self.surface.is_ready() {
            tracing::warn!("Click at {} before the map is ready", point);
            return Err(MapError::NotReady.into());
        }

        let on_draft = self
            .session
            .draft_position()
            .is_some_and(|draft| draft.is_near(&point, self.settings.epsilon_m));

        if !on_draft {
            if let Some(id) = self
                .store
                .find_near(point, self.settings.epsilon_m)
                .map(FixedMarker::id)
            {
                return self.open_fixed(id);
            }
        }

        if matches!(self.overlay.source(), Some(OverlaySource::Fixed(_))) {
            self.overlay.close();
        }
        self.dispatch(SessionEvent::BackgroundClick(point))
    }

    fn marker_click(&mut self, handle: MarkerHandle) -> Result<(), AppError> {
        match self.surface.resolve(handle) {
            Some(MarkerKey::Draft) => {
                if matches!(self.overlay.source(), Some(OverlaySource::Fixed(_))) {
                    self.overlay.close();
                }
                self.dispatch(SessionEvent::DraftMarkerClick)
            }
            Some(MarkerKey::Fixed(id)) => self.open_fixed(id),
            None => {
                tracing::warn!("Click on unknown marker {:?}", handle);
                Err(MapError::UnknownMarker(format!("{:?}", handle)).into())
            }
        }
    }

    /// Show a committed pin's stored values. The store is not touched.
    fn open_fixed(&mut self, id: MarkerId) -> Result<(), AppError> {
        let Some(marker) = self.store.get(id) else {
            return Err(MapError::UnknownMarker(id.to_string()).into());
        };
        let (label, keyword) = (marker.label().to_string(), marker.keyword().to_string());

        self.dispatch(SessionEvent::FixedOverlayOpened)?;
        self.overlay.open(OverlaySource::Fixed(id), &label, &keyword);
        tracing::debug!("Opened overlay for pin {}", id);
        Ok(())
    }

    fn close_overlay(&mut self) -> Result<(), AppError> {
        let cancelled_draft = self.overlay.source() == Some(OverlaySource::Draft);

        if matches!(self.overlay.source(), Some(OverlaySource::Fixed(_))) {
            self.overlay.close();
            return Ok(());
        }

        self.dispatch(SessionEvent::CloseOverlay)?;
        if cancelled_draft {
            let screen = self.settings.on_cancel.clone();
            self.request_navigation(screen);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), AppError> {
        if let Some(OverlaySource::Fixed(id)) = self.overlay.source() {
            tracing::warn!("Commit on saved pin {} ignored", id);
            return Err(MapError::CommitRejected(format!("pin {id} is already saved")).into());
        }
        if !self.session.has_draft() {
            return Err(MapError::NoDraft.into());
        }
        self.dispatch(SessionEvent::Commit)
    }

    fn dispatch(&mut self, event: SessionEvent) -> Result<(), AppError> {
        let transition = session::transition(self.session, event, self.settings.epsilon_m);
        tracing::debug!(
            "{:?} + {:?} -> {:?}",
            self.session,
            event,
            transition.state
        );

        let previous = self.session;
        self.session = transition.state;

        for effect in transition.effects {
            if let Err(e) = self.apply(effect) {
                tracing::error!("Effect {:?} failed after {:?}: {}", effect, previous, e);
                self.abandon_draft();
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> Result<(), AppError> {
        match effect {
            Effect::PlaceDraft(point) => {
                self.surface
                    .place(MarkerKey::Draft, point, &self.settings.draft_icon)?;
            }
            Effect::RemoveDraft => {
                self.surface.remove(MarkerKey::Draft);
                self.overlay.discard_draft();
            }
            Effect::OpenDraftOverlay { fresh: true } => {
                let fields = self.prefill.clone().unwrap_or_default();
                self.overlay
                    .open(OverlaySource::Draft, &fields.label, &fields.keyword);
            }
            Effect::OpenDraftOverlay { fresh: false } => self.overlay.reopen_draft()?,
            Effect::CloseDraftOverlay => {
                if self.overlay.source() == Some(OverlaySource::Draft) {
                    self.overlay.close();
                }
            }
            Effect::CommitDraft(position) => self.commit_draft(position)?,
        }
        Ok(())
    }

    fn commit_draft(&mut self, position: GeoPoint) -> Result<(), AppError> {
        let fields = self.overlay.commit()?;
        let marker = FixedMarker::new(position, fields);

        let persisted = match &self.pins {
            Some(db) => db.insert(&marker).map(|_| ()),
            None => Ok(()),
        };
        self.store.append(marker, &mut self.surface);

        if self.prefill.take().is_some() {
            if let Err(e) = form_store::save_prefill(&mut self.form_store, &OverlayFields::default()) {
                tracing::warn!("Failed to clear place name fields: {}", e);
            }
        }

        let screen = self.settings.on_commit.clone();
        self.request_navigation(screen);

        persisted.map_err(|e| {
            tracing::error!("Pin saved for this session only: {}", e);
            AppError::from(e)
        })
    }

    /// Drop the draft after a failed effect so state and surface agree.
    fn abandon_draft(&mut self) {
        self.surface.remove(MarkerKey::Draft);
        self.overlay.discard_draft();
        self.session = SessionState::Empty;
    }

    fn request_navigation(&mut self, screen: Option<ScreenId>) {
        if let (Some(screen), Some(navigator)) = (screen, self.navigator.as_mut()) {
            tracing::debug!("Requesting navigation to {}", screen.as_str());
            navigator.navigate(&screen);
        }
    }

    /// Store the "name this place" values and use them for the next draft.
    pub fn remember_place_name(
        &mut self,
        label: &str,
        keyword: &str,
    ) -> Result<(), StorageError> {
        let fields = OverlayFields::new(label, keyword);
        form_store::save_prefill(&mut self.form_store, &fields)?;
        self.prefill = (!fields.is_empty()).then_some(fields);
        Ok(())
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn overlay(&self) -> &OverlayForm {
        &self.overlay
    }

    pub fn store(&self) -> &FixedMarkerStore {
        &self.store
    }

    pub fn surface(&self) -> &MapSurface<P> {
        &self.surface
    }

    pub fn draft_position(&self) -> Option<GeoPoint> {
        self.session.draft_position()
    }

    /// Glyph handle of the draft marker, if placed.
    pub fn draft_marker(&self) -> Option<MarkerHandle> {
        self.surface.marker_handle(MarkerKey::Draft)
    }

    /// Glyph handle of a committed pin, if drawn.
    pub fn pin_marker(&self, id: MarkerId) -> Option<MarkerHandle> {
        self.surface.marker_handle(MarkerKey::Fixed(id))
    }

    /// Where to anchor the open overlay on screen.
    pub fn overlay_anchor(&self) -> Option<ScreenPoint> {
        let point = match self.overlay.source()? {
            OverlaySource::Draft => self.session.draft_position()?,
            OverlaySource::Fixed(id) => self.store.get(id)?.position(),
        };
        self.surface.screen_position(point)
    }

    pub fn form_store(&self) -> &K {
        &self.form_store
    }
}
