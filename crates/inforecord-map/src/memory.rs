//! Headless map provider.
//!
//! Keeps glyphs and subscriptions in memory. Used by tests and by the
//! command-line replay, where there is no real map engine to drive.

use std::collections::{BTreeMap, HashMap};

use inforecord_core::MapError;

use crate::geo::{GeoPoint, ScreenPoint};
use crate::provider::{IconRef, ListenerHandle, MapHandle, MapOptions, MapProvider, MarkerHandle};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Glyph currently drawn by the in-memory provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub point: GeoPoint,
    pub icon: IconRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerTarget {
    Map(MapHandle),
    Marker(MarkerHandle),
}

#[derive(Debug)]
pub struct InMemoryProvider {
    next_id: u64,
    viewport: (f64, f64),
    map: Option<(MapHandle, MapOptions)>,
    glyphs: BTreeMap<MarkerHandle, PlacedGlyph>,
    listeners: HashMap<ListenerHandle, ListenerTarget>,
    failures_remaining: u32,
    rejected_icon: Option<(IconRef, u32)>,
    init_attempts: u32,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    /// Provider with a 440x400 viewport, the weather map card size.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            viewport: (440.0, 400.0),
            map: None,
            glyphs: BTreeMap::new(),
            listeners: HashMap::new(),
            failures_remaining: 0,
            rejected_icon: None,
            init_attempts: 0,
        }
    }

    /// Provider whose first `failures` initialization attempts fail.
    pub fn failing(failures: u32) -> Self {
        Self {
            failures_remaining: failures,
            ..Self::new()
        }
    }

    /// Refuse the next `failures` placements of glyphs drawn with `icon`.
    pub fn rejecting_icon(mut self, icon: &str, failures: u32) -> Self {
        self.rejected_icon = Some((IconRef::new(icon), failures));
        self
    }

    pub fn init_attempts(&self) -> u32 {
        self.init_attempts
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Glyphs in placement order.
    pub fn glyphs(&self) -> impl Iterator<Item = (MarkerHandle, &PlacedGlyph)> {
        self.glyphs.iter().map(|(h, g)| (*h, g))
    }

    /// Number of glyphs drawn at exactly `point`.
    pub fn glyphs_at(&self, point: GeoPoint) -> usize {
        self.glyphs.values().filter(|g| g.point == point).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn marker_listener_count(&self, marker: MarkerHandle) -> usize {
        self.listeners
            .values()
            .filter(|t| **t == ListenerTarget::Marker(marker))
            .count()
    }

    fn next_raw(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn meters_per_pixel(zoom_level: u8) -> f64 {
        0.5 * 2f64.powi(i32::from(zoom_level) - 1)
    }

    fn live_options(&self, map: MapHandle) -> Option<&MapOptions> {
        self.map
            .as_ref()
            .filter(|(handle, _)| *handle == map)
            .map(|(_, options)| options)
    }
}

impl MapProvider for InMemoryProvider {
    fn initialize(&mut self, options: &MapOptions) -> Result<MapHandle, MapError> {
        self.init_attempts += 1;

        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(MapError::ProviderUnavailable(
                "map script failed to load".to_string(),
            ));
        }

        let handle = MapHandle::from_raw(self.next_raw());
        self.map = Some((handle, options.clone()));
        Ok(handle)
    }

    fn place_marker(
        &mut self,
        map: MapHandle,
        point: GeoPoint,
        icon: &IconRef,
    ) -> Result<MarkerHandle, MapError> {
        if self.live_options(map).is_none() {
            return Err(MapError::NotReady);
        }
        if let Some((rejected, remaining)) = self.rejected_icon.as_mut() {
            if *rejected == *icon && *remaining > 0 {
                *remaining -= 1;
                return Err(MapError::ProviderUnavailable(format!(
                    "glyph '{}' rejected",
                    icon.as_str()
                )));
            }
        }

        let handle = MarkerHandle::from_raw(self.next_raw());
        self.glyphs.insert(
            handle,
            PlacedGlyph {
                point,
                icon: icon.clone(),
            },
        );
        Ok(handle)
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.glyphs.remove(&marker);
    }

    fn listen_click(&mut self, map: MapHandle) -> ListenerHandle {
        let handle = ListenerHandle::from_raw(self.next_raw());
        self.listeners.insert(handle, ListenerTarget::Map(map));
        handle
    }

    fn listen_marker_click(&mut self, marker: MarkerHandle) -> ListenerHandle {
        let handle = ListenerHandle::from_raw(self.next_raw());
        self.listeners.insert(handle, ListenerTarget::Marker(marker));
        handle
    }

    fn unlisten(&mut self, listener: ListenerHandle) {
        self.listeners.remove(&listener);
    }

    fn project(&self, map: MapHandle, screen: ScreenPoint) -> Option<GeoPoint> {
        let options = self.live_options(map)?;
        let (width, height) = self.viewport;
        if !(0.0..=width).contains(&screen.x) || !(0.0..=height).contains(&screen.y) {
            return None;
        }

        let mpp = Self::meters_per_pixel(options.zoom_level);
        let center = options.center;
        let dy_m = (height / 2.0 - screen.y) * mpp;
        let dx_m = (screen.x - width / 2.0) * mpp;

        let lat = center.lat() + dy_m / METERS_PER_DEGREE_LAT;
        let lng = center.lng() + dx_m / (METERS_PER_DEGREE_LAT * center.lat().to_radians().cos());
        GeoPoint::new(lat, lng).ok()
    }

    fn unproject(&self, map: MapHandle, point: GeoPoint) -> Option<ScreenPoint> {
        let options = self.live_options(map)?;
        let (width, height) = self.viewport;
        let mpp = Self::meters_per_pixel(options.zoom_level);
        let center = options.center;

        let dy_m = (point.lat() - center.lat()) * METERS_PER_DEGREE_LAT;
        let dx_m =
            (point.lng() - center.lng()) * METERS_PER_DEGREE_LAT * center.lat().to_radians().cos();

        let screen = ScreenPoint::new(width / 2.0 + dx_m / mpp, height / 2.0 - dy_m / mpp);
        let visible = (0.0..=width).contains(&screen.x) && (0.0..=height).contains(&screen.y);
        visible.then_some(screen)
    }
}
