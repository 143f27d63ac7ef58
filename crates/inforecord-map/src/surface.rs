//! Map surface: owns the provider and every handle it hands out.
//!
//! Each glyph is keyed by [`MarkerKey`]. Its click listener is attached once
//! when the glyph is placed and detached once when it is removed; re-placing
//! an existing key returns the glyph already on screen.

use std::collections::HashMap;

use inforecord_core::MapError;

use crate::geo::{GeoPoint, ScreenPoint};
use crate::marker::MarkerId;
use crate::provider::{IconRef, ListenerHandle, MapHandle, MapOptions, MapProvider, MarkerHandle};

/// Which application marker a glyph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Draft,
    Fixed(MarkerId),
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    marker: MarkerHandle,
    listener: ListenerHandle,
}

pub struct MapSurface<P: MapProvider> {
    provider: P,
    map: Option<MapHandle>,
    click_listener: Option<ListenerHandle>,
    bindings: HashMap<MarkerKey, Binding>,
    owners: HashMap<MarkerHandle, MarkerKey>,
}

impl<P: MapProvider> MapSurface<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            map: None,
            click_listener: None,
            bindings: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Bring up the viewport and subscribe to background clicks.
    ///
    /// Calling this again after success returns the existing handle.
    pub fn initialize(&mut self, options: &MapOptions) -> Result<MapHandle, MapError> {
        if let Some(map) = self.map {
            return Ok(map);
        }

        let map = self.provider.initialize(options).map_err(|e| {
            tracing::error!("Map provider failed to initialize: {}", e);
            e
        })?;

        self.click_listener = Some(self.provider.listen_click(map));
        self.map = Some(map);
        tracing::info!(
            "Map initialized at {} (zoom level {})",
            options.center,
            options.zoom_level
        );
        Ok(map)
    }

    pub fn is_ready(&self) -> bool {
        self.map.is_some()
    }

    /// Draw the glyph for `key` and bind its click listener.
    pub fn place(
        &mut self,
        key: MarkerKey,
        point: GeoPoint,
        icon: &IconRef,
    ) -> Result<MarkerHandle, MapError> {
        let map = self.map.ok_or(MapError::NotReady)?;

        if let Some(binding) = self.bindings.get(&key) {
            tracing::debug!("{:?} already on the map, keeping glyph", key);
            return Ok(binding.marker);
        }

        let marker = self.provider.place_marker(map, point, icon)?;
        let listener = self.provider.listen_marker_click(marker);
        self.bindings.insert(key, Binding { marker, listener });
        self.owners.insert(marker, key);
        tracing::debug!("Placed {:?} at {}", key, point);
        Ok(marker)
    }

    /// Detach the listener and remove the glyph. Returns false if `key`
    /// was not on the map.
    pub fn remove(&mut self, key: MarkerKey) -> bool {
        let Some(binding) = self.bindings.remove(&key) else {
            return false;
        };
        self.owners.remove(&binding.marker);
        self.provider.unlisten(binding.listener);
        self.provider.remove_marker(binding.marker);
        tracing::debug!("Removed {:?}", key);
        true
    }

    pub fn is_placed(&self, key: MarkerKey) -> bool {
        self.bindings.contains_key(&key)
    }

    pub fn marker_handle(&self, key: MarkerKey) -> Option<MarkerHandle> {
        self.bindings.get(&key).map(|b| b.marker)
    }

    /// Map a clicked glyph back to its owner.
    pub fn resolve(&self, marker: MarkerHandle) -> Option<MarkerKey> {
        self.owners.get(&marker).copied()
    }

    /// Translate a pointer position into a geographic point.
    pub fn translate_pointer(&self, screen: ScreenPoint) -> Result<GeoPoint, MapError> {
        let map = self.map.ok_or(MapError::NotReady)?;
        self.provider
            .project(map, screen)
            .ok_or(MapError::InvalidPoint {
                lat: f64::NAN,
                lng: f64::NAN,
            })
    }

    /// Screen position of a geographic point, if it is in view.
    pub fn screen_position(&self, point: GeoPoint) -> Option<ScreenPoint> {
        self.provider.unproject(self.map?, point)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: MapProvider> Drop for MapSurface<P> {
    fn drop(&mut self) {
        let keys: Vec<MarkerKey> = self.bindings.keys().copied().collect();
        for key in keys {
            self.remove(key);
        }
        if let Some(listener) = self.click_listener.take() {
            self.provider.unlisten(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProvider;

    fn ready_surface() -> MapSurface<InMemoryProvider> {
        let mut surface = MapSurface::new(InMemoryProvider::new());
        let options = MapOptions {
            center: GeoPoint::new(37.3, 126.84).unwrap(),
            zoom_level: 3,
            api_key: "key".to_string(),
            sdk_url: "https://maps.example.com/sdk.js".to_string(),
        };
        surface.initialize(&options).unwrap();
        surface
    }

    #[test]
    fn place_before_initialize_is_not_ready() {
        let mut surface = MapSurface::new(InMemoryProvider::new());
        let point = GeoPoint::new(37.3, 126.84).unwrap();
        assert_eq!(
            surface.place(MarkerKey::Draft, point, &IconRef::new("pin")),
            Err(MapError::NotReady)
        );
    }

    #[test]
    fn initialize_subscribes_background_clicks_once() {
        let mut surface = ready_surface();
        let options = MapOptions {
            center: GeoPoint::new(37.3, 126.84).unwrap(),
            zoom_level: 3,
            api_key: String::new(),
            sdk_url: String::new(),
        };
        surface.initialize(&options).unwrap();
        assert_eq!(surface.provider().listener_count(), 1);
        assert_eq!(surface.provider().init_attempts(), 1);
    }

    #[test]
    fn placing_same_key_twice_keeps_one_glyph_and_listener() {
        let mut surface = ready_surface();
        let point = GeoPoint::new(37.3, 126.84).unwrap();
        let key = MarkerKey::Fixed(MarkerId::new());

        let first = surface.place(key, point, &IconRef::new("pin")).unwrap();
        let second = surface.place(key, point, &IconRef::new("pin")).unwrap();

        assert_eq!(first, second);
        assert_eq!(surface.provider().glyph_count(), 1);
        assert_eq!(surface.provider().marker_listener_count(first), 1);
    }

    #[test]
    fn remove_detaches_listener_and_glyph() {
        let mut surface = ready_surface();
        let point = GeoPoint::new(37.3, 126.84).unwrap();
        let handle = surface
            .place(MarkerKey::Draft, point, &IconRef::new("draft"))
            .unwrap();

        assert!(surface.remove(MarkerKey::Draft));
        assert!(!surface.remove(MarkerKey::Draft));
        assert_eq!(surface.provider().glyph_count(), 0);
        assert_eq!(surface.provider().marker_listener_count(handle), 0);
        assert!(surface.resolve(handle).is_none());
    }

    #[test]
    fn resolve_maps_handle_to_key() {
        let mut surface = ready_surface();
        let id = MarkerId::new();
        let point = GeoPoint::new(37.3, 126.84).unwrap();
        let handle = surface
            .place(MarkerKey::Fixed(id), point, &IconRef::new("pin"))
            .unwrap();
        assert_eq!(surface.resolve(handle), Some(MarkerKey::Fixed(id)));
    }

    #[test]
    fn translate_pointer_needs_ready_map() {
        let surface = MapSurface::new(InMemoryProvider::new());
        assert_eq!(
            surface.translate_pointer(ScreenPoint::new(10.0, 10.0)),
            Err(MapError::NotReady)
        );
    }
}
