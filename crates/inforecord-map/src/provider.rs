//! Boundary to the external map engine.
//!
//! The engine renders tiles and glyphs; everything the marker workflow knows
//! about it goes through [`MapProvider`] and the opaque handles it returns.

use inforecord_core::{MapConfig, MapError};

use crate::geo::{GeoPoint, ScreenPoint};

/// Opaque handle to an initialized map instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapHandle(u64);

/// Opaque handle to a glyph placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(u64);

/// Opaque handle to an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

macro_rules! opaque_handle {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                pub fn raw(&self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

opaque_handle!(MapHandle, MarkerHandle, ListenerHandle);

/// Icon reference understood by the provider (sprite name, image URL, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything a provider needs to bring up a viewport.
///
/// `api_key` and `sdk_url` are passed through untouched.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub center: GeoPoint,
    pub zoom_level: u8,
    pub api_key: String,
    pub sdk_url: String,
}

impl MapOptions {
    pub fn from_config(config: &MapConfig) -> Result<Self, MapError> {
        Ok(Self {
            center: GeoPoint::new(config.center_lat, config.center_lng)?,
            zoom_level: config.zoom_level,
            api_key: config.api_key.clone(),
            sdk_url: config.sdk_url.clone(),
        })
    }
}

/// Capability the map surface drives.
///
/// Implementations never call back into application code: clicks are
/// delivered by the host event loop as `MapEvent`s, and the listener
/// handles returned here only track subscription lifetime.
pub trait MapProvider {
    /// Load the engine and create a viewport.
    ///
    /// # Errors
    /// `MapError::ProviderUnavailable` when the engine or its container
    /// cannot be loaded.
    fn initialize(&mut self, options: &MapOptions) -> Result<MapHandle, MapError>;

    /// Draw a marker glyph.
    ///
    /// # Errors
    /// `MapError::NotReady` if `map` is not a live viewport.
    fn place_marker(
        &mut self,
        map: MapHandle,
        point: GeoPoint,
        icon: &IconRef,
    ) -> Result<MarkerHandle, MapError>;

    fn remove_marker(&mut self, marker: MarkerHandle);

    /// Subscribe to background clicks on the viewport.
    fn listen_click(&mut self, map: MapHandle) -> ListenerHandle;

    /// Subscribe to clicks on one marker glyph.
    fn listen_marker_click(&mut self, marker: MarkerHandle) -> ListenerHandle;

    fn unlisten(&mut self, listener: ListenerHandle);

    /// Screen pixel to geographic point, `None` outside the viewport.
    fn project(&self, map: MapHandle, screen: ScreenPoint) -> Option<GeoPoint>;

    /// Geographic point to screen pixel, `None` when off-screen.
    fn unproject(&self, map: MapHandle, point: GeoPoint) -> Option<ScreenPoint>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_default_config() {
        let options = MapOptions::from_config(&MapConfig::default()).unwrap();
        assert_eq!(options.zoom_level, 3);
        assert!((options.center.lat() - 33.450701).abs() < 1e-9);
    }

    #[test]
    fn options_reject_invalid_center() {
        let config = MapConfig {
            center_lat: f64::NAN,
            ..MapConfig::default()
        };
        assert!(matches!(
            MapOptions::from_config(&config),
            Err(MapError::InvalidPoint { .. })
        ));
    }
}
