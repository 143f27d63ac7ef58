//! Weather map marker workflow for InfoRecord
//!
//! Places a draft pin on tap, edits it in an overlay, commits it as a saved
//! pin, and keeps the map's glyphs and click listeners in step with the saved
//! pins. The map engine itself sits behind [`MapProvider`].

pub mod controller;
pub mod form_store;
pub mod geo;
pub mod init;
pub mod marker;
pub mod memory;
pub mod overlay;
pub mod pin_db;
pub mod place;
pub mod provider;
pub mod session;
pub mod store;
pub mod surface;

pub use controller::{MapEvent, Navigator, ScreenId, WeatherMapController};
pub use form_store::{JsonFileStore, KeyValueStore, MemoryKeyValueStore};
pub use geo::{GeoPoint, ScreenPoint};
pub use init::{initialize_with_retry, RetryPolicy};
pub use marker::{FixedMarker, MarkerId};
pub use memory::InMemoryProvider;
pub use overlay::{OverlayFields, OverlayForm, OverlaySource};
pub use pin_db::PinDatabase;
pub use place::{PlaceDetails, PlaceRequest};
pub use provider::{IconRef, ListenerHandle, MapHandle, MapOptions, MapProvider, MarkerHandle};
pub use session::{Effect, SessionEvent, SessionState};
pub use store::{AppendOutcome, FixedMarkerStore};
pub use surface::{MapSurface, MarkerKey};
