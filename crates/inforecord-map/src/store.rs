//! Ordered collection of committed pins, mirrored onto the map surface.

use inforecord_core::MapError;

use crate::geo::GeoPoint;
use crate::marker::{FixedMarker, MarkerId};
use crate::provider::{IconRef, MapProvider};
use crate::surface::{MapSurface, MarkerKey};

/// Outcome of [`FixedMarkerStore::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Added and drawn; `rendered` counts glyphs drawn by the pass.
    Rendered { rendered: usize },
    /// Added; drawing waits for the map to become ready.
    Queued { pending: usize },
    /// A pin with this id is already stored.
    Duplicate,
}

/// Insertion order is z-order: later pins sit on top.
#[derive(Debug)]
pub struct FixedMarkerStore {
    markers: Vec<FixedMarker>,
    icon: IconRef,
}

impl FixedMarkerStore {
    pub fn new(icon: IconRef) -> Self {
        Self {
            markers: Vec::new(),
            icon,
        }
    }

    /// Add a pin to the end and run a render pass.
    ///
    /// The pin is stored even when it cannot be drawn yet. Before the surface
    /// is ready, or when the provider refuses the glyph, it stays pending and
    /// is drawn by a later render pass.
    pub fn append<P: MapProvider>(
        &mut self,
        marker: FixedMarker,
        surface: &mut MapSurface<P>,
    ) -> AppendOutcome {
        if self.get(marker.id()).is_some() {
            tracing::warn!("Pin {} already stored, ignoring append", marker.id());
            return AppendOutcome::Duplicate;
        }

        tracing::info!(
            "Stored pin {} '{}' at {}",
            marker.id(),
            marker.label(),
            marker.position()
        );
        self.markers.push(marker);

        match self.render_pass(surface) {
            Ok(rendered) => AppendOutcome::Rendered { rendered },
            Err(MapError::RenderPassSkipped { pending }) => {
                tracing::debug!("Map not ready, {} pin(s) queued", pending);
                AppendOutcome::Queued { pending }
            }
            Err(e) => {
                let pending = self.pending(surface);
                tracing::warn!("Render pass failed ({}), {} pin(s) queued", e, pending);
                AppendOutcome::Queued { pending }
            }
        }
    }

    /// Draw every stored pin that has no glyph yet, in insertion order.
    ///
    /// Safe to repeat: pins already on the map are left alone.
    ///
    /// # Errors
    /// `RenderPassSkipped` when the surface is not ready yet.
    pub fn render_pass<P: MapProvider>(
        &self,
        surface: &mut MapSurface<P>,
    ) -> Result<usize, MapError> {
        if !surface.is_ready() {
            return Err(MapError::RenderPassSkipped {
                pending: self.pending(surface),
            });
        }

        let mut rendered = 0;
        for marker in &self.markers {
            let key = MarkerKey::Fixed(marker.id());
            if surface.is_placed(key) {
                continue;
            }
            surface.place(key, marker.position(), &self.icon)?;
            rendered += 1;
        }

        if rendered > 0 {
            tracing::debug!("Render pass drew {} pin(s)", rendered);
        }
        Ok(rendered)
    }

    /// Pins without a glyph on `surface`.
    pub fn pending<P: MapProvider>(&self, surface: &MapSurface<P>) -> usize {
        self.markers
            .iter()
            .filter(|m| !surface.is_placed(MarkerKey::Fixed(m.id())))
            .count()
    }

    /// Topmost pin within `epsilon_m` of `point`.
    pub fn find_near(&self, point: GeoPoint, epsilon_m: f64) -> Option<&FixedMarker> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.position().is_near(&point, epsilon_m))
    }

    pub fn get(&self, id: MarkerId) -> Option<&FixedMarker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixedMarker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
