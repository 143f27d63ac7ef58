//! Committed pins.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::overlay::OverlayFields;

/// Unique pin identity. UUID v4, so rapid successive commits never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MarkerId(Uuid);

impl MarkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed, persisted pin. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedMarker {
    id: MarkerId,
    position: GeoPoint,
    label: String,
    keyword: String,
    created_at: DateTime<Utc>,
}

impl FixedMarker {
    /// Build a new pin from a draft position and the committed form values.
    pub fn new(position: GeoPoint, fields: OverlayFields) -> Self {
        Self {
            id: MarkerId::new(),
            position,
            label: fields.label,
            keyword: fields.keyword,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stored pin.
    pub fn from_parts(
        id: MarkerId,
        position: GeoPoint,
        label: String,
        keyword: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            position,
            label,
            keyword,
            created_at,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
