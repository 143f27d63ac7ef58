//! Draft marker state machine.
//!
//! `transition` is pure: it maps the current state and one event to the next
//! state plus the effects the controller must apply to the surface and the
//! overlay. At most one draft marker exists in every state.

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Empty,
    /// Draft marker shown, overlay hidden.
    DraftPlaced { position: GeoPoint },
    /// Draft marker shown with its overlay open.
    DraftOverlayOpen { position: GeoPoint },
}

impl SessionState {
    pub fn draft_position(self) -> Option<GeoPoint> {
        match self {
            SessionState::Empty => None,
            SessionState::DraftPlaced { position } | SessionState::DraftOverlayOpen { position } => {
                Some(position)
            }
        }
    }

    pub fn has_draft(self) -> bool {
        self.draft_position().is_some()
    }

    pub fn is_overlay_open(self) -> bool {
        matches!(self, SessionState::DraftOverlayOpen { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Tap on the map background at a validated point.
    BackgroundClick(GeoPoint),
    /// Tap on the draft marker glyph.
    DraftMarkerClick,
    /// A committed pin's overlay took focus.
    FixedOverlayOpened,
    /// The overlay's close control.
    CloseOverlay,
    /// The overlay's save control.
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    PlaceDraft(GeoPoint),
    /// Remove the draft glyph and forget its form buffer.
    RemoveDraft,
    /// `fresh` resets the form; otherwise the retained buffer is shown.
    OpenDraftOverlay { fresh: bool },
    CloseDraftOverlay,
    /// Turn the draft form into a pin at this position.
    CommitDraft(GeoPoint),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: SessionState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    fn stay(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Compute the next state for `event`.
///
/// `epsilon_m` is the distance under which a background click counts as a
/// click on the draft itself.
pub fn transition(state: SessionState, event: SessionEvent, epsilon_m: f64) -> Transition {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (S::Empty, E::BackgroundClick(point)) => place_new(point, Vec::new()),

        (S::DraftPlaced { position } | S::DraftOverlayOpen { position }, E::BackgroundClick(point)) => {
            let mut effects = Vec::new();
            if state.is_overlay_open() {
                effects.push(Effect::CloseDraftOverlay);
            }
            effects.push(Effect::RemoveDraft);

            if position.is_near(&point, epsilon_m) {
                Transition::to(S::Empty, effects)
            } else {
                place_new(point, effects)
            }
        }

        (S::DraftPlaced { position }, E::DraftMarkerClick) => Transition::to(
            S::DraftOverlayOpen { position },
            vec![Effect::OpenDraftOverlay { fresh: false }],
        ),

        (S::DraftOverlayOpen { position }, E::FixedOverlayOpened | E::CloseOverlay) => {
            Transition::to(S::DraftPlaced { position }, vec![Effect::CloseDraftOverlay])
        }

        (S::DraftPlaced { position } | S::DraftOverlayOpen { position }, E::Commit) => {
            Transition::to(
                S::Empty,
                vec![Effect::CommitDraft(position), Effect::RemoveDraft],
            )
        }

        // Already open, nothing drafted, or nothing to close.
        (S::DraftOverlayOpen { .. }, E::DraftMarkerClick)
        | (S::DraftPlaced { .. }, E::FixedOverlayOpened | E::CloseOverlay)
        | (
            S::Empty,
            E::DraftMarkerClick | E::FixedOverlayOpened | E::CloseOverlay | E::Commit,
        ) => Transition::stay(state),
    }
}

fn place_new(point: GeoPoint, mut effects: Vec<Effect>) -> Transition {
    effects.push(Effect::PlaceDraft(point));
    effects.push(Effect::OpenDraftOverlay { fresh: true });
    Transition::to(SessionState::DraftOverlayOpen { position: point }, effects)
}
