//! Overlay form state.
//!
//! One overlay exists on the weather map. It is bound either to the draft
//! marker or, read-only, to a committed pin. The draft's buffer lives as long
//! as the draft marker, so hiding the overlay and reopening it keeps what was
//! typed. Nothing typed here reaches the pin store except through `commit`.

use serde::{Deserialize, Serialize};

use inforecord_core::MapError;

use crate::marker::MarkerId;

/// The two editable fields. Plain text, unbounded, empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayFields {
    pub label: String,
    pub keyword: String,
}

impl OverlayFields {
    pub fn new(label: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            keyword: keyword.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.keyword.is_empty()
    }
}

/// What the overlay is currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySource {
    Draft,
    Fixed(MarkerId),
}

#[derive(Debug, Default)]
pub struct OverlayForm {
    visible: Option<OverlaySource>,
    draft: Option<OverlayFields>,
    fixed_view: Option<(MarkerId, OverlayFields)>,
}

impl OverlayForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the overlay for `source` with the given initial values.
    ///
    /// Opening one source hides any other; a hidden draft keeps its buffer.
    pub fn open(&mut self, source: OverlaySource, label: &str, keyword: &str) {
        let fields = OverlayFields::new(label, keyword);
        match source {
            OverlaySource::Draft => {
                self.fixed_view = None;
                self.draft = Some(fields);
            }
            OverlaySource::Fixed(id) => self.fixed_view = Some((id, fields)),
        }
        self.visible = Some(source);
    }

    /// Show the draft overlay again with its retained buffer.
    pub fn reopen_draft(&mut self) -> Result<(), MapError> {
        if self.draft.is_none() {
            return Err(MapError::NoDraft);
        }
        self.fixed_view = None;
        self.visible = Some(OverlaySource::Draft);
        Ok(())
    }

    /// Returns false when no overlay is open.
    pub fn set_label(&mut self, text: impl Into<String>) -> bool {
        match self.visible_fields_mut() {
            Some(fields) => {
                fields.label = text.into();
                true
            }
            None => false,
        }
    }

    /// Returns false when no overlay is open.
    pub fn set_keyword(&mut self, text: impl Into<String>) -> bool {
        match self.visible_fields_mut() {
            Some(fields) => {
                fields.keyword = text.into();
                true
            }
            None => false,
        }
    }

    /// Hide the overlay. Edits to a committed pin's view are discarded; the
    /// draft buffer stays with the draft marker.
    pub fn close(&mut self) {
        self.visible = None;
        self.fixed_view = None;
    }

    /// Take the draft values for a new pin.
    ///
    /// # Errors
    /// `CommitRejected` while a committed pin's overlay is showing, `NoDraft`
    /// when there is no draft buffer.
    pub fn commit(&mut self) -> Result<OverlayFields, MapError> {
        if let Some(OverlaySource::Fixed(id)) = self.visible {
            return Err(MapError::CommitRejected(format!(
                "pin {id} is already saved"
            )));
        }
        let fields = self.draft.take().ok_or(MapError::NoDraft)?;
        self.visible = None;
        Ok(fields)
    }

    /// Forget the draft buffer, hiding the overlay if it showed the draft.
    pub fn discard_draft(&mut self) {
        self.draft = None;
        if self.visible == Some(OverlaySource::Draft) {
            self.visible = None;
        }
    }

    pub fn source(&self) -> Option<OverlaySource> {
        self.visible
    }

    pub fn is_open(&self) -> bool {
        self.visible.is_some()
    }

    /// Values shown in the open overlay.
    pub fn fields(&self) -> Option<&OverlayFields> {
        match self.visible? {
            OverlaySource::Draft => self.draft.as_ref(),
            OverlaySource::Fixed(_) => self.fixed_view.as_ref().map(|(_, f)| f),
        }
    }

    /// The draft buffer, shown or not.
    pub fn draft_fields(&self) -> Option<&OverlayFields> {
        self.draft.as_ref()
    }

    fn visible_fields_mut(&mut self) -> Option<&mut OverlayFields> {
        match self.visible? {
            OverlaySource::Draft => self.draft.as_mut(),
            OverlaySource::Fixed(_) => self.fixed_view.as_mut().map(|(_, f)| f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_require_open_overlay() {
        let mut form = OverlayForm::new();
        assert!(!form.set_label("카페"));
        form.open(OverlaySource::Draft, "", "");
        assert!(form.set_label("카페"));
        assert!(form.set_keyword("따뜻한"));
        assert_eq!(form.fields(), Some(&OverlayFields::new("카페", "따뜻한")));
    }

    #[test]
    fn draft_buffer_survives_close_and_reopen() {
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Draft, "", "");
        form.set_label("bakery");
        form.close();
        assert!(!form.is_open());
        form.reopen_draft().unwrap();
        assert_eq!(form.fields().unwrap().label, "bakery");
    }

    #[test]
    fn fixed_view_edits_are_discarded_on_close() {
        let id = MarkerId::new();
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Fixed(id), "park", "green");
        form.set_label("changed");
        form.close();
        form.open(OverlaySource::Fixed(id), "park", "green");
        assert_eq!(form.fields().unwrap().label, "park");
    }

    #[test]
    fn commit_is_rejected_for_fixed_source() {
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Fixed(MarkerId::new()), "a", "b");
        assert!(matches!(form.commit(), Err(MapError::CommitRejected(_))));
    }

    #[test]
    fn commit_takes_draft_and_closes() {
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Draft, "", "");
        form.set_label("카페");
        let fields = form.commit().unwrap();
        assert_eq!(fields.label, "카페");
        assert_eq!(fields.keyword, "");
        assert!(!form.is_open());
        assert_eq!(form.commit(), Err(MapError::NoDraft));
    }

    #[test]
    fn opening_fixed_keeps_hidden_draft() {
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Draft, "draft", "");
        form.open(OverlaySource::Fixed(MarkerId::new()), "pin", "");
        assert_eq!(form.draft_fields().unwrap().label, "draft");
        form.reopen_draft().unwrap();
        assert_eq!(form.fields().unwrap().label, "draft");
    }

    #[test]
    fn discard_draft_hides_draft_overlay() {
        let mut form = OverlayForm::new();
        form.open(OverlaySource::Draft, "x", "y");
        form.discard_draft();
        assert!(!form.is_open());
        assert!(form.draft_fields().is_none());
        assert_eq!(form.reopen_draft(), Err(MapError::NoDraft));
    }
}
