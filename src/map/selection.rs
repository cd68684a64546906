/// Popup/drag state for the marker overlay.
///
/// At most one marker's popup is visible at a time. A drag gesture sets a
/// transient flag so that the click the gesture releases into is not
/// misread as a popup toggle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionState {
  popup: Option<String>,
  drag_in_progress: bool,
}

impl SelectionState {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Id of the marker whose popup is currently shown, if any.
  #[must_use]
  pub fn shown(&self) -> Option<&str> {
    self.popup.as_deref()
  }

  #[must_use]
  pub fn is_shown(&self, id: &str) -> bool {
    self.popup.as_deref() == Some(id)
  }

  #[must_use]
  pub fn drag_in_progress(&self) -> bool {
    self.drag_in_progress
  }

  /// Toggle-open interaction targeting a marker. While a drag is in
  /// progress the toggle is suppressed and only clears the flag. Toggling
  /// the shown marker hides it; toggling another marker replaces the popup
  /// directly.
  pub fn toggle_popup(&mut self, id: &str) {
    if self.drag_in_progress {
      self.drag_in_progress = false;
      return;
    }
    if self.is_shown(id) {
      self.popup = None;
    } else {
      self.popup = Some(id.to_string());
    }
  }

  /// Explicit close from the popup's own control.
  pub fn close_popup(&mut self) {
    self.popup = None;
  }

  pub fn drag_started(&mut self) {
    self.drag_in_progress = true;
  }

  /// Any drag-end clears the popup, regardless of which marker was dragged.
  pub fn drag_ended(&mut self) {
    self.drag_in_progress = false;
    self.popup = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[test]
  fn toggle_same_marker_hides() {
    let mut selection = SelectionState::new();
    selection.toggle_popup("a");
    assert!(selection.is_shown("a"));
    selection.toggle_popup("a");
    assert_eq!(selection.shown(), None);
  }

  #[test]
  fn toggle_other_marker_replaces_directly() {
    let mut selection = SelectionState::new();
    selection.toggle_popup("a");
    selection.toggle_popup("b");
    assert!(selection.is_shown("b"));
    assert!(!selection.is_shown("a"));
  }

  #[rstest]
  #[case("a")]
  #[case("b")]
  fn drag_end_always_clears_popup(#[case] dragged: &str) {
    let mut selection = SelectionState::new();
    selection.toggle_popup("a");
    selection.drag_started();
    selection.drag_ended();
    assert_eq!(selection.shown(), None, "drag of {dragged} must clear");
    assert!(!selection.drag_in_progress());
  }

  #[test]
  fn toggle_during_drag_is_suppressed() {
    let mut selection = SelectionState::new();
    selection.drag_started();
    selection.toggle_popup("a");
    assert_eq!(selection.shown(), None);
    assert!(!selection.drag_in_progress());
    // The next toggle behaves normally again.
    selection.toggle_popup("a");
    assert!(selection.is_shown("a"));
  }

  #[test]
  fn explicit_close() {
    let mut selection = SelectionState::new();
    selection.toggle_popup("a");
    selection.close_popup();
    assert_eq!(selection.shown(), None);
  }
}
