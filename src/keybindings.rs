//! Customizable keybindings for the editor actions.
//!
//! Bindings pair an [`egui::Key`] with an optional Ctrl modifier and
//! map onto the semantic [`Action`]s the controller understands. The
//! configuration layer stores them as display strings like `Ctrl+Z`.

use egui::{Key, Modifiers};

/// A semantic editor action that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pop the undo history
    Undo,
    /// Finalize the in-progress polygon
    Finalize,
    /// Discard the in-progress polygon or crop rectangle
    Cancel,
    /// Delete the selected or most recent annotation
    Delete,
    /// Export and restart with a fresh image
    Save,
    /// Pick a new image to annotate
    OpenImage,
    /// Switch to the select tool
    SelectMode,
    /// Switch to the polygon tool
    PolygonMode,
    /// Switch to the crop tool
    CropMode,
    /// Toggle the crop aspect-ratio lock
    ToggleAspectLock,
}

impl Action {
    /// Display name for the action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Undo => "Undo",
            Action::Finalize => "Finalize polygon",
            Action::Cancel => "Cancel",
            Action::Delete => "Delete",
            Action::Save => "Save and restart",
            Action::OpenImage => "Open image",
            Action::SelectMode => "Select tool",
            Action::PolygonMode => "Polygon tool",
            Action::CropMode => "Crop tool",
            Action::ToggleAspectLock => "Toggle aspect lock",
        }
    }

    /// All bindable actions, in settings-panel order.
    pub fn all() -> &'static [Action] {
        &[
            Action::Undo,
            Action::Finalize,
            Action::Cancel,
            Action::Delete,
            Action::Save,
            Action::OpenImage,
            Action::SelectMode,
            Action::PolygonMode,
            Action::CropMode,
            Action::ToggleAspectLock,
        ]
    }
}

/// A key plus its Ctrl modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub ctrl: bool,
    pub key: Key,
}

impl KeyChord {
    pub const fn plain(key: Key) -> Self {
        Self { ctrl: false, key }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self { ctrl: true, key }
    }

    /// Whether a key press with the given modifiers triggers this chord.
    pub fn matches(&self, modifiers: Modifiers, key: Key) -> bool {
        key == self.key && modifiers.ctrl == self.ctrl
    }

    /// Display string, e.g. `Ctrl+Z` or `Escape`.
    pub fn label(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key.name())
        } else {
            self.key.name().to_string()
        }
    }

    /// Parse a display string produced by [`KeyChord::label`].
    pub fn parse(text: &str) -> Option<Self> {
        let (ctrl, name) = match text.strip_prefix("Ctrl+") {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        Key::from_name(name).map(|key| Self { ctrl, key })
    }
}

/// Keybinding configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub undo: KeyChord,
    pub finalize: KeyChord,
    pub cancel: KeyChord,
    pub delete: KeyChord,
    pub save: KeyChord,
    pub open_image: KeyChord,
    pub select_mode: KeyChord,
    pub polygon_mode: KeyChord,
    pub crop_mode: KeyChord,
    pub toggle_aspect: KeyChord,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            undo: KeyChord::ctrl(Key::Z),
            finalize: KeyChord::plain(Key::Enter),
            cancel: KeyChord::plain(Key::Escape),
            delete: KeyChord::plain(Key::Delete),
            save: KeyChord::ctrl(Key::S),
            open_image: KeyChord::ctrl(Key::O),
            select_mode: KeyChord::plain(Key::S),
            polygon_mode: KeyChord::plain(Key::P),
            crop_mode: KeyChord::plain(Key::C),
            toggle_aspect: KeyChord::plain(Key::A),
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The action triggered by a key press, if any.
    pub fn action_for(&self, modifiers: Modifiers, key: Key) -> Option<Action> {
        Action::all()
            .iter()
            .copied()
            .find(|&action| self.chord_for(action).matches(modifiers, key))
    }

    /// The chord currently bound to an action.
    pub fn chord_for(&self, action: Action) -> KeyChord {
        match action {
            Action::Undo => self.undo,
            Action::Finalize => self.finalize,
            Action::Cancel => self.cancel,
            Action::Delete => self.delete,
            Action::Save => self.save,
            Action::OpenImage => self.open_image,
            Action::SelectMode => self.select_mode,
            Action::PolygonMode => self.polygon_mode,
            Action::CropMode => self.crop_mode,
            Action::ToggleAspectLock => self.toggle_aspect,
        }
    }

    /// Rebind an action.
    pub fn set_chord(&mut self, action: Action, chord: KeyChord) {
        match action {
            Action::Undo => self.undo = chord,
            Action::Finalize => self.finalize = chord,
            Action::Cancel => self.cancel = chord,
            Action::Delete => self.delete = chord,
            Action::Save => self.save = chord,
            Action::OpenImage => self.open_image = chord,
            Action::SelectMode => self.select_mode = chord,
            Action::PolygonMode => self.polygon_mode = chord,
            Action::CropMode => self.crop_mode = chord,
            Action::ToggleAspectLock => self.toggle_aspect = chord,
        }
    }

    /// Check whether a chord is already taken by another action.
    /// Returns the conflicting action, if any.
    pub fn conflict(&self, chord: KeyChord, exclude: Option<Action>) -> Option<Action> {
        Action::all()
            .iter()
            .copied()
            .filter(|&action| Some(action) != exclude)
            .find(|&action| self.chord_for(action) == chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_actions() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.action_for(Modifiers::CTRL, Key::Z),
            Some(Action::Undo)
        );
        assert_eq!(
            bindings.action_for(Modifiers::NONE, Key::Enter),
            Some(Action::Finalize)
        );
        assert_eq!(
            bindings.action_for(Modifiers::NONE, Key::P),
            Some(Action::PolygonMode)
        );
        assert_eq!(bindings.action_for(Modifiers::NONE, Key::F1), None);
    }

    #[test]
    fn test_ctrl_modifier_distinguishes_chords() {
        let bindings = KeyBindings::new();
        // S alone is the select tool; Ctrl+S is save
        assert_eq!(
            bindings.action_for(Modifiers::NONE, Key::S),
            Some(Action::SelectMode)
        );
        assert_eq!(
            bindings.action_for(Modifiers::CTRL, Key::S),
            Some(Action::Save)
        );
        // Plain Z is not undo
        assert_eq!(bindings.action_for(Modifiers::NONE, Key::Z), None);
    }

    #[test]
    fn test_label_parse_round_trip() {
        for &action in Action::all() {
            let chord = KeyBindings::new().chord_for(action);
            assert_eq!(KeyChord::parse(&chord.label()), Some(chord));
        }
        assert_eq!(KeyChord::parse("Ctrl+Q"), Some(KeyChord::ctrl(Key::Q)));
        assert_eq!(KeyChord::parse("garbage"), None);
    }

    #[test]
    fn test_conflict_detection() {
        let mut bindings = KeyBindings::new();
        assert_eq!(
            bindings.conflict(KeyChord::ctrl(Key::Z), None),
            Some(Action::Undo)
        );
        assert_eq!(
            bindings.conflict(KeyChord::ctrl(Key::Z), Some(Action::Undo)),
            None
        );
        assert_eq!(bindings.conflict(KeyChord::plain(Key::Q), None), None);

        bindings.set_chord(Action::Delete, KeyChord::plain(Key::X));
        assert_eq!(
            bindings.conflict(KeyChord::plain(Key::X), None),
            Some(Action::Delete)
        );
    }
}
