use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorCommand {
    Undo,
    Redo,
    DuplicateSelection,
    DeleteSelection,
    SelectAll,
    ClearSelection,
    /// Handled by the renderer, not the editing core
    FitView,
}

impl EditorCommand {
    pub fn name(self) -> &'static str {
        match self {
            EditorCommand::Undo => "undo",
            EditorCommand::Redo => "redo",
            EditorCommand::DuplicateSelection => "duplicateSelection",
            EditorCommand::DeleteSelection => "deleteSelection",
            EditorCommand::SelectAll => "selectAll",
            EditorCommand::ClearSelection => "clearSelection",
            EditorCommand::FitView => "fitView",
        }
    }
}

/// A key press as reported by a browser `KeyboardEvent`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        KeyChord {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl on Linux/Windows, Cmd on macOS
    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Map a key press to an editor command. Nothing fires while the user is
/// typing in a text control.
pub fn resolve(chord: &KeyChord, editing_text: bool) -> Option<EditorCommand> {
    if editing_text || chord.alt {
        return None;
    }
    let key = chord.key.to_ascii_lowercase();
    if chord.command() {
        return match key.as_str() {
            "z" if chord.shift => Some(EditorCommand::Redo),
            "z" => Some(EditorCommand::Undo),
            "y" => Some(EditorCommand::Redo),
            "d" if !chord.shift => Some(EditorCommand::DuplicateSelection),
            "a" if !chord.shift => Some(EditorCommand::SelectAll),
            "f" if !chord.shift => Some(EditorCommand::FitView),
            _ => None,
        };
    }
    match key.as_str() {
        "delete" | "backspace" => Some(EditorCommand::DeleteSelection),
        "escape" => Some(EditorCommand::ClearSelection),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_table() {
        let cases = [
            (KeyChord::new("z").ctrl(), Some(EditorCommand::Undo)),
            (KeyChord::new("z").meta(), Some(EditorCommand::Undo)),
            (KeyChord::new("Z").ctrl().shift(), Some(EditorCommand::Redo)),
            (KeyChord::new("y").meta(), Some(EditorCommand::Redo)),
            (KeyChord::new("d").ctrl(), Some(EditorCommand::DuplicateSelection)),
            (KeyChord::new("a").meta(), Some(EditorCommand::SelectAll)),
            (KeyChord::new("f").ctrl(), Some(EditorCommand::FitView)),
            (KeyChord::new("Delete"), Some(EditorCommand::DeleteSelection)),
            (KeyChord::new("Backspace"), Some(EditorCommand::DeleteSelection)),
            (KeyChord::new("Escape"), Some(EditorCommand::ClearSelection)),
            (KeyChord::new("z"), None),
            (KeyChord::new("q").ctrl(), None),
        ];
        for (chord, want) in cases {
            assert_eq!(resolve(&chord, false), want, "{:?}", chord);
        }
    }

    #[test]
    fn test_text_focus_suppresses_everything() {
        assert_eq!(resolve(&KeyChord::new("z").ctrl(), true), None);
        assert_eq!(resolve(&KeyChord::new("Backspace"), true), None);
    }
}
