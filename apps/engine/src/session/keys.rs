//! Keyboard-binding contract for the host surface.
//!
//! The engine does not listen for key events itself — the host resolves a
//! chord to a [`KeyCommand`] and dispatches it via
//! `EditorSession::handle_key`. Key names follow the DOM `KeyboardEvent.key`
//! convention the editing surface already speaks.

use serde::{Deserialize, Serialize};

/// The four session commands with default keyboard bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCommand {
    /// Ctrl/Cmd+S — immediate save, bypassing the debounce window.
    Save,
    /// Ctrl/Cmd+ArrowLeft or PageUp.
    PreviousPage,
    /// Ctrl/Cmd+ArrowRight or PageDown.
    NextPage,
    /// Ctrl/Cmd+G — generate into the current page.
    Generate,
}

/// A pressed chord as reported by the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord<'a> {
    pub key: &'a str,
    pub ctrl_or_cmd: bool,
}

/// Resolves a chord against the default bindings.
pub fn resolve(chord: KeyChord<'_>) -> Option<KeyCommand> {
    if chord.ctrl_or_cmd {
        if chord.key.eq_ignore_ascii_case("s") {
            return Some(KeyCommand::Save);
        }
        if chord.key.eq_ignore_ascii_case("g") {
            return Some(KeyCommand::Generate);
        }
        if chord.key == "ArrowLeft" {
            return Some(KeyCommand::PreviousPage);
        }
        if chord.key == "ArrowRight" {
            return Some(KeyCommand::NextPage);
        }
    }
    match chord.key {
        "PageUp" => Some(KeyCommand::PreviousPage),
        "PageDown" => Some(KeyCommand::NextPage),
        _ => None,
    }
}
