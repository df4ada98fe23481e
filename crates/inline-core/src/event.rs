use serde::{Deserialize, Serialize};

pub const KEY_SPACE: &str = " ";
pub const KEY_ENTER: &str = "Enter";
pub const KEY_TAB: &str = "Tab";
pub const KEY_BACKSPACE: &str = "Backspace";
pub const KEY_DELETE: &str = "Delete";
pub const KEY_ESCAPE: &str = "Escape";
pub const KEY_ARROW_UP: &str = "ArrowUp";
pub const KEY_ARROW_DOWN: &str = "ArrowDown";

const MODIFIER_KEYS: &[&str] = &["Shift", "Alt", "Control", "Meta", "CapsLock", "AltGraph"];

/// A keystroke as reported by the host surface. `key` follows the DOM
/// `KeyboardEvent.key` naming; `code` is the physical key when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
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

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn is(&self, key: &str) -> bool {
        self.key == key
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn is_modifier_only(&self) -> bool {
        MODIFIER_KEYS.contains(&self.key.as_str())
    }

    /// The physical key code, derived from `key` for letters and digits when
    /// the host did not report one.
    pub fn physical_code(&self) -> Option<String> {
        if let Some(code) = &self.code {
            return Some(code.clone());
        }
        let mut chars = self.key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_ascii_alphabetic() {
            Some(format!("Key{}", ch.to_ascii_uppercase()))
        } else if ch.is_ascii_digit() {
            Some(format!("Digit{ch}"))
        } else {
            None
        }
    }

    pub fn is_undo(&self) -> bool {
        self.primary() && !self.shift && self.key.eq_ignore_ascii_case("z")
    }

    pub fn is_redo(&self) -> bool {
        self.primary()
            && (self.key.eq_ignore_ascii_case("y") || (self.shift && self.key.eq_ignore_ascii_case("z")))
    }

    /// The text a plain keystroke types, if any. Tab is left to the host.
    pub fn typed_text(&self) -> Option<&str> {
        if self.primary() || self.alt || self.key.chars().count() != 1 {
            return None;
        }
        Some(&self.key)
    }
}

/// Edits that reach the surface without going through a keystroke (paste,
/// IME commit, context menu).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum InputEvent {
    InsertText { text: String },
    InsertLineBreak,
    DeleteBackward,
    DeleteForward,
}

impl InputEvent {
    pub fn insert_text(text: impl Into<String>) -> Self {
        InputEvent::InsertText { text: text.into() }
    }
}
