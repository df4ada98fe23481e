use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::event::KeyEvent;
use crate::pattern::{Pattern, PatternRegistry, Tag};
use crate::tree::{NodeKind, PLACEHOLDER, Point, Tree, byte_index, char_len};

/// A parsed `[ctrl|meta]+[shift]+key` chord. Every shortcut requires the
/// primary modifier (Ctrl, or Cmd on macOS) so plain typing never fires one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    shift: bool,
    key: String,
}

const SYMBOL_CODES: &[(char, &str)] = &[
    ('`', "Backquote"),
    ('-', "Minus"),
    ('=', "Equal"),
    ('[', "BracketLeft"),
    (']', "BracketRight"),
    ('\\', "Backslash"),
    (';', "Semicolon"),
    ('\'', "Quote"),
    (',', "Comma"),
    ('.', "Period"),
    ('/', "Slash"),
];

impl Shortcut {
    pub fn parse(value: &str) -> Result<Self, EditorError> {
        let cleaned: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let mut shift = false;
        let mut key = None;
        for part in cleaned.split('+') {
            match part {
                "ctrl" | "control" | "meta" | "cmd" | "command" | "mod" => {}
                "shift" => shift = true,
                "" => {}
                other => key = Some(other.to_string()),
            }
        }
        if key.is_none() && cleaned.ends_with("++") {
            key = Some("+".to_string());
        }
        let key = key.ok_or_else(|| EditorError::InvalidShortcut(value.to_string()))?;
        Ok(Self { shift, key })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    /// Letters and digits match the physical key so layouts and Shift do not
    /// change them; other keys match the produced key value or its code.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if !event.primary() || event.shift != self.shift {
            return false;
        }
        let mut chars = self.key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return event.key.eq_ignore_ascii_case(&self.key);
        };

        let code = event.physical_code();
        if ch.is_ascii_alphabetic() {
            return code.is_some_and(|code| code.eq_ignore_ascii_case(&format!("key{ch}")));
        }
        if ch.is_ascii_digit() {
            return code.is_some_and(|code| code.eq_ignore_ascii_case(&format!("digit{ch}")));
        }
        if event.key.eq_ignore_ascii_case(&self.key) {
            return true;
        }
        SYMBOL_CODES
            .iter()
            .find(|(symbol, _)| *symbol == ch)
            .is_some_and(|(_, name)| code.as_deref() == Some(*name))
    }

    /// Human readable form, e.g. `Ctrl+Shift+X` or `⌘⇧X`.
    pub fn label(&self, mac: bool) -> String {
        let key = self.key.to_uppercase();
        match (mac, self.shift) {
            (true, true) => format!("⌘⇧{key}"),
            (true, false) => format!("⌘{key}"),
            (false, true) => format!("Ctrl+Shift+{key}"),
            (false, false) => format!("Ctrl+{key}"),
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label(false))
    }
}

/// First pattern, in registry order, whose shortcut matches the chord.
pub fn find_shortcut<'a>(registry: &'a PatternRegistry, event: &KeyEvent) -> Option<&'a Pattern> {
    registry
        .patterns()
        .iter()
        .find(|pattern| pattern.shortcut().is_some_and(|s| s.matches(event)))
}

/// Replaces the selected raw text with an element of `tag` followed by a
/// placeholder run. Returns the caret, collapsed after the placeholder.
pub fn wrap_selection(tree: &mut Tree, range: Range<usize>, tag: Tag) -> Point {
    let raw = slice_chars(&tree.linear_text(), range.clone());
    tree.delete_range(range.start, range.end);
    tree.prune_empty();

    let at = tree.resolve(range.start);
    let element = tree.create(NodeKind::Element(tag, None));
    if !tag.is_void() {
        let inner = tree.create_text(raw);
        tree.append(element, inner);
    }
    let placeholder = tree.create_text(PLACEHOLDER.to_string());
    tree.splice_run(at.node, at.offset..at.offset, &[element, placeholder]);
    tracing::debug!(%tag, start = range.start, end = range.end, "wrapped selection");
    Point::new(placeholder, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharPair {
    pub open: char,
    pub close: char,
}

impl CharPair {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

pub const DEFAULT_PAIRS: &[CharPair] = &[
    CharPair::new('`', '`'),
    CharPair::new('\'', '\''),
    CharPair::new('"', '"'),
    CharPair::new('(', ')'),
    CharPair::new('[', ']'),
    CharPair::new('{', '}'),
    CharPair::new('<', '>'),
    CharPair::new('*', '*'),
    CharPair::new('~', '~'),
    CharPair::new('-', '-'),
    CharPair::new('_', '_'),
];

pub fn pair_for(pairs: &[CharPair], key: &str) -> Option<CharPair> {
    let mut chars = key.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return None;
    };
    pairs.iter().copied().find(|pair| pair.open == ch)
}

/// Surrounds the selected text with the pair as raw text and returns the new
/// selection, covering the wrapped text between the markers.
pub fn wrap_pair(tree: &mut Tree, range: Range<usize>, pair: CharPair) -> Range<usize> {
    let raw = slice_chars(&tree.linear_text(), range.clone());
    tree.delete_range(range.start, range.end);
    let at = tree.resolve(range.start);
    let wrapped = format!("{}{raw}{}", pair.open, pair.close);
    tree.insert_text(at, &wrapped);
    let start = range.start + 1;
    start..start + char_len(&raw)
}

fn slice_chars(text: &str, range: Range<usize>) -> String {
    let start = byte_index(text, range.start);
    let end = byte_index(text, range.end.max(range.start));
    text[start..end].to_string()
}
