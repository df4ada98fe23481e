use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

const BUILTIN_JSON: &str = include_str!("../data/emoji.json");

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z0-9_+-]+):").expect("shortcode rule must compile"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiEntry {
    pub emoji: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeMatch {
    pub range: Range<usize>,
    pub glyph: String,
}

/// Alias to glyph map with its reverse. When a glyph has several aliases the
/// first one in table order is the one written back out.
#[derive(Debug, Clone, Default)]
pub struct EmojiTable {
    aliases: Vec<(String, String)>,
    by_alias: HashMap<String, String>,
    by_glyph: HashMap<String, String>,
    glyphs: Vec<String>,
}

impl EmojiTable {
    pub fn new(entries: Vec<EmojiEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            for alias in entry.aliases {
                if alias.is_empty() {
                    continue;
                }
                table
                    .by_glyph
                    .entry(entry.emoji.clone())
                    .or_insert_with(|| alias.clone());
                table.by_alias.insert(alias.clone(), entry.emoji.clone());
                table.aliases.push((alias, entry.emoji.clone()));
            }
        }
        table.glyphs = table.by_glyph.keys().cloned().collect();
        table
            .glyphs
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        table
    }

    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_JSON).expect("builtin emoji table must be valid")
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let entries: Vec<EmojiEntry> = serde_json::from_str(json).map_err(EditorError::EmojiTable)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn glyph(&self, alias: &str) -> Option<&str> {
        self.by_alias.get(alias).map(String::as_str)
    }

    pub fn alias(&self, glyph: &str) -> Option<&str> {
        self.by_glyph.get(glyph).map(String::as_str)
    }

    pub fn expand<'a>(&'a self, alias: &'a str) -> &'a str {
        self.glyph(alias).unwrap_or(alias)
    }

    pub fn collapse<'a>(&'a self, glyph: &'a str) -> &'a str {
        self.alias(glyph).unwrap_or(glyph)
    }

    /// Aliases starting with `prefix`, in table order.
    pub fn search<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.aliases
            .iter()
            .filter(move |(alias, _)| alias.starts_with(prefix))
            .map(|(alias, glyph)| (alias.as_str(), glyph.as_str()))
    }

    /// Replaces every known `:alias:` with its glyph. Unknown shortcodes stay.
    pub fn expand_shortcodes(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for hit in self.shortcodes(text) {
            out.push_str(&text[last..hit.range.start]);
            out.push_str(&hit.glyph);
            last = hit.range.end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Replaces known glyphs with `:alias:`, longest glyph first.
    pub fn collapse_glyphs(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        'scan: while let Some(ch) = rest.chars().next() {
            for glyph in &self.glyphs {
                if rest.starts_with(glyph.as_str()) {
                    out.push(':');
                    out.push_str(&self.by_glyph[glyph]);
                    out.push(':');
                    rest = &rest[glyph.len()..];
                    continue 'scan;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }

    /// Earliest known shortcode in `text` (byte offsets).
    pub fn find_shortcode(&self, text: &str) -> Option<ShortcodeMatch> {
        self.shortcodes(text).next()
    }

    /// A known shortcode the caret sits in or directly after.
    pub fn shortcode_at(&self, text: &str, caret: usize) -> Option<ShortcodeMatch> {
        self.shortcodes(text)
            .take_while(|hit| hit.range.start < caret)
            .find(|hit| caret <= hit.range.end)
    }

    /// Known shortcodes left to right. An unknown `:word:` hands its closing
    /// colon on, so `12:30:fire:` still finds `:fire:`.
    fn shortcodes<'t>(&'t self, text: &'t str) -> impl Iterator<Item = ShortcodeMatch> + 't {
        let mut at = 0;
        std::iter::from_fn(move || {
            while let Some(caps) = SHORTCODE.captures_at(text, at) {
                let whole = caps.get(0)?;
                match self.glyph(&caps[1]) {
                    Some(glyph) => {
                        at = whole.end();
                        return Some(ShortcodeMatch {
                            range: whole.range(),
                            glyph: glyph.to_string(),
                        });
                    }
                    None => at = whole.end() - 1,
                }
            }
            None
        })
    }
}
