use serde::{Deserialize, Serialize};

use crate::emoji::EmojiEntry;
use crate::error::EditorError;
use crate::mention::Candidate;
use crate::pattern::PatternSpec;
use crate::shortcut::CharPair;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
    #[default]
    Auto,
}

/// Editor props. Every field is optional in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Controlled value; wins over `default_value`.
    pub value: Option<String>,
    pub default_value: Option<String>,
    pub users: Vec<Candidate>,
    pub placeholder: Option<String>,
    pub auto_focus: bool,
    pub disabled: bool,
    pub dir: TextDirection,
    pub max_undo: usize,
    pub drop_invalid_links: bool,
    /// `None` uses the built-in pairs, an empty list turns wrapping off.
    pub char_pairs: Option<Vec<CharPair>>,
    pub patterns: Option<Vec<PatternSpec>>,
    pub emoji: Option<Vec<EmojiEntry>>,
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        serde_json::from_str(json).map_err(EditorError::Config)
    }

    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }

    pub fn initial_value(&self) -> &str {
        self.value
            .as_deref()
            .or(self.default_value.as_deref())
            .unwrap_or_default()
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn users(mut self, users: Vec<Candidate>) -> Self {
        self.users = users;
        self
    }

    pub fn max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn drop_invalid_links(mut self, drop: bool) -> Self {
        self.drop_invalid_links = drop;
        self
    }

    pub fn emoji(mut self, entries: Vec<EmojiEntry>) -> Self {
        self.emoji = Some(entries);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_undo_means_default() {
        assert_eq!(EditorConfig::default().with_defaults().max_undo, 200);
        assert_eq!(EditorConfig::default().max_undo(5).with_defaults().max_undo, 5);
    }

    #[test]
    fn json_fields_are_optional() {
        let config = EditorConfig::from_json(
            r#"{ "default_value": "*hi*", "dir": "rtl", "users": [{ "id": "1", "name": "bob" }] }"#,
        )
        .unwrap();
        assert_eq!(config.initial_value(), "*hi*");
        assert_eq!(config.dir, TextDirection::Rtl);
        assert_eq!(config.users[0].image, None);
        assert!(config.patterns.is_none());
    }

    #[test]
    fn controlled_value_wins() {
        let config = EditorConfig::default().default_value("a").value("b");
        assert_eq!(config.initial_value(), "b");
    }
}
