use thiserror::Error;

use crate::pattern::Tag;

/// Failures raised while building an editor, a registry or a table.
///
/// Editing operations themselves never fail: malformed markup stays literal
/// text and out-of-range requests are skipped.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid rule for <{tag}>: {source}")]
    InvalidRule {
        tag: Tag,
        #[source]
        source: regex::Error,
    },

    #[error("rule for <{tag}> has {found} capture groups, at most one is allowed")]
    CaptureCount { tag: Tag, found: usize },

    #[error("rule for <{tag}> must capture its inner content")]
    MissingCapture { tag: Tag },

    #[error("invalid shortcut {0:?}: no key")]
    InvalidShortcut(String),

    #[error("invalid emoji table: {0}")]
    EmojiTable(#[source] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[source] serde_json::Error),
}
