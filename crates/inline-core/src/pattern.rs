use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::shortcut::Shortcut;
use crate::tree::LinkKind;

/// Every construct the inline grammar knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "blockquote")]
    Blockquote,
    #[serde(rename = "pre")]
    CodeBlock,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "u")]
    Underline,
    #[serde(rename = "i")]
    Italic,
    #[serde(rename = "s")]
    Strike,
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "hr")]
    Rule,
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "h2")]
    H2,
    #[serde(rename = "h3")]
    H3,
    #[serde(rename = "h4")]
    H4,
    #[serde(rename = "h5")]
    H5,
    #[serde(rename = "h6")]
    H6,
    #[serde(rename = "li")]
    ListItem,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Blockquote => "blockquote",
            Tag::CodeBlock => "pre",
            Tag::Code => "code",
            Tag::Underline => "u",
            Tag::Italic => "i",
            Tag::Strike => "s",
            Tag::Strong => "strong",
            Tag::Rule => "hr",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::ListItem => "li",
        }
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }

    /// Only eligible at the start of a line.
    pub fn is_line_level(self) -> bool {
        matches!(self, Tag::Blockquote | Tag::ListItem) || self.heading_level().is_some()
    }

    /// Content is kept verbatim: no nested parsing and no emoji substitution.
    pub fn is_literal(self) -> bool {
        matches!(self, Tag::Code | Tag::CodeBlock)
    }

    pub fn is_void(self) -> bool {
        matches!(self, Tag::Rule)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One syntax rule: a tag, the text rule that recognizes it and the markers
/// used to write it back out.
#[derive(Debug, Clone)]
pub struct Pattern {
    tag: Tag,
    rule: Regex,
    open: String,
    close: String,
    shortcut: Option<Shortcut>,
}

impl Pattern {
    pub fn new(
        tag: Tag,
        rule: &str,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Result<Self, EditorError> {
        let rule = Regex::new(rule).map_err(|source| EditorError::InvalidRule { tag, source })?;
        let groups = rule.captures_len() - 1;
        if groups > 1 {
            return Err(EditorError::CaptureCount { tag, found: groups });
        }
        if groups == 0 && !tag.is_void() {
            return Err(EditorError::MissingCapture { tag });
        }
        Ok(Self {
            tag,
            rule,
            open: open.into(),
            close: close.into(),
            shortcut: None,
        })
    }

    pub fn with_shortcut(mut self, shortcut: &str) -> Result<Self, EditorError> {
        self.shortcut = Some(Shortcut::parse(shortcut)?);
        Ok(self)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn rule(&self) -> &Regex {
        &self.rule
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    pub fn shortcut(&self) -> Option<&Shortcut> {
        self.shortcut.as_ref()
    }

    /// First non-empty match of this rule that is allowed to start where it
    /// starts. Offsets are byte offsets into `text`.
    fn find_eligible(&self, text: &str, at_line_start: bool) -> Option<(Range<usize>, Option<Range<usize>>)> {
        for caps in self.rule.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.is_empty() {
                continue;
            }
            if self.tag.is_line_level() && !starts_line(text, whole.start(), at_line_start) {
                continue;
            }
            let inner = caps.get(1).map(|m| m.range());
            return Some((whole.range(), inner));
        }
        None
    }
}

/// Serializable description of a pattern, used by configuration overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub tag: Tag,
    pub rule: String,
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

impl PatternSpec {
    pub fn into_pattern(self) -> Result<Pattern, EditorError> {
        let pattern = Pattern::new(self.tag, &self.rule, self.open, self.close)?;
        match self.shortcut.as_deref() {
            Some(shortcut) if !shortcut.trim().is_empty() => pattern.with_shortcut(shortcut),
            _ => Ok(pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Position of the winning pattern in the registry.
    pub index: usize,
    pub tag: Tag,
    pub start: usize,
    pub end: usize,
    pub inner: Option<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    pub start: usize,
    pub end: usize,
    pub label: Range<usize>,
    pub href: Range<usize>,
    pub kind: LinkKind,
}

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)").expect("markdown link rule must compile")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bhttps?://[^\s<>"'`()\[\]]+"#).expect("bare url rule must compile")
});

pub(crate) const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

const BUILTIN: &[(Tag, &str, &str, &str, Option<&str>)] = &[
    (Tag::Blockquote, r"(?m)^> (\S.*)$", "> ", "", Some("ctrl+shift+q")),
    (Tag::CodeBlock, r"(?s)```\n(.+?)\n```", "```\n", "\n```", Some("ctrl+shift+`")),
    (Tag::Code, r"`([^`\n]+)`", "`", "`", Some("ctrl+`")),
    (Tag::Underline, r"__([^_\n]+)__", "__", "__", Some("ctrl+u")),
    (Tag::Italic, r"_([^_\n]+)_", "_", "_", Some("ctrl+i")),
    (Tag::Strike, r"~([^~\n]+)~", "~", "~", Some("ctrl+shift+x")),
    (Tag::Strong, r"\*([^*\n]+)\*", "*", "*", Some("ctrl+b")),
    (Tag::Rule, r"___", "___", "", None),
    (Tag::Rule, r"---", "---", "", None),
    (Tag::H6, r"(?m)^###### (\S.*)$", "###### ", "", Some("ctrl+shift+6")),
    (Tag::H5, r"(?m)^##### (\S.*)$", "##### ", "", Some("ctrl+shift+5")),
    (Tag::H4, r"(?m)^#### (\S.*)$", "#### ", "", Some("ctrl+shift+4")),
    (Tag::H3, r"(?m)^### (\S.*)$", "### ", "", Some("ctrl+shift+3")),
    (Tag::H2, r"(?m)^## (\S.*)$", "## ", "", Some("ctrl+shift+2")),
    (Tag::H1, r"(?m)^# (\S.*)$", "# ", "", Some("ctrl+shift+1")),
    (Tag::ListItem, r"(?m)^- (\S.*)$", "- ", "", Some("ctrl+shift+8")),
];

/// Ordered table of syntax rules. Earliest start wins, registry order breaks
/// ties.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
}

impl PatternRegistry {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    pub fn builtin() -> Self {
        let patterns = BUILTIN
            .iter()
            .map(|&(tag, rule, open, close, shortcut)| {
                let pattern = Pattern::new(tag, rule, open, close)?;
                match shortcut {
                    Some(shortcut) => pattern.with_shortcut(shortcut),
                    None => Ok(pattern),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .expect("builtin patterns must be valid");
        Self::new(patterns)
    }

    pub fn from_specs(specs: impl IntoIterator<Item = PatternSpec>) -> Result<Self, EditorError> {
        let patterns = specs
            .into_iter()
            .map(PatternSpec::into_pattern)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn lookup(&self, tag: Tag) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.tag == tag)
    }

    /// `Some(index)` when the pattern at `index` is an alias, i.e. not the
    /// first pattern registered for its tag.
    pub fn alias(&self, index: usize) -> Option<usize> {
        let tag = self.patterns.get(index)?.tag;
        let first = self.patterns.iter().position(|p| p.tag == tag)?;
        (first != index).then_some(index)
    }

    /// The pattern an element of `tag` is written back with: the recorded
    /// alias while it still names a `tag` pattern, else the first one.
    pub fn writer(&self, tag: Tag, alias: Option<usize>) -> Option<&Pattern> {
        alias
            .and_then(|index| self.patterns.get(index))
            .filter(|p| p.tag == tag)
            .or_else(|| self.lookup(tag))
    }

    /// Earliest match across all patterns. `at_line_start` says whether byte 0
    /// of `text` sits at the start of a line in the surrounding document.
    pub fn find(&self, text: &str, at_line_start: bool) -> Option<PatternMatch> {
        self.find_where(text, at_line_start, |_| true)
    }

    /// Like [`PatternRegistry::find`], restricted to tags `accept` allows.
    pub fn find_where(
        &self,
        text: &str,
        at_line_start: bool,
        accept: impl Fn(Tag) -> bool,
    ) -> Option<PatternMatch> {
        let mut best: Option<PatternMatch> = None;
        for (index, pattern) in self.patterns.iter().enumerate() {
            if !accept(pattern.tag) {
                continue;
            }
            let Some((whole, inner)) = pattern.find_eligible(text, at_line_start) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| whole.start < b.start) {
                best = Some(PatternMatch {
                    index,
                    tag: pattern.tag,
                    start: whole.start,
                    end: whole.end,
                    inner,
                });
            }
        }
        best
    }

    /// Earliest markdown link or bare `http(s)://` URL. Markdown wins ties.
    pub fn find_link(&self, text: &str) -> Option<LinkMatch> {
        let markdown = MARKDOWN_LINK.captures(text).and_then(|caps| {
            let whole = caps.get(0)?;
            Some(LinkMatch {
                start: whole.start(),
                end: whole.end(),
                label: caps.get(1)?.range(),
                href: caps.get(2)?.range(),
                kind: LinkKind::Labeled,
            })
        });

        let bare = BARE_URL.find_iter(text).find_map(|m| {
            let trimmed = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if !trimmed.contains("://") || trimmed.ends_with("://") {
                return None;
            }
            let end = m.start() + trimmed.len();
            Some(LinkMatch {
                start: m.start(),
                end,
                label: m.start()..end,
                href: m.start()..end,
                kind: LinkKind::Url,
            })
        });

        match (markdown, bare) {
            (Some(md), Some(url)) if url.start < md.start => Some(url),
            (Some(md), _) => Some(md),
            (None, url) => url,
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn starts_line(text: &str, ix: usize, at_line_start: bool) -> bool {
    if ix == 0 {
        at_line_start
    } else {
        text[..ix].ends_with('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_start_beats_registry_order() {
        let registry = PatternRegistry::builtin();
        let m = registry.find("a *b* _c_", true).unwrap();
        assert_eq!(m.tag, Tag::Strong);
        assert_eq!(m.start, 2);
    }

    #[test]
    fn registry_order_breaks_ties() {
        let registry = PatternRegistry::new(vec![
            Pattern::new(Tag::Italic, r"\*([^*]+)\*", "*", "*").unwrap(),
            Pattern::new(Tag::Strong, r"\*\*?([^*]+)\*", "*", "*").unwrap(),
        ]);
        let m = registry.find("*x*", true).unwrap();
        assert_eq!(m.tag, Tag::Italic);
        assert_eq!(m.index, 0);

        let builtin = PatternRegistry::builtin();
        assert_eq!(builtin.find("__x__", true).unwrap().tag, Tag::Underline);
    }

    #[test]
    fn headings_need_a_line_start() {
        let registry = PatternRegistry::builtin();
        assert!(registry.find("# title", false).is_none());
        let m = registry.find("intro\n# title", false).unwrap();
        assert_eq!(m.tag, Tag::H1);
        assert_eq!(m.start, 6);
        assert_eq!(m.inner, Some(8..13));
    }

    #[test]
    fn rule_has_no_inner() {
        let registry = PatternRegistry::builtin();
        let m = registry.find("___", true).unwrap();
        assert_eq!(m.tag, Tag::Rule);
        assert_eq!(m.inner, None);
        assert_eq!(registry.lookup(Tag::Rule).unwrap().open(), "___");
    }

    #[test]
    fn dashed_rule_is_an_alias() {
        let registry = PatternRegistry::builtin();
        let m = registry.find("a --- b", false).unwrap();
        assert_eq!(m.tag, Tag::Rule);
        let alias = registry.alias(m.index);
        assert_eq!(alias, Some(m.index));
        assert_eq!(registry.writer(Tag::Rule, alias).unwrap().open(), "---");
        assert_eq!(registry.writer(Tag::Rule, None).unwrap().open(), "___");

        let plain = registry.find("a ___ b", false).unwrap();
        assert_eq!(registry.alias(plain.index), None);
    }

    #[test]
    fn bare_url_drops_trailing_punctuation() {
        let registry = PatternRegistry::builtin();
        let text = "see https://example.com/a.";
        let m = registry.find_link(text).unwrap();
        assert_eq!(&text[m.href.clone()], "https://example.com/a");
        assert_eq!(m.kind, LinkKind::Url);
    }

    #[test]
    fn pattern_rejects_two_captures() {
        let err = Pattern::new(Tag::Strong, r"(a)(b)", "*", "*").unwrap_err();
        assert!(matches!(err, EditorError::CaptureCount { found: 2, .. }));
    }
}
