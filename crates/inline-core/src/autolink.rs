use std::sync::LazyLock;

use regex::Regex;

use crate::markup::is_word_char;
use crate::pattern::TRAILING_PUNCTUATION;
use crate::serialize::strip_placeholders;
use crate::tree::{LinkKind, Node, NodeKind, Point, Tree, byte_index, char_index};

static MARKDOWN_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)$").expect("markdown link rule must compile")
});

static SCHEME_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(tel:|mailto:)(\S+)$").expect("scheme rule must compile"));

static URL_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?:https?://|www\.)[^\s<]+|(?:[a-z0-9-]+\.)+[a-z]{2,}(?:/\S*)?)$")
        .expect("url rule must compile")
});

static VALID_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z0-9-]+\.)+[a-z]{2,}(?::\d+)?(?:[/?#]\S*)?$")
        .expect("url validation rule must compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLink {
    /// Char range of the token in the run.
    pub start: usize,
    pub end: usize,
    pub href: String,
    pub label: String,
    pub kind: LinkKind,
}

/// Finds a link token ending at the end of `typed` (trailing whitespace
/// ignored). Markdown links win over `tel:`/`mailto:` tokens, which win over
/// URLs and bare domains.
pub fn detect(typed: &str) -> Option<DetectedLink> {
    let typed = typed.trim_end();

    if let Some(caps) = MARKDOWN_TAIL.captures(typed) {
        let whole = caps.get(0)?;
        return Some(DetectedLink {
            start: char_index(typed, whole.start()),
            end: char_index(typed, whole.end()),
            href: caps[2].to_string(),
            label: caps[1].to_string(),
            kind: LinkKind::Labeled,
        });
    }

    if let Some(caps) = SCHEME_TAIL.captures(typed) {
        let whole = caps.get(0)?;
        if at_token_start(typed, whole.start()) {
            let scheme = caps[1].to_lowercase();
            return Some(DetectedLink {
                start: char_index(typed, whole.start()),
                end: char_index(typed, whole.end()),
                href: format!("{scheme}{}", &caps[2]),
                label: caps[2].to_string(),
                kind: LinkKind::Scheme,
            });
        }
    }

    let m = URL_TAIL.find(typed)?;
    if !at_token_start(typed, m.start()) {
        return None;
    }
    let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
    if !URL_TAIL.is_match(url) {
        return None;
    }
    Some(DetectedLink {
        start: char_index(typed, m.start()),
        end: char_index(typed, m.start() + url.len()),
        href: with_scheme(url),
        label: url.to_string(),
        kind: LinkKind::Url,
    })
}

/// Turns a link token before the caret into a link node. Returns the caret,
/// placed after the link.
pub fn link_at_caret(tree: &mut Tree, caret: Point) -> Option<Point> {
    let run = caret.node;
    if tree.is_in_literal(run) || tree.enclosing_link(run).is_some() {
        return None;
    }
    let text = tree.text(run)?.to_string();
    let found = detect(&text[..byte_index(&text, caret.offset)])?;

    let link = tree.graft(&Node::link(&found.href, found.kind, &found.label));
    let tail = tree.splice_run(run, found.start..found.end, &[link]);
    tracing::debug!(href = %found.href, kind = ?found.kind, "auto-linked token");
    Some(Point::new(tail, caret.offset.saturating_sub(found.end)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSync {
    Updated,
    Kept,
    Dropped,
}

/// Re-derives the target of a `url`/`scheme` link holding the caret from its
/// visible text.
pub fn sync_link(tree: &mut Tree, caret: Point, drop_invalid: bool) -> Option<LinkSync> {
    let link = tree.enclosing_link(caret.node)?;
    let NodeKind::Link { href, kind } = tree.kind(link).clone() else {
        return None;
    };
    let visible = strip_placeholders(&tree.export(link).map(|node| node.visible_text()).unwrap_or_default());

    let next = match kind {
        LinkKind::Labeled => return None,
        LinkKind::Url => is_valid_url(&visible).then(|| with_scheme(&visible)),
        LinkKind::Scheme => {
            let scheme = href.split_once(':').map_or("", |(scheme, _)| scheme);
            (!visible.is_empty() && !visible.contains(char::is_whitespace))
                .then(|| format!("{scheme}:{visible}"))
        }
    };

    match next {
        Some(next) if next == href => None,
        Some(next) => {
            if let NodeKind::Link { href, .. } = tree.kind_mut(link) {
                *href = next;
            }
            Some(LinkSync::Updated)
        }
        None if drop_invalid => {
            tree.unwrap_node(link);
            tracing::debug!(text = %visible, "dropped link with invalid text");
            Some(LinkSync::Dropped)
        }
        None => {
            tracing::debug!(text = %visible, %href, "kept stale link target");
            Some(LinkSync::Kept)
        }
    }
}

pub fn is_valid_url(text: &str) -> bool {
    VALID_URL.is_match(text)
}

fn with_scheme(url: &str) -> String {
    if url.to_ascii_lowercase().starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn at_token_start(text: &str, ix: usize) -> bool {
    match text[..ix].chars().next_back() {
        None => true,
        Some(prev) => !is_word_char(prev) && !matches!(prev, '@' | '.' | '-' | '/' | ':'),
    }
}
