use std::ops::Range;

use crate::emoji::EmojiTable;
use crate::mention::Candidate;
use crate::pattern::{PatternMatch, PatternRegistry};
use crate::tree::Node;

/// Earliest-match parser for canonical markup.
///
/// Competitors at one position are tried in this order: registry patterns
/// (in registry order), link rules, emoji shortcodes, mentions. Text no rule
/// claims stays literal.
#[derive(Debug, Clone, Copy)]
pub struct MarkupParser<'a> {
    registry: &'a PatternRegistry,
    emoji: Option<&'a EmojiTable>,
    users: &'a [Candidate],
    links: bool,
}

enum Token {
    Node(Node),
    Text(String),
}

struct Hit {
    start: usize,
    end: usize,
    token: Token,
}

impl<'a> MarkupParser<'a> {
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self {
            registry,
            emoji: None,
            users: &[],
            links: false,
        }
    }

    pub fn with_emoji(mut self, emoji: &'a EmojiTable) -> Self {
        self.emoji = Some(emoji);
        self
    }

    pub fn with_users(mut self, users: &'a [Candidate]) -> Self {
        self.users = users;
        self
    }

    pub fn with_links(mut self) -> Self {
        self.links = true;
        self
    }

    pub fn parse(&self, text: &str) -> Vec<Node> {
        self.parse_at(text, true)
    }

    /// Parses `text` whose first byte does (or does not) start a line.
    pub fn parse_at(&self, text: &str, at_line_start: bool) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pending = String::new();
        let mut rest = text;
        let mut line_start = at_line_start;

        while let Some(hit) = self.next_hit(rest, line_start) {
            pending.push_str(&rest[..hit.start]);
            match hit.token {
                Token::Text(text) => pending.push_str(&text),
                Token::Node(node) => {
                    if !pending.is_empty() {
                        out.push(Node::text(std::mem::take(&mut pending)));
                    }
                    out.push(node);
                }
            }
            line_start = rest[..hit.end].ends_with('\n');
            rest = &rest[hit.end..];
        }
        pending.push_str(rest);
        if !pending.is_empty() {
            out.push(Node::text(pending));
        }
        out
    }

    /// The element a match found in `text` stands for: its inner text parsed
    /// further unless the tag is literal, empty when it is void.
    pub fn build_element(&self, m: &PatternMatch, text: &str) -> Node {
        let tag = m.tag;
        let children = match m.inner.clone().map(|inner| &text[inner]) {
            _ if tag.is_void() => Vec::new(),
            Some(inner) if tag.is_literal() => vec![Node::text(inner)],
            Some(inner) => self.parse_at(inner, tag.is_line_level()),
            None => Vec::new(),
        };
        Node::Element {
            tag,
            alias: self.registry.alias(m.index),
            children,
        }
    }

    fn next_hit(&self, text: &str, line_start: bool) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        let mut offer = |hit: Hit| {
            if best.as_ref().is_none_or(|b| hit.start < b.start) {
                best = Some(hit);
            }
        };

        if let Some(m) = self.registry.find(text, line_start) {
            offer(Hit {
                start: m.start,
                end: m.end,
                token: Token::Node(self.build_element(&m, text)),
            });
        }

        if self.links {
            if let Some(link) = self.registry.find_link(text) {
                offer(Hit {
                    start: link.start,
                    end: link.end,
                    token: Token::Node(Node::link(
                        &text[link.href.clone()],
                        link.kind,
                        &text[link.label.clone()],
                    )),
                });
            }
        }

        if let Some(m) = self.emoji.and_then(|emoji| emoji.find_shortcode(text)) {
            offer(Hit {
                start: m.range.start,
                end: m.range.end,
                token: Token::Text(m.glyph),
            });
        }

        if let Some((range, user)) = find_mention(text, self.users) {
            offer(Hit {
                start: range.start,
                end: range.end,
                token: Token::Node(Node::mention(&user.id, &user.name)),
            });
        }

        best
    }
}

/// Earliest `@name` naming one of `users`; the longest name wins and must end
/// at a word boundary.
pub fn find_mention<'u>(text: &str, users: &'u [Candidate]) -> Option<(Range<usize>, &'u Candidate)> {
    if users.is_empty() {
        return None;
    }
    text.match_indices('@').find_map(|(ix, _)| {
        let after = &text[ix + 1..];
        users
            .iter()
            .filter(|user| {
                !user.name.is_empty()
                    && after.starts_with(user.name.as_str())
                    && !after[user.name.len()..].chars().next().is_some_and(is_word_char)
            })
            .max_by_key(|user| user.name.len())
            .map(|user| (ix..ix + 1 + user.name.len(), user))
    })
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Tag;

    #[test]
    fn nested_inline_markup() {
        let registry = PatternRegistry::builtin();
        let nodes = MarkupParser::new(&registry).parse("a *b _c_* d");
        assert_eq!(
            nodes,
            vec![
                Node::text("a "),
                Node::element(
                    Tag::Strong,
                    vec![Node::text("b "), Node::element(Tag::Italic, vec![Node::text("c")])]
                ),
                Node::text(" d"),
            ]
        );
    }

    #[test]
    fn code_content_is_literal() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let nodes = MarkupParser::new(&registry)
            .with_emoji(&emoji)
            .parse("`*x* :fire:`");
        assert_eq!(nodes, vec![Node::element(Tag::Code, vec![Node::text("*x* :fire:")])]);
    }

    #[test]
    fn shortcode_beats_italic_inside_alias() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let nodes = MarkupParser::new(&registry)
            .with_emoji(&emoji)
            .parse(":smiling_face_with_halo: hi");
        assert_eq!(nodes, vec![Node::text("😇 hi")]);
    }

    #[test]
    fn longest_user_name_wins() {
        let users = vec![Candidate::new("1", "ann"), Candidate::new("2", "ann_lee")];
        let (range, user) = find_mention("hey @ann_lee!", &users).unwrap();
        assert_eq!(range, 4..12);
        assert_eq!(user.id, "2");
        assert!(find_mention("@annie", &users).is_none());
    }

    #[test]
    fn text_after_a_heading_is_not_a_line_start() {
        let registry = PatternRegistry::builtin();
        let nodes = MarkupParser::new(&registry).parse("# a\n# b");
        assert_eq!(
            nodes,
            vec![
                Node::element(Tag::H1, vec![Node::text("a")]),
                Node::text("\n"),
                Node::element(Tag::H1, vec![Node::text("b")]),
            ]
        );
    }
}
