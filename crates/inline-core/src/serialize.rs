use crate::emoji::EmojiTable;
use crate::markup::MarkupParser;
use crate::mention::Candidate;
use crate::pattern::PatternRegistry;
use crate::tree::{LinkKind, Node, PLACEHOLDER, visible_text};

/// Writes nodes back out as canonical markup.
pub fn to_plain_text(nodes: &[Node], registry: &PatternRegistry, emoji: &EmojiTable) -> String {
    let out = write_siblings(nodes, registry, emoji, false);
    if out == "\n" { String::new() } else { out }
}

/// Parses canonical markup into nodes: patterns, links, shortcodes and
/// mentions of known `users`.
pub fn to_tree(text: &str, registry: &PatternRegistry, emoji: &EmojiTable, users: &[Candidate]) -> Vec<Node> {
    MarkupParser::new(registry)
        .with_links()
        .with_emoji(emoji)
        .with_users(users)
        .parse(text)
}

fn write_siblings(nodes: &[Node], registry: &PatternRegistry, emoji: &EmojiTable, literal: bool) -> String {
    let pieces: Vec<String> = nodes
        .iter()
        .map(|node| write_node(node, registry, emoji, literal))
        .collect();

    let mut out = String::new();
    for (ix, (node, piece)) in nodes.iter().zip(&pieces).enumerate() {
        out.push_str(piece);
        if needs_line_close(node, registry) {
            let next = pieces[ix + 1..].iter().find(|piece| !piece.is_empty());
            if next.is_some_and(|next| !next.starts_with('\n')) {
                out.push('\n');
            }
        }
    }
    out
}

fn write_node(node: &Node, registry: &PatternRegistry, emoji: &EmojiTable, literal: bool) -> String {
    match node {
        Node::Text { text } => {
            let text = strip_placeholders(text);
            if literal { text } else { emoji.collapse_glyphs(&text) }
        }
        Node::Mention { name, .. } => format!("@{name}"),
        Node::Link { href, kind, children } => match kind {
            LinkKind::Labeled => format!("[{}]({href})", strip_placeholders(&visible_text(children))),
            LinkKind::Url => strip_placeholders(&visible_text(children)),
            LinkKind::Scheme => href.clone(),
        },
        Node::Element {
            tag,
            alias,
            children,
        } => {
            let inner = write_siblings(children, registry, emoji, literal || tag.is_literal());
            match registry.writer(*tag, *alias) {
                Some(pattern) => format!("{}{inner}{}", pattern.open(), pattern.close()),
                None => inner,
            }
        }
    }
}

/// Line-level elements without a closing marker end at the next newline.
fn needs_line_close(node: &Node, registry: &PatternRegistry) -> bool {
    let Node::Element { tag, alias, .. } = node else {
        return false;
    };
    tag.is_line_level() && registry.writer(*tag, *alias).is_some_and(|p| p.close().is_empty())
}

pub fn strip_placeholders(text: &str) -> String {
    text.chars().filter(|&c| c != PLACEHOLDER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Tag;

    #[test]
    fn heading_followed_by_text_gets_a_newline() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let nodes = vec![
            Node::element(Tag::H2, vec![Node::text("t")]),
            Node::text("\u{200B}"),
            Node::text("body"),
        ];
        assert_eq!(to_plain_text(&nodes, &registry, &emoji), "## t\nbody");
    }

    #[test]
    fn lone_newline_is_empty() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        assert_eq!(to_plain_text(&[Node::text("\n")], &registry, &emoji), "");
    }
}
