use crate::emoji::EmojiTable;
use crate::event::{KEY_ENTER, KEY_SPACE, KEY_TAB};
use crate::markup::MarkupParser;
use crate::pattern::PatternRegistry;
use crate::tree::{NodeId, PLACEHOLDER, Point, Tree, byte_index, char_index, char_len};

/// Keys that complete a live-format token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Space,
    Tab,
    Enter,
}

impl Trigger {
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        match key {
            KEY_SPACE => Some(Trigger::Space),
            KEY_TAB if !shift => Some(Trigger::Tab),
            KEY_ENTER if !shift => Some(Trigger::Enter),
            _ => None,
        }
    }

    /// Line-level constructs only form once their line is finished.
    fn ends_line(self) -> bool {
        self == Trigger::Enter
    }
}

/// Converts the earliest pattern in the caret run, up to the caret, into an
/// element. Returns the new caret when something was formatted.
pub fn format_at_caret(
    tree: &mut Tree,
    caret: Point,
    registry: &PatternRegistry,
    emoji: &EmojiTable,
    trigger: Trigger,
) -> Option<Point> {
    let run = caret.node;
    if tree.is_in_literal(run) || tree.enclosing_link(run).is_some() {
        return None;
    }
    let text = tree.text(run)?.to_string();
    let prefix = &text[..byte_index(&text, caret.offset)];
    let line_start = at_line_start(tree, run);

    let m = registry.find_where(prefix, line_start, |tag| {
        trigger.ends_line() || !tag.is_line_level()
    })?;
    let node = MarkupParser::new(registry)
        .with_emoji(emoji)
        .build_element(&m, prefix);

    let start = char_index(prefix, m.start);
    let end = char_index(prefix, m.end);
    let element = tree.graft(&node);
    let tail = tree.splice_run(run, start..end, &[element]);
    tracing::debug!(tag = %m.tag, start, end, "formatted pattern");

    if tree.text(tail).is_some_and(str::is_empty) {
        tree.set_text(tail, PLACEHOLDER.to_string());
        return Some(Point::new(tail, 1));
    }
    Some(Point::new(tail, caret.offset.saturating_sub(end)))
}

/// Replaces a known `:alias:` the caret is in or right after with its glyph.
pub fn expand_emoji_at_caret(tree: &mut Tree, caret: Point, emoji: &EmojiTable) -> Option<Point> {
    if tree.is_in_literal(caret.node) {
        return None;
    }
    let text = tree.text(caret.node)?.to_string();
    let m = emoji.shortcode_at(&text, byte_index(&text, caret.offset))?;

    let mut value = String::with_capacity(text.len());
    value.push_str(&text[..m.range.start]);
    value.push_str(&m.glyph);
    value.push_str(&text[m.range.end..]);
    let offset = char_index(&text, m.range.start) + char_len(&m.glyph);
    tree.set_text(caret.node, value);
    tracing::trace!(glyph = %m.glyph, "expanded shortcode");
    Some(Point::new(caret.node, offset))
}

/// Whether the first char of `run` starts a line of the linear text.
/// Placeholders in between do not count.
pub fn at_line_start(tree: &Tree, run: NodeId) -> bool {
    let start = tree.start_of(run);
    if start == 0 {
        return true;
    }
    let linear = tree.linear_text();
    let before = linear[..byte_index(&linear, start)].trim_end_matches(PLACEHOLDER);
    before.is_empty() || before.ends_with('\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Tag;
    use crate::tree::Node;

    fn run_end(tree: &Tree) -> Point {
        let run = tree.text_runs()[0];
        Point::new(run, tree.content_len(run))
    }

    #[test]
    fn strong_is_formed_and_caret_parks_after_a_placeholder() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let mut tree = Tree::from_nodes(&[Node::text("*hello*")]);
        let caret = run_end(&tree);
        let caret = format_at_caret(&mut tree, caret, &registry, &emoji, Trigger::Space).unwrap();
        assert_eq!(
            tree.to_nodes(),
            vec![
                Node::element(Tag::Strong, vec![Node::text("hello")]),
                Node::text("\u{200B}")
            ]
        );
        assert_eq!(tree.offset_of(caret), 6);
    }

    #[test]
    fn headings_wait_for_enter() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let mut tree = Tree::from_nodes(&[Node::text("# title")]);
        let caret = run_end(&tree);
        assert!(format_at_caret(&mut tree, caret, &registry, &emoji, Trigger::Space).is_none());
        assert!(format_at_caret(&mut tree, caret, &registry, &emoji, Trigger::Enter).is_some());
        assert_eq!(tree.to_nodes()[0], Node::element(Tag::H1, vec![Node::text("title")]));
    }

    #[test]
    fn nothing_forms_inside_code() {
        let registry = PatternRegistry::builtin();
        let emoji = EmojiTable::builtin();
        let mut tree = Tree::from_nodes(&[Node::element(Tag::Code, vec![Node::text("*x*")])]);
        let caret = run_end(&tree);
        assert!(format_at_caret(&mut tree, caret, &registry, &emoji, Trigger::Space).is_none());
    }

    #[test]
    fn emoji_expands_when_the_caret_follows_it() {
        let emoji = EmojiTable::builtin();
        let mut tree = Tree::from_nodes(&[Node::text("hi :fire:")]);
        let caret = run_end(&tree);
        let caret = expand_emoji_at_caret(&mut tree, caret, &emoji).unwrap();
        assert_eq!(tree.linear_text(), "hi 🔥");
        assert_eq!(caret.offset, 4);
    }
}
