use crate::emoji::EmojiTable;
use crate::markup::MarkupParser;
use crate::mention::Candidate;
use crate::pattern::PatternRegistry;
use crate::tree::{Node, byte_index, char_len, visible_text};

/// Offsets where a long message is cut before the first, second, ...
/// "read more".
pub const EXPAND_START: usize = 768;
pub const EXPAND_STEP: usize = 3071;

/// Read-only rendering of canonical markup.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    parser: MarkupParser<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub nodes: Vec<Node>,
    pub truncated: bool,
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a PatternRegistry, emoji: &'a EmojiTable, users: &'a [Candidate]) -> Self {
        Self {
            parser: MarkupParser::new(registry)
                .with_links()
                .with_emoji(emoji)
                .with_users(users),
        }
    }

    /// Mentions of unknown users stay text.
    pub fn render(&self, text: &str) -> Vec<Node> {
        self.parser.parse(text)
    }

    /// Renders at most `limit` visible chars, cut at a word boundary.
    pub fn render_truncated(&self, text: &str, limit: usize) -> Truncated {
        let nodes = self.render(text);
        let visible = visible_text(&nodes);
        if char_len(&visible) <= limit {
            return Truncated {
                nodes,
                truncated: false,
            };
        }
        let mut budget = char_len(safe_truncate(&visible, limit));
        Truncated {
            nodes: truncate_nodes(nodes, &mut budget),
            truncated: true,
        }
    }

    /// Renders the `expanded`-th step of a message that grows on "read more".
    pub fn render_step(&self, text: &str, expanded: usize) -> Truncated {
        let steps = expand_steps(EXPAND_START, EXPAND_STEP, char_len(text));
        match steps.get(expanded) {
            Some(&limit) => self.render_truncated(text, limit),
            None => Truncated {
                nodes: self.render(text),
                truncated: false,
            },
        }
    }
}

/// Cuts `text` to at most `max` chars at the last space before the cut.
/// Text without any space in range truncates to nothing.
pub fn safe_truncate(text: &str, max: usize) -> &str {
    if char_len(text) <= max {
        return text;
    }
    let sliced = &text[..byte_index(text, max)];
    match sliced.rfind(' ') {
        Some(space) => sliced[..space].trim(),
        None => "",
    }
}

/// `start, start + step, ...` while below `max`.
pub fn expand_steps(start: usize, step: usize, max: usize) -> Vec<usize> {
    let step = step.max(1);
    (0..)
        .map(|i| start + i * step)
        .take_while(|&current| current < max)
        .collect()
}

/// Keeps nodes while `budget` visible chars last. Mentions and links are
/// never split.
fn truncate_nodes(nodes: Vec<Node>, budget: &mut usize) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        if *budget == 0 {
            break;
        }
        let len = char_len(&node.visible_text());
        if len <= *budget {
            *budget -= len;
            out.push(node);
            continue;
        }
        match node {
            Node::Text { text } => {
                out.push(Node::text(&text[..byte_index(&text, *budget)]));
            }
            Node::Element {
                tag,
                alias,
                children,
            } => {
                let children = truncate_nodes(children, budget);
                if !children.is_empty() {
                    out.push(Node::Element {
                        tag,
                        alias,
                        children,
                    });
                }
            }
            Node::Link { .. } | Node::Mention { .. } => {}
        }
        *budget = 0;
    }
    out
}
