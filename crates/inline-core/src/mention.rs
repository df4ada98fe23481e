use serde::{Deserialize, Serialize};

use crate::event::{KEY_ARROW_DOWN, KEY_ARROW_UP, KEY_ENTER, KEY_ESCAPE, KeyEvent};
use crate::markup::is_word_char;
use crate::tree::{NodeKind, Point, Tree, byte_index, char_index};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKey {
    /// Not a mention key, or no suggestion list is open.
    Ignored,
    Moved,
    Commit(usize),
    Cancelled,
}

/// Suggestion state for an `@query` being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionState {
    active: bool,
    query: String,
    candidates: Vec<Candidate>,
    highlighted: usize,
}

impl MentionState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active with at least one candidate: the only state that claims keys.
    pub fn is_open(&self) -> bool {
        self.active && !self.candidates.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Looks for an `@query` of word characters ending at the caret.
    pub fn scan(&mut self, tree: &Tree, caret: Point, users: &[Candidate]) {
        if users.is_empty() {
            self.cancel();
            return;
        }
        let Some(query) = query_before(tree, caret) else {
            self.cancel();
            return;
        };

        let candidates: Vec<Candidate> = users
            .iter()
            .filter(|user| user.name.starts_with(query))
            .cloned()
            .collect();
        if candidates != self.candidates {
            self.highlighted = 0;
        }
        self.active = true;
        self.query = query.to_string();
        self.candidates = candidates;
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> MentionKey {
        if !self.is_open() || event.primary() {
            return MentionKey::Ignored;
        }
        let len = self.candidates.len();
        match event.key.as_str() {
            KEY_ARROW_DOWN => {
                self.highlighted = (self.highlighted + 1) % len;
                MentionKey::Moved
            }
            KEY_ARROW_UP => {
                self.highlighted = (self.highlighted + len - 1) % len;
                MentionKey::Moved
            }
            KEY_ENTER => MentionKey::Commit(self.highlighted),
            KEY_ESCAPE => {
                self.active = false;
                self.highlighted = 0;
                MentionKey::Cancelled
            }
            _ => MentionKey::Ignored,
        }
    }

    /// Replaces `@query` before the caret with a mention of candidate
    /// `index`. Returns the caret, in the run after the mention.
    pub fn commit(&mut self, tree: &mut Tree, caret: Point, index: usize) -> Option<Point> {
        let candidate = self.candidates.get(index)?.clone();
        let text = tree.text(caret.node)?;
        let before = &text[..byte_index(text, caret.offset)];
        let at = char_index(text, before.rfind('@')?);

        let mention = tree.create(NodeKind::Mention {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
        });
        let tail = tree.splice_run(caret.node, at..caret.offset, &[mention]);
        tracing::debug!(id = %candidate.id, name = %candidate.name, "inserted mention");
        self.cancel();
        Some(Point::new(tail, 0))
    }
}

fn query_before(tree: &Tree, caret: Point) -> Option<&str> {
    let text = tree.text(caret.node)?;
    let before = &text[..byte_index(text, caret.offset)];
    let at = before.rfind('@')?;
    let query = &before[at + 1..];
    query.chars().all(is_word_char).then_some(query)
}
