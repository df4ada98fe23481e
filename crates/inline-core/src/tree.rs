use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::pattern::Tag;

/// Zero-width run content that keeps the caret outside a freshly created
/// element. Never serialized.
pub const PLACEHOLDER: char = '\u{200B}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `[label](href)`
    Labeled,
    /// Bare URL or domain; the visible text is the markup.
    Url,
    /// `tel:` / `mailto:` target typed as a token.
    Scheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Text {
        text: String,
    },
    Element {
        tag: Tag,
        /// Registry index of the alias the element was written with, when
        /// that is not the first pattern for `tag`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<usize>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node>,
    },
    Link {
        href: String,
        kind: LinkKind,
        #[serde(default)]
        children: Vec<Node>,
    },
    Mention {
        id: String,
        name: String,
    },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn element(tag: Tag, children: Vec<Node>) -> Self {
        Node::Element {
            tag,
            alias: None,
            children,
        }
    }

    pub fn rule() -> Self {
        Node::Element {
            tag: Tag::Rule,
            alias: None,
            children: Vec::new(),
        }
    }

    pub fn link(href: impl Into<String>, kind: LinkKind, label: impl Into<String>) -> Self {
        Node::Link {
            href: href.into(),
            kind,
            children: vec![Node::text(label)],
        }
    }

    pub fn mention(id: impl Into<String>, name: impl Into<String>) -> Self {
        Node::Mention {
            id: id.into(),
            name: name.into(),
        }
    }

    /// What the node shows on screen, placeholders included.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.write_visible(&mut out);
        out
    }

    fn write_visible(&self, out: &mut String) {
        match self {
            Node::Text { text } => out.push_str(text),
            Node::Mention { name, .. } => {
                out.push('@');
                out.push_str(name);
            }
            Node::Element { children, .. } | Node::Link { children, .. } => {
                for child in children {
                    child.write_visible(out);
                }
            }
        }
    }
}

pub fn visible_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_visible(&mut out);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Text(String),
    Element(Tag, Option<usize>),
    Link { href: String, kind: LinkKind },
    Mention { id: String, name: String },
}

/// A position inside a text run, in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

const ROOT: NodeId = NodeId(0);

/// Arena-backed editable tree. Detached slots stay allocated until the tree
/// is rebuilt from a snapshot.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let mut tree = Self::bare();
        let run = tree.create(NodeKind::Text(String::new()));
        tree.append(ROOT, run);
        tree
    }

    fn bare() -> Self {
        Self {
            slots: vec![Slot {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut tree = Self::bare();
        for node in nodes {
            let id = tree.graft(node);
            tree.append(ROOT, id);
        }
        tree.ensure_text_leaf();
        tree
    }

    pub fn to_nodes(&self) -> Vec<Node> {
        self.export_children(ROOT)
    }

    pub fn export(&self, id: NodeId) -> Option<Node> {
        let node = match &self.slot(id).kind {
            NodeKind::Root => return None,
            NodeKind::Text(text) => Node::text(text.clone()),
            NodeKind::Element(tag, alias) => Node::Element {
                tag: *tag,
                alias: *alias,
                children: self.export_children(id),
            },
            NodeKind::Link { href, kind } => Node::Link {
                href: href.clone(),
                kind: *kind,
                children: self.export_children(id),
            },
            NodeKind::Mention { id, name } => Node::mention(id.clone(), name.clone()),
        };
        Some(node)
    }

    fn export_children(&self, id: NodeId) -> Vec<Node> {
        self.children(id).iter().filter_map(|&child| self.export(child)).collect()
    }

    /// Builds a detached subtree from an owned node.
    pub fn graft(&mut self, node: &Node) -> NodeId {
        match node {
            Node::Text { text } => self.create(NodeKind::Text(text.clone())),
            Node::Mention { id, name } => self.create(NodeKind::Mention {
                id: id.clone(),
                name: name.clone(),
            }),
            Node::Element {
                tag,
                alias,
                children,
            } => {
                let id = self.create(NodeKind::Element(*tag, *alias));
                self.graft_children(id, children);
                id
            }
            Node::Link {
                href,
                kind,
                children,
            } => {
                let id = self.create(NodeKind::Link {
                    href: href.clone(),
                    kind: *kind,
                });
                self.graft_children(id, children);
                id
            }
        }
    }

    fn graft_children(&mut self, parent: NodeId, children: &[Node]) {
        for child in children {
            let id = self.graft(child);
            self.append(parent, id);
        }
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.slot(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.slot_mut(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: String) {
        if let NodeKind::Text(text) = &mut self.slot_mut(id).kind {
            *text = value;
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.slot(id).kind, NodeKind::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        match self.slot(id).kind {
            NodeKind::Element(tag, _) => Some(tag),
            _ => None,
        }
    }

    /// Mentions and void elements: edited only as a whole.
    pub fn is_atom(&self, id: NodeId) -> bool {
        match &self.slot(id).kind {
            NodeKind::Mention { .. } => true,
            NodeKind::Element(tag, _) => tag.is_void(),
            _ => false,
        }
    }

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.slot_mut(parent).children.push(child);
        self.slot_mut(child).parent = Some(parent);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.slot_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.slot_mut(child).parent = Some(parent);
    }

    pub fn insert_before(&mut self, anchor: NodeId, child: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        let Some(index) = self.index_in_parent(anchor) else {
            return;
        };
        self.insert_child(parent, index, child);
    }

    pub fn insert_after(&mut self, anchor: NodeId, child: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        let Some(index) = self.index_in_parent(anchor) else {
            return;
        };
        self.insert_child(parent, index + 1, child);
    }

    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.slot_mut(id).parent.take() else {
            return;
        };
        self.slot_mut(parent).children.retain(|&c| c != id);
    }

    /// Moves the children of `id` into its place and detaches it.
    pub fn unwrap_node(&mut self, id: NodeId) {
        let children = self.slot(id).children.clone();
        for child in children {
            self.insert_before(id, child);
        }
        self.detach(id);
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut at = id;
        loop {
            if at == ROOT {
                return true;
            }
            match self.parent(at) {
                Some(parent) => at = parent,
                None => return false,
            }
        }
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&at| self.parent(at))
    }

    pub fn is_in_literal(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .any(|at| self.tag(at).is_some_and(Tag::is_literal))
    }

    pub fn enclosing_link(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&at| matches!(self.kind(at), NodeKind::Link { .. }))
    }

    /// Text runs, mentions and void elements in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(ROOT, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.slot(id).kind {
            NodeKind::Text(_) | NodeKind::Mention { .. } => out.push(id),
            NodeKind::Element(tag, _) if tag.is_void() => out.push(id),
            _ => {
                for &child in &self.slot(id).children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    pub fn text_runs(&self) -> Vec<NodeId> {
        self.leaves().into_iter().filter(|&id| self.is_text(id)).collect()
    }

    /// Linear length of a node in chars; a mention counts as `@name`.
    pub fn content_len(&self, id: NodeId) -> usize {
        match &self.slot(id).kind {
            NodeKind::Text(text) => char_len(text),
            NodeKind::Mention { name, .. } => 1 + char_len(name),
            NodeKind::Element(tag, _) if tag.is_void() => 0,
            _ => self
                .slot(id)
                .children
                .iter()
                .map(|&child| self.content_len(child))
                .sum(),
        }
    }

    pub fn len(&self) -> usize {
        self.content_len(ROOT)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn linear_text(&self) -> String {
        visible_text(&self.to_nodes())
    }

    pub fn start_of(&self, id: NodeId) -> usize {
        let mut acc = 0;
        self.walk_until(ROOT, id, &mut acc);
        acc
    }

    fn walk_until(&self, at: NodeId, target: NodeId, acc: &mut usize) -> bool {
        if at == target {
            return true;
        }
        match &self.slot(at).kind {
            NodeKind::Text(_) | NodeKind::Mention { .. } => {
                *acc += self.content_len(at);
                false
            }
            _ => self
                .slot(at)
                .children
                .iter()
                .any(|&child| self.walk_until(child, target, acc)),
        }
    }

    pub fn offset_of(&self, point: Point) -> usize {
        self.start_of(point.node) + point.offset.min(self.content_len(point.node))
    }

    /// Resolves a linear offset to a point in a text run. The first run whose
    /// end reaches the offset wins; offsets that fall on a mention land next to
    /// it, creating an empty run when there is none.
    pub fn resolve(&mut self, offset: usize) -> Point {
        let offset = offset.min(self.len());
        let leaves = self.leaves();
        let mut acc = 0;
        for &leaf in &leaves {
            let len = self.content_len(leaf);
            let is_mention = matches!(self.kind(leaf), NodeKind::Mention { .. });
            if self.is_text(leaf) && acc + len >= offset {
                return Point::new(leaf, offset - acc);
            }
            if is_mention && offset <= acc {
                return self.point_before(leaf);
            }
            if is_mention && offset <= acc + len {
                return self.point_after(leaf);
            }
            acc += len;
        }
        match leaves.last() {
            Some(&last) => self.point_after(last),
            None => {
                let run = self.create_text("");
                self.append(ROOT, run);
                Point::new(run, 0)
            }
        }
    }

    pub fn point_after(&mut self, id: NodeId) -> Point {
        if let Some(next) = self.next_sibling(id).filter(|&next| self.is_text(next)) {
            return Point::new(next, 0);
        }
        let run = self.create_text("");
        self.insert_after(id, run);
        Point::new(run, 0)
    }

    pub fn point_before(&mut self, id: NodeId) -> Point {
        if let Some(prev) = self.prev_sibling(id).filter(|&prev| self.is_text(prev)) {
            return Point::new(prev, self.content_len(prev));
        }
        let run = self.create_text("");
        self.insert_before(id, run);
        Point::new(run, 0)
    }

    /// Splits a text run at `at` chars; the returned run holds the tail.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> NodeId {
        let text = self.text(id).unwrap_or_default().to_string();
        let split = byte_index(&text, at);
        let tail = self.create_text(&text[split..]);
        self.set_text(id, text[..split].to_string());
        self.insert_after(id, tail);
        tail
    }

    pub fn insert_text(&mut self, point: Point, value: &str) -> Point {
        let Some(text) = self.text(point.node) else {
            return point;
        };
        let mut text = text.to_string();
        let offset = point.offset.min(char_len(&text));
        text.insert_str(byte_index(&text, offset), value);
        self.set_text(point.node, text);
        Point::new(point.node, offset + char_len(value))
    }

    /// Replaces the chars in `range` of a text run with `nodes`. Returns the
    /// run holding the text after the range (possibly empty). An emptied head
    /// run is dropped.
    pub fn splice_run(&mut self, run: NodeId, range: Range<usize>, nodes: &[NodeId]) -> NodeId {
        let text = self.text(run).unwrap_or_default().to_string();
        let start = byte_index(&text, range.start);
        let end = byte_index(&text, range.end.max(range.start));
        let tail = self.create_text(&text[end..]);
        self.set_text(run, text[..start].to_string());

        let mut anchor = run;
        for &node in nodes {
            self.insert_after(anchor, node);
            anchor = node;
        }
        self.insert_after(anchor, tail);
        if start == 0 {
            self.detach(run);
        }
        tail
    }

    /// Deletes the linear range `[start, end)`. Mentions touched by the range
    /// go as a whole, void elements only when strictly inside it.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let total = self.len();
        let (start, end) = (start.min(end).min(total), start.max(end).min(total));
        if start == end {
            return;
        }

        let mut acc = 0;
        let mut doomed = Vec::new();
        let mut cuts = Vec::new();
        for leaf in self.leaves() {
            let len = self.content_len(leaf);
            let (lo, hi) = (acc, acc + len);
            acc = hi;
            match self.kind(leaf) {
                NodeKind::Element(..) if start < lo && lo < end => doomed.push(leaf),
                NodeKind::Mention { .. } if lo < end && hi > start => doomed.push(leaf),
                NodeKind::Text(_) if lo < end && hi > start => {
                    cuts.push((leaf, start.max(lo) - lo, end.min(hi) - lo));
                }
                _ => {}
            }
        }

        for (leaf, from, to) in cuts {
            let text = self.text(leaf).unwrap_or_default();
            let mut value = String::with_capacity(text.len());
            value.push_str(&text[..byte_index(text, from)]);
            value.push_str(&text[byte_index(text, to)..]);
            self.set_text(leaf, value);
        }
        for leaf in doomed {
            self.detach(leaf);
        }
        tracing::debug!(start, end, "deleted range");
    }

    /// The atom directly before the caret, with only placeholders between.
    pub fn atom_before(&self, point: Point) -> Option<NodeId> {
        let text = self.text(point.node)?;
        let before = &text[..byte_index(text, point.offset)];
        if !before.chars().all(|c| c == PLACEHOLDER) {
            return None;
        }
        self.prev_sibling(point.node).filter(|&prev| self.is_atom(prev))
    }

    /// The atom directly after the caret, with only placeholders between.
    pub fn atom_after(&self, point: Point) -> Option<NodeId> {
        let text = self.text(point.node)?;
        let after = &text[byte_index(text, point.offset)..];
        if !after.chars().all(|c| c == PLACEHOLDER) {
            return None;
        }
        self.next_sibling(point.node).filter(|&next| self.is_atom(next))
    }

    /// Removes non-void elements and links with no visible content. Returns
    /// how many were removed.
    pub fn prune_empty(&mut self) -> usize {
        let mut doomed = Vec::new();
        self.collect_empty(ROOT, &mut doomed);
        for &id in &doomed {
            self.detach(id);
        }
        self.ensure_text_leaf();
        doomed.len()
    }

    fn collect_empty(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.slot(id).children {
            let prunable = match self.kind(child) {
                NodeKind::Element(tag, _) => !tag.is_void(),
                NodeKind::Link { .. } => true,
                _ => false,
            };
            if !prunable {
                continue;
            }
            let visible = visible_text(&self.export_children(child));
            if visible.trim().is_empty() {
                out.push(child);
            } else {
                self.collect_empty(child, out);
            }
        }
    }

    pub fn ensure_text_leaf(&mut self) {
        if self.leaves().iter().any(|&leaf| self.is_text(leaf)) {
            return;
        }
        let run = self.create_text("");
        self.append(ROOT, run);
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `chars`-th char, clamped to the end of `text`.
pub fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(ix, _)| ix)
}

/// Char offset of a byte index.
pub fn char_index(text: &str, byte: usize) -> usize {
    char_len(&text[..byte.min(text.len())])
}
