use std::fmt;
use std::ops::Range;

use crate::autolink::{self, LinkSync};
use crate::config::{EditorConfig, TextDirection};
use crate::display::Renderer;
use crate::emoji::EmojiTable;
use crate::error::EditorError;
use crate::event::{KEY_BACKSPACE, KEY_DELETE, KEY_ENTER, KEY_SPACE, InputEvent, KeyEvent};
use crate::format::{self, Trigger};
use crate::history::{History, UndoEntry};
use crate::mention::{MentionKey, MentionState};
use crate::pattern::PatternRegistry;
use crate::serialize::{to_plain_text, to_tree};
use crate::shortcut::{self, CharPair, DEFAULT_PAIRS};
use crate::surface::Surface;
use crate::tree::{Node, PLACEHOLDER, Point, Tree, byte_index, char_len};

pub type ChangeHandler = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The host must not apply the key's own effect.
    pub prevent_default: bool,
    /// The canonical value changed.
    pub changed: bool,
}

enum Native {
    Text(String),
    Backward,
    Forward,
}

pub struct InlineEditor {
    config: EditorConfig,
    registry: PatternRegistry,
    emoji: EmojiTable,
    pairs: Vec<CharPair>,
    tree: Tree,
    caret: Point,
    anchor: Option<usize>,
    mention: MentionState,
    history: History,
    value: String,
    focused: bool,
    on_change: Option<ChangeHandler>,
}

impl fmt::Debug for InlineEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineEditor")
            .field("value", &self.value)
            .field("caret", &self.caret())
            .field("anchor", &self.anchor)
            .field("mention", &self.mention)
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .finish_non_exhaustive()
    }
}

impl InlineEditor {
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        let config = config.with_defaults();
        let registry = match &config.patterns {
            Some(specs) => PatternRegistry::from_specs(specs.iter().cloned())?,
            None => PatternRegistry::builtin(),
        };
        let emoji = match &config.emoji {
            Some(entries) => EmojiTable::new(entries.clone()),
            None => EmojiTable::builtin(),
        };
        let pairs = config
            .char_pairs
            .clone()
            .unwrap_or_else(|| DEFAULT_PAIRS.to_vec());

        let nodes = to_tree(config.initial_value(), &registry, &emoji, &config.users);
        let mut tree = Tree::from_nodes(&nodes);
        let caret = tree.resolve(tree.len());

        let mut editor = Self {
            history: History::new(config.max_undo),
            focused: config.auto_focus,
            config,
            registry,
            emoji,
            pairs,
            tree,
            caret,
            anchor: None,
            mention: MentionState::default(),
            value: String::new(),
            on_change: None,
        };
        editor.value = editor.compute_value();
        let seed = UndoEntry::capture(&editor.tree.to_nodes(), editor.caret())?;
        editor.history.seed(seed);
        Ok(editor)
    }

    pub fn with_builtin() -> Self {
        Self::new(EditorConfig::default()).expect("default editor config must be valid")
    }

    pub fn on_change(&mut self, handler: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.config.placeholder.as_deref().filter(|_| self.is_empty())
    }

    pub fn dir(&self) -> TextDirection {
        self.config.dir
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn emoji(&self) -> &EmojiTable {
        &self.emoji
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.tree.to_nodes()
    }

    pub fn caret(&self) -> usize {
        self.tree.offset_of(self.caret)
    }

    pub fn caret_point(&self) -> Point {
        self.caret
    }

    pub fn selection(&self) -> Range<usize> {
        let caret = self.caret();
        match self.anchor {
            Some(anchor) => anchor.min(caret)..anchor.max(caret),
            None => caret..caret,
        }
    }

    pub fn mention(&self) -> &MentionState {
        &self.mention
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.mention.cancel();
    }

    pub fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.registry, &self.emoji, &self.config.users)
    }

    /// Applies a controlled value. An empty value clears the surface, any
    /// other value different from the current one is parsed again. Both
    /// start a fresh history.
    pub fn set_value(&mut self, value: &str) {
        if value == self.value {
            return;
        }
        let nodes = if value.is_empty() {
            Vec::new()
        } else {
            to_tree(value, &self.registry, &self.emoji, &self.config.users)
        };
        self.tree = Tree::from_nodes(&nodes);
        self.caret = self.tree.resolve(self.tree.len());
        self.anchor = None;
        self.mention.cancel();
        self.value = self.compute_value();
        match UndoEntry::capture(&self.tree.to_nodes(), self.caret()) {
            Ok(entry) => self.history.seed(entry),
            Err(err) => tracing::warn!(%err, "could not snapshot new value"),
        }
        tracing::debug!(len = self.value.len(), "applied external value");
    }

    /// Host-reported selection, in linear offsets. Moving the caret rescans
    /// the mention query; a range closes the picker.
    pub fn set_selection(&mut self, anchor: usize, focus: usize) {
        let len = self.tree.len();
        let (anchor, focus) = (anchor.min(len), focus.min(len));
        let moved = focus != self.caret();
        self.caret = self.tree.resolve(focus);
        self.anchor = (anchor != focus).then_some(anchor);
        if self.anchor.is_some() {
            self.mention.cancel();
        } else if moved {
            self.mention.scan(&self.tree, self.caret, &self.config.users);
        }
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.set_selection(offset, offset);
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if self.config.disabled || event.is_modifier_only() {
            return KeyOutcome::default();
        }

        match self.mention.handle_key(event) {
            MentionKey::Ignored => {}
            MentionKey::Moved | MentionKey::Cancelled => {
                return KeyOutcome {
                    prevent_default: true,
                    changed: false,
                };
            }
            MentionKey::Commit(index) => {
                self.commit_mention(index);
                return KeyOutcome {
                    prevent_default: true,
                    changed: self.commit(),
                };
            }
        }

        if let Some(pattern) = shortcut::find_shortcut(&self.registry, event) {
            let tag = pattern.tag();
            let range = self.selection();
            if range.is_empty() {
                return KeyOutcome {
                    prevent_default: true,
                    changed: false,
                };
            }
            self.caret = shortcut::wrap_selection(&mut self.tree, range, tag);
            self.anchor = None;
            self.input_phase();
            return KeyOutcome {
                prevent_default: true,
                changed: self.commit(),
            };
        }

        let selection = self.selection();
        if !selection.is_empty() && !event.primary() {
            if let Some(pair) = shortcut::pair_for(&self.pairs, &event.key) {
                let inner = shortcut::wrap_pair(&mut self.tree, selection, pair);
                self.set_selection(inner.start, inner.end);
                return KeyOutcome {
                    prevent_default: true,
                    changed: self.commit(),
                };
            }
        }

        let plain = !event.primary() && !event.alt && selection.is_empty();
        let mut edited = false;
        let mut prevent_default = false;

        if plain && (event.is(KEY_SPACE) || event.is(KEY_ENTER)) {
            if let Some(caret) = autolink::link_at_caret(&mut self.tree, self.caret) {
                self.caret = caret;
                edited = true;
            }
        }

        if let Some(trigger) = Trigger::from_key(&event.key, event.shift).filter(|_| plain) {
            if let Some(caret) =
                format::format_at_caret(&mut self.tree, self.caret, &self.registry, &self.emoji, trigger)
            {
                self.caret = caret;
                edited = true;
                prevent_default = trigger != Trigger::Enter;
            }
        }

        if event.is_undo() {
            let entry = self.history.undo().cloned();
            return KeyOutcome {
                prevent_default: true,
                changed: self.travel(entry).unwrap_or(false),
            };
        }
        if event.is_redo() {
            let entry = self.history.redo().cloned();
            return KeyOutcome {
                prevent_default: true,
                changed: self.travel(entry).unwrap_or(false),
            };
        }

        if !prevent_default {
            if let Some(native) = native_effect(event) {
                edited |= self.apply_native(native);
                prevent_default = true;
            }
        }

        if edited {
            self.input_phase();
        }
        KeyOutcome {
            prevent_default,
            changed: self.commit(),
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.config.disabled {
            return false;
        }
        let native = match event {
            InputEvent::InsertText { text } => Native::Text(text.clone()),
            InputEvent::InsertLineBreak => Native::Text("\n".to_string()),
            InputEvent::DeleteBackward => Native::Backward,
            InputEvent::DeleteForward => Native::Forward,
        };
        if self.apply_native(native) {
            self.input_phase();
        }
        self.commit()
    }

    /// Types `text` one keystroke at a time; `\n` is Enter.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            let event = match ch {
                '\n' => KeyEvent::new(KEY_ENTER),
                ch => KeyEvent::new(ch.to_string()),
            };
            self.handle_key(&event);
        }
    }

    /// Commits the highlighted-or-given suggestion. Out-of-range indexes and a
    /// closed suggestion list do nothing.
    pub fn select_mention(&mut self, index: usize) -> bool {
        if self.config.disabled || !self.mention.is_open() {
            return false;
        }
        if !self.commit_mention(index) {
            return false;
        }
        self.commit();
        true
    }

    /// Steps back one snapshot. Returns whether anything was restored.
    pub fn undo(&mut self) -> bool {
        let entry = self.history.undo().cloned();
        self.travel(entry).is_some()
    }

    pub fn redo(&mut self) -> bool {
        let entry = self.history.redo().cloned();
        self.travel(entry).is_some()
    }

    /// Pushes the current state to the host.
    pub fn commit_to<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.replace_content(&self.tree.to_nodes());
        surface.set_caret(self.caret());
        if self.focused {
            surface.focus();
        } else {
            surface.blur();
        }
    }

    fn commit_mention(&mut self, index: usize) -> bool {
        match self.mention.commit(&mut self.tree, self.caret, index) {
            Some(caret) => {
                self.caret = caret;
                self.anchor = None;
                true
            }
            None => false,
        }
    }

    fn apply_native(&mut self, native: Native) -> bool {
        let had_selection = self.delete_selection();
        match native {
            Native::Text(text) => {
                self.caret = self.tree.insert_text(self.caret, &text);
                true
            }
            Native::Backward if had_selection => true,
            Native::Forward if had_selection => true,
            Native::Backward => self.delete_backward(),
            Native::Forward => self.delete_forward(),
        }
    }

    fn delete_selection(&mut self) -> bool {
        let range = self.selection();
        self.anchor = None;
        if range.is_empty() {
            return false;
        }
        self.tree.delete_range(range.start, range.end);
        self.tree.prune_empty();
        self.caret = self.tree.resolve(range.start);
        true
    }

    fn delete_backward(&mut self) -> bool {
        if let Some(atom) = self.tree.atom_before(self.caret) {
            self.tree.detach(atom);
            tracing::debug!("removed atom before caret");
            return true;
        }
        let stripped = self.strip_placeholders_before();
        if self.caret.offset > 0 {
            let Some(text) = self.tree.text(self.caret.node) else {
                return stripped;
            };
            let mut text = text.to_string();
            text.remove(byte_index(&text, self.caret.offset - 1));
            self.tree.set_text(self.caret.node, text);
            self.caret.offset -= 1;
            return true;
        }
        let offset = self.caret();
        if offset == 0 {
            return stripped;
        }
        self.tree.delete_range(offset - 1, offset);
        self.caret = self.tree.resolve(offset - 1);
        true
    }

    /// Drops placeholders right before the caret so Backspace reaches a
    /// visible char.
    fn strip_placeholders_before(&mut self) -> bool {
        let Some(text) = self.tree.text(self.caret.node) else {
            return false;
        };
        let at = byte_index(text, self.caret.offset);
        let head = text[..at].trim_end_matches(PLACEHOLDER);
        let removed = char_len(&text[..at]) - char_len(head);
        if removed == 0 {
            return false;
        }
        let value = format!("{head}{}", &text[at..]);
        self.tree.set_text(self.caret.node, value);
        self.caret.offset -= removed;
        true
    }

    fn delete_forward(&mut self) -> bool {
        if let Some(atom) = self.tree.atom_after(self.caret) {
            self.tree.detach(atom);
            tracing::debug!("removed atom after caret");
            return true;
        }
        let run_len = self.tree.content_len(self.caret.node);
        if self.caret.offset < run_len {
            let Some(text) = self.tree.text(self.caret.node) else {
                return false;
            };
            let mut text = text.to_string();
            text.remove(byte_index(&text, self.caret.offset));
            self.tree.set_text(self.caret.node, text);
            return true;
        }
        let offset = self.caret();
        if offset >= self.tree.len() {
            return false;
        }
        self.tree.delete_range(offset, offset + 1);
        self.caret = self.tree.resolve(offset);
        true
    }

    /// Link sync, mention scan, emoji expansion and cleanup.
    fn input_phase(&mut self) {
        self.ensure_caret();

        if let Some(LinkSync::Dropped) =
            autolink::sync_link(&mut self.tree, self.caret, self.config.drop_invalid_links)
        {
            self.ensure_caret();
        }

        self.mention.scan(&self.tree, self.caret, &self.config.users);

        if let Some(caret) = format::expand_emoji_at_caret(&mut self.tree, self.caret, &self.emoji) {
            self.caret = caret;
        }

        let offset = self.caret();
        if self.tree.prune_empty() > 0 && !self.tree.is_attached(self.caret.node) {
            self.caret = self.tree.resolve(offset);
        }
    }

    /// Recomputes the value, records a snapshot and reports a change.
    fn commit(&mut self) -> bool {
        match UndoEntry::capture(&self.tree.to_nodes(), self.caret()) {
            Ok(entry) => {
                self.history.record(entry);
            }
            Err(err) => tracing::warn!(%err, "could not snapshot editor state"),
        }
        self.refresh_value()
    }

    fn refresh_value(&mut self) -> bool {
        let value = self.compute_value();
        if value == self.value {
            return false;
        }
        self.value = value;
        if let Some(handler) = self.on_change.as_mut() {
            handler(&self.value);
        }
        true
    }

    /// Restores a history entry without recording it. `Some(changed)` when
    /// the entry was applied.
    fn travel(&mut self, entry: Option<UndoEntry>) -> Option<bool> {
        let entry = entry?;
        self.restore(&entry).then(|| self.refresh_value())
    }

    fn restore(&mut self, entry: &UndoEntry) -> bool {
        match entry.nodes() {
            Ok(nodes) => {
                self.tree = Tree::from_nodes(&nodes);
                self.caret = self.tree.resolve(entry.caret);
                self.anchor = None;
                self.mention.cancel();
                true
            }
            Err(err) => {
                tracing::warn!(%err, "skipping snapshot that failed to decode");
                false
            }
        }
    }

    fn compute_value(&self) -> String {
        to_plain_text(&self.tree.to_nodes(), &self.registry, &self.emoji)
    }

    fn ensure_caret(&mut self) {
        let valid = self.tree.is_attached(self.caret.node)
            && self
                .tree
                .text(self.caret.node)
                .is_some_and(|text| self.caret.offset <= char_len(text));
        if !valid {
            let end = self.tree.len();
            self.caret = self.tree.resolve(end);
        }
    }
}

fn native_effect(event: &KeyEvent) -> Option<Native> {
    if event.primary() {
        return None;
    }
    match event.key.as_str() {
        KEY_ENTER => Some(Native::Text("\n".to_string())),
        KEY_BACKSPACE => Some(Native::Backward),
        KEY_DELETE => Some(Native::Forward),
        _ => event.typed_text().map(|text| Native::Text(text.to_string())),
    }
}
