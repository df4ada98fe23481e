use std::cell::RefCell;
use std::rc::Rc;

use inline_editor_core::{
    Candidate, EditorConfig, EmojiEntry, InlineEditor, InputEvent, KEY_ARROW_DOWN, KEY_BACKSPACE, KEY_ENTER,
    KEY_ESCAPE, KEY_SPACE, KeyEvent, LinkKind, Node, PLACEHOLDER, RecordingSurface, Tag,
};

fn editor(config: EditorConfig) -> InlineEditor {
    InlineEditor::new(config).unwrap()
}

#[test]
fn strong_forms_on_space_and_serializes_back() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("*hello*");
    let outcome = editor.handle_key(&KeyEvent::new(KEY_SPACE));

    assert!(outcome.prevent_default);
    assert_eq!(
        editor.nodes(),
        vec![
            Node::element(Tag::Strong, vec![Node::text("hello")]),
            Node::text(PLACEHOLDER.to_string()),
        ]
    );
    assert_eq!(editor.value(), "*hello*");
}

#[test]
fn custom_emoji_table_expands_and_collapses() {
    let config = EditorConfig::default().emoji(vec![EmojiEntry {
        emoji: "🙂".into(),
        aliases: vec!["smile".into()],
    }]);
    let mut editor = editor(config);
    editor.type_text(":smile:");

    assert_eq!(editor.tree().linear_text(), "🙂");
    assert_eq!(editor.caret(), 1);
    assert_eq!(editor.value(), ":smile:");
}

#[test]
fn arrow_down_then_enter_commits_the_second_candidate() {
    let users = vec![Candidate::new("1", "bob"), Candidate::new("2", "bea")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("@b");

    assert!(editor.mention().is_open());
    let names: Vec<_> = editor.mention().candidates().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["bob", "bea"]);
    assert_eq!(editor.mention().highlighted(), 0);

    assert!(editor.handle_key(&KeyEvent::new(KEY_ARROW_DOWN)).prevent_default);
    assert_eq!(editor.mention().highlighted(), 1);

    let outcome = editor.handle_key(&KeyEvent::new(KEY_ENTER));
    assert!(outcome.prevent_default);
    assert!(outcome.changed);

    let Some(Node::Mention { id, name }) = editor.nodes().into_iter().next() else {
        panic!("Expected a mention node");
    };
    assert_eq!((id.as_str(), name.as_str()), ("2", "bea"));
    assert_eq!(editor.value(), "@bea");
    assert!(!editor.mention().is_active());
}

#[test]
fn escape_closes_the_suggestions() {
    let users = vec![Candidate::new("1", "bob")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("@b");

    assert!(editor.handle_key(&KeyEvent::new(KEY_ESCAPE)).prevent_default);
    assert!(!editor.mention().is_open());

    editor.handle_key(&KeyEvent::new(KEY_ENTER));
    assert_eq!(editor.value(), "@b\n");
}

#[test]
fn moving_the_caret_off_the_query_closes_the_suggestions() {
    let users = vec![Candidate::new("1", "bob")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("hi @b");
    assert!(editor.mention().is_open());

    editor.set_caret(2);
    assert!(!editor.mention().is_open());
    let outcome = editor.handle_key(&KeyEvent::new(KEY_ENTER));
    assert!(outcome.changed);
    assert_eq!(editor.value(), "hi\n @b");
}

#[test]
fn suggestions_follow_the_caret_back_onto_the_query() {
    let users = vec![Candidate::new("1", "bob")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("@b");
    editor.set_caret(0);
    editor.handle_key(&KeyEvent::new(KEY_ENTER));
    assert_eq!(editor.value(), "\n@b");

    editor.set_caret(3);
    assert!(editor.mention().is_open());
    editor.set_selection(1, 3);
    assert!(!editor.mention().is_open());
}

#[test]
fn select_mention_picks_by_index() {
    let users = vec![Candidate::new("1", "alice"), Candidate::new("2", "alex")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("hi @al");

    assert!(editor.select_mention(1));
    assert_eq!(editor.value(), "hi @alex");
    assert!(!editor.select_mention(0));
}

#[test]
fn backspace_after_a_mention_removes_it_whole() {
    let users = vec![Candidate::new("1", "bob")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("@bo");
    editor.handle_key(&KeyEvent::new(KEY_ENTER));
    assert_eq!(editor.value(), "@bob");

    editor.handle_key(&KeyEvent::new(KEY_BACKSPACE));
    assert_eq!(editor.value(), "");
}

#[test]
fn typed_url_becomes_a_link() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("https://example.com ");

    let Some(Node::Link { href, kind, .. }) = editor.nodes().into_iter().next() else {
        panic!("Expected a link node");
    };
    assert_eq!(href, "https://example.com");
    assert_eq!(kind, LinkKind::Url);
    assert_eq!(editor.value(), "https://example.com ");
}

#[test]
fn comma_after_a_typed_url_is_left_out_of_the_link() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("see https://example.com, ");

    assert_eq!(
        editor.nodes()[1],
        Node::link("https://example.com", LinkKind::Url, "https://example.com")
    );
    assert_eq!(editor.value(), "see https://example.com, ");
}

#[test]
fn typed_markdown_link_keeps_its_label() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("[docs](https://docs.rs) ");

    assert_eq!(
        editor.nodes()[0],
        Node::link("https://docs.rs", LinkKind::Labeled, "docs")
    );
    assert_eq!(editor.value(), "[docs](https://docs.rs) ");
}

#[test]
fn typed_phone_number_becomes_a_scheme_link() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("call tel:+123 ");

    assert_eq!(editor.nodes()[1], Node::link("tel:+123", LinkKind::Scheme, "+123"));
    assert_eq!(editor.value(), "call tel:+123 ");
}

#[test]
fn underscores_then_space_make_a_rule() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("___ ");

    assert_eq!(editor.nodes()[0], Node::rule());
    assert_eq!(editor.value(), "___");
}

#[test]
fn dashes_then_space_make_a_rule_that_stays_dashed() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("--- ");

    assert!(matches!(editor.nodes()[0], Node::Element { tag: Tag::Rule, .. }));
    assert_eq!(editor.value(), "---");
}

#[test]
fn heading_forms_on_enter() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("# title ");
    assert_eq!(editor.value(), "# title ");

    let mut editor = InlineEditor::with_builtin();
    editor.type_text("# title\nbody");
    assert_eq!(
        editor.nodes()[0],
        Node::element(Tag::H1, vec![Node::text("title")])
    );
    assert_eq!(editor.value(), "# title\nbody");
}

#[test]
fn code_keeps_its_content_literal() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("`*x*` ");

    assert_eq!(
        editor.nodes()[0],
        Node::element(Tag::Code, vec![Node::text("*x*")])
    );
    assert_eq!(editor.value(), "`*x*`");
}

#[test]
fn backspace_reaches_into_a_formatted_word() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("*hello* ");
    editor.handle_key(&KeyEvent::new(KEY_BACKSPACE));
    assert_eq!(editor.value(), "*hell*");
}

#[test]
fn input_events_edit_like_keys() {
    let mut editor = InlineEditor::with_builtin();
    assert!(editor.handle_input(&InputEvent::insert_text("hello")));
    assert!(editor.handle_input(&InputEvent::DeleteBackward));
    assert_eq!(editor.value(), "hell");

    editor.set_caret(0);
    assert!(editor.handle_input(&InputEvent::DeleteForward));
    assert_eq!(editor.value(), "ell");
}

#[test]
fn typing_over_a_selection_replaces_it() {
    let mut editor = editor(EditorConfig::default().default_value("hello world"));
    editor.set_selection(6, 11);
    editor.type_text("there");
    assert_eq!(editor.value(), "hello there");
}

#[test]
fn disabled_editor_ignores_input() {
    let mut editor = editor(EditorConfig::default().default_value("x").disabled(true));
    let outcome = editor.handle_key(&KeyEvent::new("a"));
    assert!(!outcome.prevent_default && !outcome.changed);
    assert!(!editor.handle_input(&InputEvent::insert_text("a")));
    assert_eq!(editor.value(), "x");
}

#[test]
fn on_change_reports_every_new_value() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut editor = InlineEditor::with_builtin();
    let sink = seen.clone();
    editor.on_change(move |value| sink.borrow_mut().push(value.to_string()));

    editor.type_text("*a* ");
    editor.set_value("reset");

    assert_eq!(*seen.borrow(), vec!["*", "*a", "*a*"]);
    assert_eq!(editor.value(), "reset");
}

#[test]
fn set_value_rehydrates_and_starts_a_fresh_history() {
    let users = vec![Candidate::new("7", "bob")];
    let mut editor = editor(EditorConfig::default().users(users));
    editor.type_text("abc");
    assert!(editor.can_undo());

    editor.set_value("_hi_ @bob");
    assert_eq!(
        editor.nodes()[..3],
        [
            Node::element(Tag::Italic, vec![Node::text("hi")]),
            Node::text(" "),
            Node::mention("7", "bob"),
        ]
    );
    assert_eq!(editor.value(), "_hi_ @bob");
    assert!(!editor.can_undo());
    assert_eq!(editor.caret(), 7);

    editor.set_value("");
    assert_eq!(editor.value(), "");
    assert!(editor.tree().is_empty());
}

#[test]
fn placeholder_shows_only_when_empty() {
    let mut config = EditorConfig::default();
    config.placeholder = Some("Say something".into());
    let mut editor = editor(config);
    assert_eq!(editor.placeholder(), Some("Say something"));
    editor.type_text("x");
    assert_eq!(editor.placeholder(), None);
}

#[test]
fn custom_patterns_come_from_json() {
    let config = EditorConfig::from_json(
        r#"{ "patterns": [{ "tag": "strong", "rule": "\\*\\*([^*]+)\\*\\*", "open": "**", "close": "**", "shortcut": "ctrl+b" }] }"#,
    )
    .unwrap();
    let mut editor = editor(config);
    editor.type_text("**hi** ");

    assert_eq!(editor.nodes()[0], Node::element(Tag::Strong, vec![Node::text("hi")]));
    assert_eq!(editor.value(), "**hi**");
}

#[test]
fn broken_pattern_config_is_an_error() {
    let config = EditorConfig::from_json(r#"{ "patterns": [{ "tag": "i", "rule": "_" }] }"#).unwrap();
    assert!(InlineEditor::new(config).is_err());

    let config = EditorConfig::from_json(r#"{ "patterns": [{ "tag": "i", "rule": "(" }] }"#).unwrap();
    assert!(InlineEditor::new(config).is_err());
}

#[test]
fn commit_pushes_state_to_the_surface() {
    let mut config = EditorConfig::default().default_value("*a*");
    config.auto_focus = true;
    let editor = editor(config);
    let mut surface = RecordingSurface::default();
    editor.commit_to(&mut surface);

    assert_eq!(surface.nodes, vec![Node::element(Tag::Strong, vec![Node::text("a")])]);
    assert_eq!(surface.caret, 1);
    assert!(surface.focused);
    assert_eq!(surface.commits, 1);
}
