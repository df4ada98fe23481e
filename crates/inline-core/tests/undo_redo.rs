use inline_editor_core::{EditorConfig, InlineEditor, KEY_SPACE, KeyEvent, Node, Tag};

#[test]
fn two_undos_and_one_redo_land_on_the_second_edit() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("a");
    editor.type_text("b");
    editor.type_text("c");
    assert_eq!(editor.value(), "abc");

    assert!(editor.handle_key(&KeyEvent::new("z").ctrl()).changed);
    assert!(editor.handle_key(&KeyEvent::new("z").ctrl()).changed);
    assert_eq!(editor.value(), "a");

    assert!(editor.handle_key(&KeyEvent::new("z").ctrl().shift()).changed);
    assert_eq!(editor.value(), "ab");
    assert_eq!(editor.caret(), 2);
    assert!(editor.can_redo());
}

#[test]
fn nothing_to_undo_on_a_fresh_editor() {
    let mut editor = InlineEditor::new(EditorConfig::default().default_value("seed")).unwrap();
    assert!(!editor.can_undo());
    assert!(!editor.undo());
    assert!(!editor.redo());
    assert_eq!(editor.value(), "seed");
}

#[test]
fn a_new_edit_clears_redo() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("ab");
    assert!(editor.undo());
    assert!(editor.can_redo());

    editor.type_text("x");
    assert!(!editor.can_redo());
    assert_eq!(editor.value(), "ax");
}

#[test]
fn undo_restores_the_tree_before_formatting() {
    let mut editor = InlineEditor::with_builtin();
    editor.type_text("*a*");
    editor.handle_key(&KeyEvent::new(KEY_SPACE));
    assert!(matches!(editor.nodes()[0], Node::Element { tag: Tag::Strong, .. }));

    assert!(editor.undo());
    assert_eq!(editor.nodes(), vec![Node::text("*a*")]);
    assert_eq!(editor.caret(), 3);
}

#[test]
fn history_depth_is_capped() {
    let mut editor = InlineEditor::new(EditorConfig::default().max_undo(3)).unwrap();
    editor.type_text("abcdef");
    assert_eq!(editor.history().undo_len(), 3);

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.value(), "abcd");
}
