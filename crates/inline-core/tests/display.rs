use inline_editor_core::{Candidate, EmojiTable, Node, PatternRegistry, Renderer, Tag};

#[test]
fn renders_markup_mentions_and_emoji() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let users = vec![Candidate::new("1", "bob")];
    let renderer = Renderer::new(&registry, &emoji, &users);

    assert_eq!(
        renderer.render("hi *there* @bob :fire:"),
        vec![
            Node::text("hi "),
            Node::element(Tag::Strong, vec![Node::text("there")]),
            Node::text(" "),
            Node::mention("1", "bob"),
            Node::text(" 🔥"),
        ]
    );
}

#[test]
fn truncation_stops_at_a_word() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let renderer = Renderer::new(&registry, &emoji, &[]);

    let cut = renderer.render_truncated("alpha beta gamma delta", 12);
    assert!(cut.truncated);
    assert_eq!(cut.nodes, vec![Node::text("alpha beta")]);

    let whole = renderer.render_truncated("alpha", 12);
    assert!(!whole.truncated);
}

#[test]
fn truncation_never_splits_a_mention() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let users = vec![Candidate::new("1", "Bob Smith")];
    let renderer = Renderer::new(&registry, &emoji, &users);

    let cut = renderer.render_truncated("hi @Bob Smith ok", 10);
    assert!(cut.truncated);
    assert_eq!(cut.nodes, vec![Node::text("hi ")]);
}

#[test]
fn truncation_descends_into_elements() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let renderer = Renderer::new(&registry, &emoji, &[]);

    let cut = renderer.render_truncated("*one two three*", 9);
    assert_eq!(
        cut.nodes,
        vec![Node::element(Tag::Strong, vec![Node::text("one two")])]
    );
}

#[test]
fn short_messages_render_whole_at_any_step() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let renderer = Renderer::new(&registry, &emoji, &[]);

    let step = renderer.render_step("short", 0);
    assert!(!step.truncated);
    assert_eq!(step.nodes, vec![Node::text("short")]);

    let long = "word ".repeat(400);
    let first = renderer.render_step(&long, 0);
    assert!(first.truncated);
    assert!(!renderer.render_step(&long, 1).truncated);
}

#[test]
fn shortcode_after_a_clock_time_still_renders() {
    let registry = PatternRegistry::builtin();
    let emoji = EmojiTable::builtin();
    let renderer = Renderer::new(&registry, &emoji, &[]);

    assert_eq!(renderer.render("at 12:30:fire:"), vec![Node::text("at 12:30🔥")]);
}
