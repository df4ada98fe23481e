use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use inline_editor_core::{EditorConfig, InlineEditor, InputEvent, KeyEvent, RecordingSurface};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "inline-story")]
#[command(about = "Replay a scripted editing session against the inline editor")]
struct Args {
    /// Session file: editor config plus the steps to replay.
    session: PathBuf,

    /// Also print the editable node tree as JSON.
    #[arg(long)]
    tree: bool,

    /// Cut the read-only rendering to this many chars.
    #[arg(long)]
    truncate: Option<usize>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Deserialize)]
struct Session {
    #[serde(default)]
    config: EditorConfig,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Type(String),
    Key(KeyEvent),
    Input(InputEvent),
    Select { anchor: usize, focus: usize },
    Caret(usize),
    Mention(usize),
    Undo,
    Redo,
    SetValue(String),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw = std::fs::read_to_string(&args.session)
        .with_context(|| format!("reading {}", args.session.display()))?;
    let session: Session = serde_json::from_str(&raw).context("parsing session")?;
    info!(steps = session.steps.len(), "loaded session");

    let mut editor = InlineEditor::new(session.config).context("building editor")?;
    editor.on_change(|value| debug!(%value, "value changed"));

    for (ix, step) in session.steps.into_iter().enumerate() {
        debug!(step = ix, ?step, "replaying");
        match step {
            Step::Type(text) => editor.type_text(&text),
            Step::Key(event) => {
                let outcome = editor.handle_key(&event);
                debug!(key = %event.key, ?outcome, "key handled");
            }
            Step::Input(event) => {
                editor.handle_input(&event);
            }
            Step::Select { anchor, focus } => editor.set_selection(anchor, focus),
            Step::Caret(offset) => editor.set_caret(offset),
            Step::Mention(index) => {
                if !editor.select_mention(index) {
                    info!(index, "no suggestion to pick");
                }
            }
            Step::Undo => {
                editor.undo();
            }
            Step::Redo => {
                editor.redo();
            }
            Step::SetValue(value) => editor.set_value(&value),
        }
    }

    let mut surface = RecordingSurface::default();
    editor.commit_to(&mut surface);

    println!("{}", editor.value());
    if args.tree {
        println!("{}", serde_json::to_string_pretty(&surface.nodes)?);
    }

    let renderer = editor.renderer();
    let display = match args.truncate {
        Some(limit) => renderer.render_truncated(editor.value(), limit),
        None => renderer.render_step(editor.value(), 0),
    };
    println!("{}", serde_json::to_string_pretty(&display.nodes)?);
    if display.truncated {
        println!("(read more)");
    }
    println!(
        "caret {} | undo {} | redo {}",
        surface.caret,
        editor.history().undo_len(),
        editor.history().redo_len()
    );
    info!("session finished");
    Ok(())
}
