//! ledit - a terse line-oriented text editor
//!
//! Keeps the whole document as numbered lines and edits it through short
//! commands typed at a prompt.

mod core;
mod editor;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::config::EditorConfig;
use crate::core::file_system;
use crate::core::line_store::LineStore;
use crate::editor::Editor;

fn main() -> ExitCode {
    // Logging goes to stderr; stdout carries the prompts and listings.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::WARN)
        .init();

    let mut args = std::env::args().skip(1);
    let file_arg = args.next();
    if args.next().is_some() {
        println!("ledit provided with too many arguments.");
        println!("ledit takes either no arguments or a valid filename as an argument.");
        return ExitCode::from(2);
    }

    match run(file_arg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("editor session failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(file_arg: Option<String>) -> anyhow::Result<()> {
    let config = EditorConfig::load().unwrap_or_default();

    let mut store = LineStore::new();
    let file_name = file_arg.and_then(|arg| match file_system::validate_file_name(&arg) {
        Ok(()) => {
            let name = file_system::ensure_extension(&arg, &config.default_extension);
            populate_store(&mut store, &name);
            Some(name)
        }
        Err(reason) => {
            // The session continues unnamed; E will prompt for a name.
            println!("{}", reason);
            tracing::warn!("ignoring filename argument {:?}: {}", arg, reason);
            None
        }
    });

    let mut editor = Editor::new(store, config, file_name, io::stdin().lock(), io::stdout());
    editor.run()
}

/// Load an existing file into the store; a missing file just means a fresh
/// document under that name.
fn populate_store(store: &mut LineStore, name: &str) {
    if !file_system::file_exists(Path::new(name)) {
        return;
    }
    match file_system::load_lines(Path::new(name)) {
        Ok(lines) => {
            for (pos, text) in lines.into_iter().enumerate() {
                store.add(pos + 1, text);
            }
        }
        Err(e) => {
            println!("{}", e);
            tracing::warn!("starting with an empty document: {}", e);
        }
    }
}
