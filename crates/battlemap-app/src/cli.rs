//! Command line interface.
//!
//!   battlemap replay map.json --out map.png --pixel-ratio 2 --background "#ffffff"
//!   battlemap search forest --page 2
//!   battlemap shortcuts

use crate::app::{App, AppConfig};
use crate::script::{Script, ScriptResult};
use crate::shortcuts::ShortcutRegistry;
use battlemap_core::shapes::SerializableColor;
use battlemap_core::storage::{FileStorage, StorageResult};
use battlemap_core::{EditorConfig, FontError, MemoizedSearch, SearchHit, SearchIndex, Storage};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Battle map designer, headless.
#[derive(Parser, Debug)]
#[command(name = "battlemap", about = "Replay, export and search battle maps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a JSON input script and optionally export the result.
    Replay {
        /// Script file.
        script: PathBuf,
        /// Write the exported PNG here.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Device pixel ratio of the export.
        #[arg(long, default_value_t = 1.0)]
        pixel_ratio: f64,
        /// Viewport width.
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        /// Viewport height.
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        /// Start with the grid hidden.
        #[arg(long)]
        no_grid: bool,
        /// Export background as hex, e.g. "#ffffff". Transparent by default.
        #[arg(long, value_name = "HEX")]
        background: Option<String>,
        /// Outline the selected node in this hex color.
        #[arg(long, value_name = "HEX")]
        selection: Option<String>,
        /// Storage directory holding imported fonts.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// Search the image library.
    Search {
        query: String,
        /// Storage directory. Defaults to the user data directory.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Result page, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List keyboard shortcuts.
    Shortcuts,
}

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Script(#[from] crate::script::ScriptError),
    #[error("Storage error: {0}")]
    Storage(#[from] battlemap_core::StorageError),
    #[error(transparent)]
    Font(#[from] FontError),
}

/// Run a parsed command.
pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Replay {
            script,
            out,
            pixel_ratio,
            width,
            height,
            no_grid,
            background,
            selection,
            store,
        } => {
            let config = AppConfig {
                width,
                height,
                pixel_ratio,
                show_grid: !no_grid,
                background: background.as_deref().map(SerializableColor::from_hex),
                selection: selection.as_deref().map(SerializableColor::from_hex),
                ..Default::default()
            };
            let mut app = App::new(config);
            if let Some(dir) = store {
                let loaded = app.canvas_mut().load_saved_fonts(&FileStorage::new(dir)?)?;
                log::info!("Loaded {} saved fonts", loaded);
            }
            replay(&mut app, &script, out)?;
        }
        Command::Search { query, store, page } => {
            let storage = match store {
                Some(dir) => FileStorage::new(dir)?,
                None => FileStorage::default_location()?,
            };
            let hits = search(&storage, &query, page)?;
            if hits.is_empty() {
                println!("No results for \"{}\"", query.trim());
            }
            for hit in hits {
                println!("{}  [{}]", hit.url, hit.keywords.join(", "));
            }
        }
        Command::Shortcuts => ShortcutRegistry::print_all(EditorConfig::default().platform),
    }
    Ok(())
}

fn replay(app: &mut App, script: &Path, out: Option<PathBuf>) -> ScriptResult<()> {
    let script = Script::load(script)?;
    app.replay(&script)?;
    if let Some(out) = out {
        app.export_to(&out)?;
    }
    Ok(())
}

/// One page of library results for a query.
pub fn search(storage: &dyn Storage, query: &str, page: usize) -> StorageResult<Vec<SearchHit>> {
    let config = EditorConfig::default();
    let index = SearchIndex::load(storage)?;
    log::debug!("Search index holds {} entries", index.len());
    let mut search = MemoizedSearch::new(index, config.search_cache_capacity, config.search_page_size);
    Ok(search.page(query, page))
}
