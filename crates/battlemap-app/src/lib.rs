//! Battle map application
//!
//! Headless shell around the editor core: replays scripted input,
//! exports PNGs and searches the image library from the command line.

mod app;
pub mod cli;
pub mod script;
mod shortcuts;

pub use app::{App, AppConfig};
pub use cli::{Cli, CliError, Command};
pub use script::{Script, ScriptError, ScriptResult, ScriptStep};
pub use shortcuts::{Chord, Shortcut, ShortcutRegistry};
