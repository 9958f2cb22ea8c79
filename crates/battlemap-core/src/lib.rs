//! Battle map core library
//!
//! Platform-agnostic data structures and logic for the battle map designer:
//! the undoable action log, the layer rebuilt from it, viewport and grid
//! math, tools, and the [`Canvas`] editor that routes input between them.

pub mod action;
pub mod cache;
pub mod canvas;
pub mod config;
pub mod fonts;
pub mod grid;
pub mod history;
pub mod input;
pub mod loads;
pub mod scene;
pub mod search;
pub mod shapes;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use action::{Action, ActionKind, StrokeAction, StrokeMode};
pub use cache::LruCache;
pub use canvas::{Canvas, ExportGate, SubscriptionId};
pub use config::{EditorConfig, Platform, WATERMARK_NAME};
pub use fonts::{BUILTIN_FONTS, FontError, FontLibrary};
pub use grid::{DEFAULT_CELL_SIZE, GridLine, GridLines, compute_grid_lines, snap_to_grid};
pub use history::ActionLog;
pub use input::{Focus, Gesture, KeyEvent, Modifiers, MouseButton, PointerEvent, UiRequest};
pub use loads::{LoadError, LoadTicket, LoadedImage};
pub use scene::{Layer, SceneEvent};
pub use search::{MemoizedSearch, SearchHit, SearchIndex};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use tools::{ToolDispatcher, ToolKind, ToolSettings};
pub use viewport::Viewport;
