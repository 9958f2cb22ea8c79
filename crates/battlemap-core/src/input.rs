//! Input events, the current gesture and requests back to the host UI.

use crate::action::StrokeMode;
use crate::config::Platform;
use crate::loads::LoadTicket;
use crate::shapes::{NodeId, SerializableColor};
use crate::tools::ToolKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Modifier for undo and redo: Ctrl, or Alt on macOS.
    pub fn primary(&self, platform: Platform) -> bool {
        match platform {
            Platform::Windows => self.ctrl,
            Platform::Mac => self.alt,
        }
    }

    /// Modifier for grid, new map and shortcut toggles: Alt, or Ctrl on macOS.
    pub fn secondary(&self, platform: Platform) -> bool {
        match platform {
            Platform::Windows => self.alt,
            Platform::Mac => self.ctrl,
        }
    }
}

/// Pointer event in screen coordinates.
///
/// `at` is the event timestamp, measured from any fixed origin the host
/// chooses. It only matters for telling a right click from a pan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        at: Duration,
    },
    Up {
        position: Point,
        button: MouseButton,
        #[serde(default)]
        at: Duration,
    },
    Move {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Keyboard event. Keys use DOM-style names ("z", "Escape", "Shift", "/").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Released {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

impl KeyEvent {
    pub fn pressed(key: impl Into<String>) -> Self {
        KeyEvent::Pressed {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pressed_with(key: impl Into<String>, modifiers: Modifiers) -> Self {
        KeyEvent::Pressed {
            key: key.into(),
            modifiers,
        }
    }

    pub fn released(key: impl Into<String>) -> Self {
        KeyEvent::Released {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }
}

/// The one pointer interaction in progress.
///
/// Transitions: `Idle → Drawing → Idle`, `Idle → RightPress → Panning → Idle`
/// and `Idle → RightPress → Idle` (a click). `Idle → Dragging → Idle` moves
/// a selected node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A freehand stroke being collected, points in world coordinates.
    Drawing {
        mode: StrokeMode,
        points: Vec<Point>,
        color: SerializableColor,
        width: f64,
    },
    /// Right button held but not yet moved past the pan threshold.
    RightPress {
        origin: Point,
        last: Point,
        started: Duration,
    },
    /// Panning the viewport with the right button.
    Panning { last: Point },
    /// Moving a node with the left button, world coordinates.
    Dragging {
        id: NodeId,
        origin: Point,
        last: Point,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, Gesture::Drawing { .. })
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, Gesture::Panning { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Gesture::Dragging { .. })
    }
}

/// What keyboard input is currently directed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Canvas,
    /// An inline text editor is open.
    TextEditing,
    /// The search box has focus.
    Search,
}

/// Requests from the editor to the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiRequest {
    /// Open the context menu at a screen position.
    ContextMenu(Point),
    /// Move keyboard focus to the search box.
    FocusSearch,
    /// Ask the user to confirm a new map with the given prompt.
    ConfirmNewMap(String),
    /// Show or hide the shortcut overlay.
    ToggleShortcuts,
    /// Grid visibility changed.
    GridVisibility(bool),
    /// Export buttons became enabled or disabled.
    ExportAvailability(bool),
    /// The active tool changed.
    ToolChanged(Option<ToolKind>),
    /// Load a font family, then report back with
    /// [`Canvas::complete_font_load`](crate::Canvas::complete_font_load).
    LoadFont { ticket: LoadTicket, family: String },
}
