//! Tool selection and pointer routing.

use crate::action::StrokeMode;
use crate::shapes::{FigureKind, SerializableColor};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Draw,
    Erase,
    Text,
    Shape,
    Select,
}

impl ToolKind {
    /// Identifier used by the toolbox and scripts.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Draw => "draw",
            ToolKind::Erase => "erase",
            ToolKind::Text => "text",
            ToolKind::Shape => "shape",
            ToolKind::Select => "select",
        }
    }

    /// Parse a tool identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "draw" => Some(ToolKind::Draw),
            "erase" => Some(ToolKind::Erase),
            "text" => Some(ToolKind::Text),
            "shape" => Some(ToolKind::Shape),
            "select" => Some(ToolKind::Select),
            _ => None,
        }
    }
}

/// What a left-button press should do under the current tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRoute {
    /// Start a freehand stroke.
    BeginStroke(StrokeMode),
    /// Place a text node.
    PlaceText,
    /// Place a figure.
    PlaceShape,
    /// Pick the node under the pointer.
    Select,
}

/// Options for the draw tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOptions {
    pub color: SerializableColor,
    pub size: f64,
    pub snap: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            size: 5.0,
            snap: false,
        }
    }
}

/// Options for the erase tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraseOptions {
    pub size: f64,
    pub snap: bool,
}

impl Default for EraseOptions {
    fn default() -> Self {
        Self {
            size: 20.0,
            snap: false,
        }
    }
}

/// Options for the text tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub width: f64,
    pub color: SerializableColor,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            content: "Enter text".to_string(),
            font_family: "Arial".to_string(),
            font_size: 50.0,
            width: 400.0,
            color: SerializableColor::white(),
        }
    }
}

/// Options for the shape tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeOptions {
    pub kind: FigureKind,
    pub fill: SerializableColor,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    pub snap: bool,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            kind: FigureKind::Rectangle,
            fill: SerializableColor::white(),
            stroke: SerializableColor::black(),
            stroke_width: 2.0,
            snap: false,
        }
    }
}

/// Per-tool options, as shown in the tool options panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub draw: DrawOptions,
    pub erase: EraseOptions,
    pub text: TextOptions,
    pub shape: ShapeOptions,
}

impl ToolSettings {
    /// Snap option of a tool, if it has one.
    pub fn snap(&self, tool: ToolKind) -> Option<bool> {
        match tool {
            ToolKind::Draw => Some(self.draw.snap),
            ToolKind::Erase => Some(self.erase.snap),
            ToolKind::Shape => Some(self.shape.snap),
            ToolKind::Text | ToolKind::Select => None,
        }
    }

    /// Set the snap option of a tool. Tools without one are ignored.
    pub fn set_snap(&mut self, tool: ToolKind, snap: bool) {
        match tool {
            ToolKind::Draw => self.draw.snap = snap,
            ToolKind::Erase => self.erase.snap = snap,
            ToolKind::Shape => self.shape.snap = snap,
            ToolKind::Text | ToolKind::Select => {}
        }
    }
}

/// Holds the single active tool.
///
/// There is no transition table: any tool may follow any other, and
/// selecting the active tool again turns it off.
#[derive(Debug, Clone, Default)]
pub struct ToolDispatcher {
    current: Option<ToolKind>,
    /// Options for every tool.
    pub settings: ToolSettings,
}

impl ToolDispatcher {
    /// Create a dispatcher with no tool selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active tool.
    pub fn current(&self) -> Option<ToolKind> {
        self.current
    }

    /// Select a tool, or deselect it if it is already active.
    /// Returns the tool active afterwards.
    pub fn select(&mut self, tool: ToolKind) -> Option<ToolKind> {
        self.current = if self.current == Some(tool) {
            None
        } else {
            Some(tool)
        };
        self.current
    }

    /// Deselect the current tool.
    pub fn deselect(&mut self) {
        self.current = None;
    }

    /// Route a left-button press. With no tool active the press selects.
    pub fn route(&self) -> PointerRoute {
        match self.current {
            Some(ToolKind::Draw) => PointerRoute::BeginStroke(StrokeMode::Draw),
            Some(ToolKind::Erase) => PointerRoute::BeginStroke(StrokeMode::Erase),
            Some(ToolKind::Text) => PointerRoute::PlaceText,
            Some(ToolKind::Shape) => PointerRoute::PlaceShape,
            Some(ToolKind::Select) | None => PointerRoute::Select,
        }
    }

    /// Whether the current tool snaps, with Shift forcing it on.
    pub fn snapping(&self, shift: bool) -> bool {
        shift
            || self
                .current
                .and_then(|tool| self.settings.snap(tool))
                .unwrap_or(false)
    }

    /// Whether images can be dragged under the current tool.
    pub fn images_draggable(&self) -> bool {
        !matches!(self.current, Some(ToolKind::Draw | ToolKind::Erase))
    }
}
