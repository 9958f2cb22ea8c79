//! Node definitions for the editable map layer.

mod figure;
mod image;
mod stroke;
mod text;

pub use figure::{Figure, FigureKind};
pub use image::{Image, ImageFormat, ImageSource};
pub use stroke::{CompositeMode, Stroke};
pub use text::Text;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node.
pub type NodeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS-style hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`).
    ///
    /// Anything unrecognised falls back to black, matching what a color
    /// input hands back when it has no value.
    pub fn from_hex(color: &str) -> Self {
        if color == "transparent" {
            return Self::transparent();
        }

        color
            .trim()
            .strip_prefix('#')
            .and_then(parse_hex)
            .unwrap_or_else(Self::black)
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

fn parse_hex(hex: &str) -> Option<SerializableColor> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |from: usize, len: usize| u8::from_str_radix(&hex[from..from + len], 16).ok();

    match hex.len() {
        // #rgb -> #rrggbb
        3 => Some(SerializableColor::new(
            channel(0, 1)? * 17,
            channel(1, 1)? * 17,
            channel(2, 1)? * 17,
            255,
        )),
        6 => Some(SerializableColor::new(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 255)),
        8 => Some(SerializableColor::new(
            channel(0, 2)?,
            channel(2, 2)?,
            channel(4, 2)?,
            channel(6, 2)?,
        )),
        _ => None,
    }
}

/// Common behaviour of every node kind.
pub trait NodeTrait {
    /// Get the node's unique identifier.
    fn id(&self) -> NodeId;

    /// Axis-aligned bounds in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check whether a world point hits this node.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;
}

/// A renderable node on the editable layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Stroke(Stroke),
    Figure(Figure),
    Text(Text),
    Image(Image),
}

impl Node {
    /// Optional node name (used to look up well-known nodes such as the watermark).
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Image(image) => image.name.as_deref(),
            _ => None,
        }
    }

    /// How this node combines with content drawn before it.
    pub fn composite(&self) -> CompositeMode {
        match self {
            Node::Stroke(stroke) => stroke.composite,
            _ => CompositeMode::SourceOver,
        }
    }

    /// Offset the node by `delta` world units.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Node::Stroke(stroke) => {
                for point in stroke.points.iter_mut() {
                    *point += delta;
                }
            }
            Node::Figure(figure) => figure.position += delta,
            Node::Text(text) => text.position += delta,
            Node::Image(image) => image.position += delta,
        }
    }

    /// Whether this node can be dragged with the select tool.
    pub fn is_draggable(&self) -> bool {
        matches!(self, Node::Figure(_) | Node::Image(_))
    }

    /// Whether this node removes content instead of painting it.
    pub fn is_eraser(&self) -> bool {
        self.composite() == CompositeMode::DestinationOut
    }
}

impl NodeTrait for Node {
    fn id(&self) -> NodeId {
        match self {
            Node::Stroke(n) => n.id(),
            Node::Figure(n) => n.id(),
            Node::Text(n) => n.id(),
            Node::Image(n) => n.id(),
        }
    }

    fn bounds(&self) -> Rect {
        match self {
            Node::Stroke(n) => n.bounds(),
            Node::Figure(n) => n.bounds(),
            Node::Text(n) => n.bounds(),
            Node::Image(n) => n.bounds(),
        }
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Node::Stroke(n) => n.hit_test(point, tolerance),
            Node::Figure(n) => n.hit_test(point, tolerance),
            Node::Text(n) => n.hit_test(point, tolerance),
            Node::Image(n) => n.hit_test(point, tolerance),
        }
    }
}

/// Distance from a point to the segment `start..end`.
pub(crate) fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let line = end - start;
    let len_sq = line.hypot2();
    if len_sq < f64::EPSILON {
        return (point - start).hypot();
    }

    let t = ((point - start).dot(line) / len_sq).clamp(0.0, 1.0);
    (point - (start + line * t)).hypot()
}

/// Bounding box of a point set. Empty input yields `Rect::ZERO`.
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };

    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| {
            acc.union_pt(*p)
        })
}
