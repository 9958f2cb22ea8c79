//! Recorded user edits.

use crate::scene::Layer;
use crate::shapes::{CompositeMode, Figure, Image, Node, NodeId, SerializableColor, Stroke, Text};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a stroke paints or erases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokeMode {
    Draw,
    Erase,
}

impl StrokeMode {
    /// Compositing mode used when the stroke is rendered.
    pub fn composite(self) -> CompositeMode {
        match self {
            StrokeMode::Draw => CompositeMode::SourceOver,
            StrokeMode::Erase => CompositeMode::DestinationOut,
        }
    }
}

/// A finished freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeAction {
    /// Id given to the node this stroke replays into.
    pub id: NodeId,
    pub mode: StrokeMode,
    /// Points in drawing order. Never empty.
    pub points: Vec<Point>,
    pub color: SerializableColor,
    pub width: f64,
}

/// Discriminant of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Stroke,
    AddShape,
    AddText,
    AddImage,
    Replace,
}

/// One undoable edit.
///
/// Actions carry everything needed to recreate their node, so the layer can
/// be rebuilt from the log at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Stroke(StrokeAction),
    AddShape(Figure),
    AddText(Text),
    AddImage(Image),
    /// Swap the node with the same id for this one, keeping its paint
    /// order. Used for text edits and moves.
    Replace(Node),
}

impl Action {
    /// Build a stroke action with a fresh node id.
    ///
    /// # Panics
    ///
    /// In debug builds, if `points` is empty. An empty stroke is a caller bug.
    pub fn stroke(mode: StrokeMode, points: Vec<Point>, color: SerializableColor, width: f64) -> Self {
        debug_assert!(!points.is_empty(), "stroke actions need at least one point");
        Action::Stroke(StrokeAction {
            id: Uuid::new_v4(),
            mode,
            points,
            color,
            width,
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Stroke(_) => ActionKind::Stroke,
            Action::AddShape(_) => ActionKind::AddShape,
            Action::AddText(_) => ActionKind::AddText,
            Action::AddImage(_) => ActionKind::AddImage,
            Action::Replace(_) => ActionKind::Replace,
        }
    }

    /// Id of the node this action produces.
    pub fn node_id(&self) -> NodeId {
        use crate::shapes::NodeTrait;
        match self {
            Action::Stroke(stroke) => stroke.id,
            Action::AddShape(figure) => figure.id(),
            Action::AddText(text) => text.id(),
            Action::AddImage(image) => image.id(),
            Action::Replace(node) => node.id(),
        }
    }

    /// Instantiate the renderable node for this action.
    pub fn to_node(&self) -> Node {
        match self {
            Action::Stroke(stroke) => Node::Stroke(Stroke::new(
                stroke.id,
                stroke.points.clone(),
                stroke.color,
                stroke.width,
                stroke.mode.composite(),
            )),
            Action::AddShape(figure) => Node::Figure(figure.clone()),
            Action::AddText(text) => Node::Text(text.clone()),
            Action::AddImage(image) => Node::Image(image.clone()),
            Action::Replace(node) => node.clone(),
        }
    }

    /// Apply this action to the layer: add its node on top, or replace the
    /// node it targets.
    pub fn apply(&self, layer: &mut Layer) {
        match self {
            Action::Replace(node) => {
                if !layer.replace(node.clone()) {
                    log::debug!("Replace target {} is not on the layer", self.node_id());
                }
            }
            _ => layer.add(self.to_node()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FigureKind, NodeTrait};

    #[test]
    fn test_erase_stroke_subtracts() {
        let action = Action::stroke(
            StrokeMode::Erase,
            vec![Point::new(0.0, 0.0)],
            SerializableColor::white(),
            20.0,
        );
        let node = action.to_node();
        assert!(node.is_eraser());
        assert_eq!(node.id(), action.node_id());
    }

    #[test]
    fn test_shape_action_keeps_node() {
        let figure = Figure::new(Uuid::new_v4(), FigureKind::Circle, Point::new(5.0, 5.0), 50.0);
        let action = Action::AddShape(figure.clone());
        assert_eq!(action.kind(), ActionKind::AddShape);
        assert_eq!(action.to_node(), Node::Figure(figure));
    }

    #[test]
    fn test_replace_keeps_paint_order() {
        let mut layer = Layer::new();
        let back = Figure::new(Uuid::new_v4(), FigureKind::Rectangle, Point::ZERO, 50.0);
        let front = Figure::new(Uuid::new_v4(), FigureKind::Circle, Point::ZERO, 50.0);
        Action::AddShape(back.clone()).apply(&mut layer);
        Action::AddShape(front.clone()).apply(&mut layer);

        let mut moved = back.clone();
        moved.position = Point::new(100.0, 0.0);
        Action::Replace(Node::Figure(moved.clone())).apply(&mut layer);

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.nodes()[0], Node::Figure(moved));
        assert_eq!(layer.nodes()[1].id(), front.id());
    }

    #[test]
    fn test_replace_missing_target_is_ignored() {
        let mut layer = Layer::new();
        let figure = Figure::new(Uuid::new_v4(), FigureKind::Rectangle, Point::ZERO, 50.0);
        Action::Replace(Node::Figure(figure)).apply(&mut layer);
        assert!(layer.is_empty());
    }
}
