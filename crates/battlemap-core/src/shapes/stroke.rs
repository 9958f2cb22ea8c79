//! Freehand stroke node (draw or erase).

use super::{NodeId, NodeTrait, SerializableColor, distance_to_segment, points_bounds};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How a node's pixels combine with layer content drawn before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Paint over existing content.
    #[default]
    SourceOver,
    /// Remove existing content where this node covers it.
    DestinationOut,
}

/// A polyline with round caps and joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: NodeId,
    /// Points in drawing order.
    pub points: Vec<Point>,
    /// Stroke color (irrelevant when erasing).
    pub color: SerializableColor,
    /// Stroke width in world units.
    pub width: f64,
    /// Compositing mode against earlier layer content.
    pub composite: CompositeMode,
}

impl Stroke {
    /// Create a stroke with an existing id.
    pub fn new(
        id: NodeId,
        points: Vec<Point>,
        color: SerializableColor,
        width: f64,
        composite: CompositeMode,
    ) -> Self {
        Self {
            id,
            points,
            color,
            width,
            composite,
        }
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl NodeTrait for Stroke {
    fn id(&self) -> NodeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let half = self.width / 2.0;
        points_bounds(&self.points).inflate(half, half)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.width / 2.0;
        match self.points.as_slice() {
            [] => false,
            [only] => (point - *only).hypot() <= reach,
            points => points
                .windows(2)
                .any(|w| distance_to_segment(point, w[0], w[1]) <= reach),
        }
    }
}
