//! Placed figures: rectangles, circles and regular polygons.

use super::{NodeId, NodeTrait, SerializableColor, distance_to_segment, points_bounds};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Number of segments used to approximate a circle outline.
const CIRCLE_SEGMENTS: usize = 64;

/// Figure kinds offered by the shape tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FigureKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Pentagon,
}

impl FigureKind {
    /// Display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            FigureKind::Rectangle => "Rectangle",
            FigureKind::Circle => "Circle",
            FigureKind::Triangle => "Triangle",
            FigureKind::Pentagon => "Pentagon",
        }
    }

    /// Parse a display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(name))
    }

    /// All figure kinds.
    pub fn all() -> &'static [FigureKind] {
        &[
            FigureKind::Rectangle,
            FigureKind::Circle,
            FigureKind::Triangle,
            FigureKind::Pentagon,
        ]
    }

    /// Number of polygon sides for regular polygons.
    fn sides(&self) -> Option<usize> {
        match self {
            FigureKind::Triangle => Some(3),
            FigureKind::Pentagon => Some(5),
            _ => None,
        }
    }
}

/// A figure placed with the shape tool.
///
/// Rectangles are anchored at their top-left corner and are `size` wide and
/// tall. Every other kind is centered on `position` with radius `size / 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub(crate) id: NodeId,
    pub kind: FigureKind,
    /// Anchor point (top-left for rectangles, center otherwise).
    pub position: Point,
    /// Edge length for rectangles, diameter otherwise.
    pub size: f64,
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    /// Outline color.
    pub stroke_color: SerializableColor,
    /// Outline width.
    pub stroke_width: f64,
}

impl Figure {
    /// Create a new figure with default styling.
    pub fn new(id: NodeId, kind: FigureKind, position: Point, size: f64) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            fill: Some(SerializableColor::white()),
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
        }
    }

    /// Radius for centered kinds.
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Closed outline polygon in world coordinates (first point not repeated).
    pub fn outline(&self) -> Vec<Point> {
        match self.kind {
            FigureKind::Rectangle => {
                let r = self.as_rect();
                vec![
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                ]
            }
            FigureKind::Circle => regular_polygon(self.position, self.radius(), CIRCLE_SEGMENTS),
            kind => regular_polygon(self.position, self.radius(), kind.sides().unwrap_or(3)),
        }
    }

    fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.size, self.size))
    }
}

/// Vertices of a regular polygon with its first vertex straight up.
fn regular_polygon(center: Point, radius: f64, sides: usize) -> Vec<Point> {
    (0..sides)
        .map(|i| {
            let angle = TAU * i as f64 / sides as f64;
            center + Vec2::new(radius * angle.sin(), -radius * angle.cos())
        })
        .collect()
}

/// Even-odd point-in-polygon test.
fn polygon_contains(polygon: &[Point], point: Point) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, pi) in polygon.iter().enumerate() {
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl NodeTrait for Figure {
    fn id(&self) -> NodeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        match self.kind {
            FigureKind::Rectangle => self.as_rect(),
            FigureKind::Circle => {
                let r = self.radius();
                Rect::new(
                    self.position.x - r,
                    self.position.y - r,
                    self.position.x + r,
                    self.position.y + r,
                )
            }
            _ => points_bounds(&self.outline()),
        }
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let outline = self.outline();
        if self.fill.is_some() && polygon_contains(&outline, point) {
            return true;
        }

        let reach = tolerance + self.stroke_width / 2.0;
        outline
            .iter()
            .zip(outline.iter().cycle().skip(1))
            .any(|(a, b)| distance_to_segment(point, *a, *b) <= reach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_rectangle_bounds() {
        let fig = Figure::new(Uuid::new_v4(), FigureKind::Rectangle, Point::new(10.0, 10.0), 50.0);
        let bounds = fig.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 60.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_bounds_centered() {
        let fig = Figure::new(Uuid::new_v4(), FigureKind::Circle, Point::new(100.0, 100.0), 50.0);
        let bounds = fig.bounds();
        assert!((bounds.x0 - 75.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 125.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_triangle_first_vertex_points_up() {
        let fig = Figure::new(Uuid::new_v4(), FigureKind::Triangle, Point::new(0.0, 0.0), 50.0);
        let outline = fig.outline();
        assert_eq!(outline.len(), 3);
        assert!(outline[0].x.abs() < 1e-10);
        assert!((outline[0].y + 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_pentagon_has_five_sides() {
        let fig = Figure::new(Uuid::new_v4(), FigureKind::Pentagon, Point::ZERO, 50.0);
        assert_eq!(fig.outline().len(), 5);
    }

    #[test]
    fn test_hit_test_filled_and_outline() {
        let mut fig = Figure::new(Uuid::new_v4(), FigureKind::Rectangle, Point::ZERO, 50.0);
        assert!(fig.hit_test(Point::new(25.0, 25.0), 0.0));
        assert!(!fig.hit_test(Point::new(80.0, 25.0), 0.0));

        fig.fill = None;
        assert!(!fig.hit_test(Point::new(25.0, 25.0), 0.0));
        assert!(fig.hit_test(Point::new(50.5, 25.0), 0.0));
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(FigureKind::from_name("pentagon"), Some(FigureKind::Pentagon));
        assert_eq!(FigureKind::from_name("Hexagon"), None);
    }
}
