//! Viewport state: pan offset, zoom and the grid cell size.

use crate::config::EditorConfig;
use crate::grid::{GridLines, compute_grid_lines};
use kurbo::{Affine, Point, Size, Vec2};

/// Viewport manages the view transform for the map.
///
/// It handles panning (translation) and zooming (uniform scale), converting
/// between screen coordinates and world coordinates. Nothing here is
/// persisted; a fresh viewport always starts at the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Stage translation in screen pixels.
    pub offset: Vec2,
    /// Uniform zoom factor.
    pub scale: f64,
    /// Minimum allowed zoom.
    pub min_scale: f64,
    /// Maximum allowed zoom.
    pub max_scale: f64,
    /// Visible area in screen pixels.
    pub size: Size,
    /// Grid cell size in world units.
    pub cell_size: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl Viewport {
    /// Create a viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with the zoom limits and cell size of `config`.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            size: Size::new(800.0, 600.0),
            cell_size: config.cell_size,
        }
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    /// Returns false if the zoom was already at its limit.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> bool {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let world_point = self.screen_to_world(screen_point);
        self.scale = new_scale;

        // Adjust offset so world_point stays under screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
        true
    }

    /// Change the visible area.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Grid lines currently visible.
    pub fn grid_lines(&self) -> GridLines {
        compute_grid_lines(self.offset, self.scale, self.size, self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
        assert!((viewport.cell_size - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(50.0, 100.0);
        viewport.scale = 2.0;
        let world = viewport.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(30.0, -20.0);
        viewport.scale = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = viewport.world_to_screen(viewport.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_keeps_pointer_fixed() {
        let mut viewport = Viewport::new();
        let pointer = Point::new(200.0, 150.0);
        let before = viewport.screen_to_world(pointer);
        assert!(viewport.zoom_at(pointer, 1.1));
        let after = viewport.screen_to_world(pointer);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::new();
        viewport.zoom_at(Point::ZERO, 0.001);
        assert!((viewport.scale - viewport.min_scale).abs() < f64::EPSILON);
        assert!(!viewport.zoom_at(Point::ZERO, 0.9));

        viewport.zoom_at(Point::ZERO, 1000.0);
        assert!((viewport.scale - viewport.max_scale).abs() < f64::EPSILON);
    }

    #[test]
    fn test_limits_from_config() {
        let config = EditorConfig {
            cell_size: 40.0,
            max_scale: 2.0,
            ..EditorConfig::default()
        };
        let mut viewport = Viewport::from_config(&config);
        assert!((viewport.cell_size - 40.0).abs() < f64::EPSILON);
        viewport.zoom_at(Point::ZERO, 5.0);
        assert!((viewport.scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::new();
        viewport.pan(Vec2::new(10.0, 20.0));
        assert_eq!(viewport.offset, Vec2::new(10.0, 20.0));
    }
}
