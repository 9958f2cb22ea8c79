//! Infinite grid: visible line extents and snapping.

use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};

/// Default grid cell size in world units.
pub const DEFAULT_CELL_SIZE: f64 = 50.0;

/// Round half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Snap a point to the nearest grid intersection.
///
/// Each axis is rounded independently; exact halves round toward positive
/// infinity, so 125 snaps to 150 and -125 snaps to -100 with 50 unit cells.
pub fn snap_to_grid(point: Point, cell_size: f64) -> Point {
    Point::new(
        round_half_up(point.x / cell_size) * cell_size,
        round_half_up(point.y / cell_size) * cell_size,
    )
}

/// Snap only when `enabled`.
pub fn snap_if(point: Point, cell_size: f64, enabled: bool) -> Point {
    if enabled {
        snap_to_grid(point, cell_size)
    } else {
        point
    }
}

/// A grid line segment in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub start: Point,
    pub end: Point,
}

/// Grid lines covering one viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLines {
    /// Vertical lines, left to right.
    pub vertical: Vec<GridLine>,
    /// Horizontal lines, top to bottom.
    pub horizontal: Vec<GridLine>,
    /// Line width in world units (constant on screen regardless of zoom).
    pub stroke_width: f64,
    /// Cell size the lines were generated with.
    pub cell_size: f64,
}

impl GridLines {
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }

    /// Total number of line segments.
    pub fn len(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }
}

/// First and last grid coordinate covering `[origin, origin + extent]`.
fn axis_range(origin: f64, extent: f64, cell_size: f64) -> (f64, usize) {
    let start = (origin / cell_size).floor() * cell_size;
    let end = ((origin + extent) / cell_size).ceil() * cell_size;
    let steps = ((end - start) / cell_size).round().max(0.0) as usize;
    (start, steps)
}

/// Compute the grid lines visible through a viewport.
///
/// `offset` is the stage translation in screen pixels and `scale` the uniform
/// zoom. The viewport's top-left corner sits at world `-offset / scale` and
/// spans `size / scale` world units. Lines start at the greatest multiple of
/// `cell_size` at or before that corner and continue one cell at a time
/// through the first multiple at or past the far edge.
pub fn compute_grid_lines(offset: Vec2, scale: f64, size: Size, cell_size: f64) -> GridLines {
    if !(scale > 0.0 && cell_size > 0.0) || !scale.is_finite() || !cell_size.is_finite() {
        return GridLines {
            cell_size,
            ..GridLines::default()
        };
    }

    let origin = Point::new(-offset.x / scale, -offset.y / scale);
    let (start_x, steps_x) = axis_range(origin.x, size.width / scale, cell_size);
    let (start_y, steps_y) = axis_range(origin.y, size.height / scale, cell_size);
    let end_x = start_x + steps_x as f64 * cell_size;
    let end_y = start_y + steps_y as f64 * cell_size;

    let vertical = (0..=steps_x)
        .map(|i| {
            let x = start_x + i as f64 * cell_size;
            GridLine {
                start: Point::new(x, start_y),
                end: Point::new(x, end_y),
            }
        })
        .collect();

    let horizontal = (0..=steps_y)
        .map(|i| {
            let y = start_y + i as f64 * cell_size;
            GridLine {
                start: Point::new(start_x, y),
                end: Point::new(end_x, y),
            }
        })
        .collect();

    GridLines {
        vertical,
        horizontal,
        stroke_width: 1.0 / scale,
        cell_size,
    }
}

/// Debounced grid recomputation.
///
/// Pan, zoom and resize call [`GridRefresh::request`]; any number of requests
/// before the next idle tick collapse into a single recomputation in
/// [`GridRefresh::flush`].
#[derive(Debug, Clone, Default)]
pub struct GridRefresh {
    pending: bool,
    lines: GridLines,
    computations: u64,
}

impl GridRefresh {
    /// Create a refresh with an initial computation already scheduled.
    pub fn new() -> Self {
        Self {
            pending: true,
            ..Self::default()
        }
    }

    /// Schedule a recomputation, replacing any already scheduled one.
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Whether a recomputation is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Run the scheduled recomputation, if any.
    pub fn flush(&mut self, viewport: &Viewport) -> Option<&GridLines> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.computations += 1;
        self.lines = viewport.grid_lines();
        Some(&self.lines)
    }

    /// The most recently computed lines.
    pub fn lines(&self) -> &GridLines {
        &self.lines
    }

    /// Number of recomputations performed so far.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
