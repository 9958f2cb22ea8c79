//! Renderer trait abstraction.

use battlemap_core::Canvas;
use battlemap_core::shapes::SerializableColor;
use kurbo::Affine;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Export is disabled until the watermark is on the map")]
    ExportDisabled,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The editor to render. Its viewport size is the frame size in logical
    /// pixels.
    pub canvas: &'a Canvas,
    /// Device pixel ratio; the frame is the viewport size times this.
    pub scale_factor: f64,
    /// Background fill. `None` leaves the frame transparent.
    pub background_color: Option<SerializableColor>,
    /// Whether to draw the grid layer.
    pub show_grid: bool,
    /// Grid line color.
    pub grid_color: SerializableColor,
    /// Outline drawn around the selected node, if any.
    pub selection_color: Option<SerializableColor>,
}

impl<'a> RenderContext<'a> {
    /// Create a context for the canvas' own viewport and grid visibility.
    pub fn new(canvas: &'a Canvas) -> Self {
        Self {
            canvas,
            scale_factor: 1.0,
            background_color: None,
            show_grid: canvas.grid_visible(),
            grid_color: SerializableColor::from_hex("#dddddd"),
            selection_color: None,
        }
    }

    /// Set the scale factor for HiDPI output.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Option<SerializableColor>) -> Self {
        self.background_color = color;
        self
    }

    /// Show or hide the grid.
    pub fn with_grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    /// Highlight the selected node.
    pub fn with_selection(mut self, color: Option<SerializableColor>) -> Self {
        self.selection_color = color;
        self
    }

    /// Output size in physical pixels.
    pub fn pixel_size(&self) -> RenderResult<(u32, u32)> {
        let size = self.canvas.viewport.size;
        let width = (size.width * self.scale_factor).round();
        let height = (size.height * self.scale_factor).round();
        if !(width >= 1.0 && height >= 1.0) || !width.is_finite() || !height.is_finite() {
            return Err(RendererError::InvalidSize {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            });
        }
        Ok((width as u32, height as u32))
    }

    /// World to physical pixel transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale_factor) * self.canvas.viewport.transform()
    }

    /// Physical pixels per world unit.
    pub fn pixels_per_unit(&self) -> f64 {
        self.scale_factor * self.canvas.viewport.scale
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Render one frame.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Option<SerializableColor> {
        ctx.background_color
    }
}
