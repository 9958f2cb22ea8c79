//! PNG and JSON export.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use crate::software::{SoftwareRenderer, to_rgba8};
use battlemap_core::Canvas;
use battlemap_core::shapes::SerializableColor;

/// How a PNG export is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Output pixels per logical pixel.
    pub pixel_ratio: f64,
    /// Background fill. `None` keeps the export transparent.
    pub background: Option<SerializableColor>,
    /// Outline color for the selected node. `None` leaves it out.
    pub selection: Option<SerializableColor>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            background: None,
            selection: None,
        }
    }
}

impl ExportOptions {
    pub fn with_pixel_ratio(pixel_ratio: f64) -> Self {
        Self {
            pixel_ratio,
            ..Self::default()
        }
    }
}

/// Result of PNG rendering - contains the raw RGBA pixel data and dimensions.
#[derive(Debug)]
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Render the current view at `pixel_ratio` times the viewport size.
///
/// The grid is included when visible, using the lines from the canvas'
/// last idle tick.
pub fn render_png(canvas: &Canvas, options: &ExportOptions) -> RenderResult<PngRenderResult> {
    let ctx = RenderContext::new(canvas)
        .with_scale_factor(options.pixel_ratio)
        .with_background(options.background)
        .with_selection(options.selection);
    let mut renderer = SoftwareRenderer::new();
    renderer.build_scene(&ctx)?;
    let frame = renderer
        .take_frame()
        .ok_or_else(|| RendererError::RenderFailed("no frame produced".to_string()))?;
    Ok(PngRenderResult {
        rgba_data: to_rgba8(&frame),
        width: frame.width(),
        height: frame.height(),
    })
}

/// Export the current view as PNG bytes.
///
/// Only allowed while the watermark is on the map.
pub fn export_png(canvas: &Canvas, options: &ExportOptions) -> RenderResult<Vec<u8>> {
    if !canvas.export_enabled() {
        return Err(RendererError::ExportDisabled);
    }
    let result = render_png(canvas, options)?;
    let png = encode_png(&result.rgba_data, result.width, result.height)?;
    log::info!(
        "Exported {}x{} PNG ({} bytes)",
        result.width,
        result.height,
        png.len()
    );
    Ok(png)
}

/// Export the map as JSON. Not implemented beyond the export gate.
pub fn export_json(canvas: &Canvas) -> RenderResult<()> {
    if !canvas.export_enabled() {
        return Err(RendererError::ExportDisabled);
    }
    log::info!("Exporting as JSON...");
    Ok(())
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {:?}", e);
            RendererError::Encode(e.to_string())
        })?;

        writer.write_image_data(rgba_data).map_err(|e| {
            log::error!("Failed to write PNG data: {:?}", e);
            RendererError::Encode(e.to_string())
        })?;
    }

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_export_requires_watermark() {
        let canvas = Canvas::default();
        assert!(matches!(
            export_png(&canvas, &ExportOptions::default()),
            Err(RendererError::ExportDisabled)
        ));
        assert!(matches!(export_json(&canvas), Err(RendererError::ExportDisabled)));
    }

    #[test]
    fn test_export_png_at_pixel_ratio() {
        let mut canvas = Canvas::default();
        canvas.resize(64.0, 32.0);
        canvas.drop_watermark(Point::new(32.0, 16.0), None);

        let png = export_png(&canvas, &ExportOptions::with_pixel_ratio(2.0)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 64));
        assert!(export_json(&canvas).is_ok());
    }

    #[test]
    fn test_background_option_fills_export() {
        let mut canvas = Canvas::default();
        canvas.resize(40.0, 40.0);
        canvas.toggle_grid();
        canvas.drop_watermark(Point::new(200.0, 200.0), None);

        let options = ExportOptions {
            background: Some(SerializableColor::from_hex("#102030")),
            ..ExportOptions::default()
        };
        let result = render_png(&canvas, &options).unwrap();
        assert_eq!(&result.rgba_data[..4], &[0x10, 0x20, 0x30, 255]);

        let plain = render_png(&canvas, &ExportOptions::default()).unwrap();
        assert!(plain.rgba_data.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        assert!(encode_png(&[0, 0, 0], 2, 2).is_err());
    }
}
