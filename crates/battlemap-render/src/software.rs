//! CPU renderer producing RGBA frames with tiny-skia.

use crate::glyphs::GlyphCache;
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use battlemap_core::shapes::{
    CompositeMode, Figure, FigureKind, Image, Node, NodeId, NodeTrait, SerializableColor, Stroke,
};
use kurbo::{Affine, Point, Rect};
use std::collections::HashMap;
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, Transform,
};

/// Software renderer.
///
/// The grid and the map content are rasterized into separate pixmaps and
/// the content is composited on top, so erase strokes never cut into the
/// grid.
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    frame: Option<Pixmap>,
    /// Decoded embedded images by node id. `None` marks a decode failure.
    image_cache: HashMap<NodeId, Option<Pixmap>>,
    glyphs: GlyphCache,
}

/// Build a pixmap from straight-alpha RGBA8 pixels.
pub(crate) fn pixmap_from_rgba(rgba: &[u8], width: u32, height: u32) -> Option<Pixmap> {
    let size = IntSize::from_wh(width, height)?;
    let premultiplied = rgba
        .chunks_exact(4)
        .flat_map(|p| {
            let alpha = u16::from(p[3]);
            let scale = |v: u8| (u16::from(v) * alpha / 255) as u8;
            [scale(p[0]), scale(p[1]), scale(p[2]), p[3]]
        })
        .collect();
    Pixmap::from_vec(premultiplied, size)
}

/// Straight-alpha RGBA8 pixels of a pixmap.
pub fn to_rgba8(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}

fn skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn paint(color: SerializableColor, composite: CompositeMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color.r, color.g, color.b, color.a));
    paint.anti_alias = true;
    if composite == CompositeMode::DestinationOut {
        paint.blend_mode = BlendMode::DestinationOut;
    }
    paint
}

fn polyline(points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x as f32, first.y as f32);
    for point in rest {
        builder.line_to(point.x as f32, point.y as f32);
    }
    if close {
        builder.close();
    }
    builder.finish()
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last rendered frame.
    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Take ownership of the last rendered frame.
    pub fn take_frame(&mut self) -> Option<Pixmap> {
        self.frame.take()
    }

    fn render_node(&mut self, node: &Node, ctx: &RenderContext, pixmap: &mut Pixmap) {
        let transform = ctx.transform();
        match node {
            Node::Stroke(stroke) => render_stroke(stroke, skia_transform(transform), pixmap),
            Node::Figure(figure) => render_figure(figure, skia_transform(transform), pixmap),
            Node::Text(text) => self.glyphs.draw(
                text,
                &ctx.canvas.fonts,
                transform,
                ctx.pixels_per_unit(),
                pixmap,
            ),
            Node::Image(image) => self.render_image(image, transform, pixmap),
        }
    }

    fn render_image(&mut self, image: &Image, transform: Affine, pixmap: &mut Pixmap) {
        let decoded = self
            .image_cache
            .entry(image.id())
            .or_insert_with(|| decode(image));
        let rect = image.as_rect();
        match decoded {
            Some(pixels) => {
                let placement = transform
                    * Affine::translate(rect.origin().to_vec2())
                    * Affine::scale_non_uniform(
                        rect.width() / f64::from(pixels.width()),
                        rect.height() / f64::from(pixels.height()),
                    );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, pixels.as_ref(), &paint, skia_transform(placement), None);
            }
            None => render_image_placeholder(transform.transform_rect_bbox(rect), pixmap),
        }
    }
}

fn decode(image: &Image) -> Option<Pixmap> {
    let raw = image.data()?;
    match ::image::load_from_memory(&raw) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            pixmap_from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        }
        Err(e) => {
            log::warn!("Failed to decode image {}: {}", image.id(), e);
            None
        }
    }
}

fn render_grid(ctx: &RenderContext, pixmap: &mut Pixmap) {
    if ctx.canvas.grid_stale() {
        log::debug!("Rendering grid lines computed before the last viewport change");
    }
    let lines = ctx.canvas.grid_lines();
    let mut builder = PathBuilder::new();
    for line in lines.vertical.iter().chain(lines.horizontal.iter()) {
        builder.move_to(line.start.x as f32, line.start.y as f32);
        builder.line_to(line.end.x as f32, line.end.y as f32);
    }
    let Some(path) = builder.finish() else {
        return;
    };
    let stroke = tiny_skia::Stroke {
        width: lines.stroke_width as f32,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(
        &path,
        &paint(ctx.grid_color, CompositeMode::SourceOver),
        &stroke,
        skia_transform(ctx.transform()),
        None,
    );
}

fn render_stroke(stroke: &Stroke, transform: Transform, pixmap: &mut Pixmap) {
    let paint = paint(stroke.color, stroke.composite);
    match stroke.points.as_slice() {
        [] => {}
        [only] => {
            let radius = (stroke.width / 2.0) as f32;
            if let Some(dot) = PathBuilder::from_circle(only.x as f32, only.y as f32, radius) {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
            }
        }
        points => {
            let Some(path) = polyline(points, false) else {
                return;
            };
            let line = tiny_skia::Stroke {
                width: stroke.width as f32,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..tiny_skia::Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &line, transform, None);
        }
    }
}

fn render_figure(figure: &Figure, transform: Transform, pixmap: &mut Pixmap) {
    let path = match figure.kind {
        FigureKind::Circle => PathBuilder::from_circle(
            figure.position.x as f32,
            figure.position.y as f32,
            figure.radius() as f32,
        ),
        _ => polyline(&figure.outline(), true),
    };
    let Some(path) = path else {
        return;
    };
    if let Some(fill) = figure.fill {
        pixmap.fill_path(
            &path,
            &paint(fill, CompositeMode::SourceOver),
            FillRule::Winding,
            transform,
            None,
        );
    }
    if figure.stroke_width > 0.0 {
        let outline = tiny_skia::Stroke {
            width: figure.stroke_width as f32,
            ..tiny_skia::Stroke::default()
        };
        pixmap.stroke_path(
            &path,
            &paint(figure.stroke_color, CompositeMode::SourceOver),
            &outline,
            transform,
            None,
        );
    }
}

/// Gray box with an X, in pixel coordinates.
fn render_image_placeholder(rect: Rect, pixmap: &mut Pixmap) {
    let Some(bounds) = skia_rect(rect) else {
        return;
    };
    let identity = Transform::identity();
    pixmap.fill_rect(
        bounds,
        &paint(SerializableColor::new(200, 200, 200, 255), CompositeMode::SourceOver),
        identity,
        None,
    );

    let line = tiny_skia::Stroke {
        width: 2.0,
        ..tiny_skia::Stroke::default()
    };
    let mut cross = PathBuilder::new();
    cross.move_to(bounds.left(), bounds.top());
    cross.line_to(bounds.right(), bounds.bottom());
    cross.move_to(bounds.right(), bounds.top());
    cross.line_to(bounds.left(), bounds.bottom());
    if let Some(cross) = cross.finish() {
        pixmap.stroke_path(
            &cross,
            &paint(SerializableColor::new(150, 150, 150, 255), CompositeMode::SourceOver),
            &line,
            identity,
            None,
        );
    }
    pixmap.stroke_path(
        &PathBuilder::from_rect(bounds),
        &paint(SerializableColor::new(100, 100, 100, 255), CompositeMode::SourceOver),
        &line,
        identity,
        None,
    );
}

fn new_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height).ok_or(RendererError::InvalidSize { width, height })
}

impl Renderer for SoftwareRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let (width, height) = ctx.pixel_size()?;

        let mut frame = new_pixmap(width, height)?;
        if let Some(background) = self.background_color(ctx) {
            frame.fill(Color::from_rgba8(background.r, background.g, background.b, background.a));
        }
        if ctx.show_grid {
            render_grid(ctx, &mut frame);
        }

        let mut content = new_pixmap(width, height)?;
        let layer = ctx.canvas.layer();
        for node in layer.nodes() {
            self.render_node(node, ctx, &mut content);
        }
        frame.draw_pixmap(
            0,
            0,
            content.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        if let (Some(color), Some(node)) = (
            ctx.selection_color,
            ctx.canvas.selection().and_then(|id| layer.node(id)),
        ) {
            let bounds = ctx.transform().transform_rect_bbox(node.bounds()).inflate(2.0, 2.0);
            if let Some(bounds) = skia_rect(bounds) {
                let outline = tiny_skia::Stroke {
                    width: 2.0,
                    ..tiny_skia::Stroke::default()
                };
                frame.stroke_path(
                    &PathBuilder::from_rect(bounds),
                    &paint(color, CompositeMode::SourceOver),
                    &outline,
                    Transform::identity(),
                    None,
                );
            }
        }

        // Drop cached decodes for images no longer on the layer
        self.image_cache.retain(|id, _| layer.node(*id).is_some());

        self.frame = Some(frame);
        Ok(())
    }
}
