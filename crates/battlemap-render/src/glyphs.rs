//! Glyph rasterization for text nodes.

use crate::software::pixmap_from_rgba;
use battlemap_core::FontLibrary;
use battlemap_core::shapes::Text;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use kurbo::{Affine, Point};
use std::collections::HashMap;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Face for families that were not imported. The built-in families are
/// names only, with no bytes behind them.
const FALLBACK_FACE: &[u8] = epaint_default_fonts::UBUNTU_LIGHT;

fn parse(family: &str, bytes: &[u8]) -> Option<Font> {
    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Failed to parse font {}: {}", family, e);
            None
        }
    }
}

/// Parsed faces by family.
pub struct GlyphCache {
    fallback: Option<Font>,
    /// `None` marks imported bytes that did not parse.
    imported: HashMap<String, Option<Font>>,
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("fallback", &self.fallback.is_some())
            .field("imported", &self.imported.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self {
            fallback: parse("fallback", FALLBACK_FACE),
            imported: HashMap::new(),
        }
    }
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The imported face for `family`, or the fallback.
    fn font(&mut self, family: &str, library: &FontLibrary) -> Option<&Font> {
        let imported = library.data(family).is_some_and(|bytes| {
            self.imported
                .entry(family.to_string())
                .or_insert_with(|| parse(family, bytes))
                .is_some()
        });
        if imported {
            self.imported.get(family).and_then(Option::as_ref)
        } else {
            self.fallback.as_ref()
        }
    }

    /// Draw the wrapped lines of a text node.
    ///
    /// Lines come from [`Text::layout_lines`] so the drawn rows match the
    /// node's bounds and hit area. `scale` is pixels per world unit.
    pub fn draw(
        &mut self,
        text: &Text,
        library: &FontLibrary,
        transform: Affine,
        scale: f64,
        pixmap: &mut Pixmap,
    ) {
        let Some(font) = self.font(&text.font_family, library) else {
            return;
        };
        let px = (text.font_size * scale) as f32;
        if !(px >= 1.0) {
            return;
        }

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        for (row, line) in text.layout_lines().iter().enumerate() {
            let origin = transform
                * Point::new(
                    text.position.x,
                    text.position.y + row as f64 * text.font_size,
                );
            layout.reset(&LayoutSettings {
                x: origin.x as f32,
                y: origin.y as f32,
                ..LayoutSettings::default()
            });
            layout.append(&[font], &TextStyle::new(line, px, 0));

            for glyph in layout.glyphs() {
                if glyph.width == 0 || glyph.height == 0 {
                    continue;
                }
                let (metrics, coverage) = font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
                let fill = text.fill;
                let rgba: Vec<u8> = coverage
                    .iter()
                    .flat_map(|c| {
                        let alpha = (u16::from(*c) * u16::from(fill.a) / 255) as u8;
                        [fill.r, fill.g, fill.b, alpha]
                    })
                    .collect();
                let Some(mask) = pixmap_from_rgba(&rgba, metrics.width as u32, metrics.height as u32)
                else {
                    continue;
                };
                pixmap.draw_pixmap(
                    glyph.x.round() as i32,
                    glyph.y.round() as i32,
                    mask.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}
