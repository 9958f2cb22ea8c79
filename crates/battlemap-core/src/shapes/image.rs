//! Image node for dropped map tiles, tokens and the watermark.

use super::{NodeId, NodeTrait};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Format of embedded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Where an image's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// A remote reference that has not been fetched.
    Url(String),
    /// Image bytes kept with the node, base64 encoded.
    Embedded {
        format: ImageFormat,
        data_base64: String,
    },
}

/// A raster image placed on the map.
///
/// The image is drawn so that `position` lands on the point `offset` inside
/// the image; a centered drop uses half the display size as the offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: NodeId,
    /// Optional well-known name (the watermark is looked up by name).
    pub name: Option<String>,
    /// Anchor position in world coordinates.
    pub position: Point,
    /// Anchor offset inside the image.
    pub offset: Vec2,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Pixel source.
    pub source: ImageSource,
}

impl Image {
    /// Create an image from a URL reference, centered on `position`.
    pub fn from_url(id: NodeId, position: Point, url: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id,
            name: None,
            position,
            offset: Vec2::new(width / 2.0, height / 2.0),
            width,
            height,
            source: ImageSource::Url(url.into()),
        }
    }

    /// Create an image from raw bytes, centered on `position`.
    ///
    /// Returns `None` when the bytes are not a recognised image format.
    pub fn embedded(id: NodeId, position: Point, data: &[u8], width: f64, height: f64) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(data)?;
        Some(Self {
            id,
            name: None,
            position,
            offset: Vec2::new(width / 2.0, height / 2.0),
            width,
            height,
            source: ImageSource::Embedded {
                format,
                data_base64: STANDARD.encode(data),
            },
        })
    }

    /// Attach a well-known name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the raw image data for embedded images.
    pub fn data(&self) -> Option<Vec<u8>> {
        match &self.source {
            ImageSource::Embedded { data_base64, .. } => STANDARD.decode(data_base64).ok(),
            ImageSource::Url(_) => None,
        }
    }

    /// Top-left corner in world coordinates.
    pub fn top_left(&self) -> Point {
        self.position - self.offset
    }

    /// Get the display rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.top_left(), (self.width, self.height))
    }
}

impl NodeTrait for Image {
    fn id(&self) -> NodeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_magic_bytes(&PNG_MAGIC), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
    }

    #[test]
    fn test_embedded_roundtrips_bytes() {
        let img = Image::embedded(Uuid::new_v4(), Point::ZERO, &PNG_MAGIC, 10.0, 10.0).unwrap();
        assert_eq!(img.data().as_deref(), Some(&PNG_MAGIC[..]));
        assert!(Image::embedded(Uuid::new_v4(), Point::ZERO, b"nope", 10.0, 10.0).is_none());
    }

    #[test]
    fn test_centered_bounds() {
        let img = Image::from_url(Uuid::new_v4(), Point::new(100.0, 100.0), "tile.png", 150.0, 150.0);
        let bounds = img.bounds();
        assert!((bounds.x0 - 25.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 25.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 175.0).abs() < f64::EPSILON);
        assert!(img.hit_test(Point::new(100.0, 100.0), 0.0));
        assert!(img.data().is_none());
    }
}
