//! Text node.

use super::{NodeId, NodeTrait, SerializableColor};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Approximate glyph advance as a fraction of the font size.
const AVERAGE_ADVANCE: f64 = 0.6;

/// A block of wrapped text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: NodeId,
    /// Top-left corner of the text box.
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in world units.
    pub font_size: f64,
    /// Fill color.
    pub fill: SerializableColor,
    /// Wrap width in world units.
    pub width: f64,
}

impl Text {
    /// Create a text node.
    pub fn new(
        id: NodeId,
        position: Point,
        content: impl Into<String>,
        font_family: impl Into<String>,
        font_size: f64,
    ) -> Self {
        Self {
            id,
            position,
            content: content.into(),
            font_family: font_family.into(),
            font_size,
            fill: SerializableColor::white(),
            width: 400.0,
        }
    }

    /// Approximate advance of one glyph.
    pub fn glyph_advance(&self) -> f64 {
        self.font_size * AVERAGE_ADVANCE
    }

    /// Break the content into lines that fit the wrap width.
    ///
    /// Explicit newlines always break; long paragraphs wrap at word
    /// boundaries, or mid-word when a single word is wider than the box.
    pub fn layout_lines(&self) -> Vec<String> {
        let per_line = ((self.width / self.glyph_advance()).floor() as usize).max(1);
        let mut lines = Vec::new();

        for paragraph in self.content.split('\n') {
            let mut current = String::new();
            for word in paragraph.split(' ') {
                let needed = if current.is_empty() {
                    word.chars().count()
                } else {
                    current.chars().count() + 1 + word.chars().count()
                };

                if needed > per_line && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);

                while current.chars().count() > per_line {
                    let split: String = current.chars().take(per_line).collect();
                    current = current.chars().skip(per_line).collect();
                    lines.push(split);
                }
            }
            lines.push(current);
        }

        lines
    }
}

impl NodeTrait for Text {
    fn id(&self) -> NodeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let height = self.layout_lines().len() as f64 * self.font_size;
        Rect::from_origin_size(self.position, (self.width, height))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn text(content: &str, width: f64) -> Text {
        let mut t = Text::new(Uuid::new_v4(), Point::new(0.0, 0.0), content, "Arial", 10.0);
        t.width = width;
        t
    }

    #[test]
    fn test_single_line() {
        let t = text("Enter text", 400.0);
        assert_eq!(t.layout_lines(), vec!["Enter text".to_string()]);
        let bounds = t.bounds();
        assert!((bounds.height() - 10.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wraps_at_words() {
        // 60 units wide at 6 units per glyph = 10 glyphs per line
        let t = text("goblin camp north", 60.0);
        assert_eq!(t.layout_lines(), vec!["goblin", "camp north"]);
    }

    #[test]
    fn test_explicit_newlines() {
        let t = text("a\nb\n", 400.0);
        assert_eq!(t.layout_lines().len(), 3);
    }

    #[test]
    fn test_long_word_breaks() {
        let t = text("abcdefghijkl", 30.0);
        assert_eq!(t.layout_lines(), vec!["abcde", "fghij", "kl"]);
    }
}
