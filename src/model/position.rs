//! Geometry and OCR-positioned text.

use super::{Direction, Extensions};
use serde::{Deserialize, Serialize};

/// An axis-aligned box, origin at the top-left.
///
/// On [`PositionedText`] the coordinates are fractions of the page size,
/// so every component lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Scale pixel coordinates into page fractions.
    pub fn normalized(&self, page_width: f64, page_height: f64) -> BoundingBox {
        if page_width <= 0.0 || page_height <= 0.0 {
            return BoundingBox::default();
        }
        let x = (self.x / page_width).clamp(0.0, 1.0);
        let y = (self.y / page_height).clamp(0.0, 1.0);
        let right = (self.right() / page_width).clamp(0.0, 1.0);
        let bottom = (self.bottom() / page_height).clamp(0.0, 1.0);
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// All components finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Box lies within the unit square.
    pub fn is_normalized(&self) -> bool {
        const EPS: f64 = 1e-9;
        self.is_finite()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= 1.0 + EPS
            && self.bottom() <= 1.0 + EPS
    }
}

/// Reading order and optional geometry of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionHint {
    /// Order index within the page
    pub order: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl PositionHint {
    /// Hint with an order index only.
    pub fn order(order: u32) -> Self {
        Self { order, bbox: None }
    }

    /// Attach a bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// OCR-derived text with its location on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedText {
    pub text: String,

    /// Normalized bounding box
    pub bbox: BoundingBox,

    /// Source language tag (e.g. "ar", "en")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Recognition confidence in `[0, 1]`
    pub confidence: f64,

    /// Confidence fell below the configured floor
    #[serde(default)]
    pub low_confidence: bool,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PositionedText {
    /// Create a positioned block. Confidence is clamped to `[0, 1]`.
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            language: None,
            confidence: confidence.clamp(0.0, 1.0),
            low_confidence: false,
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_position(mut self, position: PositionHint) -> Self {
        self.position = Some(position);
        self
    }

    /// Flag when confidence is below `floor`.
    pub fn flag_below(mut self, floor: f64) -> Self {
        self.low_confidence = self.confidence < floor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pixels() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 25.0).normalized(1000.0, 500.0);
        assert!((bbox.x - 0.1).abs() < 1e-12);
        assert!((bbox.y - 0.1).abs() < 1e-12);
        assert!((bbox.width - 0.2).abs() < 1e-12);
        assert!((bbox.height - 0.05).abs() < 1e-12);
        assert!(bbox.is_normalized());
    }

    #[test]
    fn test_normalize_clamps_overflow() {
        let bbox = BoundingBox::new(900.0, 0.0, 300.0, 10.0).normalized(1000.0, 100.0);
        assert!(bbox.is_normalized());
        assert!((bbox.right() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn test_low_confidence_flag() {
        let block = PositionedText::new("x", BoundingBox::default(), 0.4).flag_below(0.6);
        assert!(block.low_confidence);
        let block = PositionedText::new("x", BoundingBox::default(), 0.9).flag_below(0.6);
        assert!(!block.low_confidence);
    }
}
