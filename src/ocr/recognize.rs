//! The recognition capability.

use super::Preprocessed;
use crate::error::Result;
use crate::model::BoundingBox;

/// A box in pixel coordinates, origin at the top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.height as f64 / 2.0
    }

    pub(crate) fn to_bbox(self) -> BoundingBox {
        BoundingBox::new(self.x as f64, self.y as f64, self.width as f64, self.height as f64)
    }
}

/// A word recognized on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    pub bbox: PixelBox,
    /// In `[0, 1]`
    pub confidence: f64,
}

impl RawToken {
    pub fn new(text: impl Into<String>, bbox: PixelBox, confidence: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// Tokens recognized on one page.
pub type RecognizedTokens = Vec<RawToken>;

/// A text recognition engine.
///
/// Implementations wrap a native OCR library. `languages` holds hints such
/// as `["ara", "eng"]`, dominant script first. A failure is reported for the
/// page only; other pages keep going.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, page: &Preprocessed, languages: &[String]) -> Result<RecognizedTokens>;
}

impl<F> OcrEngine for F
where
    F: Fn(&Preprocessed, &[String]) -> Result<RecognizedTokens> + Send + Sync,
{
    fn recognize(&self, page: &Preprocessed, languages: &[String]) -> Result<RecognizedTokens> {
        self(page, languages)
    }
}
