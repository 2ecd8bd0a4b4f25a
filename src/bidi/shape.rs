//! Single-application shaping of text leaving the canonical model.
//!
//! The model stores logical, unshaped text. A converter wraps each text value
//! it renders in a [`LogicalText`] and hands it to its [`Shaper`], which
//! returns a [`ShapedText`]. `ShapedText` cannot be turned back into a
//! `LogicalText`, so a value can only go through shaping once.
//!
//! Only the crate wraps text, and outside callers get a `LogicalText` from a
//! model value:
//!
//! ```
//! use unidoc::bidi::{Shaper, ShapingMode};
//! use unidoc::model::Paragraph;
//! use unidoc::Direction;
//!
//! let paragraph = Paragraph::new("مرحبا").with_direction(Direction::Rtl);
//! let mut shaper = Shaper::new(ShapingMode::Reshape);
//! let shaped = shaper.shape(paragraph.logical_text());
//! assert_eq!(shaped.as_str(), "\u{FEE3}\u{FEAE}\u{FEA3}\u{FE92}\u{FE8E}");
//! ```
//!
//! Arbitrary strings cannot be passed off as logical text:
//!
//! ```compile_fail
//! use unidoc::bidi::{LogicalText, Shaper, ShapingMode};
//! use unidoc::Direction;
//!
//! let mut shaper = Shaper::new(ShapingMode::Reshape);
//! shaper.shape(LogicalText::new("already shaped?", Direction::Rtl));
//! ```

use super::arabic::{reshape, reshape_mapped};
use crate::model::Direction;
use std::fmt;
use unicode_bidi::{BidiInfo, Level};

/// How text is prepared for a render target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapingMode {
    /// Leave logical text untouched.
    #[default]
    None,
    /// Contextual glyph selection only, for targets that reorder themselves.
    Reshape,
    /// Glyph selection followed by reordering into visual order, for targets
    /// that display characters in stored order.
    Visual,
}

/// Logical-order text taken from the model, not yet shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalText<'a> {
    text: &'a str,
    direction: Direction,
}

impl<'a> LogicalText<'a> {
    /// Wrap model text with the direction it is rendered in.
    pub(crate) fn new(text: &'a str, direction: Direction) -> Self {
        Self { text, direction }
    }

    /// The logical text.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Paragraph direction used as the base level for reordering.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Text ready for a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedText(String);

impl ShapedText {
    /// Borrow the shaped text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the shaped text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ShapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shaping context for one conversion.
///
/// Counts every value it shapes so callers can check that each text value
/// was shaped exactly once.
#[derive(Debug, Clone)]
pub struct Shaper {
    mode: ShapingMode,
    calls: usize,
}

impl Shaper {
    /// Create a shaper for the given mode.
    pub fn new(mode: ShapingMode) -> Self {
        Self { mode, calls: 0 }
    }

    /// The active mode.
    pub fn mode(&self) -> ShapingMode {
        self.mode
    }

    /// Number of values shaped so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Shape one logical value.
    pub fn shape(&mut self, text: LogicalText<'_>) -> ShapedText {
        self.calls += 1;
        let shaped = match self.mode {
            ShapingMode::None => text.as_str().to_string(),
            ShapingMode::Reshape => reshape(text.as_str()),
            ShapingMode::Visual => reorder(&reshape(text.as_str()), text.direction()),
        };
        ShapedText(shaped)
    }

    /// Shape one logical value that is rendered in pieces.
    ///
    /// `cuts` are ascending char offsets into the logical text; each window
    /// between two cuts yields one piece. Glyphs are chosen over the whole
    /// value, so a piece boundary inside a word keeps the joined forms. Counts
    /// as a single value.
    pub fn shape_pieces(&mut self, text: LogicalText<'_>, cuts: &[usize]) -> Vec<ShapedText> {
        self.calls += 1;
        let mode = self.mode;
        let (shaped, map) = match mode {
            ShapingMode::None => {
                let len = text.as_str().chars().count();
                (text.as_str().to_string(), (0..=len).collect::<Vec<_>>())
            }
            ShapingMode::Reshape | ShapingMode::Visual => reshape_mapped(text.as_str()),
        };
        let offsets: Vec<usize> = shaped
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(shaped.len()))
            .collect();
        let last = map.len() - 1;
        let byte = |cut: usize| offsets[map[cut.min(last)]];

        cuts.windows(2)
            .map(|w| {
                let piece = &shaped[byte(w[0])..byte(w[1]).max(byte(w[0]))];
                ShapedText(match mode {
                    ShapingMode::Visual => reorder(piece, text.direction()),
                    _ => piece.to_string(),
                })
            })
            .collect()
    }
}

/// Reorder each paragraph of `text` from logical into visual order.
fn reorder(text: &str, direction: Direction) -> String {
    if text.is_empty() {
        return String::new();
    }

    let level = match direction {
        Direction::Rtl => Some(Level::rtl()),
        Direction::Ltr => Some(Level::ltr()),
        Direction::Auto => None,
    };

    let info = BidiInfo::new(text, level);
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        let line = para.range.clone();
        out.push_str(&info.reorder_line(para, line));
    }
    out
}
