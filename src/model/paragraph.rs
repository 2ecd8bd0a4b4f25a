//! Text-bearing block types.

use super::{Direction, Extensions, PositionHint};
use crate::bidi::LogicalText;
use serde::{Deserialize, Serialize};

/// A section heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,

    /// Heading text
    pub text: String,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Heading {
    /// Create a heading. The level is clamped to 1-6.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 6),
            text: text.into(),
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the position hint.
    pub fn with_position(mut self, position: PositionHint) -> Self {
        self.position = Some(position);
        self
    }

    /// The heading text, ready to hand to a shaper.
    pub fn logical_text(&self) -> LogicalText<'_> {
        LogicalText::new(&self.text, self.direction)
    }
}

/// A paragraph of text with optional inline styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph text
    pub text: String,

    /// Inline emphasis, indexed by character offset into `text`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<StyleSpan>,

    /// Hyperlinks embedded in the text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<InlineLink>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Paragraph {
    /// Create a paragraph with plain text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
            links: Vec::new(),
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the position hint.
    pub fn with_position(mut self, position: PositionHint) -> Self {
        self.position = Some(position);
        self
    }

    /// The paragraph text, ready to hand to a shaper.
    pub fn logical_text(&self) -> LogicalText<'_> {
        LogicalText::new(&self.text, self.direction)
    }

    /// Add a style span.
    pub fn with_span(mut self, span: StyleSpan) -> Self {
        self.spans.push(span);
        self
    }

    /// Add an inline link.
    pub fn with_link(mut self, link: InlineLink) -> Self {
        self.links.push(link);
        self
    }

    /// Character length of the text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Inline emphasis over a character range `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl StyleSpan {
    /// Create an unstyled span.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    /// Mark bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Mark italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Mark underline.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Mark strikethrough.
    pub fn strike(mut self) -> Self {
        self.strike = true;
        self
    }

    /// Check if any emphasis is set.
    pub fn has_style(&self) -> bool {
        self.bold || self.italic || self.underline || self.strike
    }
}

/// A hyperlink over a character range of its parent text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineLink {
    pub start: usize,
    pub end: usize,
    /// Target URI
    pub url: String,
}

impl InlineLink {
    /// Create an inline link.
    pub fn new(start: usize, end: usize, url: impl Into<String>) -> Self {
        Self {
            start,
            end,
            url: url.into(),
        }
    }
}

/// An ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Item texts in order
    pub items: Vec<String>,

    /// Numbered list
    #[serde(default)]
    pub ordered: bool,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl List {
    /// Create a list.
    pub fn new(items: Vec<String>, ordered: bool) -> Self {
        Self {
            items,
            ordered,
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// A standalone hyperlink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Display text
    pub text: String,

    /// Target URI
    pub url: String,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Link {
    /// Create a link.
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}
