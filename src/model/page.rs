//! Page-level types and the polymorphic block.

use super::{Heading, Image, Link, List, Paragraph, PositionHint, PositionedText, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unknown fields carried on a block or on metadata.
///
/// Kept opaquely so that load/save cycles do not lose data a given
/// converter does not understand.
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// Text flow orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Left-to-right
    Ltr,
    /// Right-to-left
    Rtl,
    /// Defer to the enclosing page or document
    #[default]
    Auto,
}

impl Direction {
    /// Replace `Auto` with the given fallback.
    pub fn resolve(self, fallback: Direction) -> Direction {
        match self {
            Direction::Auto => fallback,
            explicit => explicit,
        }
    }

    /// Check for right-to-left.
    pub fn is_rtl(self) -> bool {
        self == Direction::Rtl
    }

    /// Lowercase name as used on the wire and in markup.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
            Direction::Auto => "auto",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page, slide, or sheet title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Page direction, `Auto` inherits the document direction
    #[serde(default)]
    pub direction: Direction,

    /// Content blocks on the page
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            title: None,
            direction: Direction::Auto,
            blocks: Vec::new(),
        }
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the page direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Add a block to the page.
    pub fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Get plain text content of the page.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the page is empty (no content blocks).
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// A content block.
///
/// The `type` discriminator on the wire selects the variant, and each variant
/// carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Section heading
    Heading(Heading),
    /// Text paragraph
    Paragraph(Paragraph),
    /// Embedded or referenced image
    Image(Image),
    /// Rectangular table
    Table(Table),
    /// Ordered or unordered list
    List(List),
    /// Standalone hyperlink
    Link(Link),
    /// OCR text with page geometry
    PositionedText(PositionedText),
}

/// Discriminant of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    Image,
    Table,
    List,
    Link,
    PositionedText,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
            BlockKind::List => "list",
            BlockKind::Link => "link",
            BlockKind::PositionedText => "positioned_text",
        };
        f.write_str(name)
    }
}

macro_rules! base_field {
    ($block:expr, $field:ident) => {
        match $block {
            Block::Heading(b) => &b.$field,
            Block::Paragraph(b) => &b.$field,
            Block::Image(b) => &b.$field,
            Block::Table(b) => &b.$field,
            Block::List(b) => &b.$field,
            Block::Link(b) => &b.$field,
            Block::PositionedText(b) => &b.$field,
        }
    };
}

impl Block {
    /// The block's type tag.
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading(_) => BlockKind::Heading,
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::Image(_) => BlockKind::Image,
            Block::Table(_) => BlockKind::Table,
            Block::List(_) => BlockKind::List,
            Block::Link(_) => BlockKind::Link,
            Block::PositionedText(_) => BlockKind::PositionedText,
        }
    }

    /// Declared direction; `Auto` inherits from the page and document.
    pub fn direction(&self) -> Direction {
        *base_field!(self, direction)
    }

    /// Optional ordering and geometry hint.
    pub fn position(&self) -> Option<&PositionHint> {
        base_field!(self, position).as_ref()
    }

    /// Unknown fields preserved from deserialization.
    pub fn extensions(&self) -> &Extensions {
        base_field!(self, extensions)
    }

    /// Plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading(h) => h.text.clone(),
            Block::Paragraph(p) => p.text.clone(),
            Block::Image(i) => i.caption.clone().unwrap_or_default(),
            Block::Table(t) => t.plain_text(),
            Block::List(l) => l.items.join("\n"),
            Block::Link(l) => l.text.clone(),
            Block::PositionedText(p) => p.text.clone(),
        }
    }
}

impl From<Heading> for Block {
    fn from(value: Heading) -> Self {
        Block::Heading(value)
    }
}

impl From<Paragraph> for Block {
    fn from(value: Paragraph) -> Self {
        Block::Paragraph(value)
    }
}

impl From<Image> for Block {
    fn from(value: Image) -> Self {
        Block::Image(value)
    }
}

impl From<Table> for Block {
    fn from(value: Table) -> Self {
        Block::Table(value)
    }
}

impl From<List> for Block {
    fn from(value: List) -> Self {
        Block::List(value)
    }
}

impl From<Link> for Block {
    fn from(value: Link) -> Self {
        Block::Link(value)
    }
}

impl From<PositionedText> for Block {
    fn from(value: PositionedText) -> Self {
        Block::PositionedText(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_resolve() {
        assert_eq!(Direction::Auto.resolve(Direction::Rtl), Direction::Rtl);
        assert_eq!(Direction::Ltr.resolve(Direction::Rtl), Direction::Ltr);
    }

    #[test]
    fn test_block_tag_on_wire() {
        let block = Block::from(Heading::new(2, "Intro"));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);

        let block = Block::from(PositionedText::new(
            "x",
            super::super::BoundingBox::new(0.1, 0.1, 0.2, 0.05),
            0.9,
        ));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "positioned_text");
    }

    #[test]
    fn test_page_plain_text() {
        let mut page = Page::new(1);
        page.push(Heading::new(1, "Title"));
        page.push(Paragraph::new("Body"));
        assert_eq!(page.plain_text(), "Title\n\nBody");
        assert_eq!(page.block_count(), 2);
    }
}
