//! Document-level types.

use super::validate::{validate_document, validate_pages, ValidationError};
use super::{Block, Direction, Extensions, Image, Page, Table};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical, format-independent document.
///
/// A `Document` is only ever produced whole: by [`DocumentBuilder::build`]
/// or [`Document::from_json`], both of which validate it. It exposes no
/// mutation, so any number of converters may read it concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(default)]
    direction: Direction,

    metadata: Metadata,

    pages: Vec<Page>,
}

impl Document {
    /// Document title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Document-level direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Option<&Page> {
        if number == 0 {
            return None;
        }
        self.pages.get((number - 1) as usize)
    }

    /// Iterate every block with its page.
    pub fn blocks(&self) -> impl Iterator<Item = (&Page, &Block)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |block| (page, block)))
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(Page::block_count).sum()
    }

    /// Direction a block should be rendered with, before any text-based guess.
    ///
    /// `Auto` on the block defers to its page, and `Auto` on the page defers
    /// to the document.
    pub fn declared_direction(&self, page: &Page, block: &Block) -> Direction {
        block
            .direction()
            .resolve(page.direction.resolve(self.direction))
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(Page::plain_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Every hyperlink, standalone or inline.
    pub fn links(&self) -> Vec<LinkRef<'_>> {
        let mut links = Vec::new();
        for (page, block) in self.blocks() {
            match block {
                Block::Link(link) => links.push(LinkRef {
                    page: page.number,
                    text: link.text.clone(),
                    url: &link.url,
                }),
                Block::Paragraph(p) => {
                    for link in &p.links {
                        links.push(LinkRef {
                            page: page.number,
                            text: char_slice(&p.text, link.start, link.end),
                            url: &link.url,
                        });
                    }
                }
                _ => {}
            }
        }
        links
    }

    /// Every image block.
    pub fn images(&self) -> Vec<&Image> {
        self.blocks()
            .filter_map(|(_, block)| match block {
                Block::Image(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    /// Every table block.
    pub fn tables(&self) -> Vec<&Table> {
        self.blocks()
            .filter_map(|(_, block)| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    /// Counts used by the summarize command.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            title: self.title.clone(),
            page_count: self.page_count(),
            block_count: self.block_count(),
            heading_count: 0,
            paragraph_count: 0,
            image_count: 0,
            table_count: 0,
            list_count: 0,
            link_count: self.links().len(),
            positioned_count: 0,
            low_confidence_count: 0,
            warning_count: self.metadata.warnings.len(),
            direction: self.direction,
            source_format: self.metadata.source_format.clone(),
        };

        for (_, block) in self.blocks() {
            match block {
                Block::Heading(_) => summary.heading_count += 1,
                Block::Paragraph(_) => summary.paragraph_count += 1,
                Block::Image(_) => summary.image_count += 1,
                Block::Table(_) => summary.table_count += 1,
                Block::List(_) => summary.list_count += 1,
                Block::Link(_) => {}
                Block::PositionedText(p) => {
                    summary.positioned_count += 1;
                    if p.low_confidence {
                        summary.low_confidence_count += 1;
                    }
                }
            }
        }

        summary
    }

    /// Serialize to the canonical JSON wire format.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Deserialize from the canonical JSON wire format and validate.
    ///
    /// No partially valid document is ever returned.
    pub fn from_json(json: &str) -> Result<Document> {
        let doc: Document = serde_json::from_str(json)?;
        validate_document(&doc)?;
        Ok(doc)
    }

    /// Re-run the structural checks.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_document(self)
    }
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// A hyperlink found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRef<'a> {
    /// Page number (1-indexed)
    pub page: u32,
    /// Display text
    pub text: String,
    /// Target URI
    pub url: &'a str,
}

/// Block and page counts of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub title: Option<String>,
    pub page_count: u32,
    pub block_count: usize,
    pub heading_count: usize,
    pub paragraph_count: usize,
    pub image_count: usize,
    pub table_count: usize,
    pub list_count: usize,
    pub link_count: usize,
    pub positioned_count: usize,
    pub low_confidence_count: usize,
    pub warning_count: usize,
    pub direction: Direction,
    pub source_format: String,
}

/// Document metadata.
///
/// A free-form mapping with a few reserved keys. The source format tag is
/// fixed when the metadata is created and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Source format tag (e.g. "docx")
    source_format: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Dominant language tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Original file name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,

    /// Recoverable losses recorded during extraction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,

    /// Arbitrary extension keys
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Metadata {
    /// Create metadata for a document extracted from `source_format`.
    pub fn new(source_format: impl Into<String>) -> Self {
        Self {
            source_format: source_format.into(),
            author: None,
            created: None,
            modified: None,
            subject: None,
            keywords: Vec::new(),
            language: None,
            source_name: None,
            word_count: None,
            warnings: Vec::new(),
            extra: Extensions::new(),
        }
    }

    /// The format tag the document was extracted from.
    pub fn source_format(&self) -> &str {
        &self.source_format
    }

    /// Check if any content was lost during extraction.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings recorded against a page.
    pub fn warnings_for_page(&self, page: u32) -> impl Iterator<Item = &ExtractionWarning> {
        self.warnings.iter().filter(move |w| w.page == Some(page))
    }
}

/// A page or block that could not be fully extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,

    pub message: String,
}

impl ExtractionWarning {
    /// Warning scoped to the whole document.
    pub fn document(message: impl Into<String>) -> Self {
        Self {
            page: None,
            block: None,
            message: message.into(),
        }
    }

    /// Warning scoped to a page.
    pub fn page(page: u32, message: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            block: None,
            message: message.into(),
        }
    }

    /// Warning scoped to a block.
    pub fn block(page: u32, block: usize, message: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            block: Some(block),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.page, self.block) {
            (Some(page), Some(block)) => write!(f, "page {}, block {}: {}", page, block, self.message),
            (Some(page), None) => write!(f, "page {}: {}", page, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Assembles a [`Document`] during extraction.
///
/// Pages are numbered in the order they are started. `build` validates the
/// result, so an extractor either returns a complete document or an error.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    title: Option<String>,
    direction: Option<Direction>,
    metadata: Metadata,
    pages: Vec<Page>,
}

impl DocumentBuilder {
    /// Start a document for the given source format tag.
    pub fn new(source_format: impl Into<String>) -> Self {
        Self {
            title: None,
            direction: None,
            metadata: Metadata::new(source_format),
            pages: Vec::new(),
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    /// Set the title in place.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = Some(title);
        }
    }

    /// Current title, if set.
    pub fn current_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the document direction explicitly.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Mutable access to metadata other than the source format.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Start a new page and return it for filling.
    pub fn new_page(&mut self) -> &mut Page {
        let number = self.pages.len() as u32 + 1;
        self.pages.push(Page::new(number));
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// The page currently being filled, starting one if needed.
    pub fn current_page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            return self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Record a recoverable loss and log it.
    pub fn warn(&mut self, warning: ExtractionWarning) {
        log::warn!("{} extraction: {}", self.metadata.source_format, warning);
        self.metadata.warnings.push(warning);
    }

    /// Validate and produce the document.
    ///
    /// Without an explicit direction, the document direction is the majority
    /// of its blocks' declared directions.
    pub fn build(mut self) -> std::result::Result<Document, ValidationError> {
        if self.pages.is_empty() {
            self.new_page();
        }
        validate_pages(&self.pages)?;

        let direction = match self.direction {
            Some(direction) => direction,
            None => majority_direction(&self.pages),
        };

        if self.metadata.word_count.is_none() {
            let words = self
                .pages
                .iter()
                .map(|page| page.plain_text().split_whitespace().count())
                .sum();
            self.metadata.word_count = Some(words);
        }

        let doc = Document {
            title: self.title,
            direction,
            metadata: self.metadata,
            pages: self.pages,
        };
        validate_document(&doc)?;
        Ok(doc)
    }
}

fn majority_direction(pages: &[Page]) -> Direction {
    let (mut rtl, mut ltr) = (0usize, 0usize);
    for block in pages.iter().flat_map(|page| page.blocks.iter()) {
        match block.direction() {
            Direction::Rtl => rtl += 1,
            Direction::Ltr => ltr += 1,
            Direction::Auto => {}
        }
    }
    match (rtl, ltr) {
        (0, 0) => Direction::Auto,
        (r, l) if r > l => Direction::Rtl,
        _ => Direction::Ltr,
    }
}
