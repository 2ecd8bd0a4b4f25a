//! Structural invariant checks for canonical documents.
//!
//! These run when a [`Document`] is built by an extractor and when one is
//! deserialized from JSON. A failure is always fatal and carries the page
//! number and block index of the offending content.

use super::{Block, Document, Page};
use thiserror::Error;

/// An invariant violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A document must have at least one page.
    #[error("document has no pages")]
    NoPages,

    /// The source format tag is missing.
    #[error("document has an empty source format tag")]
    EmptySourceFormat,

    /// Pages are not numbered contiguously from 1.
    #[error("page at index {index} is numbered {found}, expected {expected}")]
    PageNumbering {
        index: usize,
        expected: u32,
        found: u32,
    },

    /// A table row has a different cell count than the first row.
    #[error("page {page}, block {block}: table row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        page: u32,
        block: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Heading level outside 1-6.
    #[error("page {page}, block {block}: heading level {level} is outside 1-6")]
    HeadingLevel { page: u32, block: usize, level: u8 },

    /// A positioned block's box is not inside the unit square.
    #[error("page {page}, block {block}: bounding box is not normalized")]
    BoundingBox { page: u32, block: usize },

    /// Confidence outside `[0, 1]`.
    #[error("page {page}, block {block}: confidence {value} is outside [0, 1]")]
    Confidence { page: u32, block: usize, value: f64 },

    /// A style span or inline link reaches past the end of its text.
    #[error("page {page}, block {block}: span {start}..{end} exceeds text length {len}")]
    SpanRange {
        page: u32,
        block: usize,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Validate a whole document.
pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    if doc.metadata().source_format().trim().is_empty() {
        return Err(ValidationError::EmptySourceFormat);
    }
    validate_pages(doc.pages())
}

/// Validate page numbering and every block.
pub fn validate_pages(pages: &[Page]) -> Result<(), ValidationError> {
    if pages.is_empty() {
        return Err(ValidationError::NoPages);
    }

    for (index, page) in pages.iter().enumerate() {
        let expected = index as u32 + 1;
        if page.number != expected {
            return Err(ValidationError::PageNumbering {
                index,
                expected,
                found: page.number,
            });
        }
        for (block_index, block) in page.blocks.iter().enumerate() {
            validate_block(page.number, block_index, block)?;
        }
    }

    Ok(())
}

/// Validate a single block located at `page`/`index`.
pub fn validate_block(page: u32, index: usize, block: &Block) -> Result<(), ValidationError> {
    match block {
        Block::Heading(h) => {
            if !(1..=6).contains(&h.level) {
                return Err(ValidationError::HeadingLevel {
                    page,
                    block: index,
                    level: h.level,
                });
            }
        }
        Block::Paragraph(p) => {
            let len = p.char_len();
            let ranges = p
                .spans
                .iter()
                .map(|s| (s.start, s.end))
                .chain(p.links.iter().map(|l| (l.start, l.end)));
            for (start, end) in ranges {
                if start > end || end > len {
                    return Err(ValidationError::SpanRange {
                        page,
                        block: index,
                        start,
                        end,
                        len,
                    });
                }
            }
        }
        Block::Table(t) => {
            let expected = t.column_count();
            if let Some((row, cells)) = t
                .rows
                .iter()
                .enumerate()
                .find(|(_, cells)| cells.len() != expected)
            {
                return Err(ValidationError::RaggedTable {
                    page,
                    block: index,
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        Block::PositionedText(p) => {
            if !p.bbox.is_normalized() {
                return Err(ValidationError::BoundingBox { page, block: index });
            }
            if !(0.0..=1.0).contains(&p.confidence) {
                return Err(ValidationError::Confidence {
                    page,
                    block: index,
                    value: p.confidence,
                });
            }
        }
        Block::Image(_) | Block::List(_) | Block::Link(_) => {}
    }

    if let Some(bbox) = block.position().and_then(|hint| hint.bbox.as_ref()) {
        if !bbox.is_finite() {
            return Err(ValidationError::BoundingBox { page, block: index });
        }
    }

    Ok(())
}
