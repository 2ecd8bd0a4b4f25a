//! Rendering statistics and degradation records.

use crate::model::BlockKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics collected while rendering a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Total number of pages rendered
    pub page_count: u32,

    /// Number of headings rendered
    pub heading_count: u32,

    /// Number of paragraphs rendered
    pub paragraph_count: u32,

    /// Number of tables rendered
    pub table_count: u32,

    /// Number of images rendered, including placeholders
    pub image_count: u32,

    /// Number of list items rendered
    pub list_item_count: u32,

    /// Number of standalone and inline links rendered
    pub link_count: u32,

    /// Number of OCR-positioned blocks rendered
    pub positioned_count: u32,

    /// Number of text values passed through the shaper
    pub shaped_values: usize,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rendered block of the given kind.
    pub fn add_block(&mut self, kind: BlockKind) {
        match kind {
            BlockKind::Heading => self.heading_count += 1,
            BlockKind::Paragraph => self.paragraph_count += 1,
            BlockKind::Image => self.image_count += 1,
            BlockKind::Table => self.table_count += 1,
            BlockKind::List => {}
            BlockKind::Link => self.link_count += 1,
            BlockKind::PositionedText => self.positioned_count += 1,
        }
    }

    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    pub fn add_list_items(&mut self, count: usize) {
        self.list_item_count += count as u32;
    }

    pub fn add_links(&mut self, count: usize) {
        self.link_count += count as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.page_count += other.page_count;
        self.heading_count += other.heading_count;
        self.paragraph_count += other.paragraph_count;
        self.table_count += other.table_count;
        self.image_count += other.image_count;
        self.list_item_count += other.list_item_count;
        self.link_count += other.link_count;
        self.positioned_count += other.positioned_count;
        self.shaped_values += other.shaped_values;
    }
}

/// What a converter did with a block it could not represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeAction {
    /// Replaced by a textual placeholder
    Placeholder,
    /// Text kept, page geometry dropped
    PositionDropped,
    /// Omitted from the output
    Dropped,
}

impl fmt::Display for DegradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DegradeAction::Placeholder => "replaced by placeholder",
            DegradeAction::PositionDropped => "position dropped",
            DegradeAction::Dropped => "dropped",
        })
    }
}

/// A block rendered with reduced fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Page number (1-indexed)
    pub page: u32,
    /// Block index within the page
    pub block: usize,
    pub kind: BlockKind,
    pub action: DegradeAction,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} block {} ({}): {}",
            self.page, self.block, self.kind, self.action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_block_counts() {
        let mut stats = RenderStats::new();
        stats.add_block(BlockKind::Heading);
        stats.add_block(BlockKind::Paragraph);
        stats.add_block(BlockKind::Paragraph);
        stats.add_list_items(3);
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.list_item_count, 3);
    }

    #[test]
    fn test_render_stats_merge() {
        let mut stats1 = RenderStats {
            paragraph_count: 5,
            table_count: 2,
            ..Default::default()
        };
        let stats2 = RenderStats {
            paragraph_count: 3,
            table_count: 1,
            image_count: 4,
            shaped_values: 7,
            ..Default::default()
        };

        stats1.merge(&stats2);

        assert_eq!(stats1.paragraph_count, 8);
        assert_eq!(stats1.table_count, 3);
        assert_eq!(stats1.image_count, 4);
        assert_eq!(stats1.shaped_values, 7);
    }

    #[test]
    fn test_degradation_display() {
        let d = Degradation {
            page: 2,
            block: 0,
            kind: BlockKind::PositionedText,
            action: DegradeAction::PositionDropped,
        };
        assert_eq!(d.to_string(), "page 2 block 0 (positioned_text): position dropped");
    }
}
