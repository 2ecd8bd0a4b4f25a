//! Per-conversion render state shared by every target.

use super::inline::Segment;
use super::{Degradation, DegradeAction, RenderStats};
use crate::bidi::{render_direction, LogicalText, ShapedText, Shaper, ShapingMode};
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::{Error, Result};
use crate::model::{Block, BlockKind, Direction, Document, Page};

/// Render state for one conversion.
///
/// Owns the shaper, so every text value that leaves the model goes through
/// [`RenderContext::shape`] and is counted.
pub(crate) struct RenderContext<'a> {
    pub doc: &'a Document,
    pub options: &'a ConvertOptions,
    pub stats: RenderStats,
    format: &'static str,
    shaper: Shaper,
    degradations: Vec<Degradation>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        doc: &'a Document,
        format: &'static str,
        default_shaping: ShapingMode,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            doc,
            options,
            stats: RenderStats::new(),
            format,
            shaper: Shaper::new(options.shaping.unwrap_or(default_shaping)),
            degradations: Vec::new(),
        }
    }

    /// Shape one logical text value for output.
    pub fn shape(&mut self, text: &str, direction: Direction) -> ShapedText {
        self.shaper.shape(LogicalText::new(text, direction))
    }

    /// Shape a paragraph once and return one shaped piece per segment.
    pub fn shape_segments(&mut self, text: &str, direction: Direction, segments: &[Segment<'_>]) -> Vec<ShapedText> {
        let mut cuts: Vec<usize> = segments.iter().map(|s| s.start).collect();
        cuts.extend(segments.last().map(|s| s.end));
        self.shaper.shape_pieces(LogicalText::new(text, direction), &cuts)
    }

    /// Effective direction of a block: declared, inherited, then detected.
    pub fn direction(&self, page: &Page, block: &Block) -> Direction {
        render_direction(self.doc.declared_direction(page, block), &block.plain_text())
    }

    /// Effective direction of the document as a whole.
    pub fn document_direction(&self) -> Direction {
        render_direction(self.doc.direction(), "")
    }

    /// Record a block the target cannot hold, or fail in strict mode.
    pub fn degrade(&mut self, page: &Page, index: usize, kind: BlockKind, action: DegradeAction) -> Result<()> {
        if self.options.strict {
            return Err(Error::IrreducibleStructure {
                format: self.format.to_string(),
                kind,
                page: page.number,
                index,
            });
        }
        let degradation = Degradation {
            page: page.number,
            block: index,
            kind,
            action,
        };
        log::debug!("{}: {}", self.format, degradation);
        self.degradations.push(degradation);
        Ok(())
    }

    /// Package the rendered output.
    pub fn finish(mut self, content: Output, mime_type: &'static str) -> ConvertResult {
        self.stats.shaped_values = self.shaper.calls();
        ConvertResult {
            content,
            mime_type,
            degradations: self.degradations,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, DocumentBuilder, PositionedText};

    fn doc() -> Document {
        let mut builder = DocumentBuilder::new("image");
        builder
            .new_page()
            .push(PositionedText::new("x", BoundingBox::new(0.1, 0.1, 0.2, 0.1), 0.9));
        builder.build().unwrap()
    }

    #[test]
    fn test_degrade_records() {
        let doc = doc();
        let options = ConvertOptions::default();
        let mut ctx = RenderContext::new(&doc, "md", ShapingMode::Reshape, &options);
        ctx.degrade(&doc.pages()[0], 0, BlockKind::PositionedText, DegradeAction::PositionDropped)
            .unwrap();
        let result = ctx.finish(Output::Text(String::new()), "text/markdown");
        assert_eq!(result.degradations.len(), 1);
        assert_eq!(result.degradations[0].page, 1);
    }

    #[test]
    fn test_degrade_strict_fails() {
        let doc = doc();
        let options = ConvertOptions::default().with_strict(true);
        let mut ctx = RenderContext::new(&doc, "md", ShapingMode::Reshape, &options);
        let err = ctx
            .degrade(&doc.pages()[0], 0, BlockKind::PositionedText, DegradeAction::PositionDropped)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IrreducibleStructure { ref format, kind: BlockKind::PositionedText, page: 1, index: 0 } if format == "md"
        ));
    }

    #[test]
    fn test_shape_counts_and_override() {
        let doc = doc();
        let options = ConvertOptions::default().with_shaping(ShapingMode::None);
        let mut ctx = RenderContext::new(&doc, "html", ShapingMode::Reshape, &options);
        assert_eq!(ctx.shape("مرحبا", Direction::Rtl).as_str(), "مرحبا");
        ctx.shape("b", Direction::Ltr);
        let result = ctx.finish(Output::Text(String::new()), "text/html");
        assert_eq!(result.stats.shaped_values, 2);
    }
}
