//! JSON rendering in the canonical schema.

use super::RenderStats;
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::Result;
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
///
/// JSON carries the canonical logical text, so no shaping is applied
/// whatever the options say.
pub fn to_json(doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
    let json = doc.to_json(options.json_format == JsonFormat::Pretty)?;

    let mut stats = RenderStats::new();
    for page in doc.pages() {
        stats.add_page();
        for block in &page.blocks {
            stats.add_block(block.kind());
        }
    }

    Ok(ConvertResult {
        content: Output::Text(json),
        mime_type: "application/json",
        degradations: Vec::new(),
        stats,
    })
}
