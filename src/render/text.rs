//! Plain text rendering.
//!
//! Text targets display characters in stored order, so right-to-left runs
//! are shaped and reordered into visual order here.

use super::context::RenderContext;
use super::DegradeAction;
use crate::bidi::ShapingMode;
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::Result;
use crate::model::{Block, BlockKind, Document};

/// Convert a document to plain text.
pub fn to_text(doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
    let mut ctx = RenderContext::new(doc, "txt", ShapingMode::Visual, options);
    let mut pages = Vec::new();

    for page in doc.pages() {
        ctx.stats.add_page();
        let mut parts: Vec<String> = Vec::new();
        for (index, block) in page.blocks.iter().enumerate() {
            let dir = ctx.direction(page, block);
            ctx.stats.add_block(block.kind());
            let part = match block {
                Block::Heading(h) => ctx.shape(&h.text, dir).into_string(),
                Block::Paragraph(p) => {
                    if p.is_empty() {
                        continue;
                    }
                    ctx.shape(&p.text, dir).into_string()
                }
                Block::Image(i) => {
                    ctx.degrade(page, index, BlockKind::Image, DegradeAction::Placeholder)?;
                    format!("[Image: {}]", ctx.shape(i.label(), dir))
                }
                Block::Table(t) => t
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| ctx.shape(cell, dir).into_string())
                            .collect::<Vec<_>>()
                            .join("\t")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                Block::List(l) => {
                    ctx.stats.add_list_items(l.items.len());
                    l.items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let item = ctx.shape(item, dir);
                            if l.ordered {
                                format!("{}. {}", i + 1, item)
                            } else {
                                format!("- {}", item)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
                Block::Link(l) => format!("{} <{}>", ctx.shape(&l.text, dir), l.url),
                Block::PositionedText(p) => {
                    ctx.degrade(page, index, BlockKind::PositionedText, DegradeAction::PositionDropped)?;
                    ctx.shape(&p.text, dir).into_string()
                }
            };
            if !part.is_empty() {
                parts.push(part);
            }
        }
        if !parts.is_empty() {
            pages.push(parts.join("\n\n"));
        }
    }

    let mut output = pages.join("\n\n");
    output.push('\n');
    Ok(ctx.finish(Output::Text(output), "text/plain"))
}
