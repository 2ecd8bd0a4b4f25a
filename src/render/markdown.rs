//! Markdown rendering.

use super::context::RenderContext;
use super::html::image_src;
use super::inline::{segments, Segment};
use super::DegradeAction;
use crate::bidi::ShapingMode;
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::Result;
use crate::model::{Block, BlockKind, Direction, Document, Image, List, Page, Paragraph, Table};
use std::fmt::Write as _;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
    MarkdownRenderer::new(doc, options, ShapingMode::Reshape).render()
}

/// Markdown renderer.
pub(crate) struct MarkdownRenderer<'a> {
    ctx: RenderContext<'a>,
    out: String,
    in_rtl: bool,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(doc: &'a Document, options: &'a ConvertOptions, shaping: ShapingMode) -> Self {
        Self {
            ctx: RenderContext::new(doc, "md", shaping, options),
            out: String::new(),
            in_rtl: false,
        }
    }

    pub fn render(mut self) -> Result<ConvertResult> {
        if self.ctx.options.include_frontmatter {
            self.render_frontmatter();
        }

        let pages = self.ctx.doc.pages();
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                self.set_rtl(false);
                self.out.push_str("---\n\n");
            }
            self.render_page(page)?;
        }
        self.set_rtl(false);

        let content = format!("{}\n", self.out.trim_end());
        Ok(self.ctx.finish(Output::Text(content), "text/markdown"))
    }

    fn render_frontmatter(&mut self) {
        let doc = self.ctx.doc;
        let dir = self.ctx.document_direction();
        let meta = doc.metadata();

        self.out.push_str("---\n");
        if let Some(title) = doc.title() {
            let title = self.ctx.shape(title, dir);
            let _ = writeln!(self.out, "title: {}", yaml_string(title.as_str()));
        }
        if let Some(author) = meta.author.as_deref() {
            let author = self.ctx.shape(author, dir);
            let _ = writeln!(self.out, "author: {}", yaml_string(author.as_str()));
        }
        if let Some(subject) = meta.subject.as_deref() {
            let subject = self.ctx.shape(subject, dir);
            let _ = writeln!(self.out, "description: {}", yaml_string(subject.as_str()));
        }
        if !meta.keywords.is_empty() {
            let keywords: Vec<String> = meta
                .keywords
                .iter()
                .map(|k| yaml_string(self.ctx.shape(k, dir).as_str()))
                .collect();
            let _ = writeln!(self.out, "keywords: [{}]", keywords.join(", "));
        }
        if let Some(lang) = meta.language.as_deref() {
            let _ = writeln!(self.out, "lang: {}", lang);
        }
        let _ = writeln!(self.out, "source_format: {}", meta.source_format());
        let _ = writeln!(self.out, "direction: {}", dir);
        let _ = writeln!(self.out, "pages: {}", doc.page_count());
        self.out.push_str("---\n\n");
    }

    fn render_page(&mut self, page: &Page) -> Result<()> {
        self.ctx.stats.add_page();
        for (index, block) in page.blocks.iter().enumerate() {
            let dir = self.ctx.direction(page, block);
            self.set_rtl(dir.is_rtl());
            self.ctx.stats.add_block(block.kind());
            match block {
                Block::Heading(h) => {
                    let text = self.ctx.shape(&h.text, dir);
                    let hashes = "#".repeat(h.level as usize);
                    let _ = writeln!(self.out, "{} {}\n", hashes, escape_markdown(text.as_str()));
                }
                Block::Paragraph(p) => self.render_paragraph(p, dir),
                Block::Image(i) => self.render_image(i, dir),
                Block::Table(t) => self.render_table(t, dir),
                Block::List(l) => self.render_list(l, dir),
                Block::Link(l) => {
                    let text = self.ctx.shape(&l.text, dir);
                    let _ = writeln!(self.out, "[{}]({})\n", escape_markdown(text.as_str()), escape_url(&l.url));
                }
                Block::PositionedText(p) => {
                    self.ctx
                        .degrade(page, index, BlockKind::PositionedText, DegradeAction::PositionDropped)?;
                    let text = self.ctx.shape(&p.text, dir);
                    let _ = writeln!(self.out, "{}\n", escape_markdown(text.as_str()));
                }
            }
        }
        Ok(())
    }

    /// Open or close the `<div dir="rtl">` wrapper around right-to-left blocks.
    fn set_rtl(&mut self, rtl: bool) {
        if rtl == self.in_rtl {
            return;
        }
        if rtl {
            self.out.push_str("<div dir=\"rtl\">\n\n");
        } else {
            self.out.push_str("</div>\n\n");
        }
        self.in_rtl = rtl;
    }

    fn render_paragraph(&mut self, para: &Paragraph, dir: Direction) {
        if para.is_empty() {
            return;
        }
        self.ctx.stats.add_links(para.links.len());
        let segs = segments(para, self.ctx.options.preserve_styles);
        let pieces = self.ctx.shape_segments(&para.text, dir, &segs);
        for (seg, text) in segs.iter().zip(pieces) {
            let rendered = render_segment(seg, &escape_markdown(text.as_str()));
            self.out.push_str(&rendered);
        }
        self.out.push_str("\n\n");
    }

    fn render_image(&mut self, image: &Image, dir: Direction) {
        let src = image_src(image, self.ctx.options);
        let alt = match image.alt_text.as_deref() {
            Some(alt) => escape_markdown(self.ctx.shape(alt, dir).as_str()),
            None => String::new(),
        };
        match image.caption.as_deref() {
            Some(caption) => {
                let caption = self.ctx.shape(caption, dir);
                let _ = writeln!(
                    self.out,
                    "![{}]({} \"{}\")\n",
                    alt,
                    escape_url(&src),
                    caption.as_str().replace('"', "'")
                );
            }
            None => {
                let _ = writeln!(self.out, "![{}]({})\n", alt, escape_url(&src));
            }
        }
    }

    fn render_list(&mut self, list: &List, dir: Direction) {
        self.ctx.stats.add_list_items(list.items.len());
        for (i, item) in list.items.iter().enumerate() {
            let text = self.ctx.shape(item, dir);
            if list.ordered {
                let _ = writeln!(self.out, "{}. {}", i + 1, escape_markdown(text.as_str()));
            } else {
                let _ = writeln!(self.out, "- {}", escape_markdown(text.as_str()));
            }
        }
        self.out.push('\n');
    }

    fn render_table(&mut self, table: &Table, dir: Direction) {
        if table.is_empty() {
            return;
        }
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| escape_markdown(self.ctx.shape(cell, dir).as_str()).replace('\n', " "))
                    .collect()
            })
            .collect();

        let columns = table.column_count();
        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                rows.iter()
                    .map(|row| row.get(c).map_or(0, |cell| cell.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        if let Some(caption) = table.caption.as_deref() {
            let caption = self.ctx.shape(caption, dir);
            let _ = writeln!(self.out, "*{}*\n", escape_markdown(caption.as_str()));
        }
        for (i, row) in rows.iter().enumerate() {
            self.out.push('|');
            for (c, width) in widths.iter().enumerate() {
                let cell = row.get(c).map_or("", String::as_str);
                let pad = width.saturating_sub(cell.chars().count());
                let _ = write!(self.out, " {}{} |", cell, " ".repeat(pad));
            }
            self.out.push('\n');

            // Markdown tables take exactly one header row.
            if i == 0 {
                self.out.push('|');
                for width in &widths {
                    let _ = write!(self.out, " {} |", "-".repeat(*width));
                }
                self.out.push('\n');
            }
        }
        self.out.push('\n');
    }
}

/// Wrap an escaped segment in emphasis markers, keeping outer whitespace
/// outside the markers.
fn render_segment(seg: &Segment<'_>, text: &str) -> String {
    if seg.is_plain() {
        return text.to_string();
    }
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let mut result = core.to_string();
    if seg.strike {
        result = format!("~~{}~~", result);
    }
    if seg.italic {
        result = format!("*{}*", result);
    }
    if seg.bold {
        result = format!("**{}**", result);
    }
    if seg.underline {
        result = format!("<u>{}</u>", result);
    }
    if let Some(url) = seg.url {
        result = format!("[{}]({})", result, escape_url(url));
    }
    format!("{}{}{}", lead, result, trail)
}

/// Escape special Markdown characters.
/// Only characters that could be misread as inline syntax are escaped.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '~' | '[' | ']' | '|' | '<' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

fn escape_url(url: &str) -> String {
    url.replace(' ', "%20").replace('(', "%28").replace(')', "%29")
}

fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, DocumentBuilder, Heading, InlineLink, PositionedText, StyleSpan};

    fn render(doc: &Document) -> String {
        to_markdown(doc, &ConvertOptions::default())
            .unwrap()
            .text()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
    }

    #[test]
    fn test_frontmatter() {
        let mut builder = DocumentBuilder::new("docx").title("Test \"Doc\"");
        builder.metadata_mut().subject = Some("Summary".into());
        builder.metadata_mut().keywords = vec!["a".into(), "b".into()];
        builder.new_page().push(Paragraph::new("Body"));
        let md = render(&builder.build().unwrap());
        assert!(md.starts_with("---\ntitle: \"Test \\\"Doc\\\"\"\n"));
        assert!(md.contains("description: \"Summary\""));
        assert!(md.contains("keywords: [\"a\", \"b\"]"));
        assert!(md.contains("source_format: docx"));
    }

    #[test]
    fn test_heading_and_spans() {
        let mut builder = DocumentBuilder::new("docx");
        let page = builder.new_page();
        page.push(Heading::new(2, "Chapter 1"));
        page.push(
            Paragraph::new("a bold move and link")
                .with_span(StyleSpan::new(1, 7).bold())
                .with_link(InlineLink::new(16, 20, "https://example.com")),
        );
        let doc = builder.build().unwrap();
        let options = ConvertOptions::default().with_frontmatter(false);
        let md = to_markdown(&doc, &options).unwrap().text().unwrap().to_string();
        assert!(md.starts_with("## Chapter 1\n"));
        assert!(md.contains("a **bold** move and [link](https://example.com)"));
    }

    #[test]
    fn test_rtl_blocks_wrapped_once() {
        let mut builder = DocumentBuilder::new("md");
        let page = builder.new_page();
        page.push(Heading::new(1, "مرحبا").with_direction(Direction::Rtl));
        page.push(Paragraph::new("بكم").with_direction(Direction::Rtl));
        page.push(Paragraph::new("Hello").with_direction(Direction::Ltr));
        let md = render(&builder.build().unwrap());
        assert_eq!(md.matches("<div dir=\"rtl\">").count(), 1);
        let close = md.find("</div>").unwrap();
        assert!(close < md.find("Hello").unwrap());
    }

    #[test]
    fn test_table_padded() {
        let mut builder = DocumentBuilder::new("xlsx");
        builder
            .new_page()
            .push(crate::model::Table::from_rows([vec!["Name", "Qty"], vec!["bolt", "12"]]));
        let doc = builder.build().unwrap();
        let options = ConvertOptions::default().with_frontmatter(false);
        let md = to_markdown(&doc, &options).unwrap().text().unwrap().to_string();
        assert!(md.contains("| Name | Qty |\n| ---- | --- |\n| bolt | 12  |"));
    }

    #[test]
    fn test_positioned_degrades() {
        let mut builder = DocumentBuilder::new("image");
        builder
            .new_page()
            .push(PositionedText::new("scan", BoundingBox::new(0.0, 0.0, 0.5, 0.1), 0.9));
        let doc = builder.build().unwrap();

        let result = to_markdown(&doc, &ConvertOptions::default()).unwrap();
        assert_eq!(result.degradations.len(), 1);
        assert!(result.text().unwrap().contains("scan"));

        let strict = ConvertOptions::default().with_strict(true);
        assert!(to_markdown(&doc, &strict).is_err());
    }

    #[test]
    fn test_page_separator() {
        let mut builder = DocumentBuilder::new("pptx");
        builder.new_page().push(Paragraph::new("one"));
        builder.new_page().push(Paragraph::new("two"));
        let doc = builder.build().unwrap();
        let options = ConvertOptions::default().with_frontmatter(false);
        let md = to_markdown(&doc, &options).unwrap().text().unwrap().to_string();
        assert_eq!(md, "one\n\n---\n\ntwo\n");
    }
}
