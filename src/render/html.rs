//! HTML rendering.
//!
//! Produces a standalone HTML5 page. Every block carries `dir` and a
//! matching `rtl`/`ltr` class from its effective direction, so browsers
//! apply the bidi algorithm to reshaped text themselves.

use super::context::RenderContext;
use super::inline::segments;
use crate::bidi::ShapingMode;
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::Result;
use crate::model::{
    Block, Direction, Document, Heading, Image, ImageSource, Link, List, Page, Paragraph, PositionedText,
    Table,
};
use quick_xml::escape::escape;
use std::fmt::Write as _;

const CSS: &str = "\
body { font-family: 'Segoe UI', 'Noto Naskh Arabic', Tahoma, sans-serif; line-height: 1.6; margin: 2em auto; max-width: 50em; }
.rtl { direction: rtl; text-align: right; }
.ltr { direction: ltr; text-align: left; }
section.page { margin-bottom: 2em; }
section.page + section.page { border-top: 1px dashed #ccc; padding-top: 2em; }
section.positioned { position: relative; min-height: 70em; }
div.positioned { position: absolute; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #999; padding: 0.3em 0.6em; }
th { background: #f0f0f0; }
figure { margin: 1em 0; }
figure img { max-width: 100%; }
.low-confidence { background: #fff3cd; }
";

/// Convert a document to HTML.
pub fn to_html(doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
    HtmlRenderer::new(doc, options, ShapingMode::Reshape).render()
}

/// HTML renderer.
pub(crate) struct HtmlRenderer<'a> {
    ctx: RenderContext<'a>,
    out: String,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(doc: &'a Document, options: &'a ConvertOptions, shaping: ShapingMode) -> Self {
        Self {
            ctx: RenderContext::new(doc, "html", shaping, options),
            out: String::new(),
        }
    }

    pub fn render(mut self) -> Result<ConvertResult> {
        let doc = self.ctx.doc;
        let dir = self.ctx.document_direction();

        self.out.push_str("<!DOCTYPE html>\n");
        match doc.metadata().language.as_deref() {
            Some(lang) => {
                let _ = writeln!(self.out, "<html lang=\"{}\" dir=\"{}\">", escape(lang), dir);
            }
            None => {
                let _ = writeln!(self.out, "<html dir=\"{}\">", dir);
            }
        }
        self.render_head(dir);
        let _ = writeln!(self.out, "<body class=\"{}\">", dir);
        self.out.push_str("<article class=\"document\">\n");

        for page in doc.pages() {
            self.render_page(page);
        }

        self.out.push_str("</article>\n</body>\n</html>\n");
        let content = Output::Text(self.out);
        Ok(self.ctx.finish(content, "text/html"))
    }

    fn render_head(&mut self, dir: Direction) {
        let doc = self.ctx.doc;
        self.out.push_str("<head>\n<meta charset=\"utf-8\">\n");
        self.out
            .push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        if let Some(title) = doc.title() {
            let shaped = self.ctx.shape(title, dir);
            let _ = writeln!(self.out, "<title>{}</title>", escape(shaped.as_str()));
        }
        if let Some(author) = doc.metadata().author.as_deref() {
            let shaped = self.ctx.shape(author, dir);
            let _ = writeln!(self.out, "<meta name=\"author\" content=\"{}\">", escape(shaped.as_str()));
        }
        if let Some(subject) = doc.metadata().subject.as_deref() {
            let shaped = self.ctx.shape(subject, dir);
            let _ = writeln!(self.out, "<meta name=\"description\" content=\"{}\">", escape(shaped.as_str()));
        }
        if self.ctx.options.include_styles {
            let _ = writeln!(self.out, "<style>\n{}</style>", CSS);
        }
        self.out.push_str("</head>\n");
    }

    fn render_page(&mut self, page: &Page) {
        self.ctx.stats.add_page();
        let dir = render_page_direction(&self.ctx, page);
        let positioned = page
            .blocks
            .iter()
            .any(|b| matches!(b, Block::PositionedText(_)));
        let class = if positioned { "page positioned" } else { "page" };
        let _ = writeln!(
            self.out,
            "<section class=\"{} {}\" dir=\"{}\" data-page=\"{}\">",
            class, dir, dir, page.number
        );

        for block in &page.blocks {
            let dir = self.ctx.direction(page, block);
            self.ctx.stats.add_block(block.kind());
            match block {
                Block::Heading(h) => self.render_heading(h, dir),
                Block::Paragraph(p) => self.render_paragraph(p, dir),
                Block::Image(i) => self.render_image(i, dir),
                Block::Table(t) => self.render_table(t, dir),
                Block::List(l) => self.render_list(l, dir),
                Block::Link(l) => self.render_link(l, dir),
                Block::PositionedText(p) => self.render_positioned(p, dir),
            }
        }

        self.out.push_str("</section>\n");
    }

    fn render_heading(&mut self, heading: &Heading, dir: Direction) {
        let text = self.ctx.shape(&heading.text, dir);
        let _ = writeln!(
            self.out,
            "<h{level} dir=\"{dir}\" class=\"{dir}\">{}</h{level}>",
            escape(text.as_str()),
            level = heading.level,
            dir = dir
        );
    }

    fn render_paragraph(&mut self, para: &Paragraph, dir: Direction) {
        if para.is_empty() {
            return;
        }
        let _ = write!(self.out, "<p dir=\"{dir}\" class=\"{dir}\">", dir = dir);
        let segs = segments(para, self.ctx.options.preserve_styles);
        self.ctx.stats.add_links(para.links.len());
        let pieces = self.ctx.shape_segments(&para.text, dir, &segs);
        for (seg, text) in segs.iter().zip(pieces) {
            let mut html = escape(text.as_str()).into_owned();
            if seg.strike {
                html = format!("<s>{}</s>", html);
            }
            if seg.underline {
                html = format!("<u>{}</u>", html);
            }
            if seg.italic {
                html = format!("<em>{}</em>", html);
            }
            if seg.bold {
                html = format!("<strong>{}</strong>", html);
            }
            if let Some(url) = seg.url {
                html = format!("<a href=\"{}\">{}</a>", escape(url), html);
            }
            self.out.push_str(&html);
        }
        self.out.push_str("</p>\n");
    }

    fn render_image(&mut self, image: &Image, dir: Direction) {
        let src = image_src(image, self.ctx.options);
        let _ = writeln!(self.out, "<figure dir=\"{dir}\" class=\"{dir}\">", dir = dir);
        let _ = write!(self.out, "<img src=\"{}\"", escape(&src));
        if let Some(alt) = image.alt_text.as_deref() {
            let alt = self.ctx.shape(alt, dir);
            let _ = write!(self.out, " alt=\"{}\"", escape(alt.as_str()));
        } else {
            self.out.push_str(" alt=\"\"");
        }
        if let Some(width) = image.width {
            let _ = write!(self.out, " width=\"{}\"", width);
        }
        if let Some(height) = image.height {
            let _ = write!(self.out, " height=\"{}\"", height);
        }
        self.out.push_str(">\n");
        if let Some(caption) = image.caption.as_deref() {
            let caption = self.ctx.shape(caption, dir);
            let _ = writeln!(self.out, "<figcaption>{}</figcaption>", escape(caption.as_str()));
        }
        self.out.push_str("</figure>\n");
    }

    fn render_table(&mut self, table: &Table, dir: Direction) {
        if table.is_empty() {
            return;
        }
        let _ = writeln!(self.out, "<table dir=\"{dir}\" class=\"{dir}\">", dir = dir);
        if let Some(caption) = table.caption.as_deref() {
            let caption = self.ctx.shape(caption, dir);
            let _ = writeln!(self.out, "<caption>{}</caption>", escape(caption.as_str()));
        }
        if !table.header().is_empty() {
            self.out.push_str("<thead>\n");
            for row in table.header() {
                self.render_row(row, "th", dir);
            }
            self.out.push_str("</thead>\n");
        }
        self.out.push_str("<tbody>\n");
        for row in table.body() {
            self.render_row(row, "td", dir);
        }
        self.out.push_str("</tbody>\n</table>\n");
    }

    fn render_row(&mut self, row: &[String], tag: &str, dir: Direction) {
        self.out.push_str("<tr>");
        for cell in row {
            let text = self.ctx.shape(cell, dir);
            let _ = write!(self.out, "<{tag}>{}</{tag}>", escape(text.as_str()), tag = tag);
        }
        self.out.push_str("</tr>\n");
    }

    fn render_list(&mut self, list: &List, dir: Direction) {
        let tag = if list.ordered { "ol" } else { "ul" };
        self.ctx.stats.add_list_items(list.items.len());
        let _ = writeln!(self.out, "<{tag} dir=\"{dir}\" class=\"{dir}\">", tag = tag, dir = dir);
        for item in &list.items {
            let text = self.ctx.shape(item, dir);
            let _ = writeln!(self.out, "<li>{}</li>", escape(text.as_str()));
        }
        let _ = writeln!(self.out, "</{}>", tag);
    }

    fn render_link(&mut self, link: &Link, dir: Direction) {
        let text = self.ctx.shape(&link.text, dir);
        let _ = writeln!(
            self.out,
            "<p dir=\"{dir}\" class=\"{dir}\"><a href=\"{}\">{}</a></p>",
            escape(&link.url),
            escape(text.as_str()),
            dir = dir
        );
    }

    fn render_positioned(&mut self, block: &PositionedText, dir: Direction) {
        let text = self.ctx.shape(&block.text, dir);
        let mut class = format!("positioned {}", dir);
        if block.low_confidence {
            class.push_str(" low-confidence");
        }
        let b = block.bbox;
        let _ = write!(
            self.out,
            "<div class=\"{}\" dir=\"{}\" style=\"left: {:.2}%; top: {:.2}%; width: {:.2}%; height: {:.2}%;\" data-confidence=\"{:.2}\"",
            class,
            dir,
            b.x * 100.0,
            b.y * 100.0,
            b.width * 100.0,
            b.height * 100.0,
            block.confidence
        );
        if let Some(lang) = block.language.as_deref() {
            let _ = write!(self.out, " lang=\"{}\"", escape(lang));
        }
        let _ = writeln!(self.out, ">{}</div>", escape(text.as_str()));
    }
}

fn render_page_direction(ctx: &RenderContext<'_>, page: &Page) -> Direction {
    crate::bidi::render_direction(page.direction.resolve(ctx.doc.direction()), &page.plain_text())
}

/// `src` for an image: inline data, a prefixed file name, or its own URI.
pub(crate) fn image_src(image: &Image, options: &ConvertOptions) -> String {
    match &image.source {
        ImageSource::Reference { uri } => uri.clone(),
        ImageSource::Embedded { .. } if options.embed_images => image.data_uri().unwrap_or_default(),
        ImageSource::Embedded { .. } => format!("{}{}", options.image_path_prefix, image.suggested_filename()),
    }
}
