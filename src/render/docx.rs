//! DOCX rendering.
//!
//! Writes a minimal WordprocessingML package: document body, styles,
//! numbering, core properties and media. Right-to-left blocks get `w:bidi`
//! paragraphs and `w:rtl` runs. Pages are separated by explicit page breaks.

use super::context::RenderContext;
use super::inline::segments;
use super::DegradeAction;
use crate::bidi::ShapingMode;
use crate::convert::{ConvertOptions, ConvertResult, Output};
use crate::error::{Error, Result};
use crate::model::{Block, BlockKind, Direction, Document, Image, ImageSource, List, Page, Paragraph, Table};
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::result::ZipResult;
use zip::{CompressionMethod, ZipWriter};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const EMU_PER_PIXEL: u64 = 9525;
const DEFAULT_WIDTH_PX: u32 = 300;
const DEFAULT_HEIGHT_PX: u32 = 200;
/// Six inches, the text width of a Letter page with one-inch margins.
const MAX_WIDTH_EMU: u64 = 5_486_400;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160"/></w:pPr></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:rPr><w:sz w:val="56"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:i/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="heading 5"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="4"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="heading 6"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="5"/></w:pPr><w:rPr><w:i/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Caption"><w:name w:val="caption"/><w:basedOn w:val="Normal"/><w:rPr><w:i/><w:sz w:val="18"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720"/></w:pPr></w:style>
<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>
</w:styles>
"#;

/// Convert a document to a DOCX package.
pub fn to_docx(doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
    DocxRenderer::new(doc, options).render()
}

struct MediaPart {
    rel_id: String,
    path: String,
    data: Vec<u8>,
}

struct DocxRenderer<'a> {
    ctx: RenderContext<'a>,
    body: String,
    hyperlinks: HashMap<String, String>,
    media: Vec<MediaPart>,
    /// One numbering instance per list, true when ordered.
    lists: Vec<bool>,
    next_rel: usize,
}

impl<'a> DocxRenderer<'a> {
    fn new(doc: &'a Document, options: &'a ConvertOptions) -> Self {
        Self {
            ctx: RenderContext::new(doc, "docx", ShapingMode::Reshape, options),
            body: String::new(),
            hyperlinks: HashMap::new(),
            media: Vec::new(),
            lists: Vec::new(),
            // rId1 and rId2 are styles and numbering
            next_rel: 3,
        }
    }

    fn render(mut self) -> Result<ConvertResult> {
        let doc = self.ctx.doc;
        let pages = doc.pages();
        for (i, page) in pages.iter().enumerate() {
            self.ctx.stats.add_page();
            for (index, block) in page.blocks.iter().enumerate() {
                self.render_block(page, index, block)?;
            }
            if i + 1 < pages.len() {
                self.body.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
            }
        }

        let package = self.package()?;
        Ok(self.ctx.finish(Output::Binary(package), DOCX_MIME))
    }

    fn render_block(&mut self, page: &Page, index: usize, block: &Block) -> Result<()> {
        let dir = self.ctx.direction(page, block);
        self.ctx.stats.add_block(block.kind());
        match block {
            Block::Heading(h) => {
                let text = self.ctx.shape(&h.text, dir);
                let style = format!("Heading{}", h.level.clamp(1, 6));
                self.open_paragraph(Some(&style), None, dir);
                self.run(text.as_str(), RunStyle::default(), dir);
                self.body.push_str("</w:p>");
            }
            Block::Paragraph(p) => self.render_paragraph(p, dir),
            Block::Image(image) => self.render_image(page, index, image, dir)?,
            Block::Table(table) => self.render_table(table, dir),
            Block::List(list) => self.render_list(list, dir),
            Block::Link(link) => {
                let text = self.ctx.shape(&link.text, dir);
                let rel = self.hyperlink(&link.url);
                self.open_paragraph(None, None, dir);
                let _ = write!(self.body, "<w:hyperlink r:id=\"{}\">", rel);
                self.run(text.as_str(), RunStyle::link(), dir);
                self.body.push_str("</w:hyperlink></w:p>");
            }
            Block::PositionedText(p) => {
                self.ctx
                    .degrade(page, index, BlockKind::PositionedText, DegradeAction::PositionDropped)?;
                let text = self.ctx.shape(&p.text, dir);
                self.open_paragraph(None, None, dir);
                self.run(text.as_str(), RunStyle::default(), dir);
                self.body.push_str("</w:p>");
            }
        }
        Ok(())
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph, dir: Direction) {
        if paragraph.is_empty() {
            return;
        }
        self.ctx.stats.add_links(paragraph.links.len());
        self.open_paragraph(None, None, dir);
        let segs = segments(paragraph, self.ctx.options.preserve_styles);
        let pieces = self.ctx.shape_segments(&paragraph.text, dir, &segs);
        for (segment, text) in segs.iter().zip(pieces) {
            let mut style = RunStyle {
                bold: segment.bold,
                italic: segment.italic,
                underline: segment.underline,
                strike: segment.strike,
                hyperlink: false,
            };
            match segment.url {
                Some(url) => {
                    let rel = self.hyperlink(url);
                    style.hyperlink = true;
                    let _ = write!(self.body, "<w:hyperlink r:id=\"{}\">", rel);
                    self.run(text.as_str(), style, dir);
                    self.body.push_str("</w:hyperlink>");
                }
                None => self.run(text.as_str(), style, dir),
            }
        }
        self.body.push_str("</w:p>");
    }

    fn render_image(&mut self, page: &Page, index: usize, image: &Image, dir: Direction) -> Result<()> {
        let ImageSource::Embedded { data, .. } = &image.source else {
            self.ctx
                .degrade(page, index, BlockKind::Image, DegradeAction::Placeholder)?;
            let label = self.ctx.shape(image.label(), dir);
            self.open_paragraph(None, None, dir);
            self.run(&format!("[Image: {}]", label), RunStyle::default(), dir);
            self.body.push_str("</w:p>");
            return Ok(());
        };

        let number = self.media.len() + 1;
        let rel_id = self.rel_id();
        let filename = format!("image{}.{}", number, image.extension());
        self.media.push(MediaPart {
            rel_id: rel_id.clone(),
            path: format!("media/{}", filename),
            data: data.clone(),
        });

        let (cx, cy) = extent(image.width, image.height);
        let alt = image
            .alt_text
            .as_deref()
            .map(|a| self.ctx.shape(a, dir).into_string())
            .unwrap_or_default();

        self.open_paragraph(None, None, dir);
        let _ = write!(
            self.body,
            concat!(
                "<w:r><w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:docPr id=\"{n}\" name=\"Picture {n}\" descr=\"{alt}\"/>",
                "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
                "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
                "<pic:nvPicPr><pic:cNvPr id=\"{n}\" name=\"{file}\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
            ),
            cx = cx,
            cy = cy,
            n = number,
            alt = escape(alt.as_str()),
            file = filename,
            rel = rel_id,
        );

        if let Some(caption) = &image.caption {
            let caption = self.ctx.shape(caption, dir);
            self.open_paragraph(Some("Caption"), None, dir);
            self.run(caption.as_str(), RunStyle::default(), dir);
            self.body.push_str("</w:p>");
        }
        Ok(())
    }

    fn render_table(&mut self, table: &Table, dir: Direction) {
        if let Some(caption) = &table.caption {
            let caption = self.ctx.shape(caption, dir);
            self.open_paragraph(Some("Caption"), None, dir);
            self.run(caption.as_str(), RunStyle::default(), dir);
            self.body.push_str("</w:p>");
        }

        self.body.push_str("<w:tbl><w:tblPr>");
        if dir.is_rtl() {
            self.body.push_str("<w:bidiVisual/>");
        }
        self.body.push_str(concat!(
            "<w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>",
            "<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "<w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "<w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "<w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "<w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
            "</w:tblBorders></w:tblPr><w:tblGrid>"
        ));
        for _ in 0..table.column_count() {
            self.body.push_str("<w:gridCol/>");
        }
        self.body.push_str("</w:tblGrid>");

        for (r, row) in table.rows.iter().enumerate() {
            let header = r < table.header_rows;
            self.body.push_str("<w:tr>");
            if header {
                self.body.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for cell in row {
                let text = self.ctx.shape(cell, dir);
                self.body.push_str("<w:tc><w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/></w:tcPr>");
                self.open_paragraph(None, None, dir);
                let style = RunStyle {
                    bold: header,
                    ..RunStyle::default()
                };
                self.run(text.as_str(), style, dir);
                self.body.push_str("</w:p></w:tc>");
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
    }

    fn render_list(&mut self, list: &List, dir: Direction) {
        self.ctx.stats.add_list_items(list.items.len());
        self.lists.push(list.ordered);
        let num_id = self.lists.len();
        for item in &list.items {
            let text = self.ctx.shape(item, dir);
            self.open_paragraph(Some("ListParagraph"), Some(num_id), dir);
            self.run(text.as_str(), RunStyle::default(), dir);
            self.body.push_str("</w:p>");
        }
    }

    fn open_paragraph(&mut self, style: Option<&str>, num_id: Option<usize>, dir: Direction) {
        let rtl = dir.is_rtl();
        if style.is_none() && num_id.is_none() && !rtl {
            self.body.push_str("<w:p>");
            return;
        }
        self.body.push_str("<w:p><w:pPr>");
        if let Some(style) = style {
            let _ = write!(self.body, "<w:pStyle w:val=\"{}\"/>", style);
        }
        if let Some(num_id) = num_id {
            let _ = write!(
                self.body,
                "<w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
                num_id
            );
        }
        if rtl {
            self.body.push_str("<w:bidi/><w:jc w:val=\"right\"/>");
        }
        self.body.push_str("</w:pPr>");
    }

    fn run(&mut self, text: &str, style: RunStyle, dir: Direction) {
        if text.is_empty() {
            return;
        }
        self.body.push_str("<w:r>");
        let rtl = dir.is_rtl();
        if style.has_properties() || rtl {
            self.body.push_str("<w:rPr>");
            if style.hyperlink {
                self.body.push_str("<w:rStyle w:val=\"Hyperlink\"/>");
            }
            if style.bold {
                self.body.push_str("<w:b/>");
            }
            if style.italic {
                self.body.push_str("<w:i/>");
            }
            if style.strike {
                self.body.push_str("<w:strike/>");
            }
            if style.underline {
                self.body.push_str("<w:u w:val=\"single\"/>");
            }
            if rtl {
                self.body.push_str("<w:rtl/>");
            }
            self.body.push_str("</w:rPr>");
        }
        let _ = write!(self.body, "<w:t xml:space=\"preserve\">{}</w:t></w:r>", escape(text));
    }

    fn rel_id(&mut self) -> String {
        let id = format!("rId{}", self.next_rel);
        self.next_rel += 1;
        id
    }

    fn hyperlink(&mut self, url: &str) -> String {
        if let Some(id) = self.hyperlinks.get(url) {
            return id.clone();
        }
        let id = self.rel_id();
        self.hyperlinks.insert(url.to_string(), id.clone());
        id
    }

    fn package(&self) -> Result<Vec<u8>> {
        self.write_package()
            .map_err(|e| Error::Render(format!("docx package write failed: {}", e)))
    }

    fn write_package(&self) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(self.document_rels().as_bytes())?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;

        zip.start_file("word/numbering.xml", options)?;
        zip.write_all(self.numbering_xml().as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(core_properties(self.ctx.doc).as_bytes())?;

        for part in &self.media {
            zip.start_file(format!("word/{}", part.path), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn document_xml(&self) -> String {
        let mut xml = String::with_capacity(self.body.len() + 512);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        xml.push_str(concat!(
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" ",
            "xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
            "xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">"
        ));
        xml.push_str("<w:body>");
        xml.push_str(&self.body);
        xml.push_str(concat!(
            "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>",
            "<w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" ",
            "w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>"
        ));
        xml.push_str("</w:body></w:document>\n");
        xml
    }

    fn document_rels(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        xml.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
        let _ = write!(
            xml,
            "<Relationship Id=\"rId1\" Type=\"{}/styles\" Target=\"styles.xml\"/>",
            REL_BASE
        );
        let _ = write!(
            xml,
            "<Relationship Id=\"rId2\" Type=\"{}/numbering\" Target=\"numbering.xml\"/>",
            REL_BASE
        );
        for part in &self.media {
            let _ = write!(
                xml,
                "<Relationship Id=\"{}\" Type=\"{}/image\" Target=\"{}\"/>",
                part.rel_id, REL_BASE, part.path
            );
        }
        let mut links: Vec<(&String, &String)> = self.hyperlinks.iter().collect();
        links.sort_by(|a, b| a.1.cmp(b.1));
        for (url, id) in links {
            let _ = write!(
                xml,
                "<Relationship Id=\"{}\" Type=\"{}/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
                id,
                REL_BASE,
                escape(url.as_str())
            );
        }
        xml.push_str("</Relationships>\n");
        xml
    }

    fn numbering_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        xml.push_str("<w:numbering xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">");
        xml.push_str(concat!(
            "<w:abstractNum w:abstractNumId=\"0\"><w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/>",
            "<w:numFmt w:val=\"bullet\"/><w:lvlText w:val=\"\u{2022}\"/><w:lvlJc w:val=\"left\"/>",
            "<w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>",
            "<w:abstractNum w:abstractNumId=\"1\"><w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/>",
            "<w:numFmt w:val=\"decimal\"/><w:lvlText w:val=\"%1.\"/><w:lvlJc w:val=\"left\"/>",
            "<w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>"
        ));
        for (i, ordered) in self.lists.iter().enumerate() {
            let _ = write!(
                xml,
                "<w:num w:numId=\"{}\"><w:abstractNumId w:val=\"{}\"/>",
                i + 1,
                u8::from(*ordered)
            );
            if *ordered {
                xml.push_str("<w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"1\"/></w:lvlOverride>");
            }
            xml.push_str("</w:num>");
        }
        xml.push_str("</w:numbering>\n");
        xml
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    hyperlink: bool,
}

impl RunStyle {
    fn link() -> Self {
        Self {
            hyperlink: true,
            ..Self::default()
        }
    }

    fn has_properties(&self) -> bool {
        self.bold || self.italic || self.underline || self.strike || self.hyperlink
    }
}

/// Drawing extent in EMU, scaled down to the text width when wider.
fn extent(width: Option<u32>, height: Option<u32>) -> (u64, u64) {
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => (DEFAULT_WIDTH_PX, DEFAULT_HEIGHT_PX),
    };
    let cx = u64::from(w) * EMU_PER_PIXEL;
    let cy = u64::from(h) * EMU_PER_PIXEL;
    if cx > MAX_WIDTH_EMU {
        (MAX_WIDTH_EMU, cy * MAX_WIDTH_EMU / cx)
    } else {
        (cx, cy)
    }
}

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" ",
    "Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" ",
    "Target=\"word/document.xml\"/>",
    "<Relationship Id=\"rId2\" ",
    "Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" ",
    "Target=\"docProps/core.xml\"/>",
    "</Relationships>\n"
);

fn content_types() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    xml.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
    xml.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    xml.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
    for (ext, mime) in [
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("tiff", "image/tiff"),
        ("webp", "image/webp"),
        ("jp2", "image/jp2"),
        ("emf", "image/x-emf"),
        ("wmf", "image/x-wmf"),
        ("bin", "application/octet-stream"),
    ] {
        let _ = write!(xml, "<Default Extension=\"{}\" ContentType=\"{}\"/>", ext, mime);
    }
    for (part, mime) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/word/numbering.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
        ),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
    ] {
        let _ = write!(xml, "<Override PartName=\"{}\" ContentType=\"{}\"/>", part, mime);
    }
    xml.push_str("</Types>\n");
    xml
}

/// Core properties carry metadata in logical order, unshaped.
fn core_properties(doc: &Document) -> String {
    let meta = doc.metadata();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    xml.push_str(concat!(
        "<cp:coreProperties ",
        "xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
        "xmlns:dc=\"http://purl.org/dc/elements/1.1/\" ",
        "xmlns:dcterms=\"http://purl.org/dc/terms/\" ",
        "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">"
    ));
    if let Some(title) = doc.title() {
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape(title));
    }
    if let Some(author) = &meta.author {
        let _ = write!(xml, "<dc:creator>{}</dc:creator>", escape(author.as_str()));
    }
    if let Some(subject) = &meta.subject {
        let _ = write!(xml, "<dc:subject>{}</dc:subject>", escape(subject.as_str()));
    }
    if !meta.keywords.is_empty() {
        let _ = write!(xml, "<cp:keywords>{}</cp:keywords>", escape(meta.keywords.join(", ").as_str()));
    }
    if let Some(language) = &meta.language {
        let _ = write!(xml, "<dc:language>{}</dc:language>", escape(language.as_str()));
    }
    if let Some(created) = meta.created {
        let _ = write!(
            xml,
            "<dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>",
            created.format("%Y-%m-%dT%H:%M:%SZ")
        );
    }
    if let Some(modified) = meta.modified {
        let _ = write!(
            xml,
            "<dcterms:modified xsi:type=\"dcterms:W3CDTF\">{}</dcterms:modified>",
            modified.format("%Y-%m-%dT%H:%M:%SZ")
        );
    }
    xml.push_str("</cp:coreProperties>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DocxExtractor, ExtractOptions, Extractor};
    use crate::model::{DocumentBuilder, Heading, InlineLink, StyleSpan};
    use std::io::Read;
    use zip::ZipArchive;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    fn render(doc: &Document) -> ConvertResult {
        to_docx(doc, &ConvertOptions::default()).unwrap()
    }

    #[test]
    fn test_extent_scaling() {
        assert_eq!(extent(None, None), (300 * 9525, 200 * 9525));
        assert_eq!(extent(Some(100), Some(50)), (952_500, 476_250));
        let (cx, cy) = extent(Some(1200), Some(600));
        assert_eq!(cx, MAX_WIDTH_EMU);
        assert_eq!(cy, MAX_WIDTH_EMU / 2);
    }

    #[test]
    fn test_package_parts() {
        let mut builder = DocumentBuilder::new("md").title("Report");
        builder.new_page().push(Paragraph::new("Hello"));
        let result = render(&builder.build().unwrap());

        assert_eq!(result.mime_type, DOCX_MIME);
        let bytes = result.bytes();
        assert!(bytes.starts_with(b"PK"));
        assert!(part(bytes, "word/document.xml").contains("<w:t xml:space=\"preserve\">Hello</w:t>"));
        assert!(part(bytes, "docProps/core.xml").contains("<dc:title>Report</dc:title>"));
        assert!(part(bytes, "[Content_Types].xml").contains("/word/document.xml"));
    }

    #[test]
    fn test_rtl_heading_markup() {
        let mut builder = DocumentBuilder::new("md");
        builder
            .new_page()
            .push(Heading::new(1, "مرحبا").with_direction(Direction::Rtl));
        let result = render(&builder.build().unwrap());
        let xml = part(result.bytes(), "word/document.xml");
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:bidi/>"));
        assert!(xml.contains("<w:rtl/>"));
        assert!(xml.contains("\u{FEE3}\u{FEAE}\u{FEA3}\u{FE92}\u{FE8E}"));
    }

    #[test]
    fn test_spans_and_hyperlinks() {
        let mut builder = DocumentBuilder::new("md");
        builder.new_page().push(
            Paragraph::new("bold and link")
                .with_span(StyleSpan::new(0, 4).bold())
                .with_link(InlineLink::new(9, 13, "https://example.com/?a=1&b=2")),
        );
        let result = render(&builder.build().unwrap());
        let xml = part(result.bytes(), "word/document.xml");
        assert!(xml.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">bold</w:t>"));
        assert!(xml.contains("<w:hyperlink r:id=\"rId3\">"));
        let rels = part(result.bytes(), "word/_rels/document.xml.rels");
        assert!(rels.contains("Target=\"https://example.com/?a=1&amp;b=2\""));
        assert_eq!(result.stats.link_count, 1);
    }

    #[test]
    fn test_reference_image_degrades() {
        let mut builder = DocumentBuilder::new("html");
        builder
            .new_page()
            .push(Image::reference("img1", "https://x.y/a.png").with_caption("Logo"));
        let doc = builder.build().unwrap();

        let result = render(&doc);
        assert_eq!(result.degradations.len(), 1);
        assert!(part(result.bytes(), "word/document.xml").contains("[Image: Logo]"));

        let strict = ConvertOptions::default().with_strict(true);
        assert!(to_docx(&doc, &strict).is_err());
    }

    #[test]
    fn test_reextracts() {
        let png = {
            let img = image::GrayImage::from_pixel(4, 4, image::Luma([0u8]));
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };

        let mut builder = DocumentBuilder::new("md").title("Round");
        let page = builder.new_page();
        page.push(Heading::new(1, "Round"));
        page.push(Paragraph::new("First page"));
        page.push(List::new(vec!["one".into(), "two".into()], true));
        page.push(Table::from_rows([vec!["A", "B"], vec!["1", "2"]]).with_header_rows(1));
        let page = builder.new_page();
        page.push(Paragraph::new("Second page"));
        page.push(Image::embedded("img1", png).with_alt_text("Square"));
        let doc = builder.build().unwrap();

        let result = render(&doc);
        let back = DocxExtractor::new()
            .extract(result.bytes(), &ExtractOptions::default())
            .unwrap();

        assert_eq!(back.title(), Some("Round"));
        assert_eq!(back.page_count(), 2);
        let first = &back.pages()[0].blocks;
        assert!(matches!(&first[0], Block::Heading(h) if h.text == "Round"));
        assert!(matches!(&first[2], Block::List(l) if l.ordered && l.items == ["one", "two"]));
        assert!(matches!(&first[3], Block::Table(t) if t.header_rows == 1 && t.rows[1] == ["1", "2"]));
        let second = &back.pages()[1].blocks;
        assert!(matches!(&second[1], Block::Image(i) if i.mime_type() == Some("image/png")));
    }
}
