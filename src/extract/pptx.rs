//! PPTX (PresentationML) extractor.

use super::xml::{
    get_attribute, open_package, parse_core_properties, parse_relationships, read_binary_part,
    read_part, resolve_target, Relationship,
};
use super::{image_block, start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::{detect_direction, detect_direction_hinted, dominant_direction};
use crate::error::{Error, Result};
use crate::model::{
    Block, Direction, Document, ExtractionWarning, Heading, InlineLink, List, Page, StyleSpan,
    Table,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Extractor for PowerPoint presentations.
///
/// Each slide becomes one page, ordered by slide number. The title
/// placeholder becomes a level-1 heading and the page title.
#[derive(Debug, Default)]
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PptxExtractor {
    fn name(&self) -> &str {
        "pptx"
    }

    fn format_tags(&self) -> &[&str] {
        &["pptx"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let mut archive = open_package(bytes, "pptx")?;
        let slides = slide_parts(&mut archive);
        if slides.is_empty() && archive.by_name("ppt/presentation.xml").is_err() {
            return Err(Error::corrupt("pptx", "no presentation part"));
        }

        let mut builder = start_document("pptx", options);
        if let Some(core) = read_part(&mut archive, "docProps/core.xml") {
            parse_core_properties(&core).apply(&mut builder);
        }

        let mut image_count = 0usize;
        let mut first_title = None;
        for (number, path) in slides {
            let page_number = builder.page_count() as u32 + 1;
            let Some(xml) = read_part(&mut archive, &path) else {
                builder.new_page();
                builder.warn(ExtractionWarning::page(
                    page_number,
                    format!("slide {} is unreadable", number),
                ));
                continue;
            };
            let rels = read_part(&mut archive, &slide_rels_path(&path))
                .map(|r| parse_relationships(&r))
                .unwrap_or_default();
            let media = load_media(&mut archive, &rels);

            let mut reader = SlideReader::new(&rels, &media, options, image_count);
            match reader.read(&xml) {
                Ok(()) => {
                    image_count = reader.image_count;
                    if first_title.is_none() {
                        first_title = reader.title.clone();
                    }
                    let page = builder.new_page();
                    fill_page(page, reader.title, reader.blocks);
                    for message in reader.warnings {
                        builder.warn(ExtractionWarning::page(page_number, message));
                    }
                }
                Err(message) => {
                    builder.new_page();
                    builder.warn(ExtractionWarning::page(page_number, message));
                }
            }
        }

        if builder.current_title().is_none() {
            if let Some(title) = first_title.or_else(|| title_from_source(options)) {
                builder.set_title(title);
            }
        }

        Ok(builder.build()?)
    }
}

fn fill_page(page: &mut Page, title: Option<String>, blocks: Vec<Block>) {
    page.title = title;
    page.direction = dominant_direction(blocks.iter().map(|b| match b {
        Block::Heading(h) => h.text.as_str(),
        Block::Paragraph(p) => p.text.as_str(),
        _ => "",
    }));
    page.blocks = blocks;
}

/// Slide parts sorted by slide number.
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<(u32, String)> {
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);
    slides
}

fn slide_rels_path(slide_path: &str) -> String {
    match slide_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", slide_path),
    }
}

fn load_media<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels: &HashMap<String, Relationship>,
) -> HashMap<String, (Vec<u8>, String)> {
    rels.iter()
        .filter(|(_, rel)| rel.kind == "image" && !rel.external)
        .filter_map(|(id, rel)| {
            let path = resolve_target("ppt/slides", &rel.target);
            let data = read_binary_part(archive, &path)?;
            Some((id.clone(), (data, path)))
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

impl RunStyle {
    fn from_rpr(e: &BytesStart) -> Self {
        let on = |name| matches!(get_attribute(e, name).as_deref(), Some("1") | Some("true"));
        Self {
            bold: on("b"),
            italic: on("i"),
            underline: get_attribute(e, "u").is_some_and(|u| u != "none"),
            strike: get_attribute(e, "strike").is_some_and(|s| s != "noStrike"),
        }
    }

    fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default)]
struct TextParagraph {
    text: String,
    len: usize,
    spans: Vec<StyleSpan>,
    links: Vec<InlineLink>,
    rtl: bool,
    bullet: Option<bool>,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
    first_row_header: bool,
}

/// Streaming reader over one slide part.
struct SlideReader<'a> {
    rels: &'a HashMap<String, Relationship>,
    media: &'a HashMap<String, (Vec<u8>, String)>,
    options: &'a ExtractOptions,

    title: Option<String>,
    blocks: Vec<Block>,
    warnings: Vec<String>,
    image_count: usize,

    is_title: bool,
    shape_paragraphs: Vec<TextParagraph>,
    para: Option<TextParagraph>,
    style: RunStyle,
    run_link: Option<String>,
    run_start: usize,
    in_run: bool,
    in_text: bool,
    table: Option<TableState>,
    alt_text: Option<String>,
}

impl<'a> SlideReader<'a> {
    fn new(
        rels: &'a HashMap<String, Relationship>,
        media: &'a HashMap<String, (Vec<u8>, String)>,
        options: &'a ExtractOptions,
        image_count: usize,
    ) -> Self {
        Self {
            rels,
            media,
            options,
            title: None,
            blocks: Vec::new(),
            warnings: Vec::new(),
            image_count,
            is_title: false,
            shape_paragraphs: Vec::new(),
            para: None,
            style: RunStyle::default(),
            run_link: None,
            run_start: 0,
            in_run: false,
            in_text: false,
            table: None,
            alt_text: None,
        }
    }

    fn read(&mut self, xml: &str) -> std::result::Result<(), String> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => self.open(e, false),
                Ok(Event::Empty(ref e)) => self.open(e, true),
                Ok(Event::End(ref e)) => self.close(e.local_name().as_ref()),
                Ok(Event::Text(ref t)) => {
                    if self.in_text {
                        let text = t.unescape().unwrap_or_default().into_owned();
                        self.push_text(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(format!("malformed slide XML: {}", e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn open(&mut self, e: &BytesStart, empty: bool) {
        match e.local_name().as_ref() {
            b"sp" if !empty => {
                self.is_title = false;
                self.shape_paragraphs.clear();
            }
            b"ph" => {
                if let Some(kind) = get_attribute(e, "type") {
                    self.is_title = kind == "title" || kind == "ctrTitle";
                }
            }
            b"p" if !empty => self.para = Some(TextParagraph::default()),
            b"pPr" => {
                if let Some(para) = self.para.as_mut() {
                    para.rtl = get_attribute(e, "rtl").as_deref() == Some("1");
                }
            }
            b"buChar" => {
                if let Some(para) = self.para.as_mut() {
                    para.bullet = Some(false);
                }
            }
            b"buAutoNum" => {
                if let Some(para) = self.para.as_mut() {
                    para.bullet = Some(true);
                }
            }
            b"buNone" => {
                if let Some(para) = self.para.as_mut() {
                    para.bullet = None;
                }
            }
            b"r" if !empty => {
                self.in_run = true;
                self.style = RunStyle::default();
                self.run_link = None;
                self.run_start = self.para.as_ref().map_or(0, |p| p.len);
            }
            b"rPr" if self.in_run => self.style = RunStyle::from_rpr(e),
            b"hlinkClick" if self.in_run => {
                self.run_link = get_attribute(e, "id")
                    .and_then(|id| self.rels.get(&id))
                    .map(|rel| rel.target.clone());
            }
            b"t" if !empty => self.in_text = true,
            b"br" => self.push_text(" "),
            b"tbl" if !empty => self.table = Some(TableState::default()),
            b"tblPr" => {
                if let Some(table) = self.table.as_mut() {
                    table.first_row_header |= get_attribute(e, "firstRow").as_deref() == Some("1");
                }
            }
            b"tr" if !empty => {
                if let Some(table) = self.table.as_mut() {
                    table.row = Vec::new();
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                    if empty {
                        table.row.push(String::new());
                        table.cell = None;
                    }
                }
            }
            b"cNvPr" => {
                self.alt_text = get_attribute(e, "descr").filter(|d| !d.is_empty());
            }
            b"blip" => {
                if let Some(id) = get_attribute(e, "embed") {
                    self.embed_image(&id);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"r" => {
                if let (Some(url), Some(para)) = (self.run_link.take(), self.para.as_mut()) {
                    if para.len > self.run_start {
                        para.links.push(InlineLink::new(self.run_start, para.len, url));
                    }
                }
                self.in_run = false;
                self.in_text = false;
            }
            b"t" => self.in_text = false,
            b"p" => {
                if let Some(para) = self.para.take() {
                    match self.table.as_mut().and_then(|t| t.cell.as_mut()) {
                        Some(cell) => {
                            let text = self.options.clean(&para.text);
                            if !text.is_empty() {
                                if !cell.is_empty() {
                                    cell.push(' ');
                                }
                                cell.push_str(&text);
                            }
                        }
                        None => self.shape_paragraphs.push(para),
                    }
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.take() {
                        table.row.push(cell);
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.table.take() {
                    if !table.rows.is_empty() {
                        let header_rows = usize::from(table.first_row_header);
                        let built = Table::new(table.rows).with_header_rows(header_rows);
                        let direction = detect_direction(&built.plain_text());
                        self.blocks.push(built.with_direction(direction).into());
                    }
                }
            }
            b"sp" => self.finish_shape(),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(para) = self.para.as_mut() else {
            return;
        };
        let start = para.len;
        para.text.push_str(text);
        para.len += text.chars().count();
        if para.len > start && !self.style.is_plain() {
            para.spans.push(StyleSpan {
                start,
                end: para.len,
                bold: self.style.bold,
                italic: self.style.italic,
                underline: self.style.underline,
                strike: self.style.strike,
            });
        }
    }

    fn embed_image(&mut self, rel_id: &str) {
        let Some((data, path)) = self.media.get(rel_id) else {
            self.warnings
                .push(format!("image relationship {} has no readable part", rel_id));
            return;
        };
        self.image_count += 1;
        let mime = path
            .rsplit('.')
            .next()
            .and_then(crate::model::mime_from_extension);
        let mut image = image_block(format!("image{}", self.image_count), data.clone(), mime, self.options);
        if let Some(alt) = self.alt_text.take() {
            image = image.with_alt_text(alt.clone()).with_caption(alt);
        }
        self.blocks.push(image.into());
    }

    fn finish_shape(&mut self) {
        let paragraphs = std::mem::take(&mut self.shape_paragraphs);

        if self.is_title {
            let text = paragraphs
                .iter()
                .map(|p| self.options.clean(&p.text))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                let hint = if paragraphs.iter().any(|p| p.rtl) { Direction::Rtl } else { Direction::Auto };
                let direction = detect_direction_hinted(&text, hint);
                if self.title.is_none() {
                    self.title = Some(text.clone());
                }
                self.blocks.push(Heading::new(1, text).with_direction(direction).into());
            }
            self.is_title = false;
            return;
        }

        let mut list: Option<(bool, Vec<String>)> = None;
        for para in paragraphs {
            match para.bullet {
                Some(ordered) => {
                    let item = self.options.clean(&para.text);
                    if item.is_empty() {
                        continue;
                    }
                    match list.as_mut() {
                        Some((o, items)) if *o == ordered => items.push(item),
                        _ => {
                            self.flush_list(list.take());
                            list = Some((ordered, vec![item]));
                        }
                    }
                }
                None => {
                    self.flush_list(list.take());
                    let paragraph = self.options.paragraph(&para.text, para.spans, para.links);
                    if paragraph.is_empty() {
                        continue;
                    }
                    let hint = if para.rtl { Direction::Rtl } else { Direction::Auto };
                    let direction = detect_direction_hinted(&paragraph.text, hint);
                    self.blocks.push(paragraph.with_direction(direction).into());
                }
            }
        }
        self.flush_list(list);
    }

    fn flush_list(&mut self, list: Option<(bool, Vec<String>)>) {
        if let Some((ordered, items)) = list {
            let direction = detect_direction(&items.join(" "));
            self.blocks.push(List::new(items, ordered).with_direction(direction).into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn slide(inner: &str) -> String {
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a" xmlns:r="r"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            inner
        )
    }

    fn title_shape(text: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            text
        )
    }

    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn extract(bytes: &[u8]) -> Document {
        PptxExtractor::new().extract(bytes, &ExtractOptions::default()).unwrap()
    }

    #[test]
    fn test_slides_ordered_numerically() {
        let s1 = slide(&title_shape("One"));
        let s2 = slide(&title_shape("Two"));
        let s10 = slide(&title_shape("Ten"));
        let doc = extract(&package(&[
            ("ppt/slides/slide10.xml", s10.as_bytes()),
            ("ppt/slides/slide2.xml", s2.as_bytes()),
            ("ppt/slides/slide1.xml", s1.as_bytes()),
        ]));
        let titles: Vec<_> = doc.pages().iter().map(|p| p.title.clone().unwrap_or_default()).collect();
        assert_eq!(titles, vec!["One", "Two", "Ten"]);
        assert_eq!(doc.title(), Some("One"));
    }

    #[test]
    fn test_body_text_bullets_and_styles() {
        let body = r#"<p:sp><p:txBody>
<a:p><a:r><a:rPr b="1"/><a:t>Bold</a:t></a:r><a:r><a:t xml:space="preserve"> text</a:t></a:r></a:p>
<a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:t>first</a:t></a:r></a:p>
<a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:t>second</a:t></a:r></a:p>
</p:txBody></p:sp>"#;
        let xml = slide(&format!("{}{}", title_shape("Agenda"), body));
        let doc = extract(&package(&[("ppt/slides/slide1.xml", xml.as_bytes())]));
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[0], Block::Heading(h) if h.text == "Agenda"));
        match &blocks[1] {
            Block::Paragraph(p) => {
                assert_eq!(p.text, "Bold text");
                assert!(p.spans[0].bold && p.spans[0].end == 4);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert!(matches!(&blocks[2], Block::List(l) if !l.ordered && l.items == ["first", "second"]));
    }

    #[test]
    fn test_table_and_rtl() {
        let table = r#"<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tblPr firstRow="1"/>
<a:tr><a:tc><a:txBody><a:p><a:r><a:t>الاسم</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>العمر</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
<a:tr><a:tc><a:txBody><a:p><a:r><a:t>سارة</a:t></a:r></a:p></a:txBody></a:tc><a:tc/></a:tr>
</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let doc = extract(&package(&[("ppt/slides/slide1.xml", slide(table).as_bytes())]));
        match &doc.pages()[0].blocks[0] {
            Block::Table(t) => {
                assert_eq!(t.header_rows, 1);
                assert_eq!(t.rows[1], vec!["سارة", ""]);
                assert_eq!(t.direction, Direction::Rtl);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_slide_isolated() {
        let good = slide(&title_shape("Fine"));
        let doc = extract(&package(&[
            ("ppt/slides/slide1.xml", good.as_bytes()),
            ("ppt/slides/slide2.xml", b"<p:sld><p:cSld></p:sld>"),
            ("ppt/slides/slide3.xml", good.as_bytes()),
        ]));
        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages()[1].is_empty());
        assert!(!doc.pages()[2].is_empty());
        assert_eq!(doc.metadata().warnings_for_page(2).count(), 1);
    }

    #[test]
    fn test_not_a_presentation() {
        let err = PptxExtractor::new()
            .extract(&package(&[("other.txt", b"x")]), &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }));
    }
}
