//! DOCX (WordprocessingML) extractor.

use super::xml::{
    get_attribute, open_package, parse_core_properties, parse_relationships, read_binary_part,
    read_part, resolve_target, Relationship,
};
use super::{image_block, start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::{detect_direction, detect_direction_hinted};
use crate::error::{Error, Result};
use crate::model::{
    Block, Direction, Document, ExtractionWarning, Heading, Image, InlineLink, List, StyleSpan,
    Table,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Extractor for Word documents.
///
/// Explicit page breaks (`w:br w:type="page"` and `w:pageBreakBefore`)
/// start a new page; everything else flows onto the current one.
#[derive(Debug, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for DocxExtractor {
    fn name(&self) -> &str {
        "docx"
    }

    fn format_tags(&self) -> &[&str] {
        &["docx"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let mut archive = open_package(bytes, "docx")?;
        let body = read_part(&mut archive, "word/document.xml")
            .ok_or_else(|| Error::corrupt("docx", "missing word/document.xml"))?;

        let rels = read_part(&mut archive, "word/_rels/document.xml.rels")
            .map(|xml| parse_relationships(&xml))
            .unwrap_or_default();
        let numbering = read_part(&mut archive, "word/numbering.xml")
            .map(|xml| parse_numbering(&xml))
            .unwrap_or_default();

        let mut media = HashMap::new();
        for (id, rel) in rels.iter().filter(|(_, r)| r.kind == "image" && !r.external) {
            let path = resolve_target("word", &rel.target);
            if let Some(data) = read_binary_part(&mut archive, &path) {
                media.insert(id.clone(), data);
            }
        }

        let mut builder = start_document("docx", options);
        if let Some(core) = read_part(&mut archive, "docProps/core.xml") {
            parse_core_properties(&core).apply(&mut builder);
        }

        let mut reader = BodyReader::new(&rels, &numbering, &media, options);
        reader.read(&body)?;

        if builder.current_title().is_none() {
            let heading = reader.pages.iter().flatten().find_map(|block| match block {
                Block::Heading(h) if h.level == 1 => Some(h.text.clone()),
                _ => None,
            });
            if let Some(title) = heading.or_else(|| title_from_source(options)) {
                builder.set_title(title);
            }
        }

        for warning in std::mem::take(&mut reader.warnings) {
            builder.warn(warning);
        }
        for blocks in reader.pages {
            let page = builder.new_page();
            page.direction = crate::bidi::dominant_direction(blocks.iter().map(|b| match b {
                Block::Heading(h) => h.text.as_str(),
                Block::Paragraph(p) => p.text.as_str(),
                _ => "",
            }));
            page.blocks = blocks;
        }

        Ok(builder.build()?)
    }
}

/// numId → ordered, from the level-0 number format of each abstract
/// numbering definition.
fn parse_numbering(xml: &str) -> HashMap<String, bool> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut abstract_ordered: HashMap<String, bool> = HashMap::new();
    let mut num_to_abstract: HashMap<String, String> = HashMap::new();
    let mut current_abstract: Option<String> = None;
    let mut current_level: Option<String> = None;
    let mut current_num: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => current_abstract = get_attribute(e, "abstractNumId"),
                b"lvl" => current_level = get_attribute(e, "ilvl"),
                b"numFmt" if current_level.as_deref() == Some("0") => {
                    if let (Some(id), Some(fmt)) = (&current_abstract, get_attribute(e, "val")) {
                        abstract_ordered.insert(id.clone(), fmt != "bullet" && fmt != "none");
                    }
                }
                b"num" => current_num = get_attribute(e, "numId"),
                b"abstractNumId" => {
                    if let (Some(num), Some(abs)) = (&current_num, get_attribute(e, "val")) {
                        num_to_abstract.insert(num.clone(), abs);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => current_abstract = None,
                b"lvl" => current_level = None,
                b"num" => current_num = None,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    num_to_abstract
        .into_iter()
        .map(|(num, abs)| {
            let ordered = abstract_ordered.get(&abs).copied().unwrap_or(false);
            (num, ordered)
        })
        .collect()
}

fn flag_on(e: &BytesStart) -> bool {
    !matches!(get_attribute(e, "val").as_deref(), Some("0") | Some("false") | Some("none"))
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

#[derive(Debug, Default)]
struct ParagraphState {
    text: String,
    len: usize,
    spans: Vec<StyleSpan>,
    links: Vec<InlineLink>,
    heading: Option<u8>,
    num_id: Option<String>,
    bidi: bool,
    images: Vec<Image>,
    break_after: bool,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
    span: usize,
    header_rows: usize,
    row_is_header: bool,
}

struct PendingList {
    num_id: String,
    ordered: bool,
    items: Vec<String>,
}

/// Streaming reader over `word/document.xml`.
struct BodyReader<'a> {
    rels: &'a HashMap<String, Relationship>,
    numbering: &'a HashMap<String, bool>,
    media: &'a HashMap<String, Vec<u8>>,
    options: &'a ExtractOptions,

    pages: Vec<Vec<Block>>,
    warnings: Vec<ExtractionWarning>,

    para: Option<ParagraphState>,
    style: RunStyle,
    in_run: bool,
    in_text: bool,
    in_ppr: bool,
    link: Option<(usize, String)>,
    tables: Vec<TableState>,
    deferred: Vec<Block>,
    list: Option<PendingList>,
    image_count: usize,
    alt_text: Option<String>,
}

impl<'a> BodyReader<'a> {
    fn new(
        rels: &'a HashMap<String, Relationship>,
        numbering: &'a HashMap<String, bool>,
        media: &'a HashMap<String, Vec<u8>>,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            rels,
            numbering,
            media,
            options,
            pages: vec![Vec::new()],
            warnings: Vec::new(),
            para: None,
            style: RunStyle::default(),
            in_run: false,
            in_text: false,
            in_ppr: false,
            link: None,
            tables: Vec::new(),
            deferred: Vec::new(),
            list: None,
            image_count: 0,
            alt_text: None,
        }
    }

    fn read(&mut self, xml: &str) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => self.open(e, false),
                Ok(Event::Empty(ref e)) => self.open(e, true),
                Ok(Event::End(ref e)) => self.close(e.local_name().as_ref()),
                Ok(Event::Text(ref t)) => {
                    if self.in_text && self.in_run {
                        let text = t.unescape().unwrap_or_default().into_owned();
                        self.push_text(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::corrupt("docx", format!("document.xml: {}", e)));
                }
                _ => {}
            }
            buf.clear();
        }

        self.flush_list();
        while let Some(table) = self.tables.pop() {
            self.finish_table(table);
        }
        while self.pages.len() > 1 && self.pages.last().is_some_and(Vec::is_empty) {
            self.pages.pop();
        }
        Ok(())
    }

    fn open(&mut self, e: &BytesStart, empty: bool) {
        match e.local_name().as_ref() {
            b"p" if !empty => {
                self.para = Some(ParagraphState::default());
            }
            b"pPr" if !empty => self.in_ppr = true,
            b"pStyle" => {
                if let (Some(para), Some(val)) = (self.para.as_mut(), get_attribute(e, "val")) {
                    para.heading = heading_level(&val);
                }
            }
            b"numId" if self.in_ppr => {
                if let Some(para) = self.para.as_mut() {
                    para.num_id = get_attribute(e, "val").filter(|v| v != "0");
                }
            }
            b"bidi" if self.in_ppr => {
                if let Some(para) = self.para.as_mut() {
                    para.bidi = flag_on(e);
                }
            }
            b"pageBreakBefore" if self.in_ppr && flag_on(e) => self.page_break(),
            b"r" if !empty => {
                self.in_run = true;
                self.style = RunStyle::default();
            }
            b"b" if self.in_run => self.style.bold = flag_on(e),
            b"i" if self.in_run => self.style.italic = flag_on(e),
            b"u" if self.in_run => self.style.underline = flag_on(e),
            b"strike" | b"dstrike" if self.in_run => self.style.strike = flag_on(e),
            b"t" if !empty => self.in_text = true,
            b"tab" if self.in_run => self.push_text("\t"),
            b"br" if self.in_run => {
                if get_attribute(e, "type").as_deref() == Some("page") && self.tables.is_empty() {
                    if let Some(para) = self.para.as_mut() {
                        para.break_after = true;
                    }
                } else {
                    self.push_text(" ");
                }
            }
            b"hyperlink" if !empty => {
                let url = get_attribute(e, "id")
                    .and_then(|id| self.rels.get(&id))
                    .map(|rel| rel.target.clone())
                    .or_else(|| get_attribute(e, "anchor").map(|a| format!("#{}", a)));
                if let (Some(url), Some(para)) = (url, self.para.as_ref()) {
                    self.link = Some((para.len, url));
                }
            }
            b"docPr" => {
                self.alt_text = get_attribute(e, "descr")
                    .filter(|d| !d.is_empty())
                    .or_else(|| get_attribute(e, "title").filter(|t| !t.is_empty()));
            }
            b"blip" => {
                if let Some(id) = get_attribute(e, "embed") {
                    self.embed_image(&id);
                }
            }
            b"tbl" if !empty => {
                self.flush_list();
                self.tables.push(TableState::default());
            }
            b"tr" if !empty => {
                if let Some(table) = self.tables.last_mut() {
                    table.row = Vec::new();
                    table.row_is_header = false;
                }
            }
            b"tblHeader" if flag_on(e) => {
                if let Some(table) = self.tables.last_mut() {
                    table.row_is_header = true;
                }
            }
            b"tc" if !empty => {
                if let Some(table) = self.tables.last_mut() {
                    table.cell = Some(String::new());
                    table.span = 1;
                }
            }
            b"gridSpan" => {
                if let Some(table) = self.tables.last_mut() {
                    table.span = get_attribute(e, "val")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1)
                        .max(1);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"p" => self.finish_paragraph(),
            b"pPr" => self.in_ppr = false,
            b"r" => {
                self.in_run = false;
                self.in_text = false;
            }
            b"t" => self.in_text = false,
            b"hyperlink" => {
                if let (Some((start, url)), Some(para)) = (self.link.take(), self.para.as_mut()) {
                    if para.len > start {
                        para.links.push(InlineLink::new(start, para.len, url));
                    }
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    let cell = table.cell.take().unwrap_or_default();
                    table.row.push(cell);
                    for _ in 1..table.span {
                        table.row.push(String::new());
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    let row = std::mem::take(&mut table.row);
                    if table.row_is_header && table.rows.len() == table.header_rows {
                        table.header_rows += 1;
                    }
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    self.finish_table(table);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(para) = self.para.as_mut() else {
            return;
        };
        let start = para.len;
        let added = text.chars().count();
        para.text.push_str(text);
        para.len += added;

        let style = self.style;
        if added == 0 || style == RunStyle::default() {
            return;
        }
        if let Some(last) = para.spans.last_mut() {
            let same = last.bold == style.bold
                && last.italic == style.italic
                && last.underline == style.underline
                && last.strike == style.strike;
            if same && last.end == start {
                last.end = para.len;
                return;
            }
        }
        para.spans.push(StyleSpan {
            start,
            end: para.len,
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            strike: style.strike,
        });
    }

    fn embed_image(&mut self, rel_id: &str) {
        let Some(data) = self.media.get(rel_id) else {
            let page = self.pages.len() as u32;
            self.warnings.push(ExtractionWarning::page(
                page,
                format!("image relationship {} has no readable part", rel_id),
            ));
            return;
        };
        self.image_count += 1;
        let mime = self
            .rels
            .get(rel_id)
            .and_then(|rel| rel.target.rsplit('.').next())
            .and_then(crate::model::mime_from_extension);
        let mut image = image_block(format!("image{}", self.image_count), data.clone(), mime, self.options);
        if let Some(alt) = self.alt_text.take() {
            image = image.with_alt_text(alt.clone()).with_caption(alt);
        }
        match self.para.as_mut() {
            Some(para) => para.images.push(image),
            None => self.push_block(image.into()),
        }
    }

    fn finish_paragraph(&mut self) {
        let Some(para) = self.para.take() else {
            return;
        };
        let ParagraphState {
            text,
            spans,
            links,
            heading,
            num_id,
            bidi,
            images,
            break_after,
            ..
        } = para;

        if let Some(table) = self.tables.last_mut() {
            let cleaned = self.options.clean(&text);
            if let Some(cell) = table.cell.as_mut() {
                if !cleaned.is_empty() {
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(&cleaned);
                }
            }
            self.deferred.extend(images.into_iter().map(Block::from));
            return;
        }

        let hint = if bidi { Direction::Rtl } else { Direction::Auto };
        let direction = |text: &str| detect_direction_hinted(text, hint);

        match (heading, num_id) {
            (_, Some(num_id)) if !text.trim().is_empty() => {
                let item = self.options.clean(&text);
                let ordered = self.numbering.get(&num_id).copied().unwrap_or(false);
                match self.list.as_mut() {
                    Some(list) if list.num_id == num_id => list.items.push(item),
                    _ => {
                        self.flush_list();
                        self.list = Some(PendingList {
                            num_id,
                            ordered,
                            items: vec![item],
                        });
                    }
                }
            }
            (Some(level), _) => {
                let text = self.options.clean(&text);
                if !text.is_empty() {
                    self.flush_list();
                    let dir = direction(&text);
                    self.push_block(Heading::new(level, text).with_direction(dir).into());
                }
            }
            _ => {
                let paragraph = self.options.paragraph(&text, spans, links);
                if !paragraph.is_empty() {
                    self.flush_list();
                    let dir = direction(&paragraph.text);
                    self.push_block(paragraph.with_direction(dir).into());
                }
            }
        }

        if !images.is_empty() {
            self.flush_list();
            for image in images {
                self.push_block(image.into());
            }
        }
        if break_after {
            self.page_break();
        }
    }

    fn flush_list(&mut self) {
        if let Some(list) = self.list.take() {
            let direction = detect_direction(&list.items.join(" "));
            self.push_block(List::new(list.items, list.ordered).with_direction(direction).into());
        }
    }

    fn finish_table(&mut self, mut table: TableState) {
        if !table.row.is_empty() {
            table.rows.push(std::mem::take(&mut table.row));
        }
        if table.rows.is_empty() {
            return;
        }
        let built = Table::new(table.rows).with_header_rows(table.header_rows);

        if let Some(parent) = self.tables.last_mut() {
            if let Some(cell) = parent.cell.as_mut() {
                let text = built.plain_text().replace(['\t', '\n'], " ");
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(text.trim());
            }
            return;
        }

        let direction = detect_direction(&built.plain_text());
        self.push_block(built.with_direction(direction).into());
        let deferred = std::mem::take(&mut self.deferred);
        for block in deferred {
            self.push_block(block);
        }
    }

    fn push_block(&mut self, block: Block) {
        if let Some(page) = self.pages.last_mut() {
            page.push(block);
        }
    }

    fn page_break(&mut self) {
        self.flush_list();
        if self.pages.last().is_some_and(|p| !p.is_empty()) {
            self.pages.push(Vec::new());
        }
    }
}

/// Heading level from a paragraph style id such as `Heading2` or `Title`.
fn heading_level(style: &str) -> Option<u8> {
    let lower = style.to_lowercase().replace(' ', "");
    if lower == "title" {
        return Some(1);
    }
    if lower == "subtitle" {
        return Some(2);
    }
    let digits = lower.strip_prefix("heading")?;
    digits.parse::<u8>().ok().filter(|l| (1..=6).contains(l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(document: &str, extra: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        for (name, data) in extra {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn body(inner: &str) -> String {
        format!(
            r#"<w:document xmlns:w="w" xmlns:r="r" xmlns:a="a" xmlns:wp="wp"><w:body>{}</w:body></w:document>"#,
            inner
        )
    }

    fn extract(bytes: &[u8]) -> Document {
        DocxExtractor::new().extract(bytes, &ExtractOptions::default()).unwrap()
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level("Heading1"), Some(1));
        assert_eq!(heading_level("heading 3"), Some(3));
        assert_eq!(heading_level("Title"), Some(1));
        assert_eq!(heading_level("Heading9"), None);
        assert_eq!(heading_level("Normal"), None);
    }

    #[test]
    fn test_headings_and_spans() {
        let xml = body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Report</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Plain </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:rPr><w:i w:val="0"/></w:rPr><w:t xml:space="preserve"> end</w:t></w:r></w:p>"#,
        );
        let doc = extract(&package(&xml, &[]));
        assert_eq!(doc.title(), Some("Report"));
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[0], Block::Heading(h) if h.level == 1));
        match &blocks[1] {
            Block::Paragraph(p) => {
                assert_eq!(p.text, "Plain bold end");
                assert_eq!(p.spans.len(), 1);
                assert!(p.spans[0].bold);
                assert_eq!((p.spans[0].start, p.spans[0].end), (6, 10));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_page_break_starts_new_page() {
        let xml = body(
            r#"<w:p><w:r><w:t>First</w:t><w:br w:type="page"/></w:r></w:p>
<w:p><w:r><w:t>Second</w:t></w:r></w:p>"#,
        );
        let doc = extract(&package(&xml, &[]));
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].plain_text(), "Second");
    }

    #[test]
    fn test_hyperlink_and_bidi() {
        let rels = br#"<Relationships><Relationship Id="rId5" Type="http://x/hyperlink" Target="https://example.com" TargetMode="External"/></Relationships>"#;
        let xml = body(
            r#"<w:p><w:pPr><w:bidi/></w:pPr><w:r><w:t xml:space="preserve">Visit </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:t>site</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let doc = extract(&package(&xml, &[("word/_rels/document.xml.rels", rels)]));
        match &doc.pages()[0].blocks[0] {
            Block::Paragraph(p) => {
                assert_eq!(p.direction, Direction::Ltr);
                assert_eq!(p.links, vec![InlineLink::new(6, 10, "https://example.com")]);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_bidi_hint_only_settles_neutral_text() {
        let xml = body(concat!(
            r#"<w:p><w:pPr><w:bidi/></w:pPr><w:r><w:t>Hello world</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:bidi/></w:pPr><w:r><w:t>2024-01-15</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>مرحبا بكم</w:t></w:r></w:p>"#,
        ));
        let doc = extract(&package(&xml, &[]));
        let directions: Vec<Direction> = doc.pages()[0].blocks.iter().map(|b| b.direction()).collect();
        assert_eq!(directions, vec![Direction::Ltr, Direction::Rtl, Direction::Rtl]);
    }

    #[test]
    fn test_table_with_merged_cell() {
        let xml = body(
            r#"<w:tbl><w:tr><w:trPr><w:tblHeader/></w:trPr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let doc = extract(&package(&xml, &[]));
        match &doc.pages()[0].blocks[0] {
            Block::Table(t) => {
                assert_eq!(t.header_rows, 1);
                assert_eq!(t.rows, vec![vec!["A", "B"], vec!["wide", ""]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_numbered_list() {
        let numbering = br#"<w:numbering xmlns:w="w"><w:abstractNum w:abstractNumId="3"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum><w:num w:numId="7"><w:abstractNumId w:val="3"/></w:num></w:numbering>"#;
        let xml = body(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="7"/></w:numPr></w:pPr><w:r><w:t>one</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="7"/></w:numPr></w:pPr><w:r><w:t>two</w:t></w:r></w:p>
<w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        let doc = extract(&package(&xml, &[("word/numbering.xml", numbering)]));
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[0], Block::List(l) if l.ordered && l.items == ["one", "two"]));
        assert!(matches!(&blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn test_embedded_image() {
        let png: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let rels = br#"<Relationships><Relationship Id="rId9" Type="http://x/image" Target="media/image1.png"/></Relationships>"#;
        let xml = body(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="Chart"/><a:graphic><a:graphicData><a:blip r:embed="rId9"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        );
        let doc = extract(&package(
            &xml,
            &[("word/_rels/document.xml.rels", rels), ("word/media/image1.png", png)],
        ));
        let images = doc.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].data(), Some(png));
        assert_eq!(images[0].caption.as_deref(), Some("Chart"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxExtractor::new()
            .extract(b"plain text", &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CorruptInput { ref format, .. } if format == "docx"));
    }
}
