//! Markdown extractor.

use super::clean::count_words;
use super::{image_block, start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::detect_direction;
use crate::error::Result;
use crate::model::{
    Block, Document, Heading, Image, InlineLink, Link, List, Paragraph, StyleSpan, Table,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

static_regex!(front_matter_regex, r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)");
static_regex!(heading_regex, r"^(#{1,6})\s+(.+?)\s*#*\s*$");
static_regex!(image_regex, r#"^!\[([^\]]*)\]\(\s*([^)\s]+)(?:\s+"([^"]*)")?\s*\)$"#);
static_regex!(link_line_regex, r"^\[([^\]]+)\]\(([^)\s]+)\)$");
static_regex!(bullet_regex, r"^\s*[-*+]\s+");
static_regex!(ordered_regex, r"^\s*\d+[.)]\s+");
static_regex!(separator_regex, r"^\s*\|?[\s:|-]+\|?\s*$");
static_regex!(rule_regex, r"^\s*(?:-{3,}|\*{3,}|_{3,})\s*$");
static_regex!(div_regex, r#"^\s*</?div(?:\s+dir="[a-z]+")?\s*>\s*$"#);

/// Extractor for Markdown.
///
/// Produces one page. YAML-style front matter fills metadata; the first
/// level-1 heading is the title when front matter has none.
#[derive(Debug, Default)]
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for MarkdownExtractor {
    fn name(&self) -> &str {
        "markdown"
    }

    fn format_tags(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let content = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
        let mut builder = start_document("md", options);

        let (front_matter, body) = split_front_matter(&content);
        apply_front_matter(&front_matter, &mut builder);
        builder.metadata_mut().word_count = Some(count_words(body));

        let blocks = parse_blocks(body, options);

        if builder.current_title().is_none() {
            let heading = blocks.iter().find_map(|block| match block {
                Block::Heading(h) if h.level == 1 => Some(h.text.clone()),
                _ => None,
            });
            if let Some(title) = heading.or_else(|| title_from_source(options)) {
                builder.set_title(title);
            }
        }

        let page = builder.new_page();
        page.direction = detect_direction(body);
        page.blocks = blocks;

        Ok(builder.build()?)
    }
}

/// Front matter key/value pairs, lowercased keys, in order.
fn split_front_matter(content: &str) -> (Vec<(String, String)>, &str) {
    let Some(caps) = front_matter_regex().and_then(|re| re.captures(content)) else {
        return (Vec::new(), content);
    };
    let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
        return (Vec::new(), content);
    };
    let pairs = inner
        .as_str()
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Some((key.trim().to_lowercase(), value.to_string()))
        })
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect();
    (pairs, &content[whole.end()..])
}

fn apply_front_matter(pairs: &[(String, String)], builder: &mut crate::model::DocumentBuilder) {
    for (key, value) in pairs {
        match key.as_str() {
            "title" => builder.set_title(value.clone()),
            "author" => builder.metadata_mut().author = Some(value.clone()),
            "description" | "subject" => builder.metadata_mut().subject = Some(value.clone()),
            "language" | "lang" => builder.metadata_mut().language = Some(value.clone()),
            "keywords" | "tags" => {
                builder.metadata_mut().keywords = value
                    .trim_matches(|c| c == '[' || c == ']')
                    .split(',')
                    .map(|k| k.trim().trim_matches('"').to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
            }
            "source_format" | "direction" | "pages" => {}
            other => {
                builder
                    .metadata_mut()
                    .extra
                    .insert(other.to_string(), serde_json::Value::String(value.clone()));
            }
        }
    }
}

fn matches(re: Option<&'static regex::Regex>, line: &str) -> bool {
    re.is_some_and(|re| re.is_match(line))
}

fn is_list_line(line: &str) -> bool {
    matches(bullet_regex(), line) || matches(ordered_regex(), line)
}

fn starts_block(line: &str) -> bool {
    line.starts_with('#')
        || line.starts_with('|')
        || line.starts_with("```")
        || line.trim_start().starts_with("![")
        || is_list_line(line)
        || matches(rule_regex(), line)
        || matches(div_regex(), line)
}

fn parse_blocks(body: &str, options: &ExtractOptions) -> Vec<Block> {
    let lines: Vec<&str> = body.lines().collect();
    let mut blocks = Vec::new();
    let mut image_count = 0usize;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if trimmed.is_empty() || matches(rule_regex(), line) || matches(div_regex(), line) {
            i += 1;
            continue;
        }

        if let Some(caps) = heading_regex().and_then(|re| re.captures(line)) {
            let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
            let (text, _, _) = parse_inline(caps.get(2).map_or("", |m| m.as_str()));
            let text = options.clean(&text);
            if !text.is_empty() {
                let direction = detect_direction(&text);
                blocks.push(Heading::new(level, text).with_direction(direction).into());
            }
            i += 1;
            continue;
        }

        if trimmed.starts_with("```") {
            let mut code = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            i += 1;
            let text = code.join("\n");
            if !text.trim().is_empty() {
                let direction = detect_direction(&text);
                blocks.push(Paragraph::new(text).with_direction(direction).into());
            }
            continue;
        }

        if let Some(caps) = image_regex().and_then(|re| re.captures(trimmed)) {
            image_count += 1;
            let alt = caps.get(1).map_or("", |m| m.as_str());
            let src = caps.get(2).map_or("", |m| m.as_str());
            let title = caps.get(3).map(|m| m.as_str());
            blocks.push(image_from_markdown(image_count, alt, src, title, options).into());
            i += 1;
            continue;
        }

        if let Some(caps) = link_line_regex().and_then(|re| re.captures(trimmed)) {
            let text = options.clean(caps.get(1).map_or("", |m| m.as_str()));
            let url = caps.get(2).map_or("", |m| m.as_str());
            let direction = detect_direction(&text);
            blocks.push(Link::new(text, url).with_direction(direction).into());
            i += 1;
            continue;
        }

        if is_list_line(line) {
            let ordered = matches(ordered_regex(), line);
            let mut items = Vec::new();
            while i < lines.len() && is_list_line(lines[i]) {
                let item = [bullet_regex(), ordered_regex()]
                    .into_iter()
                    .flatten()
                    .find(|re| re.is_match(lines[i]))
                    .map(|re| re.replace(lines[i], "").to_string())
                    .unwrap_or_default();
                let (item, _, _) = parse_inline(&item);
                let item = options.clean(&item);
                if !item.is_empty() {
                    items.push(item);
                }
                i += 1;
            }
            if !items.is_empty() {
                let direction = detect_direction(&items.join(" "));
                blocks.push(List::new(items, ordered).with_direction(direction).into());
            }
            continue;
        }

        if trimmed.starts_with('|') {
            let mut table_lines = Vec::new();
            while i < lines.len() && lines[i].trim_start().starts_with('|') {
                table_lines.push(lines[i]);
                i += 1;
            }
            if let Some(table) = parse_table(&table_lines, options) {
                blocks.push(table.into());
            }
            continue;
        }

        let mut para_lines = vec![trimmed.trim_start_matches('>').trim()];
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() && !starts_block(lines[i]) {
            para_lines.push(lines[i].trim().trim_start_matches('>').trim());
            i += 1;
        }
        let (text, spans, links) = parse_inline(&para_lines.join(" "));
        let paragraph = options.paragraph(&text, spans, links);
        if paragraph.is_empty() {
            continue;
        }
        let direction = detect_direction(&paragraph.text);
        blocks.push(paragraph.with_direction(direction).into());
    }

    blocks
}

fn image_from_markdown(
    index: usize,
    alt: &str,
    src: &str,
    title: Option<&str>,
    options: &ExtractOptions,
) -> Image {
    let id = format!("image{}", index);
    let mut image = match decode_data_uri(src) {
        Some((mime, data)) => image_block(id, data, Some(&mime), options),
        None => Image::reference(id, src),
    };
    if !alt.is_empty() {
        image = image.with_alt_text(alt);
    }
    match title.filter(|t| !t.is_empty()) {
        Some(caption) => image.with_caption(caption),
        None if !alt.is_empty() => image.with_caption(alt),
        None => image,
    }
}

/// Decode a `data:<mime>;base64,<payload>` URI.
pub(crate) fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let data = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), data))
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

fn parse_table(lines: &[&str], options: &ExtractOptions) -> Option<Table> {
    let mut rows = Vec::new();
    let mut header_rows = 0;
    for (index, line) in lines.iter().enumerate() {
        if matches(separator_regex(), line) && line.contains('-') {
            if index == 1 {
                header_rows = 1;
            }
            continue;
        }
        let cells = split_cells(line)
            .iter()
            .map(|cell| options.clean(&parse_inline(cell).0))
            .collect();
        rows.push(cells);
    }
    if rows.is_empty() {
        return None;
    }
    let table = Table::new(rows).with_header_rows(header_rows);
    let direction = detect_direction(&table.plain_text());
    Some(table.with_direction(direction))
}

/// Strip inline markup, returning the plain text with emphasis spans and
/// links indexed by character offset.
pub(crate) fn parse_inline(src: &str) -> (String, Vec<StyleSpan>, Vec<InlineLink>) {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::new();
    let mut len = 0usize;
    let mut spans = Vec::new();
    let mut links = Vec::new();
    let (mut bold, mut italic, mut strike, mut underline) = (None, None, None, None);

    let at = |i: usize, pat: &str| pat.chars().enumerate().all(|(k, p)| chars.get(i + k) == Some(&p));

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() && chars[i + 1].is_ascii_punctuation() {
            out.push(chars[i + 1]);
            len += 1;
            i += 2;
            continue;
        }
        if at(i, "**") || at(i, "__") {
            toggle(&mut bold, len, &mut spans, StyleSpan::bold);
            i += 2;
            continue;
        }
        if at(i, "~~") {
            toggle(&mut strike, len, &mut spans, StyleSpan::strike);
            i += 2;
            continue;
        }
        if at(i, "<u>") || at(i, "</u>") {
            toggle(&mut underline, len, &mut spans, StyleSpan::underline);
            i += if chars[i + 1] == '/' { 4 } else { 3 };
            continue;
        }
        if c == '*' || c == '_' {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
            let next = chars.get(i + 1).copied();
            let opens = italic.is_none() && next.is_some_and(|n| !n.is_whitespace());
            let closes = italic.is_some() && prev.is_some_and(|p| !p.is_whitespace());
            let word_internal = c == '_'
                && prev.is_some_and(char::is_alphanumeric)
                && next.is_some_and(char::is_alphanumeric);
            if (opens || closes) && !word_internal {
                toggle(&mut italic, len, &mut spans, StyleSpan::italic);
                i += 1;
                continue;
            }
        }
        if c == '[' {
            if let Some((text, url, consumed)) = inline_link(&chars[i..]) {
                let start = len;
                len += text.chars().count();
                out.push_str(&text);
                links.push(InlineLink::new(start, len, url));
                i += consumed;
                continue;
            }
        }
        out.push(c);
        len += 1;
        i += 1;
    }

    spans.retain(|s: &StyleSpan| s.end > s.start);
    spans.sort_by_key(|s| (s.start, s.end));
    (out, spans, links)
}

fn toggle(open: &mut Option<usize>, at: usize, spans: &mut Vec<StyleSpan>, style: fn(StyleSpan) -> StyleSpan) {
    match open.take() {
        Some(start) => spans.push(style(StyleSpan::new(start, at))),
        None => *open = Some(at),
    }
}

/// `[text](url)` at the start of `chars`, with the number of chars consumed.
fn inline_link(chars: &[char]) -> Option<(String, String, usize)> {
    let close = chars.iter().position(|&c| c == ']')?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = close + 2 + chars[close + 2..].iter().position(|&c| c == ')')?;
    let text: String = chars[1..close].iter().collect();
    let url: String = chars[close + 2..end].iter().collect();
    if text.is_empty() || url.trim().is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    Some((text, url, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    fn extract(md: &str) -> Document {
        MarkdownExtractor::new()
            .extract(md.as_bytes(), &ExtractOptions::default())
            .unwrap()
    }

    #[test]
    fn test_front_matter() {
        let doc = extract("---\ntitle: Guide\nauthor: Sam\ndescription: How-to\ncategory: docs\n---\n# Heading\n\nBody");
        assert_eq!(doc.title(), Some("Guide"));
        assert_eq!(doc.metadata().author.as_deref(), Some("Sam"));
        assert_eq!(doc.metadata().subject.as_deref(), Some("How-to"));
        assert_eq!(doc.metadata().extra["category"], "docs");
        assert_eq!(doc.pages()[0].blocks.len(), 2);
    }

    #[test]
    fn test_title_from_first_heading() {
        let doc = extract("Intro\n\n# Main Title\n\n## Sub");
        assert_eq!(doc.title(), Some("Main Title"));
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[2], Block::Heading(h) if h.level == 2 && h.text == "Sub"));
    }

    #[test]
    fn test_lists_and_links() {
        let doc = extract("1. one\n2. two\n\n- a\n* b\n\n[Docs](https://docs.rs)");
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[0], Block::List(l) if l.ordered && l.items == ["one", "two"]));
        assert!(matches!(&blocks[1], Block::List(l) if !l.ordered && l.items.len() == 2));
        assert!(matches!(&blocks[2], Block::Link(l) if l.url == "https://docs.rs" && l.text == "Docs"));
    }

    #[test]
    fn test_pipe_table() {
        let doc = extract("| Name | Qty |\n|------|----:|\n| a | 1 |\n| b |\n");
        match &doc.pages()[0].blocks[0] {
            Block::Table(t) => {
                assert_eq!(t.header_rows, 1);
                assert_eq!(t.rows[0], vec!["Name", "Qty"]);
                assert_eq!(t.rows[2], vec!["b", ""]);
                assert!(t.is_rectangular());
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_images() {
        let doc = extract("![Logo](img/logo.png \"Company logo\")\n\n![](data:image/png;base64,iVBORw0KGgo=)");
        let blocks = &doc.pages()[0].blocks;
        match &blocks[0] {
            Block::Image(img) => {
                assert_eq!(img.caption.as_deref(), Some("Company logo"));
                assert_eq!(img.alt_text.as_deref(), Some("Logo"));
                assert!(img.data().is_none());
            }
            other => panic!("expected image, got {:?}", other),
        }
        match &blocks[1] {
            Block::Image(img) => assert_eq!(img.data(), Some(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A][..])),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_spans() {
        let (text, spans, links) = parse_inline("a **bold** and *it* [here](https://x.y) ~~no~~ snake_case");
        assert_eq!(text, "a bold and it here no snake_case");
        assert_eq!(spans.len(), 3);
        assert!(spans[0].bold && spans[0].start == 2 && spans[0].end == 6);
        assert!(spans[1].italic && spans[1].start == 11 && spans[1].end == 13);
        assert!(spans[2].strike);
        assert_eq!(links[0], InlineLink::new(14, 18, "https://x.y"));
    }

    #[test]
    fn test_literal_asterisk() {
        let (text, spans, _) = parse_inline("2 * 3 = 6");
        assert_eq!(text, "2 * 3 = 6");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_rtl_div_wrapper_skipped() {
        let doc = extract("<div dir=\"rtl\">\n\n# مرحبا\n\n</div>\n\nHello");
        let blocks = &doc.pages()[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].direction(), Direction::Rtl);
        assert_eq!(blocks[1].direction(), Direction::Ltr);
    }

    #[test]
    fn test_paragraph_lines_joined() {
        let doc = extract("first line\nsecond line\n\nnext");
        assert!(matches!(&doc.pages()[0].blocks[0], Block::Paragraph(p) if p.text == "first line second line"));
    }
}
