//! Plain text extractor.

use super::clean::{count_words, extract_urls, split_paragraphs, unwrap_lines};
use super::{start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::detect_direction;
use crate::error::Result;
use crate::model::{Document, ExtractionWarning, Heading, InlineLink, List, Paragraph};
use std::borrow::Cow;

static_regex!(bullet_regex, r"^\s*[-*•]\s+");
static_regex!(number_regex, r"^\s*\d+[.)]\s+");
static_regex!(letter_regex, r"^\s*[a-zA-Z][.)]\s+");
static_regex!(marker_regex, r"^\s*(?:[-*•]|\d+[.)]|[a-zA-Z][.)])\s+");

/// Extractor for UTF-8 plain text.
///
/// The whole file becomes one page. Blank lines separate blocks; a short
/// first block becomes the title heading, short all-caps blocks become
/// section headings, and blocks made mostly of bullet or numbered lines
/// become lists.
#[derive(Debug, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for TextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn format_tags(&self) -> &[&str] {
        &["txt", "text"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let content = String::from_utf8_lossy(bytes);
        let mut builder = start_document("txt", options);
        if let Cow::Owned(_) = content {
            builder.warn(ExtractionWarning::document(
                "input is not valid UTF-8; undecodable bytes were lost",
            ));
        }

        let first_line = content.lines().map(str::trim).find(|l| !l.is_empty());
        match first_line {
            Some(line) if line.chars().count() <= 100 => builder.set_title(options.clean(line)),
            _ => {
                if let Some(title) = title_from_source(options) {
                    builder.set_title(title);
                }
            }
        }
        builder.metadata_mut().word_count = Some(count_words(&content));

        let page = builder.new_page();
        page.direction = detect_direction(&content);

        for (index, raw) in split_paragraphs(&content).iter().enumerate() {
            let text = options.clean(raw);
            if text.is_empty() {
                continue;
            }
            let direction = detect_direction(&text);

            if let Some(level) = heading_level(&text, index == 0) {
                page.push(Heading::new(level, text).with_direction(direction));
            } else if is_list(&text) {
                let ordered = is_ordered(&text);
                page.push(List::new(list_items(&text), ordered).with_direction(direction));
            } else {
                page.push(paragraph_with_links(unwrap_lines(&text)).with_direction(direction));
            }
        }

        Ok(builder.build()?)
    }
}

/// Heading level for a block that reads like a heading.
fn heading_level(text: &str, is_first: bool) -> Option<u8> {
    let len = text.chars().count();
    if len > 100 || text.contains('\n') {
        return None;
    }
    if is_first && len < 80 {
        return Some(1);
    }
    let has_letters = text.chars().any(char::is_alphabetic);
    if has_letters && len < 60 && text.chars().all(|c| !c.is_lowercase()) && text == text.to_uppercase() {
        return Some(2);
    }
    None
}

fn is_list_line(line: &str) -> bool {
    [bullet_regex(), number_regex(), letter_regex()]
        .into_iter()
        .flatten()
        .any(|re| re.is_match(line))
}

/// At least half the lines of a multi-line block carry a list marker.
fn is_list(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return false;
    }
    let matches = lines.iter().filter(|line| is_list_line(line)).count();
    matches * 2 >= lines.len()
}

fn is_ordered(text: &str) -> bool {
    text.lines().any(|line| {
        [number_regex(), letter_regex()]
            .into_iter()
            .flatten()
            .any(|re| re.is_match(line))
    })
}

fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| match marker_regex() {
            Some(re) => re.replace(line, "").trim().to_string(),
            None => line.trim().to_string(),
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// A paragraph with each URL in the text turned into an inline link.
pub(crate) fn paragraph_with_links(text: String) -> Paragraph {
    let links = extract_urls(&text);
    let mut paragraph = Paragraph::new(text);
    for found in links {
        paragraph = paragraph.with_link(InlineLink::new(found.start, found.end, found.url));
    }
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Direction};

    fn extract(text: &str) -> Document {
        TextExtractor::new()
            .extract(text.as_bytes(), &ExtractOptions::default())
            .unwrap()
    }

    #[test]
    fn test_first_line_heading() {
        let doc = extract("Quarterly Report\n\nRevenue grew in every region.");
        assert_eq!(doc.title(), Some("Quarterly Report"));
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[0], Block::Heading(h) if h.level == 1));
        assert!(matches!(&blocks[1], Block::Paragraph(p) if p.text == "Revenue grew in every region."));
    }

    #[test]
    fn test_all_caps_heading() {
        let doc = extract("Intro line that is a title\n\nSUMMARY\n\nBody.");
        let blocks = &doc.pages()[0].blocks;
        assert!(matches!(&blocks[1], Block::Heading(h) if h.level == 2 && h.text == "SUMMARY"));
    }

    #[test]
    fn test_list_detection() {
        let doc = extract("Shopping\n\n- milk\n- bread\n- eggs\n\n1. first\n2) second");
        let blocks = &doc.pages()[0].blocks;
        match &blocks[1] {
            Block::List(list) => {
                assert!(!list.ordered);
                assert_eq!(list.items, vec!["milk", "bread", "eggs"]);
            }
            other => panic!("expected list, got {:?}", other),
        }
        assert!(matches!(&blocks[2], Block::List(list) if list.ordered && list.items == ["first", "second"]));
    }

    #[test]
    fn test_urls_become_links() {
        let doc = extract("Title\n\nRead https://example.com/docs for more.");
        match &doc.pages()[0].blocks[1] {
            Block::Paragraph(p) => {
                assert_eq!(p.links.len(), 1);
                assert_eq!(p.links[0].url, "https://example.com/docs");
                assert_eq!(p.links[0].start, 5);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_flagged() {
        let doc = TextExtractor::new()
            .extract(b"Title\n\nabc\xff\xfedef", &ExtractOptions::default())
            .unwrap();
        assert_eq!(doc.metadata().warnings.len(), 1);
        assert!(doc.metadata().warnings[0].message.contains("UTF-8"));
        assert!(matches!(&doc.pages()[0].blocks[1], Block::Paragraph(p) if p.text == "abcdef"));

        let clean = extract("Title\n\nabc def");
        assert!(clean.metadata().warnings.is_empty());
    }

    #[test]
    fn test_direction_per_block() {
        let doc = extract("مرحبا بالعالم\n\nHello world, this is English.");
        let blocks = &doc.pages()[0].blocks;
        assert_eq!(blocks[0].direction(), Direction::Rtl);
        assert_eq!(blocks[1].direction(), Direction::Ltr);
    }

    #[test]
    fn test_hard_wrapped_paragraph_unwrapped() {
        let doc = extract("Title\n\nThis line is\nwrapped by the infor-\nmation source.");
        assert!(matches!(
            &doc.pages()[0].blocks[1],
            Block::Paragraph(p) if p.text == "This line is wrapped by the information source."
        ));
    }

    #[test]
    fn test_empty_input_has_one_page() {
        let doc = extract("");
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages()[0].is_empty());
    }

    #[test]
    fn test_word_count() {
        let doc = extract("one two three\n\nfour");
        assert_eq!(doc.metadata().word_count, Some(4));
    }
}
