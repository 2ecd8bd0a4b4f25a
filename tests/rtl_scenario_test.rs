//! Arabic and mixed-direction documents through every converter.

use proptest::prelude::*;
use unidoc::bidi::{detect_direction, reshape, ShapingMode};
use unidoc::model::{Heading, List, Paragraph, StyleSpan, Table};
use unidoc::{ConvertOptions, Direction, Document, DocumentBuilder, Unidoc};

const MARHABA: &str = "مرحبا";
const MARHABA_SHAPED: &str = "\u{FEE3}\u{FEAE}\u{FEA3}\u{FE92}\u{FE8E}";
const MARHABA_VISUAL: &str = "\u{FE8E}\u{FE92}\u{FEA3}\u{FEAE}\u{FEE3}";

fn greeting() -> Document {
    let mut builder = DocumentBuilder::new("docx");
    let page = builder.new_page();
    page.push(Heading::new(1, MARHABA).with_direction(detect_direction(MARHABA)));
    page.push(Paragraph::new("Hello").with_direction(detect_direction("Hello")));
    builder.build().unwrap()
}

#[test]
fn test_arabic_heading_in_html() {
    let result = unidoc::convert(&greeting(), "html", &ConvertOptions::default()).unwrap();
    let html = result.text().unwrap();

    assert!(html.contains(&format!("<h1 dir=\"rtl\" class=\"rtl\">{}</h1>", MARHABA_SHAPED)));
    assert!(html.contains("<p dir=\"ltr\" class=\"ltr\">Hello</p>"));
    assert!(!html.contains(MARHABA));
    assert_eq!(result.stats.shaped_values, 2);
}

#[test]
fn test_each_value_shaped_once_per_target() {
    let doc = greeting();
    for tag in ["html", "md", "txt", "docx"] {
        let result = unidoc::convert(&doc, tag, &ConvertOptions::default()).unwrap();
        assert_eq!(result.stats.shaped_values, 2, "{}", tag);
    }
    let json = unidoc::convert(&doc, "json", &ConvertOptions::default()).unwrap();
    assert_eq!(json.stats.shaped_values, 0);
}

#[test]
fn test_shaping_not_compounded() {
    // Shaping the shaped form again would leave it unchanged, so the
    // output alone cannot prove single application; the call count can.
    assert_eq!(reshape(MARHABA_SHAPED), MARHABA_SHAPED);

    let md = unidoc::convert(&greeting(), "md", &ConvertOptions::default()).unwrap();
    let md = md.text().unwrap();
    assert_eq!(md.matches(MARHABA_SHAPED).count(), 1);
    assert!(md.contains("<div dir=\"rtl\">"));
}

#[test]
fn test_text_target_uses_visual_order() {
    let result = unidoc::convert(&greeting(), "txt", &ConvertOptions::default()).unwrap();
    let text = result.text().unwrap();
    assert!(text.contains(MARHABA_VISUAL));
    assert!(text.contains("Hello"));
}

#[test]
fn test_json_keeps_logical_text() {
    let options = ConvertOptions::default().with_shaping(ShapingMode::Visual);
    let result = unidoc::convert(&greeting(), "json", &options).unwrap();
    let json = result.text().unwrap();
    assert!(json.contains(MARHABA));
    assert!(!json.contains(MARHABA_SHAPED));
    assert_eq!(result.stats.shaped_values, 0);
}

#[test]
fn test_shaping_override() {
    let options = ConvertOptions::default().with_shaping(ShapingMode::None);
    let result = unidoc::convert(&greeting(), "html", &options).unwrap();
    let html = result.text().unwrap();
    assert!(html.contains(&format!("<h1 dir=\"rtl\" class=\"rtl\">{}</h1>", MARHABA)));
    assert_eq!(result.stats.shaped_values, 2);
}

#[test]
fn test_markdown_source_counts_title() {
    let loaded = Unidoc::new()
        .load(format!("# {}\n\nHello\n", MARHABA).as_bytes(), "md")
        .unwrap();
    assert_eq!(loaded.document().title(), Some(MARHABA));

    // Title, heading and paragraph; plain text has no title line.
    assert_eq!(loaded.export("html").unwrap().stats.shaped_values, 3);
    assert_eq!(loaded.export("md").unwrap().stats.shaped_values, 3);
    assert_eq!(loaded.export("txt").unwrap().stats.shaped_values, 2);
    assert_eq!(loaded.export("json").unwrap().stats.shaped_values, 0);
}

#[test]
fn test_shaped_values_cover_cells_and_items() {
    let mut builder = DocumentBuilder::new("json");
    let page = builder.new_page();
    page.push(Table::new(vec![
        vec!["الاسم".to_string(), "العدد".to_string()],
        vec!["علي".to_string(), "3".to_string()],
    ]).with_header_rows(1));
    page.push(List::new(vec!["واحد".to_string(), "اثنان".to_string()], false));
    let doc = builder.build().unwrap();

    for tag in ["html", "md", "docx"] {
        let result = unidoc::convert(&doc, tag, &ConvertOptions::default()).unwrap();
        assert_eq!(result.stats.shaped_values, 6, "{}", tag);
    }
}

#[test]
fn test_docx_reloads_as_logical_text() {
    let result = unidoc::convert(&greeting(), "docx", &ConvertOptions::default()).unwrap();
    let doc = Unidoc::new().load(result.bytes(), "docx").unwrap();
    let heading = match &doc.document().pages()[0].blocks[0] {
        unidoc::Block::Heading(h) => h.clone(),
        other => panic!("unexpected block {:?}", other),
    };
    assert_eq!(heading.direction, Direction::Rtl);
    // Presentation forms fold back to base letters on extraction.
    assert_eq!(heading.text, MARHABA);
}

#[test]
fn test_docx_direction_follows_text_not_markup() {
    let mut builder = DocumentBuilder::new("md");
    builder
        .new_page()
        .push(Paragraph::new("Hello world").with_direction(Direction::Rtl));
    let doc = builder.build().unwrap();

    let docx = unidoc::convert(&doc, "docx", &ConvertOptions::default()).unwrap();
    let reloaded = Unidoc::new().load(docx.bytes(), "docx").unwrap();
    assert_eq!(reloaded.document().pages()[0].blocks[0].direction(), Direction::Ltr);
}

#[test]
fn test_span_inside_word_keeps_joining() {
    // beh + kaf + meem with the first two letters bold
    let mut builder = DocumentBuilder::new("md");
    builder
        .new_page()
        .push(Paragraph::new("بكم").with_span(StyleSpan::new(0, 2).bold()));
    let doc = builder.build().unwrap();

    let html = unidoc::convert(&doc, "html", &ConvertOptions::default()).unwrap();
    assert!(html
        .text()
        .unwrap()
        .contains("<strong>\u{FE91}\u{FEDC}</strong>\u{FEE2}</p>"));
    assert_eq!(html.stats.shaped_values, 1);

    let md = unidoc::convert(&doc, "md", &ConvertOptions::default()).unwrap();
    assert!(md.text().unwrap().contains("**\u{FE91}\u{FEDC}**\u{FEE2}"));
    assert_eq!(md.stats.shaped_values, 1);

    let docx = unidoc::convert(&doc, "docx", &ConvertOptions::default()).unwrap();
    assert_eq!(docx.stats.shaped_values, 1);
    let reloaded = Unidoc::new().load(docx.bytes(), "docx").unwrap();
    assert_eq!(reloaded.text().trim(), "بكم");
}

#[test]
fn test_direction_detection() {
    assert_eq!(detect_direction(MARHABA), Direction::Rtl);
    assert_eq!(detect_direction("שלום"), Direction::Rtl);
    assert_eq!(detect_direction("Hello"), Direction::Ltr);
    assert_eq!(detect_direction("2024-01-15"), Direction::Auto);
    assert_eq!(detect_direction(""), Direction::Auto);
    assert_eq!(detect_direction("Hello مرحبا بكم جميعا"), Direction::Rtl);
}

proptest! {
    #[test]
    fn prop_arabic_only_is_rtl(text in "[\u{0621}-\u{064A}]{1,20}( [\u{0621}-\u{064A}]{1,8}){0,4}") {
        prop_assert_eq!(detect_direction(&text), Direction::Rtl);
    }

    #[test]
    fn prop_latin_only_is_ltr(text in "[a-zA-Z]{1,20}( [a-zA-Z0-9]{1,8}){0,4}") {
        prop_assert_eq!(detect_direction(&text), Direction::Ltr);
    }

    #[test]
    fn prop_neutral_only_is_auto(text in "[0-9 .,:;!?()-]{0,30}") {
        prop_assert_eq!(detect_direction(&text), Direction::Auto);
    }

    #[test]
    fn prop_reshape_is_idempotent(text in "[\u{0621}-\u{064A} ]{0,20}") {
        let once = reshape(&text);
        prop_assert_eq!(reshape(&once), once.clone());
        prop_assert_eq!(once.chars().filter(|c| *c == ' ').count(), text.chars().filter(|c| *c == ' ').count());
    }
}
