//! Every supported input converts to every supported output.

use image::{GrayImage, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::io::{Cursor, Write};
use std::sync::Arc;
use unidoc::ocr::{PixelBox, Preprocessed, RawToken, RecognizedTokens};
use unidoc::{ConvertOptions, Error, Result, Unidoc};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MARKDOWN: &str = "# Quarterly Report\n\nSales grew in **every** region. See [details](https://example.com/q).\n\n## مرحبا\n\nنص عربي قصير.\n\n| Region | Total |\n|---|---|\n| North | 12 |\n| South | 7 |\n\n1. first\n2. second\n";

fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn pptx() -> Vec<u8> {
    let slide = |title: &str, body: &str| {
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a" xmlns:r="r"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Body"/><p:nvPr/></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            title, body
        )
    };
    let s1 = slide("Intro", "Welcome");
    let s2 = slide("شكرا", "Thanks &amp; goodbye");
    package(&[("ppt/slides/slide1.xml", s1.as_str()), ("ppt/slides/slide2.xml", s2.as_str())])
}

fn xlsx() -> Vec<u8> {
    const MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
    let root_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        REL
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="Totals" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        MAIN, REL
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        REL
    );
    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{}"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Region</t></is></c><c r="B1" t="inlineStr"><is><t>Total</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>North</t></is></c><c r="B2"><v>12</v></c></row></sheetData></worksheet>"#,
        MAIN
    );
    package(&[
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", root_rels.as_str()),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ])
}

fn pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids = Vec::new();
    for text in ["First page text", "Second page text"] {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn scan() -> Vec<u8> {
    let image = GrayImage::from_fn(120, 40, |x, _| if x % 9 == 0 { Luma([0]) } else { Luma([255]) });
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
    out
}

fn engine(_page: &Preprocessed, _languages: &[String]) -> Result<RecognizedTokens> {
    Ok(vec![
        RawToken::new("Scanned", PixelBox::new(5, 5, 40, 10), 0.95),
        RawToken::new("words", PixelBox::new(50, 5, 30, 10), 0.4),
    ])
}

fn inputs(unidoc: &Unidoc) -> Vec<(&'static str, Vec<u8>)> {
    let source = unidoc.load(MARKDOWN.as_bytes(), "md").unwrap();
    let docx = source.export("docx").unwrap().bytes().to_vec();
    let json = source.export("json").unwrap().bytes().to_vec();
    vec![
        ("md", MARKDOWN.as_bytes().to_vec()),
        ("txt", "Title line\n\nA paragraph of plain text.\n\nשלום עולם".as_bytes().to_vec()),
        ("docx", docx),
        ("json", json),
        ("pptx", pptx()),
        ("xlsx", xlsx()),
        ("pdf", pdf()),
        ("png", scan()),
    ]
}

#[test]
fn test_every_input_reaches_every_output() {
    let unidoc = Unidoc::new().with_ocr_engine(Arc::new(engine));
    let inputs = inputs(&unidoc);
    let outputs = unidoc.supported_output_formats();

    for (tag, bytes) in &inputs {
        assert!(unidoc.supported_input_formats().iter().any(|t| t == tag), "{}", tag);
        let loaded = unidoc
            .load(bytes, tag)
            .unwrap_or_else(|e| panic!("loading {} failed: {}", tag, e));
        assert!(loaded.document().page_count() >= 1, "{}", tag);

        for output in &outputs {
            let result = loaded
                .export(output)
                .unwrap_or_else(|e| panic!("{} -> {} failed: {}", tag, output, e));
            assert!(!result.content.is_empty(), "{} -> {} is empty", tag, output);
            assert_eq!(result.stats.page_count as usize, loaded.document().page_count() as usize, "{} -> {}", tag, output);
        }
    }
}

#[test]
fn test_strict_mode_fails_only_on_irreducible_blocks() {
    let unidoc = Unidoc::new().with_ocr_engine(Arc::new(engine));
    let strict = ConvertOptions::new().with_strict(true);

    for (tag, bytes) in inputs(&unidoc) {
        let loaded = unidoc.load(&bytes, tag).unwrap();
        for output in unidoc.supported_output_formats() {
            let lenient = loaded.export(&output).unwrap();
            match loaded.export_with(&output, &strict) {
                Ok(result) => assert!(result.degradations.is_empty(), "{} -> {}", tag, output),
                Err(Error::IrreducibleStructure { .. }) => {
                    assert!(lenient.is_lossy(), "{} -> {} rejected without degrading", tag, output)
                }
                Err(e) => panic!("{} -> {} failed: {}", tag, output, e),
            }
        }
    }
}

#[test]
fn test_outputs_reload_as_inputs() {
    let unidoc = Unidoc::new();
    let loaded = unidoc.load(MARKDOWN.as_bytes(), "md").unwrap();

    for tag in ["md", "txt", "json", "docx"] {
        let result = loaded.export(tag).unwrap();
        let reloaded = unidoc
            .load(result.bytes(), tag)
            .unwrap_or_else(|e| panic!("reloading {} failed: {}", tag, e));
        assert!(!reloaded.text().trim().is_empty(), "{}", tag);
    }
}

#[test]
fn test_corrupt_inputs_are_reported() {
    let unidoc = Unidoc::new();
    for tag in ["docx", "pptx", "xlsx", "pdf"] {
        let err = unidoc.load(b"definitely not a document", tag).unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }), "{}: {:?}", tag, err);
    }
    assert!(matches!(
        unidoc.load(b"whatever", "odt").unwrap_err(),
        Error::UnsupportedFormat { .. }
    ));
}

#[test]
fn test_truncated_package_is_corrupt_input() {
    let unidoc = Unidoc::new();
    let docx = unidoc.load(MARKDOWN.as_bytes(), "md").unwrap().export("docx").unwrap();
    let bytes = docx.bytes();
    let err = unidoc.load(&bytes[..bytes.len() / 2], "docx").unwrap_err();
    assert!(
        matches!(err, Error::CorruptInput { ref format, .. } if format == "docx"),
        "{:?}",
        err
    );
}
