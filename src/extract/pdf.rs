//! PDF extractor backed by lopdf.
//!
//! Text comes from the content streams of each page, one canonical page per
//! PDF page. Pages whose text cannot be decoded are reported as warnings.
//! JPEG image XObjects are kept as-is, raw and Flate-compressed samples are
//! re-encoded as PNG, and other encodings are skipped with a warning. URI
//! link annotations become link blocks.
//!
//! With an OCR engine attached, a page without a text layer is recognized
//! from its largest image, so scanned PDFs come out as positioned text.

use super::clean::{split_paragraphs, unwrap_lines};
use super::text::paragraph_with_links;
use super::{image_block, start_document, title_from_source, ExtractOptions, Extractor};
use crate::bidi::{detect_direction, dominant_direction};
use crate::error::{Error, Result};
use crate::model::{Block, Document, ExtractionWarning, Heading, Link};
use crate::ocr::OcrExtractor;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};
use std::io::Cursor;

/// Extractor for PDF documents.
#[derive(Debug, Default, Clone)]
pub struct PdfExtractor {
    ocr: Option<OcrExtractor>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize pages that have no text layer with `ocr`.
    pub fn with_ocr(mut self, ocr: OcrExtractor) -> Self {
        self.ocr = Some(ocr);
        self
    }
}

/// An image XObject found on a page.
enum PageImage {
    Decoded {
        name: String,
        data: Vec<u8>,
        mime: &'static str,
    },
    Skipped {
        name: String,
        reason: String,
    },
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn format_tags(&self) -> &[&str] {
        &["pdf"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        let doc = LopdfDocument::load_mem(bytes).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::corrupt("pdf", "document is encrypted"),
            other => Error::corrupt("pdf", other),
        })?;

        let mut builder = start_document("pdf", options);
        if let Some(info) = info_dictionary(&doc) {
            if let Some(title) = get_string_from_dict(info, b"Title").filter(|t| !t.trim().is_empty()) {
                builder.set_title(title.trim());
            }
            let metadata = builder.metadata_mut();
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.subject = get_string_from_dict(info, b"Subject");
            metadata.keywords = get_string_from_dict(info, b"Keywords")
                .map(|k| split_keywords(&k))
                .unwrap_or_default();
            metadata.created = get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified = get_string_from_dict(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }
        if builder.current_title().is_none() {
            if let Some(title) = title_from_source(options) {
                builder.set_title(title);
            }
        }

        let pages = doc.get_pages();
        let mut first_block = true;
        for (page_num, page_id) in pages {
            let number = builder.page_count() as u32 + 1;
            let text = doc.extract_text(&[page_num]);
            let images = page_images(&doc, page_id);
            let links = page_links(&doc, page_id);
            let mut warnings = Vec::new();
            let page = builder.new_page();

            let text = text.unwrap_or_else(|e| {
                log::warn!("Failed to extract text from page {}: {}", page_num, e);
                warnings.push(ExtractionWarning::page(
                    number,
                    format!("text could not be decoded: {}", e),
                ));
                String::new()
            });

            let mut texts = Vec::new();
            for raw in split_paragraphs(&text) {
                let cleaned = options.clean(&raw);
                if cleaned.is_empty() {
                    continue;
                }
                let direction = detect_direction(&cleaned);
                let is_title_line = first_block && !cleaned.contains('\n') && cleaned.chars().count() < 80;
                first_block = false;

                let block: Block = if is_title_line {
                    Heading::new(1, cleaned.clone()).with_direction(direction).into()
                } else {
                    paragraph_with_links(unwrap_lines(&cleaned))
                        .with_direction(direction)
                        .into()
                };
                texts.push(cleaned);
                page.push(block);
            }

            if let (true, Some(ocr)) = (texts.is_empty(), &self.ocr) {
                let scan = images
                    .iter()
                    .filter_map(|image| match image {
                        PageImage::Decoded { data, .. } => Some(data),
                        PageImage::Skipped { .. } => None,
                    })
                    .max_by_key(|data| data.len());
                if let Some(scan) = scan {
                    match ocr.recognize_page(scan, options) {
                        Ok(blocks) => {
                            log::debug!("page {} has no text layer, recognized {} blocks", page_num, blocks.len());
                            texts.extend(blocks.iter().map(Block::plain_text));
                            for block in blocks {
                                page.push(block);
                            }
                        }
                        Err(e) => warnings.push(ExtractionWarning::page(
                            number,
                            format!("page not recognized: {}", e),
                        )),
                    }
                }
            }
            page.direction = dominant_direction(texts.iter().map(String::as_str));

            for image in images {
                match image {
                    PageImage::Decoded { name, data, mime } => {
                        let id = format!("page{}_{}", page_num, name);
                        let image = image_block(id, data, Some(mime), options);
                        log::debug!("page {} image {} ({} bytes)", page_num, name, image.data().map_or(0, <[u8]>::len));
                        page.push(image);
                    }
                    PageImage::Skipped { name, reason } => {
                        warnings.push(ExtractionWarning::page(
                            number,
                            format!("image {} skipped: {}", name, reason),
                        ));
                    }
                }
            }

            for (text, url) in links {
                let direction = detect_direction(&text);
                page.push(Link::new(text, url).with_direction(direction));
            }

            for warning in warnings {
                builder.warn(warning);
            }
        }

        Ok(builder.build()?)
    }
}

/// The document information dictionary, if present.
fn info_dictionary(doc: &LopdfDocument) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve_dict(doc, info)
}

/// Follow a reference to a dictionary, or take an inline one.
fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// Image XObjects referenced from a page's resources.
fn page_images(doc: &LopdfDocument, page_id: ObjectId) -> Vec<PageImage> {
    let mut images = Vec::new();
    let Some(resources) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Resources").ok())
        .and_then(|res| resolve_dict(doc, res))
    else {
        return images;
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    else {
        return images;
    };

    for (name, obj) in xobjects.iter() {
        let Ok(obj_ref) = obj.as_reference() else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(obj_ref) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok())
            == Some("Image");
        if is_image {
            images.push(decode_image(String::from_utf8_lossy(name).into_owned(), stream));
        }
    }
    images
}

/// Names in an image stream's `Filter` entry, in decoding order.
fn image_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(names)) => names
            .iter()
            .filter_map(|n| n.as_name_str().ok().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_image(name: String, stream: &Stream) -> PageImage {
    let filters = image_filters(&stream.dict);
    let decoded = match filters.as_slice() {
        [jpeg] if jpeg == "DCTDecode" => Ok((stream.content.clone(), "image/jpeg")),
        [] => samples_to_png(&stream.dict, stream.content.clone()).map(|png| (png, "image/png")),
        [flate] if flate == "FlateDecode" => inflate(stream)
            .map_err(|e| e.to_string())
            .and_then(|samples| samples_to_png(&stream.dict, samples))
            .map(|png| (png, "image/png")),
        [other] => Err(format!("{} images are not supported", other)),
        chain => Err(format!("filter chain {} is not supported", chain.join(" + "))),
    };
    match decoded {
        Ok((data, mime)) => PageImage::Decoded { name, data, mime },
        Err(reason) => PageImage::Skipped { name, reason },
    }
}

/// Inflate an image stream, applying any PNG predictor.
fn inflate(stream: &Stream) -> lopdf::Result<Vec<u8>> {
    // lopdf only decompresses non-image streams
    let mut samples = stream.clone();
    samples.dict.remove(b"Subtype");
    samples.decompressed_content()
}

/// Re-encode 8-bit gray or RGB samples as PNG.
fn samples_to_png(dict: &Dictionary, samples: Vec<u8>) -> std::result::Result<Vec<u8>, String> {
    let dimension = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|v| v.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
    };
    let (Some(width), Some(height)) = (dimension(b"Width"), dimension(b"Height")) else {
        return Err("image has no size".to_string());
    };
    let bits = dict.get(b"BitsPerComponent").ok().and_then(|b| b.as_i64().ok()).unwrap_or(8);
    if bits != 8 {
        return Err(format!("{} bits per component is not supported", bits));
    }

    let color_space = match dict.get(b"ColorSpace") {
        Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        Ok(_) => return Err("indexed and ICC color spaces are not supported".to_string()),
        Err(_) => "DeviceGray".to_string(),
    };
    let image = match color_space.as_str() {
        "DeviceGray" => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        "DeviceRGB" => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        other => return Err(format!("{} color space is not supported", other)),
    }
    .ok_or_else(|| "sample data is shorter than the image".to_string())?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(png)
}

/// URI link annotations on a page as `(text, url)` pairs.
fn page_links(doc: &LopdfDocument, page_id: ObjectId) -> Vec<(String, String)> {
    let mut links = Vec::new();
    let Some(annots) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
    else {
        return links;
    };
    let annots = match annots {
        Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_array().ok()),
        other => other.as_array().ok(),
    };

    for annot in annots.into_iter().flatten() {
        let Some(dict) = resolve_dict(doc, annot) else {
            continue;
        };
        let is_link = dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok())
            == Some("Link");
        if !is_link {
            continue;
        }
        let Some(action) = dict.get(b"A").ok().and_then(|a| resolve_dict(doc, a)) else {
            continue;
        };
        if let Some(uri) = get_string_from_dict(action, b"URI").filter(|u| !u.is_empty()) {
            let text = get_string_from_dict(dict, b"Contents")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| uri.clone());
            links.push((text, uri));
        }
    }
    links
}

/// Read a text string, honoring the UTF-16BE byte order mark.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                // UTF-8, else Latin-1
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split([',', ';'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
