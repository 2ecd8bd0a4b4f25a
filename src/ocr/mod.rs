//! OCR extraction for scanned pages.
//!
//! Each page image runs through three stages with typed hand-offs:
//!
//! 1. [`preprocess`]: [`RawImage`] → [`Preprocessed`] (grayscale, median
//!    denoise, Otsu binarization)
//! 2. [`OcrEngine::recognize`]: [`Preprocessed`] → [`RecognizedTokens`]
//! 3. [`reconstruct_page`]: tokens → positioned text blocks, with words
//!    inside a ruled grid gathered into a table
//!
//! The engine is supplied by the caller. A page that fails any stage becomes
//! an empty page with a warning; the remaining pages are still extracted.

mod preprocess;
mod recognize;
mod reconstruct;

pub use preprocess::{preprocess, Preprocessed, RawImage};
pub use recognize::{OcrEngine, PixelBox, RawToken, RecognizedTokens};
pub use reconstruct::{detect_grid, reconstruct, reconstruct_page, Grid};

use crate::bidi::dominant_direction;
use crate::error::Result;
use crate::extract::clean::count_words;
use crate::extract::{start_document, title_from_source, ExtractOptions, Extractor};
use crate::model::{Block, Direction, Document, ExtractionWarning};
use std::sync::Arc;

/// Extractor for page images, backed by an [`OcrEngine`].
#[derive(Clone)]
pub struct OcrExtractor {
    engine: Arc<dyn OcrEngine>,
}

impl OcrExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    /// Extract a multi-page scanned source, one image per page.
    pub fn extract_pages(&self, pages: &[&[u8]], options: &ExtractOptions) -> Result<Document> {
        let mut builder = start_document("image", options);
        if let Some(title) = title_from_source(options) {
            builder.set_title(title);
        }

        let mut all_text = Vec::new();
        for (index, bytes) in pages.iter().enumerate() {
            let number = index as u32 + 1;
            let page = builder.new_page();
            match self.recognize_page(bytes, options) {
                Ok(blocks) => {
                    let texts: Vec<String> = blocks.iter().map(Block::plain_text).collect();
                    page.direction = dominant_direction(texts.iter().map(String::as_str));
                    all_text.extend(texts);
                    for block in blocks {
                        page.push(block);
                    }
                }
                Err(e) => {
                    builder.warn(ExtractionWarning::page(number, format!("page not recognized: {}", e)));
                }
            }
        }

        let metadata = builder.metadata_mut();
        metadata.word_count = Some(all_text.iter().map(|t| count_words(t)).sum());
        metadata.language = match dominant_direction(all_text.iter().map(String::as_str)) {
            Direction::Rtl => Some("ar".to_string()),
            Direction::Ltr => Some("en".to_string()),
            Direction::Auto => None,
        };

        Ok(builder.build()?)
    }

    /// Run one page image through every stage.
    pub(crate) fn recognize_page(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Vec<Block>> {
        let page = preprocess(&RawImage::new(bytes))?;
        let tokens = self.engine.recognize(&page, &options.ocr_languages)?;
        log::debug!("recognized {} tokens on {}x{} page", tokens.len(), page.width(), page.height());
        Ok(reconstruct_page(&tokens, &page, options))
    }
}

impl std::fmt::Debug for OcrExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrExtractor").finish_non_exhaustive()
    }
}

impl Extractor for OcrExtractor {
    fn name(&self) -> &str {
        "ocr"
    }

    fn format_tags(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "gif", "webp", "image"]
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document> {
        self.extract_pages(&[bytes], options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{GrayImage, Luma};
    use std::io::Cursor;

    fn page_png(width: u32) -> Vec<u8> {
        let image = GrayImage::from_fn(width, 50, |x, _| if x % 7 == 0 { Luma([0]) } else { Luma([255]) });
        let mut out = Vec::new();
        image.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        out
    }

    fn engine(page: &Preprocessed, languages: &[String]) -> Result<RecognizedTokens> {
        assert_eq!(languages, ["ara", "eng"]);
        if page.width() == 66 {
            return Err(Error::Recognition("engine crashed".into()));
        }
        Ok(vec![
            RawToken::new("مرحبا", PixelBox::new(50, 10, 30, 10), 0.9),
            RawToken::new("بكم", PixelBox::new(10, 10, 30, 10), 0.7),
        ])
    }

    #[test]
    fn test_single_image() {
        let extractor = OcrExtractor::new(Arc::new(engine));
        let doc = extractor
            .extract(&page_png(100), &ExtractOptions::new().with_source_name("scan.png"))
            .unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.title(), Some("scan"));
        assert_eq!(doc.direction(), Direction::Rtl);
        assert_eq!(doc.metadata().language.as_deref(), Some("ar"));
        match &doc.pages()[0].blocks[0] {
            Block::PositionedText(block) => assert_eq!(block.text, "مرحبا بكم"),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_failed_page_isolated() {
        let extractor = OcrExtractor::new(Arc::new(engine));
        let pages = [page_png(100), page_png(66), page_png(100)];
        let refs: Vec<&[u8]> = pages.iter().map(Vec::as_slice).collect();
        let doc = extractor.extract_pages(&refs, &ExtractOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages()[1].blocks.is_empty());
        assert!(!doc.pages()[2].blocks.is_empty());
        assert_eq!(doc.metadata().warnings_for_page(2).count(), 1);
    }
}
