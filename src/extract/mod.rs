//! Extractor contract and registry.
//!
//! An extractor consumes the raw bytes of one source format and produces a
//! complete canonical [`Document`]. The registry maps lowercase format tags to
//! extractors and is populated once, then shared read-only.
//!
//! # Example
//!
//! ```
//! use unidoc::extract::{ExtractOptions, ExtractorRegistry};
//!
//! fn main() -> unidoc::Result<()> {
//!     let registry = ExtractorRegistry::with_defaults();
//!     let doc = registry.extract(b"Title\n\nBody text.", "txt", &ExtractOptions::default())?;
//!     assert_eq!(doc.page_count(), 1);
//!     Ok(())
//! }
//! ```

// Lazily compiled regex. A pattern that fails to compile yields `None`.
macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> Option<&'static regex::Regex> {
            static CELL: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
            CELL.get_or_init(|| regex::Regex::new($pattern).ok()).as_ref()
        }
    };
}

pub mod clean;
mod docx;
mod json;
mod markdown;
mod options;
mod pdf;
mod pptx;
mod text;
mod xlsx;
pub(crate) mod xml;

pub use docx::DocxExtractor;
pub use json::JsonExtractor;
pub use markdown::MarkdownExtractor;
pub use options::ExtractOptions;
pub use pdf::PdfExtractor;
pub use pptx::PptxExtractor;
pub use text::TextExtractor;
pub use xlsx::XlsxExtractor;

use crate::error::{Error, Result};
use crate::model::{Document, DocumentBuilder, Image};
use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use std::sync::Arc;

/// Trait for source format extractors.
///
/// Implementations must produce exactly one page per natural unit of the
/// source, tag each block's direction from its text, keep embedded image
/// bytes untouched unless downscaling is requested, and record every
/// recoverable loss as an [`crate::model::ExtractionWarning`].
pub trait Extractor: Send + Sync {
    /// Get the name of this extractor.
    fn name(&self) -> &str;

    /// Format tags handled, lowercase (e.g., `["docx"]`).
    fn format_tags(&self) -> &[&str];

    /// Extract a document from raw bytes.
    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<Document>;

    /// Check if this extractor handles the given tag.
    fn supports(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.format_tags().iter().any(|t| *t == tag)
    }
}

/// Registry for extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
    by_name: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the built-in extractors.
    ///
    /// OCR needs a recognition engine and is registered separately with
    /// [`crate::ocr::OcrExtractor`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextExtractor::new()));
        registry.register(Arc::new(MarkdownExtractor::new()));
        registry.register(Arc::new(DocxExtractor::new()));
        registry.register(Arc::new(PptxExtractor::new()));
        registry.register(Arc::new(XlsxExtractor::new()));
        registry.register(Arc::new(PdfExtractor::new()));
        registry.register(Arc::new(JsonExtractor::new()));
        registry
    }

    /// Register an extractor for all its format tags.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        for tag in extractor.format_tags() {
            self.extractors.insert(tag.to_lowercase(), extractor.clone());
        }
        self.by_name
            .insert(extractor.name().to_lowercase(), extractor);
    }

    /// Register an extractor whose construction may fail.
    ///
    /// A failure is logged and leaves every other format working.
    pub fn register_fallible(&mut self, name: &str, extractor: Result<Arc<dyn Extractor>>) -> bool {
        match extractor {
            Ok(extractor) => {
                self.register(extractor);
                true
            }
            Err(e) => {
                log::warn!("{} extractor unavailable: {}", name, e);
                false
            }
        }
    }

    /// Get an extractor by format tag.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&tag.to_lowercase()).cloned()
    }

    /// Get an extractor by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Extractor>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format tag is supported.
    pub fn supports(&self, tag: &str) -> bool {
        self.extractors.contains_key(&tag.to_lowercase())
    }

    /// All supported format tags.
    pub fn supported_formats(&self) -> BTreeSet<String> {
        self.extractors.keys().cloned().collect()
    }

    /// Extract a document using the extractor registered for `tag`.
    pub fn extract(&self, bytes: &[u8], tag: &str, options: &ExtractOptions) -> Result<Document> {
        let extractor = self.get(tag).ok_or_else(|| Error::unsupported(tag))?;
        log::debug!("extracting {} bytes as {} with {}", bytes.len(), tag, extractor.name());
        extractor.extract(bytes, &options.for_format(tag))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Start a document, recording the source name from the options.
///
/// The source format is the tag the registry resolved, or `tag` when the
/// extractor is called directly.
pub(crate) fn start_document(tag: &str, options: &ExtractOptions) -> DocumentBuilder {
    let mut builder = DocumentBuilder::new(options.format_or(tag));
    builder.metadata_mut().source_name = options.source_name.clone();
    builder
}

/// Title derived from a file name, without its extension.
pub(crate) fn title_from_source(options: &ExtractOptions) -> Option<String> {
    let name = options.source_name.as_deref()?;
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Build an image block from embedded bytes.
///
/// Bytes are kept as-is unless `max_image_dimension` asks for downscaling
/// and the image exceeds it, in which case it is resized and stored as PNG.
pub(crate) fn image_block(
    id: impl Into<String>,
    data: Vec<u8>,
    mime_hint: Option<&str>,
    options: &ExtractOptions,
) -> Image {
    let dimensions = image::ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    if let (Some(max), Some((width, height))) = (options.max_image_dimension, dimensions) {
        if width.max(height) > max {
            if let Some((png, w, h)) = downscale(&data, max) {
                return Image::embedded(id, png).with_dimensions(w, h);
            }
            log::warn!("could not downscale image, keeping original bytes");
        }
    }

    let mut image = Image::embedded(id, data);
    if image.mime_type() == Some("application/octet-stream") {
        if let Some(mime) = mime_hint {
            image = image.with_mime_type(mime);
        }
    }
    match dimensions {
        Some((width, height)) => image.with_dimensions(width, height),
        None => image,
    }
}

fn downscale(data: &[u8], max: u32) -> Option<(Vec<u8>, u32, u32)> {
    let decoded = image::load_from_memory(data).ok()?;
    let resized = decoded.thumbnail(max, max);
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, image::ImageFormat::Png).ok()?;
    Some((out.into_inner(), resized.width(), resized.height()))
}
