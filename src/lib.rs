//! # unidoc
//!
//! Unified document extraction and conversion for Rust.
//!
//! Every source format is extracted into one canonical [`Document`], and
//! every output format is rendered from it. Right-to-left scripts are
//! detected per block and shaped exactly once on the way out.
//!
//! ## Quick Start
//!
//! ```
//! use unidoc::Unidoc;
//!
//! fn main() -> unidoc::Result<()> {
//!     let loaded = Unidoc::new().load("# مرحبا\n\nHello".as_bytes(), "md")?;
//!     let html = loaded.export("html")?;
//!     assert!(html.text().unwrap_or_default().contains("dir=\"rtl\""));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Sources**: PDF, DOCX, PPTX, XLSX, Markdown, plain text, canonical JSON,
//!   and scanned images through a caller-supplied OCR engine
//! - **Targets**: HTML, DOCX, Markdown, plain text, JSON
//! - **Bidi**: direction detection, Arabic contextual shaping, visual reordering
//! - **Failure isolation**: unreadable pages become warnings, not errors
//! - **Parallel export**: several targets rendered at once with Rayon

pub mod bidi;
pub mod convert;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod ocr;
pub mod render;

// Re-export commonly used types
pub use convert::{ConvertOptions, ConvertResult, Converter, ConverterRegistry, Output};
pub use error::{Error, Result};
pub use extract::{ExtractOptions, Extractor, ExtractorRegistry};
pub use model::{
    Block, BlockKind, Direction, Document, DocumentBuilder, Image, LinkRef, Metadata, Page,
    Summary, Table,
};
pub use ocr::{OcrEngine, OcrExtractor};

use extract::PdfExtractor;
use rayon::prelude::*;
use std::path::Path;
use std::sync::{Arc, OnceLock};

fn default_extractors() -> &'static ExtractorRegistry {
    static REGISTRY: OnceLock<ExtractorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ExtractorRegistry::with_defaults)
}

fn default_converters() -> &'static ConverterRegistry {
    static REGISTRY: OnceLock<ConverterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ConverterRegistry::with_defaults)
}

/// Extract a document with the built-in extractors.
///
/// # Example
///
/// ```
/// let doc = unidoc::extract(b"Title\n\nSome text.", "txt").unwrap();
/// assert_eq!(doc.title(), Some("Title"));
/// ```
pub fn extract(bytes: &[u8], tag: &str) -> Result<Document> {
    default_extractors().extract(bytes, tag, &ExtractOptions::default())
}

/// Render a document with the built-in converters.
pub fn convert(doc: &Document, tag: &str, options: &ConvertOptions) -> Result<ConvertResult> {
    default_converters().convert(doc, tag, options)
}

/// Builder for loading and exporting documents.
///
/// # Example
///
/// ```no_run
/// use unidoc::{ConvertOptions, Unidoc};
///
/// let loaded = Unidoc::new()
///     .with_convert_options(ConvertOptions::new().with_embedded_images(false))
///     .load_file("report.docx")?;
/// std::fs::write("report.html", loaded.export("html")?.bytes())?;
/// # Ok::<(), unidoc::Error>(())
/// ```
#[derive(Clone)]
pub struct Unidoc {
    extractors: Arc<ExtractorRegistry>,
    converters: Arc<ConverterRegistry>,
    ocr: Option<OcrExtractor>,
    extract_options: ExtractOptions,
    convert_options: ConvertOptions,
}

impl Unidoc {
    /// Create a builder with the built-in extractors and converters.
    pub fn new() -> Self {
        Self {
            extractors: Arc::new(ExtractorRegistry::with_defaults()),
            converters: Arc::new(ConverterRegistry::with_defaults()),
            ocr: None,
            extract_options: ExtractOptions::default(),
            convert_options: ConvertOptions::default(),
        }
    }

    /// Enable image sources through the given recognition engine.
    ///
    /// PDF pages without a text layer are recognized with the same engine.
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        let ocr = OcrExtractor::new(engine);
        let extractors = Arc::make_mut(&mut self.extractors);
        extractors.register(Arc::new(ocr.clone()));
        extractors.register(Arc::new(PdfExtractor::new().with_ocr(ocr.clone())));
        self.ocr = Some(ocr);
        self
    }

    /// Register an additional extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        Arc::make_mut(&mut self.extractors).register(extractor);
        self
    }

    /// Register an additional converter.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        Arc::make_mut(&mut self.converters).register(converter);
        self
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }

    /// Set default conversion options for loaded documents.
    pub fn with_convert_options(mut self, options: ConvertOptions) -> Self {
        self.convert_options = options;
        self
    }

    /// Extract a document from bytes of the given format.
    pub fn load(&self, bytes: &[u8], tag: &str) -> Result<Loaded> {
        let document = self.extractors.extract(bytes, tag, &self.extract_options)?;
        Ok(self.loaded(document))
    }

    /// Extract a document from a file.
    ///
    /// The format comes from the file extension; unknown extensions fall
    /// back to content sniffing.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Loaded> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let extension = detect::format_from_extension(path);
        let tag = match extension.as_deref() {
            Some(ext) if self.extractors.supports(ext) => ext.to_string(),
            _ => match detect::detect_format(&bytes) {
                Some(tag) => tag.to_string(),
                None => return Err(Error::unsupported(extension.unwrap_or_else(|| "unknown".to_string()))),
            },
        };

        let mut options = self.extract_options.clone();
        if options.source_name.is_none() {
            options.source_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        }
        log::debug!("loading {} as {}", path.display(), tag);
        let document = self.extractors.extract(&bytes, &tag, &options)?;
        Ok(self.loaded(document))
    }

    /// Load a document from its canonical JSON form.
    pub fn load_json(&self, json: &str) -> Result<Loaded> {
        let document = Document::from_json(json)?;
        Ok(self.loaded(document))
    }

    /// Recognize a multi-page scan, one image per page.
    ///
    /// Fails with `UnsupportedFormat` when no OCR engine is configured.
    pub fn load_scanned(&self, pages: &[&[u8]]) -> Result<Loaded> {
        let ocr = self.ocr.as_ref().ok_or_else(|| Error::unsupported("image"))?;
        let document = ocr.extract_pages(pages, &self.extract_options)?;
        Ok(self.loaded(document))
    }

    /// Format tags accepted by [`Unidoc::load`].
    pub fn supported_input_formats(&self) -> Vec<String> {
        self.extractors.supported_formats().into_iter().collect()
    }

    /// Format tags accepted by [`Loaded::export`].
    pub fn supported_output_formats(&self) -> Vec<String> {
        self.converters.supported_formats().into_iter().collect()
    }

    fn loaded(&self, document: Document) -> Loaded {
        for warning in &document.metadata().warnings {
            log::warn!("{}", warning);
        }
        Loaded {
            document,
            converters: self.converters.clone(),
            options: self.convert_options.clone(),
        }
    }
}

impl Default for Unidoc {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded document ready for export.
pub struct Loaded {
    document: Document,
    converters: Arc<ConverterRegistry>,
    options: ConvertOptions,
}

impl std::fmt::Debug for Loaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loaded")
            .field("document", &self.document)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Loaded {
    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Take the document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Render to a format with the builder's conversion options.
    pub fn export(&self, tag: &str) -> Result<ConvertResult> {
        self.export_with(tag, &self.options)
    }

    /// Render to a format with explicit options.
    pub fn export_with(&self, tag: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        self.converters.convert(&self.document, tag, options)
    }

    /// Render several formats in parallel, results in the order of `tags`.
    pub fn export_many(&self, tags: &[&str]) -> Vec<Result<ConvertResult>> {
        tags.par_iter().map(|tag| self.export(tag)).collect()
    }

    /// Canonical JSON.
    pub fn to_json(&self) -> Result<String> {
        self.document.to_json(true)
    }

    /// Plain text of all blocks, in logical order.
    pub fn text(&self) -> String {
        self.document.plain_text()
    }

    pub fn links(&self) -> Vec<LinkRef<'_>> {
        self.document.links()
    }

    pub fn images(&self) -> Vec<&Image> {
        self.document.images()
    }

    pub fn tables(&self) -> Vec<&Table> {
        self.document.tables()
    }

    pub fn summary(&self) -> Summary {
        self.document.summary()
    }
}
