//! Converter contract and registry.
//!
//! A converter renders a canonical [`Document`] into one target format. The
//! registry maps lowercase format tags to converters and is shared read-only
//! once built.
//!
//! # Example
//!
//! ```
//! use unidoc::convert::{ConvertOptions, ConverterRegistry};
//! use unidoc::model::{DocumentBuilder, Paragraph};
//!
//! fn main() -> unidoc::Result<()> {
//!     let mut builder = DocumentBuilder::new("txt");
//!     builder.new_page().push(Paragraph::new("Hello"));
//!     let doc = builder.build()?;
//!
//!     let registry = ConverterRegistry::with_defaults();
//!     let result = registry.convert(&doc, "md", &ConvertOptions::default())?;
//!     assert!(result.text().unwrap_or_default().contains("Hello"));
//!     Ok(())
//! }
//! ```

mod builtin;

pub use builtin::{DocxConverter, HtmlConverter, JsonConverter, MarkdownConverter, TextConverter};
pub use crate::render::{Degradation, DegradeAction, JsonFormat, RenderStats};

use crate::bidi::ShapingMode;
use crate::error::{Error, Result};
use crate::model::Document;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Keep bold, italic, underline and strike spans
    pub preserve_styles: bool,

    /// Inline embedded image bytes; otherwise reference them by path
    pub embed_images: bool,

    /// Fail with `IrreducibleStructure` instead of degrading a block
    pub strict: bool,

    /// Override the target's default shaping mode
    pub shaping: Option<ShapingMode>,

    /// Markdown: emit YAML front matter
    pub include_frontmatter: bool,

    /// HTML: emit the default stylesheet
    pub include_styles: bool,

    /// JSON layout
    pub json_format: JsonFormat,

    /// Prefix for image paths when images are not embedded (e.g., "images/")
    pub image_path_prefix: String,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable style spans.
    pub fn with_styles(mut self, preserve: bool) -> Self {
        self.preserve_styles = preserve;
        self
    }

    /// Enable or disable inline image payloads.
    pub fn with_embedded_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    /// Enable or disable strict fidelity.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Force a shaping mode.
    pub fn with_shaping(mut self, mode: ShapingMode) -> Self {
        self.shaping = Some(mode);
        self
    }

    /// Enable or disable Markdown front matter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable the HTML stylesheet.
    pub fn with_css(mut self, include: bool) -> Self {
        self.include_styles = include;
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_styles: true,
            embed_images: true,
            strict: false,
            shaping: None,
            include_frontmatter: true,
            include_styles: true,
            json_format: JsonFormat::Pretty,
            image_path_prefix: "images/".to_string(),
        }
    }
}

/// Rendered bytes or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Binary(Vec<u8>),
}

impl Output {
    /// Raw bytes of the output.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Output::Text(text) => text.as_bytes(),
            Output::Binary(data) => data,
        }
    }

    /// Text content, when the target is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of document conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Rendered content
    pub content: Output,

    /// MIME type of the output
    pub mime_type: &'static str,

    /// Blocks the target could not hold as-is
    pub degradations: Vec<Degradation>,

    /// Counts collected while rendering
    pub stats: RenderStats,
}

impl ConvertResult {
    /// Text content, when the target is textual.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }

    /// Raw bytes of the content.
    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Get content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Whether any block was degraded.
    pub fn is_lossy(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Trait for target format converters.
///
/// Implementations pass every text value they emit through the shaper of
/// their render context exactly once, and either degrade or reject (in
/// strict mode) each block the target cannot represent.
pub trait Converter: Send + Sync {
    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Format tags produced, lowercase (e.g., `["html", "htm"]`).
    fn format_tags(&self) -> &[&str];

    /// MIME type of the output.
    fn mime_type(&self) -> &'static str;

    /// Shaping applied when the options do not override it.
    fn default_shaping(&self) -> ShapingMode;

    /// Render a document.
    fn convert(&self, doc: &Document, options: &ConvertOptions) -> Result<ConvertResult>;

    /// Check if this converter produces the given tag.
    fn supports(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.format_tags().iter().any(|t| *t == tag)
    }
}

/// Registry for converters.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
    by_name: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the built-in converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlConverter::new()));
        registry.register(Arc::new(MarkdownConverter::new()));
        registry.register(Arc::new(TextConverter::new()));
        registry.register(Arc::new(JsonConverter::new()));
        registry.register(Arc::new(DocxConverter::new()));
        registry
    }

    /// Register a converter for all its format tags.
    pub fn register(&mut self, converter: Arc<dyn Converter>) {
        for tag in converter.format_tags() {
            self.converters.insert(tag.to_lowercase(), converter.clone());
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by format tag.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn Converter>> {
        self.converters.get(&tag.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format tag is supported.
    pub fn supports(&self, tag: &str) -> bool {
        self.converters.contains_key(&tag.to_lowercase())
    }

    /// All supported format tags.
    pub fn supported_formats(&self) -> BTreeSet<String> {
        self.converters.keys().cloned().collect()
    }

    /// Render `doc` with the converter registered for `tag`.
    pub fn convert(&self, doc: &Document, tag: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        let converter = self.get(tag).ok_or_else(|| Error::unsupported(tag))?;
        log::debug!("converting {} page(s) to {} with {}", doc.page_count(), tag, converter.name());
        converter.convert(doc, options)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentBuilder, Paragraph};

    fn doc() -> Document {
        let mut builder = DocumentBuilder::new("txt");
        builder.new_page().push(Paragraph::new("Hello"));
        builder.build().unwrap()
    }

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_strict(true)
            .with_styles(false)
            .with_shaping(ShapingMode::Visual)
            .with_image_prefix("media/");

        assert!(options.strict);
        assert!(!options.preserve_styles);
        assert!(options.embed_images);
        assert_eq!(options.shaping, Some(ShapingMode::Visual));
        assert_eq!(options.image_path_prefix, "media/");
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        for tag in ["html", "htm", "md", "markdown", "txt", "text", "json", "docx"] {
            assert!(registry.supports(tag), "missing {}", tag);
        }
        assert!(registry.supports("HTML"));
        assert!(!registry.supports("pdf"));
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = ConverterRegistry::with_defaults();
        assert_eq!(registry.get_by_name("markdown").unwrap().name(), "markdown");
        assert_eq!(registry.get("htm").unwrap().mime_type(), "text/html");
    }

    #[test]
    fn test_unsupported_target() {
        let err = ConverterRegistry::with_defaults()
            .convert(&doc(), "rtf", &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { ref tag } if tag == "rtf"));
    }

    #[test]
    fn test_default_shaping_per_target() {
        let registry = ConverterRegistry::with_defaults();
        assert_eq!(registry.get("html").unwrap().default_shaping(), ShapingMode::Reshape);
        assert_eq!(registry.get("md").unwrap().default_shaping(), ShapingMode::Reshape);
        assert_eq!(registry.get("docx").unwrap().default_shaping(), ShapingMode::Reshape);
        assert_eq!(registry.get("txt").unwrap().default_shaping(), ShapingMode::Visual);
        assert_eq!(registry.get("json").unwrap().default_shaping(), ShapingMode::None);
    }
}
