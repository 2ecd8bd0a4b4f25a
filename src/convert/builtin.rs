//! Built-in converters over the render targets.

use super::{ConvertOptions, ConvertResult, Converter};
use crate::bidi::ShapingMode;
use crate::error::Result;
use crate::model::Document;
use crate::render;

macro_rules! converter {
    (
        $(#[$doc:meta])*
        $ty:ident, $name:literal, [$($tag:literal),+], $mime:literal, $shaping:expr, $render:path
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            _private: (),
        }

        impl $ty {
            /// Create a new converter.
            pub fn new() -> Self {
                Self { _private: () }
            }
        }

        impl Converter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn format_tags(&self) -> &[&str] {
                &[$($tag),+]
            }

            fn mime_type(&self) -> &'static str {
                $mime
            }

            fn default_shaping(&self) -> ShapingMode {
                $shaping
            }

            fn convert(&self, doc: &Document, options: &ConvertOptions) -> Result<ConvertResult> {
                $render(doc, options)
            }
        }
    };
}

converter!(
    /// Standalone HTML5 page with `dir` markup on every block.
    HtmlConverter, "html", ["html", "htm"], "text/html", ShapingMode::Reshape, render::to_html
);

converter!(
    /// CommonMark with optional YAML front matter.
    MarkdownConverter, "markdown", ["md", "markdown"], "text/markdown", ShapingMode::Reshape, render::to_markdown
);

converter!(
    /// Plain text in visual order.
    TextConverter, "text", ["txt", "text"], "text/plain", ShapingMode::Visual, render::to_text
);

converter!(
    /// Canonical JSON; text stays logical.
    JsonConverter, "json", ["json"], "application/json", ShapingMode::None, render::to_json
);

converter!(
    /// WordprocessingML package.
    DocxConverter, "docx", ["docx"],
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ShapingMode::Reshape, render::to_docx
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentBuilder, Paragraph};

    #[test]
    fn test_converter_tags() {
        let converter = HtmlConverter::new();
        assert_eq!(converter.format_tags(), &["html", "htm"]);
        assert!(converter.supports("HTM"));
        assert!(!converter.supports("md"));
        assert_eq!(MarkdownConverter::new().name(), "markdown");
    }

    #[test]
    fn test_result_mime_matches_converter() {
        let mut builder = DocumentBuilder::new("txt");
        builder.new_page().push(Paragraph::new("Hello"));
        let doc = builder.build().unwrap();

        let converters: Vec<Box<dyn Converter>> = vec![
            Box::new(HtmlConverter::new()),
            Box::new(MarkdownConverter::new()),
            Box::new(TextConverter::new()),
            Box::new(JsonConverter::new()),
            Box::new(DocxConverter::new()),
        ];
        for converter in converters {
            let result = converter.convert(&doc, &ConvertOptions::default()).unwrap();
            assert_eq!(result.mime_type, converter.mime_type(), "{}", converter.name());
            assert!(!result.content.is_empty());
        }
    }
}
