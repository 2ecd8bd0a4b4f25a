//! Canonical JSON extractor.
//!
//! Reads a document previously serialized with [`Document::to_json`],
//! keeping unknown extension fields so a later export writes them back.

use super::{ExtractOptions, Extractor};
use crate::error::{Error, Result};
use crate::model::Document;

/// Extractor for the canonical JSON serialization.
#[derive(Debug, Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for JsonExtractor {
    fn name(&self) -> &str {
        "json"
    }

    fn format_tags(&self) -> &[&str] {
        &["json"]
    }

    fn extract(&self, bytes: &[u8], _options: &ExtractOptions) -> Result<Document> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::corrupt("json", e))?;
        Document::from_json(text).map_err(|e| match e {
            Error::Json(e) => Error::corrupt("json", e),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentBuilder, Paragraph};

    #[test]
    fn test_reads_canonical_json() {
        let mut builder = DocumentBuilder::new("docx").title("Memo");
        builder.new_page().push(Paragraph::new("Body"));
        let json = builder.build().unwrap().to_json(false).unwrap();

        let doc = JsonExtractor::new()
            .extract(json.as_bytes(), &ExtractOptions::default())
            .unwrap();
        assert_eq!(doc.title(), Some("Memo"));
        assert_eq!(doc.metadata().source_format(), "docx");
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let err = JsonExtractor::new()
            .extract(b"{\"pages\": [", &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CorruptInput { ref format, .. } if format == "json"));

        let err = JsonExtractor::new()
            .extract(&[0xff, 0xfe], &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }));
    }
}
