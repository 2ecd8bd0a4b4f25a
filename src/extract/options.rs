//! Extraction options.

use crate::model::{InlineLink, Paragraph, StyleSpan};

/// Options passed to every extractor.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// OCR language hints, dominant script first
    pub ocr_languages: Vec<String>,

    /// OCR confidence below this is flagged, never discarded
    pub confidence_floor: f64,

    /// Tokens whose vertical centers differ by less than this fraction of
    /// their height share a baseline
    pub line_tolerance: f64,

    /// Largest horizontal gap, as a multiple of token height, merged into
    /// one positioned block
    pub gap_factor: f64,

    /// Apply NFKC and whitespace normalization to extracted text
    pub clean_text: bool,

    /// Downscale embedded images whose longer side exceeds this many pixels.
    /// `None` keeps original bytes untouched.
    pub max_image_dimension: Option<u32>,

    /// Original file name recorded in metadata
    pub source_name: Option<String>,

    /// Tag the input was requested under, set by the registry
    pub(crate) format_tag: Option<String>,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set OCR language hints.
    pub fn with_ocr_languages<S: Into<String>>(mut self, languages: impl IntoIterator<Item = S>) -> Self {
        self.ocr_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Set the low-confidence floor, clamped to `[0, 1]`.
    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor.clamp(0.0, 1.0);
        self
    }

    /// Set the baseline tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the horizontal merge gap factor.
    pub fn with_gap_factor(mut self, factor: f64) -> Self {
        self.gap_factor = factor.max(0.0);
        self
    }

    /// Enable or disable text normalization.
    pub fn with_clean_text(mut self, clean: bool) -> Self {
        self.clean_text = clean;
        self
    }

    /// Request downscaling of large embedded images.
    pub fn with_max_image_dimension(mut self, max: u32) -> Self {
        self.max_image_dimension = Some(max.max(1));
        self
    }

    /// Record the source file name.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Copy of these options for an input requested as `tag`.
    pub(crate) fn for_format(&self, tag: &str) -> Self {
        Self {
            format_tag: Some(tag.to_lowercase()),
            ..self.clone()
        }
    }

    /// The requested tag, or `default` outside the registry.
    pub(crate) fn format_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.format_tag.as_deref().unwrap_or(default)
    }

    /// Normalize a text value according to these options.
    pub(crate) fn clean(&self, text: &str) -> String {
        if self.clean_text {
            super::clean::clean_text(text, true)
        } else {
            text.to_string()
        }
    }

    /// Build a paragraph from raw text with spans and links, normalizing the
    /// text according to these options and keeping offsets aligned.
    pub(crate) fn paragraph(
        &self,
        text: &str,
        spans: Vec<StyleSpan>,
        links: Vec<InlineLink>,
    ) -> Paragraph {
        if !self.clean_text {
            let mut paragraph = Paragraph::new(text);
            paragraph.spans = spans;
            paragraph.links = links;
            return paragraph;
        }

        let (folded, fold_map) = super::clean::fold_mapped(text);
        let (collapsed, collapse_map) = super::clean::collapse_whitespace(&folded);
        let text_len = fold_map.len() - 1;
        let remap = |start: usize, end: usize| {
            let start = collapse_map[fold_map[start.min(text_len)]];
            let end = collapse_map[fold_map[end.min(text_len)]];
            (end > start).then_some((start, end))
        };

        let mut paragraph = Paragraph::new(collapsed);
        paragraph.spans = spans
            .into_iter()
            .filter_map(|span| {
                let (start, end) = remap(span.start, span.end)?;
                Some(StyleSpan { start, end, ..span })
            })
            .collect();
        paragraph.links = links
            .into_iter()
            .filter_map(|link| {
                let (start, end) = remap(link.start, link.end)?;
                Some(InlineLink { start, end, ..link })
            })
            .collect();
        paragraph
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ocr_languages: vec!["ara".to_string(), "eng".to_string()],
            confidence_floor: 0.6,
            line_tolerance: 0.5,
            gap_factor: 1.5,
            clean_text: true,
            max_image_dimension: None,
            source_name: None,
            format_tag: None,
        }
    }
}
