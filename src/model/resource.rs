//! Image blocks and their payloads.

use super::{Direction, Extensions, PositionHint};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// An image, either carrying its bytes or pointing at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Identifier unique within the document
    pub id: String,

    /// Payload or reference
    pub source: ImageSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Where an image's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Original bytes owned by the block (base64 on the wire).
    Embedded {
        mime_type: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// External URI.
    Reference { uri: String },
}

impl Image {
    /// Create an image owning its bytes. The MIME type is sniffed when possible.
    pub fn embedded(id: impl Into<String>, data: Vec<u8>) -> Self {
        let mime_type = detect_mime_type(&data)
            .unwrap_or("application/octet-stream")
            .to_string();
        Self::new(id, ImageSource::Embedded { mime_type, data })
    }

    /// Create an image pointing at an external URI.
    pub fn reference(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::new(id, ImageSource::Reference { uri: uri.into() })
    }

    fn new(id: impl Into<String>, source: ImageSource) -> Self {
        Self {
            id: id.into(),
            source,
            caption: None,
            alt_text: None,
            width: None,
            height: None,
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the alt text.
    pub fn with_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }

    /// Set pixel dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Override the MIME type of an embedded payload.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        if let ImageSource::Embedded { mime_type, .. } = &mut self.source {
            *mime_type = mime.into();
        }
        self
    }

    /// Embedded bytes, if any.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.source {
            ImageSource::Embedded { data, .. } => Some(data),
            ImageSource::Reference { .. } => None,
        }
    }

    /// MIME type of embedded bytes.
    pub fn mime_type(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Embedded { mime_type, .. } => Some(mime_type),
            ImageSource::Reference { .. } => None,
        }
    }

    /// Self-contained `data:` URI for embedded bytes.
    pub fn data_uri(&self) -> Option<String> {
        match &self.source {
            ImageSource::Embedded { mime_type, data } => {
                Some(format!("data:{};base64,{}", mime_type, STANDARD.encode(data)))
            }
            ImageSource::Reference { .. } => None,
        }
    }

    /// File extension for the payload.
    pub fn extension(&self) -> &'static str {
        match self.mime_type().unwrap_or("") {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/jp2" => "jp2",
            "image/x-emf" => "emf",
            "image/x-wmf" => "wmf",
            _ => "bin",
        }
    }

    /// Suggested filename derived from the id.
    pub fn suggested_filename(&self) -> String {
        format!("{}.{}", self.id, self.extension())
    }

    /// Text shown where the image cannot be displayed.
    pub fn label(&self) -> &str {
        self.caption
            .as_deref()
            .or(self.alt_text.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Detect MIME type from data magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // Little-endian or big-endian TIFF
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
        return Some("image/jp2");
    }

    None
}

/// Mime type from a file extension, used for packaged media.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "tif" | "tiff" => Some("image/tiff"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "emf" => Some("image/x-emf"),
        "wmf" => Some("image/x-wmf"),
        _ => None,
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
