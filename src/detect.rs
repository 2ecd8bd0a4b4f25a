//! Source format detection from magic bytes.

use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Bytes inspected for text and JSON sniffing.
const SNIFF_LEN: usize = 4096;

/// Guess the format tag of a byte buffer.
///
/// Office packages are told apart by their main part. Returns `None` for
/// empty input, unknown binary data and ZIP archives that are not Office
/// documents.
///
/// # Example
/// ```
/// use unidoc::detect::detect_format;
///
/// assert_eq!(detect_format(b"%PDF-1.7\n"), Some("pdf"));
/// assert_eq!(detect_format(b"{\"pages\": []}"), Some("json"));
/// assert_eq!(detect_format(b"plain words"), Some("txt"));
/// ```
pub fn detect_format(data: &[u8]) -> Option<&'static str> {
    if data.is_empty() {
        return None;
    }
    if data.starts_with(PDF_MAGIC) {
        return Some("pdf");
    }
    if data.starts_with(PNG_MAGIC) {
        return Some("png");
    }
    if data.starts_with(JPEG_MAGIC) {
        return Some("jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("tiff");
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    if data.starts_with(b"BM") && data.len() >= 14 {
        return Some("bmp");
    }
    if data.starts_with(ZIP_MAGIC) {
        return office_format(data);
    }
    sniff_text(data)
}

/// Detect the format of a file from its contents.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<Option<&'static str>> {
    let file = File::open(path)?;
    let mut data = Vec::new();
    BufReader::new(file).read_to_end(&mut data)?;
    Ok(detect_format(&data))
}

/// Format tag implied by a file extension, if it names a known format.
pub fn format_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    (!ext.is_empty()).then_some(ext)
}

fn office_format(data: &[u8]) -> Option<&'static str> {
    let archive = ZipArchive::new(Cursor::new(data)).ok()?;
    let mut names = archive.file_names();
    names.find_map(|name| match name {
        "word/document.xml" => Some("docx"),
        "ppt/presentation.xml" => Some("pptx"),
        "xl/workbook.xml" => Some("xlsx"),
        _ => None,
    })
}

fn sniff_text(data: &[u8]) -> Option<&'static str> {
    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // The cut may land inside a multi-byte sequence
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return None;
    }
    let trimmed = text.trim_start_matches('\u{FEFF}').trim_start();
    if trimmed.starts_with('{') && serde_json::from_slice::<serde_json::Value>(data).is_ok() {
        return Some("json");
    }
    if looks_like_markdown(trimmed) {
        return Some("md");
    }
    Some("txt")
}

fn looks_like_markdown(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("# ")
            || line.starts_with("## ")
            || line.starts_with("```")
            || (line.starts_with('|') && line.ends_with('|') && line.contains("---"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_with(name: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_binary_magic() {
        assert_eq!(detect_format(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3"), Some("pdf"));
        assert_eq!(detect_format(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some("png"));
        assert_eq!(detect_format(b"\xFF\xD8\xFF\xE0\0\x10JFIF"), Some("jpeg"));
        assert_eq!(detect_format(b"GIF89a\x01\0\x01\0"), Some("gif"));
        assert_eq!(detect_format(b"II*\0\x08\0\0\0"), Some("tiff"));
        assert_eq!(detect_format(b"RIFF\x24\0\0\0WEBPVP8 "), Some("webp"));
    }

    #[test]
    fn test_detect_office_packages() {
        assert_eq!(detect_format(&zip_with("word/document.xml")), Some("docx"));
        assert_eq!(detect_format(&zip_with("ppt/presentation.xml")), Some("pptx"));
        assert_eq!(detect_format(&zip_with("xl/workbook.xml")), Some("xlsx"));
        assert_eq!(detect_format(&zip_with("other.txt")), None);
    }

    #[test]
    fn test_detect_text_formats() {
        assert_eq!(detect_format(br#"{"title": "x"}"#), Some("json"));
        assert_eq!(detect_format(b"{ not json"), Some("txt"));
        assert_eq!(detect_format(b"# Heading\n\nBody"), Some("md"));
        assert_eq!(detect_format("مرحبا بالعالم".as_bytes()), Some("txt"));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format(b""), None);
        assert_eq!(detect_format(&[0x00, 0x01, 0x02, 0xFE]), None);
    }

    #[test]
    fn test_extension() {
        assert_eq!(format_from_extension(Path::new("a/Report.DOCX")), Some("docx".to_string()));
        assert_eq!(format_from_extension(Path::new("README")), None);
    }

    #[test]
    fn test_detect_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4\n").unwrap();
        assert_eq!(detect_format_from_path(file.path()).unwrap(), Some("pdf"));
    }
}
