//! Helpers shared by the Office Open XML extractors.

use crate::error::{Error, Result};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Open a package, mapping failures to `CorruptInput`.
pub fn open_package<'a>(bytes: &'a [u8], format: &str) -> Result<ZipArchive<Cursor<&'a [u8]>>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::corrupt(format, e))
}

/// Read a package part as UTF-8 text. Missing parts give `None`.
pub fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Read a package part as bytes. Missing parts give `None`.
pub fn read_binary_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).ok()?;
    Some(content)
}

/// Attribute value by local name, ignoring the namespace prefix.
pub fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        let key = attr.key.local_name();
        if key.as_ref() == name.as_bytes() {
            let raw = std::str::from_utf8(&attr.value).ok()?;
            return unescape(raw).ok().map(|v| v.into_owned());
        }
    }
    None
}

/// A package relationship target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub target: String,
    pub kind: String,
    pub external: bool,
}

/// Parse a `.rels` part into id → relationship.
pub fn parse_relationships(xml: &str) -> HashMap<String, Relationship> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (get_attribute(e, "Id"), get_attribute(e, "Target")) {
                    let kind = get_attribute(e, "Type")
                        .and_then(|t| t.rsplit('/').next().map(str::to_string))
                        .unwrap_or_default();
                    let external = get_attribute(e, "TargetMode").as_deref() == Some("External");
                    rels.insert(
                        id,
                        Relationship {
                            target,
                            kind,
                            external,
                        },
                    );
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed relationships part: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Resolve a relationship target relative to the directory of its source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Core properties from `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub language: Option<String>,
}

/// Parse core properties.
pub fn parse_core_properties(xml: &str) -> CoreProperties {
    let mut props = CoreProperties::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::Text(ref t)) => {
                let value = t.unescape().map(|v| v.trim().to_string()).unwrap_or_default();
                if let (Some(name), false) = (current.as_deref(), value.is_empty()) {
                    match name {
                        b"title" => props.title = Some(value),
                        b"creator" => props.creator = Some(value),
                        b"subject" => props.subject = Some(value),
                        b"keywords" => {
                            props.keywords = value
                                .split([',', ';'])
                                .map(|k| k.trim().to_string())
                                .filter(|k| !k.is_empty())
                                .collect()
                        }
                        b"created" => props.created = Some(value),
                        b"modified" => props.modified = Some(value),
                        b"language" => props.language = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    props
}

impl CoreProperties {
    /// Copy into document metadata.
    pub fn apply(self, builder: &mut crate::model::DocumentBuilder) {
        if let Some(title) = self.title {
            builder.set_title(title);
        }
        let metadata = builder.metadata_mut();
        metadata.author = self.creator;
        metadata.subject = self.subject;
        metadata.keywords = self.keywords;
        metadata.language = self.language;
        metadata.created = self.created.as_deref().and_then(parse_timestamp);
        metadata.modified = self.modified.as_deref().and_then(parse_timestamp);
    }
}

fn parse_timestamp(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
