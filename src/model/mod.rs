//! Canonical document model.
//!
//! Every extractor produces this representation and every converter consumes
//! it, so no source format ever talks directly to a target format. A
//! [`Document`] owns its [`Page`]s, each page owns its [`Block`]s, and image
//! payloads are owned by the [`Image`] block that carries them.
//!
//! Text stored in the model is always in logical order and unshaped.

mod document;
mod page;
mod paragraph;
mod position;
mod resource;
mod table;
pub mod validate;

pub use document::{
    Document, DocumentBuilder, ExtractionWarning, LinkRef, Metadata, Summary,
};
pub use page::{Block, BlockKind, Direction, Extensions, Page};
pub use paragraph::{Heading, InlineLink, Link, List, Paragraph, StyleSpan};
pub use position::{BoundingBox, PositionHint, PositionedText};
pub use resource::{detect_mime_type, mime_from_extension, Image, ImageSource};
pub use table::Table;
pub use validate::ValidationError;
