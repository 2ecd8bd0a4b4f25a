//! Rendering module for converting documents to various output formats.
//!
//! Each target walks the canonical model once through a shared
//! render context, which owns the shaper and records degradations.

mod context;
mod docx;
mod html;
mod inline;
mod json;
mod markdown;
mod result;
mod text;

pub use docx::to_docx;
pub use html::to_html;
pub use json::{to_json, JsonFormat};
pub use markdown::to_markdown;
pub use result::{Degradation, DegradeAction, RenderStats};
pub use text::to_text;
