//! Direction detection and glyph shaping for right-to-left scripts.
//!
//! Two independent concerns live here:
//!
//! - **Detection** classifies a text as `ltr`, `rtl` or `auto` by majority
//!   of strong bidirectional classes. Extractors run it per block.
//! - **Shaping** selects joined Arabic glyph forms and, for targets that
//!   display characters in stored order, reorders text into visual order.
//!   Converters apply it once, as text leaves the canonical model.

mod arabic;
mod detect;
mod shape;

pub use arabic::{has_presentation_forms, reshape};
pub use detect::{
    contains_arabic, contains_hebrew, detect_direction, detect_direction_hinted, dominant_direction, is_rtl_script,
    script_language, StrongCounts,
};
pub use shape::{LogicalText, ShapedText, Shaper, ShapingMode};

use crate::model::Direction;

/// Direction a converter renders a text value with.
///
/// Uses the declared direction and falls back to the text itself when the
/// whole chain is `auto`; text with no strong characters renders `ltr`.
pub fn render_direction(declared: Direction, text: &str) -> Direction {
    match declared {
        Direction::Auto => match detect_direction(text) {
            Direction::Auto => Direction::Ltr,
            detected => detected,
        },
        explicit => explicit,
    }
}
