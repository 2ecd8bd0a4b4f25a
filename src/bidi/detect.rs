//! Direction detection from strong bidirectional character classes.

use crate::model::Direction;
use unicode_bidi::{bidi_class, BidiClass};

/// Counts of strong-direction characters in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrongCounts {
    /// Characters of class `L`
    pub ltr: usize,
    /// Characters of class `R` or `AL`
    pub rtl: usize,
}

impl StrongCounts {
    /// Count strong characters in `text`.
    pub fn of(text: &str) -> Self {
        let mut counts = StrongCounts::default();
        counts.add(text);
        counts
    }

    /// Accumulate another text.
    pub fn add(&mut self, text: &str) {
        for c in text.chars() {
            match bidi_class(c) {
                BidiClass::L => self.ltr += 1,
                BidiClass::R | BidiClass::AL => self.rtl += 1,
                _ => {}
            }
        }
    }

    /// Majority class. No strong characters gives `Auto`; a tie gives `Ltr`.
    pub fn direction(&self) -> Direction {
        if self.ltr == 0 && self.rtl == 0 {
            Direction::Auto
        } else if self.rtl > self.ltr {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

/// Classify a text as `ltr`, `rtl`, or `auto`.
///
/// Digits, punctuation and whitespace carry no strong direction, so a string
/// made only of them is `auto` and defers to the enclosing document.
pub fn detect_direction(text: &str) -> Direction {
    StrongCounts::of(text).direction()
}

/// Direction of a text whose source format carries a direction flag.
///
/// The text decides; the flag only applies when the text is neutral.
pub fn detect_direction_hinted(text: &str, hint: Direction) -> Direction {
    match detect_direction(text) {
        Direction::Auto => hint,
        detected => detected,
    }
}

/// Majority direction across several texts, weighted by character count.
pub fn dominant_direction<'a>(texts: impl IntoIterator<Item = &'a str>) -> Direction {
    let mut counts = StrongCounts::default();
    for text in texts {
        counts.add(text);
    }
    counts.direction()
}

/// Check for characters from the Arabic blocks.
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}')
    })
}

/// Check for characters from the Hebrew block.
pub fn contains_hebrew(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{0590}'..='\u{05FF}' | '\u{FB1D}'..='\u{FB4F}'))
}

/// Check for any right-to-left script (Arabic or Hebrew).
pub fn is_rtl_script(text: &str) -> bool {
    contains_arabic(text) || contains_hebrew(text)
}

/// Language tag guessed from script, used for OCR and metadata.
pub fn script_language(text: &str) -> Option<&'static str> {
    if contains_arabic(text) {
        Some("ar")
    } else if contains_hebrew(text) {
        Some("he")
    } else if text.chars().any(|c| c.is_ascii_alphabetic()) {
        Some("en")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_is_rtl() {
        assert_eq!(detect_direction("مرحبا بالعالم"), Direction::Rtl);
    }

    #[test]
    fn test_hebrew_is_rtl() {
        assert_eq!(detect_direction("שלום"), Direction::Rtl);
    }

    #[test]
    fn test_latin_is_ltr() {
        assert_eq!(detect_direction("Hello world"), Direction::Ltr);
    }

    #[test]
    fn test_digits_are_auto() {
        assert_eq!(detect_direction("12345"), Direction::Auto);
        assert_eq!(detect_direction("3.14 - 42!"), Direction::Auto);
        assert_eq!(detect_direction(""), Direction::Auto);
        assert_eq!(detect_direction("١٢٣"), Direction::Auto);
    }

    #[test]
    fn test_mixed_majority() {
        // 5 Arabic letters against 2 Latin letters
        assert_eq!(detect_direction("مرحبا OK"), Direction::Rtl);
        // 5 Latin letters against 2 Arabic letters
        assert_eq!(detect_direction("Hello يا"), Direction::Ltr);
    }

    #[test]
    fn test_tie_is_ltr() {
        assert_eq!(detect_direction("ab يا"), Direction::Ltr);
    }

    #[test]
    fn test_hint_only_for_neutral_text() {
        assert_eq!(detect_direction_hinted("Hello", Direction::Rtl), Direction::Ltr);
        assert_eq!(detect_direction_hinted("مرحبا", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect_direction_hinted("42", Direction::Rtl), Direction::Rtl);
        assert_eq!(detect_direction_hinted("42", Direction::Auto), Direction::Auto);
    }

    #[test]
    fn test_dominant_direction() {
        let texts = ["Hi", "مرحبا بكم", "123"];
        assert_eq!(dominant_direction(texts.iter().copied()), Direction::Rtl);
    }

    #[test]
    fn test_script_language() {
        assert_eq!(script_language("مرحبا"), Some("ar"));
        assert_eq!(script_language("Hello"), Some("en"));
        assert_eq!(script_language("42"), None);
    }

    #[test]
    fn test_is_rtl_script() {
        assert!(is_rtl_script("abc שלום"));
        assert!(is_rtl_script("\u{FEE3}"));
        assert!(!is_rtl_script("Hello 123"));
    }
}
