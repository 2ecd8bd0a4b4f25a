//! Text normalization applied by extractors before text enters the model.

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

static_regex!(url_regex, r"https?://[^\s<>()\[\]]+|www\.[^\s<>()\[\]]+");
static_regex!(hyphen_regex, r"([A-Za-z])-\n\s*([a-z])");
static_regex!(blank_line_regex, r"\n[ \t]*\n");

/// Normalize extracted text.
///
/// NFKC folds compatibility characters (Latin ligatures, Arabic presentation
/// forms) back to their base letters, so the model always holds logical text.
/// Private-use characters, replacement characters and directional marks are
/// dropped, runs of spaces collapse, and lines are trimmed.
pub fn clean_text(text: &str, preserve_newlines: bool) -> String {
    let normalized = fold(text);

    if preserve_newlines {
        normalized
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    } else {
        normalized.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// NFKC with noise characters removed and no-break spaces made plain.
///
/// Leaves whitespace runs alone, so text can be folded piecewise.
pub fn fold(text: &str) -> String {
    text.nfkc()
        .filter(|c| !is_noise(*c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// [`fold`] with a map from each input char offset (plus the end) to its
/// offset in the folded text.
///
/// A base character is folded together with the marks after it, so offsets
/// stay aligned when folding splits a ligature or composes an accent.
pub fn fold_mapped(text: &str) -> (String, Vec<usize>) {
    let mut out = String::with_capacity(text.len());
    let mut map = Vec::with_capacity(text.len() + 1);
    let mut len = 0;
    let mut cluster = String::new();

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        cluster.clear();
        cluster.push(c);
        let mut count = 1;
        while let Some(mark) = chars.next_if(|m| canonical_combining_class(*m) != 0) {
            cluster.push(mark);
            count += 1;
        }
        let folded = fold(&cluster);
        map.extend(std::iter::repeat(len).take(count));
        len += folded.chars().count();
        out.push_str(&folded);
    }
    map.push(len);
    (out, map)
}

/// Collapse whitespace runs to one space and trim, returning the new text
/// and a map from each old character offset (plus the end) to its new one.
pub fn collapse_whitespace(text: &str) -> (String, Vec<usize>) {
    let mut out = String::with_capacity(text.len());
    let mut map = Vec::with_capacity(text.len() + 1);
    let mut len = 0usize;
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            map.push(len);
            pending_space = len > 0;
            continue;
        }
        if pending_space {
            out.push(' ');
            len += 1;
            pending_space = false;
        }
        map.push(len);
        out.push(c);
        len += 1;
    }
    map.push(len);
    (out, map)
}

fn is_noise(c: char) -> bool {
    let code = c as u32;
    matches!(c, '\u{FFFD}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
        || (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}

/// Split text into paragraphs at blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let parts: Vec<String> = match blank_line_regex() {
        Some(re) => re.split(&normalized).map(str::to_string).collect(),
        None => normalized.split("\n\n").map(str::to_string).collect(),
    };
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Join lines hard-wrapped by the source into flowing text.
///
/// Words hyphenated across a line break are rejoined.
pub fn unwrap_lines(text: &str) -> String {
    let dehyphenated = match hyphen_regex() {
        Some(re) => re.replace_all(text, "$1$2").to_string(),
        None => text.to_string(),
    };
    dehyphenated.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A URL found in text, with character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundUrl {
    pub url: String,
    pub start: usize,
    pub end: usize,
}

/// Find URLs in text. Bare `www.` hosts get an `https://` scheme.
pub fn extract_urls(text: &str) -> Vec<FoundUrl> {
    let Some(re) = url_regex() else {
        return Vec::new();
    };
    re.find_iter(text)
        .map(|m| {
            let raw = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
            let start = text[..m.start()].chars().count();
            let end = start + raw.chars().count();
            let url = if raw.starts_with("www.") {
                format!("https://{}", raw)
            } else {
                raw.to_string()
            };
            FoundUrl { url, start, end }
        })
        .collect()
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
