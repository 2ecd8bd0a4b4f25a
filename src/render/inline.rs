//! Splitting paragraph text into uniformly styled runs.

use crate::model::Paragraph;

/// A run of paragraph text with one set of styles and at most one link.
///
/// `start` and `end` are char offsets into the paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'p> {
    pub start: usize,
    pub end: usize,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub url: Option<&'p str>,
}

impl Segment<'_> {
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline || self.strike) && self.url.is_none()
    }
}

/// Cut a paragraph at every span and link boundary.
///
/// Segments are contiguous and cover the whole text. Styles are ignored
/// unless `with_styles` is set; links are always kept. Offsets past the end
/// of the text are clamped.
pub(crate) fn segments(paragraph: &Paragraph, with_styles: bool) -> Vec<Segment<'_>> {
    let len = paragraph.text.chars().count();
    if len == 0 {
        return Vec::new();
    }

    let mut cuts = vec![0, len];
    if with_styles {
        for span in &paragraph.spans {
            cuts.push(span.start.min(len));
            cuts.push(span.end.min(len));
        }
    }
    for link in &paragraph.links {
        cuts.push(link.start.min(len));
        cuts.push(link.end.min(len));
    }
    cuts.sort_unstable();
    cuts.dedup();

    cuts.windows(2)
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            let covering = |s: usize, e: usize| s <= start && end <= e;
            let mut segment = Segment {
                start,
                end,
                bold: false,
                italic: false,
                underline: false,
                strike: false,
                url: paragraph
                    .links
                    .iter()
                    .find(|l| covering(l.start, l.end))
                    .map(|l| l.url.as_str()),
            };
            if with_styles {
                for span in paragraph.spans.iter().filter(|s| covering(s.start, s.end)) {
                    segment.bold |= span.bold;
                    segment.italic |= span.italic;
                    segment.underline |= span.underline;
                    segment.strike |= span.strike;
                }
            }
            segment
        })
        .collect()
}
