//! Arabic contextual glyph selection.
//!
//! Maps each Arabic letter to the presentation form matching its joining
//! context (isolated, final, initial, medial) and folds lam followed by an
//! alef into the mandatory ligature. Characters outside the table pass
//! through unchanged, which also leaves existing presentation forms alone.

/// Joining behavior of a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Connects on both sides
    Dual,
    /// Connects only to the preceding letter
    Right,
    /// Never connects (hamza)
    None,
    /// Tatweel: connects on both sides, has no forms of its own
    Causing,
}

/// Presentation forms: isolated, final, initial, medial.
#[derive(Debug, Clone, Copy)]
struct Forms {
    joining: Joining,
    isolated: char,
    fin: Option<char>,
    initial: Option<char>,
    medial: Option<char>,
}

const fn dual(iso: u32) -> Forms {
    Forms {
        joining: Joining::Dual,
        isolated: to_char(iso),
        fin: Some(to_char(iso + 1)),
        initial: Some(to_char(iso + 2)),
        medial: Some(to_char(iso + 3)),
    }
}

const fn right(iso: u32) -> Forms {
    Forms {
        joining: Joining::Right,
        isolated: to_char(iso),
        fin: Some(to_char(iso + 1)),
        initial: None,
        medial: None,
    }
}

const fn to_char(code: u32) -> char {
    match char::from_u32(code) {
        Some(c) => c,
        None => '\u{FFFD}',
    }
}

fn forms(c: char) -> Option<Forms> {
    let forms = match c {
        '\u{0621}' => Forms {
            joining: Joining::None,
            isolated: '\u{FE80}',
            fin: None,
            initial: None,
            medial: None,
        },
        '\u{0622}' => right(0xFE81),
        '\u{0623}' => right(0xFE83),
        '\u{0624}' => right(0xFE85),
        '\u{0625}' => right(0xFE87),
        '\u{0626}' => dual(0xFE89),
        '\u{0627}' => right(0xFE8D),
        '\u{0628}' => dual(0xFE8F),
        '\u{0629}' => right(0xFE93),
        '\u{062A}' => dual(0xFE95),
        '\u{062B}' => dual(0xFE99),
        '\u{062C}' => dual(0xFE9D),
        '\u{062D}' => dual(0xFEA1),
        '\u{062E}' => dual(0xFEA5),
        '\u{062F}' => right(0xFEA9),
        '\u{0630}' => right(0xFEAB),
        '\u{0631}' => right(0xFEAD),
        '\u{0632}' => right(0xFEAF),
        '\u{0633}' => dual(0xFEB1),
        '\u{0634}' => dual(0xFEB5),
        '\u{0635}' => dual(0xFEB9),
        '\u{0636}' => dual(0xFEBD),
        '\u{0637}' => dual(0xFEC1),
        '\u{0638}' => dual(0xFEC5),
        '\u{0639}' => dual(0xFEC9),
        '\u{063A}' => dual(0xFECD),
        '\u{0640}' => Forms {
            joining: Joining::Causing,
            isolated: '\u{0640}',
            fin: Some('\u{0640}'),
            initial: Some('\u{0640}'),
            medial: Some('\u{0640}'),
        },
        '\u{0641}' => dual(0xFED1),
        '\u{0642}' => dual(0xFED5),
        '\u{0643}' => dual(0xFED9),
        '\u{0644}' => dual(0xFEDD),
        '\u{0645}' => dual(0xFEE1),
        '\u{0646}' => dual(0xFEE5),
        '\u{0647}' => dual(0xFEE9),
        '\u{0648}' => right(0xFEED),
        '\u{0649}' => right(0xFEEF),
        '\u{064A}' => dual(0xFEF1),
        // Persian and Urdu letters
        '\u{067E}' => dual(0xFB56),
        '\u{0686}' => dual(0xFB7A),
        '\u{0698}' => right(0xFB8A),
        '\u{06A9}' => dual(0xFB8E),
        '\u{06AF}' => dual(0xFB92),
        '\u{06BA}' => right(0xFB9E),
        '\u{06C1}' => dual(0xFBA6),
        '\u{06CC}' => dual(0xFBFC),
        '\u{06D2}' => right(0xFBAE),
        _ => return None,
    };
    Some(forms)
}

/// Harakat and other marks that do not affect joining.
fn is_transparent(c: char) -> bool {
    matches!(c, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

/// Lam-alef ligature (isolated, final) for an alef variant.
fn lam_alef(alef: char) -> Option<(char, char)> {
    match alef {
        '\u{0622}' => Some(('\u{FEF5}', '\u{FEF6}')),
        '\u{0623}' => Some(('\u{FEF7}', '\u{FEF8}')),
        '\u{0625}' => Some(('\u{FEF9}', '\u{FEFA}')),
        '\u{0627}' => Some(('\u{FEFB}', '\u{FEFC}')),
        _ => None,
    }
}

fn joins_forward(c: char) -> bool {
    matches!(
        forms(c).map(|f| f.joining),
        Some(Joining::Dual | Joining::Causing)
    )
}

fn joins_backward(c: char) -> bool {
    matches!(
        forms(c).map(|f| f.joining),
        Some(Joining::Dual | Joining::Right | Joining::Causing)
    )
}

/// Select contextual presentation forms for every Arabic letter in `text`.
pub fn reshape(text: &str) -> String {
    reshape_mapped(text).0
}

/// Reshape `text` and report where each input char landed.
///
/// The map holds, for every char offset of the input plus its end, the char
/// offset in the output where that char starts. An alef folded into a
/// lam-alef ligature maps past the ligature and its marks, so it owns no
/// output of its own.
pub(crate) fn reshape_mapped(text: &str) -> (String, Vec<usize>) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut map = Vec::with_capacity(chars.len() + 1);
    let mut written = 0;

    let neighbor = |from: usize, forward: bool| -> Option<char> {
        if forward {
            chars[from + 1..].iter().copied().find(|c| !is_transparent(*c))
        } else {
            chars[..from].iter().rev().copied().find(|c| !is_transparent(*c))
        }
    };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let Some(f) = forms(c) else {
            map.push(written);
            out.push(c);
            written += 1;
            i += 1;
            continue;
        };

        let prev = neighbor(i, false);
        let joined_before = f.joining != Joining::None
            && prev.map(joins_forward).unwrap_or(false);

        if c == '\u{0644}' {
            let marks = chars[i + 1..].iter().take_while(|m| is_transparent(**m)).count();
            let alef = i + 1 + marks;
            if let Some((iso, fin)) = chars.get(alef).copied().and_then(lam_alef) {
                map.push(written);
                out.push(if joined_before { fin } else { iso });
                written += 1;
                for mark in &chars[i + 1..alef] {
                    map.push(written);
                    out.push(*mark);
                    written += 1;
                }
                map.push(written);
                i = alef + 1;
                continue;
            }
        }

        let joined_after = matches!(f.joining, Joining::Dual | Joining::Causing)
            && neighbor(i, true).map(joins_backward).unwrap_or(false);

        let glyph = match (joined_before, joined_after) {
            (true, true) => f.medial.or(f.fin),
            (true, false) => f.fin,
            (false, true) => f.initial,
            (false, false) => None,
        }
        .unwrap_or(f.isolated);

        map.push(written);
        out.push(glyph);
        written += 1;
        i += 1;
    }
    map.push(written);

    (out, map)
}

/// Check if `text` already holds Arabic presentation forms.
pub fn has_presentation_forms(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}'))
}
