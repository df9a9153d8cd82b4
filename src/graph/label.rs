//! Label sanitizing and name canonicalization
//!
//! Everything here is pure and deterministic: re-ingesting the same record
//! must always land on the same label and the same node key.

/// Prefix used when a sanitized label would be empty or start with a digit.
pub const LABEL_PREFIX: &str = "Entity";

/// Separator between constituent concept names in a JointConcept name.
pub const JOINT_SEPARATOR: char = '+';

/// Turn a free-text type string into a valid graph label.
///
/// Splits on every run of characters outside `[A-Za-z0-9]`, upper-cases the
/// first character of each token and concatenates. Labels that come out empty
/// or start with a digit get the [`LABEL_PREFIX`].
///
/// ```
/// use mythograph::sanitize_label;
///
/// assert_eq!(sanitize_label("symbolic motif"), "SymbolicMotif");
/// assert_eq!(sanitize_label("3d object"), "Entity3dObject");
/// assert_eq!(sanitize_label("예술·체육"), "Entity");
/// ```
pub fn sanitize_label(raw: &str) -> String {
    let label: String = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    match label.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => label,
        _ => format!("{}{}", LABEL_PREFIX, label),
    }
}

/// Canonical form of an entity name.
///
/// Folds typographic punctuation and accented Latin letters to ASCII,
/// collapses whitespace, trims surrounding punctuation and title-cases every
/// word. Scripts with no ASCII spelling (Hangul, Han, ...) are kept as written
/// so that non-Latin names stay distinct.
pub fn canonical_name(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    for c in raw.chars().map(fold_punctuation) {
        match fold_latin(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"')
    });

    let mut out = String::with_capacity(trimmed.len());
    let mut at_word_start = true;
    for c in trimmed.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace() || c == '-' || c == JOINT_SEPARATOR;
    }
    out
}

/// Key used for exact-match deduplication: lower-cased, alphanumerics only.
pub fn normalized_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Deterministic JointConcept name for a set of concept names.
///
/// Sorted, de-duplicated and joined with `+`, so the same concept set yields
/// the same name regardless of input order.
pub fn joint_concept_name<S: AsRef<str>>(concepts: &[S]) -> String {
    let mut names: Vec<&str> = concepts.iter().map(|s| s.as_ref()).collect();
    names.sort_unstable();
    names.dedup();
    names.join(&JOINT_SEPARATOR.to_string())
}

fn fold_punctuation(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
        '\u{00B7}' | '\u{30FB}' | '\u{2022}' | '_' => ' ',
        '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{3000}' => ' ',
        other => other,
    }
}

/// ASCII spelling of an accented Latin letter
fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Đ' | 'Ð' => "D",
        'ď' | 'đ' | 'ð' => "d",
        'È'..='Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì'..='Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ì'..='ï' | 'ī' | 'į' | 'ı' => "i",
        'Ł' | 'Ľ' => "L",
        'ł' | 'ľ' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Ş' | 'Š' => "S",
        'ś' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        'Þ' => "Th",
        'þ' => "th",
        'Ù'..='Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(ascii)
}
