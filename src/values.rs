//! Value normalization for batch input

use crate::vocabulary::normalize;

const ADDRESS_HEADERS: &[&str] = &["from", "to", "reply address", "any recipient"];

/// Split raw user text on newlines and commas.
///
/// Pieces are trimmed and empty ones dropped. Order is kept and repeats
/// are not removed; a repeated value yields a repeated rule.
pub fn parse_values(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == '\n' || c == ',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// True if the header label names an address-bearing field.
pub fn is_address_header(header: &str) -> bool {
    let header = normalize(header);
    ADDRESS_HEADERS.contains(&header.as_str())
        || header.contains("email")
        || header.contains("e-mail")
}

/// Degrade pasted `Name <addr>` lists into comma-separated addresses for
/// address headers. Identity for every other header.
///
/// Display names in front of `<` are dropped, `>` becomes a separator and
/// separators at either end are trimmed.
pub fn normalize_for_header(raw: &str, header: &str) -> String {
    if !is_address_header(header) {
        return raw.to_string();
    }
    strip_display_names(raw)
        .replace('>', ",")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Remove every `<` together with the text between it and the previous
/// separator, keeping the whitespace that follows that separator.
fn strip_display_names(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut segment = String::new();
    for c in raw.chars() {
        match c {
            '<' => {
                let indent = segment.len() - segment.trim_start().len();
                out.push_str(&segment[..indent]);
                segment.clear();
            }
            ',' | '\n' | '>' => {
                out.push_str(&segment);
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(&segment);
    out
}
