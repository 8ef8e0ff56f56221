//! Text canonicalization applied before segmentation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NEWLINE_RUN: Regex = Regex::new(r"\n+").expect("valid regex");
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").expect("valid regex");
    static ref NON_PRINTABLE: Regex = Regex::new(r"[^\x09\x0A\x0D\x20-\x7E]").expect("valid regex");
    static ref LINE_BREAKS: Regex = Regex::new(r"[\n\r\t]+").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Paragraph-preserving normalization.
///
/// Lowercases, drops carriage returns and turns every run of line breaks into
/// exactly one blank line, so each line break becomes a paragraph boundary.
/// Spaces and tabs collapse to a single space.
pub fn normalize_text(raw: &str) -> String {
    let text = raw.to_lowercase().replace('\r', "");
    let text = NEWLINE_RUN.replace_all(&text, "\n\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Flat normalization used with fixed-width chunking.
///
/// Anything outside printable ASCII (plus tab and line breaks) becomes a space,
/// and all line structure is flattened.
pub fn normalize_flat(raw: &str) -> String {
    let text = NON_PRINTABLE.replace_all(raw, " ");
    let text = text.to_lowercase();
    let text = LINE_BREAKS.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
