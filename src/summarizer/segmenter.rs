//! Passage segmentation.
//!
//! Two strategies are supported. Paragraph-aware segmentation splits on blank
//! lines and merges or cuts fragments to stay within `[min_len, max_len]`
//! characters. Fixed-width segmentation cuts the (flattened) text into
//! non-overlapping windows. Either way, passages that mention a currency
//! amount are routed to a separate money stream.

use super::money::contains_money;
use super::normalizer::{normalize_flat, normalize_text};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref BLANK_LINE: Regex = Regex::new(r"\n\s*\n+").expect("valid regex");
}

/// A contiguous span of normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Position in the document. Main and money passages share this space.
    pub ordinal: usize,
}

impl Passage {
    pub fn new(text: impl Into<String>, ordinal: usize) -> Self {
        Self {
            text: text.into(),
            ordinal,
        }
    }
}

/// Which segmentation (and matching normalization) to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    #[default]
    Paragraph,
    FixedWidth,
}

impl SegmentationStrategy {
    /// Normalize `raw` the way this strategy expects.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            Self::Paragraph => normalize_text(raw),
            Self::FixedWidth => normalize_flat(raw),
        }
    }
}

impl std::fmt::Display for SegmentationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paragraph => write!(f, "paragraph"),
            Self::FixedWidth => write!(f, "fixed_width"),
        }
    }
}

/// Output of segmentation: the main stream and the diverted money stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub passages: Vec<Passage>,
    pub money: Vec<Passage>,
}

impl Segmented {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty() && self.money.is_empty()
    }
}

/// Segmenter configured with length bounds for both strategies.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    pub strategy: SegmentationStrategy,
    pub min_len: usize,
    pub max_len: usize,
    pub chunk_len: usize,
}

impl Segmenter {
    /// Segment already-normalized text and route money passages.
    pub fn segment(&self, normalized: &str) -> Segmented {
        let fragments = match self.strategy {
            SegmentationStrategy::Paragraph => {
                split_paragraphs(normalized, self.min_len, self.max_len)
            }
            SegmentationStrategy::FixedWidth => split_fixed(normalized, self.chunk_len),
        };
        route_money(fragments)
    }
}

/// Paragraph-aware split with a merge buffer for short fragments.
///
/// Lengths are counted in characters.
pub fn split_paragraphs(text: &str, min_len: usize, max_len: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for fragment in BLANK_LINE.split(text) {
        let mut p = fragment.to_string();
        if !buffer.is_empty() {
            p = format!("{} {}", buffer, p);
            buffer.clear();
        }

        let len = p.chars().count();
        if len < min_len {
            buffer = p;
        } else if len > max_len {
            let chars: Vec<char> = p.chars().collect();
            for window in chars.chunks(max_len.max(1)) {
                let window: String = window.iter().collect();
                let chunk = window.trim();
                if chunk.is_empty() {
                    continue;
                }
                if chunk.chars().count() >= min_len {
                    merged.push(chunk.to_string());
                } else if let Some(last) = merged.last_mut() {
                    last.push(' ');
                    last.push_str(chunk);
                } else {
                    merged.push(chunk.to_string());
                }
            }
        } else {
            let trimmed = p.trim();
            if !trimmed.is_empty() {
                merged.push(trimmed.to_string());
            }
        }
    }

    let leftover = buffer.trim();
    if !leftover.is_empty() {
        match merged.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(leftover);
            }
            None => merged.push(leftover.to_string()),
        }
    }

    merged
}

/// Non-overlapping windows of `length` characters. Blank windows are skipped.
pub fn split_fixed(text: &str, length: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(length.max(1))
        .map(|w| w.iter().collect::<String>().trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Number fragments in emission order and divert those mentioning money.
pub fn route_money(fragments: Vec<String>) -> Segmented {
    let mut out = Segmented::default();
    for (ordinal, text) in fragments.into_iter().enumerate() {
        let passage = Passage::new(text, ordinal);
        if contains_money(&passage.text) {
            out.money.push(passage);
        } else {
            out.passages.push(passage);
        }
    }
    out
}
