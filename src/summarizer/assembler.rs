//! Final summary assembly.

use super::segmenter::Passage;
use std::collections::BTreeMap;

/// Sort by ordinal and drop repeated ordinals, keeping the first occurrence.
pub fn in_document_order(passages: impl IntoIterator<Item = Passage>) -> Vec<Passage> {
    let mut by_ordinal: BTreeMap<usize, Passage> = BTreeMap::new();
    for p in passages {
        by_ordinal.entry(p.ordinal).or_insert(p);
    }
    by_ordinal.into_values().collect()
}

/// Newline-joined text of already ordered passages.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Main text followed by pricing text. Pricing is appended, never interleaved.
pub fn assemble(main: &[Passage], pricing: &[Passage]) -> String {
    let main_text = join_passages(main);
    let pricing_text = join_passages(pricing);
    match (main_text.is_empty(), pricing_text.is_empty()) {
        (_, true) => main_text,
        (true, false) => pricing_text,
        (false, false) => format!("{}\n{}", main_text, pricing_text),
    }
}
