//! Protected-span isolation: fence formulas behind placeholder tokens.
//!
//! Machine translation must never see formula content — a model will happily
//! "translate" `E=mc^2`. For the i-th formula span found in a block
//! (0-based, left-to-right) we store its exact inner content in
//! `protected_spans[i]` and substitute the token `__FORMULA_i__` in the text
//! sent for translation.
//!
//! The tokens are deliberately boring: ASCII letters, digits, and
//! underscores only, so neither the translator nor the LaTeX escaper has any
//! reason to alter them, and they are unique within a block by construction.
//! Indices come straight from scan order over the discovered spans — no
//! captured counters, no hidden state.

use crate::document::ContentBlock;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_FORMULA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<formula>(.*?)</formula>").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The placeholder token standing in for block-local span `i`.
pub fn placeholder(i: usize) -> String {
    format!("__FORMULA_{i}__")
}

/// Isolate the protected spans of every block. Returns the total span count.
pub fn isolate_spans(blocks: &mut [ContentBlock]) -> usize {
    let mut total = 0;
    for block in blocks.iter_mut() {
        isolate_block(block);
        total += block.protected_spans.len();
    }
    total
}

/// Fill `protected_spans` and `plain_text` for one block.
///
/// A block with zero formula spans passes through with its plain text
/// unchanged (modulo whitespace normalisation) and an empty span list.
pub fn isolate_block(block: &mut ContentBlock) {
    let mut spans: Vec<String> = Vec::new();
    let mut replaced = String::with_capacity(block.raw_markup.len());
    let mut last = 0usize;

    for (i, caps) in RE_FORMULA.captures_iter(&block.raw_markup).enumerate() {
        let whole = caps.get(0).expect("match 0 always present");
        let inner = caps.get(1).expect("capture 1 always present");
        replaced.push_str(&block.raw_markup[last..whole.start()]);
        replaced.push_str(&placeholder(i));
        spans.push(inner.as_str().trim().to_string());
        last = whole.end();
    }
    replaced.push_str(&block.raw_markup[last..]);

    let plain = RE_WHITESPACE.replace_all(replaced.trim(), " ").into_owned();

    block.protected_spans = spans;
    block.plain_text = plain;
}
