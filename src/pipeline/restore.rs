//! Span restoration: swap placeholder tokens back for protected content.
//!
//! The translated text is untrusted: a model may move, drop, or duplicate
//! the `__FORMULA_i__` tokens it was asked to preserve. Restoration walks
//! spans in ascending block-local order and replaces the **first remaining
//! occurrence** of each token with the span's original content wrapped in
//! restoration markers:
//!
//! ```text
//! [[SPAN_START_{block}_{i}]]content[[SPAN_END_{block}_{i}]]
//! ```
//!
//! The assembler later emits marker interiors verbatim and escapes
//! everything else. Two recovery rules keep formulas from vanishing:
//!
//! * A token missing from the translation gets its span **appended** at the
//!   end of the block behind a visible displaced-formula note — a misplaced
//!   formula is annoying, a silently lost one is wrong.
//! * Duplicate token occurrences beyond the first are deleted as literal
//!   text.

use crate::document::ContentBlock;
use crate::pipeline::isolate::placeholder;
use tracing::warn;

/// Visible note attached in front of a span the translator displaced.
pub const DISPLACED_NOTE: &str = "[displaced formula]";

/// Counters produced by one restoration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Spans restored at their placeholder position.
    pub restored: usize,
    /// Spans appended at the block end because their token was missing.
    pub displaced: usize,
}

/// Restore every block's protected spans in place.
pub fn restore_spans(blocks: &mut [ContentBlock]) -> RestoreOutcome {
    let mut outcome = RestoreOutcome::default();
    for block in blocks.iter_mut() {
        let one = restore_block(block);
        outcome.restored += one.restored;
        outcome.displaced += one.displaced;
    }
    outcome
}

/// Restore one block's spans inside its translated text.
pub fn restore_block(block: &mut ContentBlock) -> RestoreOutcome {
    let mut outcome = RestoreOutcome::default();
    if block.protected_spans.is_empty() {
        return outcome;
    }

    let mut text = std::mem::take(&mut block.translated_text);

    for (i, span) in block.protected_spans.iter().enumerate() {
        let token = placeholder(i);
        let wrapped = format!(
            "[[SPAN_START_{idx}_{i}]]{span}[[SPAN_END_{idx}_{i}]]",
            idx = block.index
        );

        match text.find(&token) {
            Some(pos) => {
                text.replace_range(pos..pos + token.len(), &wrapped);
                outcome.restored += 1;
            }
            None => {
                warn!(
                    "block {}: placeholder {token} missing from translation, appending span",
                    block.index
                );
                if !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                text.push_str(DISPLACED_NOTE);
                text.push(' ');
                text.push_str(&wrapped);
                outcome.displaced += 1;
            }
        }

        // Any occurrence left now is a duplicate the translator invented.
        while let Some(pos) = text.find(&token) {
            warn!("block {}: removing duplicated placeholder {token}", block.index);
            text.replace_range(pos..pos + token.len(), "");
        }
    }

    block.translated_text = text;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, ContentBlock};

    fn block_with(index: usize, translated: &str, spans: &[&str]) -> ContentBlock {
        let mut b = ContentBlock::new(index, BlockKind::FormulaParagraph, "");
        b.translated_text = translated.to_string();
        b.protected_spans = spans.iter().map(|s| s.to_string()).collect();
        b
    }

    #[test]
    fn restores_span_at_placeholder_position() {
        let mut b = block_with(0, "Enerji __FORMULA_0__ ünlüdür", &["E=mc^2"]);
        let outcome = restore_block(&mut b);
        assert_eq!(
            b.translated_text,
            "Enerji [[SPAN_START_0_0]]E=mc^2[[SPAN_END_0_0]] ünlüdür"
        );
        assert_eq!(outcome, RestoreOutcome { restored: 1, displaced: 0 });
    }

    #[test]
    fn markers_carry_document_block_index() {
        let mut b = block_with(17, "__FORMULA_0__", &["x"]);
        restore_block(&mut b);
        assert_eq!(b.translated_text, "[[SPAN_START_17_0]]x[[SPAN_END_17_0]]");
    }

    #[test]
    fn missing_placeholder_appends_span_with_note() {
        let mut b = block_with(3, "translator ate the token", &["\\alpha"]);
        let outcome = restore_block(&mut b);
        assert_eq!(outcome, RestoreOutcome { restored: 0, displaced: 1 });
        assert_eq!(
            b.translated_text,
            "translator ate the token [displaced formula] [[SPAN_START_3_0]]\\alpha[[SPAN_END_3_0]]"
        );
    }

    #[test]
    fn duplicate_placeholders_keep_only_the_first() {
        let mut b = block_with(0, "a __FORMULA_0__ b __FORMULA_0__ c", &["x+y"]);
        let outcome = restore_block(&mut b);
        assert_eq!(outcome.restored, 1);
        assert_eq!(
            b.translated_text,
            "a [[SPAN_START_0_0]]x+y[[SPAN_END_0_0]] b  c"
        );
    }

    #[test]
    fn spans_restore_in_ascending_order() {
        let mut b = block_with(0, "__FORMULA_0__ then __FORMULA_1__", &["first", "second"]);
        let outcome = restore_block(&mut b);
        assert_eq!(outcome.restored, 2);
        assert_eq!(
            b.translated_text,
            "[[SPAN_START_0_0]]first[[SPAN_END_0_0]] then [[SPAN_START_0_1]]second[[SPAN_END_0_1]]"
        );
    }

    #[test]
    fn reordered_placeholders_still_restore_by_token_identity() {
        // The translator swapped the tokens; each token still gets its own
        // span content, so no formula is lost.
        let mut b = block_with(0, "__FORMULA_1__ before __FORMULA_0__", &["zero", "one"]);
        let outcome = restore_block(&mut b);
        assert_eq!(outcome.restored, 2);
        assert!(b.translated_text.contains("[[SPAN_START_0_0]]zero[[SPAN_END_0_0]]"));
        assert!(b.translated_text.contains("[[SPAN_START_0_1]]one[[SPAN_END_0_1]]"));
    }

    #[test]
    fn block_without_spans_is_untouched() {
        let mut b = block_with(0, "plain translated text", &[]);
        let outcome = restore_block(&mut b);
        assert_eq!(outcome, RestoreOutcome::default());
        assert_eq!(b.translated_text, "plain translated text");
    }
}
