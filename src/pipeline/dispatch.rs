//! Translation dispatch: drive the backend across all blocks, failing open.
//!
//! ## Failure policy
//!
//! One unreachable backend call must not cost the user the whole document.
//! When translation fails for a block — transport error, malformed response,
//! empty output — the dispatcher logs it and keeps the block's untranslated
//! placeholder text. The document is still produced; the stats mark it
//! degraded. Blocks with no translatable text are skipped without a call.
//!
//! ## Granularity
//!
//! `Block` granularity sends one request per block: the failure blast radius
//! is one block, and placeholder bookkeeping is trivial. `Page` granularity
//! batches consecutive blocks behind a single request, joined by the inert
//! `__BLOCK_BREAK__` separator; when a backend does not return the separator
//! intact the group is transparently retried block by block, so the worst
//! case degenerates to `Block` behaviour plus one wasted call.

use crate::config::{Granularity, TranslationConfig};
use crate::document::ContentBlock;
use crate::error::BlockError;
use crate::service::TranslationService;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator between blocks in a `Page`-granularity request. Same inert
/// alphabet as the formula placeholders.
pub const BLOCK_BREAK: &str = "__BLOCK_BREAK__";

/// Counters produced by one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Blocks translated by the backend.
    pub translated: usize,
    /// Blocks that fell back to untranslated source text.
    pub degraded: usize,
    /// Blocks with empty plain text (no call made).
    pub skipped: usize,
}

/// Translate every block in place, per the configured granularity.
pub async fn translate_blocks(
    service: &Arc<dyn TranslationService>,
    blocks: &mut [ContentBlock],
    config: &TranslationConfig,
) -> DispatchOutcome {
    debug!(
        "Dispatching {} blocks to '{}' backend ({:?} granularity)",
        blocks.len(),
        service.name(),
        config.granularity
    );
    match config.granularity {
        Granularity::Block => per_block(service, blocks, config).await,
        Granularity::Page => paged(service, blocks, config).await,
    }
}

async fn per_block(
    service: &Arc<dyn TranslationService>,
    blocks: &mut [ContentBlock],
    config: &TranslationConfig,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for block in blocks.iter_mut() {
        if block.plain_text.is_empty() {
            block.translated_text = String::new();
            outcome.skipped += 1;
            continue;
        }
        let text =
            translate_or_fallback(service, block.index, &block.plain_text, config, &mut outcome)
                .await;
        block.translated_text = text;
    }
    outcome
}

async fn paged(
    service: &Arc<dyn TranslationService>,
    blocks: &mut [ContentBlock],
    config: &TranslationConfig,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let separator = format!("\n\n{BLOCK_BREAK}\n\n");

    for group in group_ranges(blocks.len(), config.page_block_count) {
        let mut members: Vec<usize> = Vec::new();
        for i in group.clone() {
            if blocks[i].plain_text.is_empty() {
                blocks[i].translated_text = String::new();
                outcome.skipped += 1;
            } else {
                members.push(i);
            }
        }
        if members.is_empty() {
            continue;
        }

        if members.len() > 1 {
            let joined: String = members
                .iter()
                .map(|&i| blocks[i].plain_text.as_str())
                .collect::<Vec<_>>()
                .join(&separator);

            match service
                .translate(&joined, &config.source_lang, &config.target_lang)
                .await
            {
                Ok(translated) => {
                    let parts: Vec<&str> =
                        translated.split(BLOCK_BREAK).map(str::trim).collect();
                    if parts.len() == members.len() && parts.iter().all(|p| !p.is_empty()) {
                        for (&i, part) in members.iter().zip(parts) {
                            blocks[i].translated_text = part.to_string();
                        }
                        outcome.translated += members.len();
                        continue;
                    }
                    warn!(
                        "blocks {}..{}: backend returned {} parts for {} blocks, retrying block by block",
                        group.start,
                        group.end,
                        parts.len(),
                        members.len()
                    );
                }
                Err(e) => {
                    warn!(
                        "blocks {}..{}: group translation failed ({e}), retrying block by block",
                        group.start, group.end
                    );
                }
            }
        }

        // Single-member groups and fallback after a group mismatch.
        for &i in &members {
            let text =
                translate_or_fallback(service, blocks[i].index, &blocks[i].plain_text, config, &mut outcome)
                    .await;
            blocks[i].translated_text = text;
        }
    }
    outcome
}

/// Consecutive index ranges of at most `per_page` blocks each.
fn group_ranges(len: usize, per_page: usize) -> Vec<Range<usize>> {
    let per_page = per_page.max(1);
    (0..len)
        .step_by(per_page)
        .map(|start| start..(start + per_page).min(len))
        .collect()
}

/// One backend call for one block; on any failure keep the source text.
async fn translate_or_fallback(
    service: &Arc<dyn TranslationService>,
    index: usize,
    plain: &str,
    config: &TranslationConfig,
    outcome: &mut DispatchOutcome,
) -> String {
    match service
        .translate(plain, &config.source_lang, &config.target_lang)
        .await
    {
        Ok(translated) if !translated.trim().is_empty() => {
            outcome.translated += 1;
            translated
        }
        Ok(_) => {
            warn!("block {index}: backend returned empty output, keeping source text");
            outcome.degraded += 1;
            plain.to_string()
        }
        Err(e) => {
            let err = BlockError::TranslationFailed {
                block: index,
                detail: e.to_string(),
            };
            warn!("{err}; keeping source text");
            outcome.degraded += 1;
            plain.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, ContentBlock};
    use crate::error::BlockError;
    use crate::service::TranslationService;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases input; errors when the text contains `fail`; counts calls.
    struct UppercasingService {
        calls: AtomicUsize,
    }

    impl UppercasingService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TranslationService for UppercasingService {
        async fn translate(
            &self,
            text: &str,
            _source_lang: &str,
            _target_lang: &str,
        ) -> Result<String, BlockError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fail") {
                return Err(BlockError::ServiceUnavailable {
                    detail: "mock outage".into(),
                });
            }
            Ok(text.to_uppercase())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn blocks_from(texts: &[&str]) -> Vec<ContentBlock> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut b = ContentBlock::new(i, BlockKind::Paragraph, *t);
                b.plain_text = t.to_string();
                b
            })
            .collect()
    }

    fn config(granularity: Granularity) -> TranslationConfig {
        TranslationConfig::builder()
            .granularity(granularity)
            .page_block_count(3)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn block_granularity_translates_each_block() {
        let service = UppercasingService::new();
        let dyn_service: Arc<dyn TranslationService> = service.clone();
        let mut blocks = blocks_from(&["one", "two"]);

        let outcome = translate_blocks(&dyn_service, &mut blocks, &config(Granularity::Block)).await;

        assert_eq!(outcome, DispatchOutcome { translated: 2, degraded: 0, skipped: 0 });
        assert_eq!(blocks[0].translated_text, "ONE");
        assert_eq!(blocks[1].translated_text, "TWO");
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_degrades_only_the_affected_block() {
        let service: Arc<dyn TranslationService> = UppercasingService::new();
        let mut blocks = blocks_from(&["good", "this will fail", "also good"]);

        let outcome = translate_blocks(&service, &mut blocks, &config(Granularity::Block)).await;

        assert_eq!(outcome.translated, 2);
        assert_eq!(outcome.degraded, 1);
        assert_eq!(blocks[0].translated_text, "GOOD");
        assert_eq!(blocks[1].translated_text, "this will fail"); // untouched source text
        assert_eq!(blocks[2].translated_text, "ALSO GOOD");
    }

    #[tokio::test]
    async fn empty_blocks_make_no_backend_calls() {
        let service = UppercasingService::new();
        let dyn_service: Arc<dyn TranslationService> = service.clone();
        let mut blocks = blocks_from(&["text", "", "more"]);

        let outcome = translate_blocks(&dyn_service, &mut blocks, &config(Granularity::Block)).await;

        assert_eq!(outcome.skipped, 1);
        assert_eq!(blocks[1].translated_text, "");
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn page_granularity_groups_consecutive_blocks() {
        let service = UppercasingService::new();
        let dyn_service: Arc<dyn TranslationService> = service.clone();
        let mut blocks = blocks_from(&["a", "b", "c", "d"]);

        let outcome = translate_blocks(&dyn_service, &mut blocks, &config(Granularity::Page)).await;

        // Two groups (3 + 1): one joined call, one single call. The mock
        // uppercases, which keeps the separator intact.
        assert_eq!(outcome.translated, 4);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(blocks[0].translated_text, "A");
        assert_eq!(blocks[3].translated_text, "D");
    }

    /// Swallows the separator, as a sloppy model would, but translates
    /// individual blocks fine.
    struct SeparatorEatingService;

    #[async_trait]
    impl TranslationService for SeparatorEatingService {
        async fn translate(
            &self,
            text: &str,
            _source_lang: &str,
            _target_lang: &str,
        ) -> Result<String, BlockError> {
            Ok(text.replace(BLOCK_BREAK, "").to_uppercase())
        }

        fn name(&self) -> &str {
            "separator-eater"
        }
    }

    #[tokio::test]
    async fn page_granularity_falls_back_per_block_on_separator_loss() {
        let service: Arc<dyn TranslationService> = Arc::new(SeparatorEatingService);
        let mut blocks = blocks_from(&["a", "b", "c"]);

        let outcome = translate_blocks(&service, &mut blocks, &config(Granularity::Page)).await;

        assert_eq!(outcome.translated, 3);
        assert_eq!(blocks[0].translated_text, "A");
        assert_eq!(blocks[1].translated_text, "B");
        assert_eq!(blocks[2].translated_text, "C");
    }

    #[test]
    fn group_ranges_cover_every_index_once() {
        let ranges = group_ranges(7, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..7]);
        assert_eq!(group_ranges(0, 3), Vec::<Range<usize>>::new());
        assert_eq!(group_ranges(2, 8), vec![0..2]);
    }
}
