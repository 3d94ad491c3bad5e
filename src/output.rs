//! Result types returned by the translation pipeline.

use crate::pipeline::compile::CompileReport;
use serde::Serialize;
use std::path::PathBuf;

/// Aggregate statistics for one translated document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslationStats {
    /// Content blocks extracted from the document structure.
    pub total_blocks: usize,
    /// Blocks the backend translated successfully.
    pub translated_blocks: usize,
    /// Blocks that fell back to untranslated source text.
    pub degraded_blocks: usize,
    /// Blocks with no translatable text (no backend call made).
    pub skipped_blocks: usize,
    /// Protected formula spans isolated across all blocks.
    pub protected_spans: usize,
    /// Spans the translator dropped; re-attached at the end of their block
    /// behind a visible marker.
    pub displaced_spans: usize,
    /// Images extracted from the source and attached to the output.
    pub image_count: usize,
    /// Wall-clock spent in structure extraction.
    pub extract_duration_ms: u64,
    /// Wall-clock spent in translation dispatch.
    pub translate_duration_ms: u64,
    /// Wall-clock spent in the compile validator (0 when skipped).
    pub compile_duration_ms: u64,
    /// Total wall-clock for the document.
    pub total_duration_ms: u64,
}

/// The outcome of translating a single document.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutput {
    /// Path of the assembled LaTeX source.
    pub tex_path: PathBuf,
    /// Path of the compiled PDF, when compilation ran and succeeded.
    pub pdf_path: Option<PathBuf>,
    /// The assembled LaTeX source text.
    pub latex: String,
    /// Per-document statistics.
    pub stats: TranslationStats,
    /// Compiler report, when compilation ran.
    pub compile: Option<CompileReport>,
}

impl TranslationOutput {
    /// Whether any block fell back to untranslated text.
    ///
    /// A degraded document is still a successful one; callers that need
    /// stricter semantics can inspect the stats and decide for themselves.
    pub fn is_degraded(&self) -> bool {
        self.stats.degraded_blocks > 0
    }
}

/// One failed document in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a batch run over a directory of PDFs.
///
/// Per-document failures never abort the batch; they are collected here and
/// logged, and the caller maps `failed > 0` to a non-zero exit code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_summary_success_flag() {
        let mut summary = BatchSummary {
            total: 2,
            succeeded: 2,
            ..Default::default()
        };
        assert!(summary.all_succeeded());

        summary.failed = 1;
        summary.succeeded = 1;
        summary.failures.push(BatchFailure {
            path: PathBuf::from("broken.pdf"),
            reason: "structure extraction failed".into(),
        });
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = TranslationStats {
            total_blocks: 10,
            translated_blocks: 9,
            degraded_blocks: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"total_blocks\":10"));
        assert!(json.contains("\"degraded_blocks\":1"));
    }
}
