//! Whole-document and batch entry points.
//!
//! One document runs the stages strictly in sequence: extract → isolate →
//! dispatch → restore → images → assemble → compile. Each stage completes
//! for all blocks before the next begins, and data only flows forward.
//! A batch is the trivial loop over that: documents are independent (no
//! shared mutable state), a failed document is logged and abandoned, and the
//! batch proceeds to the next.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::output::{BatchFailure, BatchSummary, TranslationOutput, TranslationStats};
use crate::pipeline::{assemble, compile, dispatch, extract, images, input, isolate, restore};
use crate::service::{HttpTranslationService, NoopTranslationService, TranslationService};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Translate one PDF document into a compiled, typeset artifact.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_path` — local PDF file
/// * `config` — translation configuration
///
/// # Returns
/// `Ok(TranslationOutput)` on success, even if some blocks fell back to
/// untranslated text (check `output.is_degraded()`).
///
/// # Errors
/// Returns `Err(TranslateError)` only for failures that are fatal for this
/// document: unreadable input, structure-extraction failure, output write
/// failure, or a failed compile.
pub async fn translate_document(
    input_path: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve input and backend ────────────────────────────────
    let pdf_path = input::resolve_pdf(input_path)?;
    info!("Starting translation: {}", pdf_path.display());
    let service = resolve_service(config)?;

    let out_dir = config.output_dir.clone();
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| TranslateError::OutputWriteFailed {
            path: out_dir.clone(),
            source: e,
        })?;

    // ── Step 2: Structure extraction ─────────────────────────────────────
    let extract_start = Instant::now();
    let tei = extract::fetch_tei(&pdf_path, config).await?;
    let mut blocks = extract::parse_blocks(&tei);
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    if blocks.is_empty() {
        warn!(
            "structure extraction returned no text blocks for {}",
            pdf_path.display()
        );
    }
    info!("Extracted {} blocks in {}ms", blocks.len(), extract_duration_ms);

    // ── Step 3: Isolate protected spans ──────────────────────────────────
    let span_count = isolate::isolate_spans(&mut blocks);
    info!("Isolated {span_count} protected spans");

    // ── Step 4: Translate block by block ─────────────────────────────────
    let translate_start = Instant::now();
    let outcome = dispatch::translate_blocks(&service, &mut blocks, config).await;
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;
    if outcome.degraded > 0 {
        warn!(
            "{} of {} blocks kept untranslated source text",
            outcome.degraded,
            blocks.len()
        );
    }

    // ── Step 5: Restore protected spans ──────────────────────────────────
    let restored = restore::restore_spans(&mut blocks);
    if restored.displaced > 0 {
        warn!("{} spans re-attached at block ends", restored.displaced);
    }

    // ── Step 6: Extract per-page images ──────────────────────────────────
    let page_images = if config.extract_images {
        images::extract_images(&pdf_path, &out_dir).await
    } else {
        crate::document::PageImageSet::new()
    };

    // ── Step 7: Assemble and persist the LaTeX source ────────────────────
    let latex = assemble::assemble_document(&blocks, &page_images);
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let tex_path = out_dir.join(format!("{stem}.tex"));
    write_atomic(&tex_path, &latex).await?;
    info!("Wrote {}", tex_path.display());

    // ── Step 8: Compile validation ───────────────────────────────────────
    let (compile_report, compile_duration_ms) = if config.compile {
        let compile_start = Instant::now();
        let report = compile::compile_document(&tex_path, &out_dir, config.max_log_tail).await;
        let elapsed = compile_start.elapsed().as_millis() as u64;
        if !report.success {
            return Err(TranslateError::CompileFailed {
                tex: tex_path,
                log: report.log,
            });
        }
        (Some(report), elapsed)
    } else {
        (None, 0)
    };

    let stats = TranslationStats {
        total_blocks: blocks.len(),
        translated_blocks: outcome.translated,
        degraded_blocks: outcome.degraded,
        skipped_blocks: outcome.skipped,
        protected_spans: span_count,
        displaced_spans: restored.displaced,
        image_count: page_images.image_count(),
        extract_duration_ms,
        translate_duration_ms,
        compile_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Translation complete: {}/{} blocks translated, {} images, {}ms total",
        stats.translated_blocks, stats.total_blocks, stats.image_count, stats.total_duration_ms
    );

    Ok(TranslationOutput {
        pdf_path: compile_report.as_ref().and_then(|r| r.pdf_path.clone()),
        tex_path,
        latex,
        stats,
        compile: compile_report,
    })
}

/// Translate PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is cleaned up
/// automatically on return or panic. Useful when the PDF comes from a
/// network stream or database rather than a file on disk.
pub async fn translate_bytes(
    bytes: &[u8],
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| TranslateError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| TranslateError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `translate_document` returns
    translate_document(tmp.path(), config).await
}

/// Translate every PDF directly inside `dir`, one document at a time.
///
/// A document failure is recorded and logged, never propagated: the batch
/// always runs to completion. Returns the summary; callers map
/// `!summary.all_succeeded()` to a non-zero exit code.
///
/// # Errors
/// Only for batch-level problems: the directory holds no PDFs at all.
pub async fn translate_batch(
    dir: &Path,
    config: &TranslationConfig,
) -> Result<BatchSummary, TranslateError> {
    let pdfs = input::list_pdfs(dir)?;
    info!("Batch: {} documents in {}", pdfs.len(), dir.display());

    let mut summary = BatchSummary {
        total: pdfs.len(),
        ..Default::default()
    };

    for pdf in pdfs {
        match translate_document(&pdf, config).await {
            Ok(output) => {
                summary.succeeded += 1;
                info!(
                    "✓ {} ({} blocks, degraded: {})",
                    pdf.display(),
                    output.stats.total_blocks,
                    output.is_degraded()
                );
            }
            Err(e) => {
                summary.failed += 1;
                error!("✗ {}: {e}", pdf.display());
                summary.failures.push(BatchFailure {
                    path: pdf,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Batch complete: {}/{} documents succeeded",
        summary.succeeded, summary.total
    );
    Ok(summary)
}

/// Resolve the translation service, from most-specific to least-specific:
/// a pre-built service from the config, then the named backend.
fn resolve_service(
    config: &TranslationConfig,
) -> Result<Arc<dyn TranslationService>, TranslateError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }
    match config.backend.as_str() {
        "http" => Ok(Arc::new(HttpTranslationService::new(&config.backend_url))),
        "none" => Ok(Arc::new(NoopTranslationService)),
        other => Err(TranslateError::InvalidConfig(format!(
            "unknown translation backend '{other}' (expected 'http' or 'none')"
        ))),
    }
}

/// Atomic write: temp file in the target directory, then rename, so a crash
/// never leaves a half-written `.tex` behind.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), TranslateError> {
    let tmp_path = path.with_extension("tex.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| TranslateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| TranslateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
