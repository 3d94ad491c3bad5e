//! Error types for the pdftrans library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranslateError`] — **Fatal for a document**: the pipeline cannot
//!   produce a usable artifact for this input (bad file, structure-extraction
//!   service down, LaTeX compilation failed). Returned as
//!   `Err(TranslateError)` from the top-level `translate_*` functions. In
//!   batch mode a fatal error marks that one document failed; the batch
//!   proceeds to the next.
//!
//! * [`BlockError`] — **Non-fatal**: a single content block could not be
//!   translated (backend unreachable, malformed response). The dispatcher
//!   recovers locally by falling back to the untranslated source text for
//!   that block only, so the document is still produced — degraded, never
//!   aborted.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdftrans library.
///
/// Block-level failures use [`BlockError`] and are recovered inside the
/// dispatcher rather than propagated here.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A batch directory contained no PDF documents.
    #[error("No PDF documents found in '{dir}'")]
    NoDocuments { dir: PathBuf },

    // ── Structure-extraction errors ───────────────────────────────────────
    /// The structure-extraction service was unreachable or returned a
    /// non-success status.
    #[error(
        "Structure extraction failed for '{path}': {reason}\n\
         Is the GROBID service running? Start it with:\n\
         docker run --rm -p 8070:8070 lfoppiano/grobid:0.8.0"
    )]
    ExtractionFailed { path: PathBuf, reason: String },

    /// The structure-extraction request exceeded the configured timeout.
    #[error("Structure extraction timed out after {secs}s for '{path}'\nIncrease --extraction-timeout.")]
    ExtractionTimeout { path: PathBuf, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The external LaTeX compiler rejected the assembled document.
    #[error("LaTeX compilation failed for '{tex}'\n{log}")]
    CompileFailed { tex: PathBuf, log: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single content block.
///
/// Produced by [`crate::service::TranslationService`] backends and consumed
/// by the dispatcher, which logs it and keeps the block's source text. The
/// overall document is still emitted.
#[derive(Debug, Clone, Error)]
pub enum BlockError {
    /// Translation of one block failed after the backend call.
    #[error("Block {block}: translation failed: {detail}")]
    TranslationFailed { block: usize, detail: String },

    /// The translation backend could not be reached at all.
    #[error("Translation service unreachable: {detail}")]
    ServiceUnavailable { detail: String },

    /// The backend answered, but not with the expected wire shape.
    #[error("Translation service returned a malformed response: {detail}")]
    MalformedResponse { detail: String },
}
