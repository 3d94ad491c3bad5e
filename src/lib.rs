//! # pdftrans
//!
//! Translate academic PDF documents into typeset LaTeX while preserving
//! mathematical formulas, figures, and tables.
//!
//! ## Why this crate?
//!
//! Feeding a whole scientific paper through a machine-translation model
//! destroys exactly the content that makes it scientific: formulas come back
//! paraphrased, control sequences are "translated", and reserved characters
//! break the rebuilt document. Instead this crate extracts the document
//! structure, fences every formula behind an inert placeholder token before
//! translation, restores the protected content afterwards, and re-emits a
//! complete, compilable LaTeX source.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the source file (or enumerate a batch directory)
//!  ├─ 2. Extract   GROBID structure service → TEI XML → ordered content blocks
//!  ├─ 3. Isolate   formulas → __FORMULA_i__ placeholders + protected spans
//!  ├─ 4. Dispatch  per-block calls to the translation backend (fail-open)
//!  ├─ 5. Restore   placeholders → [[SPAN_START_b_i]]…[[SPAN_END_b_i]] markers
//!  ├─ 6. Assemble  escape text, emit protected spans verbatim, attach images
//!  └─ 7. Compile   two pdflatex passes → final PDF or diagnostic report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftrans::{translate_document, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslationConfig::builder()
//!         .source_lang("en")
//!         .target_lang("tr")
//!         .output_dir("output")
//!         .build()?;
//!     let output = translate_document("paper.pdf", &config).await?;
//!     println!("tex: {}", output.tex_path.display());
//!     if let Some(pdf) = &output.pdf_path {
//!         println!("pdf: {}", pdf.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## External collaborators
//!
//! | Collaborator | Interface | Failure policy |
//! |--------------|-----------|----------------|
//! | GROBID structure service | multipart HTTP POST, explicit timeout | fatal for the document |
//! | Translation backend | [`TranslationService`] trait object | per-block fallback to source text |
//! | `pdfimages` (poppler) | subprocess | document produced without images |
//! | `pdflatex` | subprocess, two passes | fatal for the output artifact |
//!
//! A failure inside one document never aborts a batch: the batch summary
//! counts succeeded/failed documents and the per-document diagnostics go to
//! the log.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftrans` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdftrans = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod service;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Granularity, TranslationConfig, TranslationConfigBuilder};
pub use document::{BlockKind, ContentBlock, PageImageSet};
pub use error::{BlockError, TranslateError};
pub use output::{BatchFailure, BatchSummary, TranslationOutput, TranslationStats};
pub use pipeline::compile::CompileReport;
pub use service::{HttpTranslationService, NoopTranslationService, TranslationService};
pub use translate::{translate_batch, translate_bytes, translate_document};
