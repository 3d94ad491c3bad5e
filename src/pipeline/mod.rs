//! Pipeline stages for PDF translation.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an external
//! collaborator (structure extractor, translation backend, compiler) without
//! touching the others. Data flows strictly forward; no stage re-enters an
//! earlier one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ isolate ──▶ dispatch ──▶ restore ──▶ assemble ──▶ compile
//! (path)    (GROBID)    (spans)     (backend)    (markers)   (LaTeX)       (pdflatex)
//! ```
//!
//! 1. [`input`]    — validate the source PDF, enumerate batch directories
//! 2. [`extract`]  — upload to the structure service, normalise TEI XML into
//!    ordered content blocks
//! 3. [`isolate`]  — replace formula spans with inert placeholder tokens
//! 4. [`dispatch`] — call the translation backend per block, fail open
//! 5. [`restore`]  — swap placeholders back for restoration-marked content
//! 6. [`assemble`] — escape text, emit protected spans verbatim, attach
//!    per-page images, produce the complete document source
//! 7. [`compile`]  — run the external compiler twice and report pass/fail
//!
//! [`images`] feeds stage 6 with per-page assets from the `pdfimages`
//! utility; it is best-effort and never fails the document.

pub mod assemble;
pub mod compile;
pub mod dispatch;
pub mod extract;
pub mod images;
pub mod input;
pub mod isolate;
pub mod restore;
