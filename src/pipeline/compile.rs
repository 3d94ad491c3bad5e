//! Compile validation: run the external LaTeX compiler and report pass/fail.
//!
//! The assembled source is compiled with
//! `pdflatex -interaction=nonstopmode -halt-on-error` **twice** — the first
//! pass establishes cross-references, the second resolves them, the standard
//! two-pass convention of the LaTeX toolchain. The first pass is the
//! verdict: if it fails, the document failed, with the tail of the compiler
//! log attached. The second pass is best-effort and only logged.
//!
//! No retries beyond the two passes, and no attempt to auto-repair invalid
//! markup — a failing document is a bug upstream in the assembler, and the
//! diagnostic log is the evidence.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

const COMPILER: &str = "pdflatex";

/// Definitive result of the compile validator.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    /// Whether a PDF artifact was produced.
    pub success: bool,
    /// Tail of the compiler's stdout/stderr (bounded by `max_log_tail`).
    pub log: String,
    /// Path of the produced PDF, when `success`.
    pub pdf_path: Option<PathBuf>,
}

/// Compile `tex_path` (which must live inside `out_dir`) into a PDF.
///
/// Never returns an error: every failure mode — compiler missing, non-zero
/// exit, no artifact produced — is folded into the report so the caller can
/// surface one definitive pass/fail per document.
pub async fn compile_document(tex_path: &Path, out_dir: &Path, max_log_tail: usize) -> CompileReport {
    let tex_name = tex_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tex_path.to_string_lossy().into_owned());

    info!("Compiling {}", tex_path.display());

    let first = match run_pass(&tex_name, out_dir).await {
        Ok(output) => output,
        Err(e) => {
            return CompileReport {
                success: false,
                log: format!(
                    "failed to invoke {COMPILER}: {e}\n\
                     Install a TeX distribution (e.g. TeX Live) or run with --skip-compile."
                ),
                pdf_path: None,
            };
        }
    };

    let mut log = log_tail(&first, max_log_tail);

    if !first.status.success() {
        return CompileReport {
            success: false,
            log,
            pdf_path: None,
        };
    }

    // Second pass resolves references; its failure downgrades nothing.
    match run_pass(&tex_name, out_dir).await {
        Ok(output) if !output.status.success() => {
            warn!("second {COMPILER} pass exited with {}", output.status);
        }
        Err(e) => warn!("second {COMPILER} pass could not run: {e}"),
        Ok(_) => debug!("second {COMPILER} pass completed"),
    }

    let pdf_path = tex_path.with_extension("pdf");
    let success = pdf_path.exists();
    if !success {
        log.push_str(&format!("\n{COMPILER} exited successfully but produced no PDF"));
    }

    CompileReport {
        success,
        log,
        pdf_path: success.then_some(pdf_path),
    }
}

/// One compiler pass, run from inside the output directory so relative
/// `\includegraphics` paths resolve against the extracted images. The
/// directory is absolutised first; a relative `-output-directory` would
/// otherwise resolve against the changed working directory.
async fn run_pass(tex_name: &str, out_dir: &Path) -> std::io::Result<Output> {
    let out_dir = std::fs::canonicalize(out_dir).unwrap_or_else(|_| out_dir.to_path_buf());
    Command::new(COMPILER)
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg("-output-directory")
        .arg(&out_dir)
        .arg(tex_name)
        .current_dir(&out_dir)
        .output()
        .await
}

/// Keep the last `max_chars` characters of the combined compiler output —
/// LaTeX puts the interesting error at the end of a very chatty log.
fn log_tail(output: &Output, max_chars: usize) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        combined.push('\n');
        combined.push_str(&stderr);
    }
    tail_chars(combined.trim(), max_chars)
}

fn tail_chars(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        s.to_string()
    } else {
        let skipped: String = s.chars().skip(count - max_chars).collect();
        format!("…{skipped}")
    }
}
