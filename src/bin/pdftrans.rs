//! CLI binary for pdftrans.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranslationConfig`, drives single-document or batch runs, and prints
//! results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdftrans::{
    translate_document, BatchFailure, BatchSummary, Granularity, TranslationConfig,
    TranslationOutput,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate one paper (English → Turkish, defaults)
  pdftrans paper.pdf

  # Translate every PDF in a directory into ./translated/
  pdftrans papers/ -o translated

  # Different language pair and a remote translation endpoint
  pdftrans --source-lang de --target-lang en \
           --backend-url http://mt.internal:5000/translate paper.pdf

  # Produce only the .tex (no TeX installation needed)
  pdftrans --skip-compile paper.pdf

  # Batch blocks per request for a high-latency backend
  pdftrans --granularity page --page-blocks 12 paper.pdf

  # Dry run: full reconstruction without a translation model
  pdftrans --backend none --skip-compile paper.pdf

COLLABORATING SERVICES:
  GROBID       structure extraction; start with:
               docker run --rm -p 8070:8070 lfoppiano/grobid:0.8.0
  Translation  any LibreTranslate-compatible endpoint
               (JSON {q, source, target} in, {translatedText} out)
  pdfimages    poppler-utils; optional, supplies the figure assets
  pdflatex     TeX Live or similar; optional with --skip-compile

ENVIRONMENT VARIABLES:
  PDFTRANS_SOURCE_LANG     Source-language tag
  PDFTRANS_TARGET_LANG     Target-language tag
  PDFTRANS_BACKEND         Translation backend (http, none)
  PDFTRANS_BACKEND_URL     Translation endpoint URL
  PDFTRANS_GROBID_URL      Structure-extraction endpoint URL
  PDFTRANS_OUTPUT          Output directory
"#;

/// Translate academic PDF documents into typeset LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "pdftrans",
    version,
    about = "Translate academic PDF documents into typeset LaTeX, preserving formulas, figures, and tables",
    long_about = "Translate academic PDF documents into another language and re-emit them as \
compilable LaTeX. Document structure comes from a GROBID service, translation from a \
pluggable backend; formulas are fenced behind placeholder tokens so machine translation \
can never corrupt them.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file, or a directory of PDFs for a batch run.
    input: PathBuf,

    /// Output directory for .tex, images, and compiled PDFs.
    #[arg(short, long, env = "PDFTRANS_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Source-language tag.
    #[arg(long, env = "PDFTRANS_SOURCE_LANG", default_value = "en")]
    source_lang: String,

    /// Target-language tag.
    #[arg(long, env = "PDFTRANS_TARGET_LANG", default_value = "tr")]
    target_lang: String,

    /// Translation backend: http, none.
    #[arg(long, env = "PDFTRANS_BACKEND", default_value = "http")]
    backend: String,

    /// Translation endpoint URL (http backend).
    #[arg(
        long,
        env = "PDFTRANS_BACKEND_URL",
        default_value = "http://localhost:5000/translate"
    )]
    backend_url: String,

    /// Structure-extraction (GROBID) endpoint URL.
    #[arg(
        long,
        env = "PDFTRANS_GROBID_URL",
        default_value = "http://localhost:8070/api/processFulltextDocument"
    )]
    grobid_url: String,

    /// Blocks per translation request: block (one each) or page (grouped).
    #[arg(long, env = "PDFTRANS_GRANULARITY", value_enum, default_value = "block")]
    granularity: GranularityArg,

    /// Blocks per group when --granularity page.
    #[arg(long, env = "PDFTRANS_PAGE_BLOCKS", default_value_t = 8)]
    page_blocks: usize,

    /// Structure-extraction timeout in seconds.
    #[arg(long, env = "PDFTRANS_EXTRACTION_TIMEOUT", default_value_t = 120)]
    extraction_timeout: u64,

    /// Emit the .tex only; skip the pdflatex validation passes.
    #[arg(long, env = "PDFTRANS_SKIP_COMPILE")]
    skip_compile: bool,

    /// Do not extract or attach per-page images.
    #[arg(long, env = "PDFTRANS_NO_IMAGES")]
    no_images: bool,

    /// Output a structured JSON summary instead of human-readable text.
    #[arg(long, env = "PDFTRANS_JSON")]
    json: bool,

    /// Disable the batch progress bar.
    #[arg(long, env = "PDFTRANS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTRANS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTRANS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum GranularityArg {
    Block,
    Page,
}

impl From<GranularityArg> for Granularity {
    fn from(v: GranularityArg) -> Self {
        match v {
            GranularityArg::Block => Granularity::Block,
            GranularityArg::Page => Granularity::Page,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides the per-document feedback that matters.
    let batch_mode = cli.input.is_dir();
    let show_progress = batch_mode && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    if batch_mode {
        let summary = run_batch(&cli, &config, show_progress).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else if !cli.quiet {
            print_batch_summary(&summary);
        }
        if !summary.all_succeeded() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let output = translate_document(&cli.input, &config)
        .await
        .context("Translation failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !cli.quiet {
        print_document_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli) -> Result<TranslationConfig> {
    TranslationConfig::builder()
        .source_lang(&cli.source_lang)
        .target_lang(&cli.target_lang)
        .backend(&cli.backend)
        .backend_url(&cli.backend_url)
        .grobid_url(&cli.grobid_url)
        .granularity(cli.granularity.clone().into())
        .page_block_count(cli.page_blocks)
        .extraction_timeout_secs(cli.extraction_timeout)
        .output_dir(&cli.output)
        .compile(!cli.skip_compile)
        .extract_images(!cli.no_images)
        .build()
        .context("Invalid configuration")
}

/// Drive a batch run with per-document progress reporting.
async fn run_batch(
    cli: &Cli,
    config: &TranslationConfig,
    show_progress: bool,
) -> Result<BatchSummary> {
    let pdfs = pdftrans::pipeline::input::list_pdfs(&cli.input)
        .with_context(|| format!("No PDFs to process in {}", cli.input.display()))?;

    let bar = if show_progress {
        let bar = ProgressBar::new(pdfs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Translating");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut summary = BatchSummary {
        total: pdfs.len(),
        ..Default::default()
    };

    for pdf in pdfs {
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());
        if let Some(ref bar) = bar {
            bar.set_message(name.clone());
        }

        match translate_document(&pdf, config).await {
            Ok(output) => {
                summary.succeeded += 1;
                if let Some(ref bar) = bar {
                    let note = if output.is_degraded() {
                        dim(&format!(
                            "{} blocks, {} degraded",
                            output.stats.total_blocks, output.stats.degraded_blocks
                        ))
                    } else {
                        dim(&format!("{} blocks", output.stats.total_blocks))
                    };
                    bar.println(format!("  {} {:<40} {note}", green("✓"), name));
                }
            }
            Err(e) => {
                summary.failed += 1;
                let reason = e.to_string();
                if let Some(ref bar) = bar {
                    let first_line = reason.lines().next().unwrap_or("failed").to_string();
                    bar.println(format!("  {} {:<40} {}", red("✗"), name, red(&first_line)));
                }
                summary.failures.push(BatchFailure { path: pdf, reason });
            }
        }
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(summary)
}

fn print_document_summary(output: &TranslationOutput) {
    let s = &output.stats;
    eprintln!(
        "{} {}/{} blocks translated  {} spans protected  {} images  {}ms",
        if s.degraded_blocks == 0 { green("✔") } else { cyan("⚠") },
        s.translated_blocks,
        s.total_blocks,
        s.protected_spans,
        s.image_count,
        s.total_duration_ms,
    );
    if s.degraded_blocks > 0 {
        eprintln!(
            "   {} blocks kept untranslated source text",
            s.degraded_blocks
        );
    }
    if s.displaced_spans > 0 {
        eprintln!("   {} formulas re-attached at block ends", s.displaced_spans);
    }
    eprintln!("   tex  →  {}", bold(&output.tex_path.display().to_string()));
    if let Some(ref pdf) = output.pdf_path {
        eprintln!("   pdf  →  {}", bold(&pdf.display().to_string()));
    }
}

fn print_batch_summary(summary: &BatchSummary) {
    if summary.all_succeeded() {
        eprintln!(
            "{} {} documents translated successfully",
            green("✔"),
            bold(&summary.succeeded.to_string())
        );
    } else {
        eprintln!(
            "{} {}/{} documents translated  ({} failed)",
            if summary.succeeded == 0 { red("✘") } else { cyan("⚠") },
            bold(&summary.succeeded.to_string()),
            summary.total,
            red(&summary.failed.to_string()),
        );
        for failure in &summary.failures {
            let first_line = failure.reason.lines().next().unwrap_or("failed");
            eprintln!("   {} {}: {first_line}", red("✗"), failure.path.display());
        }
    }
}
