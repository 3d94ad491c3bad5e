//! Configuration types for PDF translation.
//!
//! All pipeline behaviour is controlled through [`TranslationConfig`], built
//! via its [`TranslationConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share configs across documents in a batch and to diff
//! two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::TranslateError;
use crate::service::TranslationService;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// How many blocks are sent to the translation backend per call.
///
/// `Block` is the reference behaviour: one call per content block, so one
/// backend failure degrades exactly one block. `Page` batches consecutive
/// blocks into fixed-size groups to cut per-call overhead on backends with
/// high request latency; a group whose translation cannot be split back into
/// its blocks is transparently retried block by block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    /// One backend call per content block. (default)
    #[default]
    Block,
    /// One backend call per group of consecutive blocks.
    Page,
}

/// Configuration for a PDF translation run.
///
/// Built via [`TranslationConfig::builder()`] or
/// [`TranslationConfig::default()`].
///
/// # Example
/// ```rust
/// use pdftrans::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .source_lang("en")
///     .target_lang("de")
///     .grobid_url("http://grobid.internal:8070/api/processFulltextDocument")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Source-language tag passed to the translation backend. Default: `en`.
    pub source_lang: String,

    /// Target-language tag passed to the translation backend. Default: `tr`.
    pub target_lang: String,

    /// Dispatch granularity. Default: [`Granularity::Block`].
    pub granularity: Granularity,

    /// Blocks per group when `granularity` is `Page`. Default: 8.
    pub page_block_count: usize,

    /// Translation backend name: `http` or `none`. Default: `http`.
    ///
    /// `none` is the identity backend: it returns the source text unchanged,
    /// which exercises the full reconstruction path without a model — useful
    /// for dry runs and for checking that a document compiles at all.
    pub backend: String,

    /// Endpoint of the `http` backend (LibreTranslate-compatible:
    /// JSON `{q, source, target}` in, `{translatedText}` out).
    /// Default: `http://localhost:5000/translate`.
    pub backend_url: String,

    /// Pre-constructed translation service. Takes precedence over `backend`.
    pub service: Option<Arc<dyn TranslationService>>,

    /// Structure-extraction service endpoint.
    /// Default: `http://localhost:8070/api/processFulltextDocument`.
    pub grobid_url: String,

    /// Timeout for the structure-extraction request in seconds. Default: 120.
    ///
    /// This is the only enforced network timeout in the pipeline; the
    /// translation backend and the LaTeX compiler run without one, so a hung
    /// backend hangs the document. Known gap — kept explicit rather than
    /// papered over with an arbitrary limit.
    pub extraction_timeout_secs: u64,

    /// Directory receiving the `.tex`, extracted images, and compiled PDF.
    /// Default: `output`.
    pub output_dir: PathBuf,

    /// Run the two-pass LaTeX compile validator. Default: true.
    ///
    /// Disable for tex-only runs (inspection, manual compilation, CI without
    /// a TeX installation).
    pub compile: bool,

    /// Extract per-page images with `pdfimages` and append them to the
    /// document. Default: true.
    pub extract_images: bool,

    /// Maximum characters of compiler output kept in diagnostics. Default: 4000.
    pub max_log_tail: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "tr".to_string(),
            granularity: Granularity::default(),
            page_block_count: 8,
            backend: "http".to_string(),
            backend_url: "http://localhost:5000/translate".to_string(),
            service: None,
            grobid_url: "http://localhost:8070/api/processFulltextDocument".to_string(),
            extraction_timeout_secs: 120,
            output_dir: PathBuf::from("output"),
            compile: true,
            extract_images: true,
            max_log_tail: 4000,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("granularity", &self.granularity)
            .field("page_block_count", &self.page_block_count)
            .field("backend", &self.backend)
            .field("backend_url", &self.backend_url)
            .field("service", &self.service.as_ref().map(|_| "<dyn TranslationService>"))
            .field("grobid_url", &self.grobid_url)
            .field("extraction_timeout_secs", &self.extraction_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("compile", &self.compile)
            .field("extract_images", &self.extract_images)
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn source_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.source_lang = lang.into();
        self
    }

    pub fn target_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.target_lang = lang.into();
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.config.granularity = granularity;
        self
    }

    pub fn page_block_count(mut self, n: usize) -> Self {
        self.config.page_block_count = n.max(1);
        self
    }

    pub fn backend(mut self, name: impl Into<String>) -> Self {
        self.config.backend = name.into();
        self
    }

    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend_url = url.into();
        self
    }

    pub fn service(mut self, service: Arc<dyn TranslationService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn grobid_url(mut self, url: impl Into<String>) -> Self {
        self.config.grobid_url = url.into();
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = secs.max(1);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn compile(mut self, v: bool) -> Self {
        self.config.compile = v;
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn max_log_tail(mut self, chars: usize) -> Self {
        self.config.max_log_tail = chars;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslateError> {
        let c = &self.config;
        if c.source_lang.trim().is_empty() || c.target_lang.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "source and target language tags must be non-empty".into(),
            ));
        }
        if c.source_lang == c.target_lang {
            return Err(TranslateError::InvalidConfig(format!(
                "source and target language are both '{}'",
                c.source_lang
            )));
        }
        if c.page_block_count == 0 {
            return Err(TranslateError::InvalidConfig(
                "page_block_count must be ≥ 1".into(),
            ));
        }
        if c.service.is_none() && c.backend != "http" && c.backend != "none" {
            return Err(TranslateError::InvalidConfig(format!(
                "unknown translation backend '{}' (expected 'http' or 'none')",
                c.backend
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = TranslationConfig::builder().build().unwrap();
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.target_lang, "tr");
        assert_eq!(config.granularity, Granularity::Block);
        assert!(config.compile);
    }

    #[test]
    fn rejects_same_language_pair() {
        let err = TranslationConfig::builder()
            .source_lang("en")
            .target_lang("en")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'en'"));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = TranslationConfig::builder()
            .backend("carrier-pigeon")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn page_block_count_clamped_to_one() {
        let config = TranslationConfig::builder()
            .granularity(Granularity::Page)
            .page_block_count(0)
            .build()
            .unwrap();
        assert_eq!(config.page_block_count, 1);
    }
}
