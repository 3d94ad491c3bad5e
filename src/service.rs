//! Pluggable translation backends.
//!
//! The pipeline never talks to a concrete translation model; it drives a
//! [`TranslationService`] trait object injected through the configuration.
//! That keeps the dispatcher's failure policy (fail open, per block)
//! independent of how the text actually gets translated, and lets tests
//! substitute a deterministic mock.
//!
//! Concurrency safety is the service's explicit contract: an implementation
//! must either serialise access internally or be safe to call from several
//! pipeline instances at once. The reference pipeline calls it sequentially,
//! one block at a time, within a document.

use crate::error::BlockError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A translation backend: plain text in, plain text out.
///
/// Implementations must tolerate placeholder tokens (`__FORMULA_0__`, …)
/// embedded in the input, and callers must not assume they come back intact —
/// the restorer downstream handles dropped or duplicated tokens.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BlockError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

// ── HTTP backend ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Translation over a LibreTranslate-compatible HTTP endpoint.
///
/// Wire shape: JSON POST `{"q": …, "source": …, "target": …, "format":
/// "text"}`, response `{"translatedText": …}`. The client deliberately has no
/// request timeout (see [`crate::config::TranslationConfig::extraction_timeout_secs`]
/// for where the pipeline does enforce one).
pub struct HttpTranslationService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTranslationService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TranslationService for HttpTranslationService {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BlockError> {
        let request = TranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
            format: "text",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BlockError::ServiceUnavailable {
                detail: format!("{}: {e}", self.endpoint),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlockError::ServiceUnavailable {
                detail: format!("HTTP {status}: {}", truncate(&body, 200)),
            });
        }

        let parsed: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| BlockError::MalformedResponse {
                    detail: e.to_string(),
                })?;

        debug!(
            "translated {} chars → {} chars",
            text.len(),
            parsed.translated_text.len()
        );
        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ── Identity backend ─────────────────────────────────────────────────────

/// Identity backend: returns the source text unchanged.
///
/// Exercises the entire reconstruction path (isolation, restoration,
/// escaping, compilation) without a model. Used for dry runs and tests.
pub struct NoopTranslationService;

#[async_trait]
impl TranslationService for NoopTranslationService {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, BlockError> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "none"
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_wire_shape_deserialises() {
        let json = r#"{"translatedText": "Merhaba dünya"}"#;
        let parsed: TranslateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.translated_text, "Merhaba dünya");
    }

    #[test]
    fn request_wire_shape_serialises() {
        let req = TranslateRequest {
            q: "Hello",
            source: "en",
            target: "tr",
            format: "text",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""q":"Hello""#));
        assert!(json.contains(r#""source":"en""#));
    }

    #[tokio::test]
    async fn noop_is_identity() {
        let svc = NoopTranslationService;
        let out = svc
            .translate("Energy is __FORMULA_0__ famous", "en", "tr")
            .await
            .unwrap();
        assert_eq!(out, "Energy is __FORMULA_0__ famous");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("ünlüdür", 3), "ünl…");
    }
}
