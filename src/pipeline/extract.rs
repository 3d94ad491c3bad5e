//! Structure extraction: GROBID upload and TEI-to-block normalisation.
//!
//! The structure-extraction service (GROBID) accepts the raw PDF and returns
//! a TEI XML document whose regions are tagged in reading order, with
//! formulas nested inside their containing region. This module is the only
//! place that knows about that wire format; the rest of the pipeline sees an
//! ordered `Vec<ContentBlock>`.
//!
//! ## Normalisation rules
//!
//! Only tags in a fixed allow-list (`p`, `head`, `figure`, `table`, `note`,
//! `item`) become blocks; every other tag is dropped silently. Inside a
//! block, nested `<formula>` elements are preserved inline (they are what
//! the isolator protects later); all other nested markup collapses to a
//! space so word boundaries survive. Text content is entity-decoded here,
//! once, so no later stage deals with `&amp;` and friends.
//!
//! Any transport failure or non-success HTTP status is fatal for the
//! document: without structure there is nothing to translate.

use crate::config::TranslationConfig;
use crate::document::{BlockKind, ContentBlock};
use crate::error::TranslateError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Send the PDF to the structure-extraction service and return the TEI XML.
pub async fn fetch_tei(
    pdf_path: &Path,
    config: &TranslationConfig,
) -> Result<String, TranslateError> {
    info!("Extracting structure: {}", pdf_path.display());

    let bytes = tokio::fs::read(pdf_path)
        .await
        .map_err(|e| TranslateError::ExtractionFailed {
            path: pdf_path.to_path_buf(),
            reason: format!("could not read input: {e}"),
        })?;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.pdf".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.extraction_timeout_secs))
        .build()
        .map_err(|e| TranslateError::Internal(format!("HTTP client: {e}")))?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/pdf")
        .map_err(|e| TranslateError::Internal(format!("multipart: {e}")))?;
    let form = reqwest::multipart::Form::new()
        .part("input", part)
        .text("consolidate", "1");

    let response = client
        .post(&config.grobid_url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                TranslateError::ExtractionTimeout {
                    path: pdf_path.to_path_buf(),
                    secs: config.extraction_timeout_secs,
                }
            } else {
                TranslateError::ExtractionFailed {
                    path: pdf_path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TranslateError::ExtractionFailed {
            path: pdf_path.to_path_buf(),
            reason: format!("HTTP {status}: {}", truncate(&body, 500)),
        });
    }

    response
        .text()
        .await
        .map_err(|e| TranslateError::ExtractionFailed {
            path: pdf_path.to_path_buf(),
            reason: format!("reading response body: {e}"),
        })
}

/// Map a TEI tag name to a block kind. Tags outside the allow-list return
/// `None` and are dropped.
fn block_kind(name: &[u8]) -> Option<BlockKind> {
    match name {
        b"p" => Some(BlockKind::Paragraph),
        b"head" => Some(BlockKind::Heading),
        b"figure" => Some(BlockKind::Figure),
        b"table" => Some(BlockKind::Table),
        b"note" => Some(BlockKind::Note),
        b"item" => Some(BlockKind::ListItem),
        _ => None,
    }
}

/// A block in the middle of being captured from the event stream.
struct Capture {
    kind: BlockKind,
    raw: String,
    /// Open-element depth relative to the block's own start tag.
    depth: usize,
    /// Nesting depth inside a `<formula>` element (0 = outside).
    formula_depth: usize,
    has_formula: bool,
}

/// Normalise TEI XML into ordered content blocks.
///
/// Blocks are taken from inside the `<text>` body when one exists (the TEI
/// header repeats title and abstract text that must not be translated
/// twice); a document without a `<text>` element is scanned whole as a
/// fallback.
pub fn parse_blocks(tei: &str) -> Vec<ContentBlock> {
    let restrict_to_body = tei.contains("<text");
    let mut reader = Reader::from_str(tei);
    reader.trim_text(false);

    let mut blocks: Vec<ContentBlock> = Vec::new();
    let mut in_body = !restrict_to_body;
    let mut body_depth = 0usize;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    "TEI parse error at byte {}: {e}; keeping {} blocks parsed so far",
                    reader.buffer_position(),
                    blocks.len()
                );
                break;
            }
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if let Some(c) = capture.as_mut() {
                    c.depth += 1;
                    if name == b"formula" {
                        c.formula_depth += 1;
                        if c.formula_depth == 1 {
                            c.has_formula = true;
                            c.raw.push_str("<formula>");
                        }
                    } else if c.formula_depth == 0 {
                        c.raw.push(' ');
                    }
                } else if name == b"text" {
                    in_body = true;
                    body_depth += 1;
                } else if in_body {
                    if let Some(kind) = block_kind(name) {
                        capture = Some(Capture {
                            kind,
                            raw: String::new(),
                            depth: 1,
                            formula_depth: 0,
                            has_formula: false,
                        });
                    }
                }
            }
            Ok(Event::Empty(_)) => {
                // Self-closing tags (<lb/>, <pb/>, …) only matter as word
                // boundaries.
                if let Some(c) = capture.as_mut() {
                    if c.formula_depth == 0 {
                        c.raw.push(' ');
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(c) = capture.as_mut() {
                    match t.unescape() {
                        Ok(decoded) => c.raw.push_str(&decoded),
                        Err(_) => c.raw.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(c) = capture.as_mut() {
                    c.raw.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                let block_closed = match capture.as_mut() {
                    Some(c) => {
                        c.depth -= 1;
                        if c.depth == 0 {
                            true
                        } else {
                            if c.formula_depth > 0 {
                                if name == b"formula" {
                                    c.formula_depth -= 1;
                                    if c.formula_depth == 0 {
                                        c.raw.push_str("</formula>");
                                    }
                                }
                            } else {
                                c.raw.push(' ');
                            }
                            false
                        }
                    }
                    None => {
                        if name == b"text" && body_depth > 0 {
                            body_depth -= 1;
                            if body_depth == 0 {
                                in_body = !restrict_to_body;
                            }
                        }
                        false
                    }
                };
                if block_closed {
                    if let Some(done) = capture.take() {
                        let kind = if done.has_formula && done.kind == BlockKind::Paragraph {
                            BlockKind::FormulaParagraph
                        } else {
                            done.kind
                        };
                        blocks.push(ContentBlock::new(blocks.len(), kind, done.raw));
                    }
                }
            }
            Ok(_) => {}
        }
    }

    debug!("Extracted {} content blocks", blocks.len());
    blocks
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
    fn paragraph_with_formula_keeps_formula_inline() {
        let tei = r#"<TEI><text><p>Energy is <formula xml:id="f0">E=mc^2</formula> famous</p></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].index, 0);
        assert_eq!(blocks[0].kind, BlockKind::FormulaParagraph);
        assert_eq!(blocks[0].raw_markup, "Energy is <formula>E=mc^2</formula> famous");
    }

    #[test]
    fn header_content_is_not_a_block() {
        let tei = r#"<TEI><teiHeader><p>title repeated here</p></teiHeader><text><p>body</p></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_markup, "body");
    }

    #[test]
    fn tags_outside_allow_list_are_dropped() {
        let tei = r#"<TEI><text><div><p>kept</p><byline>dropped</byline></div></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_markup, "kept");
    }

    #[test]
    fn entities_are_decoded() {
        let tei = r#"<TEI><text><p>Tom &amp; Jerry &lt;3</p></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks[0].raw_markup, "Tom & Jerry <3");
    }

    #[test]
    fn inline_markup_becomes_word_boundary() {
        let tei = r##"<TEI><text><p>see<ref target="#b1">[1]</ref>for<lb/>details</p></text></TEI>"##;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks[0].raw_markup, "see [1] for details");
    }

    #[test]
    fn kinds_follow_tag_names_in_document_order() {
        let tei = r#"<TEI><text>
            <head>Introduction</head>
            <p>first</p>
            <figure><figDesc>a figure</figDesc></figure>
            <table><row><cell>x</cell></row></table>
            <note>aside</note>
            <list><item>one</item></list>
        </text></TEI>"#;
        let blocks = parse_blocks(tei);
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Figure,
                BlockKind::Table,
                BlockKind::Note,
                BlockKind::ListItem,
            ]
        );
        let indices: Vec<usize> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn nested_allowed_tags_fold_into_their_container() {
        // A figure's <head> is part of the figure block, not a second block.
        let tei = r#"<TEI><text><figure><head>Fig 1</head><figDesc>scatter plot</figDesc></figure></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Figure);
        assert!(blocks[0].raw_markup.contains("Fig 1"));
        assert!(blocks[0].raw_markup.contains("scatter plot"));
    }

    #[test]
    fn document_without_text_element_is_scanned_whole() {
        let xml = r#"<root><p>loose paragraph</p></root>"#;
        let blocks = parse_blocks(xml);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_markup, "loose paragraph");
    }

    #[test]
    fn multiple_formulas_preserved_in_order() {
        let tei = r#"<TEI><text><p>a <formula>x</formula> b <formula>y</formula> c</p></text></TEI>"#;
        let blocks = parse_blocks(tei);
        assert_eq!(
            blocks[0].raw_markup,
            "a <formula>x</formula> b <formula>y</formula> c"
        );
    }
}
