//! Core data model shared by every pipeline stage.
//!
//! A [`ContentBlock`] is the unit of document structure: one paragraph,
//! heading, figure caption, table, note, or list item, in document order.
//! Blocks are created once by the structure-extraction adapter and then
//! enriched stage by stage — the isolator fills `protected_spans` and
//! `plain_text`, the dispatcher sets `translated_text`, the restorer rewrites
//! the placeholder tokens inside it. A block is owned exclusively by one
//! pipeline run; nothing is shared across documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Structural role of a content block, from the extraction allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Running text paragraph.
    Paragraph,
    /// Section or division heading.
    Heading,
    /// Figure region (usually its caption text).
    Figure,
    /// Table region (cell text; no layout reconstruction).
    Table,
    /// Footnote or margin note.
    Note,
    /// List item.
    ListItem,
    /// Paragraph containing at least one protected formula span.
    FormulaParagraph,
}

/// One unit of document structure, in document order.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    /// Position in document order. Assigned once at extraction, immutable.
    pub index: usize,
    /// Structural role.
    pub kind: BlockKind,
    /// Normalised structural markup as extracted: decoded text with
    /// `<formula>…</formula>` spans preserved inline.
    pub raw_markup: String,
    /// Ordered protected-span contents, indexed block-locally from 0.
    /// `protected_spans[i]` corresponds to the `__FORMULA_i__` placeholder.
    pub protected_spans: Vec<String>,
    /// `raw_markup` with every protected span replaced by its placeholder
    /// token and all markup stripped. Computed once by the isolator.
    pub plain_text: String,
    /// Translated text (or the untranslated `plain_text` when translation
    /// failed for this block). Set by the dispatcher; the restorer replaces
    /// the placeholder tokens inside it with restoration markers.
    pub translated_text: String,
}

impl ContentBlock {
    /// Create a block fresh from extraction. The remaining fields are filled
    /// by the later pipeline stages.
    pub fn new(index: usize, kind: BlockKind, raw_markup: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            raw_markup: raw_markup.into(),
            protected_spans: Vec::new(),
            plain_text: String::new(),
            translated_text: String::new(),
        }
    }

    /// Whether the isolator found any protected spans in this block.
    pub fn has_formulas(&self) -> bool {
        !self.protected_spans.is_empty()
    }
}

/// Per-page image assets extracted from the source PDF.
///
/// Keyed by 1-based physical page number, independently of
/// [`ContentBlock::index`]: the structure extractor does not expose page
/// boundaries, so pages and blocks are never assumed to align. Built once by
/// the image-extraction adapter and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PageImageSet {
    pages: BTreeMap<u32, Vec<PathBuf>>,
}

impl PageImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image to the given page, preserving insertion order within
    /// the page.
    pub fn push(&mut self, page: u32, path: PathBuf) {
        self.pages.entry(page).or_default().push(path);
    }

    /// Iterate pages in ascending page-number order.
    pub fn pages(&self) -> impl Iterator<Item = (u32, &[PathBuf])> {
        self.pages.iter().map(|(page, paths)| (*page, paths.as_slice()))
    }

    /// Total number of images across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_image_set_orders_pages_ascending() {
        let mut set = PageImageSet::new();
        set.push(3, PathBuf::from("p3-0.png"));
        set.push(1, PathBuf::from("p1-0.png"));
        set.push(1, PathBuf::from("p1-1.png"));
        set.push(2, PathBuf::from("p2-0.png"));

        let pages: Vec<u32> = set.pages().map(|(p, _)| p).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(set.image_count(), 4);

        let (_, first_page) = set.pages().next().unwrap();
        assert_eq!(
            first_page,
            &[PathBuf::from("p1-0.png"), PathBuf::from("p1-1.png")]
        );
    }

    #[test]
    fn fresh_block_has_no_spans() {
        let block = ContentBlock::new(0, BlockKind::Paragraph, "some text");
        assert!(!block.has_formulas());
        assert!(block.plain_text.is_empty());
        assert!(block.translated_text.is_empty());
    }
}
