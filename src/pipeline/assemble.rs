//! Document assembly: escape translated text, emit protected spans verbatim,
//! attach per-page images, and produce a complete LaTeX source.
//!
//! ## The one rule that matters
//!
//! Escaping must be applied **exactly once** to every character of
//! translated prose and **never** to the interior of a restoration marker.
//! Marker interiors are formula content that is already valid target markup;
//! escaping them would mangle `\sum` into `\textbackslash{}sum`. The
//! assembler therefore splits each block on marker boundaries first and only
//! then escapes the outside segments, in a single character-wise pass —
//! there is no second pass that could double-escape.
//!
//! ## Image placement
//!
//! The structure extractor does not expose page boundaries, so block
//! positions and physical page numbers cannot be aligned reliably. Rather
//! than guess an interleaving, all image assets are appended after the text,
//! grouped by ascending page number with a page break before each group.
//! Conservative, but it never puts a figure in the middle of a sentence.

use crate::document::{BlockKind, ContentBlock, PageImageSet};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SPAN_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\[\[SPAN_START_(\d+)_(\d+)\]\](.*?)\[\[SPAN_END_\d+_\d+\]\]").unwrap()
});

/// Fixed document frame. `fancyvrb` supplies the `Verbatim` environment the
/// protected spans are emitted into.
pub const PREAMBLE: &str = "\\documentclass[12pt]{article}\n\
\\usepackage[utf8]{inputenc}\n\
\\usepackage{amsmath,amssymb}\n\
\\usepackage{graphicx}\n\
\\usepackage{geometry}\n\
\\usepackage{fancyvrb}\n\
\\geometry{margin=2cm}\n\
\\pagestyle{plain}\n\
\\begin{document}\n\n";

pub const POSTAMBLE: &str = "\\end{document}\n";

/// Escape LaTeX-reserved characters in translated prose.
///
/// Single pass over the characters with a fixed substitution table, so the
/// result is deterministic and each character is escaped exactly once.
/// Escaping is not idempotent — callers must route a string through here
/// once, which the segment walk in [`assemble_document`] guarantees.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// A piece of a block's restored text.
enum Segment<'a> {
    /// Prose outside restoration markers — gets escaped.
    Text(&'a str),
    /// Marker interior — emitted verbatim, never escaped.
    Protected(&'a str),
}

/// Split restored text on restoration-marker boundaries.
fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0usize;
    for caps in RE_SPAN_MARKER.captures_iter(text) {
        let whole = caps.get(0).expect("match 0 always present");
        let inner = caps.get(3).expect("capture 3 always present");
        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Protected(inner.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// Assemble the complete LaTeX source: preamble, blocks in index order,
/// image groups, postamble.
pub fn assemble_document(blocks: &[ContentBlock], images: &PageImageSet) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + blocks.len() * 256);
    doc.push_str(PREAMBLE);

    // Emission order is the extraction order, whatever order the caller
    // happened to store the blocks in.
    let mut ordered: Vec<&ContentBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.index);

    for block in ordered {
        let text = block.translated_text.trim();
        if text.is_empty() {
            continue;
        }
        match block.kind {
            BlockKind::Heading => render_heading(&mut doc, text),
            _ => render_body(&mut doc, text),
        }
    }

    if !images.is_empty() {
        doc.push_str("\\clearpage\n");
        for (page, paths) in images.pages() {
            doc.push_str(&format!("% images extracted from source page {page}\n"));
            for path in paths {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                doc.push_str("\\begin{figure}[ht]\n\\centering\n");
                doc.push_str(&format!("\\includegraphics[width=0.9\\textwidth]{{{file}}}\n"));
                doc.push_str("\\end{figure}\n\n");
            }
            doc.push_str("\\clearpage\n");
        }
    }

    doc.push_str(POSTAMBLE);
    doc
}

/// Body block: escaped prose with protected spans in `Verbatim` blocks.
fn render_body(doc: &mut String, text: &str) {
    for segment in split_segments(text) {
        match segment {
            Segment::Text(t) => doc.push_str(&escape_latex(t)),
            Segment::Protected(content) => {
                doc.push_str("\n\\begin{Verbatim}[fontsize=\\small]\n");
                doc.push_str(content);
                doc.push_str("\n\\end{Verbatim}\n");
            }
        }
    }
    doc.push_str("\n\n");
}

/// Heading block: an unnumbered section. A `Verbatim` environment cannot
/// live inside `\section*`, so a protected span in a heading is inlined
/// verbatim instead.
fn render_heading(doc: &mut String, text: &str) {
    doc.push_str("\\section*{");
    for segment in split_segments(text) {
        match segment {
            Segment::Text(t) => doc.push_str(&escape_latex(t)),
            Segment::Protected(content) => doc.push_str(content),
        }
    }
    doc.push_str("}\n\n");
}
