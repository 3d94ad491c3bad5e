//! Per-page image extraction via the external `pdfimages` utility
//! (poppler-utils).
//!
//! `pdfimages -png -p <pdf> <root>` writes one file per embedded raster as
//! `<root>-PPP-NNN.png`, where `PPP` is the 1-based page number and `NNN`
//! the per-document image counter. We parse those names back into a
//! [`PageImageSet`].
//!
//! Everything here is best-effort: a missing binary, a non-zero exit, or an
//! unreadable output directory logs a warning and yields an empty set, and a
//! single unparseable file is skipped. Losing images degrades the output;
//! losing the document over an image would be worse.

use crate::document::PageImageSet;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extract per-page images from `pdf_path` into `out_dir`.
pub async fn extract_images(pdf_path: &Path, out_dir: &Path) -> PageImageSet {
    let prefix = image_prefix(pdf_path);
    let root = out_dir.join(&prefix);

    let output = Command::new("pdfimages")
        .arg("-png")
        .arg("-p")
        .arg(pdf_path)
        .arg(&root)
        .output()
        .await;

    match output {
        Err(e) => {
            warn!("pdfimages unavailable ({e}); continuing without images");
            return PageImageSet::new();
        }
        Ok(out) if !out.status.success() => {
            warn!(
                "pdfimages exited with {}: {}; continuing without images",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            return PageImageSet::new();
        }
        Ok(_) => {}
    }

    let set = collect_images(out_dir, &prefix);
    debug!(
        "Extracted {} images across {} pages",
        set.image_count(),
        set.pages().count()
    );
    set
}

/// File-name prefix for this document's images: the sanitised stem plus a
/// fixed suffix so extracted assets never collide with other outputs.
fn image_prefix(pdf_path: &Path) -> String {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let sanitised: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{sanitised}-img")
}

/// Parse `<prefix>-PPP-NNN.png` into `(page, image_number)`.
fn parse_image_name(prefix: &str, name: &str) -> Option<(u32, u32)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
    let rest = rest.strip_suffix(".png")?;
    let (page, num) = rest.split_once('-')?;
    Some((page.parse().ok()?, num.parse().ok()?))
}

/// Scan `dir` for this document's extracted images, ordered by page then
/// image number.
fn collect_images(dir: &Path, prefix: &str) -> PageImageSet {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot list {}: {e}; continuing without images", dir.display());
            return PageImageSet::new();
        }
    };

    let mut found: Vec<(u32, u32, std::path::PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_string_lossy().into_owned();
            let (page, num) = parse_image_name(prefix, &name)?;
            Some((page, num, path))
        })
        .collect();
    found.sort();

    let mut set = PageImageSet::new();
    for (page, _num, path) in found {
        set.push(page, path);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn prefix_sanitises_awkward_stems() {
        assert_eq!(image_prefix(Path::new("paper.pdf")), "paper-img");
        assert_eq!(
            image_prefix(Path::new("/data/my paper (v2).pdf")),
            "my-paper--v2--img"
        );
    }

    #[test]
    fn parses_pdfimages_names() {
        assert_eq!(parse_image_name("paper-img", "paper-img-001-000.png"), Some((1, 0)));
        assert_eq!(parse_image_name("paper-img", "paper-img-012-003.png"), Some((12, 3)));
        assert_eq!(parse_image_name("paper-img", "paper-img-001-000.jpg"), None);
        assert_eq!(parse_image_name("paper-img", "other-001-000.png"), None);
        assert_eq!(parse_image_name("paper-img", "paper-img-x-0.png"), None);
    }

    #[test]
    fn collects_images_ordered_by_page_then_number() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "paper-img-002-002.png",
            "paper-img-001-000.png",
            "paper-img-001-001.png",
            "unrelated.txt",
            "paper-img-broken.png",
        ] {
            std::fs::write(dir.path().join(name), b"png").unwrap();
        }

        let set = collect_images(dir.path(), "paper-img");
        assert_eq!(set.image_count(), 3);

        let pages: Vec<(u32, Vec<PathBuf>)> = set
            .pages()
            .map(|(p, paths)| (p, paths.to_vec()))
            .collect();
        assert_eq!(pages[0].0, 1);
        assert_eq!(pages[0].1.len(), 2);
        assert!(pages[0].1[0].to_string_lossy().ends_with("paper-img-001-000.png"));
        assert_eq!(pages[1].0, 2);
    }

    #[tokio::test]
    async fn missing_binary_or_bad_input_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        // Whether or not pdfimages is installed, a nonexistent input PDF
        // must degrade to "no images", never to an error.
        let set = extract_images(Path::new("/no/such/file.pdf"), dir.path()).await;
        assert!(set.is_empty());
    }
}
