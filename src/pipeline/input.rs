//! Input resolution: validate the source PDF and enumerate batch directories.
//!
//! We validate the PDF magic bytes (`%PDF`) before doing any network work so
//! callers get a meaningful error instead of a confusing rejection from the
//! structure-extraction service half a pipeline later.

use crate::error::TranslateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Validate that `path` exists, is readable, and starts with the PDF magic.
pub fn resolve_pdf(path: impl AsRef<Path>) -> Result<PathBuf, TranslateError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(TranslateError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(TranslateError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TranslateError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TranslateError::FileNotFound { path });
        }
    }

    debug!("Resolved PDF: {}", path.display());
    Ok(path)
}

/// List the PDF files directly inside `dir`, sorted by name.
///
/// Non-recursive: batch runs treat one directory as one job, matching how
/// papers are usually staged for translation. Returns
/// [`TranslateError::NoDocuments`] when nothing matches.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, TranslateError> {
    let mut pdfs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();

    pdfs.sort();

    if pdfs.is_empty() {
        return Err(TranslateError::NoDocuments {
            dir: dir.to_path_buf(),
        });
    }
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_rejects_missing_file() {
        let err = resolve_pdf("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, TranslateError::FileNotFound { .. }));
    }

    #[test]
    fn resolve_rejects_non_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = resolve_pdf(&path).unwrap_err();
        assert!(matches!(err, TranslateError::NotAPdf { .. }));
    }

    #[test]
    fn resolve_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7\n...").unwrap();

        assert_eq!(resolve_pdf(&path).unwrap(), path);
    }

    #[test]
    fn list_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.7").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/deep.pdf"), b"%PDF-1.7").unwrap();

        let pdfs = list_pdfs(dir.path()).unwrap();
        let names: Vec<_> = pdfs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn list_pdfs_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_pdfs(dir.path()).unwrap_err();
        assert!(matches!(err, TranslateError::NoDocuments { .. }));
    }
}
