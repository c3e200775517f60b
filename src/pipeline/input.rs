//! Input validation and output-path defaulting.
//!
//! ## Why validate before spawning Marker?
//!
//! Marker spends seconds loading multi-gigabyte models before it even opens
//! the PDF. Checking existence, readability, and the `%PDF` magic bytes up
//! front turns "cryptic Python traceback after a 30-second model load" into
//! an immediate, well-typed error.

use crate::error::Pdf2EpubError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` points at a readable PDF file.
///
/// Checks, in order: the path exists, it is a regular file, it carries a
/// `.pdf` extension, it can be opened, and its first four bytes are `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), Pdf2EpubError> {
    if !path.exists() {
        return Err(Pdf2EpubError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(Pdf2EpubError::NotAPdf {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    let extension_ok = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !extension_ok {
        return Err(Pdf2EpubError::NotAPdf {
            path: path.to_path_buf(),
            reason: "extension is not .pdf".to_string(),
        });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(Pdf2EpubError::NotAPdf {
                    path: path.to_path_buf(),
                    reason: "missing %PDF header".to_string(),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2EpubError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2EpubError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(())
}

/// Default EPUB path for an input PDF: same directory, same stem, `.epub`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("epub")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/docs/paper.pdf")),
            PathBuf::from("/docs/paper.epub")
        );
        assert_eq!(
            default_output_path(Path::new("thesis.v2.pdf")),
            PathBuf::from("thesis.v2.epub")
        );
    }

    #[test]
    fn test_validate_missing_file() {
        let err = validate_pdf(Path::new("/nonexistent/book.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2EpubError::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("folder.pdf");
        std::fs::create_dir(&sub).unwrap();

        let err = validate_pdf(&sub).unwrap_err();
        match err {
            Pdf2EpubError::NotAPdf { reason, .. } => {
                assert!(reason.contains("regular file"), "got reason: {reason}")
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", b"%PDF-1.7 etc");

        let err = validate_pdf(&path).unwrap_err();
        match err {
            Pdf2EpubError::NotAPdf { reason, .. } => {
                assert!(reason.contains("extension"), "got reason: {reason}")
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "fake.pdf", b"<html>not a pdf</html>");

        let err = validate_pdf(&path).unwrap_err();
        match err {
            Pdf2EpubError::NotAPdf { reason, .. } => {
                assert!(reason.contains("%PDF"), "got reason: {reason}")
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tiny.pdf", b"%P");

        let err = validate_pdf(&path).unwrap_err();
        assert!(matches!(err, Pdf2EpubError::NotAPdf { .. }));
    }

    #[test]
    fn test_validate_accepts_real_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "ok.pdf", b"%PDF-1.4\n%rest of file");

        assert!(validate_pdf(&path).is_ok());
    }

    #[test]
    fn test_validate_extension_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "SHOUTING.PDF", b"%PDF-1.4\n");

        assert!(validate_pdf(&path).is_ok());
    }
}
