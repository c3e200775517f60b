//! Error types for the pdf2epub library.
//!
//! A single fatal enum, [`Pdf2EpubError`], covers every failure mode. The
//! pipeline is a linear two-step sequence with no retries and no partial
//! results: either the EPUB is produced or the whole conversion fails, so
//! there is no non-fatal error category here.
//!
//! External-tool failures deliberately carry the underlying tool's stderr:
//! when Marker aborts halfway through a 400-page book, the torch traceback is
//! the only actionable information, and hiding it behind "marker failed"
//! would force users to re-run with tracing enabled.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2epub library.
#[derive(Debug, Error)]
pub enum Pdf2EpubError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input exists but is not a PDF file.
    #[error("Not a PDF file: '{path}' ({reason})")]
    NotAPdf { path: PathBuf, reason: String },

    // ── External tool errors ──────────────────────────────────────────────
    /// An external tool's executable could not be spawned.
    #[error("{tool} was not found (looked for '{program}').\n{hint}")]
    ToolMissing {
        tool: String,
        program: String,
        hint: String,
    },

    /// An external tool ran but exited with a nonzero status.
    ///
    /// `stderr` holds the tail of the tool's own error output so callers see
    /// the underlying failure, not just the exit code.
    #[error("{tool} exited with status {status}:\n{stderr}", status = fmt_code(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Marker exited successfully but left no Markdown file behind.
    #[error("Marker reported success but produced no Markdown in '{dir}'")]
    MarkdownNotFound { dir: PathBuf },

    /// Pandoc exited successfully but the EPUB file is absent.
    #[error("Pandoc reported success but the EPUB was not created: '{path}'")]
    EpubNotCreated { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the output EPUB or the saved Markdown copy.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A process killed by a signal has no exit code.
fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<killed by signal>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display_includes_stderr() {
        let e = Pdf2EpubError::ToolFailed {
            tool: "marker".into(),
            code: Some(2),
            stderr: "CUDA out of memory".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("status 2"), "got: {msg}");
        assert!(msg.contains("CUDA out of memory"));
    }

    #[test]
    fn tool_failed_display_without_code() {
        let e = Pdf2EpubError::ToolFailed {
            tool: "pandoc".into(),
            code: None,
            stderr: String::new(),
        };
        assert!(e.to_string().contains("<killed by signal>"));
    }

    #[test]
    fn tool_missing_display_includes_hint() {
        let e = Pdf2EpubError::ToolMissing {
            tool: "Marker".into(),
            program: "marker_single".into(),
            hint: "Install it with: pip install marker-pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("marker_single"));
        assert!(msg.contains("pip install marker-pdf"));
    }

    #[test]
    fn not_a_pdf_display() {
        let e = Pdf2EpubError::NotAPdf {
            path: PathBuf::from("/tmp/report.docx"),
            reason: "extension is not .pdf".into(),
        };
        assert!(e.to_string().contains("report.docx"));
        assert!(e.to_string().contains("extension"));
    }

    #[test]
    fn epub_not_created_display() {
        let e = Pdf2EpubError::EpubNotCreated {
            path: PathBuf::from("/tmp/out.epub"),
        };
        assert!(e.to_string().contains("out.epub"));
    }
}
