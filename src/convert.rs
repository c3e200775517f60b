//! Conversion entry points.
//!
//! ## Why a temp work directory?
//!
//! Marker writes its Markdown, images, and metadata sidecar wherever it is
//! pointed; Pandoc then needs those files in place while it packages the
//! EPUB. Staging everything in a [`tempfile::TempDir`] keeps the caller's
//! filesystem clean and guarantees cleanup when the conversion returns or
//! the future is dropped, even on error paths. Only two files ever leave
//! the work directory: the EPUB itself and, when requested, a copy of the
//! intermediate Markdown.

use crate::config::ConversionConfig;
use crate::error::Pdf2EpubError;
use crate::output::{ConversionOutput, ConversionStats, ToolchainReport};
use crate::pipeline::{exec, input, marker, pandoc};
use crate::progress::Stage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file to an EPUB next to it.
///
/// This is the primary entry point for the library. The EPUB lands at the
/// input path with its extension replaced by `.epub`; use [`convert_to`] to
/// choose the destination.
///
/// # Errors
/// - input validation: [`Pdf2EpubError::FileNotFound`],
///   [`Pdf2EpubError::PermissionDenied`], [`Pdf2EpubError::NotAPdf`]
/// - tool failures: [`Pdf2EpubError::ToolMissing`],
///   [`Pdf2EpubError::ToolFailed`] carrying the tool's own stderr
/// - missing artifacts: [`Pdf2EpubError::MarkdownNotFound`],
///   [`Pdf2EpubError::EpubNotCreated`]
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    let input = input.as_ref();
    let output = input::default_output_path(input);
    convert_to(input, output, config).await
}

/// Convert a PDF file to an EPUB at an explicit output path.
pub async fn convert_to(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    let output = output.as_ref();
    info!(
        "Starting conversion: {} -> {}",
        input.display(),
        output.display()
    );

    // ── Step 1: Validate input ───────────────────────────────────────────
    input::validate_pdf(input)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(input);
    }

    // ── Step 2: Stage a work directory ───────────────────────────────────
    let workdir = tempfile::Builder::new()
        .prefix("pdf2epub-")
        .tempdir()
        .map_err(|e| Pdf2EpubError::Internal(format!("Failed to create work directory: {e}")))?;
    debug!("Work directory: {}", workdir.path().display());

    // ── Step 3: Extract Markdown with Marker ─────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::MarkerExtract);
    }
    let artifacts = marker::extract(input, workdir.path(), config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::MarkerExtract, artifacts.duration_ms);
    }

    let markdown_bytes = tokio::fs::metadata(&artifacts.markdown_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    // ── Step 4: Persist intermediate Markdown if requested ───────────────
    // Before Pandoc runs, so the copy survives a packaging failure.
    let markdown_path = match config.save_markdown {
        Some(ref dest) => {
            save_markdown_copy(&artifacts.markdown_path, dest).await?;
            Some(dest.clone())
        }
        None => None,
    };

    // ── Step 5: Package EPUB with Pandoc ─────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::PandocPackage);
    }
    let pandoc_duration_ms =
        pandoc::package(&artifacts.markdown_path, output, &artifacts.resource_dir, config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::PandocPackage, pandoc_duration_ms);
    }

    // ── Step 6: Assemble stats ───────────────────────────────────────────
    let stats = ConversionStats {
        page_count: artifacts.page_count,
        image_count: artifacts.image_count,
        markdown_bytes,
        marker_duration_ms: artifacts.duration_ms,
        pandoc_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} ({} page(s), {}ms total)",
        output.display(),
        stats
            .page_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string()),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(output);
    }

    Ok(ConversionOutput {
        epub_path: output.to_path_buf(),
        markdown_path,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2EpubError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input, config))
}

/// Probe the external toolchain without converting anything.
///
/// Never fails: each tool's availability, version, and install hint are
/// folded into the report so callers can show everything that is wrong at
/// once rather than one missing tool per run.
pub async fn doctor(config: &ConversionConfig) -> ToolchainReport {
    let marker = exec::probe(exec::Tool::Marker, &config.marker_program).await;
    let pandoc = exec::probe(exec::Tool::Pandoc, &config.pandoc_program).await;
    ToolchainReport { marker, pandoc }
}

/// Copy the extracted Markdown out of the work directory.
async fn save_markdown_copy(from: &Path, to: &Path) -> Result<(), Pdf2EpubError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2EpubError::OutputWriteFailed {
                path: to.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| Pdf2EpubError::OutputWriteFailed {
            path: to.to_path_buf(),
            source: e,
        })?;
    info!("Saved intermediate Markdown to {}", to.display());
    Ok(())
}
