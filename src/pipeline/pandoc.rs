//! Pandoc stage: package extracted Markdown into an EPUB.
//!
//! ## Metadata rules
//!
//! Title, author, and cover are only passed when the caller provided them.
//! Language and date are passed unconditionally: Pandoc omits `dc:language`
//! and `dc:date` from the package document unless told otherwise, and Send
//! to Kindle rejects EPUBs without a language element. The date is today in
//! UTC so the produced file does not depend on the host's timezone.

use crate::config::ConversionConfig;
use crate::error::Pdf2EpubError;
use crate::pipeline::exec;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, warn};

/// Run Pandoc, turning `markdown` into an EPUB at `output`.
///
/// Returns the wall-clock duration of the Pandoc run.
pub async fn package(
    markdown: &Path,
    output: &Path,
    resource_dir: &Path,
    config: &ConversionConfig,
) -> Result<u64, Pdf2EpubError> {
    info!(
        "Packaging EPUB with Pandoc: {} -> {}",
        markdown.display(),
        output.display()
    );

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2EpubError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
    }

    let today = today_utc()?;
    let args = build_args(markdown, output, resource_dir, config, &today);
    let run = exec::run_tool(exec::Tool::Pandoc, &config.pandoc_program, &args).await?;

    // Belt and braces: pandoc has exited 0 without writing anything when
    // given certain malformed inputs.
    if !output.is_file() {
        return Err(Pdf2EpubError::EpubNotCreated {
            path: output.to_path_buf(),
        });
    }

    info!("Pandoc packaging complete: {}", output.display());
    Ok(run.duration_ms)
}

/// Today's date in UTC, `YYYY-MM-DD`.
fn today_utc() -> Result<String, Pdf2EpubError> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    time::OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .map_err(|e| Pdf2EpubError::Internal(format!("date formatting failed: {e}")))
}

/// Assemble the full Pandoc command line.
///
/// Kept free of subprocess and clock access so the argument contract is
/// directly testable.
fn build_args(
    markdown: &Path,
    output: &Path,
    resource_dir: &Path,
    config: &ConversionConfig,
    today: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        markdown.into(),
        OsString::from("--from"),
        OsString::from("markdown"),
        OsString::from("--to"),
        OsString::from("epub3"),
        OsString::from("--output"),
        output.into(),
    ];

    if resource_dir.exists() {
        args.push(OsString::from("--resource-path"));
        args.push(resource_dir.into());
        debug!("Using resource path: {}", resource_dir.display());
    }

    args.push(OsString::from(config.math.pandoc_flag()));

    if let Some(ref title) = config.title {
        args.push(OsString::from("--metadata"));
        args.push(OsString::from(format!("title={title}")));
    }
    if let Some(ref author) = config.author {
        args.push(OsString::from("--metadata"));
        args.push(OsString::from(format!("author={author}")));
    }

    // Always present, never optional. See module docs.
    args.push(OsString::from("--metadata"));
    args.push(OsString::from(format!("lang={}", config.language)));
    args.push(OsString::from("--metadata"));
    args.push(OsString::from(format!("date={today}")));

    if let Some(ref cover) = config.cover {
        if cover.exists() {
            args.push(OsString::from("--epub-cover-image"));
            args.push(cover.as_path().into());
        } else {
            warn!("Cover image not found, skipping: {}", cover.display());
        }
    }

    args.push(OsString::from("--standalone"));
    if config.toc {
        args.push(OsString::from("--toc"));
    }

    args
}
