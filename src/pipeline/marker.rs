//! Marker stage: drive `marker_single` and locate what it leaves behind.
//!
//! Marker is invoked as a subprocess rather than through its Python API, so
//! the only contract we have is its on-disk layout: for `paper.pdf` and
//! `--output_dir WORK`, current releases write
//!
//! ```text
//! WORK/paper/paper.md            extracted Markdown
//! WORK/paper/paper_meta.json     page stats, table of contents
//! WORK/paper/_page_3_Figure_1.jpeg   extracted figures, flat, same dir
//! ```
//!
//! That layout has shifted between Marker releases, so discovery prefers the
//! expected location and falls back to scanning the work directory for any
//! `.md` file before giving up.

use crate::config::ConversionConfig;
use crate::error::Pdf2EpubError;
use crate::pipeline::{exec, model_cache};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extensions counted as extracted images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tiff"];

/// What the Marker stage hands to the Pandoc stage.
#[derive(Debug)]
pub struct MarkerArtifacts {
    /// The extracted Markdown file.
    pub markdown_path: PathBuf,
    /// Directory holding the Markdown's relative image references. Becomes
    /// Pandoc's `--resource-path`.
    pub resource_dir: PathBuf,
    /// Page count from the metadata sidecar, when parseable.
    pub page_count: Option<usize>,
    /// Images extracted alongside the Markdown.
    pub image_count: usize,
    /// Wall-clock time of the `marker_single` run.
    pub duration_ms: u64,
}

/// Run Marker on `pdf`, writing artifacts under `workdir`.
pub async fn extract(
    pdf: &Path,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<MarkerArtifacts, Pdf2EpubError> {
    if config.clean_model_cache {
        sweep_model_cache().await?;
    }

    info!("Extracting Markdown with Marker: {}", pdf.display());
    let args = build_args(pdf, workdir);
    let output = exec::run_tool(exec::Tool::Marker, &config.marker_program, &args).await?;

    let stem = pdf_stem(pdf);
    let workdir = workdir.to_path_buf();
    let discovered = tokio::task::spawn_blocking(move || discover_artifacts(&workdir, &stem))
        .await
        .map_err(|e| Pdf2EpubError::Internal(format!("artifact discovery task failed: {e}")))??;

    info!(
        "Marker produced {} ({} image(s)) in {}ms",
        discovered.markdown_path.display(),
        discovered.image_count,
        output.duration_ms
    );

    Ok(MarkerArtifacts {
        resource_dir: discovered
            .markdown_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        markdown_path: discovered.markdown_path,
        page_count: discovered.page_count,
        image_count: discovered.image_count,
        duration_ms: output.duration_ms,
    })
}

/// Command line for one `marker_single` run.
fn build_args(pdf: &Path, workdir: &Path) -> Vec<OsString> {
    vec![
        pdf.into(),
        OsString::from("--output_dir"),
        workdir.into(),
        OsString::from("--output_format"),
        OsString::from("markdown"),
    ]
}

/// Remove stale incomplete model downloads so Marker can re-fetch them.
///
/// The sweep walks and possibly deletes directory trees, so it runs on the
/// blocking pool the same way other filesystem-heavy steps do.
async fn sweep_model_cache() -> Result<(), Pdf2EpubError> {
    let Some(cache_dir) = model_cache::model_cache_dir() else {
        debug!("No platform cache directory, skipping model cache sweep");
        return Ok(());
    };
    tokio::task::spawn_blocking(move || model_cache::clean_incomplete_downloads(&cache_dir))
        .await
        .map_err(|e| Pdf2EpubError::Internal(format!("model cache sweep task failed: {e}")))?;
    Ok(())
}

fn pdf_stem(pdf: &Path) -> String {
    match pdf.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => "document".to_string(),
    }
}

#[derive(Debug)]
struct DiscoveredArtifacts {
    markdown_path: PathBuf,
    page_count: Option<usize>,
    image_count: usize,
}

/// Locate the Markdown Marker wrote, plus its sidecars.
///
/// Prefers `workdir/{stem}/{stem}.md`; otherwise scans `workdir` recursively
/// and takes the first `.md` in path order, so a layout change in a future
/// Marker release degrades to a warning instead of a hard failure.
fn discover_artifacts(workdir: &Path, stem: &str) -> Result<DiscoveredArtifacts, Pdf2EpubError> {
    let expected = workdir.join(stem).join(format!("{stem}.md"));
    let markdown_path = if expected.is_file() {
        expected
    } else {
        let mut candidates = find_markdown_files(workdir);
        candidates.sort();
        match candidates.into_iter().next() {
            Some(found) => {
                warn!(
                    "Markdown not at expected path {}, using {}",
                    expected.display(),
                    found.display()
                );
                found
            }
            None => {
                return Err(Pdf2EpubError::MarkdownNotFound {
                    dir: workdir.to_path_buf(),
                })
            }
        }
    };

    let artifact_dir = markdown_path.parent().unwrap_or(workdir);
    let page_count = read_page_count(&markdown_path);
    let image_count = count_images(artifact_dir);

    Ok(DiscoveredArtifacts {
        markdown_path,
        page_count,
        image_count,
    })
}

fn find_markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return found,
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            found.extend(find_markdown_files(&path));
        } else if path.extension().is_some_and(|ext| ext == "md") {
            found.push(path);
        }
    }
    found
}

/// Subset of Marker's `{stem}_meta.json` we care about.
#[derive(Debug, Default, Deserialize)]
struct MarkerMeta {
    #[serde(default)]
    page_stats: Vec<serde_json::Value>,
}

/// Page count from the metadata sidecar next to the Markdown.
///
/// The sidecar is best-effort: conversions work fine without it, so a
/// missing or malformed file only costs us the page count in the stats.
fn read_page_count(markdown_path: &Path) -> Option<usize> {
    let stem = markdown_path.file_stem()?.to_string_lossy();
    let meta_path = markdown_path.with_file_name(format!("{stem}_meta.json"));

    let raw = match std::fs::read_to_string(&meta_path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("No metadata sidecar at {}: {}", meta_path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<MarkerMeta>(&raw) {
        Ok(meta) if !meta.page_stats.is_empty() => Some(meta.page_stats.len()),
        Ok(_) => None,
        Err(e) => {
            debug!("Unparseable metadata sidecar {}: {}", meta_path.display(), e);
            None
        }
    }
}

/// Count extracted images sitting next to the Markdown.
fn count_images(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_ascii_lowercase();
                    IMAGE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lay_out(workdir: &Path, stem: &str, meta: Option<&str>) -> PathBuf {
        let dir = workdir.join(stem);
        std::fs::create_dir_all(&dir).unwrap();
        let md = dir.join(format!("{stem}.md"));
        std::fs::write(&md, "# Title\n\nBody.\n").unwrap();
        if let Some(meta_json) = meta {
            std::fs::write(dir.join(format!("{stem}_meta.json")), meta_json).unwrap();
        }
        md
    }

    #[test]
    fn build_args_shape() {
        let args = build_args(Path::new("/in/paper.pdf"), Path::new("/work"));
        assert_eq!(args[0], OsString::from("/in/paper.pdf"));
        assert_eq!(args[1], OsString::from("--output_dir"));
        assert_eq!(args[2], OsString::from("/work"));
        assert_eq!(args[3], OsString::from("--output_format"));
        assert_eq!(args[4], OsString::from("markdown"));
    }

    #[test]
    fn discovers_expected_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let md = lay_out(
            tmp.path(),
            "paper",
            Some(r#"{"page_stats": [{"page_id": 0}, {"page_id": 1}]}"#),
        );
        std::fs::write(tmp.path().join("paper/_page_1_Figure_1.jpeg"), b"img").unwrap();
        std::fs::write(tmp.path().join("paper/_page_2_Picture_3.png"), b"img").unwrap();

        let found = discover_artifacts(tmp.path(), "paper").unwrap();
        assert_eq!(found.markdown_path, md);
        assert_eq!(found.page_count, Some(2));
        assert_eq!(found.image_count, 2);
    }

    #[test]
    fn falls_back_to_scanning_for_markdown() {
        let tmp = tempfile::tempdir().unwrap();
        // Layout from a hypothetical future release: different subdir name.
        let md = lay_out(tmp.path(), "output", None);

        let found = discover_artifacts(tmp.path(), "paper").unwrap();
        assert_eq!(found.markdown_path, md);
        assert_eq!(found.page_count, None);
    }

    #[test]
    fn missing_markdown_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("paper")).unwrap();

        let err = discover_artifacts(tmp.path(), "paper").unwrap_err();
        assert!(matches!(err, Pdf2EpubError::MarkdownNotFound { .. }));
    }

    #[test]
    fn malformed_meta_only_loses_page_count() {
        let tmp = tempfile::tempdir().unwrap();
        lay_out(tmp.path(), "paper", Some("{not json"));

        let found = discover_artifacts(tmp.path(), "paper").unwrap();
        assert_eq!(found.page_count, None);
    }

    #[test]
    fn meta_without_page_stats_yields_no_count() {
        let tmp = tempfile::tempdir().unwrap();
        lay_out(tmp.path(), "paper", Some(r#"{"table_of_contents": []}"#));

        let found = discover_artifacts(tmp.path(), "paper").unwrap();
        assert_eq!(found.page_count, None);
    }

    #[test]
    fn sidecars_are_not_counted_as_images() {
        let tmp = tempfile::tempdir().unwrap();
        lay_out(tmp.path(), "paper", Some(r#"{"page_stats": [{}]}"#));
        std::fs::write(tmp.path().join("paper/figure.JPEG"), b"img").unwrap();

        let found = discover_artifacts(tmp.path(), "paper").unwrap();
        // .md and _meta.json sit in the same directory but only the image counts.
        assert_eq!(found.image_count, 1);
        assert_eq!(found.page_count, Some(1));
    }

    #[test]
    fn pdf_stem_handles_plain_names() {
        assert_eq!(pdf_stem(Path::new("/docs/paper.pdf")), "paper");
        assert_eq!(pdf_stem(Path::new("archive.v2.pdf")), "archive.v2");
    }
}
