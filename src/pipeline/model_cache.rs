//! Marker model cache hygiene.
//!
//! ## Why sweep before running Marker?
//!
//! On first use Marker downloads several gigabytes of layout, detection, and
//! OCR models into a per-user cache, one `{model}/{version}/` directory per
//! model. A download interrupted by Ctrl-C or a network drop leaves a version
//! directory holding only git bookkeeping files, and Marker then fails at
//! startup with an opaque missing-weights error instead of re-downloading.
//! Removing such stubs before each run lets Marker heal itself.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files that exist in a version directory from the moment the download
/// starts. They carry no model data and don't count toward completeness.
const GIT_BOOKKEEPING: &[&str] = &[".gitattributes", ".gitignore", "README.md"];

/// A version directory with fewer real files than this is treated as an
/// interrupted download. Complete model snapshots ship weights, a config,
/// and a preprocessor spec at minimum.
const MIN_COMPLETE_FILES: usize = 3;

/// Locate Marker's model cache directory.
///
/// `DATALAB_MODELS_HOME` overrides everything, mirroring the variable Marker
/// itself honours. Otherwise the platform cache directory is used: on Windows
/// Marker nests its cache as `datalab/datalab/Cache/models` under local app
/// data, elsewhere it is `datalab/models` under `XDG_CACHE_HOME`-style cache
/// roots.
///
/// Returns `None` when the platform reports no cache directory at all.
pub fn model_cache_dir() -> Option<PathBuf> {
    resolve_cache_dir(std::env::var_os("DATALAB_MODELS_HOME"))
}

fn resolve_cache_dir(env_override: Option<OsString>) -> Option<PathBuf> {
    if let Some(home) = env_override {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    let cache_root = dirs::cache_dir()?;
    if cfg!(windows) {
        Some(
            cache_root
                .join("datalab")
                .join("datalab")
                .join("Cache")
                .join("models"),
        )
    } else {
        Some(cache_root.join("datalab").join("models"))
    }
}

/// Remove incomplete model downloads under `cache_dir`.
///
/// Walks the two-level `{model}/{version}/` layout and deletes every version
/// directory whose non-bookkeeping file count is below
/// [`MIN_COMPLETE_FILES`]. Failures to list or remove are logged and skipped;
/// cache hygiene must never abort a conversion.
///
/// Returns the number of directories removed.
pub fn clean_incomplete_downloads(cache_dir: &Path) -> usize {
    if !cache_dir.exists() {
        debug!(
            "Model cache directory does not exist, nothing to clean: {}",
            cache_dir.display()
        );
        return 0;
    }

    let mut removed = 0;
    for version_dir in version_dirs(cache_dir) {
        let real_files = match count_real_files(&version_dir) {
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to inspect {}: {}", version_dir.display(), e);
                continue;
            }
        };

        if real_files >= MIN_COMPLETE_FILES {
            continue;
        }

        info!(
            "Removing incomplete model download: {} ({} file(s))",
            version_dir.display(),
            real_files
        );
        match std::fs::remove_dir_all(&version_dir) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove {}: {}", version_dir.display(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} incomplete model download(s)", removed);
    }
    removed
}

/// All `{model}/{version}` subdirectories of the cache root.
fn version_dirs(cache_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for model_dir in subdirectories(cache_dir) {
        dirs.extend(subdirectories(&model_dir));
    }
    dirs
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            warn!("Failed to list {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}

/// Count regular files that are not git bookkeeping.
fn count_real_files(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name();
        let is_bookkeeping = GIT_BOOKKEEPING
            .iter()
            .any(|g| name.eq_ignore_ascii_case(g));
        if !is_bookkeeping {
            count += 1;
        }
    }
    Ok(count)
}
