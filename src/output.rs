//! Output types returned by the conversion entry points.
//!
//! Everything here derives `Serialize`/`Deserialize` so callers can persist a
//! run summary, emit it as JSON from the CLI, or feed it to a job queue
//! without writing any glue.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a successful PDF-to-EPUB conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path of the EPUB that was written.
    pub epub_path: PathBuf,

    /// Path of the persisted intermediate Markdown, when
    /// [`crate::ConversionConfig::save_markdown`] was set.
    pub markdown_path: Option<PathBuf>,

    /// Timing and size statistics for the run.
    pub stats: ConversionStats,
}

/// Statistics about a conversion run.
///
/// `page_count` is `None` when Marker's metadata sidecar was missing or
/// unparseable; the conversion itself is unaffected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source PDF, as reported by Marker.
    pub page_count: Option<usize>,

    /// Images Marker extracted alongside the Markdown (figures, charts).
    pub image_count: usize,

    /// Byte length of the intermediate Markdown.
    pub markdown_bytes: u64,

    /// Wall-clock time of the Marker extraction step.
    pub marker_duration_ms: u64,

    /// Wall-clock time of the Pandoc packaging step.
    pub pandoc_duration_ms: u64,

    /// Wall-clock time of the whole conversion, including validation and
    /// temp-dir setup.
    pub total_duration_ms: u64,
}

/// Probe result for one external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    /// Human-readable tool name ("Marker", "Pandoc").
    pub tool: String,

    /// The program the probe actually invoked, after config overrides.
    pub program: String,

    /// Whether the program could be spawned and exited successfully.
    pub available: bool,

    /// First line of the tool's version output, when it reports one.
    pub version: Option<String>,

    /// Install hint shown when the tool is unavailable.
    pub hint: Option<String>,
}

/// Result of probing the external toolchain, as returned by [`crate::doctor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainReport {
    pub marker: ToolStatus,
    pub pandoc: ToolStatus,
}

impl ToolchainReport {
    /// True when every tool in the pipeline can be spawned.
    pub fn all_available(&self) -> bool {
        self.marker.available && self.pandoc.available
    }
}
