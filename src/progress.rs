//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal spinner — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so it works
//! correctly when the conversion runs inside `tokio::spawn`.
//!
//! # Example
//!
//! ```rust
//! use pdf2epub::{ConversionProgressCallback, ConversionConfig, Stage};
//! use std::sync::Arc;
//!
//! struct LoggingCallback;
//!
//! impl ConversionProgressCallback for LoggingCallback {
//!     fn on_stage_complete(&self, stage: Stage, duration_ms: u64) {
//!         eprintln!("{} finished in {}ms", stage, duration_ms);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(LoggingCallback))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A stage of the conversion pipeline.
///
/// The two stages differ wildly in duration: Marker runs ML inference and
/// takes minutes on a long document, while Pandoc packages the result in
/// seconds. Callers rendering progress should expect that skew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Marker extracting Markdown and images from the PDF.
    MarkerExtract,
    /// Pandoc packaging the Markdown into an EPUB.
    PandocPackage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MarkerExtract => write!(f, "marker"),
            Stage::PandocPackage => write!(f, "pandoc"),
        }
    }
}

/// Called by the conversion pipeline at stage boundaries.
///
/// Implementations must be `Send + Sync` (the conversion future may move
/// across threads on a multi-threaded runtime). All methods have default
/// no-op implementations so callers only override what they care about.
///
/// Events for a single conversion arrive strictly in order: the pipeline is
/// sequential, so `on_stage_start` and `on_stage_complete` never interleave
/// across stages.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after input validation, before any stage runs.
    ///
    /// # Arguments
    /// * `input` — the PDF being converted
    fn on_conversion_start(&self, input: &Path) {
        let _ = input;
    }

    /// Called just before a stage's external tool is spawned.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage's external tool has exited successfully.
    ///
    /// # Arguments
    /// * `stage`       — the stage that finished
    /// * `duration_ms` — wall-clock time the stage took
    fn on_stage_complete(&self, stage: Stage, duration_ms: u64) {
        let _ = (stage, duration_ms);
    }

    /// Called once after the EPUB has been written and verified.
    ///
    /// # Arguments
    /// * `epub` — path of the finished EPUB
    fn on_conversion_complete(&self, epub: &Path) {
        let _ = epub;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        last_duration: AtomicU64,
        stages_seen: Mutex<Vec<Stage>>,
        finished_path: Mutex<Option<PathBuf>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.stages_seen.lock().unwrap().push(stage);
        }

        fn on_stage_complete(&self, _stage: Stage, duration_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.last_duration.store(duration_ms, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, epub: &Path) {
            *self.finished_path.lock().unwrap() = Some(epub.to_path_buf());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(Path::new("book.pdf"));
        cb.on_stage_start(Stage::MarkerExtract);
        cb.on_stage_complete(Stage::MarkerExtract, 1200);
        cb.on_stage_start(Stage::PandocPackage);
        cb.on_stage_complete(Stage::PandocPackage, 80);
        cb.on_conversion_complete(Path::new("book.epub"));
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            last_duration: AtomicU64::new(0),
            stages_seen: Mutex::new(Vec::new()),
            finished_path: Mutex::new(None),
        };

        tracker.on_conversion_start(Path::new("book.pdf"));
        tracker.on_stage_start(Stage::MarkerExtract);
        tracker.on_stage_complete(Stage::MarkerExtract, 90_000);
        tracker.on_stage_start(Stage::PandocPackage);
        tracker.on_stage_complete(Stage::PandocPackage, 1_500);
        tracker.on_conversion_complete(Path::new("book.epub"));

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.last_duration.load(Ordering::SeqCst), 1_500);
        assert_eq!(
            *tracker.stages_seen.lock().unwrap(),
            vec![Stage::MarkerExtract, Stage::PandocPackage]
        );
        assert_eq!(
            tracker.finished_path.lock().unwrap().as_deref(),
            Some(Path::new("book.epub"))
        );
    }

    #[test]
    fn stage_display_names_are_stable() {
        assert_eq!(Stage::MarkerExtract.to_string(), "marker");
        assert_eq!(Stage::PandocPackage.to_string(), "pandoc");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(Path::new("in.pdf"));
        cb.on_stage_start(Stage::MarkerExtract);
        cb.on_stage_complete(Stage::MarkerExtract, 512);
    }
}
