//! Configuration types for PDF-to-EPUB conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them alongside a run, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Pdf2EpubError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF-to-EPUB conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2epub::{ConversionConfig, MathFormat};
///
/// let config = ConversionConfig::builder()
///     .title("Attention Is All You Need")
///     .author("Vaswani et al.")
///     .math(MathFormat::Mathml)
///     .language("de")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Book title embedded in the EPUB metadata. If None, readers fall back
    /// to whatever Pandoc infers from the Markdown (usually the filename).
    pub title: Option<String>,

    /// Author name embedded in the EPUB metadata.
    pub author: Option<String>,

    /// Cover image path. Passed to Pandoc as `--epub-cover-image`.
    ///
    /// A missing file is logged as a warning and skipped rather than aborting
    /// the run: by the time the cover is applied, minutes of Marker inference
    /// have already been spent and the EPUB is still perfectly usable without
    /// one.
    pub cover: Option<PathBuf>,

    /// How LaTeX math in the extracted Markdown is rendered in the EPUB.
    /// Default: [`MathFormat::Svg`].
    pub math: MathFormat,

    /// BCP 47 language tag written as the EPUB `dc:language` element. Default: "en".
    ///
    /// Always emitted, even when the caller never sets it. Kindle's ingestion
    /// pipeline rejects EPUBs whose package document lacks a language element,
    /// so there is no "unset" state — only the default.
    pub language: String,

    /// Also persist the intermediate Markdown to this path.
    ///
    /// The Markdown lives in a temporary directory that is deleted when the
    /// conversion returns; set this to keep a copy for manual fix-ups before
    /// a re-run, or for debugging extraction quality.
    pub save_markdown: Option<PathBuf>,

    /// Generate a table of contents from the Markdown headings. Default: true.
    pub toc: bool,

    /// Program name or path for the Marker extraction step. Default: "marker_single".
    ///
    /// Resolved through `PATH` like any other command. Point this at a
    /// virtualenv's `bin/marker_single` when Marker is not installed globally.
    pub marker_program: String,

    /// Program name or path for the Pandoc packaging step. Default: "pandoc".
    pub pandoc_program: String,

    /// Sweep incomplete model downloads from Marker's cache before extraction.
    /// Default: true.
    ///
    /// Marker downloads ~3 GB of layout and OCR models on first use. An
    /// interrupted download leaves a version directory with only git
    /// bookkeeping files in it, and Marker then fails at startup instead of
    /// re-downloading. The sweep removes such directories so the next run
    /// heals itself.
    pub clean_model_cache: bool,

    /// Progress callback invoked at stage boundaries. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            cover: None,
            math: MathFormat::default(),
            language: "en".to_string(),
            save_markdown: None,
            toc: true,
            marker_program: "marker_single".to_string(),
            pandoc_program: "pandoc".to_string(),
            clean_model_cache: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("title", &self.title)
            .field("author", &self.author)
            .field("cover", &self.cover)
            .field("math", &self.math)
            .field("language", &self.language)
            .field("save_markdown", &self.save_markdown)
            .field("toc", &self.toc)
            .field("marker_program", &self.marker_program)
            .field("pandoc_program", &self.pandoc_program)
            .field("clean_model_cache", &self.clean_model_cache)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = Some(author.into());
        self
    }

    pub fn cover(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cover = Some(path.into());
        self
    }

    pub fn math(mut self, format: MathFormat) -> Self {
        self.config.math = format;
        self
    }

    pub fn language(mut self, tag: impl Into<String>) -> Self {
        self.config.language = tag.into();
        self
    }

    pub fn save_markdown(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.save_markdown = Some(path.into());
        self
    }

    pub fn toc(mut self, v: bool) -> Self {
        self.config.toc = v;
        self
    }

    pub fn marker_program(mut self, program: impl Into<String>) -> Self {
        self.config.marker_program = program.into();
        self
    }

    pub fn pandoc_program(mut self, program: impl Into<String>) -> Self {
        self.config.pandoc_program = program.into();
        self
    }

    pub fn clean_model_cache(mut self, v: bool) -> Self {
        self.config.clean_model_cache = v;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2EpubError> {
        let c = &self.config;
        if c.language.is_empty() || c.language.chars().any(char::is_whitespace) {
            return Err(Pdf2EpubError::InvalidConfig(format!(
                "Language must be a non-empty tag without whitespace, got {:?}",
                c.language
            )));
        }
        if c.marker_program.is_empty() {
            return Err(Pdf2EpubError::InvalidConfig(
                "Marker program must not be empty".into(),
            ));
        }
        if c.pandoc_program.is_empty() {
            return Err(Pdf2EpubError::InvalidConfig(
                "Pandoc program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How LaTeX math expressions survive the trip into the EPUB.
///
/// Marker emits math as LaTeX (`$…$`, `$$…$$`). EPUB readers cannot render
/// LaTeX, so Pandoc must translate it at packaging time. Two translations
/// exist because no single one works everywhere:
///
/// | Format | Pandoc flag | Trade-off |
/// |--------|-------------|-----------|
/// | Svg    | `--webtex`  | Images render on every device, but scale poorly on high-DPI screens |
/// | Mathml | `--mathml`  | Native text rendering, crisp at any size; only honoured by readers with MathML support (recent Kindles, Apple Books) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathFormat {
    /// Rasterise each expression to an SVG image via a web service. (default)
    #[default]
    Svg,
    /// Embed expressions as MathML markup.
    Mathml,
}

impl MathFormat {
    /// The Pandoc command-line flag selecting this math translation.
    pub fn pandoc_flag(&self) -> &'static str {
        match self {
            MathFormat::Svg => "--webtex",
            MathFormat::Mathml => "--mathml",
        }
    }
}
