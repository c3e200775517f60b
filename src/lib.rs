//! # pdf2epub
//!
//! Convert PDF documents to Kindle-ready EPUB ebooks.
//!
//! ## Why this crate?
//!
//! Going straight from PDF to EPUB with a single converter produces garbled
//! results on anything with real layout: multi-column text, math, figures,
//! and tables lose structure or reading order. This crate instead chains two
//! tools that are each excellent at one half of the problem: [Marker] reads
//! the PDF with ML layout analysis and emits clean Markdown, then [Pandoc]
//! packages that Markdown into a valid EPUB 3 with metadata Kindle accepts.
//!
//! Both tools run as external programs; this crate contributes the
//! orchestration, the artifact plumbing between them, and the metadata
//! defaults that make the result ingestible by Send to Kindle.
//!
//! [Marker]: https://github.com/datalab-to/marker
//! [Pandoc]: https://pandoc.org
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate path, magic bytes, extension
//!  ├─ 2. Marker  extract Markdown + images into a temp work dir
//!  │             (model cache swept first so stale downloads self-heal)
//!  └─ 3. Pandoc  package EPUB 3 with math translation, metadata,
//!                language and date always set
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2epub::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .title("Attention Is All You Need")
//!         .author("Vaswani et al.")
//!         .build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     println!("wrote {}", output.epub_path.display());
//!     eprintln!("marker: {}ms, pandoc: {}ms",
//!         output.stats.marker_duration_ms,
//!         output.stats.pandoc_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2epub` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2epub = { version = "0.1", default-features = false }
//! ```
//!
//! ## External requirements
//!
//! | Tool | Install | Used for |
//! |------|---------|----------|
//! | `marker_single` | `pip install marker-pdf` | PDF → Markdown extraction |
//! | `pandoc`        | `apt install pandoc` / `brew install pandoc` | Markdown → EPUB packaging |
//!
//! Run [`doctor`] (or `pdf2epub --check-tools`) to verify both before a long
//! conversion.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MathFormat};
pub use convert::{convert, convert_sync, convert_to, doctor};
pub use error::Pdf2EpubError;
pub use output::{ConversionOutput, ConversionStats, ToolStatus, ToolchainReport};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
