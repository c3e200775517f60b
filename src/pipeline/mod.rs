//! Pipeline stages for PDF-to-EPUB conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. point at a different extraction tool) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ marker ──────▶ pandoc
//! (path)    (Markdown      (EPUB)
//!            + images)
//! ```
//!
//! 1. [`input`]       — validate the PDF path and derive the default output path
//! 2. [`model_cache`] — pre-flight sweep of Marker's model cache so a prior
//!    interrupted download cannot wedge the extraction step
//! 3. [`marker`]      — drive `marker_single` and locate the Markdown, image,
//!    and metadata artifacts it leaves behind
//! 4. [`pandoc`]      — assemble the Pandoc argument list and package the EPUB
//!
//! [`exec`] underpins stages 3 and 4: it spawns the external tool, relays its
//! output into our logs, and classifies spawn/exit failures.

pub mod exec;
pub mod input;
pub mod marker;
pub mod model_cache;
pub mod pandoc;
