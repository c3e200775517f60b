//! CLI binary for pdf2epub.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2epub::{
    convert_to, doctor, ConversionConfig, ConversionProgressCallback, MathFormat,
    ProgressCallback, Stage, ToolStatus,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner with the current stage name.
///
/// A counter bar makes no sense here: the pipeline has exactly two stages of
/// wildly different lengths, and Marker gives no per-page signal from the
/// outside. The spinner plus elapsed time is honest about what we know.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_spinner() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Validating input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn stage_labels(stage: Stage) -> (&'static str, &'static str) {
        match stage {
            Stage::MarkerExtract => ("Extracting", "Marker reading the PDF (slow on CPU)…"),
            Stage::PandocPackage => ("Packaging", "Pandoc assembling the EPUB…"),
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &std::path::Path) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {}…", input.display()))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        let (prefix, message) = Self::stage_labels(stage);
        self.bar.set_prefix(prefix);
        self.bar.set_message(message);
    }

    fn on_stage_complete(&self, stage: Stage, duration_ms: u64) {
        self.bar.println(format!(
            "  {} {:<8}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
    }

    fn on_conversion_complete(&self, _epub: &std::path::Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes document.epub next to the PDF)
  pdf2epub document.pdf

  # Choose the output path
  pdf2epub document.pdf -o ~/books/document.epub

  # Full metadata for a polished ebook
  pdf2epub paper.pdf --title "Attention Is All You Need" \
      --author "Vaswani et al." --cover cover.jpg

  # MathML math for recent Kindles instead of SVG images
  pdf2epub thesis.pdf --math mathml

  # German book, keep the intermediate Markdown for manual fix-ups
  pdf2epub buch.pdf --language de --save-markdown buch.md

  # Verify marker_single and pandoc are installed
  pdf2epub --check-tools

  # Machine-readable run summary
  pdf2epub document.pdf --json > summary.json

EXTERNAL TOOLS:
  This program orchestrates two external converters:

    marker_single   pip install marker-pdf
    pandoc          apt install pandoc   (or: brew install pandoc)

  Marker downloads ~3 GB of models on first use (override the location with
  DATALAB_MODELS_HOME). With no GPU it falls back to CPU; expect minutes per
  document rather than seconds.

ENVIRONMENT VARIABLES:
  PDF2EPUB_LANGUAGE      Default EPUB language tag
  PDF2EPUB_MARKER        Marker program name or path
  PDF2EPUB_PANDOC        Pandoc program name or path
  DATALAB_MODELS_HOME    Marker model cache directory

SETUP:
  1. Install tools:   pip install marker-pdf && apt install pandoc
  2. Verify:          pdf2epub --check-tools
  3. Convert:         pdf2epub document.pdf
"#;

/// Convert PDF documents to Kindle-ready EPUB ebooks.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2epub",
    version,
    about = "Convert PDF documents to Kindle-ready EPUB ebooks",
    long_about = "Convert PDF documents to EPUB in two stages: Marker extracts clean Markdown \
with ML layout analysis, then Pandoc packages it as EPUB 3 with metadata that passes \
Send to Kindle validation. Both tools must be installed separately.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    #[arg(required_unless_present = "check_tools")]
    input: Option<PathBuf>,

    /// Output EPUB path. Default: input path with .epub extension.
    #[arg(short, long, env = "PDF2EPUB_OUTPUT")]
    output: Option<PathBuf>,

    /// Book title for the EPUB metadata.
    #[arg(short, long)]
    title: Option<String>,

    /// Author for the EPUB metadata.
    #[arg(short, long)]
    author: Option<String>,

    /// Cover image path (jpg/png). Skipped with a warning if missing.
    #[arg(short, long)]
    cover: Option<PathBuf>,

    /// Math rendering: svg (works everywhere) or mathml (crisp on recent Kindles).
    #[arg(short, long, value_enum, default_value = "svg")]
    math: MathArg,

    /// EPUB language tag (BCP 47), e.g. en, de, pt-BR.
    #[arg(short, long, env = "PDF2EPUB_LANGUAGE", default_value = "en")]
    language: String,

    /// Also save the intermediate Markdown to this path.
    #[arg(short, long)]
    save_markdown: Option<PathBuf>,

    /// Skip the generated table of contents.
    #[arg(long)]
    no_toc: bool,

    /// Marker program name or path.
    #[arg(long, env = "PDF2EPUB_MARKER", default_value = "marker_single")]
    marker_program: String,

    /// Pandoc program name or path.
    #[arg(long, env = "PDF2EPUB_PANDOC", default_value = "pandoc")]
    pandoc_program: String,

    /// Check that the external tools are installed, then exit.
    #[arg(long)]
    check_tools: bool,

    /// Output a structured JSON run summary instead of human-readable text.
    #[arg(long, env = "PDF2EPUB_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2EPUB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (includes relayed tool output).
    #[arg(short, long, env = "PDF2EPUB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2EPUB_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MathArg {
    Svg,
    Mathml,
}

impl From<MathArg> for MathFormat {
    fn from(v: MathArg) -> Self {
        match v {
            MathArg::Svg => MathFormat::Svg,
            MathArg::Mathml => MathFormat::Mathml,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Toolchain check mode ─────────────────────────────────────────────
    if cli.check_tools {
        return run_check_tools(&cli).await;
    }

    let input = cli
        .input
        .clone()
        .context("missing input PDF (see --help)")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_spinner();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("epub"));

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_to(&input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        let pages = output
            .stats
            .page_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&output.epub_path.display().to_string()),
            dim(&format!(
                "{:.1}s",
                output.stats.total_duration_ms as f64 / 1000.0
            )),
        );
        eprintln!(
            "   {} page(s)  {} image(s)  {}",
            pages,
            output.stats.image_count,
            dim(&format!(
                "marker {:.1}s, pandoc {:.1}s",
                output.stats.marker_duration_ms as f64 / 1000.0,
                output.stats.pandoc_duration_ms as f64 / 1000.0
            )),
        );
        if let Some(ref md) = output.markdown_path {
            eprintln!("   markdown saved to {}", md.display());
        }
    }

    Ok(())
}

/// `--check-tools`: probe the toolchain, print a report, exit nonzero if
/// anything is missing.
async fn run_check_tools(cli: &Cli) -> Result<()> {
    let config = ConversionConfig::builder()
        .marker_program(cli.marker_program.clone())
        .pandoc_program(cli.pandoc_program.clone())
        .build()
        .context("Invalid configuration")?;

    let report = doctor(&config).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else {
        print_tool_status(&report.marker);
        print_tool_status(&report.pandoc);
    }

    if !report.all_available() {
        // The report above already says what to install.
        std::process::exit(1);
    }
    Ok(())
}

fn print_tool_status(status: &ToolStatus) {
    if status.available {
        let version = status.version.as_deref().map(dim).unwrap_or_default();
        println!("{} {:<8} {}  {}", green("✓"), status.tool, status.program, version);
    } else {
        println!("{} {:<8} {}  {}", red("✗"), status.tool, status.program, red("not found"));
        if let Some(ref hint) = status.hint {
            println!("    {}", dim(hint));
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .math(cli.math.into())
        .language(cli.language.clone())
        .toc(!cli.no_toc)
        .marker_program(cli.marker_program.clone())
        .pandoc_program(cli.pandoc_program.clone());

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref author) = cli.author {
        builder = builder.author(author.clone());
    }
    if let Some(ref cover) = cli.cover {
        builder = builder.cover(cover.clone());
    }
    if let Some(ref path) = cli.save_markdown {
        builder = builder.save_markdown(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
