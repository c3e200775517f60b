//! External tool runner: spawn, relay output, classify failures.
//!
//! ## Why drain pipes while waiting?
//!
//! Marker logs model-loading progress and per-page OCR chatter to its
//! stdout/stderr. If we waited for exit before reading, a chatty run would
//! fill the OS pipe buffer (64 KiB on Linux) and deadlock the child on a
//! blocked `write()`. Both pipes are therefore consumed by concurrent tasks
//! for the whole lifetime of the child, line by line, so tool output also
//! lands in our logs in real time instead of arriving in one burst at exit.

use crate::error::Pdf2EpubError;
use crate::output::ToolStatus;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Maximum stderr lines carried into a [`Pdf2EpubError::ToolFailed`].
///
/// Marker prepends dozens of harmless warnings before the actual failure;
/// the tail is where Python tracebacks put the interesting part.
const STDERR_TAIL_LINES: usize = 40;

/// The external tools this pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Marker,
    Pandoc,
}

impl Tool {
    /// Human-readable name used in errors and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Marker => "Marker",
            Tool::Pandoc => "Pandoc",
        }
    }

    /// Prefix for relayed tool output in our logs.
    fn log_prefix(&self) -> &'static str {
        match self {
            Tool::Marker => "marker",
            Tool::Pandoc => "pandoc",
        }
    }

    /// Default program name, overridable via [`crate::ConversionConfig`].
    pub fn default_program(&self) -> &'static str {
        match self {
            Tool::Marker => "marker_single",
            Tool::Pandoc => "pandoc",
        }
    }

    /// Shown when the program cannot be found on `PATH`.
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Marker => "Install it with: pip install marker-pdf",
            Tool::Pandoc => "Install it with: apt install pandoc (or: brew install pandoc)",
        }
    }

    /// Arguments for a cheap availability probe.
    ///
    /// `marker_single` has no `--version`; `--help` exits 0 without loading
    /// any models. Pandoc's `--version` is instant and yields a version line.
    fn probe_args(&self) -> &'static [&'static str] {
        match self {
            Tool::Marker => &["--help"],
            Tool::Pandoc => &["--version"],
        }
    }

    /// Extract a version string from successful probe output, if the probe
    /// produces one.
    fn version_from(&self, stdout: &str) -> Option<String> {
        match self {
            Tool::Marker => None,
            Tool::Pandoc => stdout
                .lines()
                .next()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        }
    }
}

/// Captured output of a successfully exited tool.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Run an external tool to completion.
///
/// No timeout is applied: Marker legitimately runs for many minutes on a
/// long document, and there is no robust way to distinguish "slow" from
/// "stuck" from the outside. Callers who need a bound can wrap the future
/// in `tokio::time::timeout`.
///
/// # Errors
/// - [`Pdf2EpubError::ToolMissing`] when the program cannot be spawned
/// - [`Pdf2EpubError::ToolFailed`] when it exits nonzero or dies on a signal,
///   carrying the tail of its stderr
pub async fn run_tool(
    tool: Tool,
    program: &str,
    args: &[OsString],
) -> Result<ToolOutput, Pdf2EpubError> {
    let start = Instant::now();
    debug!(
        "Spawning {}: {} {}",
        tool.name(),
        program,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Pdf2EpubError::ToolMissing {
                    tool: tool.name().to_string(),
                    program: program.to_string(),
                    hint: tool.install_hint().to_string(),
                }
            } else {
                Pdf2EpubError::Internal(format!(
                    "Failed to spawn {} ('{}'): {}",
                    tool.name(),
                    program,
                    e
                ))
            }
        })?;

    let stdout_task = relay_lines(tool, child.stdout.take());
    let stderr_task = relay_lines(tool, child.stderr.take());

    let status = child.wait().await.map_err(|e| {
        Pdf2EpubError::Internal(format!("Failed waiting for {}: {}", tool.name(), e))
    })?;

    let stdout = stdout_task.await.map_err(|e| {
        Pdf2EpubError::Internal(format!("{} stdout reader task failed: {}", tool.name(), e))
    })?;
    let stderr = stderr_task.await.map_err(|e| {
        Pdf2EpubError::Internal(format!("{} stderr reader task failed: {}", tool.name(), e))
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;

    if !status.success() {
        return Err(Pdf2EpubError::ToolFailed {
            tool: tool.name().to_string(),
            code: status.code(),
            stderr: stderr_tail(&stderr, STDERR_TAIL_LINES),
        });
    }

    debug!("{} exited 0 in {}ms", tool.name(), duration_ms);
    Ok(ToolOutput {
        stdout,
        stderr,
        duration_ms,
    })
}

/// Probe whether a tool can be spawned at all.
///
/// Never fails: every outcome is folded into the returned [`ToolStatus`] so
/// [`crate::doctor`] can report on all tools instead of stopping at the
/// first broken one.
pub async fn probe(tool: Tool, program: &str) -> ToolStatus {
    let args: Vec<OsString> = tool.probe_args().iter().map(OsString::from).collect();

    match run_tool(tool, program, &args).await {
        Ok(output) => ToolStatus {
            tool: tool.name().to_string(),
            program: program.to_string(),
            available: true,
            version: tool.version_from(&output.stdout),
            hint: None,
        },
        Err(e) => {
            debug!("{} probe failed: {}", tool.name(), e);
            ToolStatus {
                tool: tool.name().to_string(),
                program: program.to_string(),
                available: false,
                version: None,
                hint: Some(tool.install_hint().to_string()),
            }
        }
    }
}

/// Consume a child pipe line by line, echoing into our logs and collecting
/// the full text for later inspection.
fn relay_lines<R>(tool: Tool, pipe: Option<R>) -> tokio::task::JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut collected = String::new();
        let Some(pipe) = pipe else {
            return collected;
        };
        let mut lines = BufReader::new(pipe).lines();
        // A read error (e.g. invalid UTF-8 from the tool) ends the relay but
        // keeps what arrived before it.
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("[{}] {}", tool.log_prefix(), line);
            collected.push_str(&line);
            collected.push('\n');
        }
        collected
    })
}

/// Last `max_lines` lines of a tool's stderr, with a marker when truncated.
fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        return "(no stderr output)".to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() <= max_lines {
        return trimmed.to_string();
    }
    let mut tail = format!("(…{} earlier lines omitted)\n", lines.len() - max_lines);
    tail.push_str(&lines[lines.len() - max_lines..].join("\n"));
    tail
}
