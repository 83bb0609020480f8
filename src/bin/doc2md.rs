//! CLI binary for edgequake-doc2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EngineConfig`, runs one batch and prints the size comparison.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2md::config;
use edgequake_doc2md::pipeline::input;
use edgequake_doc2md::{
    process_batch, write_artifacts, ArtifactKind, BatchEntry, BatchOutput, BatchProgressCallback,
    BatchStats, ConversionEngine, Doc2MdError, EngineConfig, MarkdownEngine, ProgressCallback,
    SizeReport, UploadedFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
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

/// Live progress bar with one log line per finished file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, report: &SizeReport) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{:.1}% smaller", report.reduction_percent)),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if converted == 0 { red("✘") } else { cyan("⚠") },
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview a document as Markdown (stdout)
  doc2md report.docx

  # Convert several files, write .md and .txt next to each other
  doc2md report.docx slides.pptx budget.xlsx -o converted/

  # Only Markdown artifacts, four files at a time
  doc2md --format md --concurrency 4 *.pdf -o out/

  # Convert a web page with a custom User-Agent
  doc2md --user-agent "doc2md/0.1" https://example.org/notes.html

  # Machine-readable batch result
  doc2md --json report.docx notes.html > batch.json

SUPPORTED FORMATS:
  .docx  .pptx  .xlsx  .pdf  .html

ENVIRONMENT VARIABLES:
  DOC2MD_USER_AGENT   Outbound User-Agent header
  DOC2MD_TIMEOUT      Outbound request timeout in seconds
  DOC2MD_CONCURRENCY  Files converted at once
  PDFIUM_LIB_PATH     Path to the pdfium shared library used for PDFs
  RUST_LOG            Override the log filter (e.g. edgequake_doc2md=debug)
"#;

/// Convert Office documents, PDFs and HTML to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert DOCX, XLSX, PPTX, PDF and HTML files to Markdown and plain text",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write `<name>_converted.md` / `.txt` into this directory instead of
    /// printing Markdown to stdout.
    #[arg(short, long, env = "DOC2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Which artifacts to write with --output-dir.
    #[arg(long, env = "DOC2MD_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// User-Agent header for outbound requests.
    #[arg(long, env = "DOC2MD_USER_AGENT", default_value = config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Extra outbound header as `Name: value` (repeatable).
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Outbound request timeout in seconds.
    #[arg(long, env = "DOC2MD_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Number of files converted at once.
    #[arg(short, long, env = "DOC2MD_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Give up on a single file after this many seconds.
    #[arg(long, env = "DOC2MD_FILE_TIMEOUT")]
    file_timeout: Option<u64>,

    /// Directory for scratch copies of PDF/XLSX inputs.
    #[arg(long, env = "DOC2MD_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Output the structured batch result as JSON.
    #[arg(long, env = "DOC2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Txt,
    Both,
}

impl FormatArg {
    fn kinds(self) -> &'static [ArtifactKind] {
        match self {
            FormatArg::Md => &[ArtifactKind::Markdown],
            FormatArg::Txt => &[ArtifactKind::PlainText],
            FormatArg::Both => &ArtifactKind::ALL,
        }
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// A CLI input after resolution: either ready to convert or already failed.
enum Slot {
    Pending,
    Failed(BatchEntry),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
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

    // ── Build config + engine ────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let engine = MarkdownEngine::new(&config).context("Failed to initialise conversion engine")?;

    // ── Resolve inputs ───────────────────────────────────────────────────
    // Unreadable local paths abort; a URL that cannot be fetched only fails
    // its own entry.
    let start = Instant::now();
    let mut slots = Vec::with_capacity(cli.inputs.len());
    let mut files: Vec<UploadedFile> = Vec::with_capacity(cli.inputs.len());
    for arg in &cli.inputs {
        if input::is_url(arg) {
            match engine.fetch(arg).await {
                Ok(file) => {
                    files.push(file);
                    slots.push(Slot::Pending);
                }
                Err(e) => slots.push(Slot::Failed(fetch_failure(arg, e))),
            }
        } else {
            let file = input::read_local(arg)
                .await
                .with_context(|| format!("Cannot read input '{arg}'"))?;
            files.push(file);
            slots.push(Slot::Pending);
        }
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let engine: Arc<dyn ConversionEngine> = Arc::new(engine);
    let converted = process_batch(files, &engine, &config).await;
    let output = merge(slots, converted, start.elapsed().as_millis() as u64);

    // ── Emit results ─────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref dir) = cli.output_dir {
        for entry in &output.entries {
            let paths = write_artifacts(entry, dir, cli.format.kinds())
                .await
                .with_context(|| format!("Failed to write artifacts for '{}'", entry.file.name))?;
            if !cli.quiet {
                for p in paths {
                    eprintln!("  {} {}", dim("→"), p.display());
                }
            }
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let multiple = output.entries.len() > 1;
        for entry in output.entries.iter().filter(|e| e.is_success()) {
            if multiple {
                writeln!(handle, "<!-- {} -->", entry.file.name)
                    .context("Failed to write to stdout")?;
            }
            handle
                .write_all(entry.result.content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet && !cli.json {
        print_size_table(&output);
    }

    if output.stats.total_files > 0 && output.stats.converted_files == 0 {
        anyhow::bail!("None of the {} input files could be converted", output.stats.total_files);
    }
    Ok(())
}

/// Map CLI args to `EngineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EngineConfig> {
    let mut builder = EngineConfig::builder()
        .user_agent(cli.user_agent.clone())
        .timeout_secs(cli.timeout)
        .concurrency(cli.concurrency)
        .file_timeout_secs(cli.file_timeout);

    for (name, value) in &cli.headers {
        builder = builder.header(name.clone(), value.clone());
    }
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Failed entry for a URL that could not be downloaded, named like a
/// successful fetch would have been.
fn fetch_failure(url: &str, err: Doc2MdError) -> BatchEntry {
    let name = input::filename_from_url(url);
    let error = err.into_file_error(&name);
    BatchEntry::failed(UploadedFile::new(name, Vec::new()), error, 0)
}

/// Put pre-failed inputs back at their original positions.
fn merge(slots: Vec<Slot>, converted: BatchOutput, duration_ms: u64) -> BatchOutput {
    let mut converted = converted.entries.into_iter();
    let entries: Vec<BatchEntry> = slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Pending => converted.next(),
            Slot::Failed(entry) => Some(entry),
        })
        .collect();
    let stats = BatchStats::from_entries(&entries, duration_ms);
    BatchOutput { entries, stats }
}

/// Size-comparison table, one row per file.
fn print_size_table(output: &BatchOutput) {
    let width = output
        .entries
        .iter()
        .map(|e| e.file.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    eprintln!();
    eprintln!(
        "{}",
        bold(&format!(
            "{:<width$}  {:>12}  {:>13}  {:>9}",
            "File", "Original KB", "Converted KB", "Reduction"
        ))
    );
    for entry in &output.entries {
        match (&entry.report, &entry.result.error) {
            (Some(r), _) => eprintln!(
                "{:<width$}  {:>12.2}  {:>13.2}  {:>8.1}%",
                entry.file.name,
                r.original_kb(),
                r.converted_kb(),
                r.reduction_percent
            ),
            (None, Some(e)) => eprintln!("{:<width$}  {}", entry.file.name, red(&e.user_message())),
            (None, None) => {}
        }
    }

    let stats = &output.stats;
    eprintln!(
        "{}",
        dim(&format!(
            "{}/{} converted in {}ms, {:.1}% smaller overall",
            stats.converted_files,
            stats.total_files,
            stats.duration_ms,
            stats.overall_reduction_percent()
        ))
    );
}
