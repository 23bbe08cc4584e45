//! CLI binary for edgequake-pdf2svg.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, prints a status line per backend, and exits 0 on
//! success or 1 on any failure.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2svg::{
    check_dependencies, convert, BackendKind, ConversionConfig, ConversionProgressCallback,
    PdfiumMode, ProgressCallback, ToolCommand,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn paint(code: &str, s: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn green(s: &str) -> String {
    paint("32", s)
}
fn red(s: &str) -> String {
    paint("31", s)
}
fn yellow(s: &str) -> String {
    paint("33", s)
}
fn dim(s: &str) -> String {
    paint("2", s)
}
fn bold(s: &str) -> String {
    paint("1", s)
}

// ── Status printer ───────────────────────────────────────────────────────────

/// Prints one status line per backend event to stdout, and an indicatif
/// bar on stderr while PDFium is being downloaded.
struct StatusPrinter {
    install_bar: Mutex<Option<ProgressBar>>,
}

impl StatusPrinter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            install_bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.install_bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ConversionProgressCallback for StatusPrinter {
    fn on_conversion_start(&self, input: &Path, output: &Path) {
        println!(
            "Converting PDF to SVG: {} -> {}",
            bold(&input.display().to_string()),
            bold(&output.display().to_string())
        );
    }

    fn on_backend_skipped(&self, backend: &str) {
        println!("  {}", dim(&format!("· {backend} not available, skipping")));
    }

    fn on_backend_start(&self, backend: &str) {
        println!("  {}", dim(&format!("→ trying {backend}…")));
    }

    fn on_backend_failed(&self, backend: &str, error: &str, next: Option<&str>) {
        match next {
            Some(next) => println!(
                "{} {backend} conversion failed: {error}; trying {next}…",
                yellow("⚠")
            ),
            None => println!("{} {backend} conversion failed: {error}", red("✗")),
        }
    }

    fn on_backend_succeeded(&self, backend: &str, svg_path: &Path) {
        println!(
            "{} converted with {backend}: {}",
            green("✓"),
            svg_path.display()
        );
    }

    fn on_install_start(&self) {
        println!("  {}", dim("PDFium not found; downloading it once…"));
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("PDF engine");
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.install_bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_install_progress(&self, downloaded: u64, total: Option<u64>) {
        self.with_bar(|bar| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        });
    }

    fn on_install_complete(&self, library: &Path) {
        self.with_bar(|bar| bar.finish_with_message("ready ✓"));
        println!(
            "{} PDFium installed at {}",
            green("✓"),
            library.display()
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default: convert logo.pdf -> logo.svg
  pdf-to-svg

  # Convert a specific file
  pdf-to-svg myicon.pdf

  # Choose the output file name
  pdf-to-svg -o icon.svg

  # Only use Poppler, never fall back to PDFium
  pdf-to-svg --backends pdftocairo brand.pdf

  # Allow the one-time PDFium download if no converter is installed
  pdf-to-svg --auto-install logo.pdf

  # What can this machine use?
  pdf-to-svg --check-deps

BACKENDS (tried in this order):
  pdf2svg      pdf2svg <input> <output>
  pdftocairo   pdftocairo -svg <input> <prefix>   (Poppler; renamed to --output)
  pdfium       PDFium library; page 1 objects written as SVG paths, text and
               images (--pdfium-mode raster embeds a page bitmap instead)

ENVIRONMENT VARIABLES:
  PDF2SVG_BIN             Command used for pdf2svg
  PDFTOCAIRO_BIN          Command used for pdftocairo
  PDF2SVG_BACKENDS        Comma-separated subset of backends
  PDF2SVG_AUTO_INSTALL    Same as --auto-install
  PDF2SVG_PDFIUM_MODE     Same as --pdfium-mode
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  PDFIUM_AUTO_CACHE_DIR   Override the PDFium cache directory
  RUST_LOG                Log filter for stderr diagnostics
"#;

/// Convert the first page of a PDF to SVG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-to-svg",
    version,
    about = "Convert the first page of a PDF to SVG",
    long_about = "Convert the first page of a PDF to SVG. Tries pdf2svg, then Poppler's \
pdftocairo, then the PDFium library, and stops at the first one that succeeds.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    #[arg(default_value = "logo.pdf")]
    input: PathBuf,

    /// Output SVG file. Default: the input path with a .svg extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Backends to use, comma separated. Always tried in the standard order.
    #[arg(long, env = "PDF2SVG_BACKENDS", value_enum, value_delimiter = ',')]
    backends: Vec<BackendArg>,

    /// Download PDFium once into the local cache if it cannot be found.
    #[arg(long, env = "PDF2SVG_AUTO_INSTALL")]
    auto_install: bool,

    /// Command used for pdf2svg.
    #[arg(long, env = "PDF2SVG_BIN", default_value = "pdf2svg")]
    pdf2svg_bin: PathBuf,

    /// Command used for pdftocairo.
    #[arg(long, env = "PDFTOCAIRO_BIN", default_value = "pdftocairo")]
    pdftocairo_bin: PathBuf,

    /// Path to a PDFium shared library.
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,

    /// How the PDFium fallback writes the page: vector elements, or a
    /// single embedded bitmap.
    #[arg(long, env = "PDF2SVG_PDFIUM_MODE", value_enum, default_value_t = PdfiumModeArg::Vector)]
    pdfium_mode: PdfiumModeArg,

    /// Longest edge in pixels of bitmaps written by the PDFium fallback.
    #[arg(long, env = "PDF2SVG_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..=20_000))]
    max_pixels: u32,

    /// PDF user password (PDFium fallback only).
    #[arg(long, env = "PDF2SVG_PASSWORD")]
    password: Option<String>,

    /// Print which backends are available and exit.
    #[arg(long)]
    check_deps: bool,

    /// Print the conversion result as JSON instead of status lines.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs on stderr.
    #[arg(short, long, env = "PDF2SVG_VERBOSE")]
    verbose: bool,

    /// Suppress status lines; failures are still reported.
    #[arg(short, long, env = "PDF2SVG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    #[value(name = "pdf2svg")]
    Pdf2Svg,
    Pdftocairo,
    Pdfium,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PdfiumModeArg {
    Vector,
    Raster,
}

impl From<PdfiumModeArg> for PdfiumMode {
    fn from(v: PdfiumModeArg) -> Self {
        match v {
            PdfiumModeArg::Vector => PdfiumMode::Vector,
            PdfiumModeArg::Raster => PdfiumMode::Raster,
        }
    }
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Pdf2Svg => BackendKind::Pdf2Svg,
            BackendArg::Pdftocairo => BackendKind::Pdftocairo,
            BackendArg::Pdfium => BackendKind::Pdfium,
        }
    }
}

fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version
    // print to stdout and exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs go to stderr; stdout carries the status lines. Only
    // errors are logged by default because the status lines already say
    // everything a user needs.
    let filter = if cli.verbose {
        "debug"
    } else {
        "error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{} {:#}", red("✗"), e);
            println!("\n{} {}", red("❌"), bold("Conversion failed"));
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let show_status = !cli.quiet && !cli.json;
    let progress: Option<ProgressCallback> = if show_status {
        Some(StatusPrinter::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress)?;

    // ── Dependency report ────────────────────────────────────────────────
    if cli.check_deps {
        let report = check_dependencies(&config);
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            for status in &report {
                println!(
                    "{} {:<11} {}",
                    if status.available {
                        green("✓")
                    } else {
                        red("✗")
                    },
                    status.backend,
                    dim(&status.detail)
                );
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, cli.output.as_deref(), &config)
        .context("No SVG was produced")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        println!(
            "\n{} SVG written: {}  {}",
            green("🎉"),
            bold(&output.svg_path.display().to_string()),
            dim(&format!("({}, {}ms)", output.backend, output.duration_ms))
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let backends: Vec<BackendKind> = if cli.backends.is_empty() {
        BackendKind::ALL.to_vec()
    } else {
        cli.backends.iter().map(|&b| b.into()).collect()
    };

    let mut builder = ConversionConfig::builder()
        .backends(backends)
        .pdf2svg(ToolCommand::new(&cli.pdf2svg_bin))
        .pdftocairo(ToolCommand::new(&cli.pdftocairo_bin))
        .auto_install(cli.auto_install)
        .pdfium_mode(cli.pdfium_mode.into())
        .max_rendered_pixels(cli.max_pixels);

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
