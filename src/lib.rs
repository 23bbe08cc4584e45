//! # edgequake-pdf2svg
//!
//! Convert the first page of a PDF into an SVG image.
//!
//! ## Backends
//!
//! No single converter is installed everywhere, so three are tried in a
//! fixed order and the first one that produces the file wins:
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. pdf2svg     external tool, `pdf2svg in.pdf out.svg`
//!  ├─ 2. pdftocairo  external tool (Poppler), `pdftocairo -svg in.pdf prefix`
//!  └─ 3. pdfium      bundled library; page objects written as SVG,
//!                    with a page raster as the last resort
//! ```
//!
//! External tools are probed before use (`pdf2svg --help`, `pdftocairo -v`)
//! and silently skipped when absent. PDFium is found via `PDFIUM_LIB_PATH`,
//! the local cache, or the system library path; it is downloaded only when
//! the caller opts in with [`ConversionConfigBuilder::auto_install`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2svg::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("logo.pdf", None, &config)?;
//!     println!("{} written by {}", output.svg_path.display(), output.backend);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-to-svg` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod deps;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::SvgBackend;
pub use config::{
    BackendKind, ConversionConfig, ConversionConfigBuilder, PdfiumMode, ToolCommand,
};
pub use convert::{convert, Converter};
pub use deps::check_dependencies;
pub use error::Pdf2SvgError;
pub use output::{Attempt, AttemptOutcome, BackendStatus, ConversionOutput};
pub use progress::{ConversionProgressCallback, ProgressCallback};
