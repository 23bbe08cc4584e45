//! Error types for the edgequake-pdf2svg library.
//!
//! One enum covers every failure mode, but the variants fall into two groups
//! that the fallback chain treats differently:
//!
//! * **Backend failures**: [`Pdf2SvgError::ToolInvocationFailed`],
//!   [`Pdf2SvgError::LibraryMissing`], [`Pdf2SvgError::LibraryInstallFailed`],
//!   [`Pdf2SvgError::ConversionFailed`], [`Pdf2SvgError::OutputWriteFailed`].
//!   These are recorded as an [`crate::output::Attempt`] and the chain moves
//!   on to the next backend. A tool that is not installed is not an error at
//!   all; it is recorded as a skipped attempt.
//!
//! * **Fatal** — bad input, missing output directory, invalid configuration,
//!   or [`Pdf2SvgError::AllBackendsFailed`]. These are returned straight from
//!   [`crate::convert::convert`].

use crate::output::{Attempt, AttemptOutcome};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2svg library.
#[derive(Debug, Error)]
pub enum Pdf2SvgError {
    // ── Input / output errors ─────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The directory that should hold the SVG does not exist.
    #[error("Output directory '{dir}' does not exist (output: '{output}')")]
    OutputDirMissing { dir: PathBuf, output: PathBuf },

    /// Could not write the SVG file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── External tool errors ──────────────────────────────────────────────
    /// The tool ran but did not produce the SVG.
    #[error("{tool} failed: {reason}")]
    ToolInvocationFailed { tool: String, reason: String },

    // ── PDFium errors ─────────────────────────────────────────────────────
    /// No PDFium library could be located and installation was not requested.
    #[error(
        "PDFium library not found: {detail}\n\
Pass --auto-install to download it once into the local cache,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    LibraryMissing { detail: String },

    /// The one-time installation attempt failed.
    #[error("Failed to install PDFium: {reason}")]
    LibraryInstallFailed { reason: String },

    /// PDFium was loaded but opening or exporting the document failed.
    #[error("PDFium conversion failed: {detail}")]
    ConversionFailed { detail: String },

    // ── Chain errors ──────────────────────────────────────────────────────
    /// Every enabled backend was skipped or failed.
    #[error("No backend could convert to '{}':\n{}", .output.display(), describe_attempts(.attempts))]
    AllBackendsFailed {
        output: PathBuf,
        attempts: Vec<Attempt>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Pdf2SvgError {
    /// `true` for errors a backend reports to the chain rather than the caller.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Pdf2SvgError::ToolInvocationFailed { .. }
                | Pdf2SvgError::LibraryMissing { .. }
                | Pdf2SvgError::LibraryInstallFailed { .. }
                | Pdf2SvgError::ConversionFailed { .. }
                | Pdf2SvgError::OutputWriteFailed { .. }
        )
    }
}

fn describe_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "  (no backend enabled)".to_string();
    }
    attempts
        .iter()
        .map(|a| match &a.outcome {
            AttemptOutcome::Skipped => format!("  - {}: not available", a.backend),
            AttemptOutcome::Failed { error } => format!("  - {}: {}", a.backend, error),
            AttemptOutcome::Succeeded => format!("  - {}: succeeded", a.backend),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
