//! Conversion backends and the trait the fallback chain drives them through.
//!
//! | Backend | How | Output naming |
//! |---------|-----|---------------|
//! | [`pdf2svg::Pdf2SvgBackend`] | `pdf2svg in.pdf out.svg` | exact path |
//! | [`pdftocairo::PdftocairoBackend`] | `pdftocairo -svg in.pdf prefix` | `prefix.svg`, renamed |
//! | [`pdfium::PdfiumBackend`] | pdfium-render, page objects as SVG | exact path, atomic write |

pub mod pdf2svg;
pub mod pdfium;
pub mod pdftocairo;
pub mod probe;

use crate::config::{BackendKind, ConversionConfig, ToolCommand};
use crate::error::Pdf2SvgError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// One strategy for turning page one of a PDF into an SVG file.
pub trait SvgBackend {
    /// Short name used in logs, attempts and status lines.
    fn name(&self) -> &str;

    /// Cheap presence check. `false` makes the chain skip this backend
    /// without counting it as a failure.
    fn is_available(&self) -> bool;

    /// Write the SVG for page one of `input` to exactly `output`.
    ///
    /// Returns the path written, which must equal `output`.
    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, Pdf2SvgError>;
}

/// Instantiate the enabled backends in fallback order.
pub fn backends_from_config(config: &ConversionConfig) -> Vec<Box<dyn SvgBackend>> {
    config
        .backends
        .iter()
        .map(|kind| -> Box<dyn SvgBackend> {
            match kind {
                BackendKind::Pdf2Svg => {
                    Box::new(pdf2svg::Pdf2SvgBackend::new(config.pdf2svg.clone()))
                }
                BackendKind::Pdftocairo => {
                    Box::new(pdftocairo::PdftocairoBackend::new(config.pdftocairo.clone()))
                }
                BackendKind::Pdfium => Box::new(pdfium::PdfiumBackend::from_config(config)),
            }
        })
        .collect()
}

/// Run `tool` with `args`, capturing its output, and turn anything other
/// than a clean exit into [`Pdf2SvgError::ToolInvocationFailed`].
pub(crate) fn run_tool<I, S>(name: &str, tool: &ToolCommand, args: I) -> Result<(), Pdf2SvgError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = tool.command();
    cmd.args(args).stdin(Stdio::null());
    debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|e| Pdf2SvgError::ToolInvocationFailed {
        tool: name.to_string(),
        reason: format!("could not start `{}`: {}", tool, e),
    })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(Pdf2SvgError::ToolInvocationFailed {
        tool: name.to_string(),
        reason: if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {}", output.status, stderr)
        },
    })
}
