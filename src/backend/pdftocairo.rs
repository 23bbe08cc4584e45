//! `pdftocairo -svg <input> <prefix>` from Poppler.
//!
//! pdftocairo does not take an output file name in SVG mode: it appends
//! `.svg` to the prefix it is given. The prefix is the requested output with
//! its extension stripped, so `logo.svg` round-trips unchanged and anything
//! else (`logo.SVG`, `logo.image`) is renamed into place afterwards.

use super::{probe::probe, run_tool, SvgBackend};
use crate::config::{BackendKind, ToolCommand};
use crate::error::Pdf2SvgError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct PdftocairoBackend {
    tool: ToolCommand,
}

impl PdftocairoBackend {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }

    fn failed(&self, reason: String) -> Pdf2SvgError {
        Pdf2SvgError::ToolInvocationFailed {
            tool: self.name().to_string(),
            reason,
        }
    }
}

/// The prefix handed to pdftocairo for a requested `output`.
pub fn output_prefix(output: &Path) -> PathBuf {
    output.with_extension("")
}

/// The file pdftocairo writes for `prefix`.
pub fn native_output(prefix: &Path) -> PathBuf {
    let mut s = prefix.as_os_str().to_os_string();
    s.push(".svg");
    PathBuf::from(s)
}

impl SvgBackend for PdftocairoBackend {
    fn name(&self) -> &str {
        BackendKind::Pdftocairo.name()
    }

    fn is_available(&self) -> bool {
        probe(&self.tool, "-v")
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, Pdf2SvgError> {
        let prefix = output_prefix(output);
        run_tool(
            self.name(),
            &self.tool,
            [
                std::ffi::OsStr::new("-svg"),
                input.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        let produced = native_output(&prefix);
        if !produced.is_file() {
            return Err(self.failed(format!(
                "expected SVG output '{}' was not found",
                produced.display()
            )));
        }

        if produced != output {
            move_into_place(&produced, output).map_err(|e| {
                self.failed(format!(
                    "could not rename '{}' to '{}': {}",
                    produced.display(),
                    output.display(),
                    e
                ))
            })?;
        }

        Ok(output.to_path_buf())
    }
}

/// Rename `from` onto `to`, replacing an existing `to`.
///
/// On case-insensitive file systems `logo.svg` and `logo.SVG` are the same
/// file; removing the destination first would delete the fresh output.
fn move_into_place(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.exists() && !same_file(from, to) {
        debug!("Replacing existing {}", to.display());
        std::fs::remove_file(to)?;
    }
    std::fs::rename(from, to)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
