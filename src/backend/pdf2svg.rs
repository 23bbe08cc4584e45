//! `pdf2svg <input> <output>`.

use super::{probe::probe, run_tool, SvgBackend};
use crate::config::{BackendKind, ToolCommand};
use crate::error::Pdf2SvgError;
use std::path::{Path, PathBuf};

/// pdf2svg writes page 1 by default, to exactly the path it is given.
pub struct Pdf2SvgBackend {
    tool: ToolCommand,
}

impl Pdf2SvgBackend {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }
}

impl SvgBackend for Pdf2SvgBackend {
    fn name(&self) -> &str {
        BackendKind::Pdf2Svg.name()
    }

    fn is_available(&self) -> bool {
        probe(&self.tool, "--help")
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, Pdf2SvgError> {
        run_tool(self.name(), &self.tool, [input.as_os_str(), output.as_os_str()])?;

        if !output.is_file() {
            return Err(Pdf2SvgError::ToolInvocationFailed {
                tool: self.name().to_string(),
                reason: format!("exited cleanly but '{}' was not created", output.display()),
            });
        }
        Ok(output.to_path_buf())
    }
}
