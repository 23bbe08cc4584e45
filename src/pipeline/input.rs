//! Input and output path resolution.
//!
//! Everything here runs before the first backend, so a bad input or a
//! missing output directory fails the run without spawning a process or
//! creating a file.

use crate::error::Pdf2SvgError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` is an existing regular file, is readable and starts
/// with the `%PDF` magic.
///
/// Files shorter than four bytes are passed through; the backends will
/// reject them with a more specific message.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Pdf2SvgError> {
    // `is_file` follows symlinks; a directory or a dangling link is not a PDF.
    if !path.is_file() {
        return Err(Pdf2SvgError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2SvgError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2SvgError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2SvgError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// The output used when none is given: the input with its extension
/// replaced by `.svg` (`logo.pdf` → `logo.svg`, `scan` → `scan.svg`).
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("svg")
}

/// The directory the SVG will be written into. A bare file name lives in
/// the current directory.
pub fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Fail with [`Pdf2SvgError::OutputDirMissing`] unless the output's parent
/// directory already exists. Directories are never created.
pub fn check_output_dir(output: &Path) -> Result<(), Pdf2SvgError> {
    let dir = output_dir(output);
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Pdf2SvgError::OutputDirMissing {
            dir: dir.to_path_buf(),
            output: output.to_path_buf(),
        })
    }
}
