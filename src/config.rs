//! Configuration types for PDF-to-SVG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the plain
//! behaviour: try `pdf2svg`, then `pdftocairo`, then PDFium, and never
//! download anything.

use crate::error::Pdf2SvgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF-to-SVG conversion.
///
/// # Example
/// ```rust
/// use edgequake_pdf2svg::{BackendKind, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .backends([BackendKind::Pdftocairo, BackendKind::Pdfium])
///     .auto_install(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.backends, vec![BackendKind::Pdftocairo, BackendKind::Pdfium]);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Enabled backends, always in canonical fallback order. Default: all three.
    pub backends: Vec<BackendKind>,

    /// Command used for `pdf2svg`. Default: `pdf2svg` on `PATH`.
    pub pdf2svg: ToolCommand,

    /// Command used for `pdftocairo`. Default: `pdftocairo` on `PATH`.
    pub pdftocairo: ToolCommand,

    /// Allow one download of PDFium when no library can be found. Default: false.
    ///
    /// Off by default: a conversion should not reach out to the network or
    /// write into the user's cache unless asked to.
    pub auto_install: bool,

    /// Explicit PDFium library. Takes precedence over `PDFIUM_LIB_PATH`.
    pub pdfium_library: Option<PathBuf>,

    /// What the PDFium fallback writes. Default: [`PdfiumMode::Vector`].
    pub pdfium_mode: PdfiumMode,

    /// Longest edge, in pixels, of page rasters made by the PDFium fallback
    /// (raster mode, and embedded image objects in vector mode). Default: 2000.
    pub max_rendered_pixels: u32,

    /// PDF user password, used by the PDFium fallback only.
    pub password: Option<String>,

    /// Receives backend and installation events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            backends: BackendKind::ALL.to_vec(),
            pdf2svg: ToolCommand::new("pdf2svg"),
            pdftocairo: ToolCommand::new("pdftocairo"),
            auto_install: false,
            pdfium_library: None,
            pdfium_mode: PdfiumMode::Vector,
            max_rendered_pixels: 2000,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("backends", &self.backends)
            .field("pdf2svg", &self.pdf2svg)
            .field("pdftocairo", &self.pdftocairo)
            .field("auto_install", &self.auto_install)
            .field("pdfium_library", &self.pdfium_library)
            .field("pdfium_mode", &self.pdfium_mode)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Restrict the chain to these backends. Order and duplicates are
    /// ignored: the chain always runs pdf2svg → pdftocairo → pdfium.
    pub fn backends(mut self, backends: impl IntoIterator<Item = BackendKind>) -> Self {
        let mut list: Vec<BackendKind> = backends.into_iter().collect();
        list.sort_unstable();
        list.dedup();
        self.config.backends = list;
        self
    }

    pub fn pdf2svg(mut self, command: ToolCommand) -> Self {
        self.config.pdf2svg = command;
        self
    }

    pub fn pdftocairo(mut self, command: ToolCommand) -> Self {
        self.config.pdftocairo = command;
        self
    }

    pub fn auto_install(mut self, v: bool) -> Self {
        self.config.auto_install = v;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn pdfium_mode(mut self, mode: PdfiumMode) -> Self {
        self.config.pdfium_mode = mode;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2SvgError> {
        let c = &self.config;
        if c.backends.is_empty() {
            return Err(Pdf2SvgError::InvalidConfig(
                "at least one backend must be enabled".into(),
            ));
        }
        if c.max_rendered_pixels < 100 || c.max_rendered_pixels > 20_000 {
            return Err(Pdf2SvgError::InvalidConfig(format!(
                "max_rendered_pixels must be 100–20000, got {}",
                c.max_rendered_pixels
            )));
        }
        for tool in [&c.pdf2svg, &c.pdftocairo] {
            if tool.program.is_empty() {
                return Err(Pdf2SvgError::InvalidConfig(
                    "tool program must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The conversion strategies, declared in fallback order.
///
/// `Ord` follows declaration order, which is what
/// [`ConversionConfigBuilder::backends`] sorts by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `pdf2svg <input> <output>`
    Pdf2Svg,
    /// `pdftocairo -svg <input> <prefix>` from Poppler
    Pdftocairo,
    /// PDFium library: page objects written as SVG
    Pdfium,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Pdf2Svg,
        BackendKind::Pdftocairo,
        BackendKind::Pdfium,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Pdf2Svg => "pdf2svg",
            BackendKind::Pdftocairo => "pdftocairo",
            BackendKind::Pdfium => "pdfium",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of the PDFium fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfiumMode {
    /// Page objects translated to SVG: `<path>` for vector art, `<text>`
    /// for text runs, `<image>` for embedded bitmaps.
    #[default]
    Vector,
    /// The whole page rasterised and embedded as one `<image>`. Last resort
    /// for pages whose content cannot be expressed as SVG elements.
    Raster,
}

/// How to launch an external tool: a program plus fixed leading arguments.
///
/// The leading arguments let a wrapper stand in for the real binary, e.g.
/// `ToolCommand::new("flatpak").arg("run").arg("…")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// A `std::process::Command` with the program and leading args applied.
    pub fn command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_try_everything_without_installing() {
        let c = ConversionConfig::default();
        assert_eq!(c.backends, BackendKind::ALL.to_vec());
        assert!(!c.auto_install);
        assert_eq!(c.pdfium_mode, PdfiumMode::Vector);
        assert_eq!(c.pdf2svg.program, "pdf2svg");
        assert_eq!(c.pdftocairo.program, "pdftocairo");
    }

    #[test]
    fn backends_are_normalised_to_fallback_order() {
        let c = ConversionConfig::builder()
            .backends([
                BackendKind::Pdfium,
                BackendKind::Pdf2Svg,
                BackendKind::Pdfium,
            ])
            .build()
            .unwrap();
        assert_eq!(c.backends, vec![BackendKind::Pdf2Svg, BackendKind::Pdfium]);
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let err = ConversionConfig::builder().backends([]).build().unwrap_err();
        assert!(err.to_string().contains("at least one backend"));
    }

    #[test]
    fn tiny_raster_cap_is_rejected() {
        assert!(ConversionConfig::builder()
            .max_rendered_pixels(10)
            .build()
            .is_err());
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn tool_command_display_includes_leading_args() {
        let t = ToolCommand::new("sh").arg("/tmp/fake-pdf2svg.sh");
        assert_eq!(t.to_string(), "sh /tmp/fake-pdf2svg.sh");
    }
}
