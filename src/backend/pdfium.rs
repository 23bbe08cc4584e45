//! Library fallback: open page one with PDFium and write it as SVG.
//!
//! ## Finding the library
//!
//! 1. [`ConversionConfig::pdfium_library`], if set.
//! 2. `PDFIUM_LIB_PATH` or the pdfium-auto cache ([`PdfiumSource::locate`]).
//! 3. The system library search path.
//! 4. Only when `auto_install` is on: one download into the cache, then bind.
//!
//! Without `auto_install` a missing library is reported as
//! [`Pdf2SvgError::LibraryMissing`]; the download is never implicit.
//!
//! ## Output
//!
//! [`PdfiumMode::Vector`] translates the page's objects into SVG elements
//! (see [`crate::pipeline::vector`]). A page where nothing could be
//! translated is rasterised instead, as is every page in
//! [`PdfiumMode::Raster`].

use super::SvgBackend;
use crate::config::{BackendKind, ConversionConfig, PdfiumMode};
use crate::error::Pdf2SvgError;
use crate::pipeline::{encode, input::output_dir, render, vector};
use crate::progress::ProgressCallback;
use pdfium_auto::PdfiumAutoError;
use pdfium_render::prelude::{PdfPage, Pdfium};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the PDFium library comes from.
///
/// [`AutoSource`] delegates to `pdfium-auto`. Another implementation can
/// serve a pre-staged library, or stand in for the network in tests.
pub trait PdfiumSource: Send + Sync {
    /// An already-present library (`PDFIUM_LIB_PATH` or the cache). Never
    /// downloads.
    fn locate(&self) -> Option<PathBuf>;

    fn bind_path(&self, path: &Path) -> Result<Pdfium, PdfiumAutoError>;

    fn bind_system(&self) -> Result<Pdfium, PdfiumAutoError>;

    /// Fetch the library into the cache and return its path.
    fn install(
        &self,
        on_progress: &dyn Fn(u64, Option<u64>),
    ) -> Result<PathBuf, PdfiumAutoError>;
}

/// The `pdfium-auto` lookup, binding and download.
pub struct AutoSource;

impl PdfiumSource for AutoSource {
    fn locate(&self) -> Option<PathBuf> {
        pdfium_auto::locate_pdfium_library()
    }

    fn bind_path(&self, path: &Path) -> Result<Pdfium, PdfiumAutoError> {
        pdfium_auto::bind_pdfium_from_path(path)
    }

    fn bind_system(&self) -> Result<Pdfium, PdfiumAutoError> {
        pdfium_auto::bind_system_pdfium()
    }

    fn install(
        &self,
        on_progress: &dyn Fn(u64, Option<u64>),
    ) -> Result<PathBuf, PdfiumAutoError> {
        pdfium_auto::ensure_pdfium_library(Some(on_progress))
    }
}

pub struct PdfiumBackend {
    library: Option<PathBuf>,
    auto_install: bool,
    mode: PdfiumMode,
    max_rendered_pixels: u32,
    password: Option<String>,
    progress: Option<ProgressCallback>,
    source: Arc<dyn PdfiumSource>,
}

impl PdfiumBackend {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            library: config.pdfium_library.clone(),
            auto_install: config.auto_install,
            mode: config.pdfium_mode,
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            progress: config.progress_callback.clone(),
            source: Arc::new(AutoSource),
        }
    }

    /// Replace the default [`AutoSource`].
    pub fn with_source(mut self, source: Arc<dyn PdfiumSource>) -> Self {
        self.source = source;
        self
    }

    /// Load PDFium following the lookup order in the module docs.
    pub fn bind(&self) -> Result<Pdfium, Pdf2SvgError> {
        if let Some(path) = self.library.clone().or_else(|| self.source.locate()) {
            return self
                .source
                .bind_path(&path)
                .map_err(|e| Pdf2SvgError::LibraryMissing {
                    detail: e.to_string(),
                });
        }

        let system_err = match self.source.bind_system() {
            Ok(pdfium) => {
                debug!("Bound PDFium from the system library path");
                return Ok(pdfium);
            }
            Err(e) => e,
        };

        if !self.auto_install {
            return Err(Pdf2SvgError::LibraryMissing {
                detail: system_err.to_string(),
            });
        }

        info!("PDFium not found; downloading it once (auto-install enabled)");
        if let Some(cb) = &self.progress {
            cb.on_install_start();
        }
        let report = |downloaded: u64, total: Option<u64>| {
            if let Some(cb) = &self.progress {
                cb.on_install_progress(downloaded, total);
            }
        };
        let path = self
            .source
            .install(&report)
            .map_err(|e| Pdf2SvgError::LibraryInstallFailed {
                reason: e.to_string(),
            })?;
        if let Some(cb) = &self.progress {
            cb.on_install_complete(&path);
        }

        self.source
            .bind_path(&path)
            .map_err(|e| Pdf2SvgError::LibraryInstallFailed {
                reason: e.to_string(),
            })
    }

    fn render_svg(&self, pdfium: &Pdfium, input: &Path) -> Result<String, Pdf2SvgError> {
        render::with_first_page(pdfium, input, self.password.as_deref(), |page| {
            match self.mode {
                PdfiumMode::Raster => self.raster_svg(page),
                PdfiumMode::Vector => {
                    let (svg, stats) = vector::page_to_svg(page, self.max_rendered_pixels);
                    if stats.drawn() == 0 && stats.skipped > 0 {
                        warn!(
                            "No page object could be written as SVG ({} skipped); \
                             embedding a raster of the page instead",
                            stats.skipped
                        );
                        self.raster_svg(page)
                    } else {
                        Ok(svg)
                    }
                }
            }
        })
    }

    fn raster_svg(&self, page: &PdfPage) -> Result<String, Pdf2SvgError> {
        let rendered = render::rasterise(page, self.max_rendered_pixels)?;
        encode::page_svg(&rendered.image, rendered.width_pt, rendered.height_pt).map_err(|e| {
            Pdf2SvgError::ConversionFailed {
                detail: format!("image encoding failed: {}", e),
            }
        })
    }
}

impl SvgBackend for PdfiumBackend {
    fn name(&self) -> &str {
        BackendKind::Pdfium.name()
    }

    /// Always `true`: a missing library is reported by [`Self::convert`] so
    /// the caller sees why the last resort failed.
    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, Pdf2SvgError> {
        let pdfium = self.bind()?;

        // pdfium is C++ behind FFI; a panic in the bindings must not take
        // the process down with it.
        let svg = panic::catch_unwind(AssertUnwindSafe(|| self.render_svg(&pdfium, input)))
            .unwrap_or_else(|payload| {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!("PDFium rendering panicked: {}", detail);
                Err(Pdf2SvgError::ConversionFailed {
                    detail: format!("rendering panicked: {}", detail),
                })
            })?;

        write_atomically(output, svg.as_bytes())?;
        Ok(output.to_path_buf())
    }
}

/// Write `bytes` to `path` via a temp file in the same directory, then
/// rename over `path`. A failed run never leaves a truncated SVG behind.
///
/// The result has the mode of the file it replaces, or for a new file the
/// mode a plain create would give (0o666 less the umask).
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), Pdf2SvgError> {
    let write_err = |source: std::io::Error| Pdf2SvgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder
        .tempfile_in(output_dir(path))
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Converter;
    use crate::output::AttemptOutcome;
    use crate::progress::ConversionProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("logo.svg");
        std::fs::write(&out, "old").unwrap();

        write_atomically(&out, b"<svg/>").unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<svg/>");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temp file must not be left behind");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_the_replaced_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("logo.svg");
        std::fs::write(&out, "old").unwrap();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_atomically(&out, b"<svg/>").unwrap();

        let mode = std::fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_new_file_matches_a_plain_create() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.svg");
        let atomic = dir.path().join("atomic.svg");
        std::fs::write(&plain, b"<svg/>").unwrap();

        write_atomically(&atomic, b"<svg/>").unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&atomic), mode(&plain));
    }

    #[test]
    fn atomic_write_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("logo.svg");
        let err = write_atomically(&out, b"<svg/>").unwrap_err();
        assert!(matches!(err, Pdf2SvgError::OutputWriteFailed { .. }));
        assert!(!out.exists());
    }

    // ── Library lookup and the one-time install ─────────────────────────

    /// No library anywhere; `install` reports progress and then returns
    /// `installed` (or fails when it is `None`).
    struct OfflineSource {
        installed: Option<PathBuf>,
        installs: AtomicUsize,
    }

    impl OfflineSource {
        fn new(installed: Option<PathBuf>) -> Arc<Self> {
            Arc::new(Self {
                installed,
                installs: AtomicUsize::new(0),
            })
        }
    }

    impl PdfiumSource for OfflineSource {
        fn locate(&self) -> Option<PathBuf> {
            None
        }
        fn bind_path(&self, path: &Path) -> Result<Pdfium, PdfiumAutoError> {
            Err(PdfiumAutoError::Bind {
                path: path.to_path_buf(),
                reason: "not a shared library".into(),
            })
        }
        fn bind_system(&self) -> Result<Pdfium, PdfiumAutoError> {
            Err(PdfiumAutoError::System("libpdfium.so: cannot open".into()))
        }
        fn install(
            &self,
            on_progress: &dyn Fn(u64, Option<u64>),
        ) -> Result<PathBuf, PdfiumAutoError> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            on_progress(512, Some(2048));
            self.installed
                .clone()
                .ok_or_else(|| PdfiumAutoError::Download("HTTP 503".into()))
        }
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl ConversionProgressCallback for Events {
        fn on_install_start(&self) {
            self.0.lock().unwrap().push("install-start".into());
        }
        fn on_install_progress(&self, downloaded: u64, total: Option<u64>) {
            self.0
                .lock()
                .unwrap()
                .push(format!("progress:{downloaded}/{}", total.unwrap_or(0)));
        }
        fn on_install_complete(&self, _library: &Path) {
            self.0.lock().unwrap().push("install-complete".into());
        }
    }

    fn pdf_in(dir: &Path) -> PathBuf {
        let p = dir.join("logo.pdf");
        std::fs::write(&p, b"%PDF-1.4\n%%EOF\n").unwrap();
        p
    }

    fn config(auto_install: bool, events: &Arc<Events>) -> ConversionConfig {
        ConversionConfig::builder()
            .backends([BackendKind::Pdfium])
            .auto_install(auto_install)
            .progress_callback(Arc::clone(events) as ProgressCallback)
            .build()
            .unwrap()
    }

    #[test]
    fn explicit_missing_library_is_reported_not_installed() {
        let source = OfflineSource::new(None);
        let config = ConversionConfig::builder()
            .pdfium_library("/definitely/not/libpdfium.so")
            .auto_install(true)
            .build()
            .unwrap();
        let err = PdfiumBackend::from_config(&config)
            .with_source(source.clone())
            .bind()
            .err()
            .unwrap();
        assert!(matches!(err, Pdf2SvgError::LibraryMissing { .. }), "got: {err}");
        assert_eq!(source.installs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_library_without_opt_in_never_installs() {
        let events = Arc::new(Events::default());
        let source = OfflineSource::new(None);
        let err = PdfiumBackend::from_config(&config(false, &events))
            .with_source(source.clone())
            .bind()
            .err()
            .unwrap();

        assert!(matches!(err, Pdf2SvgError::LibraryMissing { .. }), "got: {err}");
        assert_eq!(source.installs.load(Ordering::SeqCst), 0);
        assert!(events.0.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_install_is_attempted_once_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = pdf_in(dir.path());
        let events = Arc::new(Events::default());
        let source = OfflineSource::new(None);
        let config = config(true, &events);
        let backend = PdfiumBackend::from_config(&config).with_source(source.clone());

        let err = Converter::with_backends(&config, vec![Box::new(backend)])
            .run(&input, None)
            .unwrap_err();

        match err {
            Pdf2SvgError::AllBackendsFailed { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                match &attempts[0].outcome {
                    AttemptOutcome::Failed { error } => {
                        assert!(error.contains("Failed to install PDFium"), "{error}");
                        assert!(error.contains("HTTP 503"), "{error}");
                    }
                    other => panic!("expected a failed attempt, got {other:?}"),
                }
            }
            other => panic!("expected AllBackendsFailed, got {other:?}"),
        }
        assert_eq!(source.installs.load(Ordering::SeqCst), 1);
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["install-start", "progress:512/2048"]
        );
        assert!(!dir.path().join("logo.svg").exists());
    }

    #[test]
    fn unusable_download_is_an_install_failure() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(Events::default());
        let source = OfflineSource::new(Some(dir.path().join("libpdfium.so")));

        let err = PdfiumBackend::from_config(&config(true, &events))
            .with_source(source.clone())
            .bind()
            .err()
            .unwrap();

        assert!(matches!(err, Pdf2SvgError::LibraryInstallFailed { .. }), "got: {err}");
        assert_eq!(source.installs.load(Ordering::SeqCst), 1);
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["install-start", "progress:512/2048", "install-complete"]
        );
    }
}
