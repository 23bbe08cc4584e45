//! The fallback chain.
//!
//! ```text
//! START ─▶ pdf2svg?    ── ok ─▶ DONE
//!            │ skipped / failed
//!            ▼
//!          pdftocairo? ── ok ─▶ DONE
//!            │ skipped / failed
//!            ▼
//!          pdfium      ── ok ─▶ DONE
//!            │ failed
//!            ▼
//!          FAILED (AllBackendsFailed)
//! ```
//!
//! The chain is a single pass. Each backend is probed, run at most once, and
//! leaves exactly one [`Attempt`] behind. The only retry anywhere is the
//! opt-in PDFium download inside [`crate::backend::pdfium`].

use crate::backend::{backends_from_config, SvgBackend};
use crate::config::ConversionConfig;
use crate::error::Pdf2SvgError;
use crate::output::{Attempt, ConversionOutput};
use crate::pipeline::input;
use crate::progress::{ConversionProgressCallback, NoopProgressCallback};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert page one of `input` to SVG.
///
/// `output` defaults to `input` with its extension replaced by `.svg`. An
/// existing file at the output path is overwritten.
///
/// # Errors
/// - [`Pdf2SvgError::InputNotFound`] / `PermissionDenied` / `NotAPdf` before
///   any backend runs; no file is created.
/// - [`Pdf2SvgError::OutputDirMissing`] if the output's directory is absent.
/// - [`Pdf2SvgError::AllBackendsFailed`] if no backend produced the file.
pub fn convert(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2SvgError> {
    Converter::new(config).run(input.as_ref(), output)
}

/// A fallback chain bound to a configuration.
///
/// [`Converter::new`] builds the standard chain from the config;
/// [`Converter::with_backends`] accepts any list of [`SvgBackend`]s, tried in
/// the order given.
pub struct Converter<'a> {
    config: &'a ConversionConfig,
    backends: Vec<Box<dyn SvgBackend>>,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            backends: backends_from_config(config),
        }
    }

    pub fn with_backends(config: &'a ConversionConfig, backends: Vec<Box<dyn SvgBackend>>) -> Self {
        Self { config, backends }
    }

    /// Names of the backends in the order they will be tried.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<ConversionOutput, Pdf2SvgError> {
        let start = Instant::now();
        let cb: &dyn ConversionProgressCallback = match &self.config.progress_callback {
            Some(cb) => cb.as_ref(),
            None => &NoopProgressCallback,
        };

        let input = input::resolve_input(input)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input::default_output_path(&input));
        input::check_output_dir(&output)?;

        info!("Converting {} → {}", input.display(), output.display());
        cb.on_conversion_start(&input, &output);

        let mut attempts = Vec::with_capacity(self.backends.len());

        for (i, backend) in self.backends.iter().enumerate() {
            let name = backend.name();

            if !backend.is_available() {
                debug!("{} is not available, skipping", name);
                cb.on_backend_skipped(name);
                attempts.push(Attempt::skipped(name));
                continue;
            }

            cb.on_backend_start(name);
            match backend.convert(&input, &output) {
                Ok(svg_path) => {
                    info!("{} produced {}", name, svg_path.display());
                    cb.on_backend_succeeded(name, &svg_path);
                    attempts.push(Attempt::succeeded(name));
                    return Ok(ConversionOutput {
                        input,
                        svg_path,
                        backend: name.to_string(),
                        attempts,
                        duration_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Err(e) if e.is_backend_failure() => {
                    warn!("{} failed: {}", name, e);
                    let msg = e.to_string();
                    let next = self.backends.get(i + 1).map(|b| b.name());
                    cb.on_backend_failed(name, &msg, next);
                    attempts.push(Attempt::failed(name, msg));
                }
                Err(e) => return Err(e),
            }
        }

        Err(Pdf2SvgError::AllBackendsFailed { output, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::AttemptOutcome;
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Scripted backend: `available`, then either writes `body` or fails.
    struct Stub {
        name: &'static str,
        available: bool,
        body: Option<&'static str>,
        calls: Rc<Cell<usize>>,
    }

    impl Stub {
        fn boxed(
            name: &'static str,
            available: bool,
            body: Option<&'static str>,
        ) -> (Box<dyn SvgBackend>, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let stub = Stub {
                name,
                available,
                body,
                calls: Rc::clone(&calls),
            };
            (Box::new(stub), calls)
        }
    }

    impl SvgBackend for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn convert(&self, _input: &Path, output: &Path) -> Result<PathBuf, Pdf2SvgError> {
            self.calls.set(self.calls.get() + 1);
            match self.body {
                Some(body) => {
                    std::fs::write(output, body).unwrap();
                    Ok(output.to_path_buf())
                }
                None => Err(Pdf2SvgError::ToolInvocationFailed {
                    tool: self.name.to_string(),
                    reason: "exited with exit status: 1".into(),
                }),
            }
        }
    }

    fn pdf_in(dir: &Path) -> PathBuf {
        let p = dir.join("logo.pdf");
        std::fs::write(&p, b"%PDF-1.4\n%%EOF\n").unwrap();
        p
    }

    #[test]
    fn first_available_backend_wins() {
        let dir = tempfile::tempdir().unwrap();
        let input = pdf_in(dir.path());
        let config = ConversionConfig::default();
        let (a, a_calls) = Stub::boxed("a", false, None);
        let (b, b_calls) = Stub::boxed("b", true, Some("<svg id=\"b\"/>"));
        let (c, c_calls) = Stub::boxed("c", true, Some("<svg id=\"c\"/>"));

        let out = Converter::with_backends(&config, vec![a, b, c])
            .run(&input, None)
            .unwrap();

        assert_eq!(out.backend, "b");
        assert_eq!(out.svg_path, dir.path().join("logo.svg"));
        assert_eq!(
            out.attempts,
            vec![Attempt::skipped("a"), Attempt::succeeded("b")]
        );
        assert_eq!((a_calls.get(), b_calls.get(), c_calls.get()), (0, 1, 0));
    }

    #[test]
    fn failure_falls_through_to_next_backend() {
        let dir = tempfile::tempdir().unwrap();
        let input = pdf_in(dir.path());
        let config = ConversionConfig::default();
        let (a, _) = Stub::boxed("a", true, None);
        let (b, _) = Stub::boxed("b", true, Some("<svg/>"));

        let out = Converter::with_backends(&config, vec![a, b])
            .run(&input, None)
            .unwrap();

        assert_eq!(out.backend, "b");
        assert!(matches!(
            out.attempts[0].outcome,
            AttemptOutcome::Failed { .. }
        ));
    }

    #[test]
    fn all_failures_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let input = pdf_in(dir.path());
        let config = ConversionConfig::default();
        let (a, _) = Stub::boxed("a", false, None);
        let (b, _) = Stub::boxed("b", true, None);

        let err = Converter::with_backends(&config, vec![a, b])
            .run(&input, None)
            .unwrap_err();

        match err {
            Pdf2SvgError::AllBackendsFailed { attempts, output } => {
                assert_eq!(output, dir.path().join("logo.svg"));
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0], Attempt::skipped("a"));
            }
            other => panic!("expected AllBackendsFailed, got {other:?}"),
        }
        assert!(!dir.path().join("logo.svg").exists());
    }

    #[test]
    fn missing_input_runs_no_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::default();
        let (a, a_calls) = Stub::boxed("a", true, Some("<svg/>"));

        let err = Converter::with_backends(&config, vec![a])
            .run(&dir.path().join("missing.pdf"), None)
            .unwrap_err();

        assert!(matches!(err, Pdf2SvgError::InputNotFound { .. }));
        assert_eq!(a_calls.get(), 0);
        assert!(!dir.path().join("missing.svg").exists());
    }

    #[test]
    fn missing_output_dir_runs_no_backend() {
        let dir = tempfile::tempdir().unwrap();
        let input = pdf_in(dir.path());
        let config = ConversionConfig::default();
        let (a, a_calls) = Stub::boxed("a", true, Some("<svg/>"));
        let output = dir.path().join("no-such-dir").join("logo.svg");

        let err = Converter::with_backends(&config, vec![a])
            .run(&input, Some(&output))
            .unwrap_err();

        assert!(matches!(err, Pdf2SvgError::OutputDirMissing { .. }));
        assert_eq!(a_calls.get(), 0);
    }

    #[test]
    fn standard_chain_follows_config_order() {
        let config = ConversionConfig::default();
        assert_eq!(
            Converter::new(&config).backend_names(),
            vec!["pdf2svg", "pdftocairo", "pdfium"]
        );
    }
}
