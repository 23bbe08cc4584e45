//! Progress-callback trait for fallback-chain events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! which backend is being tried, which ones were skipped or failed, and how
//! the optional PDFium download is going. The `pdf-to-svg` binary uses it to
//! print its status lines; library users can forward the events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2svg::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     failures: Mutex<Vec<String>>,
//! }
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_backend_failed(&self, backend: &str, error: &str, _next: Option<&str>) {
//!         self.failures.lock().unwrap().push(format!("{backend}: {error}"));
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Recorder::default()) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the converter as it walks the fallback chain.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive on the calling thread, in order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the input was validated and before any backend runs.
    fn on_conversion_start(&self, input: &Path, output: &Path) {
        let _ = (input, output);
    }

    /// A backend was disabled or is not installed.
    fn on_backend_skipped(&self, backend: &str) {
        let _ = backend;
    }

    /// A backend is about to run.
    fn on_backend_start(&self, backend: &str) {
        let _ = backend;
    }

    /// A backend ran and failed. `next` is the backend the chain moves on
    /// to, or `None` when this was the last one configured.
    fn on_backend_failed(&self, backend: &str, error: &str, next: Option<&str>) {
        let _ = (backend, error, next);
    }

    /// A backend produced `svg_path`. No further backends run.
    fn on_backend_succeeded(&self, backend: &str, svg_path: &Path) {
        let _ = (backend, svg_path);
    }

    /// PDFium is missing and the opt-in download is starting.
    fn on_install_start(&self) {}

    /// Download progress: `(bytes_downloaded, total_bytes_if_known)`.
    fn on_install_progress(&self, downloaded: u64, total: Option<u64>) {
        let _ = (downloaded, total);
    }

    /// The download finished and the library is at `library`.
    fn on_install_complete(&self, library: &Path) {
        let _ = library;
    }
}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// A no-op implementation used when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}
