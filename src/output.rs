//! Result types: what the fallback chain did and where the SVG ended up.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one backend in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The backend was disabled or its probe said it is not installed.
    Skipped,
    /// The backend ran and failed; the chain moved on.
    Failed { error: String },
    /// The backend produced the SVG.
    Succeeded,
}

/// A single step of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// Backend name, e.g. `"pdf2svg"`.
    pub backend: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn skipped(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            outcome: AttemptOutcome::Skipped,
        }
    }

    pub fn failed(backend: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            outcome: AttemptOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn succeeded(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            outcome: AttemptOutcome::Succeeded,
        }
    }
}

/// Successful conversion result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The PDF that was converted.
    pub input: PathBuf,
    /// Where the SVG was written. Always the requested output path.
    pub svg_path: PathBuf,
    /// Name of the backend that produced the file.
    pub backend: String,
    /// Every backend consulted, in order, ending with the successful one.
    pub attempts: Vec<Attempt>,
    /// Wall-clock time for the whole chain.
    pub duration_ms: u64,
}

/// Availability of one backend, as reported by [`crate::deps::check_dependencies`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub backend: String,
    pub available: bool,
    /// Extra context: the command probed, or where PDFium was found.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_serialises_flat() {
        let json = serde_json::to_value(Attempt::failed("pdf2svg", "exit status: 2")).unwrap();
        assert_eq!(json["backend"], "pdf2svg");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "exit status: 2");

        let json = serde_json::to_value(Attempt::skipped("pdftocairo")).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn output_json_contains_path_and_backend() {
        let out = ConversionOutput {
            input: PathBuf::from("logo.pdf"),
            svg_path: PathBuf::from("logo.svg"),
            backend: "pdftocairo".into(),
            attempts: vec![Attempt::skipped("pdf2svg"), Attempt::succeeded("pdftocairo")],
            duration_ms: 12,
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"svg_path\":\"logo.svg\""), "got: {json}");
        assert!(json.contains("\"backend\":\"pdftocairo\""), "got: {json}");
    }
}
