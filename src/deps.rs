//! Dependency report: which backends could run on this machine right now.
//!
//! Nothing here downloads or converts anything. PDFium counts as available
//! when a library can be located or bound from the system path; a missing
//! library that `--auto-install` could fetch is reported as unavailable.

use crate::backend::probe::probe;
use crate::config::{BackendKind, ConversionConfig};
use crate::output::BackendStatus;

/// Probe every backend (enabled or not) and describe the result.
pub fn check_dependencies(config: &ConversionConfig) -> Vec<BackendStatus> {
    BackendKind::ALL
        .iter()
        .map(|&kind| match kind {
            BackendKind::Pdf2Svg => BackendStatus {
                backend: kind.name().to_string(),
                available: probe(&config.pdf2svg, "--help"),
                detail: format!("{} --help", config.pdf2svg),
            },
            BackendKind::Pdftocairo => BackendStatus {
                backend: kind.name().to_string(),
                available: probe(&config.pdftocairo, "-v"),
                detail: format!("{} -v", config.pdftocairo),
            },
            BackendKind::Pdfium => pdfium_status(config),
        })
        .collect()
}

fn pdfium_status(config: &ConversionConfig) -> BackendStatus {
    let name = BackendKind::Pdfium.name().to_string();

    if let Some(path) = config
        .pdfium_library
        .clone()
        .or_else(pdfium_auto::locate_pdfium_library)
    {
        return BackendStatus {
            backend: name,
            available: path.is_file(),
            detail: path.display().to_string(),
        };
    }

    match pdfium_auto::bind_system_pdfium() {
        Ok(_) => BackendStatus {
            backend: name,
            available: true,
            detail: "system library".to_string(),
        },
        Err(_) => BackendStatus {
            backend: name,
            available: false,
            detail: format!(
                "not found (would install into {} with --auto-install)",
                pdfium_auto::pdfium_cache_dir().display()
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCommand;

    #[test]
    fn reports_every_backend_in_order() {
        let config = ConversionConfig::builder()
            .pdf2svg(ToolCommand::new("definitely-not-pdf2svg-91c2"))
            .pdftocairo(ToolCommand::new("definitely-not-pdftocairo-91c2"))
            .pdfium_library("/definitely/not/libpdfium.so")
            .build()
            .unwrap();

        let report = check_dependencies(&config);
        let names: Vec<&str> = report.iter().map(|s| s.backend.as_str()).collect();
        assert_eq!(names, vec!["pdf2svg", "pdftocairo", "pdfium"]);
        assert!(report.iter().all(|s| !s.available));
        assert!(report[0].detail.contains("--help"));
        assert!(report[1].detail.ends_with(" -v"));
    }
}
