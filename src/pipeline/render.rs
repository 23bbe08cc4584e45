//! Opening page one with pdfium, and whole-page rasterisation.
//!
//! The page is only valid while its document is open, so callers get it
//! inside a closure from [`with_first_page`] rather than as a return value.
//! [`rasterise`] is the raster mode of the library fallback: the page's size
//! in points is kept next to the bitmap so the SVG wrapper in
//! [`super::encode`] reproduces the physical page size whatever the raster
//! resolution is.

use crate::error::Pdf2SvgError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Page one of a document, rasterised.
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Page width in PDF points (1/72 inch).
    pub width_pt: f32,
    /// Page height in PDF points.
    pub height_pt: f32,
}

/// Open `pdf_path` with `pdfium` and run `f` on its first page.
pub fn with_first_page<T>(
    pdfium: &Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
    f: impl FnOnce(&PdfPage) -> Result<T, Pdf2SvgError>,
) -> Result<T, Pdf2SvgError> {
    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        let detail = if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                format!("wrong password for '{}'", pdf_path.display())
            } else {
                format!(
                    "'{}' is encrypted; provide --password <PASSWORD>",
                    pdf_path.display()
                )
            }
        } else {
            format!("cannot open '{}': {}", pdf_path.display(), err_str)
        };
        Pdf2SvgError::ConversionFailed { detail }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages, converting page 1", pages.len());
    if pages.len() == 0 {
        return Err(Pdf2SvgError::ConversionFailed {
            detail: format!("'{}' has no pages", pdf_path.display()),
        });
    }

    let page = pages.get(0).map_err(|e| Pdf2SvgError::ConversionFailed {
        detail: format!("cannot load page 1: {:?}", e),
    })?;

    f(&page)
}

/// Rasterise `page`, capping the longest edge of the bitmap at `max_pixels`.
pub fn rasterise(page: &PdfPage, max_pixels: u32) -> Result<RenderedPage, Pdf2SvgError> {
    let width_pt = page.width().value;
    let height_pt = page.height().value;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap =
        page.render_with_config(&render_config)
            .map_err(|e| Pdf2SvgError::ConversionFailed {
                detail: format!("rasterisation of page 1 failed: {:?}", e),
            })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page 1 ({:.1}x{:.1} pt) → {}x{} px",
        width_pt,
        height_pt,
        image.width(),
        image.height()
    );

    Ok(RenderedPage {
        image,
        width_pt,
        height_pt,
    })
}
