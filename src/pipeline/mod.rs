//! Conversion stages used by the PDFium backend.
//!
//! ```text
//! input ──▶ (external tool)                          ──▶ SVG
//!       └─▶ render::with_first_page ─┬─▶ vector        ──▶ SVG
//!          (pdfium)                  └─▶ rasterise ─▶ encode ──▶ SVG
//! ```
//!
//! 1. [`input`]  — validate the PDF path and the output directory before any
//!    backend runs
//! 2. [`render`] — open page one with pdfium; rasterise it in raster mode
//! 3. [`vector`] — translate page objects into SVG elements
//! 4. [`encode`] — the SVG document shell and PNG data URIs

pub mod encode;
pub mod input;
pub mod render;
pub mod vector;
