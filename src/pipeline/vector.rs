//! Page one as vector SVG.
//!
//! PDFium has no SVG exporter, but it exposes the page's content as typed
//! objects. Each one is translated on its own:
//!
//! | Page object | SVG |
//! |-------------|-----|
//! | path        | `<path>` with the object's matrix, fill and stroke |
//! | text        | `<text>` run in the object's text space |
//! | image       | `<image>` on the unit square, PNG data URI |
//! | form XObject| `<g>` with the form matrix, children recursed |
//! | shading, unsupported | skipped and counted |
//!
//! Everything is written in PDF user space inside one y-flipping group (see
//! [`SvgDocument::open_page_space`]). Clipping paths are not carried over.

use super::encode::{encode_png_base64, fmt_number, xml_escape, Affine, SvgDocument};
use crate::error::Pdf2SvgError;
use pdfium_render::prelude::*;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::debug;

/// Nested form XObjects deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 16;

/// What [`page_to_svg`] managed to translate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VectorStats {
    pub paths: usize,
    pub texts: usize,
    pub images: usize,
    /// Objects that had no SVG counterpart or could not be read.
    pub skipped: usize,
}

impl VectorStats {
    pub fn drawn(&self) -> usize {
        self.paths + self.texts + self.images
    }
}

/// Translate the objects of `page` into an SVG document.
///
/// Embedded bitmaps larger than `max_image_pixels` on their longest edge are
/// downscaled before encoding.
pub fn page_to_svg(page: &PdfPage, max_image_pixels: u32) -> (String, VectorStats) {
    let width_pt = page.width().value;
    let height_pt = page.height().value;

    let mut writer = ObjectWriter {
        doc: SvgDocument::new(width_pt, height_pt),
        stats: VectorStats::default(),
        max_image_pixels,
    };
    writer.doc.open_page_space();
    for object in page.objects().iter() {
        writer.write(&object, 0);
    }

    let stats = writer.stats;
    debug!(
        "Vectorised page 1: {} paths, {} text runs, {} images, {} skipped",
        stats.paths, stats.texts, stats.images, stats.skipped
    );
    (writer.doc.finish(), stats)
}

#[derive(Debug, Error)]
enum ObjectError {
    #[error(transparent)]
    Pdfium(#[from] PdfiumError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

struct ObjectWriter {
    doc: SvgDocument,
    stats: VectorStats,
    max_image_pixels: u32,
}

impl ObjectWriter {
    fn write(&mut self, object: &PdfPageObject, depth: usize) {
        let result = match object {
            PdfPageObject::Path(path) => self.path(path),
            PdfPageObject::Text(text) => self.text(text),
            PdfPageObject::Image(image) => self.image(image),
            PdfPageObject::XObjectForm(form) if depth < MAX_FORM_DEPTH => self.form(form, depth),
            PdfPageObject::XObjectForm(_) => {
                debug!("Form XObject nested deeper than {MAX_FORM_DEPTH}; skipped");
                self.stats.skipped += 1;
                Ok(())
            }
            PdfPageObject::Shading(_) | PdfPageObject::Unsupported(_) => {
                self.stats.skipped += 1;
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!("Page object skipped: {}", e);
            self.stats.skipped += 1;
        }
    }

    fn path(&mut self, path: &PdfPagePathObject) -> Result<(), ObjectError> {
        let segments = path.segments();
        let d = path_data(segments.iter().map(|s| RawSegment {
            kind: match s.segment_type() {
                PdfPathSegmentType::MoveTo => SegmentKind::MoveTo,
                PdfPathSegmentType::LineTo => SegmentKind::LineTo,
                PdfPathSegmentType::BezierTo => SegmentKind::BezierTo,
                PdfPathSegmentType::Unknown => SegmentKind::Unknown,
            },
            x: s.x().value,
            y: s.y().value,
            close: s.is_close(),
        }));
        if d.is_empty() {
            self.stats.skipped += 1;
            return Ok(());
        }

        let fill_mode = path.fill_mode()?;
        let stroked = path.is_stroked()?;
        let paint = PathPaint {
            fill: match fill_mode {
                PdfPathFillMode::None => None,
                _ => Some(rgba(path.fill_color()?)),
            },
            even_odd: fill_mode == PdfPathFillMode::EvenOdd,
            stroke: if stroked {
                Some(rgba(path.stroke_color()?))
            } else {
                None
            },
            stroke_width: path.stroke_width()?.value,
            line_join: match path.line_join()? {
                PdfPageObjectLineJoin::Miter => LineJoin::Miter,
                PdfPageObjectLineJoin::Round => LineJoin::Round,
                PdfPageObjectLineJoin::Bevel => LineJoin::Bevel,
            },
            line_cap: match path.line_cap()? {
                PdfPageObjectLineCap::Butt => LineCap::Butt,
                PdfPageObjectLineCap::Round => LineCap::Round,
                PdfPageObjectLineCap::Square => LineCap::Square,
            },
            dash: if stroked {
                path.dash_array()?.iter().map(|p| p.value).collect()
            } else {
                Vec::new()
            },
        };

        self.doc.path(&d, affine(path.matrix()?), &paint.attributes());
        self.stats.paths += 1;
        Ok(())
    }

    fn text(&mut self, text: &PdfPageTextObject) -> Result<(), ObjectError> {
        let content = text.text();
        if content.trim().is_empty()
            || matches!(
                text.render_mode(),
                PdfPageTextRenderMode::Invisible | PdfPageTextRenderMode::InvisibleClipping
            )
        {
            self.stats.skipped += 1;
            return Ok(());
        }

        let font = text.font();
        let family = font.family();
        let generic = if font.is_serif() { "serif" } else { "sans-serif" };
        let mut attrs = String::new();
        if family.is_empty() {
            let _ = write!(attrs, "font-family=\"{generic}\"");
        } else {
            let _ = write!(
                attrs,
                "font-family=\"{}, {generic}\"",
                xml_escape(&family)
            );
        }
        if font.is_italic() {
            attrs.push_str(" font-style=\"italic\"");
        }
        attrs.push(' ');
        attrs.push_str(&fill_attributes(rgba(text.fill_color()?), false));

        self.doc.text(
            &content,
            affine(text.matrix()?),
            text.unscaled_font_size().value,
            &attrs,
        );
        self.stats.texts += 1;
        Ok(())
    }

    fn image(&mut self, image: &PdfPageImageObject) -> Result<(), ObjectError> {
        let mut bitmap = image.get_raw_image()?;
        let max = self.max_image_pixels;
        if bitmap.width() > max || bitmap.height() > max {
            bitmap = bitmap.thumbnail(max, max);
        }
        let b64 = encode_png_base64(&bitmap)?;
        self.doc.unit_image(&b64, affine(image.matrix()?));
        self.stats.images += 1;
        Ok(())
    }

    fn form(&mut self, form: &PdfPageXObjectFormObject, depth: usize) -> Result<(), ObjectError> {
        self.doc.open_group(affine(form.matrix()?));
        for child in form.iter() {
            self.write(&child, depth + 1);
        }
        self.doc.close_group();
        Ok(())
    }
}

fn affine(m: PdfMatrix) -> Affine {
    Affine([m.a(), m.b(), m.c(), m.d(), m.e(), m.f()])
}

fn rgba(c: PdfColor) -> Rgba8 {
    Rgba8([c.red(), c.green(), c.blue(), c.alpha()])
}

// ── Path data ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    MoveTo,
    LineTo,
    /// One of the three points of a cubic curve: two control points, then
    /// the end point.
    BezierTo,
    Unknown,
}

/// A path segment as PDFium reports it, in the object's own coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSegment {
    pub kind: SegmentKind,
    pub x: f32,
    pub y: f32,
    /// The sub-path is closed after this point.
    pub close: bool,
}

/// SVG path data for a segment list.
///
/// Consecutive `BezierTo` points are grouped in threes into one `C` command.
/// A close flag on a control point is applied once the curve is complete.
pub fn path_data(segments: impl IntoIterator<Item = RawSegment>) -> String {
    let mut d = String::new();
    let mut curve: Vec<(f32, f32)> = Vec::with_capacity(3);
    let mut close_after_curve = false;

    for seg in segments {
        if seg.kind != SegmentKind::BezierTo && !curve.is_empty() {
            debug!("Dropping incomplete curve of {} points", curve.len());
            curve.clear();
            close_after_curve = false;
        }

        match seg.kind {
            SegmentKind::MoveTo => push_cmd(&mut d, 'M', &[(seg.x, seg.y)]),
            SegmentKind::LineTo => push_cmd(&mut d, 'L', &[(seg.x, seg.y)]),
            SegmentKind::BezierTo => {
                curve.push((seg.x, seg.y));
                close_after_curve |= seg.close;
                if curve.len() == 3 {
                    push_cmd(&mut d, 'C', &curve);
                    curve.clear();
                    if close_after_curve {
                        d.push('Z');
                        close_after_curve = false;
                    }
                }
                continue;
            }
            SegmentKind::Unknown => continue,
        }

        if seg.close {
            d.push('Z');
        }
    }
    d
}

fn push_cmd(d: &mut String, cmd: char, points: &[(f32, f32)]) {
    d.push(cmd);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{} {}", fmt_number(*x), fmt_number(*y));
    }
}

// ── Paint ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    fn hex(&self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    fn opacity(&self) -> Option<String> {
        let a = self.0[3];
        (a < 255).then(|| fmt_number(a as f32 / 255.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

/// Fill and stroke of one path object.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPaint {
    pub fill: Option<Rgba8>,
    pub even_odd: bool,
    pub stroke: Option<Rgba8>,
    /// Zero means the thinnest line the device can draw.
    pub stroke_width: f32,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub dash: Vec<f32>,
}

impl PathPaint {
    /// Presentation attributes. SVG defaults (miter joins, butt caps,
    /// nonzero fill) are left implicit.
    pub fn attributes(&self) -> String {
        let mut out = match self.fill {
            Some(c) => fill_attributes(c, self.even_odd),
            None => "fill=\"none\"".to_string(),
        };

        if let Some(c) = self.stroke {
            let _ = write!(out, " stroke=\"{}\"", c.hex());
            if let Some(o) = c.opacity() {
                let _ = write!(out, " stroke-opacity=\"{o}\"");
            }
            if self.stroke_width > 0.0 {
                let _ = write!(out, " stroke-width=\"{}\"", fmt_number(self.stroke_width));
            } else {
                out.push_str(" stroke-width=\"1\" vector-effect=\"non-scaling-stroke\"");
            }
            match self.line_join {
                LineJoin::Miter => {}
                LineJoin::Round => out.push_str(" stroke-linejoin=\"round\""),
                LineJoin::Bevel => out.push_str(" stroke-linejoin=\"bevel\""),
            }
            match self.line_cap {
                LineCap::Butt => {}
                LineCap::Round => out.push_str(" stroke-linecap=\"round\""),
                LineCap::Square => out.push_str(" stroke-linecap=\"square\""),
            }
            if !self.dash.is_empty() {
                let dash: Vec<String> = self.dash.iter().map(|v| fmt_number(*v)).collect();
                let _ = write!(out, " stroke-dasharray=\"{}\"", dash.join(" "));
            }
        }
        out
    }
}

fn fill_attributes(c: Rgba8, even_odd: bool) -> String {
    let mut out = format!("fill=\"{}\"", c.hex());
    if let Some(o) = c.opacity() {
        let _ = write!(out, " fill-opacity=\"{o}\"");
    }
    if even_odd {
        out.push_str(" fill-rule=\"evenodd\"");
    }
    out
}
