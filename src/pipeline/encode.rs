//! SVG encoding: the document shell shared by both PDFium output modes, and
//! `DynamicImage` → base64 PNG for embedded bitmaps.
//!
//! PDF user space has its origin at the bottom left with y growing upwards.
//! [`SvgDocument::open_page_space`] flips that once for the whole page, so
//! elements can be written with the PDF's own coordinates and matrices.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::fmt::{self, Write as _};
use std::io::Cursor;
use tracing::debug;

/// Encode `img` as PNG and return the base64 text.
pub fn encode_png_base64(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded {}x{} bitmap → {} bytes base64", img.width(), img.height(), b64.len());
    Ok(b64)
}

/// A 2-D affine transform `[a b c d e f]`, as in PDF `cm` and SVG `matrix()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(pub [f32; 6]);

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Maps the unit square onto itself upside down; used for bitmaps and
    /// glyph runs, whose own y axis points down.
    pub const FLIP_UNIT: Affine = Affine([1.0, 0.0, 0.0, -1.0, 0.0, 1.0]);

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "matrix({} {} {} {} {} {})",
            fmt_number(a),
            fmt_number(b),
            fmt_number(c),
            fmt_number(d),
            fmt_number(e),
            fmt_number(g)
        )
    }
}

/// A standalone SVG document sized in points, written front to back.
pub struct SvgDocument {
    buf: String,
    height_pt: f32,
    open_groups: usize,
}

impl SvgDocument {
    /// Start a document whose `width`/`height` are in points and whose
    /// viewBox is the page box.
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        let w = fmt_number(width_pt);
        let h = fmt_number(height_pt);
        let mut buf = String::with_capacity(4096);
        buf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        // `write!` into a String cannot fail.
        let _ = writeln!(
            buf,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" \
width=\"{w}pt\" height=\"{h}pt\" viewBox=\"0 0 {w} {h}\">"
        );
        Self {
            buf,
            height_pt,
            open_groups: 0,
        }
    }

    /// Open a group in PDF user space (origin bottom left, y up).
    pub fn open_page_space(&mut self) {
        let flip = Affine([1.0, 0.0, 0.0, -1.0, 0.0, self.height_pt]);
        self.open_group(flip);
    }

    pub fn open_group(&mut self, transform: Affine) {
        if transform.is_identity() {
            self.buf.push_str("<g>\n");
        } else {
            let _ = writeln!(self.buf, "<g transform=\"{transform}\">");
        }
        self.open_groups += 1;
    }

    pub fn close_group(&mut self) {
        if self.open_groups > 0 {
            self.buf.push_str("</g>\n");
            self.open_groups -= 1;
        }
    }

    /// `<path d=… transform=… {attrs}/>`; `attrs` is pre-rendered.
    pub fn path(&mut self, d: &str, transform: Affine, attrs: &str) {
        let _ = write!(self.buf, "<path d=\"{d}\"");
        if !transform.is_identity() {
            let _ = write!(self.buf, " transform=\"{transform}\"");
        }
        let _ = writeln!(self.buf, " {attrs}/>");
    }

    /// A text run drawn at the origin of `transform` (PDF text space).
    pub fn text(&mut self, text: &str, transform: Affine, font_size: f32, attrs: &str) {
        let _ = writeln!(
            self.buf,
            "<text transform=\"{transform} scale(1 -1)\" font-size=\"{}\" {attrs}>{}</text>",
            fmt_number(font_size),
            xml_escape(text)
        );
    }

    /// A bitmap painted onto the unit square mapped by `transform`, which is
    /// how PDF places images.
    pub fn unit_image(&mut self, png_base64: &str, transform: Affine) {
        let _ = writeln!(
            self.buf,
            "<image x=\"0\" y=\"0\" width=\"1\" height=\"1\" preserveAspectRatio=\"none\" \
transform=\"{transform} {}\" xlink:href=\"data:image/png;base64,{png_base64}\"/>",
            Affine::FLIP_UNIT
        );
    }

    /// A bitmap covering the whole viewBox.
    pub fn page_image(&mut self, png_base64: &str, width_pt: f32, height_pt: f32) {
        let _ = writeln!(
            self.buf,
            "<image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" \
preserveAspectRatio=\"none\" xlink:href=\"data:image/png;base64,{png_base64}\"/>",
            fmt_number(width_pt),
            fmt_number(height_pt)
        );
    }

    /// Close any open groups and the root element.
    pub fn finish(mut self) -> String {
        while self.open_groups > 0 {
            self.close_group();
        }
        self.buf.push_str("</svg>\n");
        self.buf
    }
}

/// Wrap a page raster in an SVG document sized `width_pt` × `height_pt`.
pub fn page_svg(
    img: &DynamicImage,
    width_pt: f32,
    height_pt: f32,
) -> Result<String, image::ImageError> {
    let b64 = encode_png_base64(img)?;
    let mut doc = SvgDocument::new(width_pt, height_pt);
    doc.page_image(&b64, width_pt, height_pt);
    Ok(doc.finish())
}

/// Format a value with at most three decimals and no trailing zeros.
pub fn fmt_number(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape text content and attribute values.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not allowed in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}
