//! Font faces used for panel labels and recorded `draw-string` commands.
//!
//! Faces are looked up in the system font database and rasterized with `rusttype`.
//! When no usable face is installed a block-glyph fallback keeps layout and output
//! deterministic.

use resvg::usvg::fontdb;
use rusttype::{point, Font, Scale};

/// Advance of one fallback glyph, relative to the font size.
const FALLBACK_ADVANCE: f32 = 0.6;
const FALLBACK_ASCENT: f32 = 0.8;
const FALLBACK_DESCENT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Plain,
    Bold,
}

/// A font selection as recorded by `set-font`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub style: FontStyle,
    pub size: f32,
}

impl FontSpec {
    pub fn plain(size: f32) -> Self {
        Self {
            style: FontStyle::Plain,
            size,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            style: FontStyle::Bold,
            size,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::plain(12.0)
    }
}

/// Whole-pixel vertical metrics of a face at a given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
}

impl FontMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }
}

#[derive(Clone)]
pub enum FontFace {
    Truetype(Font<'static>),
    /// Fixed-advance block glyphs.
    Fallback,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Truetype(_) => f.write_str("FontFace::Truetype"),
            FontFace::Fallback => f.write_str("FontFace::Fallback"),
        }
    }
}

impl FontFace {
    pub fn metrics(&self, size: f32) -> FontMetrics {
        match self {
            FontFace::Truetype(font) => {
                let v = font.v_metrics(Scale::uniform(size));
                FontMetrics {
                    ascent: v.ascent.ceil(),
                    descent: (-v.descent).ceil(),
                    leading: v.line_gap.max(0.0).ceil(),
                }
            }
            FontFace::Fallback => FontMetrics {
                ascent: (size * FALLBACK_ASCENT).ceil(),
                descent: (size * FALLBACK_DESCENT).ceil(),
                leading: 0.0,
            },
        }
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            FontFace::Truetype(font) => font
                .layout(text, Scale::uniform(size), point(0.0, 0.0))
                .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                .fold(0.0, f32::max),
            FontFace::Fallback => text.chars().count() as f32 * size * FALLBACK_ADVANCE,
        }
    }

    /// Rasterizes `text` with its baseline starting at `origin`, in device pixels.
    /// `plot` receives pixel coordinates and a coverage value in `0.0..=1.0`.
    pub fn rasterize<F>(&self, text: &str, size: f32, origin: (f32, f32), mut plot: F)
    where
        F: FnMut(i32, i32, f32),
    {
        match self {
            FontFace::Truetype(font) => {
                let scale = Scale::uniform(size);
                for glyph in font.layout(text, scale, point(origin.0, origin.1)) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        glyph.draw(|x, y, v| plot(bb.min.x + x as i32, bb.min.y + y as i32, v));
                    }
                }
            }
            FontFace::Fallback => {
                let advance = size * FALLBACK_ADVANCE;
                let top = (origin.1 - size * FALLBACK_ASCENT * 0.7).round() as i32;
                let bottom = origin.1.round() as i32;
                for (i, c) in text.chars().enumerate() {
                    if c.is_whitespace() {
                        continue;
                    }
                    let pen = origin.0 + i as f32 * advance;
                    let left = (pen + advance * 0.15).round() as i32;
                    let right = (pen + advance * 0.85).round() as i32;
                    for y in top..bottom {
                        for x in left..right {
                            plot(x, y, 1.0);
                        }
                    }
                }
            }
        }
    }
}

/// Plain and bold faces shared by every surface of one engine.
#[derive(Debug, Clone)]
pub struct FontSet {
    plain: FontFace,
    bold: FontFace,
}

impl FontSet {
    pub fn new(plain: FontFace, bold: FontFace) -> Self {
        Self { plain, bold }
    }

    pub fn fallback() -> Self {
        Self::new(FontFace::Fallback, FontFace::Fallback)
    }

    /// Loads the system sans-serif family, falling back per face when a weight is missing.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let plain = load_face(&db, fontdb::Weight::NORMAL);
        let bold = load_face(&db, fontdb::Weight::BOLD);
        Self::new(plain, bold)
    }

    pub fn face(&self, style: FontStyle) -> &FontFace {
        match style {
            FontStyle::Plain => &self.plain,
            FontStyle::Bold => &self.bold,
        }
    }

    pub fn metrics(&self, font: FontSpec) -> FontMetrics {
        self.face(font.style).metrics(font.size)
    }

    pub fn text_width(&self, font: FontSpec, text: &str) -> f32 {
        self.face(font.style).text_width(text, font.size)
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::fallback()
    }
}

fn load_face(db: &fontdb::Database, weight: fontdb::Weight) -> FontFace {
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        weight,
        ..fontdb::Query::default()
    };
    let font = db.query(&query).and_then(|id| {
        db.with_face_data(id, |data, index| {
            Font::try_from_vec_and_index(data.to_vec(), index)
        })
        .flatten()
    });
    match font {
        Some(font) => FontFace::Truetype(font),
        None => {
            log::warn!(
                "no sans-serif face with weight {} found, using block glyphs",
                weight.0
            );
            FontFace::Fallback
        }
    }
}
