use std::sync::Arc;

use tiny_skia::{
    Color, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Point, PremultipliedColorU8, Rect, Stroke, Transform,
};

use crate::error::{Result, VisError};
use crate::text::{FontMetrics, FontSet, FontSpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl StrokeStyle {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn round(width: f32) -> Self {
        Self {
            width,
            cap: LineCap::Round,
            join: LineJoin::Round,
        }
    }

    fn to_stroke(self) -> Stroke {
        Stroke {
            width: self.width,
            line_cap: self.cap,
            line_join: self.join,
            ..Stroke::default()
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHints {
    pub anti_alias: bool,
    pub text_anti_alias: bool,
    pub bilinear: bool,
}

impl RenderHints {
    pub fn quality(anti_alias: bool) -> Self {
        Self {
            anti_alias,
            text_anti_alias: anti_alias,
            bilinear: true,
        }
    }
}

impl Default for RenderHints {
    fn default() -> Self {
        Self::quality(true)
    }
}

/// Immutable premultiplied RGBA image shared between recorded commands.
#[derive(Clone)]
pub struct SharedImage(Arc<Pixmap>);

impl SharedImage {
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or(VisError::Surface { width, height })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(Self(Arc::new(pixmap)))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    fn pixmap(&self) -> &Pixmap {
        &self.0
    }
}

impl PartialEq for SharedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SharedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedImage({}x{})", self.width(), self.height())
    }
}

/// The drawing operations visualization code may use.
///
/// Anything outside this vocabulary is rejected: the provided methods at the bottom exist
/// so callers get an `UnsupportedOperation` error instead of silently different output.
pub trait Canvas {
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn draw_image(&mut self, image: &SharedImage, x: f32, y: f32, width: f32, height: f32);
    /// Draws `text` with its baseline starting at `(x, y)`.
    fn draw_string(&mut self, text: &str, x: f32, y: f32);

    fn set_color(&mut self, color: Color);
    fn set_stroke(&mut self, stroke: StrokeStyle);
    fn set_font(&mut self, font: FontSpec);
    fn set_render_hints(&mut self, hints: RenderHints);
    fn set_transform(&mut self, transform: Transform);

    fn transform(&self) -> Transform;
    fn font(&self) -> FontSpec;
    fn fonts(&self) -> &FontSet;

    fn font_metrics(&self, font: FontSpec) -> FontMetrics {
        self.fonts().metrics(font)
    }

    fn text_width(&self, font: FontSpec, text: &str) -> f32 {
        self.fonts().text_width(font, text)
    }

    fn draw_oval(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) -> Result<()> {
        Err(VisError::UnsupportedOperation("draw-oval"))
    }

    fn fill_oval(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) -> Result<()> {
        Err(VisError::UnsupportedOperation("fill-oval"))
    }

    fn draw_arc(&mut self, _bounds: [f32; 4], _start: f32, _extent: f32) -> Result<()> {
        Err(VisError::UnsupportedOperation("draw-arc"))
    }

    fn draw_polygon(&mut self, _points: &[(f32, f32)]) -> Result<()> {
        Err(VisError::UnsupportedOperation("draw-polygon"))
    }

    fn fill_polygon(&mut self, _points: &[(f32, f32)]) -> Result<()> {
        Err(VisError::UnsupportedOperation("fill-polygon"))
    }

    fn clip_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) -> Result<()> {
        Err(VisError::UnsupportedOperation("clip-rect"))
    }
}

/// CPU raster target backed by a `tiny_skia::Pixmap`.
pub struct PixmapSurface {
    pixmap: Pixmap,
    fonts: FontSet,
    color: Color,
    stroke: StrokeStyle,
    font: FontSpec,
    hints: RenderHints,
    transform: Transform,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32, fonts: FontSet) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(VisError::Surface { width, height })?;
        Ok(Self {
            pixmap,
            fonts,
            color: Color::BLACK,
            stroke: StrokeStyle::default(),
            font: FontSpec::default(),
            hints: RenderHints::default(),
            transform: Transform::identity(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.color);
        paint.anti_alias = self.hints.anti_alias;
        paint
    }

    fn stroke_path(&mut self, path: &tiny_skia::Path) {
        let paint = self.paint();
        let stroke = self.stroke.to_stroke();
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.transform, None);
    }

    /// Source-over blend of the current color at `coverage` into one device pixel.
    fn blend_pixel(&mut self, x: i32, y: i32, coverage: f32) {
        if x < 0 || y < 0 || x >= self.pixmap.width() as i32 || y >= self.pixmap.height() as i32 {
            return;
        }
        let coverage = if self.hints.text_anti_alias {
            coverage.clamp(0.0, 1.0)
        } else if coverage >= 0.5 {
            1.0
        } else {
            0.0
        };
        let alpha = self.color.alpha() * coverage;
        if alpha <= 0.0 {
            return;
        }
        let index = y as usize * self.pixmap.width() as usize + x as usize;
        let dst = self.pixmap.pixels()[index];
        let keep = 1.0 - alpha;
        let a = (alpha * 255.0 + dst.alpha() as f32 * keep).round().min(255.0) as u8;
        let channel = |src: f32, dst: u8| -> u8 {
            ((src * alpha * 255.0 + dst as f32 * keep).round() as u8).min(a)
        };
        let r = channel(self.color.red(), dst.red());
        let g = channel(self.color.green(), dst.green());
        let b = channel(self.color.blue(), dst.blue());
        if let Some(px) = PremultipliedColorU8::from_rgba(r, g, b, a) {
            self.pixmap.pixels_mut()[index] = px;
        }
    }
}

impl Canvas for PixmapSurface {
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let mut pb = PathBuilder::new();
        pb.move_to(x1, y1);
        pb.line_to(x2, y2);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            let paint = self.paint();
            self.pixmap.fill_rect(rect, &paint, self.transform, None);
        }
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            let path = PathBuilder::from_rect(rect);
            self.stroke_path(&path);
        }
    }

    fn draw_image(&mut self, image: &SharedImage, x: f32, y: f32, width: f32, height: f32) {
        if image.width() == 0 || image.height() == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let transform = self.transform.pre_translate(x, y).pre_scale(
            width / image.width() as f32,
            height / image.height() as f32,
        );
        let paint = PixmapPaint {
            quality: if self.hints.bilinear {
                FilterQuality::Bilinear
            } else {
                FilterQuality::Nearest
            },
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);
    }

    fn draw_string(&mut self, text: &str, x: f32, y: f32) {
        let t = self.transform;
        let mut origin = Point::from_xy(x, y);
        t.map_point(&mut origin);
        let vertical_scale = (t.kx * t.kx + t.sy * t.sy).sqrt();
        let size = self.font.size * vertical_scale;
        if size <= 0.0 || text.is_empty() {
            return;
        }
        let face = self.fonts.face(self.font.style);
        let mut plotted = Vec::new();
        face.rasterize(text, size, (origin.x, origin.y), |px, py, v| {
            plotted.push((px, py, v));
        });
        for (px, py, v) in plotted {
            self.blend_pixel(px, py, v);
        }
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_stroke(&mut self, stroke: StrokeStyle) {
        self.stroke = stroke;
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    fn set_render_hints(&mut self, hints: RenderHints) {
        self.hints = hints;
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn font(&self) -> FontSpec {
        self.font
    }

    fn fonts(&self) -> &FontSet {
        &self.fonts
    }
}
