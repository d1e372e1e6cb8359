//! Window geometry: the letterboxed content viewport and the side panel columns.

use tiny_skia::{Point, Transform};

use crate::config::VisConfig;
use crate::info::InfoPanel;
use crate::text::{FontSet, FontSpec};
use crate::utils::{Position, Rectangle, Size};

/// Panel rows advance by this multiple of the font height.
pub const LINE_SPACING: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelMetrics {
    pub border: f32,
    pub font_size: f32,
    /// Width of a bold `0`, the unit of `columns`.
    pub glyph_width: f32,
    pub font_height: f32,
    pub columns: u32,
    pub lines: u32,
}

impl PanelMetrics {
    pub fn new(config: &VisConfig, fonts: &FontSet) -> Self {
        let (font_size, glyph_width, font_height) = match config.info_font_size() {
            Some(size) => {
                let bold = FontSpec::bold(size);
                (
                    size,
                    fonts.text_width(bold, "0").ceil(),
                    fonts.metrics(bold).height().ceil(),
                )
            }
            None => (0.0, 0.0, 0.0),
        };
        Self {
            border: config.border(),
            font_size,
            glyph_width,
            font_height,
            columns: config.info_columns,
            lines: config.info_lines,
        }
    }

    pub fn has_panel(&self) -> bool {
        self.columns > 0 && self.glyph_width > 0.0
    }

    pub fn panel_width(&self) -> f32 {
        if self.has_panel() {
            self.border + self.columns as f32 * self.glyph_width
        } else {
            0.0
        }
    }

    pub fn line_height(&self) -> f32 {
        (LINE_SPACING * self.font_height).trunc()
    }

    pub fn plain_font(&self) -> FontSpec {
        FontSpec::plain(self.font_size)
    }

    pub fn bold_font(&self) -> FontSpec {
        FontSpec::bold(self.font_size)
    }
}

/// Screen placement of the logical content rectangle for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentViewport {
    pub screen: Rectangle,
    pub content: Rectangle,
    pub transform: Transform,
}

impl ContentViewport {
    pub fn contains(&self, point: Position) -> bool {
        self.screen.contains(point)
    }

    /// Maps a screen point into logical content coordinates.
    pub fn to_content(&self, point: Position) -> Position {
        Position {
            x: (point.x - self.screen.x) / self.screen.width * self.content.width + self.content.x,
            y: (point.y - self.screen.y) / self.screen.height * self.content.height
                + self.content.y,
        }
    }

    pub fn to_screen(&self, point: Position) -> Position {
        let mut p = Point::from_xy(point.x, point.y);
        self.transform.map_point(&mut p);
        Position { x: p.x, y: p.y }
    }
}

/// Fits `content` into `viewport` keeping its aspect ratio.
///
/// A width-limited fit keeps the top edge and shortens the height; otherwise the width is
/// shortened and the content is centered horizontally. Sizes are truncated to whole pixels.
pub fn fit_content(content: Rectangle, viewport: Rectangle) -> Option<ContentViewport> {
    if viewport.is_empty() || content.is_empty() {
        return None;
    }
    let mut px = viewport.x;
    let py = viewport.y;
    let mut pw = viewport.width;
    let mut ph = viewport.height;
    if content.width * ph > content.height * pw {
        ph = (content.height * pw / content.width).trunc();
    } else {
        let nw = (content.width * ph / content.height).trunc();
        px += ((pw - nw) / 2.0).trunc();
        pw = nw;
    }
    if pw <= 0.0 || ph <= 0.0 {
        return None;
    }
    let transform = Transform::from_translate(px, py)
        .pre_scale(pw / content.width, ph / content.height)
        .pre_translate(-content.x, -content.y);
    Some(ContentViewport {
        screen: Rectangle::new(px, py, pw, ph),
        content,
        transform,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub content: Rectangle,
    pub metrics: PanelMetrics,
}

impl Layout {
    pub fn new(content: Rectangle, metrics: PanelMetrics) -> Self {
        Self { content, metrics }
    }

    pub fn from_config(config: &VisConfig, fonts: &FontSet) -> Self {
        Self::new(config.content_rect, PanelMetrics::new(config, fonts))
    }

    /// Window area left for content: minus the panel on the right and a border all round.
    pub fn viewport_area(&self, width: f32, height: f32) -> Rectangle {
        let border = self.metrics.border;
        let w = width - self.metrics.panel_width();
        Rectangle::new(border, border, w - 2.0 * border, height - 2.0 * border)
    }

    pub fn content_viewport(&self, width: f32, height: f32) -> Option<ContentViewport> {
        fit_content(self.content, self.viewport_area(width, height))
    }

    /// Top-left corner of the panel text area.
    pub fn panel_origin(&self, width: f32) -> Position {
        Position {
            x: width - self.metrics.glyph_width * self.metrics.columns as f32 - self.metrics.border,
            y: self.metrics.border,
        }
    }

    /// Shared label column width, measured with the bold face for every entry.
    ///
    /// Entries without a value are centered on the column boundary, so they only
    /// contribute half their width.
    pub fn label_column(&self, panel: &InfoPanel, fonts: &FontSet) -> f32 {
        let bold = self.metrics.bold_font();
        panel
            .rows()
            .flatten()
            .map(|entry| {
                let mut text = entry.key.measure_text();
                if entry.value.is_some() {
                    text.push_str(": ");
                }
                if entry.checked.is_some() {
                    text.push_str("##");
                }
                let width = fonts.text_width(bold, &text).trunc();
                if entry.value.is_some() {
                    width
                } else {
                    (width / 2.0).trunc()
                }
            })
            .fold(0.0, f32::max)
    }

    /// Window size showing the content at `scale` pixels per unit next to a full panel.
    pub fn preferred_size(&self, scale: f32) -> Size {
        let m = &self.metrics;
        let mut width = 2.0 * m.border + (self.content.width * scale).trunc();
        if m.has_panel() {
            width += m.border + m.columns as f32 * m.glyph_width;
        }
        let panel_height = m.lines as f32 * m.font_height * LINE_SPACING;
        let height = 2.0 * m.border + panel_height.max(self.content.height * scale).trunc();
        Size::new(width, height)
    }

    /// Largest content scale whose preferred size fits in `available`.
    pub fn fit_scale(&self, available: Size) -> f32 {
        let m = &self.metrics;
        let sw = (available.width - 3.0 * m.border - m.columns as f32 * m.glyph_width)
            / self.content.width;
        let sh = (available.height - 2.0 * m.border) / self.content.height;
        sw.min(sh)
    }
}
