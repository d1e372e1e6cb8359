use std::sync::Arc;

use tiny_skia::{Color, Transform};
use uuid::Uuid;

use crate::canvas::{Canvas, RenderHints, StrokeStyle};
use crate::command::CommandBuffer;
use crate::config::VisConfig;
use crate::info::{InfoKey, InfoPanel};
use crate::layout::{ContentViewport, Layout};
use crate::text::FontSet;
use crate::utils::{Position, Rectangle};

pub fn background() -> Color {
    Color::from_rgba8(230, 230, 232, 255)
}

/// Checkbox rectangles of the last render, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitRegions {
    regions: Vec<(InfoKey, Rectangle)>,
}

impl HitRegions {
    pub fn insert(&mut self, key: InfoKey, rect: Rectangle) {
        match self.regions.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = rect,
            None => self.regions.push((key, rect)),
        }
    }

    pub fn get(&self, key: &InfoKey) -> Option<Rectangle> {
        self.regions
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, rect)| *rect)
    }

    /// First region containing `point`.
    pub fn hit(&self, point: Position) -> Option<&InfoKey> {
        self.regions
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub key: InfoKey,
    /// Top of the text line.
    pub top: f32,
    /// Left edge of the drawn label.
    pub label_x: f32,
    pub checkbox: Option<Rectangle>,
}

/// Geometry produced by one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLayout {
    pub viewport: Option<ContentViewport>,
    pub rows: Vec<PanelRow>,
    pub hit_regions: HitRegions,
}

/// Everything about drawing a frame that comes from configuration rather than the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    pub layout: Layout,
    pub hints: RenderHints,
}

impl FrameStyle {
    pub fn from_config(config: &VisConfig, fonts: &FontSet) -> Self {
        Self {
            layout: Layout::from_config(config, fonts),
            hints: RenderHints::quality(config.anti_alias),
        }
    }
}

/// One sealed frame: recorded content plus the panel state captured with it.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    id: Uuid,
    commands: Arc<CommandBuffer>,
    panel: InfoPanel,
    hit_regions: HitRegions,
}

impl FrameSnapshot {
    pub fn new(commands: CommandBuffer, panel: InfoPanel) -> Self {
        Self {
            id: Uuid::new_v4(),
            commands: Arc::new(commands),
            panel,
            hit_regions: HitRegions::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn commands(&self) -> &Arc<CommandBuffer> {
        &self.commands
    }

    pub fn panel(&self) -> &InfoPanel {
        &self.panel
    }

    pub fn hit_regions(&self) -> &HitRegions {
        &self.hit_regions
    }

    pub fn set_hit_regions(&mut self, regions: HitRegions) {
        self.hit_regions = regions;
    }

    pub fn toggle(&mut self, key: &InfoKey) -> Option<bool> {
        self.panel.toggle(key)
    }
}

/// Draws recorded content and its panel into `(0, 0, width, height)` of `canvas`.
///
/// Snapshots are not touched; the caller decides where the returned hit regions go.
pub fn draw_frame(
    canvas: &mut dyn Canvas,
    commands: &CommandBuffer,
    panel: &InfoPanel,
    style: &FrameStyle,
    width: f32,
    height: f32,
) -> FrameLayout {
    canvas.set_transform(Transform::identity());
    canvas.set_color(background());
    canvas.fill_rect(0.0, 0.0, width, height);
    canvas.set_render_hints(style.hints);

    let viewport = style.layout.content_viewport(width, height);
    if let Some(vp) = &viewport {
        let prior = canvas.transform();
        commands.replay(canvas, Some(vp.transform));
        canvas.set_transform(prior);
        canvas.set_render_hints(style.hints);
    }

    let mut out = FrameLayout {
        viewport,
        ..FrameLayout::default()
    };
    if style.layout.metrics.has_panel() {
        draw_panel(canvas, panel, &style.layout, width, &mut out);
    }
    out
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

fn draw_panel(
    canvas: &mut dyn Canvas,
    panel: &InfoPanel,
    layout: &Layout,
    width: f32,
    out: &mut FrameLayout,
) {
    let metrics = layout.metrics;
    let origin = layout.panel_origin(width);
    let column = origin.x + layout.label_column(panel, canvas.fonts());
    let line_height = metrics.line_height();

    canvas.set_stroke(StrokeStyle::round(1.0));
    canvas.set_color(Color::BLACK);
    let mut y = origin.y;
    for entry in panel.rows() {
        if let Some(entry) = entry {
            canvas.set_font(metrics.bold_font());
            let label_x = match entry.value {
                None => match entry.key.swatch_color() {
                    Some(color) => draw_swatch(canvas, color, column, y, metrics.glyph_width),
                    None => draw_aligned(canvas, &entry.key.to_string(), column, y, Align::Center),
                },
                Some(value) => {
                    let label_x = match entry.key.swatch_color() {
                        Some(color) => draw_swatch(canvas, color, column, y, metrics.glyph_width),
                        None => draw_aligned(
                            canvas,
                            &format!("{}: ", entry.key),
                            column,
                            y,
                            Align::Right,
                        ),
                    };
                    canvas.set_font(metrics.plain_font());
                    draw_aligned(canvas, value, column, y, Align::Left);
                    label_x
                }
            };
            let checkbox = entry.checked.map(|checked| {
                let rect = draw_checkbox(canvas, checked, label_x, y, metrics.glyph_width);
                out.hit_regions.insert(entry.key.clone(), rect);
                rect
            });
            out.rows.push(PanelRow {
                key: entry.key.clone(),
                top: y,
                label_x,
                checkbox,
            });
        }
        y += line_height;
    }
}

fn draw_aligned(canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, align: Align) -> f32 {
    let font = canvas.font();
    let width = canvas.text_width(font, text).trunc();
    let x = match align {
        Align::Left => x,
        Align::Center => x - (width / 2.0).trunc(),
        Align::Right => x - width,
    };
    let ascent = canvas.font_metrics(font).ascent;
    canvas.draw_string(text, x, y + ascent);
    x
}

/// Square glyph box one column left of `x`, sized by the current font.
fn glyph_box(canvas: &dyn Canvas, x: f32, y: f32, gap: f32) -> Rectangle {
    let metrics = canvas.font_metrics(canvas.font());
    let size = metrics.height() - metrics.descent;
    Rectangle::new_square(x - size - gap, y + (metrics.descent / 2.0).trunc(), size)
}

fn draw_swatch(canvas: &mut dyn Canvas, color: Color, x: f32, y: f32, gap: f32) -> f32 {
    let rect = glyph_box(canvas, x, y, gap);
    canvas.set_color(color);
    canvas.fill_rect(rect.x, rect.y, rect.width, rect.height);
    canvas.set_color(Color::BLACK);
    canvas.draw_rect(rect.x, rect.y, rect.width, rect.height);
    rect.x
}

fn draw_checkbox(canvas: &mut dyn Canvas, checked: bool, x: f32, y: f32, gap: f32) -> Rectangle {
    let rect = glyph_box(canvas, x, y, gap);
    canvas.set_color(Color::BLACK);
    canvas.draw_rect(rect.x, rect.y, rect.width, rect.height);
    if checked {
        canvas.draw_line(rect.x, rect.y, rect.right(), rect.bottom());
        canvas.draw_line(rect.x, rect.bottom(), rect.right(), rect.y);
    }
    rect
}
