//! Deferred drawing: a recording pass captures `Command`s, the sealed buffer replays them
//! against any `Canvas` under any base transform.

use tiny_skia::{Color, Transform};

use crate::canvas::{Canvas, RenderHints, SharedImage, StrokeStyle};
use crate::text::{FontSet, FontSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DrawLine {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    DrawRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    DrawImage {
        image: SharedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    DrawString {
        text: String,
        x: f32,
        y: f32,
    },
    SetColor(Color),
    SetStroke(StrokeStyle),
    SetFont(FontSpec),
    SetRenderHints(RenderHints),
    SetTransform(Transform),
}

/// Collects commands during the single pass that paints one frame.
pub struct Recorder {
    commands: Vec<Command>,
    fonts: FontSet,
    initial_transform: Transform,
    transform: Transform,
    font: FontSpec,
}

impl Recorder {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            commands: Vec::new(),
            fonts,
            initial_transform: Transform::identity(),
            transform: Transform::identity(),
            font: FontSpec::default(),
        }
    }

    /// Base transform used when the sealed buffer is replayed without an explicit one.
    pub fn with_initial_transform(mut self, transform: Transform) -> Self {
        self.initial_transform = transform;
        self
    }

    pub fn record(&mut self, command: Command) {
        match &command {
            Command::SetTransform(t) => self.transform = *t,
            Command::SetFont(f) => self.font = *f,
            _ => {}
        }
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Seals the recording. The returned buffer has no mutating methods.
    pub fn finish(self) -> CommandBuffer {
        CommandBuffer {
            commands: self.commands,
            initial_transform: self.initial_transform,
        }
    }
}

impl Canvas for Recorder {
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.record(Command::DrawLine { x1, y1, x2, y2 });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.record(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.record(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_image(&mut self, image: &SharedImage, x: f32, y: f32, width: f32, height: f32) {
        self.record(Command::DrawImage {
            image: image.clone(),
            x,
            y,
            width,
            height,
        });
    }

    fn draw_string(&mut self, text: &str, x: f32, y: f32) {
        self.record(Command::DrawString {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn set_color(&mut self, color: Color) {
        self.record(Command::SetColor(color));
    }

    fn set_stroke(&mut self, stroke: StrokeStyle) {
        self.record(Command::SetStroke(stroke));
    }

    fn set_font(&mut self, font: FontSpec) {
        self.record(Command::SetFont(font));
    }

    fn set_render_hints(&mut self, hints: RenderHints) {
        self.record(Command::SetRenderHints(hints));
    }

    fn set_transform(&mut self, transform: Transform) {
        self.record(Command::SetTransform(transform));
    }

    /// The content-space transform last set by the recording pass.
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

/// A sealed, read-only command sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    initial_transform: Transform,
}

impl CommandBuffer {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sets `transform` (or the recorded default) on `canvas` and executes every command in
    /// order. Recorded transforms are applied on top of that base.
    pub fn replay(&self, canvas: &mut dyn Canvas, transform: Option<Transform>) {
        let base = transform.unwrap_or(self.initial_transform);
        canvas.set_transform(base);
        for command in &self.commands {
            match command {
                Command::DrawLine { x1, y1, x2, y2 } => canvas.draw_line(*x1, *y1, *x2, *y2),
                Command::FillRect {
                    x,
                    y,
                    width,
                    height,
                } => canvas.fill_rect(*x, *y, *width, *height),
                Command::DrawRect {
                    x,
                    y,
                    width,
                    height,
                } => canvas.draw_rect(*x, *y, *width, *height),
                Command::DrawImage {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => canvas.draw_image(image, *x, *y, *width, *height),
                Command::DrawString { text, x, y } => canvas.draw_string(text, *x, *y),
                Command::SetColor(color) => canvas.set_color(*color),
                Command::SetStroke(stroke) => canvas.set_stroke(*stroke),
                Command::SetFont(font) => canvas.set_font(*font),
                Command::SetRenderHints(hints) => canvas.set_render_hints(*hints),
                Command::SetTransform(t) => canvas.set_transform(base.pre_concat(*t)),
            }
        }
    }
}
