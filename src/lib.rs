pub mod canvas;
pub mod command;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod history;
pub mod info;
pub mod input;
pub mod layout;
pub mod state;
pub mod text;
pub mod traits;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tiny_skia::Pixmap;

use canvas::PixmapSurface;
use command::Recorder;
use config::VisConfig;
use error::Result;
use export::SnapshotExporter;
use frame::{FrameLayout, FrameSnapshot, FrameStyle};
use info::{InfoKey, InfoPanel};
use input::{Dispatch, InteractionRouter, PointerEvent};
use state::{lock, SharedState};
use text::FontSet;
use traits::VisHost;
use utils::Size;

pub use canvas::Canvas;
pub use error::VisError;

/// Output of one `VisEngine::render` call.
#[derive(Debug)]
pub struct RenderedFrame {
    pub pixmap: Pixmap,
    pub layout: FrameLayout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub count: u64,
    pub total: Duration,
}

impl PaintStats {
    pub fn average(&self) -> Option<Duration> {
        let count = u32::try_from(self.count).ok().filter(|c| *c > 0)?;
        Some(self.total / count)
    }
}

/// Cloneable access to the info panel and frame requests, usable from any thread.
#[derive(Clone)]
pub struct VisHandle {
    state: SharedState,
    enabled: bool,
}

impl VisHandle {
    fn with_panel(&self, f: impl FnOnce(&mut InfoPanel)) {
        if self.enabled {
            f(&mut lock(&self.state).panel);
        }
    }

    pub fn add_info(&self, key: impl Into<InfoKey>, value: impl std::fmt::Display) {
        self.with_panel(|panel| panel.add(key, value));
    }

    pub fn add_info_flag(&self, key: impl Into<InfoKey>) {
        self.with_panel(|panel| panel.add_flag(key));
    }

    pub fn add_info_checked(
        &self,
        key: impl Into<InfoKey>,
        value: impl std::fmt::Display,
        checked: bool,
    ) {
        self.with_panel(|panel| panel.add_checked(key, value, checked));
    }

    pub fn add_info_check(&self, key: impl Into<InfoKey>, checked: bool) {
        self.with_panel(|panel| panel.add_check(key, checked));
    }

    pub fn add_info_break(&self) {
        self.with_panel(InfoPanel::add_break);
    }

    /// Checked state from the entries being collected, else from the displayed frame.
    pub fn is_info_checked(&self, key: impl Into<InfoKey>) -> bool {
        if !self.enabled {
            return false;
        }
        let key = key.into();
        let state = lock(&self.state);
        state
            .panel
            .checked(&key)
            .or_else(|| state.history.current().and_then(|f| f.panel().checked(&key)))
            .unwrap_or(false)
    }

    pub fn request_frame(&self) {
        if self.enabled {
            lock(&self.state).history.request_frame();
        }
    }
}

/// Records host frames, keeps them for playback and draws them with the info panel.
pub struct VisEngine {
    config: VisConfig,
    fonts: FontSet,
    style: FrameStyle,
    state: SharedState,
    host: Arc<dyn VisHost>,
    router: InteractionRouter,
    exporter: Option<SnapshotExporter>,
    last_size: Option<(u32, u32)>,
    stats: PaintStats,
}

impl VisEngine {
    pub fn new(config: VisConfig, fonts: FontSet, host: impl VisHost) -> Self {
        Self::with_host(config, fonts, Arc::new(host))
    }

    pub fn with_host(config: VisConfig, fonts: FontSet, host: Arc<dyn VisHost>) -> Self {
        let state = state::shared();
        let style = FrameStyle::from_config(&config, &fonts);
        let exporter = SnapshotExporter::from_config(&config);
        log::debug!(
            "visualization {} (panel {}x{}, export {})",
            if config.enabled { "enabled" } else { "disabled" },
            config.info_columns,
            config.info_lines,
            exporter.is_some()
        );
        Self {
            router: InteractionRouter::new(Arc::clone(&state), Arc::clone(&host)),
            config,
            fonts,
            style,
            state,
            host,
            exporter,
            last_size: None,
            stats: PaintStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn handle(&self) -> VisHandle {
        VisHandle {
            state: Arc::clone(&self.state),
            enabled: self.config.enabled,
        }
    }

    /// Ends the current logical frame: exports what is on screen if saving is configured,
    /// then asks the next render to record a new frame. Returns the written file, if any.
    pub fn update(&mut self) -> Option<PathBuf> {
        if !self.config.enabled {
            return None;
        }
        let exported = match (self.exporter.is_some(), self.last_size) {
            (true, Some((width, height))) => match self.draw_current(width, height) {
                Ok(Some(pixmap)) => self
                    .exporter
                    .as_mut()
                    .and_then(|e| e.maybe_export(&pixmap, self.config.seed)),
                Ok(None) => None,
                Err(e) => {
                    log::warn!("cannot rasterize frame for export: {e}");
                    None
                }
            },
            _ => None,
        };
        lock(&self.state).history.request_frame();
        exported
    }

    /// Renders the frame under the cursor into a new `width` x `height` pixmap, recording a
    /// frame from the host first when one is due.
    pub fn render(&mut self, width: u32, height: u32) -> Result<Option<RenderedFrame>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let start = Instant::now();
        let mut surface = PixmapSurface::new(width, height, self.fonts.clone())?;
        let due = lock(&self.state).history.take_pending();
        if due {
            if let Err(e) = self.record_frame() {
                lock(&self.state).history.request_frame();
                return Err(e);
            }
        }

        let Some(frame) = lock(&self.state).history.cursor_frame() else {
            return Ok(None);
        };
        let layout = frame.render(&mut surface, &self.style, width as f32, height as f32);
        {
            let mut state = lock(&self.state);
            state.viewport = layout.viewport;
            state
                .history
                .store_hit_regions(frame.index, layout.hit_regions.clone());
        }

        self.last_size = Some((width, height));
        self.stats.count += 1;
        self.stats.total += start.elapsed();
        Ok(Some(RenderedFrame {
            pixmap: surface.into_pixmap(),
            layout,
        }))
    }

    pub fn dispatch(&self, event: PointerEvent) -> Dispatch {
        if !self.config.enabled {
            return Dispatch::Ignored;
        }
        self.router.dispatch(event)
    }

    pub fn set_cursor(&self, index: i64) {
        if self.config.enabled {
            lock(&self.state).history.set_cursor(index);
        }
    }

    pub fn history_len(&self) -> usize {
        lock(&self.state).history.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        lock(&self.state).history.cursor()
    }

    /// Window size for the configured content scale, or the largest one fitting `available`.
    pub fn preferred_window_size(&self, available: Size) -> Size {
        let layout = &self.style.layout;
        let scale = self
            .config
            .content_scale
            .unwrap_or_else(|| layout.fit_scale(available));
        layout.preferred_size(scale.max(0.0))
    }

    pub fn paint_stats(&self) -> PaintStats {
        self.stats
    }

    /// Reports paint statistics when configured to.
    pub fn finish(&self) -> PaintStats {
        if self.config.paint_info {
            if let Some(avg) = self.stats.average() {
                log::info!("paint count: {}", self.stats.count);
                log::info!("paint avg. time: {} ms", avg.as_millis());
            }
        }
        self.stats
    }

    fn record_frame(&self) -> Result<()> {
        let mut recorder = Recorder::new(self.fonts.clone());
        self.host.paint_content(&mut recorder)?;
        let commands = recorder.finish();
        let mut state = lock(&self.state);
        let panel = std::mem::take(&mut state.panel);
        let frame = FrameSnapshot::new(commands, panel);
        log::debug!(
            "recorded frame {} as #{} ({} commands, {} panel rows)",
            frame.id(),
            state.history.len(),
            frame.commands().len(),
            frame.panel().len()
        );
        state.history.append(frame);
        Ok(())
    }

    /// Rasterizes the displayed frame without touching its hit regions.
    fn draw_current(&self, width: u32, height: u32) -> Result<Option<Pixmap>> {
        let Some(frame) = lock(&self.state).history.cursor_frame() else {
            return Ok(None);
        };
        let mut surface = PixmapSurface::new(width, height, self.fonts.clone())?;
        frame.render(&mut surface, &self.style, width as f32, height as f32);
        Ok(Some(surface.into_pixmap()))
    }
}
