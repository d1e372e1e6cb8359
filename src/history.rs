use std::sync::Arc;

use crate::canvas::Canvas;
use crate::command::CommandBuffer;
use crate::frame::{draw_frame, FrameLayout, FrameSnapshot, FrameStyle, HitRegions};
use crate::info::InfoPanel;

/// Playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Follows the newest frame.
    Latest,
    /// Held on a frame by a user scrub.
    Pinned(usize),
}

/// The drawable parts of the cursor frame, detached from the history so they can be
/// rasterized without holding the state lock.
#[derive(Debug, Clone)]
pub struct CursorFrame {
    pub index: usize,
    commands: Arc<CommandBuffer>,
    panel: InfoPanel,
}

impl CursorFrame {
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        style: &FrameStyle,
        width: f32,
        height: f32,
    ) -> FrameLayout {
        draw_frame(canvas, &self.commands, &self.panel, style, width, height)
    }
}

/// Append-only list of frames and the frame currently shown.
#[derive(Debug, Default)]
pub struct FrameHistory {
    frames: Vec<FrameSnapshot>,
    cursor: Option<Cursor>,
    pending: bool,
    /// Frame whose hit regions came from the most recent render.
    rendered: Option<usize>,
}

impl FrameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameSnapshot> {
        self.frames.get(index)
    }

    /// Appends a sealed frame. The cursor moves to it unless a scrub holds an older frame.
    pub fn append(&mut self, frame: FrameSnapshot) {
        let last = self.frames.len().checked_sub(1);
        self.frames.push(frame);
        self.cursor = match self.cursor {
            Some(Cursor::Pinned(i)) if Some(i) != last => Some(Cursor::Pinned(i)),
            _ => Some(Cursor::Latest),
        };
    }

    /// Clamps `index` into the recorded range. No effect while the history is empty.
    pub fn set_cursor(&mut self, index: i64) {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return;
        };
        let index = index.clamp(0, last as i64) as usize;
        self.cursor = Some(if index == last {
            Cursor::Latest
        } else {
            Cursor::Pinned(index)
        });
    }

    pub fn cursor(&self) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        match self.cursor {
            Some(Cursor::Pinned(i)) => Some(i.min(last)),
            _ => Some(last),
        }
    }

    pub fn cursor_state(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn current(&self) -> Option<&FrameSnapshot> {
        self.cursor().and_then(|i| self.frames.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut FrameSnapshot> {
        let i = self.cursor()?;
        self.frames.get_mut(i)
    }

    /// Marks that the host has produced a new logical frame that still has to be recorded.
    pub fn request_frame(&mut self) {
        self.pending = true;
    }

    /// Consumes the frame request, returning whether a frame has to be recorded now.
    /// An empty history always wants its first frame.
    pub fn take_pending(&mut self) -> bool {
        let due = self.pending || self.frames.is_empty();
        self.pending = false;
        due
    }

    pub fn cursor_frame(&self) -> Option<CursorFrame> {
        let index = self.cursor()?;
        let frame = self.frames.get(index)?;
        Some(CursorFrame {
            index,
            commands: Arc::clone(frame.commands()),
            panel: frame.panel().clone(),
        })
    }

    /// Keeps the hit regions of a finished render of frame `index`. Regions from any
    /// earlier render of another frame are dropped.
    pub fn store_hit_regions(&mut self, index: usize, regions: HitRegions) {
        if let Some(prev) = self.rendered.filter(|prev| *prev != index) {
            if let Some(frame) = self.frames.get_mut(prev) {
                frame.set_hit_regions(HitRegions::default());
            }
        }
        if let Some(frame) = self.frames.get_mut(index) {
            frame.set_hit_regions(regions);
            self.rendered = Some(index);
        }
    }

    /// Hit regions of the cursor frame, only while it is the frame last rendered.
    pub fn hit_regions(&self) -> Option<&HitRegions> {
        let index = self.cursor().filter(|i| self.rendered == Some(*i))?;
        self.frames.get(index).map(FrameSnapshot::hit_regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixmapSurface;
    use crate::command::Recorder;
    use crate::config::VisConfig;
    use crate::text::FontSet;
    use crate::utils::Rectangle;
    use tiny_skia::Color;

    fn frame() -> FrameSnapshot {
        FrameSnapshot::new(Recorder::new(FontSet::fallback()).finish(), InfoPanel::new())
    }

    fn frame_with(rects: usize) -> FrameSnapshot {
        let mut rec = Recorder::new(FontSet::fallback());
        rec.set_color(Color::BLACK);
        for i in 0..rects {
            rec.fill_rect(i as f32, 0.0, 1.0, 1.0);
        }
        FrameSnapshot::new(rec.finish(), InfoPanel::new())
    }

    fn history(n: usize) -> FrameHistory {
        let mut h = FrameHistory::new();
        for _ in 0..n {
            h.append(frame());
        }
        h
    }

    fn regions(x: f32) -> HitRegions {
        let mut regions = HitRegions::default();
        regions.insert("Grid".into(), Rectangle::new(x, 0.0, 10.0, 10.0));
        regions
    }

    #[test]
    fn empty_history_has_no_cursor() {
        let mut h = FrameHistory::new();
        h.set_cursor(3);
        assert_eq!(h.cursor(), None);
        assert!(h.cursor_frame().is_none());
        assert!(h.take_pending());
    }

    #[test]
    fn cursor_tracks_latest() {
        let mut h = history(3);
        assert_eq!(h.cursor(), Some(2));
        h.append(frame());
        assert_eq!(h.cursor(), Some(3));
    }

    #[test]
    fn cursor_is_clamped() {
        let mut h = history(4);
        h.set_cursor(-5);
        assert_eq!(h.cursor(), Some(0));
        h.set_cursor(9);
        assert_eq!(h.cursor(), Some(3));
    }

    #[test]
    fn scrub_survives_new_frames() {
        let mut h = history(5);
        h.set_cursor(1);
        h.append(frame());
        h.append(frame());
        assert_eq!(h.cursor(), Some(1));
        assert_eq!(h.cursor_state(), Some(Cursor::Pinned(1)));
    }

    #[test]
    fn scrub_to_end_follows_again() {
        let mut h = history(3);
        h.set_cursor(2);
        h.append(frame());
        assert_eq!(h.cursor(), Some(3));
    }

    #[test]
    fn appends_leave_earlier_frames_untouched() {
        let mut h = FrameHistory::new();
        for n in 1..=3 {
            h.append(frame_with(n));
        }
        let before: Vec<_> = (0..3)
            .map(|i| {
                let f = h.get(i).unwrap();
                (f.id(), f.commands().len(), Arc::clone(f.commands()))
            })
            .collect();
        for n in 4..=6 {
            h.append(frame_with(n));
        }
        assert_eq!(h.len(), 6);
        for (i, (id, len, commands)) in before.iter().enumerate() {
            let f = h.get(i).unwrap();
            assert_eq!(f.id(), *id);
            assert_eq!(f.commands().len(), *len);
            assert!(Arc::ptr_eq(f.commands(), commands));
        }
        let ids: std::collections::HashSet<_> = (0..6).map(|i| h.get(i).unwrap().id()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn request_survives_an_append() {
        let mut h = history(1);
        assert!(!h.take_pending());
        h.request_frame();
        h.append(frame());
        assert!(h.take_pending());
        assert!(!h.take_pending());
    }

    #[test]
    fn hit_regions_belong_to_the_last_render() {
        let mut h = history(2);
        h.store_hit_regions(1, regions(5.0));
        assert_eq!(h.hit_regions().map(HitRegions::len), Some(1));

        h.set_cursor(0);
        assert!(h.hit_regions().is_none());

        h.store_hit_regions(0, regions(50.0));
        assert!(h.get(1).unwrap().hit_regions().is_empty());
        let rect = h.hit_regions().and_then(|r| r.get(&"Grid".into()));
        assert_eq!(rect.map(|r| r.x), Some(50.0));
    }

    #[test]
    fn cursor_frame_renders_detached() {
        let fonts = FontSet::fallback();
        let style = FrameStyle::from_config(&VisConfig::default(), &fonts);
        let mut h = FrameHistory::new();
        h.append(frame_with(2));
        let detached = h.cursor_frame().unwrap();
        h.append(frame());
        assert_eq!(detached.index, 0);
        let mut canvas = PixmapSurface::new(64, 64, fonts).unwrap();
        let out = detached.render(&mut canvas, &style, 64.0, 64.0);
        assert!(out.viewport.is_some());
    }
}
