use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use replay_vis::config::VisConfig;
use replay_vis::error::Result;
use replay_vis::export::SnapshotExporter;
use replay_vis::text::FontSet;
use replay_vis::traits::VisHost;
use replay_vis::{Canvas, VisEngine};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

fn filled(width: u32, height: u32) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).unwrap();
    pixmap.fill(Color::from_rgba8(230, 230, 232, 255));
    pixmap
}

fn red() -> PremultipliedColorU8 {
    PremultipliedColorU8::from_rgba(255, 0, 0, 255).unwrap()
}

#[test]
fn first_frame_is_always_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = SnapshotExporter::new(dir.path().join("nested/out"));
    let path = exporter.maybe_export(&filled(8, 8), 42).unwrap();
    assert_eq!(path.file_name().unwrap(), "42-00001.png");
    assert!(path.exists());
    assert_eq!(exporter.exported(), 1);
}

#[test]
fn unsampled_difference_is_not_exported() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = SnapshotExporter::new(dir.path());
    // 64 * 64 = 4096 pixels, sampled every 16th
    let base = filled(64, 64);
    assert!(exporter.maybe_export(&base, 7).is_some());

    let mut unsampled = base.clone();
    unsampled.pixels_mut()[1] = red();
    assert!(exporter.maybe_export(&unsampled, 7).is_none());

    let mut sampled = base.clone();
    sampled.pixels_mut()[16] = red();
    let path = exporter.maybe_export(&sampled, 7).unwrap();
    assert_eq!(path.file_name().unwrap(), "7-00002.png");
}

#[test]
fn size_change_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = SnapshotExporter::new(dir.path());
    exporter.maybe_export(&filled(8, 8), 1).unwrap();
    assert!(exporter.maybe_export(&filled(8, 9), 1).is_some());
    assert_eq!(exporter.exported(), 2);
}

#[test]
fn write_failure_keeps_the_run_going() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let mut exporter = SnapshotExporter::new(blocker.join("out"));
    assert!(exporter.maybe_export(&filled(4, 4), 1).is_none());
    assert_eq!(exporter.exported(), 0);
}

struct Shade(AtomicU8);

impl VisHost for Shade {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> Result<()> {
        let v = self.0.load(Ordering::SeqCst);
        canvas.set_color(Color::from_rgba8(v, v, v, 255));
        canvas.fill_rect(0.0, 0.0, 100.0, 100.0);
        Ok(())
    }
}

#[test]
fn engine_exports_only_visible_changes() {
    let dir = tempfile::tempdir().unwrap();
    let config = VisConfig {
        seed: 5,
        ..VisConfig::default()
    }
    .with_save_dir(dir.path());
    let host = Arc::new(Shade(AtomicU8::new(0)));
    let mut engine = VisEngine::with_host(config, FontSet::fallback(), host.clone());

    // nothing rendered yet
    assert!(engine.update().is_none());

    engine.render(200, 200).unwrap();
    let first = engine.update().unwrap();
    assert_eq!(first.file_name().unwrap(), "5-00001.png");

    // same content again
    engine.render(200, 200).unwrap();
    assert!(engine.update().is_none());

    host.0.store(200, Ordering::SeqCst);
    engine.render(200, 200).unwrap();
    let second = engine.update().unwrap();
    assert_eq!(second.file_name().unwrap(), "5-00002.png");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
