use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use replay_vis::config::VisConfig;
use replay_vis::error::Result;
use replay_vis::info::InfoKey;
use replay_vis::input::{ContentClick, Dispatch, MouseButton, PointerEvent};
use replay_vis::text::FontSet;
use replay_vis::traits::VisHost;
use replay_vis::utils::Size;
use replay_vis::{Canvas, VisEngine, VisError, VisHandle};
use tiny_skia::Color;

struct TestHost {
    paints: AtomicUsize,
    unsupported: bool,
    clicks: Mutex<Sender<ContentClick>>,
    checks: Mutex<Sender<(InfoKey, bool)>>,
}

impl VisHost for TestHost {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> Result<()> {
        let n = self.paints.fetch_add(1, Ordering::SeqCst);
        canvas.set_color(Color::from_rgba8((n * 40 % 256) as u8, 80, 160, 255));
        canvas.fill_rect(0.0, 0.0, 100.0, 100.0);
        if self.unsupported {
            canvas.fill_oval(10.0, 10.0, 20.0, 20.0)?;
        }
        Ok(())
    }

    fn content_clicked(&self, click: ContentClick) {
        let _ = self.clicks.lock().unwrap().send(click);
    }

    fn check_changed(&self, key: &InfoKey, checked: bool) {
        let _ = self.checks.lock().unwrap().send((key.clone(), checked));
    }
}

struct Fixture {
    engine: VisEngine,
    host: Arc<TestHost>,
    clicks: Receiver<ContentClick>,
    checks: Receiver<(InfoKey, bool)>,
}

fn fixture(config: VisConfig, unsupported: bool) -> Fixture {
    let (click_tx, clicks) = channel();
    let (check_tx, checks) = channel();
    let host = Arc::new(TestHost {
        paints: AtomicUsize::new(0),
        unsupported,
        clicks: Mutex::new(click_tx),
        checks: Mutex::new(check_tx),
    });
    let engine = VisEngine::with_host(config, FontSet::fallback(), host.clone());
    Fixture {
        engine,
        host,
        clicks,
        checks,
    }
}

fn panel_config() -> VisConfig {
    VisConfig::default().with_info_dimensions(10, 4)
}

#[test]
fn two_rows_with_a_clickable_checkbox() {
    let mut f = fixture(panel_config(), false);
    let handle = f.engine.handle();
    handle.add_info("Score", 42);
    handle.add_info_check("Done", true);
    let frame = f.engine.render(500, 400).unwrap().unwrap();
    assert_eq!(frame.layout.rows.len(), 2);
    assert_eq!(frame.layout.rows[1].key, InfoKey::from("Done"));
    let rect = frame.layout.hit_regions.get(&"Done".into()).unwrap();
    assert!(!rect.is_empty());
    assert!(frame.layout.hit_regions.get(&"Score".into()).is_none());
}

#[test]
fn host_paints_once_per_frame() {
    let mut f = fixture(VisConfig::default(), false);
    for _ in 0..3 {
        f.engine.render(200, 200).unwrap();
    }
    assert_eq!(f.host.paints.load(Ordering::SeqCst), 1);
    f.engine.update();
    f.engine.render(200, 200).unwrap();
    f.engine.render(300, 100).unwrap();
    assert_eq!(f.host.paints.load(Ordering::SeqCst), 2);
    assert_eq!(f.engine.history_len(), 2);
}

#[test]
fn content_click_reaches_host_in_content_units() {
    let mut f = fixture(VisConfig::default(), false);
    let frame = f.engine.render(400, 300).unwrap().unwrap();
    let vp = frame.layout.viewport.unwrap();
    // border 13: area (13, 13, 374, 274), square content centered horizontally
    assert_eq!(vp.screen.x, 63.0);
    assert_eq!(vp.screen.width, 274.0);

    let out = f
        .engine
        .dispatch(PointerEvent::press(63.0 + 137.0, 13.0 + 137.0, MouseButton::Right));
    assert!(matches!(out, Dispatch::Content(_)));
    let click = f.clicks.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!((click.x - 50.0).abs() < 1e-3);
    assert!((click.y - 50.0).abs() < 1e-3);
    assert_eq!(click.button, MouseButton::Right);
}

#[test]
fn checkbox_press_toggles_and_notifies() {
    let mut f = fixture(panel_config(), false);
    let handle = f.engine.handle();
    handle.add_info_checked("Grid", "on", false);
    let frame = f.engine.render(500, 400).unwrap().unwrap();
    let rect = frame.layout.hit_regions.get(&"Grid".into()).unwrap();

    let out = f.engine.dispatch(PointerEvent::press(
        rect.x + 1.0,
        rect.y + 1.0,
        MouseButton::Left,
    ));
    assert_eq!(
        out,
        Dispatch::Toggled {
            key: "Grid".into(),
            checked: true
        }
    );
    let (key, checked) = f.checks.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(key, InfoKey::from("Grid"));
    assert!(checked);
    assert!(handle.is_info_checked("Grid"));
}

#[test]
fn press_outside_everything_is_ignored() {
    let mut f = fixture(panel_config(), false);
    f.engine.handle().add_info_check("Grid", false);
    f.engine.render(500, 400).unwrap();
    let out = f
        .engine
        .dispatch(PointerEvent::press(1.0, 1.0, MouseButton::Left));
    assert_eq!(out, Dispatch::Ignored);
    assert!(f.checks.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn scrubbed_cursor_survives_new_frames() {
    let mut f = fixture(VisConfig::default(), false);
    for _ in 0..4 {
        f.engine.render(100, 100).unwrap();
        f.engine.update();
    }
    f.engine.render(100, 100).unwrap();
    assert_eq!(f.engine.history_len(), 5);
    f.engine.set_cursor(1);
    f.engine.update();
    f.engine.render(100, 100).unwrap();
    assert_eq!(f.engine.history_len(), 6);
    assert_eq!(f.engine.cursor(), Some(1));
    f.engine.set_cursor(100);
    assert_eq!(f.engine.cursor(), Some(5));
}

#[test]
fn unsupported_primitive_fails_the_render() {
    let mut f = fixture(VisConfig::default(), true);
    let err = f.engine.render(100, 100).unwrap_err();
    assert!(matches!(err, VisError::UnsupportedOperation("fill-oval")));
    assert_eq!(f.engine.history_len(), 0);
}

#[test]
fn disabled_engine_does_nothing() {
    let config = VisConfig {
        enabled: false,
        ..panel_config()
    };
    let mut f = fixture(config, false);
    let handle = f.engine.handle();
    handle.add_info_check("Grid", true);
    assert!(f.engine.render(100, 100).unwrap().is_none());
    assert!(f.engine.update().is_none());
    assert_eq!(
        f.engine.dispatch(PointerEvent::press(50.0, 50.0, MouseButton::Left)),
        Dispatch::Ignored
    );
    assert!(!handle.is_info_checked("Grid"));
    assert_eq!(f.host.paints.load(Ordering::SeqCst), 0);
    assert_eq!(f.engine.paint_stats().count, 0);
}

#[test]
fn paint_stats_count_renders() {
    let mut f = fixture(VisConfig::default(), false);
    f.engine.render(50, 50).unwrap();
    f.engine.render(50, 50).unwrap();
    let stats = f.engine.finish();
    assert_eq!(stats.count, 2);
    assert!(stats.average().is_some());
}

#[test]
fn preferred_size_uses_configured_scale() {
    let config = VisConfig {
        content_scale: Some(2.0),
        ..VisConfig::default()
    };
    let f = fixture(config, false);
    let size = f.engine.preferred_window_size(Size::new(1000.0, 800.0));
    // 2 * border 13 + 100 * 2
    assert_eq!(size, Size::new(226.0, 226.0));
}

/// Asks for the next frame while the current one is being painted.
struct EagerHost {
    handle: Mutex<Option<VisHandle>>,
    paints: AtomicUsize,
}

impl VisHost for EagerHost {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> Result<()> {
        if self.paints.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(handle) = self.handle.lock().unwrap().as_ref() {
                handle.request_frame();
            }
        }
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0);
        Ok(())
    }
}

#[test]
fn request_made_while_painting_is_kept() {
    let host = Arc::new(EagerHost {
        handle: Mutex::new(None),
        paints: AtomicUsize::new(0),
    });
    let mut engine = VisEngine::with_host(VisConfig::default(), FontSet::fallback(), host.clone());
    *host.handle.lock().unwrap() = Some(engine.handle());

    engine.render(100, 100).unwrap();
    assert_eq!(engine.history_len(), 1);
    engine.render(100, 100).unwrap();
    assert_eq!(engine.history_len(), 2);
    engine.render(100, 100).unwrap();
    assert_eq!(engine.history_len(), 2);
    assert_eq!(host.paints.load(Ordering::SeqCst), 2);
}

/// Fails its paint while `broken` is set.
struct FlakyHost {
    broken: AtomicBool,
}

impl VisHost for FlakyHost {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            canvas.draw_arc([0.0, 0.0, 10.0, 10.0], 0.0, 90.0)?;
        }
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0);
        Ok(())
    }
}

#[test]
fn failed_paint_keeps_the_request() {
    let host = Arc::new(FlakyHost {
        broken: AtomicBool::new(false),
    });
    let mut engine = VisEngine::with_host(VisConfig::default(), FontSet::fallback(), host.clone());
    engine.render(100, 100).unwrap();
    engine.update();

    host.broken.store(true, Ordering::SeqCst);
    assert!(engine.render(100, 100).is_err());
    assert_eq!(engine.history_len(), 1);

    host.broken.store(false, Ordering::SeqCst);
    engine.render(100, 100).unwrap();
    assert_eq!(engine.history_len(), 2);
}

#[test]
fn scrubbing_waits_for_a_render_before_hit_testing() {
    let mut f = fixture(panel_config(), false);
    let handle = f.engine.handle();
    handle.add_info_check("Grid", false);
    f.engine.render(500, 400).unwrap();
    f.engine.update();
    handle.add_info_check("Grid", false);
    let frame = f.engine.render(500, 400).unwrap().unwrap();
    let rect = frame.layout.hit_regions.get(&"Grid".into()).unwrap();
    let press = PointerEvent::press(rect.x + 1.0, rect.y + 1.0, MouseButton::Left);

    f.engine.set_cursor(0);
    assert_eq!(f.engine.dispatch(press), Dispatch::Ignored);

    f.engine.render(500, 400).unwrap();
    assert_eq!(
        f.engine.dispatch(press),
        Dispatch::Toggled {
            key: "Grid".into(),
            checked: true
        }
    );
}
