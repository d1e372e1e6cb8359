use std::fs;
use std::path::Path;
use std::sync::Mutex;

use image::ImageReader;
use replay_vis::canvas::StrokeStyle;
use replay_vis::config::VisConfig;
use replay_vis::export::to_rgba_image;
use replay_vis::info::InfoKey;
use replay_vis::input::{ContentClick, MouseButton, PointerEvent};
use replay_vis::text::FontSet;
use replay_vis::traits::VisHost;
use replay_vis::{Canvas, VisEngine};
use tiny_skia::Color;

const GRID: i32 = 20;
const STEPS: usize = 12;
const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// A walker crossing a grid, optionally leaving a trail.
struct Walker {
    path: Mutex<Vec<(i32, i32)>>,
    trail: Mutex<bool>,
}

impl Walker {
    fn new() -> Self {
        Self {
            path: Mutex::new(vec![(0, 0)]),
            trail: Mutex::new(true),
        }
    }

    fn step(&self, i: usize) -> (i32, i32) {
        let mut path = self.path.lock().unwrap_or_else(|e| e.into_inner());
        let (x, y) = path.last().copied().unwrap_or((0, 0));
        let next = if i % 3 == 2 {
            (x, (y + 1).min(GRID - 1))
        } else {
            ((x + 1).min(GRID - 1), y)
        };
        path.push(next);
        next
    }

    fn trail(&self) -> bool {
        *self.trail.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl VisHost for Walker {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> replay_vis::error::Result<()> {
        canvas.set_color(Color::WHITE);
        canvas.fill_rect(0.0, 0.0, GRID as f32, GRID as f32);
        canvas.set_stroke(StrokeStyle::new(0.05));
        canvas.set_color(Color::from_rgba8(200, 200, 200, 255));
        for i in 0..=GRID {
            let v = i as f32;
            canvas.draw_line(v, 0.0, v, GRID as f32);
            canvas.draw_line(0.0, v, GRID as f32, v);
        }
        let path = self.path.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if self.trail() {
            canvas.set_color(Color::from_rgba8(120, 160, 255, 255));
            for &(x, y) in &path[..path.len().saturating_sub(1)] {
                canvas.fill_rect(x as f32 + 0.2, y as f32 + 0.2, 0.6, 0.6);
            }
        }
        if let Some(&(x, y)) = path.last() {
            canvas.set_color(Color::from_rgba8(220, 40, 40, 255));
            canvas.fill_rect(x as f32, y as f32, 1.0, 1.0);
        }
        Ok(())
    }

    fn content_clicked(&self, click: ContentClick) {
        println!(
            "clicked cell ({}, {}) with {:?}",
            click.x.floor(),
            click.y.floor(),
            click.button
        );
    }

    fn check_changed(&self, key: &InfoKey, checked: bool) {
        if *key == InfoKey::from("Trail") {
            *self.trail.lock().unwrap_or_else(|e| e.into_inner()) = checked;
        }
    }
}

fn compare_with_tolerance(a_path: &Path, b_path: &Path, tolerance: u8) -> anyhow::Result<bool> {
    let a = ImageReader::open(a_path)?.decode()?.to_rgba8();
    let b = ImageReader::open(b_path)?.decode()?.to_rgba8();
    if a.dimensions() != b.dimensions() {
        return Ok(false);
    }
    Ok(a.pixels().zip(b.pixels()).all(|(pa, pb)| {
        pa.0.iter()
            .zip(pb.0.iter())
            .all(|(x, y)| x.abs_diff(*y) <= tolerance)
    }))
}

fn load_config() -> anyhow::Result<VisConfig> {
    Ok(match std::env::args().nth(1) {
        Some(path) => VisConfig::from_path(path)?,
        None => VisConfig::default()
            .with_content_rect(0.0, 0.0, GRID as f32, GRID as f32)
            .with_info_dimensions(16, 6)
            .with_save_dir("snapshots/frames"),
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = load_config()?;
    let walker = std::sync::Arc::new(Walker::new());
    let mut engine = VisEngine::with_host(config, FontSet::system(), walker.clone());
    let handle = engine.handle();

    for i in 0..STEPS {
        let (x, y) = walker.step(i);
        handle.add_info("Step", i + 1);
        handle.add_info("Position", format!("{x},{y}"));
        handle.add_info_break();
        handle.add_info_check("Trail", walker.trail());
        handle.add_info(Color::from_rgba8(220, 40, 40, 255), "Walker");
        engine.render(WIDTH, HEIGHT)?;
        if let Some(path) = engine.update() {
            println!("saved {}", path.display());
        }
    }

    // Toggle the trail through its checkbox, then click into the grid.
    let Some(frame) = engine.render(WIDTH, HEIGHT)? else {
        println!("visualization disabled");
        return Ok(());
    };
    if let Some(rect) = frame.layout.hit_regions.get(&"Trail".into()) {
        let outcome = engine.dispatch(PointerEvent::press(
            rect.x + rect.width / 2.0,
            rect.y + rect.height / 2.0,
            MouseButton::Left,
        ));
        println!("checkbox press: {outcome:?}");
    }
    if let Some(vp) = frame.layout.viewport {
        let centre = vp.screen.pos();
        engine.dispatch(PointerEvent::press(
            centre.x + vp.screen.width / 2.0,
            centre.y + vp.screen.height / 2.0,
            MouseButton::Left,
        ));
    }

    // Scrub back to the first frame and keep it as a snapshot.
    engine.set_cursor(0);
    let Some(first) = engine.render(WIDTH, HEIGHT)? else {
        return Ok(());
    };
    fs::create_dir_all("snapshots/actual")?;
    fs::create_dir_all("snapshots/golden")?;
    let out_actual = Path::new("snapshots/actual/first_frame.png");
    let out_golden = Path::new("snapshots/golden/first_frame.png");
    to_rgba_image(&first.pixmap)?.save(out_actual)?;

    if !out_golden.exists() {
        fs::copy(out_actual, out_golden)?;
        println!("golden created at {}", out_golden.display());
    } else if compare_with_tolerance(out_actual, out_golden, 3)? {
        println!("snapshot OK for first_frame.png");
    } else {
        println!("snapshot mismatch for first_frame.png");
    }

    println!(
        "{} frames recorded, cursor at {:?}",
        engine.history_len(),
        engine.cursor()
    );
    engine.finish();
    Ok(())
}
