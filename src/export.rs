use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tiny_skia::Pixmap;

use crate::config::VisConfig;
use crate::error::{Result, VisError};

/// Number of pixels compared against the previous export.
pub const SAMPLE_COUNT: usize = 256;

/// Evenly strided offsets into a flattened buffer of `len` pixels.
pub fn sample_offsets(len: usize) -> impl Iterator<Item = usize> {
    let count = len.min(SAMPLE_COUNT);
    (0..count).map(move |k| if len <= SAMPLE_COUNT { k } else { k * len / SAMPLE_COUNT })
}

/// `<seed>-<sequence>.png`, the sequence zero-padded to five digits.
pub fn file_name(seed: u64, sequence: u32) -> String {
    format!("{seed}-{sequence:05}.png")
}

/// Writes rendered frames to disk, skipping ones that look the same as the last write.
#[derive(Debug)]
pub struct SnapshotExporter {
    dir: PathBuf,
    sequence: u32,
    last: Option<Pixmap>,
}

impl SnapshotExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: 0,
            last: None,
        }
    }

    pub fn from_config(config: &VisConfig) -> Option<Self> {
        config.save_dir.as_ref().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far.
    pub fn exported(&self) -> u32 {
        self.sequence
    }

    /// True when `pixmap` matches the last export at every sampled offset.
    pub fn is_duplicate(&self, pixmap: &Pixmap) -> bool {
        let Some(last) = &self.last else {
            return false;
        };
        if last.width() != pixmap.width() || last.height() != pixmap.height() {
            return false;
        }
        let (a, b) = (last.pixels(), pixmap.pixels());
        sample_offsets(a.len()).all(|i| a[i] == b[i])
    }

    /// Saves `pixmap` unless it duplicates the previous export. Failures are logged and
    /// leave the exporter unchanged so the next frame is tried again.
    pub fn maybe_export(&mut self, pixmap: &Pixmap, seed: u64) -> Option<PathBuf> {
        if self.is_duplicate(pixmap) {
            log::debug!("frame unchanged, skipping export");
            return None;
        }
        let path = self.dir.join(file_name(seed, self.sequence + 1));
        match self.write(pixmap, &path) {
            Ok(()) => {
                self.sequence += 1;
                self.last = Some(pixmap.clone());
                log::debug!("exported {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("failed to export {}: {e}", path.display());
                None
            }
        }
    }

    fn write(&self, pixmap: &Pixmap, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        to_rgba_image(pixmap)?.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Converts premultiplied pixmap data to straight RGBA.
pub fn to_rgba_image(pixmap: &Pixmap) -> Result<RgbaImage> {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(VisError::Surface {
        width: pixmap.width(),
        height: pixmap.height(),
    })
}
