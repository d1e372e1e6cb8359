use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisError};
use crate::utils::Rectangle;

pub const MAX_INFO_SCALE: u32 = 400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisConfig {
    /// When false every engine operation is a no-op.
    pub enabled: bool,
    /// Logical coordinate space the content is drawn in.
    pub content_rect: Rectangle,
    pub info_columns: u32,
    pub info_lines: u32,
    /// Panel font scale in percent; 0 hides the panel.
    pub info_scale: u32,
    /// Dots per inch used to size the panel font and the border.
    pub screen_resolution: u32,
    pub anti_alias: bool,
    /// Directory for exported snapshots; exporting is off when unset.
    pub save_dir: Option<PathBuf>,
    pub seed: u64,
    /// Pixels per content unit for the preferred window size.
    pub content_scale: Option<f32>,
    pub paint_info: bool,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_rect: Rectangle::new(0.0, 0.0, 100.0, 100.0),
            info_columns: 0,
            info_lines: 0,
            info_scale: 100,
            screen_resolution: 96,
            anti_alias: true,
            save_dir: None,
            seed: 1,
            content_scale: None,
            paint_info: false,
        }
    }
}

impl VisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| VisError::ConfigPath {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_content_rect(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.content_rect = Rectangle::new(left, top, right - left, bottom - top);
        self
    }

    pub fn with_info_dimensions(mut self, columns: u32, lines: u32) -> Self {
        self.info_columns = columns;
        self.info_lines = lines;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn info_scale(&self) -> u32 {
        self.info_scale.min(MAX_INFO_SCALE)
    }

    /// Panel font size in pixels, `None` when the panel is hidden.
    pub fn info_font_size(&self) -> Option<f32> {
        let size = self.screen_resolution * self.info_scale() / 800;
        (self.info_scale() > 0 && size > 0).then_some(size as f32)
    }

    pub fn border(&self) -> f32 {
        (self.screen_resolution / 7) as f32
    }
}
