use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisError>;

#[derive(Debug, Error)]
pub enum VisError {
    /// A drawing primitive outside the recorded vocabulary was requested.
    #[error("unsupported drawing operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot read configuration file: {path}")]
    ConfigPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
