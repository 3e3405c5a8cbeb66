//! Rounded-corner image transform.
//!
//! Stretches a source image onto one of two fixed canvases (chosen by
//! orientation), clips the corners to quarter circles and strokes a gray
//! border along the clip, then saves the result under the source's name.

pub mod canvas;
pub mod compose;
pub mod corners;
pub mod encode;
pub mod raster;
pub mod resample;
pub mod transform;

use std::path::PathBuf;

// Re-exports for convenience
pub use canvas::{CanvasSize, TALL, WIDE};
pub use corners::{ArcPath, ArcSegment, CornerPaths};
pub use encode::Resolution;
pub use transform::{TransformOutput, round_corners, transform_and_save};

/// Errors raised while transforming one image.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Source path has no file name: {0}")]
    InvalidSourcePath(PathBuf),

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: SaveError,
    },
}

/// Errors raised while encoding or writing an output file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
