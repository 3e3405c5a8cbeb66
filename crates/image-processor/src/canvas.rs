//! Canvas size selection.
//!
//! Every output image lands on one of two fixed canvases. The choice depends
//! only on the source orientation; the source is stretched to fill it.

use tracing::debug;

/// Width and height of an output canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The same canvas with width and height swapped.
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Canvas used for landscape and square sources.
pub const WIDE: CanvasSize = CanvasSize::new(1600, 1280);

/// Canvas used for portrait sources.
pub const TALL: CanvasSize = WIDE.transposed();

/// Pick the canvas for a source of the given dimensions.
///
/// Portrait sources (`width < height`) get [`TALL`]; everything else,
/// including squares, gets [`WIDE`].
pub fn select(source_width: u32, source_height: u32) -> CanvasSize {
    if source_width < source_height {
        debug!(source_width, source_height, "Portrait source, using tall canvas");
        TALL
    } else {
        debug!(source_width, source_height, "Landscape or square source, using wide canvas");
        WIDE
    }
}
