//! Rounded-corner transform: decode, stretch, clip, stroke, save.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader, RgbaImage};
use tracing::debug;

use crate::canvas::{self, CanvasSize};
use crate::compose::{copy_with_coverage, fill_with_coverage};
use crate::corners::{self, BORDER_COLOR, BORDER_WIDTH, DEFAULT_TOLERANCE};
use crate::encode::{self, Resolution};
use crate::raster::{fill_coverage, intersect, stroke_coverage};
use crate::resample::stretch_bicubic;
use crate::{Result, TransformError};

/// Result of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Where the rounded image was written.
    pub path: PathBuf,
    /// Canvas the source was stretched onto.
    pub canvas: CanvasSize,
    /// Dimensions of the decoded source.
    pub source_dimensions: (u32, u32),
}

/// Decode the image at `source_path`, round its corners and write the
/// result to `output_directory` under the same file name.
///
/// The source file is only read.
pub fn transform_and_save(
    source_path: &Path,
    output_directory: &Path,
    corner_radius: u32,
) -> Result<TransformOutput> {
    let file_name = source_path
        .file_name()
        .ok_or_else(|| TransformError::InvalidSourcePath(source_path.to_path_buf()))?;

    let source = decode(source_path)?;
    let source_dimensions = (source.width(), source.height());
    let rounded = round_corners(&source, corner_radius);
    let canvas = CanvasSize::new(rounded.width(), rounded.height());

    let destination = output_directory.join(file_name);
    let resolution = Resolution::from_source_dimensions(source_dimensions.0, source_dimensions.1);
    encode::save_canvas(&rounded, &destination, resolution).map_err(|source| {
        TransformError::Save {
            path: destination.clone(),
            source,
        }
    })?;

    Ok(TransformOutput {
        path: destination,
        canvas,
        source_dimensions,
    })
}

/// Decode an image, guessing the format from its contents.
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let decode_error = |source| TransformError::Decode {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)
}

/// Stretch `source` onto its canvas, clip the corners and stroke the border.
///
/// Pixels outside the rounded clip stay transparent.
pub fn round_corners(source: &DynamicImage, corner_radius: u32) -> RgbaImage {
    let size = canvas::select(source.width(), source.height());
    let paths = corners::build(size.width, size.height, corner_radius);

    let stretched = stretch_bicubic(source, size.width, size.height);

    let clip = fill_coverage(
        &paths.clip.closed_polygon(DEFAULT_TOLERANCE),
        size.width,
        size.height,
    );
    let mut border = stroke_coverage(
        &paths.border.flatten(DEFAULT_TOLERANCE),
        BORDER_WIDTH,
        size.width,
        size.height,
    );
    intersect(&mut border, &clip);

    let mut out = RgbaImage::new(size.width, size.height);
    copy_with_coverage(&mut out, &stretched, &clip);
    fill_with_coverage(&mut out, BORDER_COLOR, &border);

    debug!(
        width = size.width,
        height = size.height,
        corner_radius,
        "Rounded corners applied"
    );
    out
}
