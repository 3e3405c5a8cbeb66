//! Persisting a finished canvas.
//!
//! Output is always PNG, whatever extension the destination carries, so the
//! transparent corners survive. Resolution goes into a `pHYs` chunk.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::SaveError;

const METERS_PER_INCH: f64 = 0.0254;

/// Resolution metadata in dots per inch.
///
/// Output images carry the source's pixel dimensions here, so a
/// 2000×1500 source yields 2000×1500 "dpi".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Resolution {
    pub fn from_source_dimensions(width: u32, height: u32) -> Self {
        Self {
            horizontal: width,
            vertical: height,
        }
    }

    fn pixels_per_meter(dpi: u32) -> u32 {
        (f64::from(dpi) / METERS_PER_INCH).round().min(f64::from(u32::MAX)) as u32
    }
}

/// Write `canvas` to `path` as PNG, overwriting any existing file.
///
/// The file name is kept as given; a `.jpg` destination still holds PNG data.
pub fn save_canvas(
    canvas: &RgbaImage,
    path: &Path,
    resolution: Resolution,
) -> Result<(), SaveError> {
    debug!(path = %path.display(), ?resolution, "Encoding PNG");
    let file = File::create(path)?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: Resolution::pixels_per_meter(resolution.horizontal),
        yppu: Resolution::pixels_per_meter(resolution.vertical),
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(canvas.as_raw())?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, ImageReader, Rgba};
    use tempfile::TempDir;

    fn canvas() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(8, 6, Rgba([50, 100, 150, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img
    }

    fn read_back(path: &Path) -> image::DynamicImage {
        ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn png_keeps_alpha_and_resolution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        save_canvas(&canvas(), &path, Resolution::from_source_dimensions(2000, 1500)).unwrap();

        let decoded = read_back(&path);
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let dims = reader.info().pixel_dims.expect("pHYs chunk");
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(dims.xppu, Resolution::pixels_per_meter(2000));
        assert_eq!(dims.yppu, Resolution::pixels_per_meter(1500));
    }

    #[test]
    fn jpeg_name_still_gets_png_with_transparency() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        save_canvas(&canvas(), &path, Resolution::from_source_dimensions(10, 20)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = read_back(&path);
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn unknown_extension_is_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.raw");
        save_canvas(&canvas(), &path, Resolution::from_source_dimensions(1, 1)).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bmp");
        std::fs::write(&path, b"stale").unwrap();
        save_canvas(&canvas(), &path, Resolution::from_source_dimensions(1, 1)).unwrap();
        assert_eq!(read_back(&path).dimensions(), (8, 6));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let err = save_canvas(&canvas(), &path, Resolution::from_source_dimensions(1, 1));
        assert!(matches!(err, Err(SaveError::Io(_))));
    }

    #[test]
    fn huge_resolution_saturates_pixels_per_meter() {
        assert_eq!(Resolution::pixels_per_meter(u32::MAX), u32::MAX);
        assert_eq!(Resolution::pixels_per_meter(254), 10_000);
    }
}
