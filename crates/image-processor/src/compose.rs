//! Image composition: coverage-weighted copies and fills.
//!
//! Copies use source-copy semantics: a fully covered pixel is replaced by
//! the source, a partially covered one is interpolated towards it in
//! premultiplied space, so transparent destinations do not darken edges.

use image::{Rgba, RgbaImage};

/// Copy `src` into `dst`, weighted by the coverage in `mask`.
///
/// All three images must share dimensions.
pub fn copy_with_coverage(dst: &mut RgbaImage, src: &RgbaImage, mask: &image::GrayImage) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    debug_assert_eq!(dst.dimensions(), mask.dimensions());

    for ((d, s), m) in dst.pixels_mut().zip(src.pixels()).zip(mask.pixels()) {
        *d = lerp_premultiplied(d, s, f32::from(m[0]) / 255.0);
    }
}

/// Paint a solid colour into `dst`, weighted by the coverage in `mask`.
pub fn fill_with_coverage(dst: &mut RgbaImage, color: Rgba<u8>, mask: &image::GrayImage) {
    debug_assert_eq!(dst.dimensions(), mask.dimensions());

    for (d, m) in dst.pixels_mut().zip(mask.pixels()) {
        if m[0] > 0 {
            *d = lerp_premultiplied(d, &color, f32::from(m[0]) / 255.0);
        }
    }
}

fn lerp_premultiplied(dst: &Rgba<u8>, src: &Rgba<u8>, t: f32) -> Rgba<u8> {
    if t >= 1.0 {
        return *src;
    }
    if t <= 0.0 {
        return *dst;
    }

    let da = f32::from(dst[3]) / 255.0;
    let sa = f32::from(src[3]) / 255.0;
    let alpha = da + (sa - da) * t;
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let d = f32::from(dst[i]) * da;
        let s = f32::from(src[i]) * sa;
        ((d + (s - d) * t) / alpha).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (alpha * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn full_coverage_replaces_pixel() {
        let mut dst = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));
        copy_with_coverage(&mut dst, &src, &mask);
        assert_eq!(dst.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn zero_coverage_keeps_destination() {
        let mut dst = RgbaImage::new(1, 1);
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        let mask = GrayImage::new(1, 1);
        copy_with_coverage(&mut dst, &src, &mask);
        assert_eq!(dst.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn partial_coverage_over_transparent_keeps_colour() {
        let mut dst = RgbaImage::new(1, 1);
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        let mask = GrayImage::from_pixel(1, 1, Luma([128]));
        copy_with_coverage(&mut dst, &src, &mask);
        assert_eq!(dst.get_pixel(0, 0), &Rgba([200, 100, 50, 128]));
    }

    #[test]
    fn fill_blends_towards_colour() {
        let mut dst = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        fill_with_coverage(&mut dst, Rgba([128, 128, 128, 255]), &mask);
        assert_eq!(dst.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(dst.get_pixel(1, 0), &Rgba([128, 128, 128, 255]));
    }
}
