//! Antialiased coverage masks for filled and stroked paths.
//!
//! Masks are [`GrayImage`]s where 255 means the pixel is fully covered.
//! Pixel centres sit at `+0.5`, matching the resampler.

use image::{GrayImage, Luma};
use imageproc::point::Point;

/// Vertical samples per pixel row when filling.
const SUBSCANLINES: u32 = 4;

/// Coverage of a polygon filled with the even-odd rule.
///
/// The polygon is closed implicitly. Coverage is exact horizontally and
/// sampled on [`SUBSCANLINES`] rows per pixel vertically.
pub fn fill_coverage(polygon: &[Point<f32>], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if polygon.len() < 3 || width == 0 {
        return mask;
    }

    let weight = 1.0 / SUBSCANLINES as f32;
    let mut row = vec![0f32; width as usize];
    let mut crossings: Vec<f32> = Vec::new();

    for py in 0..height {
        row.fill(0.0);
        for s in 0..SUBSCANLINES {
            let y = py as f32 + (s as f32 + 0.5) * weight;
            collect_crossings(polygon, y, &mut crossings);
            for span in crossings.chunks_exact(2) {
                accumulate_span(&mut row, span[0], span[1], weight);
            }
        }
        for (px, coverage) in row.iter().enumerate() {
            mask.put_pixel(px as u32, py, Luma([to_u8(*coverage)]));
        }
    }

    mask
}

fn collect_crossings(polygon: &[Point<f32>], y: f32, out: &mut Vec<f32>) {
    out.clear();
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a.y <= y) != (b.y <= y) {
            let t = (y - a.y) / (b.y - a.y);
            out.push(a.x + t * (b.x - a.x));
        }
    }
    out.sort_by(f32::total_cmp);
}

fn accumulate_span(row: &mut [f32], x0: f32, x1: f32, weight: f32) {
    let width = row.len() as f32;
    let x0 = x0.clamp(0.0, width);
    let x1 = x1.clamp(0.0, width);
    if x1 <= x0 {
        return;
    }
    let first = x0.floor() as usize;
    let last = (x1.ceil() as usize).min(row.len());
    for (px, cell) in row.iter_mut().enumerate().take(last).skip(first) {
        let left = (px as f32).max(x0);
        let right = (px as f32 + 1.0).min(x1);
        *cell += (right - left) * weight;
    }
}

/// Coverage of a polyline stroked with the given width.
///
/// Joins and caps are round. A single point yields a dot.
pub fn stroke_coverage(
    polyline: &[Point<f32>],
    stroke_width: f32,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut coverage = vec![0f32; width as usize * height as usize];
    let half = stroke_width / 2.0;

    let segments: Vec<(Point<f32>, Point<f32>)> = match polyline {
        [] => Vec::new(),
        [p] => vec![(*p, *p)],
        _ => polyline.windows(2).map(|w| (w[0], w[1])).collect(),
    };

    for (a, b) in segments {
        let reach = half + 1.0;
        let min_x = clamp_index(a.x.min(b.x) - reach, width);
        let max_x = clamp_index(a.x.max(b.x) + reach, width);
        let min_y = clamp_index(a.y.min(b.y) - reach, height);
        let max_y = clamp_index(a.y.max(b.y) + reach, height);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let center = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                let d = distance_to_segment(center, a, b);
                let c = (half + 0.5 - d).clamp(0.0, 1.0);
                let cell = &mut coverage[py as usize * width as usize + px as usize];
                if c > *cell {
                    *cell = c;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        Luma([to_u8(coverage[y as usize * width as usize + x as usize])])
    })
}

/// Multiply `mask` by `clip` in place.
pub fn intersect(mask: &mut GrayImage, clip: &GrayImage) {
    for (m, c) in mask.pixels_mut().zip(clip.pixels()) {
        m[0] = ((u16::from(m[0]) * u16::from(c[0]) + 127) / 255) as u8;
    }
}

fn clamp_index(v: f32, len: u32) -> u32 {
    if v <= 0.0 {
        0
    } else {
        (v.ceil() as u32).min(len)
    }
}

fn distance_to_segment(p: Point<f32>, a: Point<f32>, b: Point<f32>) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

fn to_u8(coverage: f32) -> u8 {
    (coverage.clamp(0.0, 1.0) * 255.0).round() as u8
}
