//! Non-proportional bicubic stretch with mirrored edge sampling.
//!
//! The source is scaled independently on each axis to fill the target
//! rectangle. Filter taps that fall outside the source are reflected back
//! into it (tile-flip), so edge pixels never blend with undefined or
//! transparent data. Filtering happens in premultiplied alpha.

use std::collections::BTreeMap;

use image::{GenericImageView, Rgba, RgbaImage};
use tracing::debug;

/// Keys cubic coefficient, the same kernel as `FilterType::CatmullRom`.
const CUBIC_A: f32 = -0.5;

/// Filter taps for one output coordinate.
struct Taps {
    start: isize,
    weights: Vec<f32>,
}

impl Taps {
    /// Source indices the taps read, after mirroring.
    fn indices(&self, len: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.weights.len()).map(move |k| mirror_index(self.start + k as isize, len))
    }
}

/// Stretch `src` to exactly `width × height` using bicubic interpolation.
///
/// When downscaling the kernel widens with the scale factor so every
/// source pixel contributes. Source rows are read, premultiplied and
/// resampled horizontally on demand; only the rows under the current
/// vertical kernel are kept.
pub fn stretch_bicubic<I>(src: &I, width: u32, height: u32) -> RgbaImage
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    debug!(src_w, src_h, width, height, "Stretching image (bicubic, mirrored edges)");

    let columns = compute_taps(src_w as usize, width as usize);
    let rows = compute_taps(src_h as usize, height as usize);

    let mut line = vec![[0f32; 4]; src_w as usize];
    let mut cache: BTreeMap<usize, Vec<[f32; 4]>> = BTreeMap::new();
    let mut out = RgbaImage::new(width, height);

    for (y, taps) in rows.iter().enumerate() {
        let needed: Vec<usize> = taps.indices(src_h as usize).collect();
        if let Some(&lowest) = needed.iter().min() {
            cache = cache.split_off(&lowest);
        }
        for &row in &needed {
            cache.entry(row).or_insert_with(|| {
                premultiply_row(src, row as u32, &mut line);
                columns
                    .iter()
                    .map(|column| apply(column, line.len(), |i| line[i]))
                    .collect()
            });
        }

        let window: Vec<&[[f32; 4]]> = needed
            .iter()
            .filter_map(|row| cache.get(row).map(Vec::as_slice))
            .collect();
        for x in 0..width as usize {
            let mut acc = [0f32; 4];
            for (w, resampled) in taps.weights.iter().zip(&window) {
                for c in 0..4 {
                    acc[c] += resampled[x][c] * w;
                }
            }
            out.put_pixel(x as u32, y as u32, unpremultiply(acc));
        }
    }

    out
}

fn premultiply_row<I>(src: &I, y: u32, line: &mut [[f32; 4]])
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    for (x, slot) in line.iter_mut().enumerate() {
        *slot = premultiply(&src.get_pixel(x as u32, y));
    }
}

fn apply(taps: &Taps, len: usize, sample: impl Fn(usize) -> [f32; 4]) -> [f32; 4] {
    let mut acc = [0f32; 4];
    for (i, w) in taps.indices(len).zip(&taps.weights) {
        let s = sample(i);
        for c in 0..4 {
            acc[c] += s[c] * w;
        }
    }
    acc
}

fn compute_taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let filter_scale = scale.max(1.0);
    let support = 2.0 * filter_scale;

    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * scale - 0.5;
            let start = (center - support).floor() as isize + 1;
            let end = (center + support).floor() as isize;
            let mut weights: Vec<f32> = (start..=end)
                .map(|j| cubic((j as f32 - center) / filter_scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum != 0.0 {
                for w in &mut weights {
                    *w /= sum;
                }
            }
            Taps { start, weights }
        })
        .collect()
}

fn cubic(x: f32) -> f32 {
    let a = CUBIC_A;
    let x = x.abs();
    if x < 1.0 {
        ((a + 2.0) * x - (a + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((a * x - 5.0 * a) * x + 8.0 * a) * x - 4.0 * a
    } else {
        0.0
    }
}

/// Reflect an out-of-range index back into `0..len`, repeating the
/// pattern `0 1 .. len-1 len-1 .. 1 0` in both directions.
pub fn mirror_index(i: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let m = i.rem_euclid(period);
    (if m < len { m } else { period - 1 - m }) as usize
}

fn premultiply(px: &Rgba<u8>) -> [f32; 4] {
    let a = f32::from(px[3]) / 255.0;
    [
        f32::from(px[0]) * a,
        f32::from(px[1]) * a,
        f32::from(px[2]) * a,
        f32::from(px[3]),
    ]
}

fn unpremultiply(px: [f32; 4]) -> Rgba<u8> {
    let alpha = px[3].clamp(0.0, 255.0);
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let a = alpha / 255.0;
    let channel = |v: f32| (v / a).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(px[0]),
        channel(px[1]),
        channel(px[2]),
        alpha.round() as u8,
    ])
}
