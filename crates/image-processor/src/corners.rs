//! Rounded-corner geometry.
//!
//! Builds the clip path that rounds off the four canvas corners and the
//! border path that is stroked along it. Paths are sequences of elliptical
//! arcs inscribed in square boxes; consecutive arcs of one figure are joined
//! by straight lines, so four corner arcs trace a rounded rectangle.

use image::Rgba;
use imageproc::point::Point;
use tracing::debug;

/// Stroke width of the border, in canvas pixels.
pub const BORDER_WIDTH: f32 = 7.5;

/// Border colour (opaque mid gray).
pub const BORDER_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Maximum distance between a flattened arc and its true curve.
pub const DEFAULT_TOLERANCE: f32 = 0.25;

const MAX_SEGMENTS_PER_ARC: usize = 512;

/// A circular arc inscribed in a `diameter × diameter` box.
///
/// Angles are in degrees, measured clockwise from the positive x axis
/// (y points down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub x: f32,
    pub y: f32,
    pub diameter: f32,
    pub start_angle: f32,
    pub sweep_angle: f32,
}

impl ArcSegment {
    pub fn new(x: f32, y: f32, diameter: f32, start_angle: f32, sweep_angle: f32) -> Self {
        Self {
            x,
            y,
            diameter,
            start_angle,
            sweep_angle,
        }
    }

    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }

    /// Point on the arc's circle at `angle` degrees.
    pub fn point_at(&self, angle: f32) -> Point<f32> {
        let r = f64::from(self.radius());
        let cx = f64::from(self.x) + r;
        let cy = f64::from(self.y) + r;
        let theta = f64::from(angle).to_radians();
        Point::new((cx + r * theta.cos()) as f32, (cy + r * theta.sin()) as f32)
    }

    pub fn start_point(&self) -> Point<f32> {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point<f32> {
        self.point_at(self.start_angle + self.sweep_angle)
    }

    /// Number of straight segments needed to keep within `tolerance`.
    fn segment_count(&self, tolerance: f32) -> usize {
        let r = self.radius();
        if r <= tolerance || self.sweep_angle == 0.0 {
            return 1;
        }
        let step = 2.0 * (1.0 - tolerance / r).acos();
        let n = (self.sweep_angle.abs().to_radians() / step).ceil() as usize;
        n.clamp(1, MAX_SEGMENTS_PER_ARC)
    }

    fn flatten_into(&self, tolerance: f32, out: &mut Vec<Point<f32>>) {
        let n = self.segment_count(tolerance);
        for i in 0..=n {
            let angle = self.start_angle + self.sweep_angle * (i as f32 / n as f32);
            push_distinct(out, self.point_at(angle));
        }
    }
}

fn push_distinct(out: &mut Vec<Point<f32>>, p: Point<f32>) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

/// An open figure made of arcs joined by straight lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcPath {
    arcs: Vec<ArcSegment>,
}

impl ArcPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arc. A line joins the previous arc's end to its start.
    pub fn add_arc(&mut self, arc: ArcSegment) {
        self.arcs.push(arc);
    }

    pub fn arcs(&self) -> &[ArcSegment] {
        &self.arcs
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Flatten into a polyline, as traced by a stroke.
    pub fn flatten(&self, tolerance: f32) -> Vec<Point<f32>> {
        let mut points = Vec::new();
        for arc in &self.arcs {
            arc.flatten_into(tolerance, &mut points);
        }
        points
    }

    /// Flatten into a polygon whose last point equals its first, as used
    /// when the path bounds a filled region.
    pub fn closed_polygon(&self, tolerance: f32) -> Vec<Point<f32>> {
        let mut points = self.flatten(tolerance);
        if let Some(&first) = points.first() {
            push_distinct(&mut points, first);
        }
        points
    }

    /// Axis-aligned bounds `(min, max)` of the flattened path.
    pub fn bounds(&self, tolerance: f32) -> Option<(Point<f32>, Point<f32>)> {
        let points = self.flatten(tolerance);
        let first = *points.first()?;
        Some(points.iter().fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

/// Clip and border paths for one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerPaths {
    pub clip: ArcPath,
    pub border: ArcPath,
}

/// Build the rounded-corner paths for a canvas.
///
/// The radius is doubled into the arc box size. The border path repeats the
/// top-left arc at its end, so the left edge and first corner are traced
/// again when stroked. Non-positive radii are not validated.
pub fn build(canvas_width: u32, canvas_height: u32, corner_radius: u32) -> CornerPaths {
    let d = corner_radius as f32 * 2.0;
    let w = canvas_width as f32;
    let h = canvas_height as f32;

    let top_left = ArcSegment::new(0.0, 0.0, d, 180.0, 90.0);

    let mut clip = ArcPath::new();
    clip.add_arc(top_left);
    clip.add_arc(ArcSegment::new(w - d, 0.0, d, 270.0, 90.0));
    clip.add_arc(ArcSegment::new(w - d, h - d, d, 0.0, 90.0));
    clip.add_arc(ArcSegment::new(0.0, h - d, d, 90.0, 90.0));

    let mut border = clip.clone();
    border.add_arc(top_left);

    debug!(canvas_width, canvas_height, corner_radius, "Built corner paths");
    CornerPaths { clip, border }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn near(a: Point<f32>, b: Point<f32>) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn clip_has_four_corner_arcs() {
        let paths = build(1600, 1280, 30);
        let arcs = paths.clip.arcs();
        assert_eq!(arcs.len(), 4);

        assert_eq!(arcs[0], ArcSegment::new(0.0, 0.0, 60.0, 180.0, 90.0));
        assert_eq!(arcs[1], ArcSegment::new(1540.0, 0.0, 60.0, 270.0, 90.0));
        assert_eq!(arcs[2], ArcSegment::new(1540.0, 1220.0, 60.0, 0.0, 90.0));
        assert_eq!(arcs[3], ArcSegment::new(0.0, 1220.0, 60.0, 90.0, 90.0));
    }

    #[test]
    fn border_repeats_top_left_arc() {
        let paths = build(1280, 1600, 12);
        let border = paths.border.arcs();
        assert_eq!(border.len(), 5);
        assert_eq!(&border[..4], paths.clip.arcs());
        assert_eq!(border[4], border[0]);
    }

    #[test]
    fn arc_endpoints_follow_clockwise_angles() {
        let arc = ArcSegment::new(0.0, 0.0, 20.0, 180.0, 90.0);
        assert!(near(arc.start_point(), Point::new(0.0, 10.0)));
        assert!(near(arc.end_point(), Point::new(10.0, 0.0)));

        let arc = ArcSegment::new(80.0, 80.0, 20.0, 0.0, 90.0);
        assert!(near(arc.start_point(), Point::new(100.0, 90.0)));
        assert!(near(arc.end_point(), Point::new(90.0, 100.0)));
    }

    #[test]
    fn clip_polygon_is_closed_and_bounded() {
        for (w, h) in [(1600, 1280), (1280, 1600)] {
            for radius in [0, 1, 7, 30, 200, 640] {
                let paths = build(w, h, radius);
                let polygon = paths.clip.closed_polygon(DEFAULT_TOLERANCE);
                assert!(polygon.len() >= 4);
                assert_eq!(polygon.first(), polygon.last());

                let (min, max) = paths.clip.bounds(DEFAULT_TOLERANCE).unwrap();
                assert!(min.x >= -EPS && min.y >= -EPS, "radius {radius}: {min:?}");
                assert!(max.x <= w as f32 + EPS && max.y <= h as f32 + EPS);
            }
        }
    }

    #[test]
    fn clip_bounds_touch_every_canvas_edge() {
        let paths = build(1600, 1280, 30);
        let (min, max) = paths.clip.bounds(DEFAULT_TOLERANCE).unwrap();
        assert!(near(min, Point::new(0.0, 0.0)));
        assert!(near(max, Point::new(1600.0, 1280.0)));
    }

    #[test]
    fn border_stroke_ends_where_top_left_arc_ends() {
        let paths = build(1600, 1280, 30);
        let clip = paths.clip.flatten(DEFAULT_TOLERANCE);
        let border = paths.border.flatten(DEFAULT_TOLERANCE);

        assert!(near(*clip.last().unwrap(), Point::new(0.0, 1250.0)));
        assert!(near(*border.last().unwrap(), Point::new(30.0, 0.0)));
        assert!(border.len() > clip.len());
    }

    #[test]
    fn flattening_respects_tolerance() {
        let arc = ArcSegment::new(0.0, 0.0, 400.0, 180.0, 90.0);
        let mut points = Vec::new();
        arc.flatten_into(0.25, &mut points);
        let center = Point::new(200.0f32, 200.0);
        for pair in points.windows(2) {
            let mid = Point::new((pair[0].x + pair[1].x) / 2.0, (pair[0].y + pair[1].y) / 2.0);
            let dist = ((mid.x - center.x).powi(2) + (mid.y - center.y).powi(2)).sqrt();
            assert!(200.0 - dist <= 0.25 + EPS);
        }
    }

    #[test]
    fn zero_radius_degenerates_to_rectangle() {
        let paths = build(100, 50, 0);
        let polygon = paths.clip.closed_polygon(DEFAULT_TOLERANCE);
        assert_eq!(
            polygon,
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
                Point::new(0.0, 0.0),
            ]
        );
    }
}
