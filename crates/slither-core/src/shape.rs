//! Renderer-independent outline geometry for one chain.
//!
//! Every backend (canvas, PNG rasterizer, terminal) draws the same three
//! layers from a [`ChainShapes`]: a gradient-filled body ribbon with a thin
//! outline, white scale strokes across the body, and a plectrum-shaped head.

use serde::{Deserialize, Serialize};

use crate::chain::UndulationChain;
use crate::vector::Point2;
use crate::viewport::Viewport;

/// Scale factor applied to the head outline.
pub const HEAD_SCALE: f64 = 3.5;
/// Lateral stretch applied to the head outline.
pub const HEAD_WIDTH_MULTIPLIER: f64 = 1.4;
/// Spacing of the background grid, in surface units.
pub const GRID_SPACING: f64 = 20.0;

/// (forward, lateral) coefficients of the head outline, tip first, clockwise on screen.
const HEAD_OUTLINE: [(f64, f64); 12] = [
    (5.0, 0.0),
    (3.0, 1.2),
    (1.0, 1.9),
    (-1.0, 2.0),
    (-2.0, 1.8),
    (-3.0, 1.4),
    (-3.5, 0.0),
    (-3.0, -1.4),
    (-2.0, -1.8),
    (-1.0, -2.0),
    (1.0, -1.9),
    (3.0, -1.2),
];

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// CSS hex notation (`#rrggbb`).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Blend towards `other`; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn mix(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Self(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }
}

/// Colours shared by every renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    /// Body gradient stops at 0, 0.5 and 1 along the tail-to-head axis.
    pub body: [Rgb; 3],
    pub outline: Rgb,
    pub outline_width: f64,
    pub scales: Rgb,
    pub scale_width: f64,
    /// Radial head gradient, centre then rim.
    pub head: [Rgb; 2],
    pub grid: Rgb,
    pub grid_width: f64,
    pub background: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            body: [Rgb(0x30, 0x4D, 0x30), Rgb(0x4F, 0x6F, 0x52), Rgb(0x73, 0x90, 0x72)],
            outline: Rgb(0x1E, 0x32, 0x1E),
            outline_width: 0.5,
            scales: Rgb(0xFF, 0xFF, 0xFF),
            scale_width: 2.0,
            head: [Rgb(0x30, 0x4D, 0x30), Rgb(0x1A, 0x2B, 0x1A)],
            grid: Rgb(0xEE, 0xEE, 0xEE),
            grid_width: 0.5,
            background: Rgb(0xFF, 0xFF, 0xFF),
        }
    }
}

impl Palette {
    /// Body colour at parameter `t` along the gradient axis.
    #[must_use]
    pub fn body_at(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.5 {
            self.body[0].mix(self.body[1], t * 2.0)
        } else {
            self.body[1].mix(self.body[2], (t - 0.5) * 2.0)
        }
    }

    /// Head colour at distance `d` from the head centre, for a gradient of `radius`.
    #[must_use]
    pub fn head_at(&self, d: f64, radius: f64) -> Rgb {
        if radius <= 0.0 {
            return self.head[1];
        }
        self.head[0].mix(self.head[1], d / radius)
    }
}

/// Straight stroke between two points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Stroke {
    pub from: Point2,
    pub to: Point2,
}

/// Everything a renderer needs to draw one chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainShapes {
    /// Closed ribbon outline: left edge tail to head, then right edge head to tail.
    pub body: Vec<Point2>,
    pub scales: Vec<Stroke>,
    pub head: Vec<Point2>,
    pub head_center: Point2,
    pub head_radius: f64,
    /// Linear body gradient runs from `gradient.from` (stop 0) to `gradient.to` (stop 1).
    pub gradient: Stroke,
}

/// Unit normals of every segment; degenerate segments yield the zero vector.
#[must_use]
pub fn segment_normals(positions: &[Point2]) -> Vec<Point2> {
    positions
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).normalize().perpendicular())
        .collect()
}

impl ChainShapes {
    #[must_use]
    pub fn from_chain(chain: &UndulationChain) -> Self {
        let r = chain.positions();
        let n = chain.segment_count();
        let normals = segment_normals(r);

        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            let width = chain.width(i) * 2.0;
            left.push(r[i] + normals[i] * width);
            right.push(r[i] - normals[i] * width);
        }
        right.reverse();
        left.extend(right);

        let scales = (0..n)
            .step_by(2)
            .filter_map(|i| {
                let width = chain.width(i) * 0.9;
                (width > 1.0).then(|| Stroke {
                    from: r[i] + normals[i] * (width * 0.7),
                    to: r[i] - normals[i] * (width * 0.7),
                })
            })
            .collect();

        let head_center = chain.head();
        let heading = chain.head_heading();
        let forward = Point2::from_angle(heading);
        let lateral = Point2::new(heading.sin(), -heading.cos());
        let head = HEAD_OUTLINE
            .iter()
            .map(|(f, l)| {
                head_center
                    + forward * (f * HEAD_SCALE)
                    + lateral * (l * HEAD_SCALE * HEAD_WIDTH_MULTIPLIER)
            })
            .collect();

        Self {
            body: left,
            scales,
            head,
            head_center,
            head_radius: 6.0 * HEAD_SCALE,
            gradient: Stroke {
                from: chain.tail(),
                to: head_center,
            },
        }
    }

    /// Parameter of `point` projected on the gradient axis, clamped to `[0, 1]`.
    #[must_use]
    pub fn gradient_t(&self, point: Point2) -> f64 {
        let axis = self.gradient.to - self.gradient.from;
        let len_sq = axis.dot(axis);
        if len_sq == 0.0 {
            return 0.0;
        }
        ((point - self.gradient.from).dot(axis) / len_sq).clamp(0.0, 1.0)
    }

    /// Axis-aligned bounds of every drawn point, as `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        let mut points = self
            .body
            .iter()
            .chain(self.head.iter())
            .chain(self.scales.iter().flat_map(|s| [&s.from, &s.to]));
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Whether any part of the outline can land on `viewport`. Renderers skip the chain otherwise.
    #[must_use]
    pub fn intersects(&self, viewport: Viewport) -> bool {
        self.bounds()
            .is_some_and(|(min, max)| viewport.overlaps(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> UndulationChain {
        UndulationChain::new(Viewport::default(), 45, 400.0, Some(300.0), Some(0.3))
            .expect("chain")
    }

    #[test]
    fn ribbon_has_two_points_per_segment() {
        let c = chain();
        let shapes = ChainShapes::from_chain(&c);
        assert_eq!(shapes.body.len(), 2 * c.segment_count());
        assert_eq!(shapes.head.len(), 12);
        assert!(shapes.body.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn ribbon_edges_are_symmetric_about_the_spine() {
        let c = chain();
        let shapes = ChainShapes::from_chain(&c);
        let n = c.segment_count();
        for i in 0..n {
            let left = shapes.body[i];
            let right = shapes.body[2 * n - 1 - i];
            let mid = (left + right) * 0.5;
            assert!(mid.distance(c.positions()[i]) < 1e-9);
            assert!((left.distance(right) - 4.0 * c.width(i)).abs() < 1e-9);
        }
    }

    #[test]
    fn head_tip_points_along_heading() {
        let c = chain();
        let shapes = ChainShapes::from_chain(&c);
        let tip = shapes.head[0];
        let expected = c.head() + Point2::from_angle(c.head_heading()) * (5.0 * HEAD_SCALE);
        assert!(tip.distance(expected) < 1e-9);
    }

    #[test]
    fn degenerate_segments_do_not_produce_nan() {
        let mut c = chain();
        // After a step the last two tracked points coincide until the next kinematics pass.
        c.update(0.1);
        let n = c.segment_count();
        assert_eq!(c.positions()[n], c.positions()[n - 1]);
        let normals = segment_normals(c.positions());
        assert_eq!(normals[n - 1], Point2::ZERO);
        let shapes = ChainShapes::from_chain(&c);
        assert!(shapes.body.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn scales_only_where_body_is_thick() {
        let c = chain();
        let shapes = ChainShapes::from_chain(&c);
        let expected = (0..c.segment_count())
            .step_by(2)
            .filter(|i| c.width(*i) * 0.9 > 1.0)
            .count();
        assert_eq!(shapes.scales.len(), expected);
        assert!(!shapes.scales.is_empty());
    }

    #[test]
    fn palette_gradient_hits_its_stops() {
        let palette = Palette::default();
        assert_eq!(palette.body_at(0.0), palette.body[0]);
        assert_eq!(palette.body_at(0.5), palette.body[1]);
        assert_eq!(palette.body_at(1.0), palette.body[2]);
        assert_eq!(palette.head_at(100.0, 21.0), palette.head[1]);
        assert_eq!(Rgb(0x30, 0x4D, 0x30).to_hex(), "#304D30");
    }

    #[test]
    fn gradient_parameter_is_clamped() {
        let shapes = ChainShapes::from_chain(&chain());
        assert_eq!(shapes.gradient_t(shapes.gradient.from), 0.0);
        assert!((shapes.gradient_t(shapes.gradient.to) - 1.0).abs() < 1e-12);
        let beyond = shapes.gradient.to + (shapes.gradient.to - shapes.gradient.from);
        assert_eq!(shapes.gradient_t(beyond), 1.0);
    }

    #[test]
    fn bounds_cover_the_head_and_cull_distant_chains() {
        let c = chain();
        let shapes = ChainShapes::from_chain(&c);
        let (min, max) = shapes.bounds().expect("bounds");
        let head = shapes.head_center;
        assert!(min.x <= head.x && head.x <= max.x && min.y <= head.y && head.y <= max.y);
        assert!(shapes.intersects(c.viewport()));

        let far = UndulationChain::new(Viewport::default(), 45, -3_000.0, Some(300.0), Some(0.0))
            .expect("chain");
        assert!(!ChainShapes::from_chain(&far).intersects(far.viewport()));
    }
}
