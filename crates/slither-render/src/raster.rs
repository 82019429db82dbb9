use image::{Rgba, RgbaImage};
use slither_core::{Point2, Rgb, Viewport};

/// RGBA pixel buffer addressed in viewport coordinates.
pub struct Surface {
    image: RgbaImage,
    scale_x: f64,
    scale_y: f64,
}

impl Surface {
    pub fn new(width: u32, height: u32, viewport: Viewport, background: Rgb) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let image = RgbaImage::from_pixel(width, height, rgba(background));
        Self {
            image,
            scale_x: f64::from(width) / viewport.width.max(f64::EPSILON),
            scale_y: f64::from(height) / viewport.height.max(f64::EPSILON),
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn to_px(&self, point: Point2) -> Point2 {
        Point2::new(point.x * self.scale_x, point.y * self.scale_y)
    }

    fn to_world(&self, x: f64, y: f64) -> Point2 {
        Point2::new(x / self.scale_x, y / self.scale_y)
    }

    fn stroke_radius_px(&self, width: f64) -> f64 {
        (width * self.scale_x.min(self.scale_y) * 0.5).max(0.5)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.image.width()) || y >= i64::from(self.image.height())
        {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, rgba(color));
    }

    /// Even-odd scanline fill; `shade` receives the viewport-space centre of each covered pixel.
    pub fn fill_polygon(&mut self, points: &[Point2], shade: impl Fn(Point2) -> Rgb) {
        if points.len() < 3 {
            return;
        }
        let px: Vec<Point2> = points.iter().map(|p| self.to_px(*p)).collect();
        if px.iter().any(|p| !p.is_finite()) {
            return;
        }
        let (min_y, max_y) = px
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
        let height = f64::from(self.image.height());
        let width = f64::from(self.image.width());
        let row_start = min_y.floor().max(0.0) as i64;
        let row_end = max_y.ceil().min(height) as i64;

        let mut crossings = Vec::new();
        for row in row_start..row_end {
            let y = row as f64 + 0.5;
            crossings.clear();
            for (i, a) in px.iter().enumerate() {
                let b = px[(i + 1) % px.len()];
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let first = (span[0] - 0.5).ceil().max(0.0) as i64;
                let last = (span[1] - 0.5).floor().min(width - 1.0) as i64;
                for col in first..=last {
                    let color = shade(self.to_world(col as f64 + 0.5, y));
                    self.put(col, row, color);
                }
            }
        }
    }

    /// Straight stroke of `width` viewport units.
    pub fn stroke_segment(&mut self, from: Point2, to: Point2, width: f64, color: Rgb) {
        let a = self.to_px(from);
        let b = self.to_px(to);
        if !a.is_finite() || !b.is_finite() {
            return;
        }
        let radius = self.stroke_radius_px(width);
        let min_x = (a.x.min(b.x) - radius).floor() as i64;
        let max_x = (a.x.max(b.x) + radius).ceil() as i64;
        let min_y = (a.y.min(b.y) - radius).floor() as i64;
        let max_y = (a.y.max(b.y) + radius).ceil() as i64;
        let w = i64::from(self.image.width());
        let h = i64::from(self.image.height());

        let axis = b - a;
        let len_sq = axis.dot(axis);
        for row in min_y.max(0)..=max_y.min(h - 1) {
            for col in min_x.max(0)..=max_x.min(w - 1) {
                let p = Point2::new(col as f64 + 0.5, row as f64 + 0.5);
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    ((p - a).dot(axis) / len_sq).clamp(0.0, 1.0)
                };
                if p.distance(a + axis * t) <= radius {
                    self.put(col, row, color);
                }
            }
        }
    }

    /// Outline of a closed polygon.
    pub fn stroke_polygon(&mut self, points: &[Point2], width: f64, color: Rgb) {
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.stroke_segment(*a, b, width, color);
        }
    }

    /// Axis-aligned grid lines every `spacing` viewport units.
    pub fn grid(&mut self, viewport: Viewport, spacing: f64, width: f64, color: Rgb) {
        if spacing <= 0.0 {
            return;
        }
        let mut x = 0.0;
        while x < viewport.width {
            self.stroke_segment(Point2::new(x, 0.0), Point2::new(x, viewport.height), width, color);
            x += spacing;
        }
        let mut y = 0.0;
        while y < viewport.height {
            self.stroke_segment(Point2::new(0.0, y), Point2::new(viewport.width, y), width, color);
            y += spacing;
        }
    }
}

fn rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb = Rgb(0, 0, 0);
    const WHITE: Rgb = Rgb(255, 255, 255);

    fn surface() -> Surface {
        Surface::new(10, 10, Viewport::new(10.0, 10.0), WHITE)
    }

    #[test]
    fn square_fill_covers_interior_pixels_only() {
        let mut s = surface();
        let square = [
            Point2::new(2.0, 2.0),
            Point2::new(6.0, 2.0),
            Point2::new(6.0, 6.0),
            Point2::new(2.0, 6.0),
        ];
        s.fill_polygon(&square, |_| BLACK);
        let image = s.into_image();
        let filled = image.pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
        assert_eq!(filled, 16);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(6, 6).0, [255, 255, 255, 255]);
    }

    #[test]
    fn degenerate_polygons_are_ignored() {
        let mut s = surface();
        s.fill_polygon(&[Point2::new(1.0, 1.0), Point2::new(5.0, 5.0)], |_| BLACK);
        s.fill_polygon(
            &[Point2::new(f64::NAN, 1.0), Point2::new(5.0, 5.0), Point2::new(1.0, 5.0)],
            |_| BLACK,
        );
        assert!(s.into_image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn thin_strokes_still_mark_pixels() {
        let mut s = surface();
        s.stroke_segment(Point2::new(0.5, 4.5), Point2::new(9.5, 4.5), 0.1, BLACK);
        let image = s.into_image();
        for x in 0..10 {
            assert_eq!(image.get_pixel(x, 4).0, [0, 0, 0, 255], "column {x}");
        }
    }

    #[test]
    fn shade_receives_viewport_coordinates() {
        let mut s = Surface::new(20, 20, Viewport::new(10.0, 10.0), WHITE);
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        s.fill_polygon(&square, |p| if p.x < 5.0 { BLACK } else { WHITE });
        let image = s.into_image();
        assert_eq!(image.get_pixel(9, 3).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(10, 3).0, [255, 255, 255, 255]);
    }
}
