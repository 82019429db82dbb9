//! Offscreen rendering layer for the undulation animation.
//!
//! Frames are rasterized on the CPU into an RGBA buffer (grid, body ribbon,
//! scale strokes, head) and encoded as PNG, so headless drivers and tests can
//! inspect exactly what the browser canvas would show.

mod raster;

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use slither_core::{ChainShapes, FrameSnapshot, GRID_SPACING, Palette, Simulation, Viewport};
use tracing::debug;

pub use raster::Surface;

/// Output settings for an offscreen frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    pub draw_grid: bool,
}

impl RenderOptions {
    /// Options matching `viewport` one-to-one in pixels.
    #[must_use]
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            width: viewport.width.round().max(1.0) as u32,
            height: viewport.height.round().max(1.0) as u32,
            palette: Palette::default(),
            draw_grid: true,
        }
    }
}

/// Draw `shapes` on top of the background grid.
pub fn render_shapes(shapes: &ChainShapes, viewport: Viewport, options: &RenderOptions) -> RgbaImage {
    let palette = options.palette;
    let mut surface = Surface::new(options.width, options.height, viewport, palette.background);

    if options.draw_grid {
        surface.grid(viewport, GRID_SPACING, palette.grid_width, palette.grid);
    }

    if !shapes.intersects(viewport) {
        return surface.into_image();
    }

    surface.fill_polygon(&shapes.body, |p| palette.body_at(shapes.gradient_t(p)));
    surface.stroke_polygon(&shapes.body, palette.outline_width, palette.outline);

    for scale in &shapes.scales {
        surface.stroke_segment(scale.from, scale.to, palette.scale_width, palette.scales);
    }

    let center = shapes.head_center;
    let radius = shapes.head_radius;
    surface.fill_polygon(&shapes.head, |p| palette.head_at(p.distance(center), radius));

    surface.into_image()
}

/// Rasterize a captured frame.
pub fn render_snapshot(snapshot: &FrameSnapshot, options: &RenderOptions) -> RgbaImage {
    render_shapes(&snapshot.shapes, snapshot.viewport, options)
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to encode frame as PNG")?;
    Ok(bytes)
}

/// Render the simulation's current frame to PNG at the requested size.
pub fn render_png_offscreen(simulation: &Simulation, width: u32, height: u32) -> Result<Vec<u8>> {
    let options = RenderOptions {
        width,
        height,
        ..RenderOptions::for_viewport(simulation.viewport())
    };
    let image = render_shapes(&simulation.shapes(), simulation.viewport(), &options);
    debug!(
        width = image.width(),
        height = image.height(),
        spawn = simulation.spawn_count(),
        "rendered offscreen frame"
    );
    encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slither_core::{Rgb, SimulationConfig, UndulationChain};

    fn centered_chain() -> UndulationChain {
        UndulationChain::new(Viewport::new(800.0, 600.0), 45, 200.0, Some(300.0), Some(0.0))
            .expect("chain")
    }

    fn pixel(image: &RgbaImage, x: f64, y: f64) -> Rgb {
        let p = image.get_pixel(x.round() as u32, y.round() as u32).0;
        Rgb(p[0], p[1], p[2])
    }

    #[test]
    fn offscreen_renderer_produces_png() -> Result<()> {
        let config = SimulationConfig {
            rng_seed: Some(21),
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config).expect("simulation");
        sim.start();
        sim.run_frames(32).expect("frames");
        let png = render_png_offscreen(&sim, 640, 360)?;
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n", "invalid PNG header");
        let decoded = image::load_from_memory(&png)?;
        assert_eq!((decoded.width(), decoded.height()), (640, 360));
        Ok(())
    }

    #[test]
    fn head_is_painted_with_head_gradient_centre() {
        let chain = centered_chain();
        let shapes = ChainShapes::from_chain(&chain);
        let viewport = chain.viewport();
        let image = render_shapes(&shapes, viewport, &RenderOptions::for_viewport(viewport));
        let palette = Palette::default();
        let head = pixel(&image, shapes.head_center.x - 0.5, shapes.head_center.y - 0.5);
        let expected = palette.head[0];
        let close = |a: u8, b: u8| a.abs_diff(b) <= 2;
        assert!(
            close(head.0, expected.0) && close(head.1, expected.1) && close(head.2, expected.2),
            "expected {expected:?}, got {head:?}"
        );
    }

    #[test]
    fn background_shows_grid_and_blank_cells() {
        let chain = centered_chain();
        let shapes = ChainShapes::from_chain(&chain);
        let viewport = chain.viewport();
        let image = render_shapes(&shapes, viewport, &RenderOptions::for_viewport(viewport));
        let palette = Palette::default();
        assert_eq!(pixel(&image, 780.0, 30.0), palette.grid);
        assert_eq!(pixel(&image, 770.0, 40.0), palette.grid);
        let blank = image.get_pixel(785, 35).0;
        assert_eq!(blank, [255, 255, 255, 255]);
    }

    #[test]
    fn body_pixels_follow_the_gradient() {
        let chain = centered_chain();
        let shapes = ChainShapes::from_chain(&chain);
        let viewport = chain.viewport();
        let options = RenderOptions {
            draw_grid: false,
            ..RenderOptions::for_viewport(viewport)
        };
        let image = render_shapes(&shapes, viewport, &options);
        let palette = Palette::default();
        // Spine point near the widest part of the body, away from the scale strokes.
        let spine = (chain.positions()[33] + chain.positions()[34]) * 0.5;
        let expected = palette.body_at(shapes.gradient_t(spine));
        let actual = pixel(&image, spine.x - 0.5, spine.y - 0.5);
        let close = |a: u8, b: u8| a.abs_diff(b) <= 6;
        assert!(
            close(actual.0, expected.0) && close(actual.1, expected.1) && close(actual.2, expected.2),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn chains_outside_the_viewport_leave_only_the_grid() {
        let viewport = Viewport::new(200.0, 100.0);
        let chain = UndulationChain::new(viewport, 30, -2_000.0, Some(50.0), Some(0.0))
            .expect("chain");
        let shapes = ChainShapes::from_chain(&chain);
        let image = render_shapes(&shapes, viewport, &RenderOptions::for_viewport(viewport));
        let palette = Palette::default();
        assert!(image.pixels().all(|p| {
            let rgb = Rgb(p.0[0], p.0[1], p.0[2]);
            rgb == palette.background || rgb == palette.grid
        }));
    }
}
