use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use slither_render::render_png_offscreen;
use tracing::info;

use crate::renderer::{Renderer, RendererContext};

/// Advances the animation a fixed number of frames and writes the last one as PNG.
pub struct PngRenderer {
    pub frames: u64,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Renderer for PngRenderer {
    fn name(&self) -> &'static str {
        "png"
    }

    fn run(&self, mut ctx: RendererContext) -> Result<()> {
        let simulation = &mut ctx.simulation;
        simulation.start();
        let batch = simulation.run_frames(self.frames)?;
        let png = render_png_offscreen(simulation, self.width, self.height)?;
        fs::write(&self.output, &png)
            .with_context(|| format!("failed to write frame to {}", self.output.display()))?;
        info!(
            target = "slither::png",
            path = %self.output.display(),
            bytes = png.len(),
            frames = batch.frames,
            steps = batch.steps,
            "Wrote PNG frame"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slither_core::{Simulation, SimulationConfig};

    #[test]
    fn writes_png_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("frame.png");
        let simulation = Simulation::new(SimulationConfig {
            rng_seed: Some(3),
            ..SimulationConfig::default()
        })
        .expect("simulation");
        let renderer = PngRenderer {
            frames: 30,
            output: output.clone(),
            width: 200,
            height: 150,
        };
        renderer.run(RendererContext { simulation }).expect("render");
        let bytes = fs::read(&output).expect("read png");
        assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let simulation = Simulation::new(SimulationConfig::default()).expect("simulation");
        let renderer = PngRenderer {
            frames: 1,
            output: dir.path().join("nested").join("frame.png"),
            width: 64,
            height: 48,
        };
        let err = renderer
            .run(RendererContext { simulation })
            .expect_err("directory does not exist");
        assert!(format!("{err:#}").contains("failed to write frame"));
    }
}
