use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use slither_core::{FrameBatch, FrameSnapshot};
use tracing::info;

use crate::renderer::{Renderer, RendererContext};

/// Runs the animation without any output surface and logs a summary.
pub struct HeadlessRenderer {
    pub frames: u64,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessReport {
    pub batch: FrameBatch,
    pub spawns: u64,
    pub final_frame: FrameSnapshot,
}

impl HeadlessRenderer {
    pub fn simulate(&self, mut ctx: RendererContext) -> Result<HeadlessReport> {
        let simulation = &mut ctx.simulation;
        simulation.start();
        let batch = simulation.run_frames(self.frames)?;
        Ok(HeadlessReport {
            batch,
            spawns: simulation.spawn_count(),
            final_frame: simulation.snapshot(),
        })
    }
}

impl Renderer for HeadlessRenderer {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn run(&self, ctx: RendererContext) -> Result<()> {
        let report = self.simulate(ctx)?;
        let head = report.final_frame.positions.last().copied().unwrap_or_default();
        info!(
            target = "slither::headless",
            frames = report.batch.frames,
            steps = report.batch.steps,
            respawns = report.batch.respawns,
            spawns = report.spawns,
            pattern = report.final_frame.pattern.name(),
            side = %report.final_frame.side,
            head_x = head.x,
            head_y = head.y,
            head_visible = report.final_frame.viewport.contains(head),
            "Headless run completed"
        );

        if let Some(path) = &self.report {
            let json = serde_json::to_vec_pretty(&report).context("failed to serialize report")?;
            fs::write(path, json)
                .with_context(|| format!("failed to write headless report to {}", path.display()))?;
        }
        Ok(())
    }
}
