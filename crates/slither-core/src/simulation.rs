//! Animation session: owns the current chain, spawns replacements and applies knobs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::chain::{ChainError, UndulationChain};
use crate::config::{ConfigError, SimulationConfig, validate_segments, validate_speed};
use crate::entry::{EntrySelector, EntrySide, MovementPattern, Spawn};
use crate::shape::ChainShapes;
use crate::vector::Point2;
use crate::viewport::Viewport;

/// Seed used when the configuration does not pin one.
pub const DEFAULT_RNG_SEED: u64 = 0xFACA_DEAF_0123_4567;

/// Errors surfaced by session operations.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn chain: {0}")]
    Chain(#[from] ChainError),
}

/// What happened during one [`Simulation::frame`] call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameEvents {
    /// Frames processed while running, including this one.
    pub frame: u64,
    /// Whether the chain took a discrete step.
    pub advanced: bool,
    /// Whether the chain left the viewport and was replaced.
    pub respawned: bool,
}

/// Aggregate of a batch of frames.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameBatch {
    pub frames: u64,
    pub steps: u64,
    pub respawns: u64,
}

/// Serializable view of the session for drivers and renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub frame: u64,
    pub running: bool,
    pub spawn_count: u64,
    pub side: EntrySide,
    pub pattern: MovementPattern,
    pub viewport: Viewport,
    pub phase_counter: u32,
    pub positions: Vec<Point2>,
    pub joint_angles: Vec<f64>,
    pub head_heading: f64,
    pub shapes: ChainShapes,
}

/// Explicit simulation context: one live chain plus everything needed to replace it.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    selector: EntrySelector,
    chain: UndulationChain,
    spawn: Spawn,
    running: bool,
    spawn_count: u64,
    frame: u64,
}

impl Simulation {
    /// Validate `config` and spawn the first chain from a random edge. The session starts stopped.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut selector = EntrySelector::new(
            config.rng_seed.unwrap_or(DEFAULT_RNG_SEED),
            config.pattern_activity,
        );
        let side = selector.random_side();
        let spawn = selector.spawn(side, config.viewport());
        let chain = build_chain(&config, &spawn)?;
        log_spawn(1, &spawn);
        Ok(Self {
            config,
            selector,
            chain,
            spawn,
            running: false,
            spawn_count: 1,
            frame: 0,
        })
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!(spawn = self.spawn_count, "simulation started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(frame = self.frame, "simulation stopped");
        }
    }

    /// Stop and replace the chain with a fresh one from a random edge.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.stop();
        let side = self.selector.random_side();
        self.respawn(side)?;
        info!(side = %self.spawn.side, pattern = %self.spawn.pattern, "simulation reset");
        Ok(())
    }

    /// Replace the current chain with one entering from `side`.
    pub fn respawn(&mut self, side: EntrySide) -> Result<(), SimulationError> {
        let spawn = self.selector.spawn(side, self.config.viewport());
        let chain = build_chain(&self.config, &spawn)?;
        self.spawn_count += 1;
        log_spawn(self.spawn_count, &spawn);
        self.chain = chain;
        self.spawn = spawn;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), SimulationError> {
        validate_speed(speed)?;
        self.config.speed = speed;
        debug!(speed, "speed updated");
        Ok(())
    }

    /// Change the link count; the chain is rebuilt from scratch via [`Self::reset`].
    pub fn set_segments(&mut self, segments: usize) -> Result<(), SimulationError> {
        validate_segments(segments)?;
        self.config.segments = segments;
        self.reset()
    }

    pub fn set_pattern_active(&mut self, pattern: MovementPattern, active: bool) {
        self.config.pattern_activity[pattern.index()] = active;
        self.selector.set_active(pattern, active);
    }

    /// Advance one animation frame. Does nothing while stopped.
    pub fn frame(&mut self) -> Result<FrameEvents, SimulationError> {
        if !self.running {
            return Ok(FrameEvents {
                frame: self.frame,
                ..FrameEvents::default()
            });
        }
        self.frame += 1;

        let phase_before = self.chain.phase_counter();
        self.chain.update(self.config.frame_delta());
        let advanced = self.chain.phase_counter() != phase_before;

        let respawned = self
            .config
            .viewport()
            .is_chain_off(&self.chain, self.config.off_viewport_padding);
        if respawned {
            debug!(frame = self.frame, "chain left the viewport");
            let side = self.selector.random_side();
            self.respawn(side)?;
        }

        Ok(FrameEvents {
            frame: self.frame,
            advanced,
            respawned,
        })
    }

    /// Run `count` frames, tallying steps and respawns.
    pub fn run_frames(&mut self, count: u64) -> Result<FrameBatch, SimulationError> {
        let mut batch = FrameBatch::default();
        for _ in 0..count {
            let events = self.frame()?;
            if !self.running {
                break;
            }
            batch.frames += 1;
            batch.steps += u64::from(events.advanced);
            batch.respawns += u64::from(events.respawned);
        }
        Ok(batch)
    }

    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            running: self.running,
            spawn_count: self.spawn_count,
            side: self.spawn.side,
            pattern: self.spawn.pattern,
            viewport: self.config.viewport(),
            phase_counter: self.chain.phase_counter(),
            positions: self.chain.positions().to_vec(),
            joint_angles: self.chain.joint_angles().to_vec(),
            head_heading: self.chain.head_heading(),
            shapes: self.shapes(),
        }
    }

    /// Outline geometry of the current chain.
    #[must_use]
    pub fn shapes(&self) -> ChainShapes {
        ChainShapes::from_chain(&self.chain)
    }

    #[must_use]
    pub const fn chain(&self) -> &UndulationChain {
        &self.chain
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.config.viewport()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    #[must_use]
    pub const fn current_spawn(&self) -> &Spawn {
        &self.spawn
    }

    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }
}

fn build_chain(config: &SimulationConfig, spawn: &Spawn) -> Result<UndulationChain, ChainError> {
    UndulationChain::new(
        config.viewport(),
        config.segments,
        spawn.start.x,
        Some(spawn.start.y),
        Some(spawn.heading),
    )
}

fn log_spawn(count: u64, spawn: &Spawn) {
    info!(
        spawn = count,
        pattern = %spawn.pattern,
        side = %spawn.side,
        start_x = spawn.start.x,
        start_y = spawn.start.y,
        heading_rad = spawn.heading,
        heading_deg = spawn.heading.to_degrees(),
        "spawned chain",
    );
}
