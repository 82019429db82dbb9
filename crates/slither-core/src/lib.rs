//! Core types for the lateral-undulation animation.
//!
//! The only stateful piece is [`UndulationChain`]: joint angles driven by a
//! travelling gait wave, positions rebuilt by forward kinematics, and a
//! time-gated per-tick recurrence. [`Simulation`] wraps one chain with the
//! entry-pattern table, viewport exit test and user knobs so that drivers
//! (browser, terminal, offscreen) share a single context object.

pub mod chain;
pub mod config;
pub mod entry;
pub mod shape;
pub mod simulation;
pub mod vector;
pub mod viewport;

pub use chain::{
    ChainError, DEFAULT_START_X, PHASE_PERIOD, SEGMENT_LENGTH, TICK_INTERVAL, UndulationChain,
    gait, trailing_line, width_profile,
};
pub use config::{ConfigError, MAX_SEGMENTS, SimulationConfig};
pub use entry::{EntrySelector, EntrySide, MovementPattern, OFF_CANVAS_DISTANCE, PATTERN_COUNT, Spawn};
pub use shape::{ChainShapes, GRID_SPACING, Palette, Rgb, Stroke, segment_normals};
pub use simulation::{
    DEFAULT_RNG_SEED, FrameBatch, FrameEvents, FrameSnapshot, Simulation, SimulationError,
};
pub use vector::{Point2, cross3};
pub use viewport::{DEFAULT_OFF_VIEWPORT_PADDING, TravelDirection, Viewport};
