//! Simulation settings, their defaults and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::PATTERN_COUNT;
use crate::viewport::{DEFAULT_OFF_VIEWPORT_PADDING, Viewport};

/// Upper bound on the segment count accepted from configuration.
pub const MAX_SEGMENTS: usize = 400;

/// Errors raised while validating a [`SimulationConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Static configuration for an animation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Width of the drawing surface.
    pub viewport_width: f64,
    /// Height of the drawing surface.
    pub viewport_height: f64,
    /// Number of rigid links per chain.
    pub segments: usize,
    /// Simulation speed; each frame feeds `0.1 * (speed + 0.1)` seconds into the chain.
    pub speed: f64,
    /// Margin a chain must clear beyond an edge before it is replaced.
    pub off_viewport_padding: f64,
    /// Optional RNG seed for reproducible entry sequences.
    pub rng_seed: Option<u64>,
    /// Enable flag per movement pattern, in table order.
    pub pattern_activity: [bool; PATTERN_COUNT],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            segments: 45,
            speed: 0.5,
            off_viewport_padding: DEFAULT_OFF_VIEWPORT_PADDING,
            rng_seed: None,
            pattern_activity: [true; PATTERN_COUNT],
        }
    }
}

impl SimulationConfig {
    /// Validates every field, failing on the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport_width.is_finite() && self.viewport_height.is_finite())
            || self.viewport_width <= 0.0
            || self.viewport_height <= 0.0
        {
            return Err(ConfigError::InvalidConfig(
                "viewport dimensions must be positive and finite",
            ));
        }
        validate_segments(self.segments)?;
        validate_speed(self.speed)?;
        if !self.off_viewport_padding.is_finite() || self.off_viewport_padding < 0.0 {
            return Err(ConfigError::InvalidConfig(
                "off_viewport_padding must be non-negative",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    /// Simulated seconds fed to the chain on every frame.
    #[must_use]
    pub fn frame_delta(&self) -> f64 {
        let speed_factor = 1.0 / (self.speed + 0.1);
        0.1 / speed_factor
    }
}

pub(crate) fn validate_segments(segments: usize) -> Result<(), ConfigError> {
    if segments < 2 {
        return Err(ConfigError::InvalidConfig("segments must be at least 2"));
    }
    if segments > MAX_SEGMENTS {
        return Err(ConfigError::InvalidConfig("segments must be 400 or fewer"));
    }
    Ok(())
}

pub(crate) fn validate_speed(speed: f64) -> Result<(), ConfigError> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(ConfigError::InvalidConfig(
            "speed must be a non-negative finite number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert!((config.frame_delta() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            SimulationConfig {
                viewport_width: 0.0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                segments: 1,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                segments: MAX_SEGMENTS + 1,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                speed: -0.5,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                speed: f64::NAN,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                off_viewport_padding: -1.0,
                ..SimulationConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "segments": 30, "rng_seed": 9 }"#).expect("parse");
        assert_eq!(config.segments, 30);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.viewport_width, 800.0);
        assert!(config.pattern_activity.iter().all(|active| *active));
    }
}
