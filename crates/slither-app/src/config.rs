//! Configuration layering: defaults, then an optional JSON file, then CLI/env overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slither_core::SimulationConfig;
use tracing::debug;

/// Values supplied on the command line or through `SLITHER_*` variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub segments: Option<usize>,
    pub speed: Option<f64>,
    pub seed: Option<u64>,
    pub padding: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(width) = self.width {
            config.viewport_width = width;
        }
        if let Some(height) = self.height {
            config.viewport_height = height;
        }
        if let Some(segments) = self.segments {
            config.segments = segments;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(padding) = self.padding {
            config.off_viewport_padding = padding;
        }
    }
}

/// Read a JSON configuration file; missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

/// Build the effective configuration and validate it.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<SimulationConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}
