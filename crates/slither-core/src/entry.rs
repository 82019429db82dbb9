//! Entry-pattern table: where a freshly spawned chain starts and which way it heads.

use std::f64::consts::PI;
use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::vector::Point2;
use crate::viewport::Viewport;

/// Distance beyond the viewport edge at which side entries start.
pub const OFF_CANVAS_DISTANCE: f64 = 300.0;

/// Number of entries in the movement-pattern table.
pub const PATTERN_COUNT: usize = 11;

/// Viewport edge a chain enters from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EntrySide {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for EntrySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entry trajectories. Declaration order is the table order used for selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MovementPattern {
    LeftTop,
    LeftCenter,
    LeftBottom,
    RightTop,
    RightCenter,
    RightBottom,
    TopToBottomLeft,
    TopToBottomCenter,
    TopToBottomRight,
    BottomToTopLeft,
    BottomToTopRight,
}

impl MovementPattern {
    pub const ALL: [Self; PATTERN_COUNT] = [
        Self::LeftTop,
        Self::LeftCenter,
        Self::LeftBottom,
        Self::RightTop,
        Self::RightCenter,
        Self::RightBottom,
        Self::TopToBottomLeft,
        Self::TopToBottomCenter,
        Self::TopToBottomRight,
        Self::BottomToTopLeft,
        Self::BottomToTopRight,
    ];

    /// Position of this pattern in the table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftTop => "left-top",
            Self::LeftCenter => "left-center",
            Self::LeftBottom => "left-bottom",
            Self::RightTop => "right-top",
            Self::RightCenter => "right-center",
            Self::RightBottom => "right-bottom",
            Self::TopToBottomLeft => "top-to-bottom-left",
            Self::TopToBottomCenter => "top-to-bottom-center",
            Self::TopToBottomRight => "top-to-bottom-right",
            Self::BottomToTopLeft => "bottom-to-top-left",
            Self::BottomToTopRight => "bottom-to-top-right",
        }
    }

    /// Sample the starting Y coordinate.
    pub fn start_y(self, viewport: Viewport, rng: &mut impl Rng) -> f64 {
        let h = viewport.height;
        let r: f64 = rng.random();
        match self {
            Self::LeftTop | Self::LeftCenter => h / 1.0 + (r * 120.0 - 80.0),
            Self::LeftBottom => h / 2.2 + (r * 120.0 - 80.0),
            Self::RightTop => h / 2.0 + (-r * 120.0 - 10.0),
            Self::RightCenter => h / 2.0 + (-r * 120.0 + 10.0),
            Self::RightBottom => h / -2.5 + (-r * 120.0 + 30.0),
            Self::TopToBottomLeft | Self::TopToBottomCenter | Self::TopToBottomRight => {
                -OFF_CANVAS_DISTANCE
            }
            Self::BottomToTopLeft | Self::BottomToTopRight => h + OFF_CANVAS_DISTANCE,
        }
    }

    /// Sample the starting X coordinate; side patterns have none and use a fixed edge offset.
    pub fn start_x(self, viewport: Viewport, rng: &mut impl Rng) -> Option<f64> {
        let w = viewport.width;
        let x = match self {
            Self::TopToBottomLeft => rng.random::<f64>() * (w * 0.1) + w * 0.5,
            Self::TopToBottomCenter => w / 2.0 + (rng.random::<f64>() * (w * 0.1) - w * 0.3),
            Self::TopToBottomRight => rng.random::<f64>() * (w * -0.2) + w * 0.1,
            Self::BottomToTopLeft => rng.random::<f64>() * (w * 0.2) + w * 0.6,
            Self::BottomToTopRight => rng.random::<f64>() * (w * -0.3) + w * 0.5,
            _ => return None,
        };
        Some(x)
    }

    /// Sample the initial heading in radians.
    pub fn heading(self, rng: &mut impl Rng) -> f64 {
        let r: f64 = rng.random();
        match self {
            Self::LeftTop => -PI / (1.7 + r * 0.2),
            Self::LeftCenter => -PI / (1.9 + r * 0.2),
            Self::LeftBottom => -PI / (2.7 + r * 0.2),
            Self::RightTop => PI / (1.7 - r * 0.2),
            Self::RightCenter => PI / (1.8 - r * 0.2),
            Self::RightBottom => PI / (2.9 - r * 0.2),
            Self::TopToBottomLeft => PI / 10.0 + (PI / 11.0 + r * 0.1),
            Self::TopToBottomCenter => PI / 10.0 + (-r * 0.1 - 0.05),
            Self::TopToBottomRight => PI / 10.0 + (-PI / 4.0 + r * 0.1),
            Self::BottomToTopLeft => PI - (PI / 20.0 + r * 0.1),
            Self::BottomToTopRight => -PI / 2.0 - (PI / 4.0 + r * 0.1),
        }
    }
}

impl fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement chosen for a new chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Spawn {
    /// Side actually used; may differ from the requested one after a fallback.
    pub side: EntrySide,
    pub pattern: MovementPattern,
    pub start: Point2,
    pub heading: f64,
}

/// Randomised pattern picker with per-pattern enable flags.
///
/// The left edge never repeats its previous pattern back to back; the other
/// edges draw uniformly from their table range every time. The table ranges
/// overlap (right spans every pattern from `RightTop` on, top spans every
/// pattern from `TopToBottomLeft` on).
#[derive(Debug, Clone)]
pub struct EntrySelector {
    rng: SmallRng,
    active: [bool; PATTERN_COUNT],
    last_left: Option<MovementPattern>,
}

impl EntrySelector {
    #[must_use]
    pub fn new(seed: u64, active: [bool; PATTERN_COUNT]) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            active,
            last_left: None,
        }
    }

    #[must_use]
    pub fn is_active(&self, pattern: MovementPattern) -> bool {
        self.active[pattern.index()]
    }

    pub fn set_active(&mut self, pattern: MovementPattern, active: bool) {
        self.active[pattern.index()] = active;
    }

    /// Uniformly pick an entry side.
    pub fn random_side(&mut self) -> EntrySide {
        EntrySide::ALL[self.rng.random_range(0..EntrySide::ALL.len())]
    }

    fn candidates(&self, range: std::ops::Range<usize>) -> Vec<MovementPattern> {
        MovementPattern::ALL[range]
            .iter()
            .copied()
            .filter(|pattern| self.is_active(*pattern))
            .collect()
    }

    fn pick(&mut self, candidates: &[MovementPattern]) -> MovementPattern {
        candidates[self.rng.random_range(0..candidates.len())]
    }

    /// Choose a pattern for `side` and sample its start point and heading.
    pub fn spawn(&mut self, side: EntrySide, viewport: Viewport) -> Spawn {
        match side {
            EntrySide::Left => {
                let candidates: Vec<_> = self
                    .candidates(0..3)
                    .into_iter()
                    .filter(|pattern| Some(*pattern) != self.last_left)
                    .collect();
                if candidates.is_empty() {
                    warn!("no active left-side patterns, switching to right side");
                    return self.spawn(EntrySide::Right, viewport);
                }
                let pattern = self.pick(&candidates);
                self.last_left = Some(pattern);
                let y = pattern.start_y(viewport, &mut self.rng);
                let heading = pattern.heading(&mut self.rng);
                Spawn {
                    side,
                    pattern,
                    start: Point2::new(-OFF_CANVAS_DISTANCE, y),
                    heading,
                }
            }
            EntrySide::Right => {
                let mut candidates = self.candidates(3..PATTERN_COUNT);
                if candidates.is_empty() {
                    warn!("no active right-side patterns, using right-top");
                    candidates.push(MovementPattern::RightTop);
                }
                let pattern = self.pick(&candidates);
                let y = pattern.start_y(viewport, &mut self.rng);
                let heading = pattern.heading(&mut self.rng);
                Spawn {
                    side,
                    pattern,
                    start: Point2::new(viewport.width + OFF_CANVAS_DISTANCE, y),
                    heading,
                }
            }
            EntrySide::Top => {
                let mut candidates = self.candidates(6..PATTERN_COUNT);
                if candidates.is_empty() {
                    warn!("no active top patterns, using top-to-bottom-left");
                    candidates.push(MovementPattern::TopToBottomLeft);
                }
                let pattern = self.pick(&candidates);
                self.vertical_spawn(side, pattern, viewport)
            }
            EntrySide::Bottom => {
                let mut candidates = self.candidates(9..PATTERN_COUNT);
                if candidates.is_empty() {
                    warn!("no active bottom-to-top patterns, using bottom-to-top-left");
                    candidates.push(MovementPattern::BottomToTopLeft);
                }
                let pattern = self.pick(&candidates);
                self.vertical_spawn(side, pattern, viewport)
            }
        }
    }

    fn vertical_spawn(
        &mut self,
        side: EntrySide,
        pattern: MovementPattern,
        viewport: Viewport,
    ) -> Spawn {
        let y = pattern.start_y(viewport, &mut self.rng);
        let x = pattern
            .start_x(viewport, &mut self.rng)
            .unwrap_or(viewport.width / 2.0);
        let heading = pattern.heading(&mut self.rng);
        Spawn {
            side,
            pattern,
            start: Point2::new(x, y),
            heading,
        }
    }
}
