//! Drawing-surface bounds and the exit test used to recycle chains.

use serde::{Deserialize, Serialize};

use crate::chain::UndulationChain;
use crate::vector::Point2;

/// Margin (surface units) a chain must clear beyond an edge before it counts as gone.
pub const DEFAULT_OFF_VIEWPORT_PADDING: f64 = 100.0;

/// Size of the drawing surface. The origin is the top-left corner, `y` grows downward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Per-axis travel direction inferred from the head/tail displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TravelDirection {
    pub right: bool,
    pub left: bool,
    pub down: bool,
    pub up: bool,
}

impl TravelDirection {
    #[must_use]
    pub fn between(tail: Point2, head: Point2) -> Self {
        let mut direction = Self::default();
        if head.x > tail.x {
            direction.right = true;
        } else if head.x < tail.x {
            direction.left = true;
        }
        if head.y > tail.y {
            direction.down = true;
        } else if head.y < tail.y {
            direction.up = true;
        }
        direction
    }
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Point test with inclusive edges; the headless driver reports head visibility with it.
    #[must_use]
    pub fn contains(&self, point: Point2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    /// Whether the axis-aligned box `min..=max` touches the surface.
    #[must_use]
    pub fn overlaps(&self, min: Point2, max: Point2) -> bool {
        max.x >= 0.0 && min.x <= self.width && max.y >= 0.0 && min.y <= self.height
    }

    /// Whether a chain with the given tail and head has fully left the surface.
    ///
    /// Only the tail is compared against the padded edge that lies ahead of the
    /// direction of travel; the head always leaves first.
    #[must_use]
    pub fn is_off(&self, tail: Point2, head: Point2, padding: f64) -> bool {
        let direction = TravelDirection::between(tail, head);
        (direction.right && tail.x > self.width + padding)
            || (direction.left && tail.x < -padding)
            || (direction.down && tail.y > self.height + padding)
            || (direction.up && tail.y < -padding)
    }

    #[must_use]
    pub fn is_chain_off(&self, chain: &UndulationChain, padding: f64) -> bool {
        self.is_off(chain.tail(), chain.head(), padding)
    }
}
