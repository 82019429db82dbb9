//! Kinematic chain driven by a travelling sinusoidal joint-angle wave.
//!
//! Joint angles are stored *relative*: the absolute orientation of segment `j`
//! is the inclusive prefix sum `angles[0] + ... + angles[j]`. New angular
//! information enters at the tail end of the angle array every tick and is
//! conveyed one slot per tick towards index 0, while the tracked positions are
//! shifted the opposite way so the body appears to advance.

use std::f64::consts::PI;

use thiserror::Error;

use crate::vector::Point2;
use crate::viewport::Viewport;

/// Length of every rigid link, in surface units.
pub const SEGMENT_LENGTH: f64 = 8.0;
/// Accumulated time required before one discrete step is taken.
pub const TICK_INTERVAL: f64 = 0.1;
/// Period of the phase counter.
pub const PHASE_PERIOD: u32 = 40;
/// X coordinate used when the caller does not pick one.
pub const DEFAULT_START_X: f64 = 100.0;

const GAIT_SAMPLES: i64 = 40;
const GAIT_AMPLITUDE: f64 = 3.5;
const WIDTH_SAMPLES: f64 = 50.0;
const WIDTH_FALLOFF: f64 = 0.003;
const WIDTH_THICKNESS: f64 = 30.0;

/// Heading bias applied to the first joint when no explicit heading is given.
const DEFAULT_HEADING_BIAS: f64 = -3.0 * PI / 8.0 - PI / 64.0;

/// Errors raised when constructing a chain.
#[derive(Debug, Error, PartialEq)]
pub enum ChainError {
    /// The update recurrence folds `angles[1]` into `angles[0]`, so at least two links are needed.
    #[error("a chain needs at least 2 segments, got {requested}")]
    TooFewSegments { requested: usize },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
}

/// Joint-angle contribution injected at the tail for a given phase index.
///
/// Periodic with period 41 in `phase`.
#[must_use]
pub fn gait(phase: i64) -> f64 {
    let n = GAIT_SAMPLES;
    let reduced = phase.rem_euclid(n + 1) as f64;
    let n = n as f64;
    GAIT_AMPLITUDE * PI / n * (4.0 * PI / (n + 1.0) * reduced).sin()
}

/// Gaussian body half-thickness profile along the chain.
#[must_use]
pub fn width_profile(index: usize, segment_length: f64) -> f64 {
    let a = WIDTH_THICKNESS / segment_length;
    let t = -WIDTH_SAMPLES * 2.0 / 3.0;
    let offset = index as f64 + t;
    a * (-WIDTH_FALLOFF * offset * offset).exp()
}

/// Straight line of `count + 1` points running from `start` directly away from `heading`.
#[must_use]
pub fn trailing_line(start: Point2, heading: f64, count: usize, segment_length: f64) -> Vec<Point2> {
    let direction = Point2::from_angle(heading);
    (0..=count)
        .map(|i| start - direction.scale(i as f64 * segment_length))
        .collect()
}

/// One snake body: relative joint angles plus the positions reconstructed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct UndulationChain {
    viewport: Viewport,
    segment_count: usize,
    segment_length: f64,
    joint_angles: Vec<f64>,
    positions: Vec<Point2>,
    phase_counter: u32,
    elapsed_time: f64,
}

impl UndulationChain {
    /// Spawn a chain anchored at `(start_x, start_y)`.
    ///
    /// `start_y` defaults to the vertical centre of `viewport`. When
    /// `initial_angle` is `None` the first joint receives a fixed heading bias.
    pub fn new(
        viewport: Viewport,
        segment_count: usize,
        start_x: f64,
        start_y: Option<f64>,
        initial_angle: Option<f64>,
    ) -> Result<Self, ChainError> {
        if segment_count < 2 {
            return Err(ChainError::TooFewSegments {
                requested: segment_count,
            });
        }
        let start = Point2::new(start_x, start_y.unwrap_or(viewport.height / 2.0));
        if !start.is_finite() {
            return Err(ChainError::NonFinite { field: "start" });
        }
        if initial_angle.is_some_and(|angle| !angle.is_finite()) {
            return Err(ChainError::NonFinite {
                field: "initial_angle",
            });
        }

        let segment_length = SEGMENT_LENGTH;
        let phase_counter = 0;
        let positions = trailing_line(
            start,
            initial_angle.unwrap_or(0.0),
            segment_count,
            segment_length,
        );
        let mut joint_angles: Vec<f64> = (0..segment_count)
            .map(|i| gait(i as i64 + i64::from(phase_counter)))
            .collect();
        joint_angles[0] = match initial_angle {
            Some(angle) => angle,
            None => joint_angles[0] + DEFAULT_HEADING_BIAS,
        };

        let mut chain = Self {
            viewport,
            segment_count,
            segment_length,
            joint_angles,
            positions,
            phase_counter,
            elapsed_time: 0.0,
        };
        chain.calculate_positions();
        Ok(chain)
    }

    /// Spawn at the default start point (`x = 100`, vertically centred) with the default heading.
    pub fn with_defaults(viewport: Viewport, segment_count: usize) -> Result<Self, ChainError> {
        Self::new(viewport, segment_count, DEFAULT_START_X, None, None)
    }

    /// Rebuild `positions[1..]` from the anchor and the joint angles.
    pub fn calculate_positions(&mut self) {
        let anchor = self.positions[0];
        let mut heading = 0.0;
        let mut offset = Point2::ZERO;
        for (j, angle) in self.joint_angles.iter().enumerate() {
            heading += angle;
            offset = offset + Point2::from_angle(heading).scale(self.segment_length);
            self.positions[j + 1] = anchor + offset;
        }
    }

    /// Accumulate `delta_time` and take one discrete step once a full tick has elapsed.
    pub fn update(&mut self, delta_time: f64) {
        self.elapsed_time += delta_time;
        if self.elapsed_time < TICK_INTERVAL {
            return;
        }
        self.elapsed_time = 0.0;

        self.calculate_positions();

        let n = self.segment_count;
        // Drop the rearmost point; the head slot is refreshed by the next kinematics pass.
        self.positions.copy_within(1..=n, 0);

        self.phase_counter = (self.phase_counter + 1) % PHASE_PERIOD;

        self.joint_angles[0] += self.joint_angles[1];
        self.joint_angles.copy_within(2..n, 1);
        self.joint_angles[n - 1] = gait(i64::from(self.phase_counter));
    }

    /// Body half-thickness at segment `index`.
    #[must_use]
    pub fn width(&self, index: usize) -> f64 {
        width_profile(index, self.segment_length)
    }

    /// Move the anchor point. Derived positions are refreshed by [`Self::calculate_positions`].
    pub fn set_anchor(&mut self, anchor: Point2) {
        self.positions[0] = anchor;
    }

    #[must_use]
    pub fn positions(&self) -> &[Point2] {
        &self.positions
    }

    #[must_use]
    pub fn joint_angles(&self) -> &[f64] {
        &self.joint_angles
    }

    #[must_use]
    pub const fn segment_count(&self) -> usize {
        self.segment_count
    }

    #[must_use]
    pub const fn segment_length(&self) -> f64 {
        self.segment_length
    }

    #[must_use]
    pub const fn phase_counter(&self) -> u32 {
        self.phase_counter
    }

    #[must_use]
    pub const fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Leading end of the chain, `positions[segment_count]`.
    #[must_use]
    pub fn head(&self) -> Point2 {
        self.positions[self.segment_count]
    }

    /// Rearmost tracked point, `positions[0]`.
    #[must_use]
    pub fn tail(&self) -> Point2 {
        self.positions[0]
    }

    /// Absolute orientation of the last segment (sum of every joint angle).
    #[must_use]
    pub fn head_heading(&self) -> f64 {
        self.joint_angles.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPS
    }

    fn chain(segments: usize) -> UndulationChain {
        UndulationChain::new(Viewport::default(), segments, 0.0, Some(0.0), Some(0.0))
            .expect("chain")
    }

    #[test]
    fn gait_is_zero_at_origin_and_periodic() {
        assert_eq!(gait(0), 0.0);
        for p in -100..100 {
            assert!(approx(gait(p), gait(p + 41)), "phase {p}");
        }
    }

    #[test]
    fn gait_peak_matches_amplitude() {
        let peak = (0..41).map(gait).fold(f64::MIN, f64::max);
        assert!(peak <= 3.5 * PI / 40.0 + EPS);
        assert!(peak > 0.9 * 3.5 * PI / 40.0);
    }

    #[test]
    fn width_peaks_two_thirds_along_fifty_samples() {
        let widest = (0..120)
            .max_by(|a, b| width_profile(*a, 8.0).total_cmp(&width_profile(*b, 8.0)))
            .expect("non-empty range");
        assert_eq!(widest, 33);
        assert!(width_profile(33, 8.0) <= 30.0 / 8.0);
        assert!(width_profile(400, 8.0) < 1e-6);
        assert!(width_profile(10, 8.0) < width_profile(20, 8.0));
        assert!(width_profile(60, 8.0) < width_profile(45, 8.0));
    }

    #[test]
    fn rejects_degenerate_segment_counts() {
        let err = UndulationChain::with_defaults(Viewport::default(), 1).unwrap_err();
        assert_eq!(err, ChainError::TooFewSegments { requested: 1 });
        assert!(UndulationChain::with_defaults(Viewport::default(), 0).is_err());
    }

    #[test]
    fn rejects_non_finite_inputs() {
        let err = UndulationChain::new(Viewport::default(), 4, f64::NAN, None, None).unwrap_err();
        assert_eq!(err, ChainError::NonFinite { field: "start" });
        let err = UndulationChain::new(Viewport::default(), 4, 0.0, None, Some(f64::INFINITY))
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::NonFinite {
                field: "initial_angle"
            }
        );
    }

    #[test]
    fn construction_sizes_and_anchor() {
        let c = chain(4);
        assert_eq!(c.positions().len(), 5);
        assert_eq!(c.joint_angles().len(), 4);
        assert_eq!(c.tail(), Point2::new(0.0, 0.0));
        assert_eq!(c.joint_angles()[0], 0.0);
        for (i, angle) in c.joint_angles().iter().enumerate().skip(1) {
            assert!(approx(*angle, gait(i as i64)));
        }
        for pair in c.positions().windows(2) {
            assert!(approx(pair[0].distance(pair[1]), 8.0));
        }
    }

    #[test]
    fn default_start_is_vertically_centred_with_heading_bias() {
        let viewport = Viewport::new(640.0, 480.0);
        let c = UndulationChain::with_defaults(viewport, 10).expect("chain");
        assert_eq!(c.tail(), Point2::new(100.0, 240.0));
        assert!(approx(c.joint_angles()[0], -3.0 * PI / 8.0 - PI / 64.0));
    }

    #[test]
    fn trailing_line_runs_behind_the_heading() {
        let line = trailing_line(Point2::ZERO, 0.0, 4, 8.0);
        assert_eq!(line.len(), 5);
        for (i, p) in line.iter().enumerate() {
            assert!(approx(p.x, -8.0 * i as f64));
            assert!(approx(p.y, 0.0));
        }
    }

    #[test]
    fn forward_kinematics_matches_nested_prefix_sums() {
        let c = UndulationChain::new(Viewport::default(), 12, 17.0, Some(-4.0), None)
            .expect("chain");
        let th = c.joint_angles();
        for i in 1..=c.segment_count() {
            let mut expected = c.tail();
            for j in 0..i {
                let s: f64 = th[..=j].iter().sum();
                expected = expected + Point2::new(s.cos(), s.sin()) * 8.0;
            }
            let actual = c.positions()[i];
            assert!(actual.distance(expected) < 1e-9, "index {i}");
        }
    }

    #[test]
    fn forward_kinematics_is_translation_invariant() {
        let mut c = chain(9);
        let before = c.positions().to_vec();
        let angles = c.joint_angles().to_vec();
        let shift = Point2::new(13.5, -7.25);
        c.set_anchor(before[0] + shift);
        c.calculate_positions();
        for (old, new) in before.iter().zip(c.positions()) {
            assert!(new.distance(*old + shift) < 1e-9);
        }
        assert_eq!(c.joint_angles(), angles.as_slice());
    }

    #[test]
    fn calculate_positions_is_idempotent() {
        let mut c = chain(7);
        c.calculate_positions();
        let first = c.positions().to_vec();
        c.calculate_positions();
        assert_eq!(c.positions(), first.as_slice());
    }

    #[test]
    fn sub_threshold_updates_change_nothing_observable() {
        let mut c = chain(6);
        let positions = c.positions().to_vec();
        let angles = c.joint_angles().to_vec();
        c.update(0.03);
        c.update(0.03);
        c.update(0.03);
        assert_eq!(c.positions(), positions.as_slice());
        assert_eq!(c.joint_angles(), angles.as_slice());
        assert_eq!(c.phase_counter(), 0);
        assert!(approx(c.elapsed_time(), 0.09));
    }

    #[test]
    fn qualifying_update_shifts_state() {
        let mut c = chain(5);
        let old_positions = c.positions().to_vec();
        let old_angles = c.joint_angles().to_vec();

        c.update(0.1);

        assert_eq!(c.positions().len(), 6);
        assert_eq!(c.joint_angles().len(), 5);
        assert_eq!(c.phase_counter(), 1);
        assert_eq!(c.elapsed_time(), 0.0);

        for i in 0..5 {
            assert_eq!(c.positions()[i], old_positions[i + 1]);
        }
        assert_eq!(c.positions()[5], old_positions[5]);

        let th = c.joint_angles();
        assert!(approx(th[0], old_angles[0] + old_angles[1]));
        assert_eq!(th[1], old_angles[2]);
        assert_eq!(th[2], old_angles[3]);
        assert_eq!(th[3], old_angles[4]);
        assert!(approx(th[4], gait(1)));
    }

    #[test]
    fn two_segment_chain_folds_and_injects() {
        let mut c = chain(2);
        let old = c.joint_angles().to_vec();
        c.update(0.5);
        assert!(approx(c.joint_angles()[0], old[0] + old[1]));
        assert!(approx(c.joint_angles()[1], gait(1)));
    }

    #[test]
    fn phase_counter_cycles_every_forty_ticks() {
        let mut c = chain(8);
        let start = c.phase_counter();
        for tick in 1..=40 {
            c.update(0.1);
            if tick < 40 {
                assert_ne!(c.phase_counter(), start);
            }
        }
        assert_eq!(c.phase_counter(), start);
    }

    #[test]
    fn head_heading_is_total_angle() {
        let c = chain(6);
        let total: f64 = c.joint_angles().iter().sum();
        assert!(approx(c.head_heading(), total));
    }
}
