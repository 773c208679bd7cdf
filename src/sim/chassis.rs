//! Car body orientation: tilt angle, drive torque and flip counting
//!
//! The car is a rear and a front wheel. Its tilt is the world-axis angle of
//! the rear→front vector: 0 when level, negative when the nose is up (world y
//! grows downward) and near ±π when upside down.

use std::f64::consts::TAU;

use super::body::Body;
use super::tick::TickInput;
use crate::angle_delta;

/// Tilt of the rear→front vector in world axes
pub fn tilt_angle(rear: &Body, front: &Body) -> f64 {
    let d = front.pos - rear.pos;
    d.y.atan2(d.x)
}

/// Rotate the chassis by trading vertical velocity between the wheels
///
/// Accelerating lifts the nose (wheelie), braking dips it.
pub fn apply_tilt_torque(rear: &mut Body, front: &mut Body, input: &TickInput, torque: f64) {
    if input.accelerating {
        rear.vel.y -= torque;
        front.vel.y += torque;
    }
    if input.braking {
        rear.vel.y += torque;
        front.vel.y -= torque;
    }
}

pub fn is_upside_down(angle: f64, topple_angle: f64) -> bool {
    angle.abs() > topple_angle
}

/// Rotation direction of a completed flip, as seen on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    /// Nose over the front (tilt angle increasing)
    Clockwise,
    /// Backflip (tilt angle decreasing)
    CounterClockwise,
}

/// Unwraps successive tilt samples and counts full rotations
#[derive(Debug, Clone, Default)]
pub struct FlipTracker {
    last_angle: Option<f64>,
    accumulated: f64,
    cw: u32,
    ccw: u32,
}

impl FlipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the current tilt; returns a direction when a full turn completes
    pub fn update(&mut self, angle: f64) -> Option<FlipDirection> {
        let last = self.last_angle.replace(angle)?;
        self.accumulated += angle_delta(last, angle);

        if self.accumulated >= TAU {
            self.accumulated -= TAU;
            self.cw += 1;
            Some(FlipDirection::Clockwise)
        } else if self.accumulated <= -TAU {
            self.accumulated += TAU;
            self.ccw += 1;
            Some(FlipDirection::CounterClockwise)
        } else {
            None
        }
    }

    /// Rotation accumulated toward the next flip
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn total(&self) -> u32 {
        self.cw + self.ccw
    }

    pub fn clockwise(&self) -> u32 {
        self.cw
    }

    pub fn counter_clockwise(&self) -> u32 {
        self.ccw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn wheel(x: f64, y: f64) -> Body {
        Body::new(x, y, 20.0).unwrap()
    }

    #[test]
    fn test_tilt_angle_level_and_inverted() {
        assert_eq!(tilt_angle(&wheel(0.0, 0.0), &wheel(100.0, 0.0)), 0.0);
        // Nose up: front is higher, i.e. smaller y
        assert!(tilt_angle(&wheel(0.0, 0.0), &wheel(100.0, -50.0)) < 0.0);
        let inverted = tilt_angle(&wheel(100.0, 0.0), &wheel(0.0, 0.0));
        assert!((inverted.abs() - PI).abs() < 1e-12);
        assert!(is_upside_down(inverted, FRAC_PI_2));
        assert!(!is_upside_down(0.3, FRAC_PI_2));
    }

    #[test]
    fn test_torque_directions() {
        let mut rear = wheel(0.0, 0.0);
        let mut front = wheel(100.0, 0.0);
        apply_tilt_torque(&mut rear, &mut front, &TickInput::new(true, false), 0.05);
        assert_eq!(rear.vel.y, -0.05);
        assert_eq!(front.vel.y, 0.05);

        apply_tilt_torque(&mut rear, &mut front, &TickInput::new(false, true), 0.05);
        assert_eq!(rear.vel.y, 0.0);
        assert_eq!(front.vel.y, 0.0);
    }

    #[test]
    fn test_full_backflip_counted_once() {
        let mut tracker = FlipTracker::new();
        let mut flips = Vec::new();
        // Rotate 370 degrees the negative way in 10 degree steps
        for i in 0..=37 {
            let angle = crate::normalize_angle(-(i as f64).to_radians() * 10.0);
            if let Some(dir) = tracker.update(angle) {
                flips.push(dir);
            }
        }
        assert_eq!(flips, vec![FlipDirection::CounterClockwise]);
        assert_eq!(tracker.counter_clockwise(), 1);
        assert_eq!(tracker.total(), 1);
    }

    #[test]
    fn test_rocking_never_counts() {
        let mut tracker = FlipTracker::new();
        for i in 0..200 {
            let angle = if i % 2 == 0 { 2.5 } else { -2.5 };
            assert_eq!(tracker.update(angle), None);
        }
        assert_eq!(tracker.total(), 0);
    }

    #[test]
    fn test_two_forward_flips() {
        let mut tracker = FlipTracker::new();
        let mut count = 0;
        for i in 0..=73 {
            let angle = crate::normalize_angle((i as f64 * 10.0).to_radians());
            if tracker.update(angle) == Some(FlipDirection::Clockwise) {
                count += 1;
            }
        }
        assert_eq!(count, 2);
        tracker.reset();
        assert_eq!(tracker.total(), 0);
    }
}
