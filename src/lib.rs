//! Hill Rover - a two-wheeled rover over endless procedural hills
//!
//! Core modules:
//! - `sim`: Tick-driven simulation (terrain streaming, wheel bodies, collisions, coupling)
//! - `viewport`: Pure clipping of world geometry into a screen rectangle
//! - `settings`: Data-driven physics/terrain tuning and level presets
//! - `error`: Construction-boundary failures

pub mod error;
pub mod settings;
pub mod sim;
pub mod viewport;

pub use error::SimError;
pub use settings::{LevelPreset, RunConfig, SimConfig};
pub use viewport::{Projected, ScreenRect, Shape, Viewport};

/// Reference tuning constants (per tick, not per second)
pub mod consts {
    /// Wall-clock cadence of the reference driver (ms). The core never reads it.
    pub const REFERENCE_TICK_MS: u64 = 5;
    /// Ticks per second at the reference cadence
    pub const REFERENCE_TICKS_PER_SECOND: f64 = 1000.0 / REFERENCE_TICK_MS as f64;

    /// Downward pull subtracted from vertical velocity each tick
    pub const GRAVITY: f64 = 0.02;
    /// Velocity retained per tick against air resistance
    pub const AIR_DRAG: f64 = 0.9999;
    /// Along-ground velocity retained per contact
    pub const GROUND_FRICTION: f64 = 0.999;
    /// Drive/brake cut-off speed along the ground
    pub const MAX_VELOCITY: f64 = 10.0;
    /// Along-ground velocity added per contact while accelerating
    pub const DRIVE_ACCEL: f64 = 0.2;
    /// Along-ground velocity removed per contact while braking
    pub const BRAKE_DECEL: f64 = 0.1;
    /// Unit push used while lifting a wheel out of the ground
    pub const DEPENETRATION_STEP: f64 = 1.0;
    /// Push budget per segment per tick before the contact is abandoned
    pub const MAX_DEPENETRATION_STEPS: u32 = 1000;

    /// Chassis spring stiffness
    pub const SPRING_CONSTANT: f64 = 0.01;
    /// Chassis damping against relative velocity
    pub const DAMPING_FACTOR: f64 = 0.05;

    /// Horizontal spacing between terrain vertices
    pub const TERRAIN_STEP: i32 = 20;
    /// Exponent shaping how steep large slopes run
    pub const IRREGULARITY: f64 = 0.5;
    pub const INITIAL_DIFFICULTY: f64 = 0.01;
    pub const DIFFICULTY_INCREMENT: f64 = 0.001;
    pub const MAX_SLOPE: f64 = 1.0;
    /// Viewport widths of terrain kept alive before eviction
    pub const WINDOW_WIDTHS: usize = 3;

    pub const VIEWPORT_WIDTH: i32 = 800;
    pub const VIEWPORT_HEIGHT: i32 = 600;
    /// Distance the viewpoint trails behind the mean wheel x
    pub const CAMERA_LEAD: f64 = 200.0;

    /// Reference car: rear wheel (x, y, radius)
    pub const REAR_WHEEL: (f64, f64, f64) = (100.0, 300.0, 20.0);
    /// Reference car: front wheel (x, y, radius)
    pub const FRONT_WHEEL: (f64, f64, f64) = (200.0, 300.0, 20.0);
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation from `from` to `to`, in [-π, π)
#[inline]
pub fn angle_delta(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-12);
        assert!((normalize_angle(-3.5 * PI) - (0.5 * PI)).abs() < 1e-12);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_angle_delta_takes_short_way() {
        let d = angle_delta(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-9);
        let d = angle_delta(-PI + 0.1, PI - 0.1);
        assert!((d + 0.2).abs() < 1e-9);
    }
}
