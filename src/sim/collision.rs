//! Collision detection and response against terrain segments
//!
//! A wheel touches a segment when its center is closer than its radius to the
//! segment's infinite line AND the foot of the perpendicular lands inside the
//! segment's x span. Response runs in the segment's frame: the velocity splits
//! into an along-ground part (friction, drive, brake) and a normal part (soft
//! bounce).

use glam::DVec2;

use super::terrain::TerrainSegment;
use super::tick::TickInput;
use crate::settings::PhysicsParams;

/// Result of resolving one wheel against one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// The wheel overlapped the segment at the start of resolution
    pub hit: bool,
    /// Depenetration gave up and the wheel was left where it was
    pub abandoned: bool,
    /// Unit pushes applied while lifting the wheel out
    pub steps: u32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            abandoned: false,
            steps: 0,
        }
    }
}

/// Contact tallies for one wheel over a whole segment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSummary {
    pub contacts: u32,
    pub abandoned: u32,
}

impl ContactSummary {
    pub fn record(&mut self, result: &CollisionResult) {
        if result.abandoned {
            self.abandoned += 1;
        } else if result.hit {
            self.contacts += 1;
        }
    }

    pub fn merge(&mut self, other: ContactSummary) {
        self.contacts += other.contacts;
        self.abandoned += other.abandoned;
    }
}

/// Perpendicular distance from `pos` to the segment's infinite line
#[inline]
pub fn line_distance(pos: DVec2, segment: &TerrainSegment) -> f64 {
    let m = segment.slope();
    let b = segment.intercept();
    (m * pos.x - pos.y + b).abs() / (m * m + 1.0).sqrt()
}

/// x coordinate of the foot of the perpendicular from `pos` onto the line
#[inline]
pub fn foot_x(pos: DVec2, segment: &TerrainSegment) -> f64 {
    let m = segment.slope();
    let b = segment.intercept();
    (m * (pos.y - b) + pos.x) / (m * m + 1.0)
}

/// True when a wheel at `pos` overlaps the segment (not its extension)
pub fn is_touching(pos: DVec2, radius: f64, segment: &TerrainSegment) -> bool {
    line_distance(pos, segment) < radius && segment.contains_x(foot_x(pos, segment))
}

/// Lift the wheel straight up in unit steps until it clears the line
///
/// Returns the number of steps taken, or `None` when the budget ran out.
/// On `None` the position is left untouched.
pub fn depenetrate(pos: &mut DVec2, radius: f64, segment: &TerrainSegment, step: f64, max_steps: u32) -> Option<u32> {
    let mut lifted = *pos;
    let mut steps = 0;
    while line_distance(lifted, segment) < radius {
        if steps >= max_steps {
            return None;
        }
        lifted.y -= step;
        steps += 1;
    }
    *pos = lifted;
    Some(steps)
}

/// Logistic normal response: separating speed passes through almost
/// unchanged, approach speed is damped toward zero
#[inline]
pub fn soft_bounce(normal: f64) -> f64 {
    normal * 1.0 / (1.0 + 3f64.powf(-normal))
}

/// Split a velocity into (along, normal) components for the ground angle `theta`
#[inline]
pub fn decompose(vel: DVec2, theta: f64) -> (f64, f64) {
    let (sin, cos) = theta.sin_cos();
    let along = vel.x * cos + vel.y * sin;
    let normal = vel.y * cos - vel.x * sin;
    (along, normal)
}

/// Inverse of `decompose`
#[inline]
pub fn recompose(along: f64, normal: f64, theta: f64) -> DVec2 {
    let (sin, cos) = theta.sin_cos();
    DVec2::new(along * cos - normal * sin, along * sin + normal * cos)
}

/// Friction, drive and brake applied to the along-ground speed
pub fn apply_traction(along: f64, input: &TickInput, params: &PhysicsParams) -> f64 {
    let mut along = along * params.friction;
    if input.accelerating && along < params.max_velocity {
        along += params.drive_accel;
    }
    if input.braking && along > -params.max_velocity {
        along -= params.brake_decel;
    }
    along
}

/// Resolve one wheel against one segment, mutating position and velocity
pub fn resolve_segment(
    pos: &mut DVec2,
    vel: &mut DVec2,
    radius: f64,
    segment: &TerrainSegment,
    input: &TickInput,
    params: &PhysicsParams,
) -> CollisionResult {
    if !is_touching(*pos, radius, segment) {
        return CollisionResult::miss();
    }

    let Some(steps) = depenetrate(
        pos,
        radius,
        segment,
        params.depenetration_step,
        params.max_depenetration_steps,
    ) else {
        log::warn!(
            "Depenetration abandoned after {} steps at ({:.1}, {:.1}) against segment x={}..{}",
            params.max_depenetration_steps,
            pos.x,
            pos.y,
            segment.x1(),
            segment.x2()
        );
        return CollisionResult {
            hit: true,
            abandoned: true,
            steps: params.max_depenetration_steps,
        };
    };

    let theta = segment.tangent_angle();
    let (along, normal) = decompose(*vel, theta);
    let normal = soft_bounce(normal);
    let along = apply_traction(along, input, params);
    *vel = recompose(along, normal, theta);

    CollisionResult {
        hit: true,
        abandoned: false,
        steps,
    }
}
