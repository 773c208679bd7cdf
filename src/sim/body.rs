//! Wheel bodies: unit point masses with a fixed radius
//!
//! Position uses world axes (y down). Velocity is up-positive: `vel.y > 0`
//! means gaining height, so integration subtracts it from `pos.y`.

use glam::DVec2;

use super::collision::{ContactSummary, resolve_segment};
use super::terrain::TerrainSegment;
use super::tick::TickInput;
use crate::error::SimError;
use crate::settings::{PhysicsParams, WheelLayout};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: DVec2,
    pub vel: DVec2,
    radius: f64,
}

impl Body {
    /// A wheel at rest; the radius must be positive and finite
    pub fn new(x: f64, y: f64, radius: f64) -> Result<Self, SimError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::InvalidRadius(radius));
        }
        if !(x.is_finite() && y.is_finite()) {
            return Err(SimError::InvalidConfig(format!("body position ({x}, {y}) must be finite")));
        }
        Ok(Self {
            pos: DVec2::new(x, y),
            vel: DVec2::ZERO,
            radius,
        })
    }

    pub fn from_layout(layout: &WheelLayout) -> Result<Self, SimError> {
        Self::new(layout.x, layout.y, layout.radius)
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vel = DVec2::new(vx, vy);
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }

    /// Free motion for one tick: move, then gravity and air drag
    pub fn integrate(&mut self, params: &PhysicsParams) {
        self.pos.x += self.vel.x;
        self.pos.y -= self.vel.y;
        self.vel.y -= params.gravity;
        self.vel *= params.air_drag;
    }

    /// Resolve against every segment in order; later segments see the state
    /// left by earlier ones
    pub fn resolve_terrain_collision<'a>(
        &mut self,
        segments: impl IntoIterator<Item = &'a TerrainSegment>,
        input: &TickInput,
        params: &PhysicsParams,
    ) -> ContactSummary {
        let mut summary = ContactSummary::default();
        for segment in segments {
            let result = resolve_segment(&mut self.pos, &mut self.vel, self.radius, segment, input, params);
            summary.record(&result);
        }
        summary
    }
}
