//! Spring-damper chassis links between pairs of bodies
//!
//! Bodies are unit masses, so forces go straight into velocity. The x
//! component of the spring direction is negated relative to y to match the
//! up-positive velocity axis; the pair always receives equal and opposite
//! changes.

use glam::DVec2;

use super::body::Body;
use crate::error::SimError;
use crate::settings::CouplingParams;

/// Link between bodies `a` and `b` (indices into the world's body list)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    a: usize,
    b: usize,
    rest_distance: f64,
    spring_constant: f64,
    damping_factor: f64,
}

impl Coupling {
    /// Capture the current distance between the two bodies as the rest length
    pub fn between(bodies: &[Body], a: usize, b: usize, params: &CouplingParams) -> Result<Self, SimError> {
        if a == b {
            return Err(SimError::SelfCoupling(a));
        }
        let len = bodies.len();
        let body_a = bodies.get(a).ok_or(SimError::UnknownBody { index: a, len })?;
        let body_b = bodies.get(b).ok_or(SimError::UnknownBody { index: b, len })?;
        Ok(Self {
            a,
            b,
            rest_distance: body_a.pos.distance(body_b.pos),
            spring_constant: params.spring_constant,
            damping_factor: params.damping_factor,
        })
    }

    pub fn a(&self) -> usize {
        self.a
    }

    pub fn b(&self) -> usize {
        self.b
    }

    pub fn rest_distance(&self) -> f64 {
        self.rest_distance
    }

    /// Net force (spring minus damping) the link applies to `b`; `a` gets
    /// the negation. `None` when the bodies coincide.
    pub fn force(&self, this: &Body, other: &Body) -> Option<DVec2> {
        let delta = other.pos - this.pos;
        let dist = delta.length();
        if dist == 0.0 {
            return None;
        }

        let spring = (dist - self.rest_distance) * self.spring_constant;
        let unit = DVec2::new(-delta.x / dist, delta.y / dist);
        let damping = (other.vel - this.vel) * self.damping_factor;
        Some(unit * spring - damping)
    }

    /// Apply one tick of spring-damper force and return what `b` received
    pub fn apply(&self, bodies: &mut [Body]) -> Option<DVec2> {
        let (this, other) = (*bodies.get(self.a)?, *bodies.get(self.b)?);
        let force = self.force(&this, &other)?;
        bodies[self.a].vel -= force;
        bodies[self.b].vel += force;
        Some(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair(ax: f64, ay: f64, bx: f64, by: f64) -> Vec<Body> {
        vec![Body::new(ax, ay, 20.0).unwrap(), Body::new(bx, by, 20.0).unwrap()]
    }

    #[test]
    fn test_rest_distance_captured_at_attach() {
        let bodies = pair(100.0, 300.0, 200.0, 300.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        assert_eq!(coupling.rest_distance(), 100.0);
    }

    #[test]
    fn test_bad_indices_rejected() {
        let bodies = pair(0.0, 0.0, 10.0, 0.0);
        let params = CouplingParams::default();
        assert_eq!(Coupling::between(&bodies, 1, 1, &params), Err(SimError::SelfCoupling(1)));
        assert_eq!(
            Coupling::between(&bodies, 0, 5, &params),
            Err(SimError::UnknownBody { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_no_force_at_rest_length() {
        let mut bodies = pair(100.0, 300.0, 200.0, 300.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        let force = coupling.apply(&mut bodies).unwrap();
        assert_eq!(force, DVec2::ZERO);
        assert_eq!(bodies[0].vel, DVec2::ZERO);
    }

    #[test]
    fn test_stretched_spring_pulls_together() {
        let mut bodies = pair(100.0, 300.0, 200.0, 300.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        bodies[1].pos.x = 250.0;
        coupling.apply(&mut bodies);
        assert!(bodies[0].vel.x > 0.0);
        assert!(bodies[1].vel.x < 0.0);
        assert!((bodies[0].vel.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_stretch_pulls_together() {
        // b sits below a; stretching should move a down (vy < 0) and b up
        let mut bodies = pair(0.0, 0.0, 0.0, 100.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        bodies[1].pos.y = 150.0;
        coupling.apply(&mut bodies);
        assert!(bodies[0].vel.y < 0.0);
        assert!(bodies[1].vel.y > 0.0);
    }

    #[test]
    fn test_coincident_bodies_skipped() {
        let mut bodies = pair(0.0, 0.0, 10.0, 0.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        bodies[1].pos = bodies[0].pos;
        bodies[1].vel = DVec2::new(3.0, 0.0);
        assert_eq!(coupling.apply(&mut bodies), None);
        assert_eq!(bodies[0].vel, DVec2::ZERO);
    }

    #[test]
    fn test_damping_matches_velocities() {
        let mut bodies = pair(0.0, 0.0, 100.0, 0.0);
        let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
        bodies[1].vel = DVec2::new(2.0, 0.0);
        coupling.apply(&mut bodies);
        assert!((bodies[0].vel.x - 0.1).abs() < 1e-12);
        assert!((bodies[1].vel.x - 1.9).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_forces_equal_and_opposite(
            bx in 20.0f64..300.0,
            by in -200.0f64..200.0,
            stretch in -50.0f64..50.0,
            va in (-5.0f64..5.0, -5.0f64..5.0),
            vb in (-5.0f64..5.0, -5.0f64..5.0),
        ) {
            let mut bodies = pair(0.0, 0.0, bx, by);
            let coupling = Coupling::between(&bodies, 0, 1, &CouplingParams::default()).unwrap();
            bodies[1].pos.x += stretch;
            bodies[0].vel = DVec2::new(va.0, va.1);
            bodies[1].vel = DVec2::new(vb.0, vb.1);
            let before = [bodies[0].vel, bodies[1].vel];

            if let Some(force) = coupling.apply(&mut bodies) {
                let da = bodies[0].vel - before[0];
                let db = bodies[1].vel - before[1];
                prop_assert!((da + force).length() < 1e-9);
                prop_assert!((db - force).length() < 1e-9);
                prop_assert!((da + db).length() < 1e-9);
            }
        }
    }
}
