//! Single simulation step
//!
//! `advance` is a logical unit step, not a Δt integrator: every constant in
//! `SimConfig` is per call.

use super::state::World;
use super::terrain::UniformSource;

/// Drive intent for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub accelerating: bool,
    pub braking: bool,
}

impl TickInput {
    pub fn new(accelerating: bool, braking: bool) -> Self {
        Self { accelerating, braking }
    }
}

/// What happened during one `advance`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Terrain segments appended this tick
    pub emitted: usize,
    /// Terrain segments dropped from the front this tick
    pub evicted: usize,
    /// Body/segment contacts resolved
    pub contacts: u32,
    /// Contacts whose depenetration ran out of budget
    pub abandoned: u32,
}

impl<S: UniformSource> World<S> {
    /// Advance the world by one tick
    ///
    /// Order: viewpoint, terrain extension, per-body integrate and collide,
    /// then couplings.
    pub fn advance(&mut self, input: &TickInput) -> TickReport {
        self.viewpoint = self.compute_viewpoint();

        let (emitted, evicted) =
            self.terrain
                .extend_if_needed(self.viewpoint.x, self.config.terrain.extension, &mut self.source);

        let mut report = TickReport {
            emitted,
            evicted,
            ..Default::default()
        };

        let physics = self.config.physics;
        for body in &mut self.bodies {
            body.integrate(&physics);
            let summary = body.resolve_terrain_collision(self.terrain.segments(), input, &physics);
            report.contacts += summary.contacts;
            report.abandoned += summary.abandoned;
        }

        for coupling in &self.couplings {
            coupling.apply(&mut self.bodies);
        }

        self.time_ticks += 1;
        report
    }
}
