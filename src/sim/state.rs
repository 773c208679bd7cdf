//! World state: terrain window, bodies, couplings and the tracked viewpoint
//!
//! The world is built once and then mutated only by `advance` (see `tick.rs`).
//! Everything else here is construction and read access between ticks.

use std::collections::vec_deque;

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::Body;
use super::coupling::Coupling;
use super::terrain::{TerrainGenerator, TerrainSegment, TerrainWindow, UniformSource};
use crate::error::SimError;
use crate::settings::SimConfig;

/// Complete simulation world
#[derive(Debug, Clone)]
pub struct World<S: UniformSource = Pcg32> {
    pub(super) config: SimConfig,
    pub(super) terrain: TerrainWindow,
    pub(super) bodies: Vec<Body>,
    pub(super) couplings: Vec<Coupling>,
    /// Camera offset `(camX, camY)` recomputed every tick
    pub(super) viewpoint: DVec2,
    pub(super) source: S,
    pub(super) time_ticks: u64,
}

impl World<Pcg32> {
    /// The reference two-wheel car on terrain drawn from a seeded PCG stream
    pub fn seeded(config: SimConfig, seed: u64) -> Result<Self, SimError> {
        Self::with_car(config, Pcg32::seed_from_u64(seed))
    }
}

impl<S: UniformSource> World<S> {
    /// Build a world from explicit bodies and `(a, b)` coupling index pairs
    ///
    /// Rest distances are captured from the bodies' starting positions.
    pub fn new(config: SimConfig, bodies: Vec<Body>, couplings: &[(usize, usize)], mut source: S) -> Result<Self, SimError> {
        config.validate()?;

        let terrain = TerrainWindow::seeded(&config.terrain, &mut source);
        let mut world = Self {
            config,
            terrain,
            bodies,
            couplings: Vec::with_capacity(couplings.len()),
            viewpoint: DVec2::ZERO,
            source,
            time_ticks: 0,
        };
        for &(a, b) in couplings {
            world.attach(a, b)?;
        }
        world.viewpoint = world.compute_viewpoint();

        log::info!(
            "World ready: {} bodies, {} couplings, {} terrain segments",
            world.bodies.len(),
            world.couplings.len(),
            world.terrain.len()
        );
        Ok(world)
    }

    /// Rear and front wheels from the config's car layout, coupled together
    pub fn with_car(config: SimConfig, source: S) -> Result<Self, SimError> {
        let bodies = vec![
            Body::from_layout(&config.car.rear)?,
            Body::from_layout(&config.car.front)?,
        ];
        Self::new(config, bodies, &[(0, 1)], source)
    }

    /// Add a body after construction; returns its index
    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Couple two bodies at their current distance; returns the coupling index
    pub fn attach(&mut self, a: usize, b: usize) -> Result<usize, SimError> {
        let coupling = Coupling::between(&self.bodies, a, b, &self.config.coupling)?;
        self.couplings.push(coupling);
        Ok(self.couplings.len() - 1)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> Result<&Body, SimError> {
        self.bodies.get(index).ok_or(SimError::UnknownBody {
            index,
            len: self.bodies.len(),
        })
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn couplings(&self) -> &[Coupling] {
        &self.couplings
    }

    /// Active segments, oldest first
    pub fn active_terrain(&self) -> vec_deque::Iter<'_, TerrainSegment> {
        self.terrain.segments()
    }

    pub fn terrain(&self) -> &TerrainWindow {
        &self.terrain
    }

    pub fn generator(&self) -> &TerrainGenerator {
        self.terrain.generator()
    }

    /// Camera offset `(camX, camY)` as of the last tick
    pub fn viewpoint(&self) -> DVec2 {
        self.viewpoint
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Mean body position, `None` without bodies
    pub fn mean_position(&self) -> Option<DVec2> {
        if self.bodies.is_empty() {
            return None;
        }
        let sum: DVec2 = self.bodies.iter().map(|b| b.pos).sum();
        Some(sum / self.bodies.len() as f64)
    }

    /// `camX` trails the mean x by the lead margin; `camY` centres the mean y
    /// vertically
    pub(super) fn compute_viewpoint(&self) -> DVec2 {
        let mean = self.mean_position().unwrap_or(DVec2::ZERO);
        DVec2::new(
            mean.x - self.config.camera.lead_margin,
            -mean.y + self.config.terrain.viewport_height as f64 / 2.0,
        )
    }
}
