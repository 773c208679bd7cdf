//! A playable session on top of the world: fuel, pickups, nitro, flips and
//! scoring
//!
//! The world stays a pure physics core. `Run` filters the player's intent
//! (no drive without fuel or during nitro), adds chassis torque and nitro
//! thrust around `World::advance`, and keeps the session bookkeeping.

use std::f64::consts::{FRAC_PI_3, TAU};

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::chassis::{FlipDirection, FlipTracker, apply_tilt_torque, is_upside_down, tilt_angle};
use super::state::World;
use super::terrain::UniformSource;
use super::tick::{TickInput, TickReport};
use crate::error::SimError;
use crate::settings::{RunConfig, SimConfig};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Driving,
    /// Car stayed upside down too long; terminal
    Toppled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Fuel,
    Coin,
}

/// A collectible placed above the ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: DVec2,
}

/// Events emitted by `Run::advance` (for audio/HUD collaborators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    FuelCollected,
    CoinCollected,
    NitroStarted,
    NitroEnded,
    OutOfFuel,
    Flipped(FlipDirection),
    Toppled,
}

#[derive(Debug, Clone, Copy, Default)]
struct Nitro {
    active: bool,
    ends_at: u64,
    ready_at: u64,
    dir: DVec2,
    ceiling_y: f64,
}

/// One game session
#[derive(Debug, Clone)]
pub struct Run<S: UniformSource = Pcg32> {
    config: RunConfig,
    world: World<S>,
    /// Pickup placement draws, separate from the terrain stream
    rng: Pcg32,
    phase: RunPhase,
    fuel: f64,
    nitro: Nitro,
    effective_input: TickInput,
    pickups: Vec<Pickup>,
    last_fuel_x: i32,
    last_coin_x: i32,
    next_coin_spacing: f64,
    coins: u32,
    flips: FlipTracker,
    upside_down_ticks: u64,
    start_x: f64,
    best_x: f64,
    score: u64,
}

impl Run<Pcg32> {
    /// Reference car on seeded terrain with seeded pickup placement
    pub fn seeded(sim: SimConfig, config: RunConfig, seed: u64) -> Result<Self, SimError> {
        let world = World::seeded(sim, seed)?;
        Self::new(world, config, seed.rotate_left(32) ^ 0x5eed)
    }
}

impl<S: UniformSource> Run<S> {
    /// Wrap a world whose bodies 0 and 1 are the rear and front wheels
    pub fn new(world: World<S>, config: RunConfig, pickup_seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        if world.bodies().len() < 2 {
            return Err(SimError::InvalidConfig(format!(
                "a run needs a rear and a front wheel, world has {} bodies",
                world.bodies().len()
            )));
        }

        let mut rng = Pcg32::seed_from_u64(pickup_seed);
        let next_coin_spacing = coin_spacing(&config, rng.next_unit());
        let terrain_end = world.generator().last_x();
        let start_x = world.mean_position().unwrap_or_default().x;

        log::info!("Run started at x={start_x:.0}, fuel {:.2}", config.fuel_max);
        Ok(Self {
            fuel: config.fuel_max,
            config,
            world,
            rng,
            phase: RunPhase::Driving,
            nitro: Nitro::default(),
            effective_input: TickInput::default(),
            pickups: Vec::new(),
            last_fuel_x: terrain_end,
            last_coin_x: terrain_end,
            next_coin_spacing,
            coins: 0,
            flips: FlipTracker::new(),
            upside_down_ticks: 0,
            start_x,
            best_x: start_x,
            score: 0,
        })
    }

    /// Advance one tick with the player's raw intent
    pub fn advance(&mut self, input: &TickInput) -> Vec<RunEvent> {
        let mut events = Vec::new();
        if self.phase == RunPhase::Toppled {
            return events;
        }

        self.update_nitro(input, &mut events);

        let can_drive = self.fuel > 0.0 && !self.nitro.active;
        let drive = TickInput::new(can_drive && input.accelerating, can_drive && input.braking);
        self.effective_input = drive;

        let torque = self.config.tilt_torque;
        if let [rear, front, ..] = self.world.bodies_mut() {
            apply_tilt_torque(rear, front, &drive, torque);
        }

        let report = self.world.advance(&drive);

        if self.nitro.active {
            self.apply_nitro_thrust();
        }
        self.burn_fuel(input, &mut events);
        self.clamp_to_terrain_start();
        self.place_pickups(&report);
        self.collect_pickups(&mut events);
        self.track_orientation(&mut events);
        self.update_score();

        events
    }

    fn update_nitro(&mut self, input: &TickInput, events: &mut Vec<RunEvent>) {
        let now = self.world.time_ticks();
        let both = input.accelerating && input.braking;

        if !self.nitro.active {
            if both && self.fuel > 0.0 && now >= self.nitro.ready_at {
                let mean = self.world.mean_position().unwrap_or_default();
                let terrain = self.world.terrain();
                let ground_angle = terrain.segment_at(mean.x).map(|s| s.tangent_angle()).unwrap_or(0.0);
                // Ceiling measured from the car or the ground, whichever is higher
                let base_y = terrain.height_at(mean.x).unwrap_or(mean.y).min(mean.y);
                let launch = ground_angle + FRAC_PI_3;

                self.nitro = Nitro {
                    active: true,
                    ends_at: now + self.config.ticks(self.config.nitro_duration_secs),
                    ready_at: self.nitro.ready_at,
                    dir: DVec2::new(launch.cos(), launch.sin()),
                    ceiling_y: base_y - self.config.nitro_max_altitude,
                };
                log::info!("Nitro engaged at x={:.0}, launch angle {:.2} rad", mean.x, launch);
                events.push(RunEvent::NitroStarted);
            }
        } else if !both || self.fuel <= 0.0 || now >= self.nitro.ends_at {
            self.nitro.active = false;
            self.nitro.ready_at = now + self.config.ticks(self.config.nitro_cooldown_secs);
            log::info!("Nitro spent, ready again at tick {}", self.nitro.ready_at);
            events.push(RunEvent::NitroEnded);
        }
    }

    fn apply_nitro_thrust(&mut self) {
        let thrust = self.nitro.dir * self.config.nitro_thrust;
        let ceiling = self.nitro.ceiling_y;
        for body in self.world.bodies_mut() {
            body.vel += thrust;
            if body.pos.y < ceiling {
                body.pos.y = ceiling;
                body.vel.y = body.vel.y.min(0.0);
            }
        }
    }

    fn burn_fuel(&mut self, input: &TickInput, events: &mut Vec<RunEvent>) {
        if self.fuel <= 0.0 {
            return;
        }
        let cfg = &self.config;
        let base = cfg.per_tick(cfg.fuel_burn_per_sec);
        let extra = if input.accelerating {
            self.mean_velocity().x.max(0.0) * cfg.per_tick(cfg.fuel_burn_per_speed)
        } else {
            0.0
        };
        let multiplier = if self.nitro.active { cfg.nitro_burn_multiplier } else { 1.0 };

        self.fuel = (self.fuel - multiplier * (base + extra)).max(0.0);
        if self.fuel == 0.0 {
            log::info!("Out of fuel at x={:.0}", self.best_x);
            events.push(RunEvent::OutOfFuel);
        }
    }

    /// Nothing may roll off the evicted end of the world
    fn clamp_to_terrain_start(&mut self) {
        let Some(min_x) = self.world.terrain().leftmost_x() else {
            return;
        };
        let min_x = min_x as f64;
        for body in self.world.bodies_mut() {
            if body.pos.x < min_x {
                body.pos.x = min_x;
                body.vel.x = 0.0;
            }
        }
    }

    fn place_pickups(&mut self, report: &TickReport) {
        if report.emitted == 0 {
            return;
        }
        self.place_fuel();
        self.place_coins();

        // Pickups behind the terrain window can never be reached again
        if let Some(min_x) = self.world.terrain().leftmost_x() {
            self.pickups.retain(|p| p.pos.x >= min_x as f64);
        }
    }

    fn fuel_spacing(&self) -> f64 {
        let cfg = &self.config;
        let difficulty = self.world.generator().difficulty();
        (cfg.fuel_spacing_base + cfg.fuel_spacing_per_difficulty * difficulty).max(cfg.fuel_spacing_min)
    }

    fn place_fuel(&mut self) {
        let generator = self.world.generator();
        let (end_x, end_y) = (generator.last_x(), generator.last_y());
        if ((end_x - self.last_fuel_x) as f64) < self.fuel_spacing() {
            return;
        }
        let pos = DVec2::new(end_x as f64, end_y as f64 - self.config.fuel_floor_offset);
        log::debug!("Placed fuel can at ({:.0}, {:.0})", pos.x, pos.y);
        self.pickups.push(Pickup {
            kind: PickupKind::Fuel,
            pos,
        });
        self.last_fuel_x = end_x;
    }

    /// A group of coins along a sine arc ending at the newest terrain
    fn place_coins(&mut self) {
        let end_x = self.world.generator().last_x();
        if ((end_x - self.last_coin_x) as f64) < self.next_coin_spacing {
            return;
        }
        let Some(left_x) = self.world.terrain().leftmost_x() else {
            return;
        };

        let cfg = &self.config;
        let span = cfg.coin_group_max - cfg.coin_group_min + 1;
        let mut count = (cfg.coin_group_min + (self.rng.next_unit() * span as f64) as u32).min(cfg.coin_group_max);
        let phase = self.rng.next_unit() * TAU;

        let end = end_x as f64;
        let left_clamp = left_x as f64 + cfg.coin_step;
        let fits = 1 + ((end - left_clamp) / cfg.coin_step).floor().max(0.0) as u32;
        count = count.min(fits);
        if count < 2 {
            return;
        }
        let start = end - (count - 1) as f64 * cfg.coin_step;

        let terrain = self.world.terrain();
        let mut placed = 0;
        for i in 0..count {
            let x = start + i as f64 * cfg.coin_step;
            let Some(ground) = terrain.height_at(x) else {
                continue;
            };
            let arc = (phase + i as f64 * 0.55).sin() * cfg.coin_arc_amplitude;
            self.pickups.push(Pickup {
                kind: PickupKind::Coin,
                pos: DVec2::new(x, ground - cfg.coin_floor_offset - arc),
            });
            placed += 1;
        }
        log::debug!("Placed {placed} coins ending at x={end_x}");

        self.last_coin_x = end_x;
        self.next_coin_spacing = coin_spacing(&self.config, self.rng.next_unit());
    }

    fn collect_pickups(&mut self, events: &mut Vec<RunEvent>) {
        let bodies = self.world.bodies();
        let cfg = &self.config;
        let mut fuel_taken = false;
        let mut coins_taken = 0;

        self.pickups.retain(|pickup| {
            let radius = match pickup.kind {
                PickupKind::Fuel => cfg.fuel_pickup_radius,
                PickupKind::Coin => cfg.coin_pickup_radius,
            };
            let reached = bodies.iter().any(|b| b.pos.distance_squared(pickup.pos) <= radius * radius);
            if reached {
                match pickup.kind {
                    PickupKind::Fuel => fuel_taken = true,
                    PickupKind::Coin => coins_taken += 1,
                }
            }
            !reached
        });

        if fuel_taken {
            self.fuel = cfg.fuel_max;
            log::info!("Fuel collected, tank refilled");
            events.push(RunEvent::FuelCollected);
        }
        for _ in 0..coins_taken {
            events.push(RunEvent::CoinCollected);
        }
        self.coins += coins_taken;
    }

    fn track_orientation(&mut self, events: &mut Vec<RunEvent>) {
        let angle = match self.world.bodies() {
            [rear, front, ..] => tilt_angle(rear, front),
            _ => return,
        };

        if let Some(direction) = self.flips.update(angle) {
            self.coins += self.config.coins_per_flip;
            log::info!("Flip ({direction:?}), {} total", self.flips.total());
            events.push(RunEvent::Flipped(direction));
        }

        if is_upside_down(angle, self.config.topple_angle) {
            self.upside_down_ticks += 1;
            if self.upside_down_ticks >= self.config.ticks(self.config.topple_grace_secs) {
                self.phase = RunPhase::Toppled;
                log::info!(
                    "Toppled at x={:.0} after {} ticks, score {}",
                    self.best_x,
                    self.world.time_ticks(),
                    self.score
                );
                events.push(RunEvent::Toppled);
            }
        } else {
            self.upside_down_ticks = 0;
        }
    }

    fn update_score(&mut self) {
        if let Some(mean) = self.world.mean_position() {
            self.best_x = self.best_x.max(mean.x);
        }
        let distance_points = (self.distance() / self.config.distance_unit).floor() as u64;
        self.score = distance_points + self.coins as u64 * self.config.score_per_coin;
    }

    fn mean_velocity(&self) -> DVec2 {
        let bodies = self.world.bodies();
        if bodies.is_empty() {
            return DVec2::ZERO;
        }
        bodies.iter().map(|b| b.vel).sum::<DVec2>() / bodies.len() as f64
    }

    pub fn world(&self) -> &World<S> {
        &self.world
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::Toppled
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    /// Fuel as a fraction of a full tank
    pub fn fuel_fraction(&self) -> f64 {
        (self.fuel / self.config.fuel_max).clamp(0.0, 1.0)
    }

    pub fn nitro_active(&self) -> bool {
        self.nitro.active
    }

    /// Seconds left on the running nitro, or on its cooldown
    pub fn nitro_seconds_left(&self) -> f64 {
        let now = self.world.time_ticks();
        let until = if self.nitro.active { self.nitro.ends_at } else { self.nitro.ready_at };
        until.saturating_sub(now) as f64 / self.config.ticks_per_second
    }

    /// Intent actually handed to the world on the last tick
    pub fn effective_input(&self) -> TickInput {
        self.effective_input
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn flips(&self) -> &FlipTracker {
        &self.flips
    }

    /// Farthest progress of the car's mean x from its start
    pub fn distance(&self) -> f64 {
        (self.best_x - self.start_x).max(0.0)
    }

    pub fn score(&self) -> u64 {
        self.score
    }
}

fn coin_spacing(config: &RunConfig, r: f64) -> f64 {
    (config.coin_spacing_base + config.coin_spacing_jitter * r).max(config.coin_spacing_min)
}
