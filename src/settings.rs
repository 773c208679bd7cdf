//! Simulation tuning and level presets
//!
//! Every number the core reads lives in one `SimConfig` value handed to
//! `World` construction, so tests can vary them deterministically. Defaults
//! reproduce the reference constants in `crate::consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// How far terrain generation may run ahead in a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExtensionPolicy {
    /// At most one segment per tick, even if the viewpoint jumped further
    #[default]
    OnePerTick,
    /// Emit until the farthest marker catches up with the viewpoint
    CatchUp,
}

/// Level presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LevelPreset {
    /// Reference physics
    #[default]
    Classic,
    Meadow,
    Desert,
    Tundra,
    Lunar,
    Martian,
    Nightlife,
}

/// Per-level numbers, in the order the level table lists them
struct LevelTuning {
    gravity: f64,
    air_resistance: f64,
    friction: f64,
    traction: f64,
    max_slope: f64,
    initial_difficulty: f64,
    difficulty_increment: f64,
    irregularity: f64,
}

impl LevelPreset {
    pub const ALL: [LevelPreset; 7] = [
        LevelPreset::Classic,
        LevelPreset::Meadow,
        LevelPreset::Desert,
        LevelPreset::Tundra,
        LevelPreset::Lunar,
        LevelPreset::Martian,
        LevelPreset::Nightlife,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelPreset::Classic => "Classic",
            LevelPreset::Meadow => "Meadow",
            LevelPreset::Desert => "Desert",
            LevelPreset::Tundra => "Tundra",
            LevelPreset::Lunar => "Lunar",
            LevelPreset::Martian => "Martian",
            LevelPreset::Nightlife => "Nightlife",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Some(LevelPreset::Classic),
            "meadow" => Some(LevelPreset::Meadow),
            "desert" => Some(LevelPreset::Desert),
            "tundra" => Some(LevelPreset::Tundra),
            "lunar" | "moon" => Some(LevelPreset::Lunar),
            "martian" | "mars" => Some(LevelPreset::Martian),
            "nightlife" | "night" => Some(LevelPreset::Nightlife),
            _ => None,
        }
    }

    fn tuning(&self) -> Option<LevelTuning> {
        let t = |gravity, air_resistance, friction, traction, max_slope, initial_difficulty, difficulty_increment, irregularity| LevelTuning {
            gravity,
            air_resistance,
            friction,
            traction,
            max_slope,
            initial_difficulty,
            difficulty_increment,
            irregularity,
        };
        match self {
            LevelPreset::Classic => None,
            LevelPreset::Meadow => Some(t(0.08, 0.0005, 0.003, 1.0, 1.0, 0.005, 0.0001, 0.01)),
            LevelPreset::Desert => Some(t(0.08, 0.0003, 0.03, 1.25, 1.5, 0.005, 0.0002, 0.001)),
            LevelPreset::Tundra => Some(t(0.08, 0.0007, 0.0001, 0.5, 0.8, 0.008, 0.0001, 0.01)),
            LevelPreset::Lunar => Some(t(0.04, 0.00001, 0.001, 0.5, 2.0, 0.01, 0.0003, 0.05)),
            LevelPreset::Martian => Some(t(0.06, 0.00005, 0.03, 0.75, 1.5, 0.008, 0.0002, 0.02)),
            LevelPreset::Nightlife => Some(t(0.08, 0.0007, 0.005, 1.5, 0.5, 0.001, 0.0001, 0.05)),
        }
    }
}

/// Free-body and ground-contact tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub gravity: f64,
    pub air_drag: f64,
    pub friction: f64,
    pub max_velocity: f64,
    pub drive_accel: f64,
    pub brake_decel: f64,
    pub depenetration_step: f64,
    pub max_depenetration_steps: u32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            air_drag: AIR_DRAG,
            friction: GROUND_FRICTION,
            max_velocity: MAX_VELOCITY,
            drive_accel: DRIVE_ACCEL,
            brake_decel: BRAKE_DECEL,
            depenetration_step: DEPENETRATION_STEP,
            max_depenetration_steps: MAX_DEPENETRATION_STEPS,
        }
    }
}

/// Spring-damper tuning shared by every coupling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingParams {
    pub spring_constant: f64,
    pub damping_factor: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            spring_constant: SPRING_CONSTANT,
            damping_factor: DAMPING_FACTOR,
        }
    }
}

/// Terrain walk and streaming window tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub step: i32,
    pub irregularity: f64,
    pub initial_difficulty: f64,
    pub difficulty_increment: f64,
    pub max_slope: f64,
    pub viewport_width: i32,
    pub viewport_height: i32,
    /// Window keeps this many viewport widths of segments
    pub window_widths: usize,
    pub extension: ExtensionPolicy,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            step: TERRAIN_STEP,
            irregularity: IRREGULARITY,
            initial_difficulty: INITIAL_DIFFICULTY,
            difficulty_increment: DIFFICULTY_INCREMENT,
            max_slope: MAX_SLOPE,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            window_widths: WINDOW_WIDTHS,
            extension: ExtensionPolicy::OnePerTick,
        }
    }
}

/// Largest accepted viewport side, in world units
pub const MAX_VIEWPORT_EXTENT: i32 = 1 << 16;
/// Largest accepted terrain window, in segments
pub const MAX_WINDOW_SEGMENTS: usize = 1 << 16;

impl TerrainParams {
    /// Segments spanning `window_widths` viewports, `None` on overflow
    pub fn window_segments(&self) -> Option<usize> {
        let per_width = (self.viewport_width / self.step.max(1)).max(1) as usize;
        per_width.checked_mul(self.window_widths)
    }

    /// Segment count above which the oldest segment is evicted
    pub fn eviction_threshold(&self) -> usize {
        self.window_segments().unwrap_or(usize::MAX)
    }
}

/// Viewpoint offsets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub lead_margin: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            lead_margin: CAMERA_LEAD,
        }
    }
}

/// One wheel of the initial car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelLayout {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl From<(f64, f64, f64)> for WheelLayout {
    fn from((x, y, radius): (f64, f64, f64)) -> Self {
        Self { x, y, radius }
    }
}

/// Initial car: two wheels coupled at their starting distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarLayout {
    pub rear: WheelLayout,
    pub front: WheelLayout,
}

impl Default for CarLayout {
    fn default() -> Self {
        Self {
            rear: REAR_WHEEL.into(),
            front: FRONT_WHEEL.into(),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub level: LevelPreset,
    pub physics: PhysicsParams,
    pub coupling: CouplingParams,
    pub terrain: TerrainParams,
    pub camera: CameraParams,
    pub car: CarLayout,
}

impl SimConfig {
    /// Create a config from a level preset (applies preset tuning)
    pub fn from_preset(preset: LevelPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a level preset. `Classic` restores the reference tuning.
    pub fn apply_preset(&mut self, preset: LevelPreset) {
        self.level = preset;

        let Some(level) = preset.tuning() else {
            self.physics = PhysicsParams::default();
            self.coupling = CouplingParams::default();
            let extension = self.terrain.extension;
            self.terrain = TerrainParams {
                viewport_width: self.terrain.viewport_width,
                viewport_height: self.terrain.viewport_height,
                extension,
                ..TerrainParams::default()
            };
            return;
        };

        // Level physics pairs with the stiffer, faster car from the level builds
        self.physics.gravity = level.gravity;
        self.physics.air_drag = 1.0 - level.air_resistance;
        self.physics.friction = 1.0 - level.friction;
        self.physics.max_velocity = 30.0;
        self.physics.drive_accel = 0.3 * level.traction;
        self.physics.brake_decel = 0.3 * level.traction;
        self.coupling.spring_constant = 0.12;
        self.coupling.damping_factor = 0.03;

        self.terrain.max_slope = level.max_slope;
        self.terrain.initial_difficulty = level.initial_difficulty;
        self.terrain.difficulty_increment = level.difficulty_increment;
        self.terrain.irregularity = level.irregularity;
    }

    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file, then parse and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SimError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fail fast on values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let p = &self.physics;
        check(p.gravity.is_finite() && p.gravity >= 0.0, "gravity must be finite and >= 0")?;
        check(in_unit_range(p.air_drag), "air_drag must be in (0, 1]")?;
        check(in_unit_range(p.friction), "friction must be in (0, 1]")?;
        check(p.max_velocity.is_finite() && p.max_velocity > 0.0, "max_velocity must be > 0")?;
        check(p.drive_accel.is_finite() && p.drive_accel >= 0.0, "drive_accel must be >= 0")?;
        check(p.brake_decel.is_finite() && p.brake_decel >= 0.0, "brake_decel must be >= 0")?;
        check(
            p.depenetration_step.is_finite() && p.depenetration_step > 0.0,
            "depenetration_step must be > 0",
        )?;
        check(p.max_depenetration_steps > 0, "max_depenetration_steps must be > 0")?;

        let c = &self.coupling;
        check(
            c.spring_constant.is_finite() && c.spring_constant >= 0.0,
            "spring_constant must be >= 0",
        )?;
        check(
            c.damping_factor.is_finite() && c.damping_factor >= 0.0,
            "damping_factor must be >= 0",
        )?;

        let t = &self.terrain;
        check(t.step > 0, "terrain step must be > 0")?;
        check(t.viewport_height > 0, "viewport_height must be > 0")?;
        check(t.viewport_width >= t.step, "viewport_width must span at least one step")?;
        check(
            t.viewport_width <= MAX_VIEWPORT_EXTENT && t.viewport_height <= MAX_VIEWPORT_EXTENT,
            "viewport sides must be at most 65536",
        )?;
        check(t.window_widths > 0, "window_widths must be > 0")?;
        check(
            t.window_segments().is_some_and(|n| n <= MAX_WINDOW_SEGMENTS),
            "terrain window must hold at most 65536 segments",
        )?;
        check(t.max_slope.is_finite() && t.max_slope > 0.0, "max_slope must be > 0")?;
        check(t.irregularity.is_finite() && t.irregularity >= 0.0, "irregularity must be >= 0")?;
        check(
            t.initial_difficulty.is_finite() && t.initial_difficulty >= 0.0,
            "initial_difficulty must be >= 0",
        )?;
        check(
            t.difficulty_increment.is_finite() && t.difficulty_increment >= 0.0,
            "difficulty_increment must be >= 0 (difficulty never decreases)",
        )?;

        check(self.camera.lead_margin.is_finite(), "camera lead_margin must be finite")?;

        for wheel in [&self.car.rear, &self.car.front] {
            if !(wheel.radius.is_finite() && wheel.radius > 0.0) {
                return Err(SimError::InvalidRadius(wheel.radius));
            }
            check(
                wheel.x.is_finite() && wheel.y.is_finite(),
                "car wheel position must be finite",
            )?;
        }
        Ok(())
    }
}

fn in_unit_range(v: f64) -> bool {
    v > 0.0 && v <= 1.0
}

fn check(ok: bool, msg: &str) -> Result<(), SimError> {
    if ok {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(msg.to_string()))
    }
}

/// Session-layer tuning (fuel, pickups, nitro, scoring)
///
/// Durations and burn rates are per second and converted with
/// `ticks_per_second`; distances are world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks_per_second: f64,
    /// Vertical velocity traded between the wheels while driving; kept
    /// below gravity so a grounded nose is not lifted by torque alone
    pub tilt_torque: f64,

    // === Fuel ===
    pub fuel_max: f64,
    pub fuel_burn_per_sec: f64,
    pub fuel_burn_per_speed: f64,
    pub fuel_spacing_base: f64,
    pub fuel_spacing_per_difficulty: f64,
    pub fuel_spacing_min: f64,
    pub fuel_pickup_radius: f64,
    pub fuel_floor_offset: f64,

    // === Coins ===
    pub coin_spacing_base: f64,
    pub coin_spacing_jitter: f64,
    pub coin_spacing_min: f64,
    pub coin_group_min: u32,
    pub coin_group_max: u32,
    pub coin_step: f64,
    pub coin_arc_amplitude: f64,
    pub coin_pickup_radius: f64,
    pub coin_floor_offset: f64,

    // === Nitro ===
    pub nitro_thrust: f64,
    pub nitro_duration_secs: f64,
    pub nitro_cooldown_secs: f64,
    pub nitro_burn_multiplier: f64,
    /// Highest the car may climb above the ground it launched from
    pub nitro_max_altitude: f64,

    // === Toppling & scoring ===
    pub topple_angle: f64,
    pub topple_grace_secs: f64,
    pub distance_unit: f64,
    pub score_per_coin: u64,
    pub coins_per_flip: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: REFERENCE_TICKS_PER_SECOND,
            tilt_torque: 0.01,

            fuel_max: 1.0,
            fuel_burn_per_sec: 0.015,
            fuel_burn_per_speed: 0.002,
            fuel_spacing_base: 280.0,
            fuel_spacing_per_difficulty: 40_000.0,
            fuel_spacing_min: 180.0,
            fuel_pickup_radius: 38.0,
            fuel_floor_offset: 36.0,

            coin_spacing_base: 650.0,
            coin_spacing_jitter: 260.0,
            coin_spacing_min: 520.0,
            coin_group_min: 5,
            coin_group_max: 12,
            coin_step: 60.0,
            coin_arc_amplitude: 12.0,
            coin_pickup_radius: 28.0,
            coin_floor_offset: 36.0,

            nitro_thrust: 0.25,
            nitro_duration_secs: 1.5,
            nitro_cooldown_secs: 10.0,
            nitro_burn_multiplier: 3.0,
            nitro_max_altitude: 768.0,

            topple_angle: std::f64::consts::FRAC_PI_2,
            topple_grace_secs: 2.0,
            distance_unit: 6.0,
            score_per_coin: 50,
            coins_per_flip: 50,
        }
    }
}

impl RunConfig {
    /// Convert a duration in seconds to whole ticks (at least one)
    pub fn ticks(&self, secs: f64) -> u64 {
        (secs * self.ticks_per_second).round().max(1.0) as u64
    }

    /// Convert a per-second rate to a per-tick rate
    pub fn per_tick(&self, per_sec: f64) -> f64 {
        per_sec / self.ticks_per_second
    }

    pub fn validate(&self) -> Result<(), SimError> {
        check(
            self.ticks_per_second.is_finite() && self.ticks_per_second > 0.0,
            "ticks_per_second must be > 0",
        )?;
        check(self.fuel_max > 0.0, "fuel_max must be > 0")?;
        check(self.fuel_burn_per_sec >= 0.0, "fuel_burn_per_sec must be >= 0")?;
        check(self.fuel_spacing_min > 0.0, "fuel_spacing_min must be > 0")?;
        check(self.coin_spacing_min > 0.0, "coin_spacing_min must be > 0")?;
        check(
            self.coin_group_min >= 1 && self.coin_group_min <= self.coin_group_max,
            "coin group bounds must satisfy 1 <= min <= max",
        )?;
        check(self.coin_step > 0.0, "coin_step must be > 0")?;
        check(self.distance_unit > 0.0, "distance_unit must be > 0")?;
        check(
            self.topple_angle > 0.0 && self.topple_angle < std::f64::consts::PI,
            "topple_angle must be in (0, π)",
        )?;
        Ok(())
    }
}
