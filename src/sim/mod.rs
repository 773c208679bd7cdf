//! Tick-driven simulation module
//!
//! All physics and terrain logic lives here. This module stays pure:
//! - One logical step per `advance`, no wall-clock Δt
//! - Injected uniform source only
//! - Stable iteration order (window order for terrain, index order for bodies)
//! - No rendering, input or scheduling dependencies

pub mod body;
pub mod chassis;
pub mod collision;
pub mod coupling;
pub mod run;
pub mod state;
pub mod terrain;
pub mod tick;

pub use body::Body;
pub use chassis::{FlipDirection, FlipTracker, apply_tilt_torque, is_upside_down, tilt_angle};
pub use collision::{CollisionResult, ContactSummary, foot_x, is_touching, line_distance, resolve_segment};
pub use coupling::Coupling;
pub use run::{Pickup, PickupKind, Run, RunEvent, RunPhase};
pub use state::World;
pub use terrain::{SequenceSource, TerrainGenerator, TerrainSegment, TerrainWindow, UniformSource};
pub use tick::{TickInput, TickReport};
