//! Failures raised at the construction boundary
//!
//! `World::advance` never fails; everything that could put non-finite or
//! inconsistent state into the simulation is rejected here instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Segment does not advance strictly left to right (vertical or reversed)
    #[error("terrain segment ({x1},{y1})-({x2},{y2}) must satisfy x2 > x1")]
    InvalidSegment { x1: i32, y1: i32, x2: i32, y2: i32 },
    #[error("body radius {0} must be positive and finite")]
    InvalidRadius(f64),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
    #[error("cannot read configuration file {path}: {reason}")]
    ConfigRead { path: String, reason: String },
    #[error("body index {index} out of range ({len} bodies)")]
    UnknownBody { index: usize, len: usize },
    #[error("body {0} cannot be coupled to itself")]
    SelfCoupling(usize),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::ConfigParse(err.to_string())
    }
}
