//! Simulation configuration and tick bookkeeping.

use crate::components::Kind;
use crate::error::SimError;
use crate::terrain::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Tunables for a simulation run. Missing JSON fields fall back to the defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells.
    pub grid_width: usize,
    /// Grid height in cells.
    pub grid_height: usize,
    /// Pixels per cell, used to translate pointer presses.
    pub cell_size: i32,
    /// Interpolation steps per unit of euclidean distance. Higher is slower.
    pub steps_per_unit: u32,
    /// Kind agents go after.
    pub target_kind: Kind,
    /// Optional A* node-expansion cap; hitting it counts as "no path".
    pub max_path_expansions: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_WIDTH,
            grid_height: DEFAULT_HEIGHT,
            cell_size: 16,
            steps_per_unit: 20,
            target_kind: Kind::Apple,
            max_path_expansions: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SimError::InvalidConfig("grid dimensions must be non-zero"));
        }
        if self.cell_size <= 0 {
            return Err(SimError::InvalidConfig("cell_size must be positive"));
        }
        if self.target_kind == Kind::None {
            return Err(SimError::InvalidConfig("target_kind must name a spawnable kind"));
        }
        Ok(())
    }
}

/// Number of completed ticks.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}
