//! Error types for the simulation.
//!
//! Only structural problems are errors. An unreachable or vanished target is
//! ordinary control flow and is handled inside the systems.

use crate::components::{EntityId, Kind};
use thiserror::Error;

/// Terrain setup failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("coordinates exceed bounds: ({x}, {y}) out of ({width}, {height})")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },
    #[error("expected {width}x{height} cells, got {actual}")]
    CellCount {
        width: usize,
        height: usize,
        actual: usize,
    },
}

/// Entity/component store failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("entity {0} does not exist")]
    EntityNotFound(EntityId),
    #[error("entity {entity} already has a {component} component")]
    ComponentExists {
        entity: EntityId,
        component: &'static str,
    },
}

/// Blueprint spawn failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("no blueprint for kind {0:?}")]
    NoBlueprint(Kind),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A structural failure that aborts the running system for this tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to spawn target: {0}")]
    Blueprint(#[from] BlueprintError),
}

/// Top-level error returned by [`crate::SimWorld`].
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error("system update failed: {0}")]
    System(#[from] SystemError),
    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
}
