//! Apostle - Simulation Core
//!
//! A deterministic, tick-driven grid simulation: agents pick targets, plan
//! routes with A* over a bitflag terrain and walk them with sub-cell
//! interpolation. Uses `bevy_ecs` for entity and component storage.

pub mod api;
pub mod blueprint;
pub mod components;
pub mod config;
pub mod direction;
pub mod error;
pub mod events;
pub mod pathfinding;
pub mod point;
pub mod store;
pub mod systems;
pub mod terrain;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{SimConfig, SimTick};
pub use direction::Direction;
pub use error::{BlueprintError, SimError, StoreError, SystemError, TerrainError};
pub use events::{Moved, SpawnTarget, TargetAcquired};
pub use pathfinding::{AStar, PathFinder};
pub use point::Point;
pub use store::{EntityIndex, EntityRecord, EntityStore};
pub use systems::*;
pub use terrain::{Cell, Step, Terrain, TerrainSnapshot};
pub use world::{EntitySnapshot, Snapshot};
