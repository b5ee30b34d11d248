//! Events exchanged between the input layer, the systems and observers.
//!
//! Events are buffered in `bevy_ecs` `Events<T>` resources inside the entity
//! store. Anything published before a system runs is visible to it in the
//! same tick.

use crate::components::EntityId;
use crate::point::Point;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Request to place a new target at a grid cell (a translated pointer press).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTarget {
    pub at: Point,
}

/// An agent picked up a new target.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAcquired {
    pub agent: EntityId,
    pub target: EntityId,
}

/// An entity finished a movement leg and now occupies `to`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moved {
    pub entity: EntityId,
    pub from: Point,
    pub to: Point,
}
