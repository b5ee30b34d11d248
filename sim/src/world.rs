//! Snapshot types.
//!
//! A `Snapshot` is a serializable, read-only view of the simulation that a
//! renderer can draw from without touching simulation state.

use crate::components::*;
use crate::point::Point;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};

/// Snapshot of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub kind: Kind,
    /// Authoritative grid cell.
    pub cell: Point,
    /// Interpolated pixel position of the cell center.
    pub x: f32,
    pub y: f32,
    /// Present for agents only.
    pub goal: Option<Goal>,
    /// Remaining planned cells, starting with the one being travelled to.
    pub path: Vec<Point>,
}

/// Complete entity state for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of completed ticks.
    pub tick: u64,
    /// All entities, ordered by id.
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    /// Capture every entity in `store`.
    pub fn from_store(store: &EntityStore, tick: u64, cell_size: i32) -> Self {
        let cell = cell_size as f32;
        let mut entities: Vec<EntitySnapshot> = store
            .entities()
            .into_iter()
            .map(|record| EntitySnapshot {
                id: record.id.0,
                kind: store.get::<Kind>(record.id).copied().unwrap_or_default(),
                cell: record.position,
                x: record.render.x * cell + cell / 2.0,
                y: record.render.y * cell + cell / 2.0,
                goal: store.get::<Agent>(record.id).map(Agent::goal),
                path: store
                    .get::<Path>(record.id)
                    .map(|path| path.remaining().to_vec())
                    .unwrap_or_default(),
            })
            .collect();
        entities.sort_by_key(|e| e.id);
        Self { tick, entities }
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id.0)
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
