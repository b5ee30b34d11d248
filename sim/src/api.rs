//! Public API for the simulation.
//!
//! `SimWorld` owns the entity store (whose `World` also holds the terrain and
//! config resources) and the tick schedule. Input layers talk to it in cell or
//! pixel coordinates; renderers read snapshots.
//!
//! ## Tick order
//!
//! 1. Locomotion advances every movement leg.
//! 2. Behavior applies the latest spawn request, then updates each agent.
//! 3. Event buffers age. Events not drained within two ticks are dropped.

use crate::blueprint;
use crate::components::*;
use crate::config::{SimConfig, SimTick};
use crate::error::{SimError, TerrainError};
use crate::events::{Moved, SpawnTarget, TargetAcquired};
use crate::point::Point;
use crate::store::{EntityRecord, EntityStore};
use crate::systems::{init_world, tick_schedule, SystemFailure};
use crate::terrain::{Terrain, TerrainSnapshot};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// The main simulation container.
pub struct SimWorld {
    store: EntityStore,
    schedule: Schedule,
}

impl Default for SimWorld {
    fn default() -> Self {
        let config = SimConfig::default();
        let terrain = Terrain::new(config.grid_width, config.grid_height);
        Self::assemble(config, terrain)
    }
}

impl SimWorld {
    /// Create a world with an empty grid sized by `config`.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let terrain = Terrain::new(config.grid_width, config.grid_height);
        Ok(Self::assemble(config, terrain))
    }

    /// Create a world over a prepared terrain. The grid size in `config` is
    /// replaced by the terrain's.
    pub fn with_terrain(mut config: SimConfig, terrain: Terrain) -> Result<Self, SimError> {
        config.grid_width = terrain.width();
        config.grid_height = terrain.height();
        config.validate()?;
        Ok(Self::assemble(config, terrain))
    }

    pub fn from_json_config(json: &str) -> Result<Self, SimError> {
        Self::new(SimConfig::from_json(json)?)
    }

    fn assemble(config: SimConfig, terrain: Terrain) -> Self {
        log::debug!("created {}x{} world", terrain.width(), terrain.height());
        let mut store = EntityStore::new();
        init_world(&mut store, config, terrain);
        Self {
            store,
            schedule: tick_schedule(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        self.store.world().resource::<SimConfig>()
    }

    pub fn terrain(&self) -> &Terrain {
        self.store.world().resource::<Terrain>()
    }

    pub fn terrain_mut(&mut self) -> Mut<'_, Terrain> {
        self.store.world_mut().resource_mut::<Terrain>()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    fn check_bounds(&self, p: Point) -> Result<(), TerrainError> {
        let terrain = self.terrain();
        if terrain.in_bounds(p.x, p.y) {
            Ok(())
        } else {
            Err(TerrainError::OutOfBounds {
                x: p.x,
                y: p.y,
                width: terrain.width(),
                height: terrain.height(),
            })
        }
    }

    /// Spawn an entity of `kind` from its blueprint.
    pub fn spawn(&mut self, kind: Kind, at: Point) -> Result<EntityId, SimError> {
        self.check_bounds(at)?;
        Ok(blueprint::spawn(&mut self.store, kind, at)?)
    }

    pub fn spawn_human(&mut self, at: Point) -> Result<EntityId, SimError> {
        self.spawn(Kind::Human, at)
    }

    pub fn spawn_apple(&mut self, at: Point) -> Result<EntityId, SimError> {
        self.spawn(Kind::Apple, at)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.store.remove_entity(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRecord> {
        self.store.entity(id)
    }

    pub fn goal(&self, id: EntityId) -> Option<Goal> {
        self.store.get::<Agent>(id).map(Agent::goal)
    }

    pub fn path(&self, id: EntityId) -> Option<&Path> {
        self.store.get::<Path>(id)
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Request a new target at a grid cell. It is created on the next tick.
    pub fn spawn_target(&mut self, at: Point) -> Result<(), SimError> {
        self.check_bounds(at)?;
        self.store.publish(SpawnTarget { at });
        Ok(())
    }

    /// Translate a pointer press in pixels into a spawn request.
    /// Returns false for presses outside the grid.
    pub fn pointer_pressed(&mut self, px: i32, py: i32) -> bool {
        let cell = Point::new(px, py).divide(self.config().cell_size);
        if !self.terrain().in_bounds(cell.x, cell.y) {
            log::debug!("ignoring press at ({}, {}) outside the grid", px, py);
            return false;
        }
        self.store.publish(SpawnTarget { at: cell });
        true
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Run one simulation tick.
    ///
    /// A failing system does not stop the rest of the tick; its error is
    /// returned once the tick has completed.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let world = self.store.world_mut();
        self.schedule.run(world);
        match world.resource_mut::<SystemFailure>().take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Run `ticks` ticks, stopping at the first error.
    pub fn step(&mut self, ticks: u32) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.store.world().resource::<SimTick>().0
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    pub fn drain_target_acquired(&mut self) -> Vec<TargetAcquired> {
        self.store.drain_events::<TargetAcquired>()
    }

    pub fn drain_moved(&mut self) -> Vec<Moved> {
        self.store.drain_events::<Moved>()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_store(&self.store, self.current_tick(), self.config().cell_size)
    }

    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        self.snapshot().to_json()
    }

    pub fn terrain_snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot::from_terrain(self.terrain())
    }

    pub fn terrain_snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.terrain_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::error::{BlueprintError, SystemError};
    use crate::terrain::Cell;

    fn small_world() -> SimWorld {
        SimWorld::new(SimConfig {
            grid_width: 10,
            grid_height: 10,
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_world() {
        let sim = SimWorld::default();
        assert_eq!(sim.terrain().width(), 50);
        assert_eq!(sim.current_tick(), 0);
        assert!(sim.store().is_empty());
    }

    #[test]
    fn test_step_advances_tick() {
        let mut sim = small_world();
        sim.tick().unwrap();
        assert_eq!(sim.current_tick(), 1);
        sim.step(4).unwrap();
        assert_eq!(sim.current_tick(), 5);
    }

    #[test]
    fn test_failing_tick_reports_error() {
        let mut sim = small_world();
        sim.store_mut().world_mut().insert_resource(SimConfig {
            target_kind: Kind::None,
            ..SimConfig::default()
        });
        sim.spawn_target(Point::new(3, 3)).unwrap();

        assert!(matches!(
            sim.tick(),
            Err(SimError::System(SystemError::Blueprint(BlueprintError::NoBlueprint(Kind::None))))
        ));
        assert_eq!(sim.current_tick(), 1);
        sim.tick().unwrap();
    }

    #[test]
    fn test_terrain_edits_reach_the_pathfinder() {
        let mut sim = small_world();
        for y in 0..10 {
            sim.terrain_mut().fill(3, y, Cell::SOLID).unwrap();
        }
        let human = sim.spawn_human(Point::new(0, 0)).unwrap();
        sim.spawn_apple(Point::new(6, 0)).unwrap();

        sim.step(20).unwrap();
        assert_eq!(sim.entity(human).unwrap().position, Point::new(0, 0));
        assert!(sim.path(human).unwrap().is_empty());
        assert!(sim.drain_moved().is_empty());
    }

    #[test]
    fn test_from_json_config() {
        let sim = SimWorld::from_json_config(r#"{"grid_width": 12, "grid_height": 8}"#).unwrap();
        assert_eq!(sim.terrain().width(), 12);
        assert_eq!(sim.terrain().height(), 8);
        assert!(SimWorld::from_json_config(r#"{"grid_width": 0}"#).is_err());
    }

    #[test]
    fn test_spawn_out_of_bounds() {
        let mut sim = small_world();
        assert!(matches!(
            sim.spawn_human(Point::new(10, 0)),
            Err(SimError::Terrain(TerrainError::OutOfBounds { x: 10, y: 0, .. }))
        ));
        assert!(sim.spawn_target(Point::new(-1, 3)).is_err());
        assert!(matches!(sim.spawn(Kind::None, Point::new(1, 1)), Err(SimError::Blueprint(_))));
    }

    #[test]
    fn test_agent_walks_next_to_target() {
        let mut sim = small_world();
        let human = sim.spawn_human(Point::new(0, 0)).unwrap();
        let apple = sim.spawn_apple(Point::new(5, 5)).unwrap();

        sim.step(200).unwrap();

        assert_eq!(sim.entity(human).unwrap().position, Point::new(4, 4));
        assert_eq!(sim.entity(apple).unwrap().position, Point::new(5, 5));
        assert_eq!(sim.goal(human), Some(Goal::MovingToTarget { target: apple }));
        assert!(sim.path(human).unwrap().at_destination());
    }

    #[test]
    fn test_two_sequential_targets() {
        let mut sim = small_world();
        let human = sim.spawn_human(Point::new(0, 0)).unwrap();
        let first = sim.spawn_apple(Point::new(5, 5)).unwrap();
        sim.step(200).unwrap();
        assert!(sim.entity(human).unwrap().position.within_reach(Point::new(5, 5)));

        // Cell (9, 0) at 16 px per cell.
        assert!(sim.pointer_pressed(9 * 16 + 3, 5));
        sim.tick().unwrap();
        assert!(sim.entity(first).is_none());
        let acquired = sim.drain_target_acquired();
        assert_eq!(acquired.len(), 1);
        let second = acquired[0].target;
        assert_eq!(sim.entity(second).unwrap().position, Point::new(9, 0));

        sim.step(300).unwrap();
        let pos = sim.entity(human).unwrap().position;
        assert!(pos.neighboring(Point::new(9, 0)), "ended at {}", pos);
        assert_eq!(sim.goal(human), Some(Goal::MovingToTarget { target: second }));
    }

    #[test]
    fn test_pointer_outside_grid_is_ignored() {
        let mut sim = small_world();
        assert!(!sim.pointer_pressed(10 * 16, 0));
        assert!(!sim.pointer_pressed(-1, 5));
        sim.tick().unwrap();
        assert!(sim.store().is_empty());
    }

    #[test]
    fn test_moves_are_legal_steps() {
        let mut terrain = Terrain::new(10, 10);
        for y in 0..8 {
            terrain.fill(4, y, Cell::SOLID).unwrap();
        }
        terrain.fill(2, 8, Cell::BORDER_EAST).unwrap();
        let mut sim = SimWorld::with_terrain(SimConfig::default(), terrain).unwrap();
        let human = sim.spawn_human(Point::new(0, 0)).unwrap();
        sim.spawn_apple(Point::new(8, 0)).unwrap();

        let mut moves = 0;
        for _ in 0..1500 {
            sim.tick().unwrap();
            for m in sim.drain_moved() {
                let dir = Direction::between(m.from, m.to).expect("moves are single steps");
                assert!(sim.terrain().traversable(m.from, dir), "illegal step {} -> {}", m.from, m.to);
                moves += 1;
            }
        }
        assert!(moves > 0);
        assert!(sim.entity(human).unwrap().position.neighboring(Point::new(8, 0)));
    }

    #[test]
    fn test_unreachable_target_leaves_agent_idle_in_place() {
        let mut terrain = Terrain::new(10, 10);
        for x in 0..10 {
            terrain.fill(x, 5, Cell::SOLID).unwrap();
        }
        let mut sim = SimWorld::with_terrain(SimConfig::default(), terrain).unwrap();
        let human = sim.spawn_human(Point::new(0, 0)).unwrap();
        sim.spawn_apple(Point::new(5, 8)).unwrap();

        sim.step(50).unwrap();
        assert_eq!(sim.entity(human).unwrap().position, Point::new(0, 0));
        assert!(sim.drain_moved().is_empty());
    }

    #[test]
    fn test_runs_are_deterministic() {
        let run = || {
            let mut sim = small_world();
            sim.spawn_human(Point::new(0, 9)).unwrap();
            sim.spawn_human(Point::new(9, 9)).unwrap();
            sim.spawn_apple(Point::new(5, 2)).unwrap();
            sim.step(60).unwrap();
            sim.spawn_target(Point::new(1, 1)).unwrap();
            sim.step(60).unwrap();
            sim.snapshot_json().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_snapshot_json() {
        let mut sim = small_world();
        sim.spawn_human(Point::new(1, 1)).unwrap();
        sim.tick().unwrap();
        let json = sim.snapshot_json().unwrap();
        assert!(json.contains("\"tick\":1"));
        assert!(json.contains("Human"));

        let terrain = sim.terrain_snapshot();
        assert_eq!(terrain.cells.len(), 100);
        assert!(sim.terrain_snapshot_json().unwrap().contains("\"width\":10"));
    }
}
