//! Simulation systems.
//!
//! Systems run once per tick in a fixed order on a single thread:
//!
//! 1. `locomotion_system` - advances movement legs along paths
//! 2. `behavior_system` - applies spawn requests, picks targets, plans paths
//! 3. event buffers age, then `SimTick` advances
//!
//! Commands queued by `behavior_system` (target spawns and removals) are
//! applied before the tick ends.

pub mod behavior;
pub mod locomotion;

pub use behavior::behavior_system;
pub use locomotion::{calculate_steps, locomotion_system};

use crate::config::{SimConfig, SimTick};
use crate::error::SystemError;
use crate::events::{Moved, SpawnTarget, TargetAcquired};
use crate::store::EntityStore;
use crate::terrain::Terrain;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

/// Last error raised by a fallible system during the current tick.
#[derive(Resource, Debug, Default)]
pub struct SystemFailure(pub Option<SystemError>);

impl SystemFailure {
    pub fn take(&mut self) -> Option<SystemError> {
        self.0.take()
    }
}

/// Keep the error returned by the system piped into this one.
pub fn record_failure(In(result): In<Result<(), SystemError>>, mut failure: ResMut<SystemFailure>) {
    if let Err(err) = result {
        log::error!("system failed: {}", err);
        failure.0 = Some(err);
    }
}

/// Drop events of type `E` that nobody read within two ticks.
pub fn age_events<E: Event>(mut events: ResMut<Events<E>>) {
    events.update();
}

pub fn advance_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

/// Insert every resource the tick schedule reads.
pub fn init_world(store: &mut EntityStore, config: SimConfig, terrain: Terrain) {
    store.register_events::<SpawnTarget>();
    store.register_events::<TargetAcquired>();
    store.register_events::<Moved>();

    let world = store.world_mut();
    world.insert_resource(config);
    world.insert_resource(terrain);
    world.insert_resource(SimTick(0));
    world.init_resource::<SystemFailure>();
}

/// The per-tick schedule.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            locomotion_system,
            behavior_system.pipe(record_failure),
            age_events::<SpawnTarget>,
            age_events::<TargetAcquired>,
            age_events::<Moved>,
            advance_tick,
        )
            .chain(),
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint;
    use crate::components::Kind;
    use crate::error::BlueprintError;
    use crate::point::Point;

    #[test]
    fn test_schedule_advances_tick_and_ages_events() {
        let mut store = EntityStore::new();
        init_world(&mut store, SimConfig::default(), Terrain::new(5, 5));
        let mut schedule = tick_schedule();

        schedule.run(store.world_mut());
        assert_eq!(*store.world().resource::<SimTick>(), SimTick(1));

        // Nobody drains `Moved` here, so the buffer is empty again two ticks on.
        let human = blueprint::spawn_human(&mut store, Point::new(0, 0));
        store.publish(Moved {
            entity: human,
            from: Point::new(0, 0),
            to: Point::new(1, 0),
        });
        schedule.run(store.world_mut());
        schedule.run(store.world_mut());
        assert!(store.drain_events::<Moved>().is_empty());
        assert_eq!(*store.world().resource::<SimTick>(), SimTick(3));
    }

    #[test]
    fn test_behavior_error_is_recorded() {
        let mut store = EntityStore::new();
        let config = SimConfig {
            target_kind: Kind::None,
            ..SimConfig::default()
        };
        init_world(&mut store, config, Terrain::new(5, 5));
        store.publish(SpawnTarget { at: Point::new(1, 1) });

        let mut schedule = tick_schedule();
        schedule.run(store.world_mut());
        let err = store.world_mut().resource_mut::<SystemFailure>().take();
        assert_eq!(
            err,
            Some(SystemError::Blueprint(BlueprintError::NoBlueprint(Kind::None)))
        );
        assert!(store.world_mut().resource_mut::<SystemFailure>().take().is_none());
    }
}
