//! Entity and component storage.
//!
//! Components live in a `bevy_ecs` [`World`], which keeps one typed table per
//! component kind and removes an entity's row from every table on despawn.
//! The public [`EntityId`] space is kept in the [`EntityIndex`] resource, where
//! the lowest free id is always reused first, so systems running inside a
//! schedule can create and remove entities too. The event bus is made of
//! `Events<T>` resources.

use crate::components::{EntityId, Position, RenderPosition};
use crate::error::StoreError;
use crate::point::Point;
use bevy_ecs::prelude::*;
use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only copy of an entity's identity and position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    /// Authoritative grid cell.
    pub position: Point,
    /// Interpolated position in cell units.
    pub render: RenderPosition,
}

/// Maps public ids to `bevy_ecs` entities.
#[derive(Resource, Debug, Default)]
pub struct EntityIndex {
    ids: BTreeMap<EntityId, Entity>,
    free: BTreeSet<u32>,
    next_id: u32,
}

impl EntityIndex {
    /// Reserve the lowest unused id.
    pub fn allocate(&mut self) -> EntityId {
        match self.free.pop_first() {
            Some(id) => EntityId(id),
            None => {
                let id = self.next_id;
                self.next_id += 1;
                EntityId(id)
            }
        }
    }

    pub fn bind(&mut self, id: EntityId, entity: Entity) {
        self.ids.insert(id, entity);
    }

    /// Forget `id` and return its entity, freeing the id for reuse.
    pub fn release(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.ids.remove(&id)?;
        self.free.insert(id.0);
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.ids.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.keys().copied()
    }
}

/// Owns every entity and its components.
pub struct EntityStore {
    world: World,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        let mut world = World::new();
        world.init_resource::<EntityIndex>();
        Self { world }
    }

    fn index(&self) -> &EntityIndex {
        self.world.resource::<EntityIndex>()
    }

    fn handle(&self, id: EntityId) -> Result<Entity, StoreError> {
        self.index().entity(id).ok_or(StoreError::EntityNotFound(id))
    }

    /// Create a bare entity at `pos`.
    pub fn create_entity(&mut self, pos: Point) -> EntityId {
        self.spawn_bundle(pos, ())
    }

    /// Create an entity at `pos` with every component in `bundle` attached in one step.
    pub fn spawn_bundle<B: Bundle>(&mut self, pos: Point, bundle: B) -> EntityId {
        let id = self.world.resource_mut::<EntityIndex>().allocate();
        let entity = self
            .world
            .spawn((id, Position(pos), RenderPosition::from(pos), bundle))
            .id();
        self.world.resource_mut::<EntityIndex>().bind(id, entity);
        id
    }

    /// Remove an entity and all of its components. Returns false if it did not exist.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.world.resource_mut::<EntityIndex>().release(id) else {
            return false;
        };
        self.world.despawn(entity);
        true
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index().contains(id)
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRecord> {
        let entity = self.index().entity(id)?;
        let position = self.world.get::<Position>(entity)?.0;
        let render = self.world.get::<RenderPosition>(entity).copied().unwrap_or_default();
        Some(EntityRecord { id, position, render })
    }

    /// Snapshot of every live entity. Callers must not rely on the order.
    pub fn entities(&self) -> Vec<EntityRecord> {
        self.index().ids().filter_map(|id| self.entity(id)).collect()
    }

    pub fn set_position(&mut self, id: EntityId, pos: Point) -> Result<(), StoreError> {
        let entity = self.handle(id)?;
        self.world.entity_mut(entity).insert((Position(pos), RenderPosition::from(pos)));
        Ok(())
    }

    /// Overwrite only the drawn position, leaving the grid cell untouched.
    pub fn set_render_position(&mut self, id: EntityId, render: RenderPosition) -> Result<(), StoreError> {
        let entity = self.handle(id)?;
        self.world.entity_mut(entity).insert(render);
        Ok(())
    }

    /// Attach a component the entity does not have yet.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> Result<(), StoreError> {
        let entity = self.handle(id)?;
        if self.world.get::<C>(entity).is_some() {
            return Err(StoreError::ComponentExists {
                entity: id,
                component: type_name::<C>(),
            });
        }
        self.world.entity_mut(entity).insert(component);
        Ok(())
    }

    /// Attach or replace a component.
    pub fn set_component<C: Component>(&mut self, id: EntityId, component: C) -> Result<(), StoreError> {
        let entity = self.handle(id)?;
        self.world.entity_mut(entity).insert(component);
        Ok(())
    }

    /// Detach a component, returning it if it was attached.
    pub fn remove_component<C: Component>(&mut self, id: EntityId) -> Result<Option<C>, StoreError> {
        let entity = self.handle(id)?;
        Ok(self.world.entity_mut(entity).take::<C>())
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        let entity = self.index().entity(id)?;
        self.world.get::<C>(entity)
    }

    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<Mut<'_, C>> {
        let entity = self.index().entity(id)?;
        self.world.get_mut::<C>(entity)
    }

    /// Every component of kind `C`, paired with its owner, sorted by id.
    pub fn entries<C: Component + Clone>(&mut self) -> Vec<(EntityId, C)> {
        let mut query = self.world.query::<(&EntityId, &C)>();
        let mut entries: Vec<(EntityId, C)> = query
            .iter(&self.world)
            .map(|(id, c)| (*id, c.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Number of entities carrying a `C`.
    pub fn count<C: Component>(&mut self) -> usize {
        let mut query = self.world.query::<&C>();
        query.iter(&self.world).count()
    }

    // ------------------------------------------------------------------------
    // Event bus
    // ------------------------------------------------------------------------

    /// Make sure the `E` buffer exists; systems reading or writing `E` need it.
    pub fn register_events<E: Event>(&mut self) {
        if !self.world.contains_resource::<Events<E>>() {
            self.world.init_resource::<Events<E>>();
        }
    }

    fn events_mut<E: Event>(&mut self) -> Mut<'_, Events<E>> {
        self.register_events::<E>();
        self.world.resource_mut::<Events<E>>()
    }

    pub fn publish<E: Event>(&mut self, event: E) {
        self.events_mut::<E>().send(event);
    }

    /// Take every buffered event of type `E`.
    pub fn drain_events<E: Event>(&mut self) -> Vec<E> {
        self.events_mut::<E>().drain().collect()
    }

    /// Age the `E` buffer; events not drained within two updates are dropped.
    pub fn update_events<E: Event>(&mut self) {
        self.events_mut::<E>().update();
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Agent, AppleBundle, HumanBundle, Kind, Movement, Path};
    use crate::events::SpawnTarget;

    #[test]
    fn test_ids_are_sequential() {
        let mut store = EntityStore::new();
        for i in 0..4 {
            assert_eq!(store.create_entity(Point::new(i, 0)), EntityId(i as u32));
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_removed_id_is_reused() {
        let mut store = EntityStore::new();
        for i in 0..4 {
            store.create_entity(Point::new(i, 0));
        }
        assert!(store.remove_entity(EntityId(3)));
        assert_eq!(store.create_entity(Point::new(9, 9)), EntityId(3));
    }

    #[test]
    fn test_lowest_unused_id_wins() {
        let mut store = EntityStore::new();
        for i in 0..5 {
            store.create_entity(Point::new(i, 0));
        }
        store.remove_entity(EntityId(3));
        store.remove_entity(EntityId(1));
        assert_eq!(store.create_entity(Point::default()), EntityId(1));
        assert_eq!(store.create_entity(Point::default()), EntityId(3));
        assert_eq!(store.create_entity(Point::default()), EntityId(5));
    }

    #[test]
    fn test_index_release_frees_id() {
        let mut store = EntityStore::new();
        let a = store.create_entity(Point::new(0, 0));
        let b = store.create_entity(Point::new(1, 0));

        let mut index = store.world_mut().resource_mut::<EntityIndex>();
        assert!(index.release(a).is_some());
        assert!(index.release(a).is_none());
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![b]);
        assert_eq!(index.allocate(), a);
    }

    #[test]
    fn test_remove_entity_drops_components() {
        let mut store = EntityStore::new();
        let human = store.spawn_bundle(Point::new(1, 1), HumanBundle::new());
        let apple = store.spawn_bundle(Point::new(2, 2), AppleBundle::new());
        assert_eq!(store.count::<Kind>(), 2);
        assert_eq!(store.count::<Agent>(), 1);

        assert!(store.remove_entity(human));
        assert!(!store.remove_entity(human));
        assert_eq!(store.count::<Kind>(), 1);
        assert_eq!(store.count::<Agent>(), 0);
        assert_eq!(store.count::<Movement>(), 0);
        assert!(store.get::<Path>(human).is_none());
        assert_eq!(store.entries::<Kind>(), vec![(apple, Kind::Apple)]);
    }

    #[test]
    fn test_component_ops_require_entity() {
        let mut store = EntityStore::new();
        let missing = EntityId(42);
        assert_eq!(
            store.add_component(missing, Path::new()),
            Err(StoreError::EntityNotFound(missing))
        );
        assert_eq!(
            store.set_component(missing, Kind::Apple),
            Err(StoreError::EntityNotFound(missing))
        );
        assert!(store.remove_component::<Kind>(missing).is_err());
        assert!(store.set_position(missing, Point::default()).is_err());
        assert!(store.entity(missing).is_none());
    }

    #[test]
    fn test_add_set_get_remove_component() {
        let mut store = EntityStore::new();
        let id = store.create_entity(Point::new(3, 4));

        store.add_component(id, Kind::Human).unwrap();
        assert!(matches!(
            store.add_component(id, Kind::Apple),
            Err(StoreError::ComponentExists { .. })
        ));
        assert_eq!(store.get::<Kind>(id), Some(&Kind::Human));

        store.set_component(id, Kind::Apple).unwrap();
        assert_eq!(store.get::<Kind>(id), Some(&Kind::Apple));

        if let Some(mut kind) = store.get_mut::<Kind>(id) {
            *kind = Kind::None;
        }
        assert_eq!(store.get::<Kind>(id), Some(&Kind::None));

        assert_eq!(store.remove_component::<Kind>(id), Ok(Some(Kind::None)));
        assert_eq!(store.remove_component::<Kind>(id), Ok(None));
        assert_eq!(store.count::<Kind>(), 0);
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let mut store = EntityStore::new();
        for i in 0..6 {
            store.spawn_bundle(Point::new(i, i), AppleBundle::new());
        }
        store.remove_entity(EntityId(2));
        store.spawn_bundle(Point::new(9, 9), HumanBundle::new());

        let ids: Vec<EntityId> = store.entries::<Kind>().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, (0..6).map(EntityId).collect::<Vec<_>>());
    }

    #[test]
    fn test_entity_record_and_position() {
        let mut store = EntityStore::new();
        let id = store.create_entity(Point::new(3, 4));
        let record = store.entity(id).unwrap();
        assert_eq!(record.position, Point::new(3, 4));
        assert_eq!(record.render, RenderPosition::new(3.0, 4.0));

        store.set_position(id, Point::new(5, 5)).unwrap();
        assert_eq!(store.entity(id).unwrap().position, Point::new(5, 5));

        store.set_render_position(id, RenderPosition::new(5.5, 5.0)).unwrap();
        let record = store.entity(id).unwrap();
        assert_eq!(record.position, Point::new(5, 5));
        assert_eq!(record.render, RenderPosition::new(5.5, 5.0));
        assert_eq!(store.entities().len(), 1);
    }

    #[test]
    fn test_event_bus_publish_and_drain() {
        let mut store = EntityStore::new();
        assert!(store.drain_events::<SpawnTarget>().is_empty());

        store.publish(SpawnTarget { at: Point::new(1, 2) });
        store.publish(SpawnTarget { at: Point::new(3, 4) });
        let events = store.drain_events::<SpawnTarget>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].at, Point::new(3, 4));
        assert!(store.drain_events::<SpawnTarget>().is_empty());
    }

    #[test]
    fn test_undrained_events_expire() {
        let mut store = EntityStore::new();
        store.publish(SpawnTarget { at: Point::new(1, 2) });
        store.update_events::<SpawnTarget>();
        store.update_events::<SpawnTarget>();
        assert!(store.drain_events::<SpawnTarget>().is_empty());
    }
}
