//! Entity templates keyed by [`Kind`].
//!
//! Blueprints can be applied directly to an [`EntityStore`], or queued through
//! `Commands` from inside a system.

use crate::components::{AppleBundle, EntityId, HumanBundle, Kind, Position, RenderPosition};
use crate::error::BlueprintError;
use crate::point::Point;
use crate::store::{EntityIndex, EntityStore};
use bevy_ecs::prelude::*;

/// Create a fully assembled entity of `kind` at `pos`.
///
/// A human gets `Kind`, `Movement`, `Path` and `Agent`; an apple gets only
/// `Kind`. `Kind::None` has no blueprint and creates nothing.
pub fn spawn(store: &mut EntityStore, kind: Kind, pos: Point) -> Result<EntityId, BlueprintError> {
    match kind {
        Kind::Human => Ok(spawn_human(store, pos)),
        Kind::Apple => Ok(spawn_apple(store, pos)),
        Kind::None => Err(BlueprintError::NoBlueprint(kind)),
    }
}

pub fn spawn_human(store: &mut EntityStore, pos: Point) -> EntityId {
    spawned(Kind::Human, store.spawn_bundle(pos, HumanBundle::new()), pos)
}

pub fn spawn_apple(store: &mut EntityStore, pos: Point) -> EntityId {
    spawned(Kind::Apple, store.spawn_bundle(pos, AppleBundle::new()), pos)
}

fn spawned(kind: Kind, id: EntityId, pos: Point) -> EntityId {
    log::debug!("spawned {:?} {} at {}", kind, id, pos);
    id
}

/// Queue an entity of `kind` at `pos` on `commands`.
///
/// The id is reserved in `index` right away; the components appear when the
/// commands are applied.
pub fn spawn_deferred(
    commands: &mut Commands,
    index: &mut EntityIndex,
    kind: Kind,
    pos: Point,
) -> Result<EntityId, BlueprintError> {
    if kind == Kind::None {
        return Err(BlueprintError::NoBlueprint(kind));
    }
    let id = index.allocate();
    let base = (id, Position(pos), RenderPosition::from(pos));
    let entity = match kind {
        Kind::Human => commands.spawn((base, HumanBundle::new())).id(),
        _ => commands.spawn((base, AppleBundle::new())).id(),
    };
    index.bind(id, entity);
    Ok(spawned(kind, id, pos))
}
