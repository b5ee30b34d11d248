//! Behavior system - the per-agent goal state machine.
//!
//! Each tick:
//! 1. A pending `SpawnTarget` request creates the new target, removes every
//!    older entity of the target kind and retargets all agents to it. Agents
//!    do nothing else on that tick.
//! 2. Otherwise each agent (in id order) drops a target that no longer exists,
//!    then runs its goal: `Idle` looks for a target, `MovingToTarget` keeps
//!    its path ending next to the target, replanning when needed.
//!
//! An agent that loses its target keeps only the path cells up to the one it
//! is already heading for, so it stops on that cell instead of walking on.

use crate::blueprint;
use crate::components::*;
use crate::config::SimConfig;
use crate::error::{StoreError, SystemError};
use crate::events::{SpawnTarget, TargetAcquired};
use crate::pathfinding::{AStar, PathFinder};
use crate::point::Point;
use crate::store::EntityIndex;
use crate::terrain::Terrain;
use bevy_ecs::prelude::*;

/// Everything an agent can look at: id, cell and kind of every entity.
type Bodies<'w, 's> = Query<'w, 's, (&'static EntityId, &'static Position, Option<&'static Kind>)>;

/// Run one behavior tick over every entity with an `Agent` component.
///
/// - Reads: SimConfig, Terrain, Kind, Position, SpawnTarget events
/// - Writes: Agent, Path, EntityIndex (target spawns and removals)
/// - Emits: `TargetAcquired`
#[allow(clippy::too_many_arguments)]
pub fn behavior_system(
    mut commands: Commands,
    mut index: ResMut<EntityIndex>,
    config: Res<SimConfig>,
    terrain: Res<Terrain>,
    mut requests: EventReader<SpawnTarget>,
    mut acquired: EventWriter<TargetAcquired>,
    mut agents: Query<(Entity, &EntityId, &mut Agent, Option<&mut Path>)>,
    bodies: Bodies,
) -> Result<(), SystemError> {
    // Only the latest request of the tick counts.
    let spawned = match requests.read().last().copied() {
        Some(request) => Some(spawn_target(
            &mut commands,
            &mut index,
            &bodies,
            request.at,
            config.target_kind,
        )?),
        None => None,
    };

    let mut candidates: Vec<EntityId> = bodies
        .iter()
        .filter(|(_, _, kind)| *kind == Some(&config.target_kind))
        .map(|(&id, _, _)| id)
        .collect();
    candidates.sort();

    let mut order: Vec<(EntityId, Entity)> = agents
        .iter()
        .map(|(entity, &id, _, _)| (id, entity))
        .collect();
    order.sort();

    let pathfinder = AStar::new(&terrain).with_max_expansions(config.max_path_expansions);

    for (id, entity) in order {
        let Ok((_, _, mut agent, path)) = agents.get_mut(entity) else {
            continue;
        };

        if let Some(target) = spawned {
            acquired.send(agent.acquire(id, target));
            continue;
        }

        let mut fresh = None;
        let path: &mut Path = match path {
            Some(path) => path.into_inner(),
            None => fresh.insert(Path::new()),
        };

        if let Some(target) = agent.target() {
            if !index.contains(target) {
                log::info!("agent {}: target {} was removed, going idle", id, target);
                drop_target(&mut agent, path);
            }
        }

        match agent.goal() {
            Goal::Idle => {
                let target = candidates.iter().copied().find(|&c| c != id && index.contains(c));
                if let Some(target) = target {
                    log::info!("agent {} acquired target {}", id, target);
                    acquired.send(agent.acquire(id, target));
                }
            }
            Goal::MovingToTarget { target } => {
                let Ok((_, position, _)) = bodies.get(entity) else {
                    return Err(StoreError::EntityNotFound(id).into());
                };
                let target_pos = index
                    .entity(target)
                    .and_then(|e| bodies.get(e).ok())
                    .map(|(_, pos, _)| pos.0);
                match target_pos {
                    Some(target_pos) => {
                        if !keep_path_in_reach(&pathfinder, id, path, position.0, target, target_pos) {
                            agent.reset();
                        }
                    }
                    None => {
                        log::warn!("agent {}: target {} vanished", id, target);
                        drop_target(&mut agent, path);
                    }
                }
            }
        }

        if let Some(path) = fresh {
            commands.entity(entity).insert(path);
        }
    }
    Ok(())
}

/// Create a target of `kind` at `at` and remove every other entity of that kind.
fn spawn_target(
    commands: &mut Commands,
    index: &mut EntityIndex,
    bodies: &Bodies,
    at: Point,
    kind: Kind,
) -> Result<EntityId, SystemError> {
    let target = blueprint::spawn_deferred(commands, index, kind, at)?;
    let mut old: Vec<EntityId> = bodies
        .iter()
        .filter(|&(&id, _, k)| k == Some(&kind) && id != target)
        .map(|(&id, _, _)| id)
        .collect();
    old.sort();
    for id in old {
        if let Some(entity) = index.release(id) {
            log::info!("removing old {:?} {}", kind, id);
            commands.entity(entity).despawn();
        }
    }
    log::info!("new {:?} target {} at {}", kind, target, at);
    Ok(target)
}

fn drop_target(agent: &mut Agent, path: &mut Path) {
    agent.reset();
    path.truncate_after_current();
}

/// Keep `path` ending within reach of the target at `target_pos`.
///
/// A replan keeps every cell up to and including the one the agent is already
/// committed to, searches from there, and appends the route minus its first
/// cell (already in the path) and its last cell (the target's own cell).
/// Returns false when the target cannot be reached.
fn keep_path_in_reach<P>(
    pathfinder: &P,
    id: EntityId,
    path: &mut Path,
    position: Point,
    target: EntityId,
    target_pos: Point,
) -> bool
where
    P: PathFinder + ?Sized,
{
    if path.destination().is_some_and(|dest| dest.within_reach(target_pos)) {
        return true;
    }

    log::debug!(
        "agent {}: replanning toward target {} at {} (old destination {:?})",
        id,
        target,
        target_pos,
        path.destination()
    );
    path.truncate_after_current();
    let origin = path.current_cell().unwrap_or(position);

    let route = pathfinder.find(origin, target_pos);
    if route.is_empty() {
        log::warn!("agent {}: no path from {} to target {} at {}", id, origin, target, target_pos);
        return false;
    }
    if path.is_empty() {
        path.add_cells([origin]);
    }
    let keep = route.len() - 1;
    path.add_cells(route.into_iter().take(keep).skip(1));
    log::debug!("agent {}: path now ends at {:?}", id, path.destination());
    true
}
