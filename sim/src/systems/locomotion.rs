//! Locomotion system - walks entities along their paths one interpolation step per tick.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::Moved;
use crate::point::Point;
use bevy_ecs::prelude::*;

/// Ticks needed to cross from `from` to `to`, so diagonal legs are not faster
/// than orthogonal ones.
pub fn calculate_steps(from: Point, to: Point, steps_per_unit: u32) -> u32 {
    (from.euclidean_distance(to) * f64::from(steps_per_unit)).ceil() as u32
}

/// Advance every entity with a `Movement` component.
///
/// - Reads: SimConfig, Path
/// - Writes: Movement, Path (cursor), Position (on arrival), RenderPosition
/// - Emits: `Moved` when a leg completes
pub fn locomotion_system(
    config: Res<SimConfig>,
    mut moved: EventWriter<Moved>,
    mut query: Query<(
        &EntityId,
        &mut Movement,
        Option<&mut Path>,
        &mut Position,
        &mut RenderPosition,
    )>,
) {
    let steps_per_unit = config.steps_per_unit;
    for (id, mut movement, path, mut position, mut render) in query.iter_mut() {
        if !movement.has_destination() {
            movement.set_destination(position.0, 0);
        }

        let mut leg_started = false;
        if let Some(mut path) = path {
            if movement.at_destination() && path.advance() {
                if let (Some(from), Some(next)) = (movement.destination(), path.current_cell()) {
                    movement.set_destination(next, calculate_steps(from, next, steps_per_unit));
                    leg_started = true;
                }
            }
        }

        let travelling = !movement.at_destination();
        if travelling {
            movement.advance_step();
        }
        if !(travelling || leg_started) {
            continue;
        }

        *render = movement.interpolated();
        if let Some(to) = movement.destination() {
            if movement.at_destination() && position.0 != to {
                let from = movement.origin();
                log::trace!("entity {} moved {} -> {}", id, from, to);
                moved.send(Moved { entity: *id, from, to });
                position.0 = to;
            }
        }
    }
}
