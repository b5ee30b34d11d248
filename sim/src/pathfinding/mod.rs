//! Grid pathfinding.

pub mod astar;

pub use astar::{octile_distance, AStar};

use crate::direction::Direction;
use crate::point::Point;

/// Anything that can plan a route across the grid.
pub trait PathFinder {
    /// Ordered cells from `start` to `end`, both inclusive.
    /// Empty when no route exists; `[start]` when `start == end`.
    fn find(&self, start: Point, end: Point) -> Vec<Point>;
}

/// Total step cost of a path (1 per orthogonal step, sqrt(2) per diagonal).
/// Consecutive cells that are not neighbors contribute nothing.
pub fn path_cost(path: &[Point]) -> f64 {
    path.windows(2)
        .filter_map(|w| Direction::between(w[0], w[1]))
        .map(Direction::step_cost)
        .sum()
}
