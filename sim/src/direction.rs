//! The eight compass directions used for grid traversal.

use crate::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Every direction, in the fixed order neighbor expansion uses.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Grid offset of one step. North is -y.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::NorthWest | Direction::SouthEast | Direction::SouthWest
        )
    }

    /// Split a diagonal into its (vertical, horizontal) legs. `None` for orthogonals.
    pub fn components(self) -> Option<(Direction, Direction)> {
        match self {
            Direction::NorthEast => Some((Direction::North, Direction::East)),
            Direction::NorthWest => Some((Direction::North, Direction::West)),
            Direction::SouthEast => Some((Direction::South, Direction::East)),
            Direction::SouthWest => Some((Direction::South, Direction::West)),
            _ => None,
        }
    }

    /// Cost of a single step: 1 orthogonally, sqrt(2) diagonally.
    pub fn step_cost(self) -> f64 {
        if self.is_diagonal() {
            std::f64::consts::SQRT_2
        } else {
            1.0
        }
    }

    /// Direction of a single step from `from` to `to`, if they are neighbors.
    pub fn between(from: Point, to: Point) -> Option<Direction> {
        let delta = (to.x - from.x, to.y - from.y);
        Self::ALL.into_iter().find(|d| d.delta() == delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_is_opposite_delta() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(dir.reverse().delta(), (-dx, -dy));
            assert_eq!(dir.reverse().reverse(), dir);
        }
    }

    #[test]
    fn test_components_sum_to_diagonal() {
        for dir in Direction::ALL {
            match dir.components() {
                Some((v, h)) => {
                    assert!(dir.is_diagonal());
                    let (vx, vy) = v.delta();
                    let (hx, hy) = h.delta();
                    assert_eq!((vx + hx, vy + hy), dir.delta());
                }
                None => assert!(!dir.is_diagonal()),
            }
        }
    }

    #[test]
    fn test_between() {
        let p = Point::new(3, 3);
        assert_eq!(Direction::between(p, Point::new(3, 2)), Some(Direction::North));
        assert_eq!(Direction::between(p, Point::new(2, 4)), Some(Direction::SouthWest));
        assert_eq!(Direction::between(p, p), None);
        assert_eq!(Direction::between(p, Point::new(5, 3)), None);
    }
}
