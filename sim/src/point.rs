//! Integer grid coordinates.

use crate::direction::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell coordinate on the grid (x = column, y = row, y grows southward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance (number of 8-connected steps on an open grid).
    pub fn chebyshev_distance(&self, other: Point) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// True if `other` is one of the 8 cells around `self`. A point is not its own neighbor.
    pub fn neighboring(&self, other: Point) -> bool {
        self.chebyshev_distance(other) == 1
    }

    /// True if `other` is the same cell or a neighbor.
    pub fn within_reach(&self, other: Point) -> bool {
        self.chebyshev_distance(other) <= 1
    }

    pub fn euclidean_distance(&self, other: Point) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Floor-divide both coordinates, e.g. to turn a pixel into a cell.
    pub fn divide(&self, scalar: i32) -> Point {
        Point::new(self.x.div_euclid(scalar), self.y.div_euclid(scalar))
    }

    /// The adjacent point one step in `dir`.
    pub fn step(&self, dir: Direction) -> Point {
        let (dx, dy) = dir.delta();
        Point::new(self.x + dx, self.y + dy)
    }

    /// Like [`Point::step`], but `None` when the step leaves the `i32` range.
    pub fn checked_step(&self, dir: Direction) -> Option<Point> {
        let (dx, dy) = dir.delta();
        Some(Point::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
