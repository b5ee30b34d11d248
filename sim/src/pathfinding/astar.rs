//! A* search over the terrain grid.
//!
//! Per-cell bookkeeping lives in flat vectors indexed like the terrain
//! (row-major), so a search allocates once and never hashes. Improved
//! routes push a fresh heap entry; outdated entries are skipped when popped.

use super::PathFinder;
use crate::direction::Direction;
use crate::point::Point;
use crate::terrain::Terrain;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Admissible distance for 8-connected movement with diagonal cost sqrt(2).
pub fn octile_distance(a: Point, b: Point) -> f64 {
    let dx = f64::from((a.x - b.x).abs());
    let dy = f64::from((a.y - b.y).abs());
    (dx + dy) + (std::f64::consts::SQRT_2 - 2.0) * dx.min(dy)
}

/// Open-set entry. Ordered so that `BinaryHeap` pops the lowest f first,
/// then the lowest h, then the lowest cell index.
#[derive(Debug, Clone, Copy)]
struct Node {
    f: f64,
    h: f64,
    index: usize,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

/// A* pathfinder borrowing a terrain for the duration of a search.
#[derive(Debug, Clone, Copy)]
pub struct AStar<'a> {
    terrain: &'a Terrain,
    max_expansions: Option<usize>,
}

impl<'a> AStar<'a> {
    pub fn new(terrain: &'a Terrain) -> Self {
        Self {
            terrain,
            max_expansions: None,
        }
    }

    /// Give up (no path) after expanding this many nodes.
    pub fn with_max_expansions(mut self, max: Option<usize>) -> Self {
        self.max_expansions = max;
        self
    }

    fn index(&self, p: Point) -> usize {
        p.y as usize * self.terrain.width() + p.x as usize
    }

    fn point(&self, index: usize) -> Point {
        let width = self.terrain.width();
        Point::new((index % width) as i32, (index / width) as i32)
    }

    fn reconstruct(&self, parent: &[Option<usize>], mut index: usize) -> Vec<Point> {
        let mut path = vec![self.point(index)];
        while let Some(prev) = parent[index] {
            path.push(self.point(prev));
            index = prev;
        }
        path.reverse();
        path
    }
}

impl PathFinder for AStar<'_> {
    fn find(&self, start: Point, end: Point) -> Vec<Point> {
        let terrain = self.terrain;
        if !terrain.in_bounds(start.x, start.y) || !terrain.in_bounds(end.x, end.y) {
            return Vec::new();
        }
        if start == end {
            return vec![start];
        }

        let cells = terrain.width() * terrain.height();
        let mut best_g = vec![f64::INFINITY; cells];
        let mut parent: Vec<Option<usize>> = vec![None; cells];
        let mut closed = vec![false; cells];
        let mut open = BinaryHeap::new();

        let start_index = self.index(start);
        let goal_index = self.index(end);
        let h = octile_distance(start, end);
        best_g[start_index] = 0.0;
        open.push(Node { f: h, h, index: start_index });

        let mut expansions = 0usize;
        while let Some(node) = open.pop() {
            if closed[node.index] {
                continue;
            }
            closed[node.index] = true;

            if node.index == goal_index {
                return self.reconstruct(&parent, node.index);
            }

            if self.max_expansions.is_some_and(|max| expansions >= max) {
                log::debug!("A* gave up after {} expansions ({} -> {})", expansions, start, end);
                return Vec::new();
            }
            expansions += 1;

            let current = self.point(node.index);
            let g = best_g[node.index];
            for dir in Direction::ALL {
                if !terrain.traversable(current, dir) {
                    continue;
                }
                let next = current.step(dir);
                let next_index = self.index(next);
                if closed[next_index] {
                    continue;
                }
                let tentative = g + dir.step_cost();
                if tentative < best_g[next_index] {
                    best_g[next_index] = tentative;
                    parent[next_index] = Some(node.index);
                    let h = octile_distance(next, end);
                    open.push(Node {
                        f: tentative + h,
                        h,
                        index: next_index,
                    });
                }
            }
        }

        Vec::new()
    }
}
