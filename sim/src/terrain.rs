//! Terrain grid - bitflag cells for solidity and directional borders.
//!
//! Each cell packs its flags into a single byte. Solidity and borders are
//! independent: a border blocks movement across one edge of a cell, solidity
//! blocks entering the cell at all. Traversal rules live here so the
//! pathfinder and any other consumer agree on what "open" means.

use crate::direction::Direction;
use crate::error::TerrainError;
use crate::point::Point;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Default grid width in cells.
pub const DEFAULT_WIDTH: usize = 50;
/// Default grid height in cells.
pub const DEFAULT_HEIGHT: usize = 50;

/// Flags describing one terrain cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(u8);

impl Cell {
    pub const EMPTY: Cell = Cell(0);
    pub const SOLID: Cell = Cell(1 << 0);
    pub const BORDER_NORTH: Cell = Cell(1 << 1);
    pub const BORDER_SOUTH: Cell = Cell(1 << 2);
    pub const BORDER_WEST: Cell = Cell(1 << 3);
    pub const BORDER_EAST: Cell = Cell(1 << 4);
    pub const CEILING: Cell = Cell(1 << 5);
    pub const FLOOR: Cell = Cell(1 << 6);

    /// Border flags in the order `Terrain::walls` reports them.
    pub const BORDERS: [Cell; 4] = [
        Cell::BORDER_NORTH,
        Cell::BORDER_SOUTH,
        Cell::BORDER_EAST,
        Cell::BORDER_WEST,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set.
    pub const fn contains(self, other: Cell) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    pub const fn intersects(self, other: Cell) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Cell) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Cell) {
        self.0 &= !other.0;
    }

    /// The border flag on the edge a step in `dir` leaves through.
    /// Diagonals have no single edge and map to `EMPTY`.
    pub fn border_facing(dir: Direction) -> Cell {
        match dir {
            Direction::North => Cell::BORDER_NORTH,
            Direction::South => Cell::BORDER_SOUTH,
            Direction::East => Cell::BORDER_EAST,
            Direction::West => Cell::BORDER_WEST,
            _ => Cell::EMPTY,
        }
    }
}

impl BitOr for Cell {
    type Output = Cell;

    fn bitor(self, rhs: Cell) -> Cell {
        Cell(self.0 | rhs.0)
    }
}

impl BitOrAssign for Cell {
    fn bitor_assign(&mut self, rhs: Cell) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Cell {
    type Output = Cell;

    fn bitand(self, rhs: Cell) -> Cell {
        Cell(self.0 & rhs.0)
    }
}

/// One item of a terrain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub x: i32,
    pub y: i32,
    pub cell: Cell,
}

/// Fixed-size grid of cells, stored row-major.
///
/// Serialized in the [`TerrainSnapshot`] shape. Deserializing checks that the
/// cell count matches the dimensions.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(into = "TerrainSnapshot", try_from = "TerrainSnapshot")]
pub struct Terrain {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Terrain {
    /// Create an open terrain of `width` x `height` cells.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell at (x, y), or `None` outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.cell_index(x, y).and_then(|i| self.cells.get(i).copied())
    }

    /// Overwrite the cell at (x, y).
    pub fn fill(&mut self, x: i32, y: i32, cell: Cell) -> Result<(), TerrainError> {
        let slot = self
            .cell_index(x, y)
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(TerrainError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })?;
        *slot = cell;
        Ok(())
    }

    /// Solid flag at (x, y). False outside the grid.
    pub fn solid(&self, x: i32, y: i32) -> bool {
        self.has_flag(x, y, Cell::SOLID)
    }

    pub fn has_flag(&self, x: i32, y: i32, flag: Cell) -> bool {
        self.cell(x, y).is_some_and(|c| c.intersects(flag))
    }

    pub fn has_ceiling(&self, x: i32, y: i32) -> bool {
        self.has_flag(x, y, Cell::CEILING)
    }

    pub fn has_floor(&self, x: i32, y: i32) -> bool {
        self.has_flag(x, y, Cell::FLOOR)
    }

    /// Border flags set on (x, y), in north, south, east, west order.
    pub fn walls(&self, x: i32, y: i32) -> Vec<Cell> {
        let Some(cell) = self.cell(x, y) else {
            return Vec::new();
        };
        Cell::BORDERS
            .into_iter()
            .filter(|&flag| cell.contains(flag))
            .collect()
    }

    /// Can an entity at `p` step once in `dir`?
    ///
    /// Orthogonal steps need an in-bounds, non-solid destination with no border
    /// on the shared edge (on either side). Diagonal steps additionally need
    /// both L-shaped detours through the orthogonal neighbors to be open, so
    /// no corner is ever cut.
    pub fn traversable(&self, p: Point, dir: Direction) -> bool {
        match dir.components() {
            None => self.edge_open(p, dir),
            Some((vertical, horizontal)) => {
                let via = |first: Direction, second: Direction| {
                    self.edge_open(p, first)
                        && p.checked_step(first).is_some_and(|q| self.edge_open(q, second))
                };
                via(vertical, horizontal) && via(horizontal, vertical)
            }
        }
    }

    fn edge_open(&self, p: Point, dir: Direction) -> bool {
        // The departure cell is checked first so out-of-range points never step.
        let Some(from_cell) = self.cell(p.x, p.y) else {
            return false;
        };
        let Some(to_cell) = p.checked_step(dir).and_then(|to| self.cell(to.x, to.y)) else {
            return false;
        };
        !from_cell.intersects(Cell::border_facing(dir))
            && !to_cell.intersects(Cell::border_facing(dir.reverse()))
            && !to_cell.intersects(Cell::SOLID)
    }

    /// Row-major walk over every cell. Each call starts a fresh pass.
    pub fn walk(&self) -> impl Iterator<Item = Step> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| Step {
                x: x as i32,
                y: y as i32,
                cell: self.cells[y * self.width + x],
            })
        })
    }
}

/// Snapshot of terrain for renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub width: usize,
    pub height: usize,
    /// Flattened cell flags, row-major.
    pub cells: Vec<u8>,
}

impl TerrainSnapshot {
    pub fn from_terrain(terrain: &Terrain) -> Self {
        Self {
            width: terrain.width,
            height: terrain.height,
            cells: terrain.cells.iter().map(|c| c.bits()).collect(),
        }
    }
}

impl From<Terrain> for TerrainSnapshot {
    fn from(terrain: Terrain) -> Self {
        Self::from_terrain(&terrain)
    }
}

impl TryFrom<TerrainSnapshot> for Terrain {
    type Error = TerrainError;

    fn try_from(snapshot: TerrainSnapshot) -> Result<Self, Self::Error> {
        let expected = snapshot.width.checked_mul(snapshot.height);
        if expected != Some(snapshot.cells.len()) {
            return Err(TerrainError::CellCount {
                width: snapshot.width,
                height: snapshot.height,
                actual: snapshot.cells.len(),
            });
        }
        Ok(Self {
            width: snapshot.width,
            height: snapshot.height,
            cells: snapshot.cells.into_iter().map(Cell::from_bits).collect(),
        })
    }
}
