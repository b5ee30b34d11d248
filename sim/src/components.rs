//! ECS components for the grid simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::events::TargetAcquired;
use crate::point::Point;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Public entity identifier. The store always hands out the lowest unused id.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic category of an entity. Behavior picks targets by kind.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[default]
    None,
    Human,
    Apple,
}

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Authoritative grid cell of an entity. Only changes when a movement leg completes.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position(pub Point);

/// Interpolated position in cell units, for drawing.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPosition {
    pub x: f32,
    pub y: f32,
}

impl RenderPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between two cells, `t` in [0, 1].
    pub fn lerp(from: Point, to: Point, t: f32) -> Self {
        Self {
            x: from.x as f32 * (1.0 - t) + to.x as f32 * t,
            y: from.y as f32 * (1.0 - t) + to.y as f32 * t,
        }
    }
}

impl From<Point> for RenderPosition {
    fn from(p: Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

// ============================================================================
// NAVIGATION COMPONENTS
// ============================================================================

/// Planned route plus a cursor at the cell currently being travelled to.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    cells: Vec<Point>,
    current: usize,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cells(&mut self, cells: impl IntoIterator<Item = Point>) {
        self.cells.extend(cells);
    }

    pub fn cells(&self) -> &[Point] {
        &self.cells
    }

    /// Cells from the cursor onward.
    pub fn remaining(&self) -> &[Point] {
        self.cells.get(self.current..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cursor(&self) -> usize {
        self.current
    }

    pub fn current_cell(&self) -> Option<Point> {
        self.cells.get(self.current).copied()
    }

    /// Last planned cell.
    pub fn destination(&self) -> Option<Point> {
        self.cells.last().copied()
    }

    /// Move the cursor one cell forward. Returns false at the end of the path.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.cells.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn at_destination(&self) -> bool {
        self.current + 1 >= self.cells.len()
    }

    /// Drop every cell after the cursor, keeping what movement has already committed to.
    pub fn truncate_after_current(&mut self) {
        self.cells.truncate(self.current + 1);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.current = 0;
    }
}

/// Sub-cell interpolation between two grid cells.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    origin: Point,
    destination: Option<Point>,
    steps: u32,
    current_step: u32,
}

impl Movement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new leg toward `destination` taking `steps` ticks.
    /// The previous destination (if any) becomes the origin.
    pub fn set_destination(&mut self, destination: Point, steps: u32) {
        self.origin = self.destination.unwrap_or(destination);
        self.destination = Some(destination);
        self.steps = steps;
        self.current_step = 0;
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn destination(&self) -> Option<Point> {
        self.destination
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn at_destination(&self) -> bool {
        self.destination.is_some() && self.current_step >= self.steps
    }

    /// Advance one interpolation step, clamped to the leg length.
    pub fn advance_step(&mut self) {
        if self.destination.is_none() || self.at_destination() {
            return;
        }
        self.current_step = (self.current_step + 1).min(self.steps);
    }

    /// Leg completion in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.steps == 0 {
            1.0
        } else {
            self.current_step as f32 / self.steps as f32
        }
    }

    /// Interpolated position along the current leg.
    pub fn interpolated(&self) -> RenderPosition {
        let to = self.destination.unwrap_or(self.origin);
        RenderPosition::lerp(self.origin, to, self.progress())
    }
}

// ============================================================================
// AI COMPONENTS
// ============================================================================

/// What an agent is currently trying to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[default]
    Idle,
    /// Get adjacent to `target`. The target is a weak, id-based reference
    /// and must be checked against the store before use.
    MovingToTarget { target: EntityId },
}

/// Per-entity behavior state.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    goal: Goal,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn target(&self) -> Option<EntityId> {
        match self.goal {
            Goal::Idle => None,
            Goal::MovingToTarget { target } => Some(target),
        }
    }

    pub fn has_target(&self) -> bool {
        self.target().is_some()
    }

    /// Start moving toward `target`. Returns the notification for the event bus.
    pub fn acquire(&mut self, owner: EntityId, target: EntityId) -> TargetAcquired {
        self.goal = Goal::MovingToTarget { target };
        TargetAcquired { agent: owner, target }
    }

    pub fn reset(&mut self) {
        self.goal = Goal::Idle;
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for a mobile agent (human).
#[derive(Bundle, Default)]
pub struct HumanBundle {
    pub kind: Kind,
    pub movement: Movement,
    pub path: Path,
    pub agent: Agent,
}

impl HumanBundle {
    pub fn new() -> Self {
        Self {
            kind: Kind::Human,
            ..Default::default()
        }
    }
}

/// Bundle for a static target (apple).
#[derive(Bundle, Default)]
pub struct AppleBundle {
    pub kind: Kind,
}

impl AppleBundle {
    pub fn new() -> Self {
        Self { kind: Kind::Apple }
    }
}
