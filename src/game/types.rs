//! Grid primitives and game constants

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Width and height of the square, toroidal grid
pub const GRID_SIZE: i32 = 40;

/// Minimum wall-clock gap between two ticks
pub const TICK_INTERVAL_MS: u64 = 150;

/// Score awarded per food pickup
pub const FOOD_SCORE: u32 = 10;

/// Players needed before a round starts
pub const MIN_PLAYERS: usize = 2;

/// Player colours, assigned by join order
pub const PALETTE: [&str; 6] = [
    "#F97316", "#8B5CF6", "#0EA5E9", "#10B981", "#F59E0B", "#EC4899",
];

/// A grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Uniformly random cell on the grid
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0..GRID_SIZE),
            y: rng.gen_range(0..GRID_SIZE),
        }
    }

    /// Neighbouring cell in `direction`, wrapped onto the torus
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: (self.x + dx).rem_euclid(GRID_SIZE),
            y: (self.y + dy).rem_euclid(GRID_SIZE),
        }
    }
}

/// Facing of a snake. Screen coordinates: UP decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid direction: {0:?} (expected UP, DOWN, LEFT or RIGHT)")]
pub struct InvalidDirection(pub String);
