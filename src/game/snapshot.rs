//! Read-only views of the world handed to polling clients

use serde::Serialize;

use super::types::{Direction, Position, GRID_SIZE};
use super::world::{Player, World};

/// One player as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub snake: Vec<Position>,
    pub direction: Direction,
    pub score: u32,
    pub color: &'static str,
    pub alive: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            snake: p.snake.clone(),
            direction: p.direction,
            score: p.score,
            color: p.color,
            alive: p.alive,
        }
    }
}

/// Full world state returned by every poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub food: Option<Position>,
    pub started: bool,
    pub grid_size: i32,
}

impl World {
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.iter().map(PlayerSnapshot::from).collect(),
            food: self.food,
            started: self.started,
            grid_size: GRID_SIZE,
        }
    }
}
