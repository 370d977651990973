//! World state and the session operations that mutate it between ticks

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::types::{Direction, Position, MIN_PLAYERS, PALETTE};

/// A player in the arena (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    /// Head first, never empty
    pub snake: Vec<Position>,
    pub direction: Direction,
    pub score: u32,
    pub color: &'static str,
    pub alive: bool,
}

impl Player {
    pub fn new(id: String, spawn: Position, color: &'static str) -> Self {
        Self {
            id,
            snake: vec![spawn],
            direction: Direction::Right,
            score: 0,
            color,
            alive: true,
        }
    }

    pub fn head(&self) -> Position {
        self.snake[0]
    }
}

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub color: &'static str,
    /// True while fewer than two players are present
    pub waiting: bool,
}

/// The whole shared game world
#[derive(Debug)]
pub struct World {
    /// Join order, which also decides colour assignment
    pub(super) players: Vec<Player>,
    pub(super) food: Option<Position>,
    pub(super) started: bool,
    /// Unix millis of the last applied tick
    pub(super) last_tick: u64,
    pub(super) rng: ChaCha8Rng,
}

impl World {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic world for replays and tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            players: Vec::new(),
            food: None,
            started: false,
            last_tick: 0,
            rng,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Add a player. Joining twice with the same id changes nothing.
    pub fn join(&mut self, player_id: &str) -> JoinOutcome {
        let color = match self.player(player_id) {
            Some(existing) => existing.color,
            None => self.spawn_player(player_id),
        };

        JoinOutcome {
            color,
            waiting: self.players.len() < MIN_PLAYERS,
        }
    }

    fn spawn_player(&mut self, player_id: &str) -> &'static str {
        let color = PALETTE[self.players.len() % PALETTE.len()];
        let spawn = Position::random(&mut self.rng);
        self.players
            .push(Player::new(player_id.to_string(), spawn, color));
        info!(player_id, color, x = spawn.x, y = spawn.y, "Player joined");

        if self.food.is_none() {
            self.food = Some(Position::random(&mut self.rng));
        }

        if self.players.len() >= MIN_PLAYERS && !self.started {
            self.started = true;
            info!(players = self.players.len(), "Round started");
        }

        color
    }

    /// Queue a new facing for the next tick. Reversing straight back is ignored.
    pub fn set_direction(&mut self, player_id: &str, direction: Direction) {
        let Some(player) = self.player_mut(player_id) else {
            return;
        };

        if direction == player.direction.opposite() {
            debug!(player_id, ?direction, "Ignoring reversal");
            return;
        }

        player.direction = direction;
    }

    /// Remove a player, dead or alive
    pub fn leave(&mut self, player_id: &str) {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        if self.players.len() != before {
            info!(player_id, "Player left");
        }

        if self.players.len() < MIN_PLAYERS && self.started {
            self.started = false;
            info!(players = self.players.len(), "Round stopped");
        }
    }

    /// Draw a fresh food cell different from the one just eaten
    pub(super) fn relocate_food(&mut self) {
        let previous = self.food;
        let mut next = Position::random(&mut self.rng);
        while Some(next) == previous {
            next = Position::random(&mut self.rng);
        }
        self.food = Some(next);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_join_waits_second_starts() {
        let mut world = World::with_seed(1);

        let a = world.join("A");
        assert!(a.waiting);
        assert!(!world.started());
        assert!(world.food().is_some());

        let b = world.join("B");
        assert!(!b.waiting);
        assert!(world.started());
        assert!(world.food().is_some());
    }

    #[test]
    fn join_is_idempotent() {
        let mut world = World::with_seed(2);
        let first = world.join("A");
        let spawn = world.player("A").unwrap().head();

        let again = world.join("A");
        assert_eq!(first, again);
        assert_eq!(world.player_count(), 1);
        assert_eq!(world.player("A").unwrap().head(), spawn);
    }

    #[test]
    fn new_player_defaults() {
        let mut world = World::with_seed(3);
        world.join("A");
        let player = world.player("A").unwrap();
        assert_eq!(player.snake.len(), 1);
        assert_eq!(player.direction, Direction::Right);
        assert_eq!(player.score, 0);
        assert!(player.alive);
    }

    #[test]
    fn rejoin_keeps_colour_assigned_at_first_join() {
        let mut world = World::with_seed(11);
        world.join("A");
        let b = world.join("B").color;
        world.leave("A");

        // B now sits at index 0 but keeps the colour it was given.
        assert_eq!(world.join("B").color, b);
        assert_eq!(b, PALETTE[1]);
    }

    #[test]
    fn colours_rotate_through_palette() {
        let mut world = World::with_seed(4);
        let colours: Vec<_> = (0..7).map(|i| world.join(&format!("p{i}")).color).collect();
        assert_eq!(&colours[..6], &PALETTE[..]);
        assert_eq!(colours[6], PALETTE[0]);
    }

    #[test]
    fn colour_follows_current_count_after_leave() {
        let mut world = World::with_seed(5);
        world.join("A");
        world.join("B");
        world.leave("A");
        assert_eq!(world.join("C").color, PALETTE[1]);
    }

    #[test]
    fn reversal_is_rejected() {
        let mut world = World::with_seed(6);
        world.join("A");

        world.set_direction("A", Direction::Left);
        assert_eq!(world.player("A").unwrap().direction, Direction::Right);

        world.set_direction("A", Direction::Up);
        assert_eq!(world.player("A").unwrap().direction, Direction::Up);

        world.set_direction("A", Direction::Down);
        assert_eq!(world.player("A").unwrap().direction, Direction::Up);
    }

    #[test]
    fn unknown_player_is_ignored() {
        let mut world = World::with_seed(7);
        world.join("A");
        world.set_direction("ghost", Direction::Up);
        world.leave("ghost");
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn leave_below_two_stops_round() {
        let mut world = World::with_seed(8);
        world.join("A");
        world.join("B");
        world.join("C");

        world.leave("A");
        assert!(world.started());

        world.leave("B");
        assert!(!world.started());
        assert!(world.player("C").is_some());

        world.join("D");
        assert!(world.started());
    }

    #[test]
    fn leave_removes_dead_players_too() {
        let mut world = World::with_seed(9);
        world.join("A");
        world.join("B");
        world.players[0].alive = false;

        world.leave("A");
        assert!(world.player("A").is_none());
    }

    #[test]
    fn relocated_food_moves() {
        let mut world = World::with_seed(10);
        world.join("A");
        for _ in 0..200 {
            let before = world.food();
            world.relocate_food();
            assert_ne!(world.food(), before);
        }
    }
}
