//! Tick engine: lazy, poll-driven world advancement

use tracing::{debug, info};

use super::types::{Position, FOOD_SCORE, TICK_INTERVAL_MS};
use super::world::World;

/// What happened during one applied tick
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Players that collided this tick
    pub died: Vec<String>,
    /// Players that picked up food this tick
    pub ate: Vec<String>,
}

impl World {
    /// Advance one step if the round is running and the tick interval has
    /// elapsed since the last one. Returns `None` when nothing happened.
    pub fn advance(&mut self, now: u64) -> Option<TickReport> {
        if !self.started || now.saturating_sub(self.last_tick) < TICK_INTERVAL_MS {
            return None;
        }

        let mut report = TickReport::default();

        // Players are moved in join order and each move is applied at once,
        // so later movers see earlier movers' new bodies.
        for index in 0..self.players.len() {
            if self.players[index].alive {
                self.move_one(index, &mut report);
            }
        }

        self.last_tick = now;
        Some(report)
    }

    fn move_one(&mut self, index: usize, report: &mut TickReport) {
        let player = &self.players[index];
        let candidate = player.head().step(player.direction);

        if self.collides(index, candidate) {
            let player = &mut self.players[index];
            player.alive = false;
            info!(player_id = %player.id, score = player.score, "Snake crashed");
            report.died.push(player.id.clone());
            return;
        }

        let ate = self.food == Some(candidate);
        let player = &mut self.players[index];
        player.snake.insert(0, candidate);

        if ate {
            player.score += FOOD_SCORE;
            debug!(player_id = %player.id, score = player.score, "Food eaten");
            report.ate.push(player.id.clone());
            self.relocate_food();
        } else {
            player.snake.pop();
        }
    }

    /// Whether `candidate` hits any live snake. The mover's own head is
    /// excluded; every segment of another snake counts.
    fn collides(&self, mover: usize, candidate: Position) -> bool {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alive)
            .any(|(index, p)| {
                let skip = usize::from(index == mover);
                p.snake.iter().skip(skip).any(|&segment| segment == candidate)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Direction, GRID_SIZE};
    use proptest::prelude::*;

    fn place(world: &mut World, id: &str, snake: &[(i32, i32)], direction: Direction) {
        let player = world.players.iter_mut().find(|p| p.id == id).unwrap();
        player.snake = snake.iter().map(|&(x, y)| Position::new(x, y)).collect();
        player.direction = direction;
    }

    fn two_player_world(seed: u64) -> World {
        let mut world = World::with_seed(seed);
        world.join("A");
        world.join("B");
        world
    }

    #[test]
    fn no_tick_before_round_starts() {
        let mut world = World::with_seed(1);
        world.join("A");
        let before = world.player("A").unwrap().snake.clone();

        assert!(world.advance(10_000).is_none());
        assert_eq!(world.player("A").unwrap().snake, before);
    }

    #[test]
    fn interval_gates_ticks() {
        let mut world = two_player_world(2);
        place(&mut world, "A", &[(5, 5)], Direction::Right);
        place(&mut world, "B", &[(20, 20)], Direction::Right);
        world.food = Some(Position::new(0, 0));

        assert!(world.advance(1_000).is_some());
        assert!(world.advance(1_100).is_none());
        assert_eq!(world.player("A").unwrap().head(), Position::new(6, 5));

        assert!(world.advance(1_150).is_some());
        assert_eq!(world.player("A").unwrap().head(), Position::new(7, 5));
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut world = two_player_world(3);
        place(&mut world, "A", &[(5, 5)], Direction::Right);
        place(&mut world, "B", &[(20, 20)], Direction::Down);
        world.food = Some(Position::new(6, 5));

        let report = world.advance(1_000).unwrap();
        assert_eq!(report.ate, vec!["A".to_string()]);

        let a = world.player("A").unwrap();
        assert_eq!(a.head(), Position::new(6, 5));
        assert_eq!(a.snake.len(), 2);
        assert_eq!(a.score, 10);
        assert!(world.food().is_some());
        assert_ne!(world.food(), Some(Position::new(6, 5)));
    }

    #[test]
    fn moving_without_food_keeps_length() {
        let mut world = two_player_world(4);
        place(&mut world, "A", &[(5, 5), (4, 5), (3, 5)], Direction::Right);
        place(&mut world, "B", &[(20, 20)], Direction::Down);
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        let a = world.player("A").unwrap();
        assert_eq!(
            a.snake,
            vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]
        );
        assert_eq!(a.score, 0);
    }

    #[test]
    fn left_edge_wraps() {
        let mut world = two_player_world(5);
        place(&mut world, "A", &[(0, 5)], Direction::Left);
        place(&mut world, "B", &[(20, 20)], Direction::Down);
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        assert_eq!(world.player("A").unwrap().head(), Position::new(39, 5));
    }

    #[test]
    fn hitting_another_tail_kills_and_freezes() {
        let mut world = two_player_world(6);
        place(&mut world, "A", &[(12, 10), (11, 10), (10, 10)], Direction::Up);
        // B moves after A; by then A's tail has moved to (11, 10).
        place(&mut world, "B", &[(11, 11), (11, 12)], Direction::Up);
        world.food = Some(Position::new(0, 0));

        let report = world.advance(1_000).unwrap();
        assert_eq!(report.died, vec!["B".to_string()]);

        let b = world.player("B").unwrap();
        assert!(!b.alive);
        assert_eq!(b.snake, vec![Position::new(11, 11), Position::new(11, 12)]);
        assert!(world.player("A").unwrap().alive);
    }

    #[test]
    fn running_into_own_body_is_fatal() {
        let mut world = two_player_world(7);
        place(
            &mut world,
            "A",
            &[(5, 5), (5, 6), (6, 6), (6, 5), (6, 4)],
            Direction::Right,
        );
        place(&mut world, "B", &[(20, 20)], Direction::Down);
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        assert!(!world.player("A").unwrap().alive);
    }

    #[test]
    fn dead_snakes_stay_frozen() {
        let mut world = two_player_world(8);
        place(&mut world, "A", &[(5, 5)], Direction::Right);
        place(&mut world, "B", &[(20, 20)], Direction::Down);
        world.players[0].alive = false;
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        world.advance(2_000);
        let a = world.player("A").unwrap();
        assert!(!a.alive);
        assert_eq!(a.snake, vec![Position::new(5, 5)]);
    }

    #[test]
    fn dead_snakes_do_not_block() {
        let mut world = two_player_world(9);
        place(&mut world, "A", &[(6, 5)], Direction::Up);
        place(&mut world, "B", &[(5, 5)], Direction::Right);
        world.players[0].alive = false;
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        let b = world.player("B").unwrap();
        assert!(b.alive);
        assert_eq!(b.head(), Position::new(6, 5));
    }

    #[test]
    fn earlier_mover_collides_with_unmoved_later_snake() {
        let mut world = two_player_world(10);
        // A moves first into B's current head cell.
        place(&mut world, "A", &[(4, 5)], Direction::Right);
        place(&mut world, "B", &[(5, 5)], Direction::Right);
        world.food = Some(Position::new(0, 0));

        world.advance(1_000);
        assert!(!world.player("A").unwrap().alive);
        assert!(world.player("B").unwrap().alive);
        assert_eq!(world.player("B").unwrap().head(), Position::new(6, 5));
    }

    #[test]
    fn stopped_round_freezes_everything() {
        let mut world = two_player_world(11);
        world.leave("B");
        let before = world.player("A").unwrap().snake.clone();
        assert!(world.advance(5_000).is_none());
        assert_eq!(world.player("A").unwrap().snake, before);
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn heads_stay_on_grid_and_lengths_never_shrink(
            seed in any::<u64>(),
            turns in proptest::collection::vec((0usize..3, direction_strategy()), 1..120),
        ) {
            let mut world = World::with_seed(seed);
            world.join("A");
            world.join("B");
            world.join("C");

            let mut now = 0u64;
            let mut was_dead = [false; 3];
            for (who, dir) in turns {
                let id = ["A", "B", "C"][who];
                world.set_direction(id, dir);

                let lengths: Vec<usize> = world.players().iter().map(|p| p.snake.len()).collect();
                now += TICK_INTERVAL_MS;
                world.advance(now);

                for (i, p) in world.players().iter().enumerate() {
                    let head = p.head();
                    prop_assert!((0..GRID_SIZE).contains(&head.x));
                    prop_assert!((0..GRID_SIZE).contains(&head.y));
                    prop_assert!(p.snake.len() == lengths[i] || p.snake.len() == lengths[i] + 1);
                    if was_dead[i] {
                        prop_assert!(!p.alive);
                    }
                    was_dead[i] = !p.alive;
                }
            }
        }
    }
}
