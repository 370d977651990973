//! Game simulation modules

pub mod snapshot;
pub mod tick;
pub mod types;
pub mod world;

pub use snapshot::WorldSnapshot;
pub use types::Direction;
pub use world::{JoinOutcome, World};

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Handle to the single process-wide world.
///
/// Every operation takes the lock for its whole duration, so joins, direction
/// changes, leaves and ticks never interleave. The lock is never held across
/// an `.await`.
#[derive(Clone, Default)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    pub fn join(&self, player_id: &str) -> JoinOutcome {
        self.inner.lock().join(player_id)
    }

    pub fn set_direction(&self, player_id: &str, direction: Direction) {
        self.inner.lock().set_direction(player_id, direction);
    }

    pub fn leave(&self, player_id: &str) {
        self.inner.lock().leave(player_id);
    }

    /// Advance if due, then return the resulting view
    pub fn snapshot(&self, now: u64) -> WorldSnapshot {
        let mut world = self.inner.lock();
        if let Some(report) = world.advance(now) {
            trace!(died = report.died.len(), ate = report.ate.len(), "Tick applied");
        }
        world.snapshot()
    }

    /// Player count and round flag, without ticking
    pub fn status(&self) -> (usize, usize, bool) {
        let world = self.inner.lock();
        (world.player_count(), world.alive_count(), world.started())
    }
}
