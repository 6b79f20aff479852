use std::time::Duration;

use crate::config::SearchConfig;

/// The clock as handed to `think`: time already spent on this move, time left
/// on the mover's clock, and the per-move increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pub elapsed: Duration,
    pub remaining: Duration,
    pub increment: Duration,
}

impl Clock {
    pub fn new(remaining: Duration, increment: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            remaining,
            increment,
        }
    }
}

/// Time allowed for one move: the increment plus an even share of the
/// remaining clock over the moves the game is still expected to last.
pub fn allocate(clock: &Clock, ply_count: u32, config: &SearchConfig) -> Duration {
    let moves_to_go = config
        .expected_game_length
        .saturating_sub(ply_count / 2)
        .max(config.min_moves_to_go)
        .max(1);
    clock.increment + clock.remaining / moves_to_go
}
