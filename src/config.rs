/// Engine settings. `Default` reproduces the tuned reference values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Transposition table budget in megabytes.
    pub hash_mb: usize,
    pub max_depth: i32,
    /// Half-width of the aspiration window around the previous depth's score.
    pub aspiration_window: i32,
    /// Moves the game is assumed to last when splitting the clock.
    pub expected_game_length: u32,
    /// Lower bound on the number of moves the remaining clock is split over.
    pub min_moves_to_go: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hash_mb: 64,
            max_depth: 50,
            aspiration_window: 50,
            expected_game_length: 50,
            min_moves_to_go: 20,
        }
    }
}

impl SearchConfig {
    pub fn with_hash_mb(mut self, hash_mb: usize) -> Self {
        self.hash_mb = hash_mb;
        self
    }

    pub fn with_max_depth(mut self, max_depth: i32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
