use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,      // The score is the value of the position at that depth.
    LowerBound, // A beta cutoff: the value is at least the score.
    UpperBound, // No move raised alpha: the value is at most the score.
}

#[derive(Debug, Clone, Copy)]
pub struct TranspositionEntry<M> {
    pub key: u64,
    pub depth: u8,
    pub bound: Bound,
    pub score: i32,
    pub best_move: Option<M>,
}

/// Fixed-capacity, one-entry-per-slot cache of search results.
///
/// Writes always replace whatever occupies the slot. A slot only answers for
/// the exact key it holds.
pub struct TranspositionTable<M> {
    entries: Vec<Option<TranspositionEntry<M>>>,
    size_mb: usize,
}

impl<M: Copy> TranspositionTable<M> {
    pub fn new(size_mb: usize) -> Self {
        Self {
            entries: vec![None; Self::slots_for(size_mb)],
            size_mb,
        }
    }

    fn slots_for(size_mb: usize) -> usize {
        let entry_size = mem::size_of::<Option<TranspositionEntry<M>>>();
        (size_mb.saturating_mul(1024 * 1024) / entry_size).max(1)
    }

    pub fn resize(&mut self, size_mb: usize) {
        self.entries = vec![None; Self::slots_for(size_mb)];
        self.size_mb = size_mb;
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }

    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    fn entry(&self, key: u64) -> Option<&TranspositionEntry<M>> {
        self.entries[self.index(key)]
            .as_ref()
            .filter(|entry| entry.key == key)
    }

    /// Records a result for `key`. Horizon depths (zero or below) share depth 0.
    pub fn store(&mut self, key: u64, depth: i32, bound: Bound, score: i32, best_move: Option<M>) {
        let index = self.index(key);
        self.entries[index] = Some(TranspositionEntry {
            key,
            depth: depth.clamp(0, u8::MAX as i32) as u8,
            bound,
            score,
            best_move,
        });
    }

    /// Returns a score that settles the node searched at `depth` with window
    /// `(alpha, beta)`, or `None` when the cache cannot decide it.
    pub fn probe(&self, key: u64, depth: i32, alpha: i32, beta: i32) -> Option<i32> {
        let entry = self.entry(key)?;
        if (entry.depth as i32) < depth {
            return None;
        }
        match entry.bound {
            Bound::Exact => Some(entry.score),
            Bound::LowerBound if entry.score >= beta => Some(beta),
            Bound::UpperBound if entry.score <= alpha => Some(alpha),
            _ => None,
        }
    }

    pub fn get_best_move(&self, key: u64) -> Option<M> {
        self.entry(key).and_then(|entry| entry.best_move)
    }

    /// Permille of sampled slots in use.
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        used * 1000 / sample
    }
}
