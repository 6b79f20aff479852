//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! The [`Engine`] owns the pieces that outlive a single move (transposition
//! table, evaluator, configuration). Everything that belongs to one call of
//! [`Engine::think`] lives in a `SearchContext` that is created at the start of
//! the call and dropped at its end.
//!
//! Time is checked cooperatively: after each child subtree returns, a node
//! looks at the clock and stops expanding siblings once the budget is spent.
//! An aborted subtree still returns its current alpha, which callers treat as
//! ordinary data.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::SearchConfig;
use crate::evaluation::{Evaluate, Evaluator};
use crate::ordering::MoveOrderer;
use crate::position::{MoveGuard, Position, SearchMove};
use crate::time::{self, Clock};
use crate::transposition::{Bound, TranspositionTable};

/// Bound of the full search window.
pub const INFINITY: i32 = 30_000;
/// Base of the mate band. A mate found with `d` plies of depth left scores
/// `MATE + d`, so shorter mates score higher.
pub const MATE: i32 = 25_000;
pub const DRAW: i32 = 0;

pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE - 1_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: i32,
    /// Hard budget for the whole call. `None` searches until `max_depth`.
    pub think_time: Option<Duration>,
    /// Time already spent on this move before the search started.
    pub already_elapsed: Duration,
}

impl SearchLimits {
    pub fn depth(max_depth: i32) -> Self {
        Self {
            max_depth,
            think_time: None,
            already_elapsed: Duration::ZERO,
        }
    }

    pub fn timed(max_depth: i32, think_time: Duration) -> Self {
        Self {
            think_time: Some(think_time),
            ..Self::depth(max_depth)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult<M> {
    pub best_move: Option<M>,
    pub score: i32,
    /// Deepest fully completed iteration.
    pub depth: i32,
    pub nodes: u64,
    /// Aspiration failures that forced a full-window re-search.
    pub researches: u32,
    pub aborted: bool,
    pub elapsed: Duration,
}

impl<M> SearchResult<M> {
    fn empty() -> Self {
        Self {
            best_move: None,
            score: -INFINITY,
            depth: 0,
            nodes: 0,
            researches: 0,
            aborted: false,
            elapsed: Duration::ZERO,
        }
    }
}

struct SearchContext<M> {
    started: Instant,
    already_elapsed: Duration,
    think_time: Option<Duration>,
    stopped: bool,
    root_best_move: Option<M>,
    root_best_score: i32,
    depth: i32,
    nodes: u64,
}

impl<M: SearchMove> SearchContext<M> {
    fn new(limits: &SearchLimits) -> Self {
        Self {
            started: Instant::now(),
            already_elapsed: limits.already_elapsed,
            think_time: limits.think_time,
            stopped: false,
            root_best_move: None,
            root_best_score: -INFINITY,
            depth: 0,
            nodes: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        self.already_elapsed + self.started.elapsed()
    }

    fn should_stop(&mut self) -> bool {
        if !self.stopped {
            if let Some(limit) = self.think_time {
                self.stopped = self.elapsed() > limit;
            }
        }
        self.stopped
    }

    /// Past half the budget a new iteration is unlikely to finish.
    fn past_soft_limit(&self) -> bool {
        matches!(self.think_time, Some(limit) if self.elapsed() > limit / 2)
    }

    fn begin_iteration(&mut self, depth: i32) {
        self.depth = depth;
        self.root_best_move = None;
        self.root_best_score = -INFINITY;
    }

    fn offer_root(&mut self, mv: M, score: i32) {
        if score > self.root_best_score {
            self.root_best_score = score;
            self.root_best_move = Some(mv);
        }
    }
}

pub struct Engine<M, E = Evaluator> {
    table: TranspositionTable<M>,
    orderer: MoveOrderer,
    evaluator: E,
    config: SearchConfig,
}

impl<M: SearchMove> Engine<M, Evaluator> {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_evaluator(config, Evaluator::new())
    }
}

impl<M: SearchMove, E> Engine<M, E> {
    pub fn with_evaluator(config: SearchConfig, evaluator: E) -> Self {
        Self {
            table: TranspositionTable::new(config.hash_mb),
            orderer: MoveOrderer::new(),
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn table(&self) -> &TranspositionTable<M> {
        &self.table
    }

    pub fn clear_table(&mut self) {
        self.table.clear();
    }

    pub fn resize_table(&mut self, hash_mb: usize) {
        self.table.resize(hash_mb);
        self.config.hash_mb = hash_mb;
    }

    /// Limits for a clock-driven move.
    pub fn limits_for(&self, clock: &Clock, ply_count: u32) -> SearchLimits {
        SearchLimits {
            max_depth: self.config.max_depth,
            think_time: Some(time::allocate(clock, ply_count, &self.config)),
            already_elapsed: clock.elapsed,
        }
    }

    /// Picks a move within the time the clock allows. Returns `None` only
    /// when the side to move has no legal move.
    pub fn think<P>(&mut self, position: &mut P, clock: &Clock) -> Option<M>
    where
        P: Position<Move = M>,
        E: Evaluate<P>,
    {
        let limits = self.limits_for(clock, position.ply_count());
        let result = self.iterate(position, limits);
        info!(
            "think: depth {} score {} nodes {} in {:?} (budget {:?})",
            result.depth, result.score, result.nodes, result.elapsed, limits.think_time
        );
        result.best_move
    }

    /// Searches to exactly `depth` with no time limit.
    pub fn search_depth<P>(&mut self, position: &mut P, depth: i32) -> SearchResult<M>
    where
        P: Position<Move = M>,
        E: Evaluate<P>,
    {
        self.iterate(position, SearchLimits::depth(depth))
    }

    /// The iterative-deepening driver.
    pub fn iterate<P>(&mut self, position: &mut P, limits: SearchLimits) -> SearchResult<M>
    where
        P: Position<Move = M>,
        E: Evaluate<P>,
    {
        let mut ctx = SearchContext::new(&limits);
        let mut result = SearchResult::empty();
        let (mut alpha, mut beta) = (-INFINITY, INFINITY);
        let mut depth = 1;

        while depth <= limits.max_depth {
            ctx.begin_iteration(depth);
            let score = self.search(position, &mut ctx, depth, alpha, beta, true);

            if ctx.stopped {
                // A partial iteration only wins if it found something strictly better.
                if let Some(mv) = ctx.root_best_move {
                    if result.best_move.is_none() || ctx.root_best_score > result.score {
                        debug!(
                            "depth {} aborted, keeping partial root {:?} ({} > {})",
                            ctx.depth, mv, ctx.root_best_score, result.score
                        );
                        result.best_move = Some(mv);
                        result.score = ctx.root_best_score;
                    }
                }
                result.aborted = true;
                break;
            }

            let windowed = alpha > -INFINITY || beta < INFINITY;
            if windowed && (score <= alpha || score >= beta) {
                debug!(
                    "depth {}: score {} outside window [{}, {}], re-searching",
                    depth, score, alpha, beta
                );
                alpha = -INFINITY;
                beta = INFINITY;
                result.researches += 1;
                continue;
            }

            if ctx.root_best_move.is_some() {
                result.best_move = ctx.root_best_move;
            }
            result.score = score;
            result.depth = depth;
            debug!(
                "depth {} score {} best {:?} nodes {} hashfull {}",
                depth,
                score,
                result.best_move,
                ctx.nodes,
                self.table.hashfull()
            );

            if ctx.past_soft_limit() {
                break;
            }
            alpha = score - self.config.aspiration_window;
            beta = score + self.config.aspiration_window;
            depth += 1;
        }

        if result.best_move.is_none() {
            result.best_move = self.first_candidate(position);
        }
        result.nodes = ctx.nodes;
        result.elapsed = ctx.elapsed();
        result
    }

    fn first_candidate<P>(&self, position: &P) -> Option<M>
    where
        P: Position<Move = M>,
    {
        let preferred = self.table.get_best_move(position.key());
        self.orderer
            .order(position.legal_moves(false), preferred)
            .into_iter()
            .next()
    }

    fn search<P>(
        &mut self,
        position: &mut P,
        ctx: &mut SearchContext<M>,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        root: bool,
    ) -> i32
    where
        P: Position<Move = M>,
        E: Evaluate<P>,
    {
        ctx.nodes += 1;

        if position.is_draw() {
            return DRAW;
        }

        let key = position.key();
        if let Some(score) = self.table.probe(key, depth, alpha, beta) {
            if !root {
                return score;
            }
            // At the root the cached move must be playable here before it is trusted.
            let cached = self
                .table
                .get_best_move(key)
                .filter(|mv| position.legal_moves(false).contains(mv));
            if let Some(mv) = cached {
                ctx.offer_root(mv, score);
                return score;
            }
        }

        // At the first horizon ply a side in check looks at every evasion, so mates are seen.
        let evading = depth == 0 && position.is_in_check();
        let quiescent = depth <= 0 && !evading;
        let moves = position.legal_moves(quiescent);

        if quiescent {
            let stand_pat = self.evaluator.evaluate(position);
            if stand_pat >= beta {
                return beta;
            }
            if alpha < stand_pat {
                alpha = stand_pat;
            }
            if moves.is_empty() {
                return alpha;
            }
        } else if moves.is_empty() {
            return if evading || position.is_in_check() {
                -MATE - depth
            } else {
                DRAW
            };
        }

        let moves = self.orderer.order(moves, self.table.get_best_move(key));
        let mut best_move = moves[0];
        let mut bound = Bound::UpperBound;

        for mv in moves {
            let score = {
                let mut child = MoveGuard::new(&mut *position, mv);
                -self.search(&mut *child, ctx, depth - 1, -beta, -alpha, false)
            };

            if root {
                ctx.offer_root(mv, score);
            }

            if score >= beta {
                self.table
                    .store(key, depth, Bound::LowerBound, beta, Some(mv));
                return beta;
            }
            if score > alpha {
                alpha = score;
                best_move = mv;
                bound = Bound::Exact;
            }

            if ctx.should_stop() {
                break;
            }
        }

        self.table.store(key, depth, bound, alpha, Some(best_move));
        alpha
    }
}
