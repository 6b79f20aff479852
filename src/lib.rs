//! Chinook: a small UCI chess engine built around an iterative-deepening
//! alpha-beta search over a generic [`position::Position`].

pub mod board;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen;
pub mod ordering;
pub mod position;
pub mod search;
pub mod time;
pub mod transposition;
pub mod uci;

pub use config::SearchConfig;
pub use evaluation::{Evaluate, Evaluator};
pub use game::Game;
pub use position::{MoveGuard, PieceView, Position, SearchMove};
pub use search::{Engine, SearchLimits, SearchResult};
pub use time::Clock;
