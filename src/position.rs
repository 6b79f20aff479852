//! The contract between the search and the game it plays.
//!
//! The search never inspects a board directly. It walks the game tree through
//! [`Position`], applying and undoing moves in strict LIFO order, and reads
//! piece placement through [`PieceView`] only when it needs a static
//! evaluation.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use crate::board::{Color, Piece};

/// A candidate move as seen by the move orderer.
pub trait SearchMove: Copy + PartialEq + Debug {
    fn is_capture(&self) -> bool;

    fn moving_piece(&self) -> Piece;

    fn captured_piece(&self) -> Option<Piece>;
}

/// Mutable game state walked by the search.
pub trait Position {
    type Move: SearchMove;

    /// Legal moves for the side to move. With `captures_only` set, only
    /// captures are produced.
    fn legal_moves(&self, captures_only: bool) -> Vec<Self::Move>;

    fn make_move(&mut self, mv: Self::Move);

    /// Reverts `mv`, which must be the most recently applied move.
    fn undo_move(&mut self, mv: Self::Move);

    /// Draw by rule (repetition, move counter, material). Stalemate is left to the caller.
    fn is_draw(&self) -> bool;

    fn is_in_check(&self) -> bool;

    fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.legal_moves(false).is_empty()
    }

    fn side_to_move(&self) -> Color;

    /// Identity of the position, equal for transpositions.
    fn key(&self) -> u64;

    fn ply_count(&self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedPiece {
    pub piece: Piece,
    pub color: Color,
    pub square: u8,
}

/// Piece enumeration used by static evaluation.
pub trait PieceView {
    fn pieces(&self) -> Vec<PlacedPiece>;

    /// Squares a `piece` of `color` on `square` would attack in the current position.
    fn attacks(&self, piece: Piece, square: u8, color: Color) -> u64;
}

/// A move applied to a position for the lifetime of the guard.
///
/// The move is undone when the guard drops, so every exit from the scope that
/// owns it (normal return, cutoff, abort) restores the position.
pub struct MoveGuard<'a, P: Position> {
    position: &'a mut P,
    mv: P::Move,
}

impl<'a, P: Position> MoveGuard<'a, P> {
    pub fn new(position: &'a mut P, mv: P::Move) -> Self {
        position.make_move(mv);
        Self { position, mv }
    }
}

impl<P: Position> Deref for MoveGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        self.position
    }
}

impl<P: Position> DerefMut for MoveGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.position
    }
}

impl<P: Position> Drop for MoveGuard<'_, P> {
    fn drop(&mut self) {
        self.position.undo_move(self.mv);
    }
}
