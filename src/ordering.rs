use std::cmp::Reverse;

use crate::position::SearchMove;

/// Score given to the preferred (cached best) move; above any capture score.
pub const PREFERRED_MOVE_SCORE: i32 = 100_000;

/// Orders candidates so that the moves most likely to cause a cutoff come first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveOrderer;

impl MoveOrderer {
    pub fn new() -> Self {
        Self
    }

    /// MVV-LVA for captures, zero for quiet moves, and a top score for `preferred`.
    pub fn score<M: SearchMove>(&self, mv: &M, preferred: Option<M>) -> i32 {
        if preferred.as_ref() == Some(mv) {
            return PREFERRED_MOVE_SCORE;
        }
        match mv.captured_piece() {
            Some(victim) if mv.is_capture() => {
                debug_assert!(!victim.is_royal(), "king offered as a capture victim");
                10 * victim.value() - mv.moving_piece().value()
            }
            _ => 0,
        }
    }

    pub fn order<M: SearchMove>(&self, mut moves: Vec<M>, preferred: Option<M>) -> Vec<M> {
        moves.sort_by_cached_key(|mv| Reverse(self.score(mv, preferred)));
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;
    use crate::movegen::Move;

    #[test]
    fn test_most_valuable_victim_first() {
        let quiet = Move::new(12, 28, Piece::Pawn);
        let pawn_takes_queen = Move::new_capture(27, 36, Piece::Pawn, Piece::Queen);
        let queen_takes_pawn = Move::new_capture(3, 11, Piece::Queen, Piece::Pawn);
        let knight_takes_rook = Move::new_capture(21, 38, Piece::Knight, Piece::Rook);

        let ordered = MoveOrderer::new().order(
            vec![quiet, queen_takes_pawn, knight_takes_rook, pawn_takes_queen],
            None,
        );
        assert_eq!(
            ordered,
            vec![pawn_takes_queen, knight_takes_rook, queen_takes_pawn, quiet]
        );
    }

    #[test]
    fn test_preferred_move_goes_first() {
        let orderer = MoveOrderer::new();
        let quiet = Move::new(6, 21, Piece::Knight);
        let capture = Move::new_capture(27, 36, Piece::Pawn, Piece::Queen);

        let ordered = orderer.order(vec![capture, quiet], Some(quiet));
        assert_eq!(ordered[0], quiet);
        assert_eq!(orderer.score(&quiet, Some(quiet)), PREFERRED_MOVE_SCORE);
        assert!(orderer.score(&capture, None) < PREFERRED_MOVE_SCORE);
    }

    #[test]
    fn test_quiet_moves_score_zero() {
        let orderer = MoveOrderer::new();
        assert_eq!(orderer.score(&Move::new(12, 20, Piece::Pawn), None), 0);
        assert_eq!(orderer.score(&Move::new_castling(4, 6), None), 0);
    }
}
