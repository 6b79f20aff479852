use crate::board::{Color, Piece};
use crate::position::{PieceView, Position};

/// Static evaluation of a quiet horizon position, from the side to move's
/// point of view.
pub trait Evaluate<P> {
    fn evaluate(&self, position: &P) -> i32;
}

/// Material plus attack-count mobility, with a king exposure penalty.
#[derive(Debug, Clone)]
pub struct Evaluator {
    /// Per piece kind; the king entry is ignored because the king is royal.
    pub material: [i32; 6],
    /// Weight per attacked square, per piece kind. The king entry is ignored.
    pub mobility: [i32; 6],
    /// Penalty per square a queen standing on the king's square would reach.
    pub king_exposure: i32,
    /// Bonus for a king standing on its castled square.
    pub castled_king_bonus: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            material: Piece::ALL.map(Piece::value),
            mobility: [1, 1, 1, 1, 0, 0],
            king_exposure: 1,
            castled_king_bonus: 50,
        }
    }

    fn is_castled_square(square: u8, color: Color) -> bool {
        match color {
            Color::White => square == 2 || square == 6,
            Color::Black => square == 58 || square == 62,
        }
    }
}

impl<P: Position + PieceView> Evaluate<P> for Evaluator {
    fn evaluate(&self, position: &P) -> i32 {
        let mut score = 0;

        for placed in position.pieces() {
            let sign = if placed.color == Color::White { 1 } else { -1 };
            let kind = placed.piece.index();

            if placed.piece.is_royal() {
                let exposure = position
                    .attacks(Piece::Queen, placed.square, placed.color)
                    .count_ones() as i32;
                score -= sign * exposure * self.king_exposure;
                if Self::is_castled_square(placed.square, placed.color) {
                    score += sign * self.castled_king_bonus;
                }
            } else {
                let reach = position
                    .attacks(placed.piece, placed.square, placed.color)
                    .count_ones() as i32;
                score += sign * (self.material[kind] + reach * self.mobility[kind]);
            }
        }

        match position.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        }
    }
}
