use once_cell::sync::Lazy;

use crate::board::{
    squares, Board, Color, Piece, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE,
    WHITE_QUEENSIDE,
};
use crate::position::SearchMove;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promotion: Option<Piece>,
    pub is_en_passant: bool,
    pub is_castling: bool,
}

impl Move {
    pub fn new(from: u8, to: u8, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece: None,
            promotion: None,
            is_en_passant: false,
            is_castling: false,
        }
    }

    pub fn new_capture(from: u8, to: u8, piece: Piece, captured: Piece) -> Self {
        Self {
            captured_piece: Some(captured),
            ..Self::new(from, to, piece)
        }
    }

    pub fn new_en_passant(from: u8, to: u8) -> Self {
        Self {
            captured_piece: Some(Piece::Pawn),
            is_en_passant: true,
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    pub fn new_castling(from: u8, to: u8) -> Self {
        Self {
            is_castling: true,
            ..Self::new(from, to, Piece::King)
        }
    }

    pub fn new_promotion(from: u8, to: u8, captured: Option<Piece>, promotion: Piece) -> Self {
        Self {
            captured_piece: captured,
            promotion: Some(promotion),
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    /// Long algebraic notation as used by UCI, e.g. `e2e4` or `e7e8q`.
    pub fn to_uci(&self) -> String {
        let mut text = format!(
            "{}{}",
            crate::board::square_name(self.from),
            crate::board::square_name(self.to)
        );
        if let Some(promotion) = self.promotion {
            text.push(match promotion {
                Piece::Queen => 'q',
                Piece::Rook => 'r',
                Piece::Bishop => 'b',
                _ => 'n',
            });
        }
        text
    }
}

impl SearchMove for Move {
    fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    fn moving_piece(&self) -> Piece {
        self.piece
    }

    fn captured_piece(&self) -> Option<Piece> {
        self.captured_piece
    }
}

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn leaper_table(steps: &[(i8, i8)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    for (square, attacks) in table.iter_mut().enumerate() {
        let rank = (square / 8) as i8;
        let file = (square % 8) as i8;
        for &(dr, df) in steps {
            let (r, f) = (rank + dr, file + df);
            if (0..8).contains(&r) && (0..8).contains(&f) {
                *attacks |= 1u64 << (r * 8 + f);
            }
        }
    }
    table
}

static KNIGHT_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| leaper_table(&KNIGHT_STEPS));
static KING_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| leaper_table(&KING_STEPS));

fn slider_attacks(square: u8, occupied: u64, directions: &[(i8, i8)]) -> u64 {
    let mut attacks = 0u64;
    let rank = (square / 8) as i8;
    let file = (square % 8) as i8;
    for &(dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = 1u64 << (r * 8 + f);
            attacks |= target;
            if occupied & target != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

fn pawn_attacks(square: u8, color: Color) -> u64 {
    let bit = 1u64 << square;
    let not_a_file = 0xFEFE_FEFE_FEFE_FEFEu64;
    let not_h_file = 0x7F7F_7F7F_7F7F_7F7Fu64;
    match color {
        Color::White => ((bit << 7) & not_h_file) | ((bit << 9) & not_a_file),
        Color::Black => ((bit >> 9) & not_h_file) | ((bit >> 7) & not_a_file),
    }
}

/// Squares attacked by `piece` of `color` standing on `square`.
pub fn attacks(piece: Piece, square: u8, color: Color, occupied: u64) -> u64 {
    match piece {
        Piece::Pawn => pawn_attacks(square, color),
        Piece::Knight => KNIGHT_ATTACKS[square as usize],
        Piece::Bishop => slider_attacks(square, occupied, &DIAGONALS),
        Piece::Rook => slider_attacks(square, occupied, &ORTHOGONALS),
        Piece::Queen => {
            slider_attacks(square, occupied, &DIAGONALS)
                | slider_attacks(square, occupied, &ORTHOGONALS)
        }
        Piece::King => KING_ATTACKS[square as usize],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate(Color), // Color is the winner
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_square_under_attack(&self, board: &Board, square: u8, attacker_color: Color) -> bool {
        let attackers = board.pieces(attacker_color);
        let occupied = board.occupied();

        // A pawn of the attacking color hits `square` from where a defending pawn on `square` would hit.
        pawn_attacks(square, attacker_color.opposite()) & attackers[Piece::Pawn.index()] != 0
            || KNIGHT_ATTACKS[square as usize] & attackers[Piece::Knight.index()] != 0
            || KING_ATTACKS[square as usize] & attackers[Piece::King.index()] != 0
            || slider_attacks(square, occupied, &DIAGONALS)
                & (attackers[Piece::Bishop.index()] | attackers[Piece::Queen.index()])
                != 0
            || slider_attacks(square, occupied, &ORTHOGONALS)
                & (attackers[Piece::Rook.index()] | attackers[Piece::Queen.index()])
                != 0
    }

    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.king_square(color) {
            Some(square) => self.is_square_under_attack(board, square, color.opposite()),
            None => false,
        }
    }

    pub fn is_move_valid(&self, board: &Board, mv: &Move) -> bool {
        self.generate_moves(board).contains(mv)
    }

    pub fn generate_moves(&self, board: &Board) -> Vec<Move> {
        self.generate(board, false)
    }

    /// Legal captures only, including en passant and capturing promotions.
    pub fn generate_captures(&self, board: &Board) -> Vec<Move> {
        self.generate(board, true)
    }

    fn generate(&self, board: &Board, captures_only: bool) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        let us = board.side_to_move;
        let own = board.occupancy(us);
        let theirs = board.occupancy(us.opposite());
        let occupied = own | theirs;

        self.pawn_moves(board, captures_only, &mut moves);

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            for from in squares(board.pieces(us)[piece.index()]) {
                let mut targets = attacks(piece, from, us, occupied) & !own;
                if captures_only {
                    targets &= theirs;
                }
                for to in squares(targets) {
                    moves.push(match board.get_piece_at(to) {
                        Some((captured, _)) => Move::new_capture(from, to, piece, captured),
                        None => Move::new(from, to, piece),
                    });
                }
            }
        }

        if !captures_only {
            self.castling_moves(board, &mut moves);
        }

        moves.retain(|mv| self.leaves_king_safe(board, mv));
        moves
    }

    fn pawn_moves(&self, board: &Board, captures_only: bool, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let theirs = board.occupancy(us.opposite());
        let occupied = board.occupied();
        let (forward, start_rank, last_rank): (i8, u8, u8) = match us {
            Color::White => (8, 1, 7),
            Color::Black => (-8, 6, 0),
        };

        for from in squares(board.pieces(us)[Piece::Pawn.index()]) {
            let one = from as i8 + forward;
            if !captures_only && (0..64).contains(&one) {
                let one = one as u8;
                if occupied & (1u64 << one) == 0 {
                    push_pawn_move(moves, from, one, None, one / 8 == last_rank);
                    let two = (one as i8 + forward) as u8;
                    if from / 8 == start_rank && occupied & (1u64 << two) == 0 {
                        moves.push(Move::new(from, two, Piece::Pawn));
                    }
                }
            }

            let hits = pawn_attacks(from, us);
            for to in squares(hits & theirs) {
                let captured = board.get_piece_at(to).map(|(piece, _)| piece);
                push_pawn_move(moves, from, to, captured, to / 8 == last_rank);
            }
            if let Some(ep_square) = board.en_passant_square {
                if hits & (1u64 << ep_square) != 0 {
                    moves.push(Move::new_en_passant(from, ep_square));
                }
            }
        }
    }

    fn castling_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let them = us.opposite();
        let (home, kingside, queenside) = match us {
            Color::White => (0u8, WHITE_KINGSIDE, WHITE_QUEENSIDE),
            Color::Black => (56u8, BLACK_KINGSIDE, BLACK_QUEENSIDE),
        };
        let king = home + 4;
        let occupied = board.occupied();
        let rooks = board.pieces(us)[Piece::Rook.index()];
        if board.pieces(us)[Piece::King.index()] & (1u64 << king) == 0
            || self.is_square_under_attack(board, king, them)
        {
            return;
        }

        let empty = |targets: &[u8]| targets.iter().all(|s| occupied & (1u64 << s) == 0);
        let safe = |targets: &[u8]| {
            targets
                .iter()
                .all(|s| !self.is_square_under_attack(board, *s, them))
        };

        if board.castling_rights & kingside != 0
            && rooks & (1u64 << (home + 7)) != 0
            && empty(&[home + 5, home + 6])
            && safe(&[home + 5, home + 6])
        {
            moves.push(Move::new_castling(king, home + 6));
        }
        if board.castling_rights & queenside != 0
            && rooks & (1u64 << home) != 0
            && empty(&[home + 1, home + 2, home + 3])
            && safe(&[home + 2, home + 3])
        {
            moves.push(Move::new_castling(king, home + 2));
        }
    }

    fn leaves_king_safe(&self, board: &Board, mv: &Move) -> bool {
        let mut copy = *board;
        copy.make_move(*mv);
        !self.is_king_in_check(&copy, board.side_to_move)
    }

    pub fn is_insufficient_material(&self, board: &Board) -> bool {
        let heavy = |color: Color| {
            let pieces = board.pieces(color);
            pieces[Piece::Pawn.index()] | pieces[Piece::Rook.index()] | pieces[Piece::Queen.index()]
        };
        if heavy(Color::White) | heavy(Color::Black) != 0 {
            return false;
        }

        let minors = |color: Color| {
            let pieces = board.pieces(color);
            (pieces[Piece::Knight.index()] | pieces[Piece::Bishop.index()]).count_ones()
        };
        let (white_minors, black_minors) = (minors(Color::White), minors(Color::Black));

        // King vs king, or king and a single minor vs king.
        if white_minors + black_minors <= 1 {
            return true;
        }

        // King and bishop vs king and bishop with both bishops on one square color.
        let white_bishops = board.white_pieces[Piece::Bishop.index()];
        let black_bishops = board.black_pieces[Piece::Bishop.index()];
        if white_minors == 1 && black_minors == 1 && white_bishops != 0 && black_bishops != 0 {
            let is_dark = |bb: u64| {
                let square = bb.trailing_zeros() as u8;
                (square / 8 + square % 8) % 2 == 0
            };
            return is_dark(white_bishops) == is_dark(black_bishops);
        }

        false
    }

    /// Classifies the position. `history` holds the keys of earlier positions of the
    /// game, oldest first.
    pub fn get_game_state(&self, board: &Board, history: &[u64]) -> GameState {
        let moves = self.generate_moves(board);
        if moves.is_empty() {
            return if self.is_king_in_check(board, board.side_to_move) {
                GameState::Checkmate(board.side_to_move.opposite())
            } else {
                GameState::Stalemate
            };
        }

        if self.is_insufficient_material(board) {
            return GameState::InsufficientMaterial;
        }

        if board.halfmove_clock >= 100 {
            return GameState::FiftyMoveRule;
        }

        if repetitions(board, history) >= 2 {
            return GameState::ThreefoldRepetition;
        }

        GameState::Ongoing
    }
}

/// Earlier occurrences of the current position since the last irreversible move.
pub fn repetitions(board: &Board, history: &[u64]) -> usize {
    let window = (board.halfmove_clock as usize).min(history.len());
    history[history.len() - window..]
        .iter()
        .rev()
        .skip(1)
        .step_by(2)
        .filter(|&&key| key == board.key())
        .count()
}

fn push_pawn_move(moves: &mut Vec<Move>, from: u8, to: u8, captured: Option<Piece>, promotes: bool) {
    if promotes {
        for promotion in [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight] {
            moves.push(Move::new_promotion(from, to, captured, promotion));
        }
    } else {
        moves.push(match captured {
            Some(captured) => Move::new_capture(from, to, Piece::Pawn, captured),
            None => Move::new(from, to, Piece::Pawn),
        });
    }
}
