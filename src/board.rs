use std::fmt;

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::FenError;
use crate::movegen::Move;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Material value in centipawns. The king is royal and carries no
    /// material value; it never takes part in material arithmetic.
    pub fn value(self) -> i32 {
        match self {
            Piece::Pawn => 100,
            Piece::Knight => 320,
            Piece::Bishop => 330,
            Piece::Rook => 500,
            Piece::Queen => 900,
            Piece::King => 0,
        }
    }

    pub fn is_royal(self) -> bool {
        self == Piece::King
    }

    fn symbol(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }

    fn from_symbol(c: char) -> Option<(Piece, Color)> {
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((piece, color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// Castling right bits: K, Q, k, q.
pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

struct Zobrist {
    pieces: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant: [u64; 8],
}

// Fixed seed: keys must be identical between runs.
static ZOBRIST: Lazy<Zobrist> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(0x0c41_40c0_5a1_0a0d);
    let mut pieces = [[[0u64; 64]; 6]; 2];
    for color in pieces.iter_mut() {
        for piece in color.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }
    }
    let black_to_move = rng.gen();
    let mut castling = [0u64; 16];
    for key in castling.iter_mut() {
        *key = rng.gen();
    }
    let mut en_passant = [0u64; 8];
    for key in en_passant.iter_mut() {
        *key = rng.gen();
    }
    Zobrist {
        pieces,
        black_to_move,
        castling,
        en_passant,
    }
});

/// Iterates the set squares of a bitboard, lowest first.
pub fn squares(mut bitboard: u64) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if bitboard == 0 {
            None
        } else {
            let square = bitboard.trailing_zeros() as u8;
            bitboard &= bitboard - 1;
            Some(square)
        }
    })
}

pub fn parse_square(s: &str) -> Option<u8> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].checked_sub(b'a').filter(|f| *f < 8)?;
    let rank = bytes[1].checked_sub(b'1').filter(|r| *r < 8)?;
    Some(rank * 8 + file)
}

pub fn square_name(square: u8) -> String {
    let file = (b'a' + square % 8) as char;
    let rank = (b'1' + square / 8) as char;
    format!("{}{}", file, rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub white_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub black_pieces: [u64; 6],
    pub side_to_move: Color,
    pub castling_rights: u8, // KQkq as the low four bits
    pub en_passant_square: Option<u8>,
    pub halfmove_clock: u8,
    pub fullmove_number: u16,
    key: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self {
            white_pieces: [
                0x000000000000FF00, // Pawns
                0x0000000000000042, // Knights
                0x0000000000000024, // Bishops
                0x0000000000000081, // Rooks
                0x0000000000000008, // Queen
                0x0000000000000010, // King
            ],
            black_pieces: [
                0x00FF000000000000,
                0x4200000000000000,
                0x2400000000000000,
                0x8100000000000000,
                0x0800000000000000,
                0x1000000000000000,
            ],
            side_to_move: Color::White,
            castling_rights: 0b1111,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
        };
        board.key = board.compute_key();
        board
    }

    fn empty() -> Self {
        Self {
            white_pieces: [0; 6],
            black_pieces: [0; 6],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::MissingFields(fields.len()));
        }

        let mut board = Board::empty();
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(fields[0].to_string()));
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) || file as u32 + skip > 8 {
                        return Err(FenError::Placement(rank_text.to_string()));
                    }
                    file += skip as u8;
                    continue;
                }
                let (piece, color) = Piece::from_symbol(c)
                    .ok_or_else(|| FenError::Placement(rank_text.to_string()))?;
                if file >= 8 {
                    return Err(FenError::Placement(rank_text.to_string()));
                }
                board.pieces_mut(color)[piece.index()] |= 1u64 << (rank * 8 + file);
                file += 1;
            }
            if file != 8 {
                return Err(FenError::Placement(rank_text.to_string()));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                board.castling_rights |= match c {
                    'K' => WHITE_KINGSIDE,
                    'Q' => WHITE_QUEENSIDE,
                    'k' => BLACK_KINGSIDE,
                    'q' => BLACK_QUEENSIDE,
                    _ => return Err(FenError::Castling(fields[2].to_string())),
                };
            }
        }

        board.en_passant_square = match fields[3] {
            "-" => None,
            square => Some(
                parse_square(square).ok_or_else(|| FenError::EnPassant(square.to_string()))?,
            ),
        };

        if let Some(text) = fields.get(4) {
            board.halfmove_clock = text
                .parse()
                .map_err(|_| FenError::Counter(text.to_string()))?;
        }
        if let Some(text) = fields.get(5) {
            board.fullmove_number = text
                .parse()
                .map_err(|_| FenError::Counter(text.to_string()))?;
        }

        board.key = board.compute_key();
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.get_piece_at(rank * 8 + file) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let symbol = piece.symbol();
                        placement.push(if color == Color::White {
                            symbol.to_ascii_uppercase()
                        } else {
                            symbol
                        });
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = if self.side_to_move == Color::White { "w" } else { "b" };
        let mut castling = String::new();
        for (bit, c) in [
            (WHITE_KINGSIDE, 'K'),
            (WHITE_QUEENSIDE, 'Q'),
            (BLACK_KINGSIDE, 'k'),
            (BLACK_QUEENSIDE, 'q'),
        ] {
            if self.castling_rights & bit != 0 {
                castling.push(c);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }
        let en_passant = self
            .en_passant_square
            .map(square_name)
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, en_passant, self.halfmove_clock, self.fullmove_number
        )
    }

    /// Zobrist key of the position.
    pub fn key(&self) -> u64 {
        self.key
    }

    fn compute_key(&self) -> u64 {
        let zobrist = &*ZOBRIST;
        let mut key = 0u64;
        for color in [Color::White, Color::Black] {
            for (piece, &bitboard) in self.pieces(color).iter().enumerate() {
                for square in squares(bitboard) {
                    key ^= zobrist.pieces[color.index()][piece][square as usize];
                }
            }
        }
        if self.side_to_move == Color::Black {
            key ^= zobrist.black_to_move;
        }
        key ^= zobrist.castling[self.castling_rights as usize & 0xF];
        if let Some(square) = self.en_passant_square {
            key ^= zobrist.en_passant[(square % 8) as usize];
        }
        key
    }

    pub fn pieces(&self, color: Color) -> &[u64; 6] {
        match color {
            Color::White => &self.white_pieces,
            Color::Black => &self.black_pieces,
        }
    }

    pub fn pieces_mut(&mut self, color: Color) -> &mut [u64; 6] {
        match color {
            Color::White => &mut self.white_pieces,
            Color::Black => &mut self.black_pieces,
        }
    }

    pub fn occupancy(&self, color: Color) -> u64 {
        self.pieces(color).iter().fold(0, |acc, bb| acc | bb)
    }

    pub fn occupied(&self) -> u64 {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        squares(self.pieces(color)[Piece::King.index()]).next()
    }

    /// Half-moves played since the start of the game.
    pub fn ply_count(&self) -> u32 {
        let played = (self.fullmove_number.max(1) as u32 - 1) * 2;
        played + if self.side_to_move == Color::Black { 1 } else { 0 }
    }

    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.opposite();
        let from_mask = 1u64 << mv.from;
        let to_mask = 1u64 << mv.to;

        self.pieces_mut(us)[mv.piece.index()] &= !from_mask;

        if let Some(captured) = mv.captured_piece {
            let captured_square = if mv.is_en_passant {
                match us {
                    Color::White => mv.to - 8,
                    Color::Black => mv.to + 8,
                }
            } else {
                mv.to
            };
            self.pieces_mut(them)[captured.index()] &= !(1u64 << captured_square);
        }

        let placed = mv.promotion.unwrap_or(mv.piece);
        self.pieces_mut(us)[placed.index()] |= to_mask;

        if mv.is_castling {
            let (rook_from, rook_to) = match (us, mv.to > mv.from) {
                (Color::White, true) => (7, 5),
                (Color::White, false) => (0, 3),
                (Color::Black, true) => (63, 61),
                (Color::Black, false) => (56, 59),
            };
            let rooks = &mut self.pieces_mut(us)[Piece::Rook.index()];
            *rooks &= !(1u64 << rook_from);
            *rooks |= 1u64 << rook_to;
        }

        // Moving from or landing on a king or rook home square clears the matching rights.
        self.castling_rights &= !(castling_mask(mv.from) | castling_mask(mv.to));

        self.en_passant_square =
            if mv.piece == Piece::Pawn && (mv.to as i8 - mv.from as i8).abs() == 16 {
                Some(match us {
                    Color::White => mv.from + 8,
                    Color::Black => mv.from - 8,
                })
            } else {
                None
            };

        if mv.piece == Piece::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;
        self.key = self.compute_key();
    }

    pub fn get_piece_at(&self, square: u8) -> Option<(Piece, Color)> {
        let mask = 1u64 << square;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                if self.pieces(color)[piece.index()] & mask != 0 {
                    return Some((piece, color));
                }
            }
        }
        None
    }
}

fn castling_mask(square: u8) -> u8 {
    match square {
        0 => WHITE_QUEENSIDE,
        4 => WHITE_KINGSIDE | WHITE_QUEENSIDE,
        7 => WHITE_KINGSIDE,
        56 => BLACK_QUEENSIDE,
        60 => BLACK_KINGSIDE | BLACK_QUEENSIDE,
        63 => BLACK_KINGSIDE,
        _ => 0,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let c = match self.get_piece_at(rank * 8 + file) {
                    Some((piece, Color::White)) => piece.symbol().to_ascii_uppercase(),
                    Some((piece, Color::Black)) => piece.symbol(),
                    None => '.',
                };
                write!(f, "{}", c)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
