use crate::board::{squares, Board, Color, Piece};
use crate::error::FenError;
use crate::movegen::{self, GameState, Move, MoveGenerator};
use crate::position::{PieceView, PlacedPiece, Position};

struct Undo {
    board: Board,
    mv: Move,
}

/// A chess game: the current board plus everything needed to take moves back
/// and to detect repetitions.
pub struct Game {
    board: Board,
    history: Vec<Undo>,
    keys: Vec<u64>,
    generator: MoveGenerator,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            history: Vec::new(),
            keys: Vec::new(),
            generator: MoveGenerator::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self::from_board(Board::from_fen(fen)?))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Finds the legal move written in UCI notation (`e2e4`, `a7a8q`).
    pub fn find_move(&self, text: &str) -> Option<Move> {
        self.generator
            .generate_moves(&self.board)
            .into_iter()
            .find(|mv| mv.to_uci() == text)
    }

    pub fn status(&self) -> GameState {
        self.generator
            .get_game_state(&self.board, &self.keys)
    }
}

impl Position for Game {
    type Move = Move;

    fn legal_moves(&self, captures_only: bool) -> Vec<Move> {
        if captures_only {
            self.generator.generate_captures(&self.board)
        } else {
            self.generator.generate_moves(&self.board)
        }
    }

    fn make_move(&mut self, mv: Move) {
        self.history.push(Undo {
            board: self.board,
            mv,
        });
        self.keys.push(self.board.key());
        self.board.make_move(mv);
    }

    fn undo_move(&mut self, mv: Move) {
        match self.history.pop() {
            Some(undo) => {
                debug_assert_eq!(undo.mv, mv, "undo out of order");
                self.keys.pop();
                self.board = undo.board;
            }
            None => debug_assert!(false, "undo with empty history"),
        }
    }

    fn is_draw(&self) -> bool {
        self.board.halfmove_clock >= 100
            || self.generator.is_insufficient_material(&self.board)
            || movegen::repetitions(&self.board, &self.keys) >= 2
    }

    fn is_in_check(&self) -> bool {
        self.generator
            .is_king_in_check(&self.board, self.board.side_to_move)
    }

    fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    fn key(&self) -> u64 {
        self.board.key()
    }

    fn ply_count(&self) -> u32 {
        self.board.ply_count()
    }
}

impl PieceView for Game {
    fn pieces(&self) -> Vec<PlacedPiece> {
        let mut placed = Vec::with_capacity(32);
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                for square in squares(self.board.pieces(color)[piece.index()]) {
                    placed.push(PlacedPiece {
                        piece,
                        color,
                        square,
                    });
                }
            }
        }
        placed
    }

    fn attacks(&self, piece: Piece, square: u8, color: Color) -> u64 {
        movegen::attacks(piece, square, color, self.board.occupied())
    }
}
