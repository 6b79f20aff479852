use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("invalid piece placement: {0}")]
    Placement(String),
    #[error("invalid side to move: {0}")]
    SideToMove(String),
    #[error("invalid castling rights: {0}")]
    Castling(String),
    #[error("invalid en passant square: {0}")]
    EnPassant(String),
    #[error("invalid move counter: {0}")]
    Counter(String),
}

#[derive(Error, Debug)]
pub enum UciError {
    #[error("bad position: {0}")]
    Fen(#[from] FenError),
    #[error("illegal or malformed move: {0}")]
    IllegalMove(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },
}
