//! Board position queries.
//!
//! [`Position`] is an immutable snapshot of a chess board. Applying a move produces a new
//! snapshot, so search code never needs an undo step.

use std::str::FromStr;

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, EMPTY, MoveGen, Piece, Square};

use crate::PositionError;

/// Squares of the same color as b1.
const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA_55AA_55AA_55AA);

/// Chebyshev distance between two squares (the number of king steps between them).
#[must_use]
pub fn square_distance(a: Square, b: Square) -> u32 {
    let rank_diff = a.get_rank().to_index().abs_diff(b.get_rank().to_index());
    let file_diff = a.get_file().to_index().abs_diff(b.get_file().to_index());
    #[expect(clippy::cast_possible_truncation)]
    let distance = rank_diff.max(file_diff) as u32;
    distance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        Self { board }
    }
}

impl Position {
    /// Returns the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::default(),
        }
    }

    /// Parses a position from its FEN serialization.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        Board::from_str(fen)
            .map(|board| Self { board })
            .map_err(|e| PositionError::InvalidFen {
                fen: fen.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Serializes this position to FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        self.board.to_string()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Iterates over the legal moves of the side to move.
    #[must_use]
    pub fn legal_moves(&self) -> MoveGen {
        MoveGen::new_legal(&self.board)
    }

    #[must_use]
    pub fn legal_move_count(&self) -> usize {
        self.legal_moves().len()
    }

    /// Applies a move after checking that it is legal in this position.
    pub fn apply(&self, chess_move: ChessMove) -> Result<Self, PositionError> {
        if !self.board.legal(chess_move) {
            return Err(PositionError::IllegalMove {
                chess_move: chess_move.to_string(),
                fen: self.to_fen(),
            });
        }
        Ok(self.apply_unchecked(chess_move))
    }

    /// Applies a move without a legality check.
    ///
    /// The move must come from [`Self::legal_moves`] of this same position.
    #[must_use]
    pub fn apply_unchecked(&self, chess_move: ChessMove) -> Self {
        Self {
            board: self.board.make_move_new(chess_move),
        }
    }

    /// Returns `true` if the side to move is in check.
    #[must_use]
    pub fn is_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    /// Returns `true` if the side to move is checkmated.
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    /// Pieces of the given type and color.
    #[must_use]
    pub fn pieces(&self, piece: Piece, color: Color) -> BitBoard {
        *self.board.pieces(piece) & *self.board.color_combined(color)
    }

    /// All pieces of the given color.
    #[must_use]
    pub fn occupied_by(&self, color: Color) -> BitBoard {
        *self.board.color_combined(color)
    }

    #[must_use]
    pub fn color_on(&self, square: Square) -> Option<Color> {
        self.board.color_on(square)
    }

    /// Pieces of `color` that attack `square`.
    ///
    /// A piece standing on `square` does not block attacks onto its own square, so this also
    /// answers "which pieces of `color` defend the piece on `square`".
    #[must_use]
    pub fn attackers(&self, color: Color, square: Square) -> BitBoard {
        let board = &self.board;
        let occupied = *board.combined();
        let queens = *board.pieces(Piece::Queen);
        let diagonal = *board.pieces(Piece::Bishop) | queens;
        let orthogonal = *board.pieces(Piece::Rook) | queens;

        let attackers = (chess::get_knight_moves(square) & *board.pieces(Piece::Knight))
            | (chess::get_king_moves(square) & *board.pieces(Piece::King))
            | (chess::get_bishop_moves(square, occupied) & diagonal)
            | (chess::get_rook_moves(square, occupied) & orthogonal)
            | chess::get_pawn_attacks(square, !color, *board.pieces(Piece::Pawn));
        attackers & *board.color_combined(color)
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.board.king_square(color)
    }

    /// Returns `true` if `color` keeps castling rights on either wing.
    #[must_use]
    pub fn has_castling_rights(&self, color: Color) -> bool {
        let rights = self.board.castle_rights(color);
        rights.has_kingside() || rights.has_queenside()
    }

    /// Returns `true` if the side to move has a legal en passant capture.
    #[must_use]
    pub fn has_legal_en_passant(&self) -> bool {
        if self.board.en_passant().is_none() {
            return false;
        }
        self.legal_moves().any(|mv| self.is_en_passant(mv))
    }

    fn is_en_passant(&self, chess_move: ChessMove) -> bool {
        let (source, dest) = (chess_move.get_source(), chess_move.get_dest());
        self.board.piece_on(source) == Some(Piece::Pawn)
            && source.get_file() != dest.get_file()
            && self.board.piece_on(dest).is_none()
    }

    /// Returns `true` if the move resets the halfmove clock (pawn move or capture).
    #[must_use]
    pub fn is_zeroing(&self, chess_move: ChessMove) -> bool {
        self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(chess_move.get_dest()).is_some()
    }

    /// Returns `true` if neither side can possibly deliver mate.
    ///
    /// Covers bare kings, a single minor piece, and any number of bishops all standing on
    /// squares of one color.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let mating_material =
            *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if mating_material != EMPTY {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }
        let light = bishops & LIGHT_SQUARES;
        light == EMPTY || light == bishops
    }

    /// Zobrist hash covering placement, side to move, castling and en passant.
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.board.get_hash()
    }

    /// Renders the board as eight rows of piece letters (uppercase for white, `.` for empty),
    /// rank 8 first.
    #[must_use]
    pub fn diagram(&self) -> String {
        let mut rows = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let row = (0..8)
                .map(|file| {
                    let square = Square::make_square(
                        chess::Rank::from_index(rank),
                        chess::File::from_index(file),
                    );
                    match (self.board.piece_on(square), self.board.color_on(square)) {
                        (Some(piece), Some(color)) => piece_char(piece, color),
                        _ => '.',
                    }
                })
                .map(String::from)
                .collect::<Vec<_>>();
            rows.push(row.join(" "));
        }
        rows.join("\n")
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}
