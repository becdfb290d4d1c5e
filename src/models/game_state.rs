use chess::{Board, ChessMove, Color, MoveGen, Piece, Square};
use std::str::FromStr;

use crate::error::{BotError, BotResult};

/// Local mirror of the game position.
///
/// Positions are kept as a stack so that every `apply` can be reverted by
/// `undo`, which the negotiation engine relies on for speculative moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    initial: Board,
    positions: Vec<Board>,
    history: Vec<ChessMove>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    pub fn from_board(board: Board) -> Self {
        BoardState {
            initial: board,
            positions: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Build a board from a FEN string, or the standard start for `"startpos"`
    pub fn from_fen(fen: &str) -> BotResult<Self> {
        if fen.is_empty() || fen == "startpos" {
            return Ok(Self::new());
        }
        Board::from_str(fen)
            .map(Self::from_board)
            .map_err(|_| BotError::InvalidPosition { fen: fen.to_string() })
    }

    /// Replay a list of UCI tokens on top of `initial`
    pub fn from_moves(initial: Board, moves: &[String]) -> BotResult<Self> {
        let mut state = Self::from_board(initial);
        for token in moves {
            let mv = state.parse_legal(token).ok_or_else(|| BotError::InvalidServerMove {
                token: token.clone(),
            })?;
            state.apply(mv);
        }
        Ok(state)
    }

    pub fn board(&self) -> &Board {
        self.positions.last().unwrap_or(&self.initial)
    }

    pub fn initial(&self) -> &Board {
        &self.initial
    }

    pub fn history(&self) -> &[ChessMove] {
        &self.history
    }

    /// Number of half-moves applied since the initial position
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn full_moves_played(&self) -> usize {
        self.history.len() / 2
    }

    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(self.board()).collect()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        MoveGen::new_legal(self.board()).any(|m| m == mv)
    }

    /// Parse a UCI token and return it only if it is legal here
    pub fn parse_legal(&self, token: &str) -> Option<ChessMove> {
        let mv = ChessMove::from_str(token).ok()?;
        self.is_legal(mv).then_some(mv)
    }

    /// Piece type that `mv` would capture, including en passant
    pub fn captured_piece(&self, mv: ChessMove) -> Option<Piece> {
        let board = self.board();
        if let Some(piece) = board.piece_on(mv.get_dest()) {
            return Some(piece);
        }
        let moving = board.piece_on(mv.get_source())?;
        if moving == Piece::Pawn && mv.get_source().get_file() != mv.get_dest().get_file() {
            return Some(Piece::Pawn);
        }
        None
    }

    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.board().piece_on(square)
    }

    pub fn gives_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    pub fn apply(&mut self, mv: ChessMove) {
        let next = self.board().make_move_new(mv);
        self.positions.push(next);
        self.history.push(mv);
    }

    /// Revert the most recent `apply`. Returns the move that was undone.
    pub fn undo(&mut self) -> Option<ChessMove> {
        self.positions.pop()?;
        self.history.pop()
    }

    /// Apply `mv`, run `inspect` on the resulting position, then undo.
    ///
    /// The undo runs from a drop guard, so the board is restored even if
    /// `inspect` unwinds.
    pub fn speculate<T>(&mut self, mv: ChessMove, inspect: impl FnOnce(&BoardState) -> T) -> T {
        let guard = Speculation::new(self, mv);
        inspect(&*guard.state)
    }

    pub fn fen(&self) -> String {
        self.board().to_string()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

struct Speculation<'a> {
    state: &'a mut BoardState,
}

impl<'a> Speculation<'a> {
    fn new(state: &'a mut BoardState, mv: ChessMove) -> Self {
        state.apply(mv);
        Speculation { state }
    }
}

impl Drop for Speculation<'_> {
    fn drop(&mut self) {
        self.state.undo();
    }
}

/// Game session for the single game this process plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub game_id: String,
    pub color: Color,
    /// Side to move at half-move 0, Black only for custom start positions
    pub first_to_move: Color,
    /// Half-moves the local mirror has accounted for
    pub cursor: usize,
}

impl GameSession {
    pub fn new(game_id: impl Into<String>, color: Color) -> Self {
        GameSession {
            game_id: game_id.into(),
            color,
            first_to_move: Color::White,
            cursor: 0,
        }
    }

    /// Whether the bot moves after `half_moves` half-moves have been played
    pub fn bot_to_move(&self, half_moves: usize) -> bool {
        let to_move = if half_moves % 2 == 0 {
            self.first_to_move
        } else {
            !self.first_to_move
        };
        to_move == self.color
    }
}
