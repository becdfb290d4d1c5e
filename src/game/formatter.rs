//! Text rendering of a position for the move oracle.
//!
//! Everything here is a pure function of a [`BoardState`] and the colour the
//! text is written for.

use chess::{ChessMove, Color, Piece, Square};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::PhaseThresholds;
use crate::game::utils::{color_to_string, non_pawn_count, piece_name, piece_plural, squares_of};
use crate::models::BoardState;

const PIECE_ORDER: [Piece; 6] = [
    Piece::King,
    Piece::Queen,
    Piece::Rook,
    Piece::Bishop,
    Piece::Knight,
    Piece::Pawn,
];

/// Coarse game phase.
///
/// This is a heuristic from move count and material, not something the
/// rules engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Opening => write!(f, "opening"),
            Phase::Middlegame => write!(f, "middlegame"),
            Phase::Endgame => write!(f, "endgame"),
        }
    }
}

pub fn classify_phase(state: &BoardState, thresholds: &PhaseThresholds) -> Phase {
    if (state.full_moves_played() as u32) < thresholds.opening_moves {
        return Phase::Opening;
    }
    let board = state.board();
    if non_pawn_count(board, Color::White) < thresholds.endgame_pieces
        || non_pawn_count(board, Color::Black) < thresholds.endgame_pieces
    {
        return Phase::Endgame;
    }
    Phase::Middlegame
}

/// Own and opponent pieces, grouped by piece type
pub fn render_pieces(state: &BoardState, perspective: Color) -> String {
    let mut out = String::new();
    for (label, color) in [("Your", perspective), ("Opponent", !perspective)] {
        out.push_str(&format!("{} pieces ({}):\n", label, color_to_string(color)));
        for piece in PIECE_ORDER {
            let squares = squares_of(state.board(), color, piece);
            if squares.is_empty() {
                continue;
            }
            out.push_str(&format!("  {}: {}\n", piece_plural(piece), join_squares(&squares)));
        }
    }
    out
}

/// Legal moves grouped by moving piece and origin square.
///
/// Each destination is written as a complete move token so the oracle can
/// copy it back verbatim.
pub fn render_legal_moves(state: &BoardState) -> String {
    let mut groups: BTreeMap<(usize, usize), (Piece, Square, Vec<ChessMove>)> = BTreeMap::new();
    for mv in state.legal_moves() {
        let Some(piece) = state.piece_on(mv.get_source()) else {
            continue;
        };
        let rank = PIECE_ORDER.iter().position(|p| *p == piece).unwrap_or(0);
        groups
            .entry((rank, mv.get_source().to_index()))
            .or_insert_with(|| (piece, mv.get_source(), Vec::new()))
            .2
            .push(mv);
    }

    let mut out = String::new();
    for (piece, origin, moves) in groups.into_values() {
        let destinations: Vec<String> = moves
            .iter()
            .map(|mv| match state.captured_piece(*mv) {
                Some(captured) => format!("{} (captures {})", mv, piece_name(captured)),
                None => mv.to_string(),
            })
            .collect();
        out.push_str(&format!(
            "  {} on {}: {}\n",
            piece_name(piece),
            origin,
            destinations.join(", ")
        ));
    }
    out
}

/// Full description of the position as sent to the proposer
pub fn render_position(
    state: &BoardState,
    perspective: Color,
    thresholds: &PhaseThresholds,
) -> String {
    let turn = if state.side_to_move() == Color::White {
        "White's turn"
    } else {
        "Black's turn"
    };
    format!(
        "GAME STATE\n{}\nFEN: {}\n{}\nPhase: {} (approximate)\n\nLEGAL MOVES\n{}",
        render_pieces(state, perspective),
        state.fen(),
        turn,
        classify_phase(state, thresholds),
        render_legal_moves(state),
    )
}

fn join_squares(squares: &[Square]) -> String {
    squares.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}
