use chess::{ChessMove, Piece};

use super::extractor::{MOVE_MARKER, VERDICT_MARKER};
use crate::config::PhaseThresholds;
use crate::game::formatter::{classify_phase, render_position};
use crate::game::utils::{color_to_string, piece_name};
use crate::models::BoardState;

/// What the proposer is told about its previous, unsuccessful suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub token: String,
    pub critique: String,
}

/// Position after a candidate move, as seen from the opponent's side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeculativeAnalysis {
    pub gives_check: bool,
    pub reply_count: usize,
    /// Opponent replies that would take material, with the piece taken
    pub reply_captures: Vec<(ChessMove, Piece)>,
}

impl SpeculativeAnalysis {
    /// Inspect a position in which the candidate move has just been played
    pub fn of(after: &BoardState) -> Self {
        let replies = after.legal_moves();
        let reply_captures = replies
            .iter()
            .filter_map(|mv| after.captured_piece(*mv).map(|piece| (*mv, piece)))
            .collect();
        SpeculativeAnalysis {
            gives_check: after.gives_check(),
            reply_count: replies.len(),
            reply_captures,
        }
    }

    pub fn is_mate(&self) -> bool {
        self.gives_check && self.reply_count == 0
    }
}

pub fn proposal_prompt(
    board: &BoardState,
    thresholds: &PhaseThresholds,
    opponent_last_move: Option<&str>,
    captured: Option<Piece>,
    feedback: Option<&Feedback>,
) -> String {
    let color = board.side_to_move();
    let mut prompt = format!(
        "You are playing chess as {}.\n\n{}\n",
        color_to_string(color),
        render_position(board, color, thresholds)
    );

    match opponent_last_move {
        Some(mv) => prompt.push_str(&format!("Your opponent's last move was {}.\n", mv)),
        None => prompt.push_str("You are making the first move of the game.\n"),
    }
    if let Some(piece) = captured {
        prompt.push_str(&format!("That move captured your {}.\n", piece_name(piece)));
    }
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\nYour previous suggestion {} was rejected:\n{}\nSuggest a different move.\n",
            feedback.token,
            feedback.critique.trim()
        ));
    }

    prompt.push_str(&format!(
        "\nPick exactly one move from the legal moves listed above. Explain briefly, then finish \
         with a line of the form \"{}<move>\", for example \"{}e2e4\".\n",
        MOVE_MARKER, MOVE_MARKER
    ));
    prompt
}

pub fn critique_prompt(
    board: &BoardState,
    thresholds: &PhaseThresholds,
    candidate: ChessMove,
    analysis: &SpeculativeAnalysis,
) -> String {
    let color = board.side_to_move();
    let mover = board
        .piece_on(candidate.get_source())
        .map(piece_name)
        .unwrap_or("piece");

    let mut prompt = format!(
        "You are reviewing a chess move suggested for {}.\n\
         Position before the move (FEN): {}\n\
         Phase: {} (approximate)\n\n",
        color_to_string(color),
        board.fen(),
        classify_phase(board, thresholds)
    );
    prompt.push_str(&format!(
        "Suggested move: {} ({} from {} to {}",
        candidate,
        mover,
        candidate.get_source(),
        candidate.get_dest()
    ));
    if let Some(piece) = board.captured_piece(candidate) {
        prompt.push_str(&format!(", capturing a {}", piece_name(piece)));
    }
    prompt.push_str(")\n\nAfter this move:\n");

    if analysis.is_mate() {
        prompt.push_str("- it is checkmate.\n");
    } else if analysis.gives_check {
        prompt.push_str("- it gives check.\n");
    }
    prompt.push_str(&format!(
        "- {} has {} legal replies.\n",
        color_to_string(!color),
        analysis.reply_count
    ));
    if analysis.reply_captures.is_empty() {
        prompt.push_str("- no reply captures any of your pieces.\n");
    } else {
        let captures: Vec<String> = analysis
            .reply_captures
            .iter()
            .map(|(mv, piece)| format!("{} takes your {}", mv, piece_name(*piece)))
            .collect();
        prompt.push_str(&format!("- replies that capture: {}.\n", captures.join(", ")));
    }

    prompt.push_str(&format!(
        "\nDecide whether {} should play this move. Explain briefly, then finish with \
         \"{}SUCCESS\" to accept it or \"{}FAILURE\" to reject it.\n",
        color_to_string(color),
        VERDICT_MARKER,
        VERDICT_MARKER
    ));
    prompt
}

pub fn illegal_feedback(token: &str, reason: &str) -> Feedback {
    Feedback {
        token: token.to_string(),
        critique: format!("{} Only moves from the LEGAL MOVES list can be played.", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Board;
    use std::str::FromStr;

    fn board_after(tokens: &[&str]) -> BoardState {
        let moves: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        BoardState::from_moves(Board::default(), &moves).unwrap()
    }

    #[test]
    fn test_first_move_prompt() {
        let thresholds = PhaseThresholds::default();
        let prompt = proposal_prompt(&BoardState::new(), &thresholds, None, None, None);
        assert!(prompt.starts_with("You are playing chess as white."));
        assert!(prompt.contains("You are making the first move of the game."));
        assert!(prompt.contains("\"UCI: e2e4\""));
        assert!(!prompt.contains("rejected"));
    }

    #[test]
    fn test_retry_prompt_carries_feedback_and_capture() {
        let board = board_after(&["e2e4", "d7d5", "e4d5"]);
        let feedback = Feedback {
            token: "d8d5".to_string(),
            critique: "Hangs the queen.\nSTATUS: FAILURE".to_string(),
        };
        let prompt = proposal_prompt(
            &board,
            &PhaseThresholds::default(),
            Some("e4d5"),
            Some(Piece::Pawn),
            Some(&feedback),
        );
        assert!(prompt.contains("You are playing chess as black."));
        assert!(prompt.contains("Your opponent's last move was e4d5."));
        assert!(prompt.contains("That move captured your Pawn."));
        assert!(prompt.contains("Your previous suggestion d8d5 was rejected:\nHangs the queen."));
    }

    #[test]
    fn test_analysis_lists_replies_that_capture() {
        let mut board = board_after(&["e2e4", "d7d5"]);
        let candidate = ChessMove::from_str("b1c3").unwrap();
        let analysis = board.speculate(candidate, SpeculativeAnalysis::of);

        assert!(!analysis.gives_check);
        assert!(analysis
            .reply_captures
            .iter()
            .any(|(mv, piece)| mv.to_string() == "d5e4" && *piece == Piece::Pawn));

        let prompt = critique_prompt(&board, &PhaseThresholds::default(), candidate, &analysis);
        assert!(prompt.contains("Suggested move: b1c3 (Knight from b1 to c3)"));
        assert!(prompt.contains("d5e4 takes your Pawn"));
        assert!(prompt.contains("\"STATUS: SUCCESS\""));
    }

    #[test]
    fn test_analysis_detects_mate() {
        let mut board = board_after(&["f2f3", "e7e5", "g2g4"]);
        let mate = ChessMove::from_str("d8h4").unwrap();
        let analysis = board.speculate(mate, SpeculativeAnalysis::of);
        assert!(analysis.is_mate());
        assert_eq!(analysis.reply_count, 0);
    }
}
