//! Bounded propose/critique/retry negotiation with the move oracle.

pub mod engine;
pub mod extractor;
pub mod prompts;

use chess::ChessMove;

pub use engine::NegotiationEngine;
pub use extractor::{MarkerExtractor, MoveExtractor};

/// Critic decision on a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Accept,
    Reject,
}

/// One oracle suggestion and what became of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveProposal {
    pub token: String,
    /// Set only when `token` is a legal move in the current position
    pub mv: Option<ChessMove>,
    pub verdict: Verdict,
}

/// Why a proposal could not be played
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalProposal {
    #[error("The answer did not contain a move after the UCI marker.")]
    MissingToken,

    #[error("{token} is not a valid move in UCI notation.")]
    Unparseable { token: String },

    #[error("{token} is not a legal move in this position.")]
    NotLegal { token: String },
}

impl IllegalProposal {
    pub fn token(&self) -> &str {
        match self {
            IllegalProposal::MissingToken => "",
            IllegalProposal::Unparseable { token } | IllegalProposal::NotLegal { token } => token,
        }
    }
}

/// How the fallback move was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The most recent proposal that passed validation
    LastValidated,
    /// A random legal move; no proposal was ever legal
    ArbitraryLegal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accepted,
    /// No proposal was accepted within the round budget
    Exhausted(Fallback),
}

/// Outcome of negotiating one bot move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    /// Always legal in the position the negotiation ran on
    pub chosen: ChessMove,
    pub proposal: MoveProposal,
    pub rounds: u32,
    pub resolution: Resolution,
}

impl Negotiation {
    pub fn token(&self) -> String {
        self.chosen.to_string()
    }

    pub fn accepted(&self) -> bool {
        self.resolution == Resolution::Accepted
    }
}
