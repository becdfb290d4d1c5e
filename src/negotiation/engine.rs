use chess::{ChessMove, Piece};
use log::{info, warn};
use rand::seq::SliceRandom;
use std::str::FromStr;

use super::prompts::{
    critique_prompt, illegal_feedback, proposal_prompt, Feedback, SpeculativeAnalysis,
};
use super::{
    Fallback, IllegalProposal, MarkerExtractor, MoveExtractor, MoveProposal, Negotiation,
    Resolution, Verdict,
};
use crate::config::NegotiationConfig;
use crate::error::{BotError, BotResult};
use crate::models::BoardState;
use crate::oracle::{MoveOracle, OracleRole};

/// Runs the bounded propose/critique loop for one bot move
pub struct NegotiationEngine<O, X = MarkerExtractor> {
    oracle: O,
    extractor: X,
    config: NegotiationConfig,
}

impl<O: MoveOracle> NegotiationEngine<O> {
    pub fn new(oracle: O, config: NegotiationConfig) -> Self {
        Self::with_extractor(oracle, MarkerExtractor, config)
    }
}

impl<O: MoveOracle, X: MoveExtractor> NegotiationEngine<O, X> {
    pub fn with_extractor(oracle: O, extractor: X, config: NegotiationConfig) -> Self {
        NegotiationEngine {
            oracle,
            extractor,
            config,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Choose a legal move for the side to move on `board`.
    ///
    /// `board` is only touched speculatively and is identical to its input
    /// when this returns, whatever the outcome.
    pub async fn negotiate(
        &self,
        board: &mut BoardState,
        opponent_last_move: Option<&str>,
        captured: Option<Piece>,
    ) -> BotResult<Negotiation> {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return Err(BotError::NoLegalMoves);
        }

        let thresholds = self.config.phase;
        let mut feedback: Option<Feedback> = None;
        let mut last_validated: Option<MoveProposal> = None;

        for round in 1..=self.config.max_rounds {
            let prompt = proposal_prompt(
                board,
                &thresholds,
                opponent_last_move,
                captured,
                feedback.as_ref(),
            );
            let reply = self
                .oracle
                .query(OracleRole::Proposer, &prompt)
                .await
                .map_err(|e| BotError::NegotiationFailed(Box::new(e)))?;

            let candidate = match self.validate(board, &reply) {
                Ok(mv) => mv,
                Err(illegal) => {
                    warn!("Round {}: illegal proposal: {}", round, illegal);
                    feedback = Some(illegal_feedback(illegal.token(), &illegal.to_string()));
                    continue;
                }
            };

            let analysis = board.speculate(candidate, SpeculativeAnalysis::of);
            let prompt = critique_prompt(board, &thresholds, candidate, &analysis);
            let critique = self
                .oracle
                .query(OracleRole::Critic, &prompt)
                .await
                .map_err(|e| BotError::NegotiationFailed(Box::new(e)))?;

            let verdict = self.extractor.verdict(&critique);
            let proposal = MoveProposal {
                token: candidate.to_string(),
                mv: Some(candidate),
                verdict,
            };
            info!("Round {}: proposal {} was {:?}", round, proposal.token, verdict);

            if verdict == Verdict::Accept {
                return Ok(Negotiation {
                    chosen: candidate,
                    proposal,
                    rounds: round,
                    resolution: Resolution::Accepted,
                });
            }

            feedback = Some(Feedback {
                token: proposal.token.clone(),
                critique,
            });
            last_validated = Some(proposal);
        }

        let rounds = self.config.max_rounds;
        if let Some(proposal) = last_validated {
            if let Some(chosen) = proposal.mv {
                warn!(
                    "Negotiation exhausted after {} rounds, playing last validated proposal {}",
                    rounds, chosen
                );
                return Ok(Negotiation {
                    chosen,
                    proposal,
                    rounds,
                    resolution: Resolution::Exhausted(Fallback::LastValidated),
                });
            }
        }

        let chosen = *legal
            .choose(&mut rand::thread_rng())
            .ok_or(BotError::NoLegalMoves)?;
        warn!(
            "Negotiation exhausted after {} rounds without a legal proposal, \
             playing random move {}",
            rounds, chosen
        );
        Ok(Negotiation {
            chosen,
            proposal: MoveProposal {
                token: chosen.to_string(),
                mv: Some(chosen),
                verdict: Verdict::Pending,
            },
            rounds,
            resolution: Resolution::Exhausted(Fallback::ArbitraryLegal),
        })
    }

    /// Extract the proposed move and check it against the legal move set
    pub fn validate(&self, board: &BoardState, reply: &str) -> Result<ChessMove, IllegalProposal> {
        let token = self
            .extractor
            .move_token(reply)
            .ok_or(IllegalProposal::MissingToken)?;
        // from_str ignores trailing characters past a promotion letter
        if !matches!(token.len(), 4 | 5) {
            return Err(IllegalProposal::Unparseable { token });
        }
        let mv = ChessMove::from_str(&token).map_err(|_| IllegalProposal::Unparseable {
            token: token.clone(),
        })?;
        if !board.is_legal(mv) {
            return Err(IllegalProposal::NotLegal { token });
        }
        Ok(mv)
    }
}
