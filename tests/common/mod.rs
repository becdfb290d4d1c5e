//! Scripted stand-ins for the move oracle and the game server.

#![allow(dead_code)]

use chess::Color;
use std::cell::RefCell;
use std::collections::VecDeque;

use chess_oracle_bot::error::{BotError, BotResult};
use chess_oracle_bot::lichess::GameChannel;
use chess_oracle_bot::models::GameSession;
use chess_oracle_bot::oracle::{MoveOracle, OracleRole};

/// Oracle that answers from fixed per-role scripts.
///
/// When a script runs out the `repeat` answer is used, or an empty reply.
#[derive(Default)]
pub struct ScriptedOracle {
    proposals: RefCell<VecDeque<String>>,
    critiques: RefCell<VecDeque<String>>,
    repeat_proposal: Option<String>,
    repeat_critique: Option<String>,
    fail: bool,
    calls: RefCell<Vec<(OracleRole, String)>>,
}

impl ScriptedOracle {
    pub fn new(proposals: &[&str], critiques: &[&str]) -> Self {
        ScriptedOracle {
            proposals: RefCell::new(proposals.iter().map(|s| s.to_string()).collect()),
            critiques: RefCell::new(critiques.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn always(proposal: &str, critique: &str) -> Self {
        ScriptedOracle {
            repeat_proposal: Some(proposal.to_string()),
            repeat_critique: Some(critique.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        ScriptedOracle {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self, role: OracleRole) -> usize {
        self.calls.borrow().iter().filter(|(r, _)| *r == role).count()
    }

    pub fn prompts(&self, role: OracleRole) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl MoveOracle for ScriptedOracle {
    async fn query(&self, role: OracleRole, prompt: &str) -> BotResult<String> {
        self.calls.borrow_mut().push((role, prompt.to_string()));
        if self.fail {
            return Err(BotError::Status {
                endpoint: "oracle".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let (queue, repeat) = match role {
            OracleRole::Proposer => (&self.proposals, &self.repeat_proposal),
            OracleRole::Critic => (&self.critiques, &self.repeat_critique),
        };
        let next = queue.borrow_mut().pop_front();
        Ok(next.or_else(|| repeat.clone()).unwrap_or_default())
    }
}

/// Game server double that records everything the bot sends
#[derive(Default)]
pub struct ScriptedChannel {
    events: RefCell<Vec<String>>,
    sent: RefCell<Vec<String>>,
    chats: RefCell<Vec<String>>,
    fail_moves: bool,
    fail_chat: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(lines: &[&str]) -> Self {
        ScriptedChannel {
            events: RefCell::new(lines.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn rejecting_moves() -> Self {
        ScriptedChannel {
            fail_moves: true,
            ..Default::default()
        }
    }

    pub fn rejecting_chat() -> Self {
        ScriptedChannel {
            fail_chat: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn chats(&self) -> Vec<String> {
        self.chats.borrow().clone()
    }
}

impl GameChannel for ScriptedChannel {
    type Events = futures::stream::Iter<std::vec::IntoIter<BotResult<String>>>;

    async fn challenge(&self, _username: &str, color: Color) -> BotResult<GameSession> {
        Ok(GameSession::new("test-game", color))
    }

    async fn stream_game(&self, _game_id: &str) -> BotResult<Self::Events> {
        let lines: Vec<BotResult<String>> = self.events.borrow_mut().drain(..).map(Ok).collect();
        Ok(futures::stream::iter(lines))
    }

    async fn send_move(&self, game_id: &str, token: &str) -> BotResult<()> {
        if self.fail_moves {
            return Err(BotError::Status {
                endpoint: format!("/api/bot/game/{}/move/{}", game_id, token),
                status: 400,
                body: "Not your turn".to_string(),
            });
        }
        self.sent.borrow_mut().push(token.to_string());
        Ok(())
    }

    async fn send_chat(&self, _game_id: &str, text: &str) -> BotResult<()> {
        if self.fail_chat {
            return Err(BotError::transport("chat", "connection reset"));
        }
        self.chats.borrow_mut().push(text.to_string());
        Ok(())
    }
}

pub fn game_state(moves: &str) -> String {
    format!(
        r#"{{"type":"gameState","moves":"{}","wtime":60000,"btime":60000,"status":"started"}}"#,
        moves
    )
}

pub fn game_full(moves: &str) -> String {
    format!(
        r#"{{"type":"gameFull","id":"test-game","initialFen":"startpos",
            "white":{{"id":"w"}},"black":{{"id":"b"}},"state":{}}}"#,
        game_state(moves)
    )
}
