use chess::Piece;
use futures::{Stream, StreamExt};
use log::{debug, info, warn};

use crate::error::{BotError, BotResult};
use crate::game::utils::{color_to_string, piece_name};
use crate::lichess::GameChannel;
use crate::models::{BoardState, GameEvent, GameSession, GameStateEvent};
use crate::negotiation::{
    MarkerExtractor, MoveExtractor, Negotiation, NegotiationEngine, Resolution,
};
use crate::oracle::MoveOracle;

/// What the caller should do after an event has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitEvent,
    GameOver,
}

/// Mirrors one game from its event stream and answers every opponent move
pub struct GameLoop<C, O, X = MarkerExtractor> {
    channel: C,
    engine: NegotiationEngine<O, X>,
    session: GameSession,
    board: BoardState,
    state: LoopState,
    chat: bool,
}

/// Decode one stream line
pub fn parse_event(line: &str) -> BotResult<GameEvent> {
    serde_json::from_str(line).map_err(|e| BotError::EventParse {
        message: format!("{} in {}", e, line),
    })
}

impl<C, O, X> GameLoop<C, O, X>
where
    C: GameChannel,
    O: MoveOracle,
    X: MoveExtractor,
{
    pub fn new(channel: C, engine: NegotiationEngine<O, X>, session: GameSession) -> Self {
        GameLoop {
            channel,
            engine,
            session,
            board: BoardState::new(),
            state: LoopState::AwaitEvent,
            chat: false,
        }
    }

    /// Post a short summary of every negotiation in the game chat
    pub fn with_chat(mut self, chat: bool) -> Self {
        self.chat = chat;
        self
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn engine(&self) -> &NegotiationEngine<O, X> {
        &self.engine
    }

    pub fn is_over(&self) -> bool {
        self.state == LoopState::GameOver
    }

    /// Open the game stream and process it until the game ends
    pub async fn play(&mut self) -> BotResult<()> {
        let events = self.channel.stream_game(&self.session.game_id).await?;
        self.run(events).await
    }

    /// Process raw event lines one at a time until the stream closes or the
    /// game is over. Malformed lines are logged and skipped.
    pub async fn run<S>(&mut self, mut events: S) -> BotResult<()>
    where
        S: Stream<Item = BotResult<String>> + Unpin,
    {
        while let Some(line) = events.next().await {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let event = match parse_event(line) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping event: {}", e);
                    continue;
                }
            };

            if self.on_event(event).await? == Flow::GameOver {
                break;
            }
        }
        info!("Stopped following game {}", self.session.game_id);
        Ok(())
    }

    pub async fn on_event(&mut self, event: GameEvent) -> BotResult<Flow> {
        if self.is_over() {
            debug!("Game {} is over, ignoring {:?}", self.session.game_id, event);
            return Ok(Flow::GameOver);
        }

        match event {
            GameEvent::GameFull(full) => {
                info!("Game {} is ready, playing {}", full.id, color_to_string(self.session.color));
                if self.session.cursor == 0 {
                    if let Some(fen) = full.initial_fen.as_deref() {
                        self.board = BoardState::from_fen(fen)?;
                        self.session.first_to_move = self.board.initial().side_to_move();
                    }
                }
                self.on_state(&full.state, true).await
            }
            GameEvent::GameState(state) => self.on_state(&state, false).await,
            GameEvent::ChatLine(line) => {
                info!("[{}] {}: {}", line.room, line.username, line.text);
                Ok(Flow::Continue)
            }
            GameEvent::OpponentGone(gone) => {
                if gone.gone {
                    warn!("Opponent gone from game {}, leaving", self.session.game_id);
                    self.state = LoopState::GameOver;
                    Ok(Flow::GameOver)
                } else {
                    info!("Opponent is back");
                    Ok(Flow::Continue)
                }
            }
            GameEvent::Unknown => {
                debug!("Ignoring unknown event type");
                Ok(Flow::Continue)
            }
        }
    }

    async fn on_state(&mut self, state: &GameStateEvent, initial: bool) -> BotResult<Flow> {
        if state.is_terminal() {
            info!(
                "Game {} finished with status {} (winner: {})",
                self.session.game_id,
                state.status,
                state.winner.as_deref().unwrap_or("none")
            );
            self.state = LoopState::GameOver;
            return Ok(Flow::GameOver);
        }

        let moves = state.move_list();
        let half_moves = moves.len();
        if !self.session.bot_to_move(half_moves) {
            debug!("Ignoring echo of own move at half-move {}", half_moves);
            return Ok(Flow::Continue);
        }
        let cursor = self.session.cursor;
        if half_moves < cursor || (half_moves == cursor && !initial) {
            debug!("Half-move {} already applied (cursor {})", half_moves, cursor);
            return Ok(Flow::Continue);
        }

        if half_moves == cursor {
            // Only reachable from gameFull: nothing new to apply, the bot simply moves
            self.sync(&moves)?;
            let last = moves.last().map(String::as_str);
            return self.play_bot_move(last, None).await;
        }

        let (opponent_move, earlier) = match moves.split_last() {
            Some(split) => split,
            None => return Ok(Flow::Continue),
        };
        self.sync(earlier)?;

        let mv = self
            .board
            .parse_legal(opponent_move)
            .ok_or_else(|| BotError::InvalidServerMove {
                token: opponent_move.clone(),
            })?;
        let captured = self.board.captured_piece(mv);
        self.board.apply(mv);
        self.session.cursor = self.board.ply_count();
        match captured {
            Some(piece) => info!(
                "Opponent played {}, capturing a {}",
                opponent_move,
                piece_name(piece)
            ),
            None => info!("Opponent played {}", opponent_move),
        }

        self.play_bot_move(Some(opponent_move.as_str()), captured).await
    }

    /// Bring the mirror in line with `moves`, which the server reports as
    /// already played. Missed half-moves are applied; a history that
    /// disagrees with the server's is rebuilt from scratch.
    fn sync(&mut self, moves: &[String]) -> BotResult<()> {
        let local: Vec<String> = self.board.history().iter().map(|m| m.to_string()).collect();
        let diverged = local.len() > moves.len() || local[..] != moves[..local.len()];

        if diverged {
            warn!(
                "Local board for game {} diverged from the server, rebuilding from {} half-moves",
                self.session.game_id,
                moves.len()
            );
            self.board = BoardState::from_moves(*self.board.initial(), moves)?;
        } else if moves.len() > local.len() {
            info!("Catching up on {} missed half-moves", moves.len() - local.len());
            for token in &moves[local.len()..] {
                let mv = self
                    .board
                    .parse_legal(token)
                    .ok_or_else(|| BotError::InvalidServerMove { token: token.clone() })?;
                self.board.apply(mv);
            }
        }

        self.session.cursor = self.board.ply_count();
        Ok(())
    }

    async fn play_bot_move(
        &mut self,
        opponent_move: Option<&str>,
        captured: Option<Piece>,
    ) -> BotResult<Flow> {
        let negotiation = self
            .engine
            .negotiate(&mut self.board, opponent_move, captured)
            .await?;
        let token = negotiation.token();

        self.channel.send_move(&self.session.game_id, &token).await?;
        self.board.apply(negotiation.chosen);
        self.session.cursor = self.board.ply_count();
        info!("Played {} after {} round(s)", token, negotiation.rounds);

        if self.chat {
            let note = chat_summary(&negotiation);
            if let Err(e) = self.channel.send_chat(&self.session.game_id, &note).await {
                warn!("Could not post chat message: {}", e);
            }
        }
        Ok(Flow::Continue)
    }
}

fn chat_summary(negotiation: &Negotiation) -> String {
    match negotiation.resolution {
        Resolution::Accepted => format!(
            "Played {}, approved after {} round(s).",
            negotiation.token(),
            negotiation.rounds
        ),
        Resolution::Exhausted(_) => format!(
            "Played {} without agreement after {} round(s).",
            negotiation.token(),
            negotiation.rounds
        ),
    }
}
