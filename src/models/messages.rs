use serde::{Deserialize, Serialize};

/// One line of the game event stream
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    GameFull(GameFull),
    GameState(GameStateEvent),
    ChatLine(ChatLine),
    OpponentGone(OpponentGone),
    #[serde(other)]
    Unknown,
}

/// Sent once when the stream opens
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameFull {
    pub id: String,
    #[serde(default)]
    pub initial_fen: Option<String>,
    #[serde(default)]
    pub white: Option<Player>,
    #[serde(default)]
    pub black: Option<Player>,
    pub state: GameStateEvent,
}

/// Sent every time a move is played or the game status changes
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GameStateEvent {
    #[serde(default)]
    pub moves: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub wtime: Option<u64>,
    #[serde(default)]
    pub btime: Option<u64>,
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameStateEvent {
    pub fn move_list(&self) -> Vec<String> {
        self.moves.split_whitespace().map(str::to_string).collect()
    }

    /// Anything other than `created`/`started` means the game has finished
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status.as_str(), "created" | "started")
    }
}

fn default_status() -> String {
    "started".to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpponentGone {
    pub gone: bool,
    #[serde(default)]
    pub claim_win_in_seconds: Option<u64>,
}

/// Body of a challenge request
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub keep_alive_stream: bool,
    pub color: String,
}

/// One line of the challenge keep-alive stream
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeLine {
    #[serde(default)]
    pub challenge: Option<ChallengeInfo>,
    #[serde(default)]
    pub done: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    pub id: String,
    #[serde(default)]
    pub final_color: Option<String>,
}
