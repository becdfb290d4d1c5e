use chess::Color;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Thresholds for the approximate game-phase classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseThresholds {
    /// Full moves after which the opening is considered over
    pub opening_moves: u32,
    /// A side with fewer non-pawn pieces than this puts the game in the endgame
    pub endgame_pieces: u32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        PhaseThresholds {
            opening_moves: 8,
            endgame_pieces: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationConfig {
    /// Propose/critique rounds before falling back
    pub max_rounds: u32,
    pub phase: PhaseThresholds,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        NegotiationConfig {
            max_rounds: 3,
            phase: PhaseThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlayAs {
    White,
    Black,
}

impl From<PlayAs> for Color {
    fn from(side: PlayAs) -> Self {
        match side {
            PlayAs::White => Color::White,
            PlayAs::Black => Color::Black,
        }
    }
}

/// Command line and environment configuration for the bot binary
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chess_oracle_bot",
    version,
    about = "Plays a Lichess game, asking a language model for every move"
)]
pub struct BotConfig {
    /// Lichess username to challenge
    pub opponent: String,

    /// Colour the bot asks to play
    #[arg(long, value_enum, default_value_t = PlayAs::Black)]
    pub color: PlayAs,

    #[arg(long, env = "LICHESS_BASE_URL", default_value = "https://lichess.org")]
    pub lichess_url: String,

    #[arg(long, env = "LICHESS_API_KEY", hide_env_values = true)]
    pub lichess_token: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    pub oracle_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub oracle_key: String,

    #[arg(long, env = "OPENAI_ORGANIZATION")]
    pub oracle_org: Option<String>,

    #[arg(long, default_value = "gpt-4")]
    pub model: String,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rounds: u32,

    #[arg(long, default_value_t = 8)]
    pub opening_moves: u32,

    #[arg(long, default_value_t = 4)]
    pub endgame_pieces: u32,

    /// Timeout for every request except the event stream
    #[arg(long, default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Post a short note in the game chat after every move
    #[arg(long)]
    pub chat: bool,
}

impl BotConfig {
    pub fn negotiation(&self) -> NegotiationConfig {
        NegotiationConfig {
            max_rounds: self.max_rounds,
            phase: PhaseThresholds {
                opening_moves: self.opening_moves,
                endgame_pieces: self.endgame_pieces,
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
