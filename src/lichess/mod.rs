pub mod client;
pub mod ndjson;

use chess::Color;
use futures::Stream;

use crate::error::BotResult;
use crate::models::GameSession;

pub use client::LichessClient;

/// Connection to the game server for one bot account
#[allow(async_fn_in_trait)]
pub trait GameChannel {
    /// Raw event lines of one game, in server order
    type Events: Stream<Item = BotResult<String>> + Unpin;

    /// Challenge `username` and wait until the challenge is accepted
    async fn challenge(&self, username: &str, color: Color) -> BotResult<GameSession>;

    async fn stream_game(&self, game_id: &str) -> BotResult<Self::Events>;

    async fn send_move(&self, game_id: &str, token: &str) -> BotResult<()>;

    async fn send_chat(&self, game_id: &str, text: &str) -> BotResult<()>;
}
