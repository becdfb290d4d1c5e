use clap::Parser;
use log::{error, info};

use chess_oracle_bot::config::BotConfig;
use chess_oracle_bot::error::BotResult;
use chess_oracle_bot::game::utils::color_to_string;
use chess_oracle_bot::game::GameLoop;
use chess_oracle_bot::lichess::{GameChannel, LichessClient};
use chess_oracle_bot::negotiation::NegotiationEngine;
use chess_oracle_bot::oracle::OpenAiOracle;

async fn run(config: BotConfig) -> BotResult<()> {
    let lichess = LichessClient::new(
        config.lichess_url.clone(),
        config.lichess_token.clone(),
        config.request_timeout(),
    )?;
    let oracle = OpenAiOracle::new(
        config.oracle_url.clone(),
        config.oracle_key.clone(),
        config.model.clone(),
        config.request_timeout(),
    )?
    .organization(config.oracle_org.clone())
    .temperature(config.temperature);

    let session = lichess.challenge(&config.opponent, config.color.into()).await?;
    info!(
        "Game {} accepted, playing {}",
        session.game_id,
        color_to_string(session.color)
    );

    let engine = NegotiationEngine::new(oracle, config.negotiation());
    let mut game = GameLoop::new(lichess, engine, session).with_chat(config.chat);
    game.play().await
}

#[actix_rt::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = BotConfig::parse();
    info!(
        "Challenging {} with up to {} negotiation rounds per move",
        config.opponent, config.max_rounds
    );

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
