//! Chess bot that plays on a Lichess-style server and negotiates every move
//! with a language-model oracle.

pub mod config;
pub mod error;
pub mod game;
pub mod lichess;
pub mod models;
pub mod negotiation;
pub mod oracle;

pub use error::{BotError, BotResult};
