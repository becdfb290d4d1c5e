pub mod openai;

use crate::error::BotResult;

pub use openai::OpenAiOracle;

/// Which side of the negotiation a prompt is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleRole {
    /// Suggests a move for the current position
    Proposer,
    /// Reviews a suggested move and accepts or rejects it
    Critic,
}

/// Free-text move suggestion service
#[allow(async_fn_in_trait)]
pub trait MoveOracle {
    async fn query(&self, role: OracleRole, prompt: &str) -> BotResult<String>;
}

impl<T: MoveOracle> MoveOracle for &T {
    async fn query(&self, role: OracleRole, prompt: &str) -> BotResult<String> {
        (**self).query(role, prompt).await
    }
}
