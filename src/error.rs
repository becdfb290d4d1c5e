//! Error types shared by the game loop, the negotiation engine and the
//! transport clients.

/// Errors that end (or, for `EventParse`, interrupt) a bot session
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The opponent or the server did not accept the challenge
    #[error("Challenge was not accepted: {reason}")]
    ChallengeRejected { reason: String },

    /// A request could not be sent or its body could not be read
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The remote side answered with a non-success status
    #[error("Request to {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The move oracle failed while a move was being negotiated
    #[error("Move negotiation failed: {0}")]
    NegotiationFailed(#[source] Box<BotError>),

    /// A stream payload could not be decoded
    #[error("Malformed stream event: {message}")]
    EventParse { message: String },

    /// The server reported a move that is not legal on the local mirror
    #[error("Server move {token} is not legal on the local board")]
    InvalidServerMove { token: String },

    /// The server sent a starting position that could not be parsed
    #[error("Invalid initial position: {fen}")]
    InvalidPosition { fen: String },

    /// A move was requested for a position without legal moves
    #[error("No legal moves in the current position")]
    NoLegalMoves,
}

impl BotError {
    pub fn transport(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        BotError::Transport {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;
