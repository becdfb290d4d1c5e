use chess::Color;
use futures::stream::{LocalBoxStream, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use std::time::Duration;

use super::ndjson::ndjson_lines;
use super::GameChannel;
use crate::error::{BotError, BotResult};
use crate::game::utils::{color_from_str, color_to_string};
use crate::models::{ChallengeLine, ChallengeRequest, GameSession};

/// Lichess Bot API client
pub struct LichessClient {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl LichessClient {
    /// `timeout` bounds every call except the long-lived streams, which
    /// are only bounded while connecting
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> BotResult<Self> {
        Ok(LichessClient {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// HTTP client whose connection attempts give up after `connect_timeout`
pub(crate) fn http_client(connect_timeout: Duration) -> BotResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| BotError::transport("http client", e))
}

pub(crate) fn status_error(endpoint: &str, status: u16, body: &str) -> BotError {
    BotError::Status {
        endpoint: endpoint.to_string(),
        status,
        body: body.trim().to_string(),
    }
}

/// Pass successful responses through, turn anything else into `Status`
pub(crate) async fn check_status(endpoint: &str, response: Response) -> BotResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(endpoint, status, &body))
}

impl GameChannel for LichessClient {
    type Events = LocalBoxStream<'static, BotResult<String>>;

    async fn challenge(&self, username: &str, color: Color) -> BotResult<GameSession> {
        let url = self.url(&format!("/api/challenge/{}", username));
        let body = ChallengeRequest {
            keep_alive_stream: true,
            color: color_to_string(color),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        let response = check_status(&url, response).await?;
        info!("Sent out challenge to {}", username);

        let mut lines = ndjson_lines(response.bytes_stream(), &url);
        let mut session: Option<GameSession> = None;
        while let Some(line) = lines.next().await {
            let line = line?;
            let parsed: ChallengeLine = match serde_json::from_str(&line) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping unreadable challenge line {}: {}", line, e);
                    continue;
                }
            };

            if let Some(challenge) = parsed.challenge {
                let assigned = challenge
                    .final_color
                    .as_deref()
                    .and_then(color_from_str)
                    .unwrap_or(color);
                debug!("Challenge {} created, playing {}", challenge.id, color_to_string(assigned));
                session = Some(GameSession::new(challenge.id, assigned));
            }

            match parsed.done.as_deref() {
                Some("accepted") => {
                    return session.ok_or_else(|| BotError::ChallengeRejected {
                        reason: "accepted without a challenge id".to_string(),
                    })
                }
                Some(other) => {
                    return Err(BotError::ChallengeRejected {
                        reason: other.to_string(),
                    })
                }
                None => {}
            }
        }

        Err(BotError::ChallengeRejected {
            reason: "challenge stream closed before the challenge was accepted".to_string(),
        })
    }

    async fn stream_game(&self, game_id: &str) -> BotResult<Self::Events> {
        let url = self.url(&format!("/api/bot/game/stream/{}", game_id));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        let response = check_status(&url, response).await?;
        info!("Streaming events for game {}", game_id);
        Ok(ndjson_lines(response.bytes_stream(), &url))
    }

    async fn send_move(&self, game_id: &str, token: &str) -> BotResult<()> {
        let url = self.url(&format!("/api/bot/game/{}/move/{}", game_id, token));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        check_status(&url, response).await?;
        Ok(())
    }

    async fn send_chat(&self, game_id: &str, text: &str) -> BotResult<()> {
        let url = self.url(&format!("/api/bot/game/{}/chat", game_id));
        let form = [("room", "player"), ("text", text)];
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        check_status(&url, response).await?;
        Ok(())
    }
}
