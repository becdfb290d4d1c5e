use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{MoveOracle, OracleRole};
use crate::error::{BotError, BotResult};
use crate::lichess::client::{check_status, http_client};

const PROPOSER_SYSTEM: &str = "You are a chess player. Read the position carefully and answer \
     with a short explanation followed by your chosen move in UCI notation.";
const CRITIC_SYSTEM: &str = "You are a strict chess coach. You review a single suggested move \
     and decide whether it should be played.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    pub message: ChatMessage,
}

impl ChatCompletion {
    pub fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}

/// Chat-completions client used as the move oracle
pub struct OpenAiOracle {
    client: Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiOracle {
    /// `timeout` bounds each completion request, connecting included
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> BotResult<Self> {
        Ok(OpenAiOracle {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            organization: None,
            model: model.into(),
            temperature: 0.7,
            timeout,
        })
    }

    pub fn organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn request(&self, role: OracleRole, prompt: &str) -> ChatRequest {
        let system = match role {
            OracleRole::Proposer => PROPOSER_SYSTEM,
            OracleRole::Critic => CRITIC_SYSTEM,
        };
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        }
    }
}

impl MoveOracle for OpenAiOracle {
    async fn query(&self, role: OracleRole, prompt: &str) -> BotResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request(role, prompt);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout);
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org.as_str());
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        let response = check_status(&url, response).await?;

        let completion = response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| BotError::transport(url.as_str(), e))?;
        let content = completion
            .into_content()
            .ok_or_else(|| BotError::transport(url.as_str(), "response contained no choices"))?;
        debug!("{:?} replied: {}", role, content);
        Ok(content)
    }
}
