//! Generic chat backend: free-form replies and stored chat history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;
use crate::error::{ChatError, ConfigError};
use crate::recommend::http_client;
use crate::transcript::HistoryEntry;

/// Backend that answers free-form messages and keeps chat history.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send a user message and return the bot's reply.
    async fn send(&self, message: &str) -> Result<String, ChatError>;

    /// Fetch previously stored exchanges, oldest first.
    async fn history(&self) -> Result<Vec<HistoryEntry>, ChatError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

/// Chat backend reached over HTTP.
pub struct HttpChatService {
    client: reqwest::Client,
    chat_endpoint: reqwest::Url,
    history_endpoint: reqwest::Url,
}

impl HttpChatService {
    pub fn new(
        client: reqwest::Client,
        chat_endpoint: reqwest::Url,
        history_endpoint: reqwest::Url,
    ) -> Self {
        Self {
            client,
            chat_endpoint,
            history_endpoint,
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            http_client(config.request_timeout)?,
            config.endpoint(&config.chat_path)?,
            config.endpoint(&config.history_path)?,
        ))
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send(&self, message: &str) -> Result<String, ChatError> {
        let resp = self
            .client
            .post(self.chat_endpoint.clone())
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ChatError::Status {
                status: resp.status().as_u16(),
            });
        }

        let reply: ChatReply = resp
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        Ok(reply.response)
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ChatError> {
        let resp = self
            .client
            .get(self.history_endpoint.clone())
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ChatError::Status {
                status: resp.status().as_u16(),
            });
        }

        resp.json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))
    }
}
