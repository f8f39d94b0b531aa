//! Error types for the course advisor.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Recommendation error: {0}")]
    Recommend(#[from] RecommendError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },
}

/// Recommendation Service failures.
///
/// The dialogue controller treats every variant as "recommendation
/// unavailable" and recovers to `Idle`.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Recommendation request failed: {0}")]
    RequestFailed(String),

    #[error("Recommendation service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from recommendation service: {0}")]
    InvalidResponse(String),

    #[error("Recommendation service timed out after {0:?}")]
    Timeout(Duration),
}

/// Generic chat backend failures.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    RequestFailed(String),

    #[error("Chat service returned status {status}")]
    Status { status: u16 },

    #[error("Invalid response from chat service: {0}")]
    InvalidResponse(String),

    #[error("Chat service timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias for the course advisor.
pub type Result<T> = std::result::Result<T, Error>;
