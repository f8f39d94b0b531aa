//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default greeting shown as the first bot message of the chat panel.
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// Advisor configuration.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Base URL of the backend hosting the prediction and chat endpoints.
    pub base_url: String,
    /// Path of the course prediction endpoint.
    pub predict_path: String,
    /// Path of the generic chat endpoint.
    pub chat_path: String,
    /// Path of the chat history endpoint.
    pub history_path: String,
    /// Upper bound on a single backend request.
    pub request_timeout: Duration,
    /// Forward non-survey messages to the chat endpoint instead of the
    /// static fallback reply.
    pub chat_enabled: bool,
    /// First bot message of the transcript, kept across panel resets.
    pub greeting: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            predict_path: "/predict_course".to_string(),
            chat_path: "/chatbot".to_string(),
            history_path: "/chat_history".to_string(),
            request_timeout: Duration::from_secs(10),
            chat_enabled: false,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl AdvisorConfig {
    /// Build configuration from `COURSE_ADVISOR_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = match lookup("COURSE_ADVISOR_URL") {
            Some(raw) => {
                let raw = raw.trim().to_string();
                reqwest::Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    key: "COURSE_ADVISOR_URL".into(),
                    message: e.to_string(),
                })?;
                raw
            }
            None => defaults.base_url,
        };

        let request_timeout = match lookup("COURSE_ADVISOR_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "COURSE_ADVISOR_TIMEOUT_SECS".into(),
                    message: format!("expected a positive integer, got {raw:?}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "COURSE_ADVISOR_TIMEOUT_SECS".into(),
                        message: "timeout must be greater than zero".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        let chat_enabled = match lookup("COURSE_ADVISOR_CHAT_ENABLED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "COURSE_ADVISOR_CHAT_ENABLED".into(),
                message: format!("expected true/false, got {raw:?}"),
            })?,
            None => defaults.chat_enabled,
        };

        Ok(Self {
            base_url,
            predict_path: lookup("COURSE_ADVISOR_PREDICT_PATH").unwrap_or(defaults.predict_path),
            chat_path: lookup("COURSE_ADVISOR_CHAT_PATH").unwrap_or(defaults.chat_path),
            history_path: lookup("COURSE_ADVISOR_HISTORY_PATH").unwrap_or(defaults.history_path),
            request_timeout,
            chat_enabled,
            greeting: lookup("COURSE_ADVISOR_GREETING")
                .filter(|g| !g.trim().is_empty())
                .unwrap_or(defaults.greeting),
        })
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<reqwest::Url, ConfigError> {
        reqwest::Url::parse(&self.base_url)
            .and_then(|base| base.join(path))
            .map_err(|e| ConfigError::InvalidValue {
                key: path.to_string(),
                message: e.to_string(),
            })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
