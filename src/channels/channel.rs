//! Channel trait: where user messages come from and transcript entries go.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::transcript::TranscriptSink;

/// A message submitted by the user on some channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub channel: String,
    pub user_id: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            received_at: Utc::now(),
        }
    }
}

/// Stream of submitted user messages.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A UI input surface: emits "message submitted" events and renders
/// transcript entries.
#[async_trait]
pub trait Channel: TranscriptSink {
    /// Short channel name for logs.
    fn name(&self) -> &str;

    /// Start listening and return the stream of submitted messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Stop listening.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}
