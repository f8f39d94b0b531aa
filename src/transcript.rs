//! Chat transcript: the ordered list of messages shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}

/// One exchange from the chat history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_message: String,
    pub bot_response: String,
}

/// Append-only message list.
///
/// Entries are only removed by [`Transcript::reset_to_greeting`], which
/// keeps the initial bot greeting (if any).
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    greeting: Option<Message>,
    messages: Vec<Message>,
}

impl Transcript {
    /// Empty transcript with no greeting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript that starts with a bot greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting = Message::bot(greeting);
        Self {
            messages: vec![greeting.clone()],
            greeting: Some(greeting),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Clear everything but the initial greeting.
    pub fn reset_to_greeting(&mut self) {
        self.messages.clear();
        if let Some(ref greeting) = self.greeting {
            self.messages.push(greeting.clone());
        }
    }

    /// Replace the transcript with loaded history, keeping the greeting.
    ///
    /// Returns the newly appended messages in order.
    pub fn replace_with_history(&mut self, history: &[HistoryEntry]) -> Vec<Message> {
        self.reset_to_greeting();
        let mut appended = Vec::with_capacity(history.len() * 2);
        for entry in history {
            appended.push(Message::user(&entry.user_message));
            appended.push(Message::bot(&entry.bot_response));
        }
        self.messages.extend(appended.iter().cloned());
        appended
    }
}

/// Outbound rendering capability of the UI surface.
pub trait TranscriptSink: Send + Sync {
    /// Display a newly appended message.
    fn render(&self, message: &Message);

    /// Display a message replayed from stored history. Unlike live input,
    /// replayed user messages are not already on screen.
    fn render_history(&self, message: &Message) {
        self.render(message);
    }
}

/// Sink that drops every message.
pub struct NullSink;

impl TranscriptSink for NullSink {
    fn render(&self, _message: &Message) {}
}
