//! CLI channel: stdin/stdout REPL.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream};
use crate::error::ChannelError;
use crate::transcript::{Message, Sender, TranscriptSink};

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

/// Text printed for a message, or `None` when nothing should be printed.
///
/// Live user input is already on screen; replayed user input is not.
fn display_line(message: &Message, replay: bool) -> Option<String> {
    match message.sender {
        Sender::Bot => Some(format!("\n{}\n", message.text)),
        Sender::User if replay => Some(format!("> {}", message.text)),
        Sender::User => None,
    }
}

impl TranscriptSink for CliChannel {
    fn render(&self, message: &Message) {
        if let Some(line) = display_line(message, false) {
            println!("{}", line);
            eprint!("> ");
        }
    }

    fn render_history(&self, message: &Message) {
        if let Some(line) = display_line(message, true) {
            println!("{}", line);
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", "local-user", &line);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
