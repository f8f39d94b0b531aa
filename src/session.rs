//! Session loop: feeds channel messages into the prediction controller.

use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{debug, info};

use crate::channels::Channel;
use crate::dialogue::{PredictionController, TurnOutcome};
use crate::error::Error;

/// Local commands handled by the session instead of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Abandon the survey and clear the panel back to the greeting.
    Reset,
    /// Reload stored chat history into the transcript.
    History,
}

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        match input.trim() {
            "/quit" | "/exit" => Some(Command::Quit),
            "/reset" => Some(Command::Reset),
            "/history" => Some(Command::History),
            _ => None,
        }
    }
}

/// Drive `controller` from `channel` until the channel closes or the user
/// quits.
///
/// Messages are handled one at a time. Anything submitted while a
/// recommendation request was outstanding is discarded once it completes.
pub async fn run_session(
    channel: Arc<dyn Channel>,
    controller: Arc<PredictionController>,
) -> Result<(), Error> {
    let mut stream = channel.start().await?.fuse();
    info!(channel = channel.name(), "Session started");

    while let Some(msg) = stream.next().await {
        match Command::parse(&msg.content) {
            Some(Command::Quit) => break,
            Some(Command::Reset) => {
                controller.reset_panel().await;
                continue;
            }
            Some(Command::History) => {
                // Failure is logged by the controller; the transcript stays.
                let _ = controller.load_history().await;
                continue;
            }
            None => {}
        }

        let outcome = controller.handle_message(&msg.content).await;
        debug!(outcome = ?outcome, "Handled message");

        if matches!(
            outcome,
            TurnOutcome::Recommended(_) | TurnOutcome::Failed | TurnOutcome::Cancelled
        ) {
            let mut dropped = 0usize;
            while let Some(Some(_)) = stream.next().now_or_never() {
                dropped += 1;
            }
            if dropped > 0 {
                debug!(dropped, "Discarded input submitted during recommendation request");
            }
        }
    }

    channel.shutdown().await?;
    info!(channel = channel.name(), "Session ended");
    Ok(())
}
