//! Course prediction dialogue.
//!
//! A short structured conversation embedded in the chat widget. A message
//! asking for a course recommendation starts a four-question survey
//! (interest, education, skill, qualification); once every answer is in,
//! they are submitted to the Recommendation Service and the suggested course
//! is reported back in the transcript.

pub mod controller;
pub mod model;
pub mod prompts;
pub mod state;

pub use controller::{PredictionController, TurnOutcome};
pub use model::{AnswerSet, PredictRequest, PredictResponse};
pub use state::{ConversationState, Field};
