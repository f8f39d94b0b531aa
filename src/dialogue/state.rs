//! Prediction dialogue state machine: which survey field we are waiting on.

use serde::{Deserialize, Serialize};

/// The four survey fields, asked in a fixed order.
///
/// Progresses linearly: Interest → Education → Skill → Qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Interest,
    Education,
    Skill,
    Qualification,
}

impl Field {
    /// Every field, in prompting order.
    pub const ALL: [Field; 4] = [
        Field::Interest,
        Field::Education,
        Field::Skill,
        Field::Qualification,
    ];

    /// Zero-based step index of this field.
    pub fn index(&self) -> usize {
        match self {
            Self::Interest => 0,
            Self::Education => 1,
            Self::Skill => 2,
            Self::Qualification => 3,
        }
    }

    /// The field asked at step `index`, if any.
    pub fn at(index: usize) -> Option<Field> {
        Self::ALL.get(index).copied()
    }

    /// The field asked after this one, or `None` after the last.
    pub fn next(&self) -> Option<Field> {
        Self::at(self.index() + 1)
    }

    /// Key used for this field in the prediction request body.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Interest => "interest",
            Self::Education => "education",
            Self::Skill => "skill",
            Self::Qualification => "qualification",
        }
    }

    /// Sample answers shown next to the prompt.
    pub fn example(&self) -> &'static str {
        match self {
            Self::Interest => "Programming, Design, etc.",
            Self::Education => "high school, diploma, bachelor's degree, master's, etc.",
            Self::Skill => "basic computer knowledge, some programming experience",
            Self::Qualification => "certifications you hold, or 'none'",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the dialogue currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "field", rename_all = "snake_case")]
pub enum ConversationState {
    /// No survey in progress; messages are checked for a trigger.
    #[default]
    Idle,
    /// Waiting for the user's answer to `Field`.
    AwaitingAnswer(Field),
    /// All answers collected, recommendation request outstanding.
    Submitting,
}

impl ConversationState {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Returning to `Idle` is always allowed (reset).
    pub fn can_transition_to(&self, target: ConversationState) -> bool {
        use ConversationState::*;
        match (self, target) {
            (_, Idle) => true,
            (Idle, AwaitingAnswer(Field::Interest)) => true,
            (AwaitingAnswer(from), AwaitingAnswer(to)) => from.next() == Some(to),
            (AwaitingAnswer(Field::Qualification), Submitting) => true,
            _ => false,
        }
    }

    /// Step index while awaiting an answer.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::AwaitingAnswer(field) => Some(field.index()),
            _ => None,
        }
    }

    /// Whether the next user message is stored as a survey answer.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::AwaitingAnswer(_))
    }

    /// Whether a submission is outstanding; new input is dropped.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// State after an answer for the current field has been stored.
    ///
    /// Returns `None` when not awaiting an answer.
    pub fn after_answer(&self) -> Option<ConversationState> {
        match self {
            Self::AwaitingAnswer(field) => Some(match field.next() {
                Some(next) => Self::AwaitingAnswer(next),
                None => Self::Submitting,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingAnswer(field) => write!(f, "awaiting_{field}"),
            Self::Submitting => write!(f, "submitting"),
        }
    }
}
