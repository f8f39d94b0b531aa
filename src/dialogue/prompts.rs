//! Bot texts and intent detection for the prediction dialogue.

use std::sync::LazyLock;

use regex::Regex;

use super::state::Field;

/// Status line emitted when the request is sent.
pub const PREDICTING: &str = "Predicting best course for you...";

/// Reply to messages outside the survey when no chat backend is attached.
pub const FALLBACK: &str = "I'm here to help! Ask me for course recommendations if you'd like.";

/// Reply when a backend call fails.
pub const CONNECTION_FAILED: &str = "Sorry, I'm having trouble connecting. Please try again later.";

static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)recommend.*course|suggest.*course|best course")
        .unwrap_or_else(|e| panic!("invalid trigger pattern: {e}"))
});

/// Whether `text` asks for a course recommendation.
pub fn is_trigger(text: &str) -> bool {
    TRIGGER.is_match(text)
}

/// Prompt asking for `field`.
///
/// The first field gets the opening line that acknowledges the request.
pub fn field_prompt(field: Field) -> String {
    match field {
        Field::Interest => format!(
            "Sure! Let's find the best course for you. Please enter your {field} (e.g. {}):",
            field.example()
        ),
        _ => format!("Please enter your {field} (e.g. {}):", field.example()),
    }
}

/// Message reporting the recommended course.
pub fn recommendation(label: &str) -> String {
    format!("Recommended Course: {label}")
}
