//! Survey answers and the recommendation wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::Field;

/// Answers collected so far, keyed by survey field.
///
/// Keyed by `Field`, so it can never hold more than the four canonical keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    answers: BTreeMap<Field, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an answer, replacing any earlier answer for the same field.
    pub fn insert(&mut self, field: Field, answer: impl Into<String>) {
        self.answers.insert(field, answer.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.answers.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Whether every field has an answer.
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| self.answers.contains_key(f))
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Build the request body. `None` until all four answers are present.
    pub fn to_request(&self) -> Option<PredictRequest> {
        Some(PredictRequest {
            interest: self.get(Field::Interest)?.to_string(),
            education: self.get(Field::Education)?.to_string(),
            skill: self.get(Field::Skill)?.to_string(),
            qualification: self.get(Field::Qualification)?.to_string(),
        })
    }
}

/// Body of the course prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub interest: String,
    pub education: String,
    pub skill: String,
    pub qualification: String,
}

/// Successful course prediction response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_course: String,
}
