use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::{CheckpointId, OptionId};

/// Minimum number of answer options a checkpoint must carry.
pub const MIN_OPTIONS: usize = 2;

/// One answer choice of a checkpoint question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A timestamped multiple-choice gate on a video's timeline.
///
/// Served by the lesson backend as a "quiz"; the trigger time travels as
/// `timestamp` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: CheckpointId,
    #[serde(rename = "timestamp")]
    pub trigger_time: f64,
    pub question: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
}

/// Why a checkpoint cannot take part in a playback session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckpointDefect {
    #[error("trigger time is not a finite number")]
    NonFiniteTimestamp,

    #[error("trigger time {0} is negative")]
    NegativeTimestamp(f64),

    #[error("only {0} option(s), at least {MIN_OPTIONS} required")]
    TooFewOptions(usize),

    #[error("no option is marked correct")]
    NoCorrectOption,

    #[error("option id {0} appears more than once")]
    DuplicateOptionId(OptionId),
}

impl Checkpoint {
    pub fn new(
        id: impl Into<CheckpointId>,
        trigger_time: f64,
        question: impl Into<String>,
        options: Vec<QuizOption>,
    ) -> Self {
        Self {
            id: id.into(),
            trigger_time,
            question: question.into(),
            options,
        }
    }

    /// Check the authoring invariants the scheduler relies on, including the
    /// presence of an answer key.
    pub fn validate(&self) -> Result<(), CheckpointDefect> {
        self.validate_structure()?;
        if !self.options.iter().any(|o| o.is_correct) {
            return Err(CheckpointDefect::NoCorrectOption);
        }
        Ok(())
    }

    /// Structural checks only. Used when the answer endpoint is the
    /// correctness authority and the served options may carry no flags.
    pub fn validate_structure(&self) -> Result<(), CheckpointDefect> {
        if !self.trigger_time.is_finite() {
            return Err(CheckpointDefect::NonFiniteTimestamp);
        }
        if self.trigger_time < 0.0 {
            return Err(CheckpointDefect::NegativeTimestamp(self.trigger_time));
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(CheckpointDefect::TooFewOptions(self.options.len()));
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(&option.id) {
                return Err(CheckpointDefect::DuplicateOptionId(option.id.clone()));
            }
        }

        Ok(())
    }

    pub fn option(&self, id: &OptionId) -> Option<&QuizOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    /// Client-side classification using the author-supplied flags.
    /// Unknown option ids are never correct.
    pub fn is_correct(&self, id: &OptionId) -> bool {
        self.option(id).is_some_and(|o| o.is_correct)
    }
}

impl QuizOption {
    pub fn new(id: impl Into<OptionId>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
        }
    }
}
