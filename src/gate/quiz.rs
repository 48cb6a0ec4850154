use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{Checkpoint, CheckpointId, OptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_correct(is_correct: bool) -> Self {
        if is_correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuizPhase {
    Idle,
    Presenting,
    Submitting,
    Resolved(Verdict),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuizError {
    #[error("No quiz is active")]
    NoActiveQuiz,

    #[error("A quiz is already active")]
    AlreadyActive,

    #[error("Option {0} does not belong to this quiz")]
    UnknownOption(OptionId),

    #[error("No option selected")]
    NothingSelected,

    /// Selection and submission are frozen once an answer is in flight.
    #[error("Answer already submitted")]
    Locked,

    #[error("Quiz is not awaiting a verdict")]
    NotSubmitting,
}

/// What selecting an option led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Selected,
    /// Auto-submit variant: the selection went straight to submission.
    Submitted(OptionId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub id: OptionId,
    pub text: String,
}

/// Render-ready snapshot of the active quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub checkpoint_id: CheckpointId,
    pub question: String,
    pub options: Vec<OptionView>,
    pub selected: Option<OptionId>,
    pub phase: QuizPhase,
    pub error_note: Option<String>,
}

#[derive(Debug, Clone)]
struct ActiveQuiz {
    checkpoint: Checkpoint,
    selected: Option<OptionId>,
    phase: QuizPhase,
    error_note: Option<String>,
}

/// Presenting, answering and resolving one checkpoint at a time.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    auto_submit: bool,
    active: Option<ActiveQuiz>,
}

impl QuizEngine {
    pub fn new(auto_submit: bool) -> Self {
        Self {
            auto_submit,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> QuizPhase {
        self.active.as_ref().map_or(QuizPhase::Idle, |quiz| quiz.phase)
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.active.as_ref().map(|quiz| &quiz.checkpoint)
    }

    pub fn selected(&self) -> Option<&OptionId> {
        self.active.as_ref().and_then(|quiz| quiz.selected.as_ref())
    }

    pub fn present(&mut self, checkpoint: Checkpoint) -> Result<(), QuizError> {
        if self.active.is_some() {
            return Err(QuizError::AlreadyActive);
        }
        debug!("Presenting quiz {}", checkpoint.id);
        self.active = Some(ActiveQuiz {
            checkpoint,
            selected: None,
            phase: QuizPhase::Presenting,
            error_note: None,
        });
        Ok(())
    }

    fn active_mut(&mut self) -> Result<&mut ActiveQuiz, QuizError> {
        self.active.as_mut().ok_or(QuizError::NoActiveQuiz)
    }

    /// Select exactly one option, replacing any earlier choice.
    pub fn select(&mut self, option: &OptionId) -> Result<Selection, QuizError> {
        let auto_submit = self.auto_submit;
        let quiz = self.active_mut()?;
        if quiz.phase != QuizPhase::Presenting {
            return Err(QuizError::Locked);
        }
        if quiz.checkpoint.option(option).is_none() {
            return Err(QuizError::UnknownOption(option.clone()));
        }
        quiz.selected = Some(option.clone());
        quiz.error_note = None;

        if auto_submit {
            quiz.phase = QuizPhase::Submitting;
            Ok(Selection::Submitted(option.clone()))
        } else {
            Ok(Selection::Selected)
        }
    }

    /// Explicit submission of the current selection.
    pub fn submit(&mut self) -> Result<OptionId, QuizError> {
        let quiz = self.active_mut()?;
        if quiz.phase != QuizPhase::Presenting {
            return Err(QuizError::Locked);
        }
        let selected = quiz.selected.clone().ok_or(QuizError::NothingSelected)?;
        quiz.phase = QuizPhase::Submitting;
        Ok(selected)
    }

    pub fn resolve(&mut self, verdict: Verdict) -> Result<(), QuizError> {
        let quiz = self.active_mut()?;
        if quiz.phase != QuizPhase::Submitting {
            return Err(QuizError::NotSubmitting);
        }
        debug!("Quiz {} resolved {:?}", quiz.checkpoint.id, verdict);
        quiz.phase = QuizPhase::Resolved(verdict);
        Ok(())
    }

    /// Back to presenting after a failed submission, selection cleared.
    pub fn reopen(&mut self, note: impl Into<String>) -> Result<(), QuizError> {
        let quiz = self.active_mut()?;
        if quiz.phase != QuizPhase::Submitting {
            return Err(QuizError::NotSubmitting);
        }
        quiz.phase = QuizPhase::Presenting;
        quiz.selected = None;
        quiz.error_note = Some(note.into());
        Ok(())
    }

    /// Clear the active quiz, returning its checkpoint.
    pub fn finish(&mut self) -> Option<Checkpoint> {
        self.active.take().map(|quiz| quiz.checkpoint)
    }

    pub fn view(&self) -> Option<QuizView> {
        self.active.as_ref().map(|quiz| QuizView {
            checkpoint_id: quiz.checkpoint.id.clone(),
            question: quiz.checkpoint.question.clone(),
            options: quiz
                .checkpoint
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    text: o.text.clone(),
                })
                .collect(),
            selected: quiz.selected.clone(),
            phase: quiz.phase,
            error_note: quiz.error_note.clone(),
        })
    }
}
