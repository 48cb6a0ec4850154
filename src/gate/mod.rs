//! Checkpoint gating: when quizzes fire, how far the learner may seek and how
//! an answer is resolved.

pub mod quiz;
pub mod scheduler;
pub mod seek_policy;

pub use quiz::{OptionView, QuizEngine, QuizError, QuizPhase, QuizView, Selection, Verdict};
pub use scheduler::{CheckpointScheduler, Marker};
pub use seek_policy::{GatedSeekPolicy, SeekDecision};
