//! Gated lecture-video playback.
//!
//! A [`session::LessonSession`] plays one lesson through a
//! [`player::TimeSource`] backend, pauses at every unanswered quiz checkpoint,
//! keeps the learner from seeking past what they have watched and reports
//! progress to the lesson backend through [`api::LessonApi`].

pub mod api;
pub mod app;
pub mod config;
pub mod events;
pub mod gate;
pub mod models;
pub mod player;
pub mod session;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use session::{SessionHandle, ShellView, open};
