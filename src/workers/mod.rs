/// Background work spawned by a playback session
pub mod progress_reporter;

pub use progress_reporter::ProgressReporter;
